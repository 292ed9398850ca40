//! Spawn record codec: the sub-record shapes (herd members, weight
//! multipliers, drops) and the top-level spawn entry and document.
//!
//! Encode order follows the reference file layout so diffs against
//! upstream files stay readable; JSON consumers do not depend on it.

use serde_json::{Map, Value};

use crate::codec::Condition;
use crate::schema::{Bucket, PositionType, SpawnType};

/// One member of a herd spawn's weighted member list.
#[derive(Clone, Debug, PartialEq)]
pub struct HerdMember {
    pub pokemon: String,
    pub level_range: String,
    pub weight: f64,
    pub is_leader: bool,
    /// 0 means unlimited and is omitted from the encoded form.
    pub max_times: u32,
    pub level_range_offset: String,
}

impl Default for HerdMember {
    /// The template used when a member is added in an editor.
    fn default() -> Self {
        HerdMember {
            pokemon: String::new(),
            level_range: "1-10".to_string(),
            weight: 1.0,
            is_leader: false,
            max_times: 0,
            level_range_offset: String::new(),
        }
    }
}

impl HerdMember {
    pub fn decode(raw: &Map<String, Value>) -> HerdMember {
        HerdMember {
            pokemon: string_field(raw, "pokemon"),
            level_range: string_field(raw, "levelRange"),
            weight: raw.get("weight").and_then(Value::as_f64).unwrap_or(1.0),
            is_leader: raw.get("isLeader").and_then(Value::as_bool).unwrap_or(false),
            max_times: raw
                .get("maxTimes")
                .and_then(Value::as_u64)
                .unwrap_or(0) as u32,
            level_range_offset: string_field(raw, "levelRangeOffset"),
        }
    }

    pub fn encode(&self) -> Map<String, Value> {
        let mut out = Map::new();
        out.insert("pokemon".into(), self.pokemon.as_str().into());
        out.insert("levelRange".into(), self.level_range.as_str().into());
        out.insert("weight".into(), self.weight.into());
        // isLeader is always written, even when false.
        out.insert("isLeader".into(), self.is_leader.into());
        if self.max_times > 0 {
            out.insert("maxTimes".into(), self.max_times.into());
        }
        if !self.level_range_offset.is_empty() {
            out.insert(
                "levelRangeOffset".into(),
                self.level_range_offset.as_str().into(),
            );
        }
        out
    }
}

/// A conditional weight adjustment. Unlike a spawn entry's condition, the
/// `condition` key is always encoded here, even when empty.
#[derive(Clone, Debug, PartialEq)]
pub struct WeightMultiplier {
    pub multiplier: f64,
    pub condition: Condition,
}

impl Default for WeightMultiplier {
    fn default() -> Self {
        WeightMultiplier {
            multiplier: 1.0,
            condition: Condition::default(),
        }
    }
}

impl WeightMultiplier {
    pub fn decode(raw: &Map<String, Value>) -> WeightMultiplier {
        WeightMultiplier {
            multiplier: raw.get("multiplier").and_then(Value::as_f64).unwrap_or(1.0),
            condition: raw
                .get("condition")
                .and_then(Value::as_object)
                .map(Condition::decode)
                .unwrap_or_default(),
        }
    }

    pub fn encode(&self) -> Map<String, Value> {
        let mut out = Map::new();
        out.insert("multiplier".into(), self.multiplier.into());
        out.insert("condition".into(), Value::Object(self.condition.encode()));
        out
    }
}

/// One item in a drops table. Entries with an empty item are silently
/// excluded when the parent encodes.
#[derive(Clone, Debug, PartialEq)]
pub struct DropEntry {
    pub item: String,
    pub quantity_range: String,
    pub percentage: f64,
}

impl Default for DropEntry {
    fn default() -> Self {
        DropEntry {
            item: String::new(),
            quantity_range: String::new(),
            percentage: 0.0,
        }
    }
}

impl DropEntry {
    pub fn decode(raw: &Map<String, Value>) -> DropEntry {
        DropEntry {
            item: string_field(raw, "item"),
            quantity_range: string_field(raw, "quantityRange"),
            percentage: raw.get("percentage").and_then(Value::as_f64).unwrap_or(0.0),
        }
    }

    pub fn encode(&self) -> Map<String, Value> {
        let mut out = Map::new();
        out.insert("item".into(), self.item.as_str().into());
        if !self.quantity_range.is_empty() {
            out.insert("quantityRange".into(), self.quantity_range.as_str().into());
        }
        if self.percentage > 0.0 {
            out.insert("percentage".into(), self.percentage.into());
        }
        out
    }
}

/// Drop configuration for a spawn. The whole object is absent from the
/// encoded spawn when drops are disabled.
#[derive(Clone, Debug, PartialEq)]
pub struct Drops {
    pub amount: u32,
    pub entries: Vec<DropEntry>,
}

impl Default for Drops {
    fn default() -> Self {
        Drops {
            amount: 1,
            entries: Vec::new(),
        }
    }
}

impl Drops {
    pub fn decode(raw: &Map<String, Value>) -> Drops {
        Drops {
            amount: raw
                .get("amount")
                .and_then(Value::as_u64)
                .unwrap_or(1)
                .max(1) as u32,
            entries: raw
                .get("entries")
                .and_then(Value::as_array)
                .map(|items| {
                    items
                        .iter()
                        .filter_map(Value::as_object)
                        .map(DropEntry::decode)
                        .collect()
                })
                .unwrap_or_default(),
        }
    }

    pub fn encode(&self) -> Map<String, Value> {
        let mut out = Map::new();
        out.insert("amount".into(), self.amount.into());
        let entries: Vec<Value> = self
            .entries
            .iter()
            .filter(|e| !e.item.is_empty())
            .map(|e| Value::Object(e.encode()))
            .collect();
        out.insert("entries".into(), Value::Array(entries));
        out
    }
}

/// A single spawn rule.
///
/// The `spawn_type` discriminator selects between two effective variants:
/// non-herd (`pokemon`, `npc`) carries a `pokemon` token and serializes its
/// level as `level`; the herd variant drops `pokemon` and serializes
/// `levelRange` plus the herd fields.
#[derive(Clone, Debug, PartialEq)]
pub struct SpawnEntry {
    pub id: String,
    pub spawn_type: SpawnType,
    /// Non-herd variant only.
    pub pokemon: String,
    pub presets: Vec<String>,
    pub position: PositionType,
    pub bucket: Bucket,
    /// Serialized as `level` (non-herd) or `levelRange` (herd).
    pub level: String,
    pub weight: f64,
    /// Herd variant only.
    pub max_herd_size: u32,
    pub min_herd_distance: f64,
    pub herd_members: Vec<HerdMember>,
    pub weight_multipliers: Vec<WeightMultiplier>,
    pub condition: Condition,
    pub anticondition: Condition,
    pub drops: Option<Drops>,
}

impl Default for SpawnEntry {
    fn default() -> Self {
        SpawnEntry {
            id: String::new(),
            spawn_type: SpawnType::Pokemon,
            pokemon: String::new(),
            presets: Vec::new(),
            position: PositionType::Grounded,
            bucket: Bucket::Common,
            level: String::new(),
            weight: 1.0,
            max_herd_size: 5,
            min_herd_distance: 1.5,
            herd_members: Vec::new(),
            weight_multipliers: Vec::new(),
            condition: Condition::default(),
            anticondition: Condition::default(),
            drops: None,
        }
    }
}

impl SpawnEntry {
    /// The template used by "Add new spawn" in the editors.
    pub fn template(species: &str, index: usize) -> SpawnEntry {
        SpawnEntry {
            id: format!("{}-{}", species, index + 1),
            pokemon: species.to_string(),
            presets: vec!["natural".to_string()],
            level: "1-50".to_string(),
            ..SpawnEntry::default()
        }
    }

    pub fn decode(raw: &Map<String, Value>) -> SpawnEntry {
        let spawn_type =
            SpawnType::from_token(raw.get("type").and_then(Value::as_str).unwrap_or("pokemon"));

        // A record may carry both level keys; take the variant-appropriate
        // one and ignore the other (herd falls back to `level` if needed).
        let level = if spawn_type.is_herd() {
            raw.get("levelRange")
                .or_else(|| raw.get("level"))
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        } else {
            string_field(raw, "level")
        };

        // Legacy singular `weightMultiplier` becomes a one-element list
        // when the plural list is absent or empty; the plural form is the
        // only one ever written back.
        let plural: Vec<WeightMultiplier> = raw
            .get("weightMultipliers")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_object)
                    .map(WeightMultiplier::decode)
                    .collect()
            })
            .unwrap_or_default();
        let weight_multipliers = if plural.is_empty() {
            raw.get("weightMultiplier")
                .and_then(Value::as_object)
                .map(|single| vec![WeightMultiplier::decode(single)])
                .unwrap_or_default()
        } else {
            plural
        };

        SpawnEntry {
            id: string_field(raw, "id"),
            spawn_type,
            pokemon: string_field(raw, "pokemon"),
            presets: raw
                .get("presets")
                .and_then(Value::as_array)
                .map(|items| {
                    items
                        .iter()
                        .filter_map(|v| v.as_str().map(str::to_string))
                        .collect()
                })
                .unwrap_or_default(),
            position: PositionType::from_token(
                raw.get("spawnablePositionType")
                    .and_then(Value::as_str)
                    .unwrap_or("grounded"),
            ),
            bucket: Bucket::from_token(
                raw.get("bucket").and_then(Value::as_str).unwrap_or("common"),
            ),
            level,
            weight: raw.get("weight").and_then(Value::as_f64).unwrap_or(1.0),
            max_herd_size: raw
                .get("maxHerdSize")
                .and_then(Value::as_u64)
                .unwrap_or(5)
                .max(1) as u32,
            min_herd_distance: raw
                .get("minDistanceBetweenSpawns")
                .and_then(Value::as_f64)
                .unwrap_or(1.5),
            herd_members: raw
                .get("herdablePokemon")
                .and_then(Value::as_array)
                .map(|items| {
                    items
                        .iter()
                        .filter_map(Value::as_object)
                        .map(HerdMember::decode)
                        .collect()
                })
                .unwrap_or_default(),
            weight_multipliers,
            condition: raw
                .get("condition")
                .and_then(Value::as_object)
                .map(Condition::decode)
                .unwrap_or_default(),
            anticondition: raw
                .get("anticondition")
                .and_then(Value::as_object)
                .map(Condition::decode)
                .unwrap_or_default(),
            drops: raw.get("drops").and_then(Value::as_object).map(Drops::decode),
        }
    }

    pub fn encode(&self) -> Map<String, Value> {
        let mut out = Map::new();
        out.insert("id".into(), self.id.as_str().into());
        out.insert("type".into(), self.spawn_type.as_str().into());

        let is_herd = self.spawn_type.is_herd();
        if !is_herd {
            out.insert("pokemon".into(), self.pokemon.as_str().into());
        }

        if !self.presets.is_empty() {
            let presets: Vec<Value> = self.presets.iter().map(|p| p.as_str().into()).collect();
            out.insert("presets".into(), Value::Array(presets));
        }

        out.insert(
            "spawnablePositionType".into(),
            self.position.as_str().into(),
        );
        out.insert("bucket".into(), self.bucket.as_str().into());

        let level_key = if is_herd { "levelRange" } else { "level" };
        out.insert(level_key.into(), self.level.as_str().into());
        out.insert("weight".into(), self.weight.into());

        if is_herd {
            out.insert("maxHerdSize".into(), self.max_herd_size.into());
            out.insert(
                "minDistanceBetweenSpawns".into(),
                self.min_herd_distance.into(),
            );
            let members: Vec<Value> = self
                .herd_members
                .iter()
                .map(|m| Value::Object(m.encode()))
                .collect();
            out.insert("herdablePokemon".into(), Value::Array(members));
        }

        if !self.weight_multipliers.is_empty() {
            let multipliers: Vec<Value> = self
                .weight_multipliers
                .iter()
                .map(|m| Value::Object(m.encode()))
                .collect();
            out.insert("weightMultipliers".into(), Value::Array(multipliers));
        }

        if !self.condition.is_empty() {
            out.insert("condition".into(), Value::Object(self.condition.encode()));
        }
        if !self.anticondition.is_empty() {
            out.insert(
                "anticondition".into(),
                Value::Object(self.anticondition.encode()),
            );
        }
        if let Some(drops) = &self.drops {
            out.insert("drops".into(), Value::Object(drops.encode()));
        }
        out
    }
}

/// The root document of one species' spawn file.
#[derive(Clone, Debug, PartialEq)]
pub struct SpawnPool {
    pub enabled: bool,
    pub needed_installed_mods: Vec<String>,
    pub needed_uninstalled_mods: Vec<String>,
    pub spawns: Vec<SpawnEntry>,
}

impl Default for SpawnPool {
    /// The blank template written for species without spawn data.
    fn default() -> Self {
        SpawnPool {
            enabled: true,
            needed_installed_mods: Vec::new(),
            needed_uninstalled_mods: Vec::new(),
            spawns: Vec::new(),
        }
    }
}

impl SpawnPool {
    pub fn decode(raw: &Map<String, Value>) -> SpawnPool {
        SpawnPool {
            enabled: raw.get("enabled").and_then(Value::as_bool).unwrap_or(true),
            needed_installed_mods: string_list(raw, "neededInstalledMods"),
            needed_uninstalled_mods: string_list(raw, "neededUninstalledMods"),
            spawns: raw
                .get("spawns")
                .and_then(Value::as_array)
                .map(|items| {
                    items
                        .iter()
                        .filter_map(Value::as_object)
                        .map(SpawnEntry::decode)
                        .collect()
                })
                .unwrap_or_default(),
        }
    }

    /// All four top-level keys are always written, matching the upstream
    /// file layout (and the blank template).
    pub fn encode(&self) -> Map<String, Value> {
        let mut out = Map::new();
        out.insert("enabled".into(), self.enabled.into());
        out.insert(
            "neededInstalledMods".into(),
            Value::Array(
                self.needed_installed_mods
                    .iter()
                    .map(|m| m.as_str().into())
                    .collect(),
            ),
        );
        out.insert(
            "neededUninstalledMods".into(),
            Value::Array(
                self.needed_uninstalled_mods
                    .iter()
                    .map(|m| m.as_str().into())
                    .collect(),
            ),
        );
        out.insert(
            "spawns".into(),
            Value::Array(self.spawns.iter().map(|s| Value::Object(s.encode())).collect()),
        );
        out
    }
}

fn string_field(raw: &Map<String, Value>, key: &str) -> String {
    raw.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn string_list(raw: &Map<String, Value>, key: &str) -> Vec<String> {
    raw.get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obj(json: &str) -> Map<String, Value> {
        serde_json::from_str::<Value>(json)
            .expect("test JSON should parse")
            .as_object()
            .expect("test JSON should be an object")
            .clone()
    }

    #[test]
    fn test_well_formed_file_round_trips_unchanged() {
        let raw = obj(
            r#"{
                "enabled": true,
                "spawns": [{
                    "id": "pidgey-1",
                    "type": "pokemon",
                    "pokemon": "pidgey",
                    "bucket": "common",
                    "spawnablePositionType": "grounded",
                    "level": "1-10",
                    "weight": 1.0,
                    "condition": {"biomes": ["plains"], "minSkyLight": 7}
                }]
            }"#,
        );
        let pool = SpawnPool::decode(&raw);
        let encoded = pool.encode();
        assert_eq!(encoded.get("enabled"), raw.get("enabled"));
        assert_eq!(encoded.get("spawns"), raw.get("spawns"));
    }

    #[test]
    fn test_singular_weight_multiplier_migrates_to_plural() {
        let raw = obj(
            r#"{
                "id": "x-1",
                "type": "pokemon",
                "pokemon": "x",
                "weightMultiplier": {"multiplier": 2.0, "condition": {}}
            }"#,
        );
        let entry = SpawnEntry::decode(&raw);
        assert_eq!(entry.weight_multipliers.len(), 1);
        assert_eq!(entry.weight_multipliers[0].multiplier, 2.0);

        let encoded = entry.encode();
        assert!(!encoded.contains_key("weightMultiplier"));
        let plural = encoded
            .get("weightMultipliers")
            .and_then(Value::as_array)
            .expect("plural key should be present");
        assert_eq!(plural.len(), 1);
    }

    #[test]
    fn test_plural_wins_over_singular_when_both_present() {
        let raw = obj(
            r#"{
                "id": "x-1",
                "type": "pokemon",
                "weightMultiplier": {"multiplier": 2.0, "condition": {}},
                "weightMultipliers": [{"multiplier": 3.0, "condition": {}}]
            }"#,
        );
        let entry = SpawnEntry::decode(&raw);
        assert_eq!(entry.weight_multipliers.len(), 1);
        assert_eq!(entry.weight_multipliers[0].multiplier, 3.0);
    }

    #[test]
    fn test_multiplier_condition_always_encoded_even_empty() {
        let wm = WeightMultiplier::default();
        let encoded = wm.encode();
        assert_eq!(encoded.get("condition"), Some(&Value::Object(Map::new())));

        // Contrast: a spawn entry's empty condition is dropped entirely.
        let entry = SpawnEntry::default();
        assert!(!entry.encode().contains_key("condition"));
    }

    #[test]
    fn test_herd_variant_field_selection() {
        let raw = obj(
            r#"{
                "id": "h-1",
                "type": "pokemon-herd",
                "pokemon": "stray",
                "level": "1-5",
                "levelRange": "10-20",
                "maxHerdSize": 4,
                "minDistanceBetweenSpawns": 2.5,
                "herdablePokemon": [
                    {"pokemon": "a", "levelRange": "10-20", "weight": 2.0, "isLeader": true},
                    {"pokemon": "b", "levelRange": "10-15", "weight": 1.0, "maxTimes": 3}
                ]
            }"#,
        );
        let entry = SpawnEntry::decode(&raw);
        assert!(entry.spawn_type.is_herd());
        // Herd takes levelRange when both are present.
        assert_eq!(entry.level, "10-20");
        assert_eq!(entry.max_herd_size, 4);
        assert_eq!(entry.herd_members.len(), 2);
        assert!(entry.herd_members[0].is_leader);
        assert_eq!(entry.herd_members[1].max_times, 3);

        let encoded = entry.encode();
        assert!(!encoded.contains_key("pokemon"));
        assert!(!encoded.contains_key("level"));
        assert!(encoded.contains_key("levelRange"));
        assert!(encoded.contains_key("herdablePokemon"));
    }

    #[test]
    fn test_herd_member_encoding_rules() {
        let leader = HerdMember {
            pokemon: "arcanine".to_string(),
            level_range: "30-40".to_string(),
            weight: 1.0,
            is_leader: false,
            max_times: 0,
            level_range_offset: String::new(),
        };
        let encoded = leader.encode();
        // isLeader is always present, maxTimes and the offset only when set.
        assert_eq!(encoded.get("isLeader"), Some(&Value::Bool(false)));
        assert!(!encoded.contains_key("maxTimes"));
        assert!(!encoded.contains_key("levelRangeOffset"));
    }

    #[test]
    fn test_drop_entry_without_item_is_excluded() {
        let drops = Drops {
            amount: 2,
            entries: vec![
                DropEntry {
                    item: String::new(),
                    quantity_range: String::new(),
                    percentage: 50.0,
                },
                DropEntry {
                    item: "minecraft:feather".to_string(),
                    quantity_range: "1-2".to_string(),
                    percentage: 0.0,
                },
            ],
        };
        let encoded = drops.encode();
        let entries = encoded
            .get("entries")
            .and_then(Value::as_array)
            .expect("entries should be present");
        assert_eq!(entries.len(), 1);
        let kept = entries[0].as_object().expect("entry should be an object");
        assert_eq!(kept.get("item"), Some(&Value::from("minecraft:feather")));
        // A zero percentage is omitted.
        assert!(!kept.contains_key("percentage"));
    }

    #[test]
    fn test_disabled_drops_key_absent() {
        let entry = SpawnEntry::default();
        assert!(!entry.encode().contains_key("drops"));
    }

    #[test]
    fn test_empty_presets_omitted() {
        let mut entry = SpawnEntry::default();
        entry.presets.clear();
        assert!(!entry.encode().contains_key("presets"));
        entry.presets.push("natural".to_string());
        assert!(entry.encode().contains_key("presets"));
    }

    #[test]
    fn test_unknown_preset_tokens_preserved() {
        let raw = obj(
            r#"{"id": "x", "type": "pokemon", "presets": ["natural", "my_custom_preset"]}"#,
        );
        let entry = SpawnEntry::decode(&raw);
        assert_eq!(entry.presets, vec!["natural", "my_custom_preset"]);
        let encoded = entry.encode();
        let presets = encoded.get("presets").and_then(Value::as_array).unwrap();
        assert_eq!(presets.len(), 2);
    }

    #[test]
    fn test_document_order_preserved() {
        let raw = obj(
            r#"{
                "enabled": false,
                "neededInstalledMods": ["modB", "modA"],
                "neededUninstalledMods": [],
                "spawns": [
                    {"id": "z-2", "type": "pokemon", "pokemon": "z"},
                    {"id": "a-1", "type": "pokemon", "pokemon": "a"}
                ]
            }"#,
        );
        let pool = SpawnPool::decode(&raw);
        assert!(!pool.enabled);
        assert_eq!(pool.needed_installed_mods, vec!["modB", "modA"]);
        assert_eq!(pool.spawns[0].id, "z-2");
        assert_eq!(pool.spawns[1].id, "a-1");

        let re = SpawnPool::decode(&pool.encode());
        assert_eq!(re, pool);
    }
}
