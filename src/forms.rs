//! Form model shared by both front-ends.
//!
//! Bridges the typed record model and widget state: numeric fields are
//! edited through string buffers, condition integers remember whether the
//! source file had an explicit value, and every list row carries a stable
//! generated id so add/delete preserves untouched siblings' widget
//! identity across re-renders.
//!
//! `commit` never fails: malformed numeric text falls back to the field's
//! documented default and is logged for diagnostics. A single bad field
//! never blocks saving the rest of the document.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::codec::{
    parse_f64_or, parse_opt_i32, parse_u32_or, Condition, DropEntry, Drops, HerdMember,
    SpawnEntry, SpawnPool, WeightMultiplier,
};
use crate::schema::{
    Bucket, MoonPhase, PositionType, SpawnType, TimeRange, CONDITION_BOOL_FIELDS,
    CONDITION_INT_FIELDS, CONDITION_LIST_FIELDS, CONDITION_STRING_FIELDS,
};
use crate::store::SpeciesFile;

static NEXT_ROW_ID: AtomicU64 = AtomicU64::new(1);

/// Stable identifier for a list row, unique for the process lifetime.
pub fn next_row_id() -> u64 {
    NEXT_ROW_ID.fetch_add(1, Ordering::Relaxed)
}

fn commit_f64(field: &str, text: &str, default: f64) -> f64 {
    let (value, fell_back) = parse_f64_or(text, default);
    if fell_back && !text.trim().is_empty() {
        tracing::warn!(field, text, default, "malformed number, using default");
    }
    value
}

fn commit_u32(field: &str, text: &str, default: u32) -> u32 {
    let (value, fell_back) = parse_u32_or(text, default);
    if fell_back && !text.trim().is_empty() {
        tracing::warn!(field, text, default, "malformed number, using default");
    }
    value
}

/// Edit buffer for a condition integer. `explicit` records whether the
/// loaded record had the field, which drives the omission rule on commit.
#[derive(Clone, Debug, Default)]
pub struct IntInput {
    pub text: String,
    pub explicit: bool,
}

/// Widget state for one condition (or anticondition, or a multiplier's
/// condition). Fields are parallel to the schema tables.
#[derive(Clone, Debug, Default)]
pub struct ConditionForm {
    pub time_range: TimeRange,
    pub moon_phase: MoonPhase,
    pub flags: [bool; CONDITION_BOOL_FIELDS.len()],
    pub ints: [IntInput; CONDITION_INT_FIELDS.len()],
    /// One entry per line, parallel to [`CONDITION_LIST_FIELDS`].
    pub lists: [String; CONDITION_LIST_FIELDS.len()],
    pub strings: [String; CONDITION_STRING_FIELDS.len()],
}

impl ConditionForm {
    pub fn from_condition(cond: &Condition) -> ConditionForm {
        let mut form = ConditionForm {
            time_range: cond.time_range,
            moon_phase: cond.moon_phase,
            flags: cond.flags,
            ..ConditionForm::default()
        };
        for (i, range) in cond.ranges.iter().enumerate() {
            if let Some(v) = range {
                form.ints[i] = IntInput {
                    text: v.to_string(),
                    explicit: true,
                };
            }
        }
        for (i, list) in cond.lists.iter().enumerate() {
            form.lists[i] = list.join("\n");
        }
        for (i, s) in cond.strings.iter().enumerate() {
            form.strings[i] = s.clone();
        }
        form
    }

    /// Build the condition this form currently describes. An integer field
    /// is kept when the source had it explicitly or the edited value is
    /// non-zero; blank or malformed text drops the field.
    pub fn commit(&self) -> Condition {
        let mut cond = Condition {
            time_range: self.time_range,
            moon_phase: self.moon_phase,
            flags: self.flags,
            ..Condition::default()
        };
        for (i, input) in self.ints.iter().enumerate() {
            match parse_opt_i32(&input.text) {
                Ok(Some(v)) if input.explicit || v != 0 => cond.ranges[i] = Some(v),
                Ok(_) => {}
                Err(()) => {
                    tracing::warn!(
                        field = CONDITION_INT_FIELDS[i],
                        text = %self.ints[i].text,
                        "malformed integer, dropping field"
                    );
                }
            }
        }
        for (i, buffer) in self.lists.iter().enumerate() {
            cond.lists[i] = buffer
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect();
        }
        for (i, s) in self.strings.iter().enumerate() {
            cond.strings[i] = s.trim().to_string();
        }
        cond
    }
}

/// Widget state for one herd member row.
#[derive(Clone, Debug)]
pub struct HerdMemberForm {
    pub row_id: u64,
    pub pokemon: String,
    pub level_range: String,
    pub weight: String,
    pub is_leader: bool,
    pub max_times: String,
    pub level_range_offset: String,
}

impl HerdMemberForm {
    pub fn from_member(member: &HerdMember) -> HerdMemberForm {
        HerdMemberForm {
            row_id: next_row_id(),
            pokemon: member.pokemon.clone(),
            level_range: member.level_range.clone(),
            weight: member.weight.to_string(),
            is_leader: member.is_leader,
            max_times: member.max_times.to_string(),
            level_range_offset: member.level_range_offset.clone(),
        }
    }

    /// Fresh row from the add-member template.
    pub fn template() -> HerdMemberForm {
        HerdMemberForm::from_member(&HerdMember::default())
    }

    pub fn commit(&self) -> HerdMember {
        HerdMember {
            pokemon: self.pokemon.clone(),
            level_range: self.level_range.clone(),
            weight: commit_f64("weight", &self.weight, 1.0),
            is_leader: self.is_leader,
            max_times: commit_u32("maxTimes", &self.max_times, 0),
            level_range_offset: self.level_range_offset.trim().to_string(),
        }
    }
}

/// Widget state for one weight multiplier row.
#[derive(Clone, Debug)]
pub struct MultiplierForm {
    pub row_id: u64,
    pub multiplier: String,
    pub condition: ConditionForm,
}

impl MultiplierForm {
    pub fn from_multiplier(wm: &WeightMultiplier) -> MultiplierForm {
        MultiplierForm {
            row_id: next_row_id(),
            multiplier: wm.multiplier.to_string(),
            condition: ConditionForm::from_condition(&wm.condition),
        }
    }

    pub fn template() -> MultiplierForm {
        MultiplierForm::from_multiplier(&WeightMultiplier::default())
    }

    pub fn commit(&self) -> WeightMultiplier {
        WeightMultiplier {
            multiplier: commit_f64("multiplier", &self.multiplier, 1.0),
            condition: self.condition.commit(),
        }
    }
}

/// Widget state for one drop entry row.
#[derive(Clone, Debug)]
pub struct DropEntryForm {
    pub row_id: u64,
    pub item: String,
    pub quantity_range: String,
    pub percentage: String,
}

impl DropEntryForm {
    pub fn from_entry(entry: &DropEntry) -> DropEntryForm {
        DropEntryForm {
            row_id: next_row_id(),
            item: entry.item.clone(),
            quantity_range: entry.quantity_range.clone(),
            percentage: entry.percentage.to_string(),
        }
    }

    pub fn template() -> DropEntryForm {
        DropEntryForm::from_entry(&DropEntry::default())
    }

    pub fn commit(&self) -> DropEntry {
        DropEntry {
            item: self.item.trim().to_string(),
            quantity_range: self.quantity_range.trim().to_string(),
            percentage: commit_f64("percentage", &self.percentage, 0.0),
        }
    }
}

/// Widget state for a spawn's drops section.
#[derive(Clone, Debug)]
pub struct DropsForm {
    pub enabled: bool,
    pub amount: String,
    pub entries: Vec<DropEntryForm>,
}

impl DropsForm {
    pub fn from_drops(drops: Option<&Drops>) -> DropsForm {
        match drops {
            Some(drops) => DropsForm {
                enabled: true,
                amount: drops.amount.to_string(),
                entries: drops.entries.iter().map(DropEntryForm::from_entry).collect(),
            },
            None => DropsForm {
                enabled: false,
                amount: "1".to_string(),
                entries: Vec::new(),
            },
        }
    }

    pub fn commit(&self) -> Option<Drops> {
        if !self.enabled {
            return None;
        }
        Some(Drops {
            amount: commit_u32("amount", &self.amount, 1).max(1),
            entries: self.entries.iter().map(DropEntryForm::commit).collect(),
        })
    }
}

/// Widget state for one spawn entry.
#[derive(Clone, Debug)]
pub struct SpawnForm {
    pub row_id: u64,
    pub id: String,
    pub spawn_type: SpawnType,
    pub pokemon: String,
    pub presets: Vec<String>,
    pub position: PositionType,
    pub bucket: Bucket,
    pub level: String,
    pub weight: String,
    pub max_herd_size: String,
    pub min_herd_distance: String,
    pub herd_members: Vec<HerdMemberForm>,
    pub multipliers: Vec<MultiplierForm>,
    pub condition: ConditionForm,
    pub anticondition: ConditionForm,
    pub drops: DropsForm,
}

impl SpawnForm {
    pub fn from_entry(entry: &SpawnEntry) -> SpawnForm {
        SpawnForm {
            row_id: next_row_id(),
            id: entry.id.clone(),
            spawn_type: entry.spawn_type,
            pokemon: entry.pokemon.clone(),
            presets: entry.presets.clone(),
            position: entry.position,
            bucket: entry.bucket,
            level: entry.level.clone(),
            weight: entry.weight.to_string(),
            max_herd_size: entry.max_herd_size.to_string(),
            min_herd_distance: entry.min_herd_distance.to_string(),
            herd_members: entry
                .herd_members
                .iter()
                .map(HerdMemberForm::from_member)
                .collect(),
            multipliers: entry
                .weight_multipliers
                .iter()
                .map(MultiplierForm::from_multiplier)
                .collect(),
            condition: ConditionForm::from_condition(&entry.condition),
            anticondition: ConditionForm::from_condition(&entry.anticondition),
            drops: DropsForm::from_drops(entry.drops.as_ref()),
        }
    }

    /// Change the variant, discarding the fields not valid for the new
    /// one: entering herd mode clears `pokemon`, leaving it resets the
    /// herd settings and member list.
    pub fn set_spawn_type(&mut self, new_type: SpawnType) {
        if new_type == self.spawn_type {
            return;
        }
        let was_herd = self.spawn_type.is_herd();
        self.spawn_type = new_type;
        if new_type.is_herd() {
            self.pokemon.clear();
        } else if was_herd {
            self.max_herd_size = "5".to_string();
            self.min_herd_distance = "1.5".to_string();
            self.herd_members.clear();
        }
    }

    pub fn add_herd_member(&mut self) {
        self.herd_members.push(HerdMemberForm::template());
    }

    pub fn remove_herd_member(&mut self, row_id: u64) {
        self.herd_members.retain(|m| m.row_id != row_id);
    }

    pub fn add_multiplier(&mut self) {
        self.multipliers.push(MultiplierForm::template());
    }

    pub fn remove_multiplier(&mut self, row_id: u64) {
        self.multipliers.retain(|m| m.row_id != row_id);
    }

    pub fn commit(&self) -> SpawnEntry {
        let is_herd = self.spawn_type.is_herd();
        SpawnEntry {
            id: self.id.clone(),
            spawn_type: self.spawn_type,
            pokemon: if is_herd {
                String::new()
            } else {
                self.pokemon.clone()
            },
            presets: self.presets.clone(),
            position: self.position,
            bucket: self.bucket,
            level: self.level.clone(),
            weight: commit_f64("weight", &self.weight, 1.0),
            max_herd_size: commit_u32("maxHerdSize", &self.max_herd_size, 5).max(1),
            min_herd_distance: commit_f64(
                "minDistanceBetweenSpawns",
                &self.min_herd_distance,
                1.5,
            ),
            herd_members: if is_herd {
                self.herd_members.iter().map(HerdMemberForm::commit).collect()
            } else {
                Vec::new()
            },
            weight_multipliers: self.multipliers.iter().map(MultiplierForm::commit).collect(),
            condition: self.condition.commit(),
            anticondition: self.anticondition.commit(),
            drops: self.drops.commit(),
        }
    }
}

/// Widget state for one species' whole document.
#[derive(Clone, Debug)]
pub struct DocumentForm {
    pub file: SpeciesFile,
    pub enabled: bool,
    /// Comma-separated edit buffers, split on commit.
    pub installed_mods: String,
    pub uninstalled_mods: String,
    pub spawns: Vec<SpawnForm>,
}

impl DocumentForm {
    pub fn from_pool(file: SpeciesFile, pool: &SpawnPool) -> DocumentForm {
        DocumentForm {
            file,
            enabled: pool.enabled,
            installed_mods: pool.needed_installed_mods.join(", "),
            uninstalled_mods: pool.needed_uninstalled_mods.join(", "),
            spawns: pool.spawns.iter().map(SpawnForm::from_entry).collect(),
        }
    }

    /// Append a new spawn from the default template, named after this
    /// document's species.
    pub fn add_spawn(&mut self) {
        let template = SpawnEntry::template(&self.file.species, self.spawns.len());
        self.spawns.push(SpawnForm::from_entry(&template));
    }

    pub fn remove_spawn(&mut self, row_id: u64) {
        self.spawns.retain(|s| s.row_id != row_id);
    }

    pub fn commit(&self) -> SpawnPool {
        SpawnPool {
            enabled: self.enabled,
            needed_installed_mods: split_mods(&self.installed_mods),
            needed_uninstalled_mods: split_mods(&self.uninstalled_mods),
            spawns: self.spawns.iter().map(SpawnForm::commit).collect(),
        }
    }
}

fn split_mods(buffer: &str) -> Vec<String> {
    buffer
        .split(',')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_weight_falls_back() {
        let mut form = SpawnForm::from_entry(&SpawnEntry::default());
        form.weight = "heavy".to_string();
        assert_eq!(form.commit().weight, 1.0);
    }

    #[test]
    fn test_explicit_zero_kept_absent_zero_dropped() {
        let mut cond = Condition::default();
        cond.set_range("minSkyLight", Some(0));
        let mut form = ConditionForm::from_condition(&cond);

        // minY was absent in the source; typing 0 must not materialize it.
        let min_y = CONDITION_INT_FIELDS
            .iter()
            .position(|f| *f == "minY")
            .unwrap();
        form.ints[min_y].text = "0".to_string();

        let committed = form.commit();
        assert_eq!(committed.range("minSkyLight"), Some(0));
        assert_eq!(committed.range("minY"), None);

        // A non-zero edit always materializes the field.
        form.ints[min_y].text = "64".to_string();
        assert_eq!(form.commit().range("minY"), Some(64));
    }

    #[test]
    fn test_type_switch_discards_variant_fields() {
        let mut entry = SpawnEntry::default();
        entry.pokemon = "pidgey".to_string();
        let mut form = SpawnForm::from_entry(&entry);

        form.set_spawn_type(SpawnType::PokemonHerd);
        assert!(form.pokemon.is_empty());
        form.add_herd_member();
        form.max_herd_size = "9".to_string();

        form.set_spawn_type(SpawnType::Pokemon);
        assert!(form.herd_members.is_empty());
        assert_eq!(form.max_herd_size, "5");

        let committed = form.commit();
        assert!(committed.herd_members.is_empty());
        assert!(!committed.encode().contains_key("maxHerdSize"));
    }

    #[test]
    fn test_new_herd_member_matches_default_template() {
        let mut entry = SpawnEntry::default();
        entry.spawn_type = SpawnType::PokemonHerd;
        let mut form = SpawnForm::from_entry(&entry);
        assert!(form.herd_members.is_empty());

        form.add_herd_member();
        let committed = form.commit();
        assert_eq!(committed.herd_members.len(), 1);
        let member = &committed.herd_members[0];
        assert_eq!(member.pokemon, "");
        assert_eq!(member.level_range, "1-10");
        assert_eq!(member.weight, 1.0);
    }

    #[test]
    fn test_row_ids_stable_across_deletion() {
        let mut entry = SpawnEntry::default();
        entry.spawn_type = SpawnType::PokemonHerd;
        let mut form = SpawnForm::from_entry(&entry);
        form.add_herd_member();
        form.add_herd_member();
        form.add_herd_member();
        form.herd_members[1].pokemon = "kept".to_string();

        let survivor = form.herd_members[1].row_id;
        let doomed = form.herd_members[0].row_id;
        form.remove_herd_member(doomed);

        assert_eq!(form.herd_members.len(), 2);
        assert_eq!(form.herd_members[0].row_id, survivor);
        assert_eq!(form.herd_members[0].pokemon, "kept");
    }

    #[test]
    fn test_document_round_trip_without_edits() {
        let raw: serde_json::Value = serde_json::from_str(
            r#"{
                "enabled": true,
                "neededInstalledMods": ["some_mod"],
                "neededUninstalledMods": [],
                "spawns": [{
                    "id": "pidgey-1",
                    "type": "pokemon",
                    "pokemon": "pidgey",
                    "presets": ["natural"],
                    "spawnablePositionType": "grounded",
                    "bucket": "common",
                    "level": "1-10",
                    "weight": 1.0,
                    "condition": {"biomes": ["plains"], "minSkyLight": 7}
                }]
            }"#,
        )
        .unwrap();
        let pool = SpawnPool::decode(raw.as_object().unwrap());
        let file = SpeciesFile::from_file_name("0016_pidgey.json");
        let form = DocumentForm::from_pool(file, &pool);
        assert_eq!(form.commit(), pool);
    }

    #[test]
    fn test_add_spawn_uses_species_template() {
        let file = SpeciesFile::from_file_name("0016_pidgey.json");
        let mut form = DocumentForm::from_pool(file, &SpawnPool::default());
        form.add_spawn();
        let pool = form.commit();
        assert_eq!(pool.spawns.len(), 1);
        assert_eq!(pool.spawns[0].id, "pidgey-1");
        assert_eq!(pool.spawns[0].pokemon, "pidgey");
        assert_eq!(pool.spawns[0].presets, vec!["natural"]);
        assert_eq!(pool.spawns[0].level, "1-50");
    }
}
