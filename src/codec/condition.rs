//! Condition codec.
//!
//! A condition is a sparse key-value predicate attached to a spawn entry
//! or weight multiplier. Fields are stored in schema order, parallel to
//! the field-name tables in [`crate::schema`], so both front-ends and the
//! codec can walk them uniformly.

use serde_json::{Map, Value};

use crate::schema::{
    MoonPhase, TimeRange, CONDITION_BOOL_FIELDS, CONDITION_INT_FIELDS, CONDITION_LIST_FIELDS,
    CONDITION_STRING_FIELDS,
};

/// Decoded condition. Integer fields keep `Some(0)` (explicit zero in the
/// source) distinct from `None` (absent), which drives the re-encode rule:
/// a field absent in the source and edited back to zero stays omitted,
/// while an explicit zero survives a round trip.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Condition {
    pub time_range: TimeRange,
    pub moon_phase: MoonPhase,
    /// Parallel to [`CONDITION_BOOL_FIELDS`].
    pub flags: [bool; CONDITION_BOOL_FIELDS.len()],
    /// Parallel to [`CONDITION_INT_FIELDS`].
    pub ranges: [Option<i32>; CONDITION_INT_FIELDS.len()],
    /// Parallel to [`CONDITION_LIST_FIELDS`].
    pub lists: [Vec<String>; CONDITION_LIST_FIELDS.len()],
    /// Parallel to [`CONDITION_STRING_FIELDS`].
    pub strings: [String; CONDITION_STRING_FIELDS.len()],
}

impl Condition {
    /// Decode a raw condition object.
    ///
    /// This is lossy: keys outside the schema tables are dropped, so
    /// hand-authored files with experimental condition keys lose that
    /// data on an edit-and-save cycle. Booleans accept only `true`/`false`
    /// values; a numeric `moonPhase` (seen in older files) is coerced to
    /// its string form before matching, and any token outside the
    /// vocabulary falls back to the unset choice.
    pub fn decode(raw: &Map<String, Value>) -> Condition {
        let mut cond = Condition::default();
        for (key, value) in raw {
            if key == "timeRange" {
                if let Some(token) = value.as_str() {
                    cond.time_range = TimeRange::from_token(token);
                }
            } else if key == "moonPhase" {
                let token = match value {
                    Value::String(s) => s.clone(),
                    Value::Number(n) => n.to_string(),
                    _ => String::new(),
                };
                cond.moon_phase = MoonPhase::from_token(&token);
            } else if let Some(i) = field_index(&CONDITION_BOOL_FIELDS, key) {
                cond.flags[i] = value.as_bool().unwrap_or(false);
            } else if let Some(i) = field_index(&CONDITION_INT_FIELDS, key) {
                cond.ranges[i] = value
                    .as_i64()
                    .or_else(|| value.as_f64().map(|v| v as i64))
                    .map(|v| v as i32);
            } else if let Some(i) = field_index(&CONDITION_LIST_FIELDS, key) {
                if let Some(items) = value.as_array() {
                    cond.lists[i] = items
                        .iter()
                        .filter_map(|v| v.as_str().map(str::to_string))
                        .collect();
                }
            } else if let Some(i) = field_index(&CONDITION_STRING_FIELDS, key) {
                cond.strings[i] = value.as_str().unwrap_or_default().to_string();
            }
        }
        cond
    }

    /// Encode to a condition object, applying the omission rules: enums
    /// only when set, booleans only when true, integers only when present,
    /// lists and strings only when non-empty. An empty condition encodes
    /// to an empty object; the parent decides whether to keep the key.
    pub fn encode(&self) -> Map<String, Value> {
        let mut out = Map::new();
        if self.time_range != TimeRange::Unset {
            out.insert("timeRange".into(), self.time_range.as_str().into());
        }
        if self.moon_phase != MoonPhase::Unset {
            out.insert("moonPhase".into(), self.moon_phase.as_str().into());
        }
        for (i, field) in CONDITION_BOOL_FIELDS.iter().enumerate() {
            if self.flags[i] {
                out.insert((*field).into(), Value::Bool(true));
            }
        }
        for (i, field) in CONDITION_INT_FIELDS.iter().enumerate() {
            if let Some(v) = self.ranges[i] {
                out.insert((*field).into(), v.into());
            }
        }
        for (i, field) in CONDITION_LIST_FIELDS.iter().enumerate() {
            if !self.lists[i].is_empty() {
                let items: Vec<Value> = self.lists[i].iter().map(|s| s.as_str().into()).collect();
                out.insert((*field).into(), Value::Array(items));
            }
        }
        for (i, field) in CONDITION_STRING_FIELDS.iter().enumerate() {
            if !self.strings[i].is_empty() {
                out.insert((*field).into(), self.strings[i].as_str().into());
            }
        }
        out
    }

    /// True when every field is at its zero/false/empty/unset value.
    /// Empty conditions are dropped from their parent spawn entry.
    pub fn is_empty(&self) -> bool {
        self.time_range == TimeRange::Unset
            && self.moon_phase == MoonPhase::Unset
            && !self.flags.iter().any(|f| *f)
            && self.ranges.iter().all(|r| r.is_none())
            && self.lists.iter().all(|l| l.is_empty())
            && self.strings.iter().all(|s| s.is_empty())
    }

    /// Look up an integer field by its schema name (test convenience).
    pub fn range(&self, field: &str) -> Option<i32> {
        field_index(&CONDITION_INT_FIELDS, field).and_then(|i| self.ranges[i])
    }

    /// Set an integer field by its schema name. Unknown names are ignored.
    pub fn set_range(&mut self, field: &str, value: Option<i32>) {
        if let Some(i) = field_index(&CONDITION_INT_FIELDS, field) {
            self.ranges[i] = value;
        }
    }

    /// Look up a boolean field by its schema name.
    pub fn flag(&self, field: &str) -> bool {
        field_index(&CONDITION_BOOL_FIELDS, field).is_some_and(|i| self.flags[i])
    }

    /// Set a string-list field by its schema name. Unknown names are ignored.
    pub fn set_list(&mut self, field: &str, values: Vec<String>) {
        if let Some(i) = field_index(&CONDITION_LIST_FIELDS, field) {
            self.lists[i] = values;
        }
    }
}

fn field_index(table: &[&str], key: &str) -> Option<usize> {
    table.iter().position(|f| *f == key)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_str(json: &str) -> Condition {
        let value: Value = serde_json::from_str(json).expect("test JSON should parse");
        Condition::decode(value.as_object().expect("test JSON should be an object"))
    }

    #[test]
    fn test_decode_known_fields() {
        let cond = decode_str(
            r#"{
                "timeRange": "night",
                "moonPhase": "full",
                "canSeeSky": true,
                "minSkyLight": 0,
                "maxSkyLight": 7,
                "biomes": ["plains", "forest"],
                "bait": "worm"
            }"#,
        );
        assert_eq!(cond.time_range, TimeRange::Night);
        assert_eq!(cond.moon_phase, MoonPhase::Full);
        assert!(cond.flag("canSeeSky"));
        assert_eq!(cond.range("minSkyLight"), Some(0));
        assert_eq!(cond.range("maxSkyLight"), Some(7));
        assert_eq!(cond.range("minY"), None);
        assert_eq!(cond.lists[0], vec!["plains", "forest"]);
        assert_eq!(cond.strings[0], "worm");
    }

    #[test]
    fn test_unknown_keys_are_dropped() {
        let cond = decode_str(r#"{"customKey": 42, "minY": 10}"#);
        assert_eq!(cond.range("minY"), Some(10));
        let encoded = cond.encode();
        assert!(!encoded.contains_key("customKey"));
    }

    #[test]
    fn test_numeric_moon_phase_coerced_then_rejected() {
        // Older files carry a numeric moon phase; it is matched as a string
        // and anything outside the vocabulary falls back to unset.
        let cond = decode_str(r#"{"moonPhase": 3}"#);
        assert_eq!(cond.moon_phase, MoonPhase::Unset);
    }

    #[test]
    fn test_explicit_zero_survives_round_trip() {
        let cond = decode_str(r#"{"minSkyLight": 0}"#);
        let encoded = cond.encode();
        assert_eq!(encoded.get("minSkyLight"), Some(&Value::from(0)));
        // Absent stays absent.
        assert!(!encoded.contains_key("maxSkyLight"));
    }

    #[test]
    fn test_all_zero_condition_encodes_empty() {
        let cond = Condition::default();
        assert!(cond.is_empty());
        assert!(cond.encode().is_empty());
    }

    #[test]
    fn test_encode_decode_is_lossless() {
        let mut cond = Condition::default();
        cond.time_range = TimeRange::Dusk;
        cond.flags[1] = true; // isRaining
        cond.set_range("minY", Some(0));
        cond.set_range("maxY", Some(64));
        cond.set_list("structures", vec!["minecraft:stronghold".to_string()]);
        cond.strings[3] = "minecraft:water".to_string(); // fluid
        assert_eq!(Condition::decode(&cond.encode()), cond);
    }

    #[test]
    fn test_decode_encode_decode_idempotent() {
        let raw = r#"{
            "timeRange": "day",
            "isRaining": false,
            "minLight": 4,
            "maxLight": 0,
            "unknownKey": "dropped",
            "dimensions": ["minecraft:overworld"]
        }"#;
        let first = decode_str(raw);
        let second = Condition::decode(&first.encode());
        assert_eq!(second, first);
    }
}
