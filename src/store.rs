//! Directory-backed spawn file store.
//!
//! One JSON file per species, UTF-8, 4-space indented, trailing newline,
//! named `{4-digit dex}_{lowercase_underscored_name}.json`. Herd variants
//! may carry a `_herd` suffix; that is a name-matching convention only and
//! nothing here enforces it. The store is the only component that touches
//! the filesystem for record data — the codec layer never does I/O.

use std::collections::BTreeSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::codec::SpawnPool;
use crate::error::StoreError;

/// One species' spawn configuration file, as enumerated from disk.
/// Immutable once listed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpeciesFile {
    pub file_name: String,
    /// National dex number, absent for non-standard file names.
    pub dex: Option<u32>,
    /// Lowercase species token (underscores intact), empty when the name
    /// does not follow the `{dex}_{name}.json` convention.
    pub species: String,
}

impl SpeciesFile {
    /// Parse a file name of the form `0016_pidgey.json`. Names that don't
    /// match still produce a usable entry with no dex number.
    pub fn from_file_name(file_name: &str) -> SpeciesFile {
        let parsed = file_name
            .strip_suffix(".json")
            .and_then(|stem| stem.split_once('_'))
            .and_then(|(digits, rest)| {
                if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
                    digits.parse::<u32>().ok().map(|dex| (dex, rest.to_string()))
                } else {
                    None
                }
            });
        match parsed {
            Some((dex, species)) => SpeciesFile {
                file_name: file_name.to_string(),
                dex: Some(dex),
                species,
            },
            None => SpeciesFile {
                file_name: file_name.to_string(),
                dex: None,
                species: String::new(),
            },
        }
    }

    /// Display label for list widgets: `#0016 Pidgey`, or the raw file
    /// name for non-standard files.
    pub fn display_name(&self) -> String {
        match self.dex {
            Some(dex) => format!("#{:04} {}", dex, title_case(&self.species)),
            None => self.file_name.clone(),
        }
    }

    /// Species token with the `_herd` naming suffix stripped.
    pub fn base_species(&self) -> &str {
        self.species.strip_suffix("_herd").unwrap_or(&self.species)
    }
}

fn title_case(token: &str) -> String {
    token
        .split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Repository over a directory of spawn files.
pub struct SpawnFileStore {
    dir: PathBuf,
}

impl SpawnFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> SpawnFileStore {
        SpawnFileStore { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// True when the directory exists and holds at least one spawn file.
    /// The surfaces use this to decide whether a first-run seed is needed.
    pub fn is_populated(&self) -> bool {
        !self.list_files().is_empty()
    }

    /// Enumerate spawn files, sorted by file name. A missing directory
    /// yields an empty list rather than an error.
    pub fn list_files(&self) -> Vec<SpeciesFile> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(_) => return Vec::new(),
        };
        let mut names: Vec<String> = entries
            .filter_map(Result::ok)
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| name.ends_with(".json"))
            .collect();
        names.sort();
        names
            .iter()
            .map(|name| SpeciesFile::from_file_name(name))
            .collect()
    }

    /// Distinct species tokens across all files, `_herd` suffix stripped,
    /// sorted. Feeds the herd-member species picker.
    pub fn species_names(&self) -> Vec<String> {
        let names: BTreeSet<String> = self
            .list_files()
            .iter()
            .filter(|f| f.dex.is_some())
            .map(|f| f.base_species().to_string())
            .collect();
        names.into_iter().collect()
    }

    /// Load and decode one species' record set.
    pub fn load(&self, file: &SpeciesFile) -> Result<SpawnPool, StoreError> {
        let path = self.dir.join(&file.file_name);
        let text = fs::read_to_string(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StoreError::NotFound(path.clone())
            } else {
                StoreError::Io(e)
            }
        })?;
        let value: Value = serde_json::from_str(&text).map_err(|e| StoreError::Parse {
            path: path.clone(),
            message: e.to_string(),
        })?;
        let root = value.as_object().ok_or_else(|| StoreError::Parse {
            path: path.clone(),
            message: "root is not a JSON object".to_string(),
        })?;
        Ok(SpawnPool::decode(root))
    }

    /// Encode and persist one species' record set. The write goes to a
    /// temporary file in the same directory and is renamed over the
    /// target, so a failed write never truncates an existing file.
    pub fn save(&self, file: &SpeciesFile, pool: &SpawnPool) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir).map_err(StoreError::Io)?;
        let path = self.dir.join(&file.file_name);
        let tmp = self.dir.join(format!(".{}.tmp", file.file_name));
        let bytes = render_json(&Value::Object(pool.encode()));
        let result = fs::File::create(&tmp)
            .and_then(|mut f| f.write_all(&bytes))
            .and_then(|_| fs::rename(&tmp, &path));
        if let Err(e) = result {
            let _ = fs::remove_file(&tmp);
            return Err(StoreError::Io(e));
        }
        Ok(())
    }
}

/// Serialize with 4-space indentation and a trailing newline, matching
/// the upstream file format.
pub(crate) fn render_json(value: &Value) -> Vec<u8> {
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    // Serializing a Value into a Vec cannot fail.
    serde::Serialize::serialize(value, &mut ser).expect("JSON value serialization");
    buf.push(b'\n');
    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::SpawnEntry;

    fn temp_store(tag: &str) -> SpawnFileStore {
        let dir = std::env::temp_dir().join(format!("spawn_editor_test_{}", tag));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).expect("create temp dir");
        SpawnFileStore::new(dir)
    }

    #[test]
    fn test_file_name_parsing() {
        let file = SpeciesFile::from_file_name("0016_pidgey.json");
        assert_eq!(file.dex, Some(16));
        assert_eq!(file.species, "pidgey");
        assert_eq!(file.display_name(), "#0016 Pidgey");

        let herd = SpeciesFile::from_file_name("0019_rattata_herd.json");
        assert_eq!(herd.base_species(), "rattata");

        let multiword = SpeciesFile::from_file_name("0122_mr_mime.json");
        assert_eq!(multiword.display_name(), "#0122 Mr Mime");

        let odd = SpeciesFile::from_file_name("README.json");
        assert_eq!(odd.dex, None);
        assert_eq!(odd.display_name(), "README.json");
    }

    #[test]
    fn test_list_is_sorted_and_filtered() {
        let store = temp_store("list");
        for name in ["0002_ivysaur.json", "0001_bulbasaur.json", "notes.txt"] {
            fs::write(store.dir().join(name), "{}").expect("write");
        }
        let files = store.list_files();
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].file_name, "0001_bulbasaur.json");
        assert_eq!(files[1].file_name, "0002_ivysaur.json");
        let _ = fs::remove_dir_all(store.dir());
    }

    #[test]
    fn test_species_names_strip_herd_suffix() {
        let store = temp_store("names");
        for name in [
            "0019_rattata.json",
            "0019_rattata_herd.json",
            "0016_pidgey.json",
        ] {
            fs::write(store.dir().join(name), "{}").expect("write");
        }
        assert_eq!(store.species_names(), vec!["pidgey", "rattata"]);
        let _ = fs::remove_dir_all(store.dir());
    }

    #[test]
    fn test_save_format_and_load_round_trip() {
        let store = temp_store("roundtrip");
        let file = SpeciesFile::from_file_name("0016_pidgey.json");

        let mut pool = SpawnPool::default();
        let mut entry = SpawnEntry::template("pidgey", 0);
        entry.condition.set_range("minSkyLight", Some(7));
        pool.spawns.push(entry);

        store.save(&file, &pool).expect("save failed");

        let text = fs::read_to_string(store.dir().join("0016_pidgey.json")).expect("read");
        assert!(text.ends_with('\n'));
        assert!(text.contains("    \"enabled\": true"));

        let loaded = store.load(&file).expect("load failed");
        assert_eq!(loaded, pool);
        let _ = fs::remove_dir_all(store.dir());
    }

    #[test]
    fn test_load_missing_and_invalid() {
        let store = temp_store("errors");
        let missing = SpeciesFile::from_file_name("0001_bulbasaur.json");
        assert!(matches!(
            store.load(&missing),
            Err(StoreError::NotFound(_))
        ));

        fs::write(store.dir().join("0002_ivysaur.json"), "{not json").expect("write");
        let broken = SpeciesFile::from_file_name("0002_ivysaur.json");
        assert!(matches!(store.load(&broken), Err(StoreError::Parse { .. })));

        fs::write(store.dir().join("0003_venusaur.json"), "[1, 2]").expect("write");
        let wrong_shape = SpeciesFile::from_file_name("0003_venusaur.json");
        assert!(matches!(
            store.load(&wrong_shape),
            Err(StoreError::Parse { .. })
        ));
        let _ = fs::remove_dir_all(store.dir());
    }
}
