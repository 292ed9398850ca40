//! Seed provider: downloads the canonical spawn files from the upstream
//! repository and synthesizes blank records for species lacking spawn data.
//!
//! Both operations download everything into memory first and only then
//! touch the target directory, so a mid-flight network failure leaves the
//! prior on-disk state intact. Neither operation is cancellable; callers
//! run them on a worker thread and wait for completion or failure.

use std::collections::BTreeSet;
use std::fs;
use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;

use flate2::read::GzDecoder;
use serde::Deserialize;
use serde_json::Value;

use crate::codec::SpawnPool;
use crate::error::SeedError;
use crate::store::{render_json, SpawnFileStore};

/// Where the canonical data lives. The defaults point at the upstream
/// GitLab project; tests override them with a local server.
#[derive(Clone, Debug)]
pub struct SeedSource {
    /// API host, e.g. `https://gitlab.com`.
    pub base_url: String,
    /// URL-encoded project path for the repository API.
    pub project: String,
    /// Repository path of the spawn pool folder.
    pub spawn_path: String,
    /// Repository path of the species definition folder.
    pub species_path: String,
    /// Git ref to download.
    pub reference: String,
}

impl Default for SeedSource {
    fn default() -> Self {
        SeedSource {
            base_url: "https://gitlab.com".to_string(),
            project: "cable-mc%2Fcobblemon".to_string(),
            spawn_path: "common/src/main/resources/data/cobblemon/spawn_pool_world".to_string(),
            species_path: "common/src/main/resources/data/cobblemon/species".to_string(),
            reference: "main".to_string(),
        }
    }
}

/// Status events reported while seeding runs.
#[derive(Clone, Debug)]
pub enum SeedProgress {
    DownloadingSpawns,
    SpawnsDownloaded(usize),
    FetchingSpeciesTree,
    DownloadingSpecies(usize),
    SpeciesFound(usize),
    BlanksCreated(usize),
}

impl std::fmt::Display for SeedProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SeedProgress::DownloadingSpawns => write!(f, "Downloading spawn files..."),
            SeedProgress::SpawnsDownloaded(n) => write!(f, "{} spawn file(s) downloaded", n),
            SeedProgress::FetchingSpeciesTree => write!(f, "Fetching species list..."),
            SeedProgress::DownloadingSpecies(n) => {
                write!(f, "Downloading species data ({} generations)...", n)
            }
            SeedProgress::SpeciesFound(n) => write!(f, "{} species found", n),
            SeedProgress::BlanksCreated(n) => write!(f, "{} blank spawn file(s) created", n),
        }
    }
}

/// Summary of a completed seed run.
#[derive(Clone, Copy, Debug, Default)]
pub struct SeedReport {
    pub spawn_files_written: usize,
    pub blanks_created: usize,
    pub total_files: usize,
}

#[derive(Deserialize)]
struct TreeItem {
    name: String,
    #[serde(rename = "type")]
    item_type: String,
}

#[derive(Deserialize)]
struct SpeciesInfo {
    #[serde(rename = "nationalPokedexNumber")]
    national_pokedex_number: u32,
    name: String,
}

pub struct Seeder {
    source: SeedSource,
    target: PathBuf,
    client: reqwest::blocking::Client,
}

impl Seeder {
    pub fn new(target: impl Into<PathBuf>) -> Seeder {
        Seeder::with_source(target, SeedSource::default())
    }

    pub fn with_source(target: impl Into<PathBuf>, source: SeedSource) -> Seeder {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .expect("Failed to create HTTP client");
        Seeder {
            source,
            target: target.into(),
            client,
        }
    }

    /// Idempotent seed: download the canonical files, then write only the
    /// ones not already present, and create blank records for species
    /// with no spawn file at all. Existing files are never touched.
    pub fn ensure_seeded(
        &self,
        progress: &mut dyn FnMut(SeedProgress),
    ) -> Result<SeedReport, SeedError> {
        let staged = self.stage_downloads(progress)?;
        self.apply(staged, false, progress)
    }

    /// Destructive seed: wipe the target directory and repopulate it from
    /// a fresh download. The wipe only happens after both downloads have
    /// completed, so a failed fetch leaves the prior state untouched.
    pub fn reset_all(
        &self,
        progress: &mut dyn FnMut(SeedProgress),
    ) -> Result<SeedReport, SeedError> {
        let staged = self.stage_downloads(progress)?;
        let _ = fs::remove_dir_all(&self.target);
        self.apply(staged, true, progress)
    }

    /// Overwrite every existing spawn file with the blank template.
    /// Returns the number of files rewritten.
    pub fn blank_all(&self) -> Result<usize, SeedError> {
        let store = SpawnFileStore::new(&self.target);
        let blank = render_json(&Value::Object(SpawnPool::default().encode()));
        let files = store.list_files();
        for file in &files {
            fs::write(self.target.join(&file.file_name), &blank).map_err(SeedError::Io)?;
        }
        Ok(files.len())
    }

    fn stage_downloads(
        &self,
        progress: &mut dyn FnMut(SeedProgress),
    ) -> Result<StagedSeed, SeedError> {
        progress(SeedProgress::DownloadingSpawns);
        let spawn_files = self.download_folder(&self.source.spawn_path)?;
        progress(SeedProgress::SpawnsDownloaded(spawn_files.len()));

        progress(SeedProgress::FetchingSpeciesTree);
        let generations = self.count_generations()?;
        progress(SeedProgress::DownloadingSpecies(generations));

        let mut species = self.fetch_species()?;
        species.sort();
        species.dedup();
        progress(SeedProgress::SpeciesFound(species.len()));

        Ok(StagedSeed {
            spawn_files,
            species,
        })
    }

    fn apply(
        &self,
        staged: StagedSeed,
        overwrite: bool,
        progress: &mut dyn FnMut(SeedProgress),
    ) -> Result<SeedReport, SeedError> {
        fs::create_dir_all(&self.target).map_err(SeedError::Io)?;

        let mut written = 0;
        for (relative, bytes) in &staged.spawn_files {
            let path = self.target.join(relative);
            if !overwrite && path.exists() {
                continue;
            }
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(SeedError::Io)?;
            }
            fs::write(&path, bytes).map_err(SeedError::Io)?;
            written += 1;
        }

        // Species already covered by a numbered spawn file get no blank.
        let store = SpawnFileStore::new(&self.target);
        let existing_dex: BTreeSet<u32> = store
            .list_files()
            .iter()
            .filter_map(|f| f.dex)
            .collect();

        let blank = render_json(&Value::Object(SpawnPool::default().encode()));
        let mut blanks = 0;
        for (dex, name) in &staged.species {
            if existing_dex.contains(dex) {
                continue;
            }
            let path = self.target.join(format!("{:04}_{}.json", dex, name));
            if path.exists() {
                continue;
            }
            fs::write(&path, &blank).map_err(SeedError::Io)?;
            blanks += 1;
        }
        progress(SeedProgress::BlanksCreated(blanks));

        Ok(SeedReport {
            spawn_files_written: written,
            blanks_created: blanks,
            total_files: store.list_files().len(),
        })
    }

    /// Download a repository folder as a tar.gz archive and return the
    /// contained files as `(path relative to the folder, bytes)`.
    fn download_folder(&self, repo_path: &str) -> Result<Vec<(String, Vec<u8>)>, SeedError> {
        let bytes = self.fetch_archive(repo_path)?;
        let marker = repo_path.rsplit('/').next().unwrap_or(repo_path);

        let mut files = Vec::new();
        let mut archive = tar::Archive::new(GzDecoder::new(&bytes[..]));
        let entries = archive
            .entries()
            .map_err(|e| SeedError::Archive(e.to_string()))?;
        for entry in entries {
            let mut entry = entry.map_err(|e| SeedError::Archive(e.to_string()))?;
            if !entry.header().entry_type().is_file() {
                continue;
            }
            let path = entry
                .path()
                .map_err(|e| SeedError::Archive(e.to_string()))?
                .into_owned();
            let components: Vec<String> = path
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            let Some(idx) = components.iter().position(|c| c == marker) else {
                continue;
            };
            if idx + 1 >= components.len() {
                continue;
            }
            let relative = components[idx + 1..].join("/");
            let mut data = Vec::new();
            entry
                .read_to_end(&mut data)
                .map_err(|e| SeedError::Archive(e.to_string()))?;
            files.push((relative, data));
        }
        Ok(files)
    }

    fn fetch_archive(&self, repo_path: &str) -> Result<Vec<u8>, SeedError> {
        let url = format!(
            "{}/api/v4/projects/{}/repository/archive.tar.gz",
            self.source.base_url, self.source.project
        );
        let response = self
            .client
            .get(&url)
            .query(&[("sha", self.source.reference.as_str()), ("path", repo_path)])
            .send()
            .map_err(|e| SeedError::Network(e.to_string()))?;
        if !response.status().is_success() {
            return Err(SeedError::Api(format!(
                "archive request failed with status {}",
                response.status()
            )));
        }
        response
            .bytes()
            .map(|b| b.to_vec())
            .map_err(|e| SeedError::Network(e.to_string()))
    }

    /// Count the generation folders in the species tree. Informational
    /// only; a species archive is downloaded regardless.
    fn count_generations(&self) -> Result<usize, SeedError> {
        let url = format!(
            "{}/api/v4/projects/{}/repository/tree",
            self.source.base_url, self.source.project
        );
        let response = self
            .client
            .get(&url)
            .query(&[
                ("path", self.source.species_path.as_str()),
                ("ref", self.source.reference.as_str()),
                ("per_page", "100"),
            ])
            .send()
            .map_err(|e| SeedError::Network(e.to_string()))?;
        if !response.status().is_success() {
            return Err(SeedError::Api(format!(
                "tree request failed with status {}",
                response.status()
            )));
        }
        let items: Vec<TreeItem> = response
            .json()
            .map_err(|e| SeedError::Api(e.to_string()))?;
        Ok(items.iter().filter(|i| i.item_type == "tree").count())
    }

    /// Download every species definition and return `(dex, lowercase name)`
    /// pairs. Malformed species files are skipped.
    fn fetch_species(&self) -> Result<Vec<(u32, String)>, SeedError> {
        let files = self.download_folder(&self.source.species_path)?;
        let mut species = Vec::new();
        for (name, bytes) in files {
            if !name.ends_with(".json") {
                continue;
            }
            match serde_json::from_slice::<SpeciesInfo>(&bytes) {
                Ok(info) if !info.name.is_empty() => {
                    species.push((info.national_pokedex_number, info.name.to_lowercase()));
                }
                _ => {
                    tracing::debug!(file = %name, "skipping unparseable species file");
                }
            }
        }
        Ok(species)
    }
}

struct StagedSeed {
    spawn_files: Vec<(String, Vec<u8>)>,
    species: Vec<(u32, String)>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SpeciesFile;

    #[test]
    fn test_blank_template_matches_reference_shape() {
        let blank = render_json(&Value::Object(SpawnPool::default().encode()));
        let text = String::from_utf8(blank).expect("blank template is UTF-8");
        let value: Value = serde_json::from_str(&text).expect("blank template parses");
        let root = value.as_object().expect("blank template is an object");
        assert_eq!(root.get("enabled"), Some(&Value::Bool(true)));
        assert_eq!(root.get("neededInstalledMods"), Some(&Value::Array(vec![])));
        assert_eq!(
            root.get("neededUninstalledMods"),
            Some(&Value::Array(vec![]))
        );
        assert_eq!(root.get("spawns"), Some(&Value::Array(vec![])));
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn test_blank_all_overwrites_existing_files() {
        let dir = std::env::temp_dir().join("spawn_editor_test_blank_all");
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).expect("create temp dir");
        fs::write(
            dir.join("0016_pidgey.json"),
            r#"{"enabled": false, "spawns": [{"id": "x"}]}"#,
        )
        .expect("write");

        let seeder = Seeder::new(&dir);
        let count = seeder.blank_all().expect("blank_all failed");
        assert_eq!(count, 1);

        let store = SpawnFileStore::new(&dir);
        let file = SpeciesFile::from_file_name("0016_pidgey.json");
        let pool = store.load(&file).expect("load failed");
        assert_eq!(pool, SpawnPool::default());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_apply_skips_existing_without_overwrite() {
        let dir = std::env::temp_dir().join("spawn_editor_test_apply");
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).expect("create temp dir");
        fs::write(dir.join("0016_pidgey.json"), "{\"enabled\": false}\n").expect("write");

        let seeder = Seeder::new(&dir);
        let staged = StagedSeed {
            spawn_files: vec![
                ("0016_pidgey.json".to_string(), b"{\"enabled\": true}\n".to_vec()),
                ("0019_rattata.json".to_string(), b"{\"enabled\": true}\n".to_vec()),
            ],
            species: vec![(16, "pidgey".to_string()), (25, "pikachu".to_string())],
        };
        let report = seeder.apply(staged, false, &mut |_| {}).expect("apply failed");

        // The pre-existing file is untouched, the new one is written, and
        // only the species with no file at all gets a blank.
        assert_eq!(report.spawn_files_written, 1);
        assert_eq!(report.blanks_created, 1);
        let kept = fs::read_to_string(dir.join("0016_pidgey.json")).expect("read");
        assert_eq!(kept, "{\"enabled\": false}\n");
        assert!(dir.join("0025_pikachu.json").exists());
        let _ = fs::remove_dir_all(&dir);
    }
}
