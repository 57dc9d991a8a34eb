//! JSON directory storage for faction records.
//!
//! Each faction is written to `<data_dir>/<id>.json` as the map produced by
//! [`FactionRecord::to_map`], plus its home when one is set.

use faction_data::{
    FactionContext, FactionError, FactionId, FactionPersistence, FactionRecord, PersistenceError,
};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from reading or writing faction files.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("IO error on {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON in {}: {}", .path.display(), .source)]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{} holds faction '{}' but is not named {}.json", .path.display(), .id, .id)]
    IdMismatch { path: PathBuf, id: String },
    #[error("could not load faction from {}: {}", .path.display(), .source)]
    Faction {
        path: PathBuf,
        #[source]
        source: FactionError,
    },
}

/// Stores one JSON file per faction in a directory.
#[derive(Debug, Clone)]
pub struct JsonDataProvider {
    dir: PathBuf,
    pretty: bool,
}

impl JsonDataProvider {
    /// Creates a provider for `dir`, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>, pretty: bool) -> Result<Self, ProviderError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| ProviderError::Io {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir, pretty })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file holding `id`.
    pub fn path_for(&self, id: &FactionId) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }

    /// Writes the record's map to its file.
    ///
    /// The record map carries no home, so a set home is stored alongside it
    /// under `home` in the `x:y:z:level` text form.
    pub fn write(&self, faction: &FactionRecord) -> Result<PathBuf, ProviderError> {
        let path = self.path_for(faction.id());
        let mut map = faction.to_map();
        if let Some(home) = faction.home() {
            map.insert("home".to_string(), serde_json::Value::from(home.to_string()));
        }
        let value = serde_json::Value::Object(map);
        let json = if self.pretty {
            serde_json::to_string_pretty(&value)
        } else {
            serde_json::to_string(&value)
        }
        .map_err(|source| ProviderError::Json {
            path: path.clone(),
            source,
        })?;

        let io_err = |source| ProviderError::Io {
            path: path.clone(),
            source,
        };
        let mut file = fs::File::create(&path).map_err(io_err)?;
        writeln!(file, "{}", json).map_err(io_err)?;
        file.sync_all().map_err(io_err)?;

        tracing::debug!(faction = %faction.id(), path = %path.display(), "wrote faction file");
        Ok(path)
    }

    /// Reads a single faction file.
    ///
    /// The file must be named after the `id` it holds; a mismatch is rejected
    /// before any member is bound.
    pub fn read(&self, path: &Path, ctx: &FactionContext<'_>) -> Result<FactionRecord, ProviderError> {
        let content = fs::read_to_string(path).map_err(|source| ProviderError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let value: serde_json::Value =
            serde_json::from_str(&content).map_err(|source| ProviderError::Json {
                path: path.to_path_buf(),
                source,
            })?;
        if let Some(id) = value.get("id").and_then(serde_json::Value::as_str) {
            let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
            if stem != id {
                return Err(ProviderError::IdMismatch {
                    path: path.to_path_buf(),
                    id: id.to_string(),
                });
            }
        }
        FactionRecord::from_value(&value, ctx).map_err(|source| ProviderError::Faction {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Paths of every `*.json` file in the data directory, sorted.
    pub fn faction_files(&self) -> Result<Vec<PathBuf>, ProviderError> {
        let entries = fs::read_dir(&self.dir).map_err(|source| ProviderError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| ProviderError::Io {
                path: self.dir.clone(),
                source,
            })?;
            let path = entry.path();
            if path.is_file() && path.extension().map_or(false, |ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(paths)
    }

    /// Loads every stored faction in file-name order.
    pub fn load_all(&self, ctx: &FactionContext<'_>) -> Result<Vec<FactionRecord>, ProviderError> {
        let records = self
            .faction_files()?
            .iter()
            .map(|path| self.read(path, ctx))
            .collect::<Result<Vec<_>, _>>()?;
        tracing::info!(count = records.len(), dir = %self.dir.display(), "loaded factions");
        Ok(records)
    }

    /// Removes the stored file for `id`. Returns false if there was none.
    pub fn delete(&self, id: &FactionId) -> Result<bool, ProviderError> {
        let path = self.path_for(id);
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(ProviderError::Io { path, source }),
        }
    }
}

impl FactionPersistence for JsonDataProvider {
    fn save_faction(&self, faction: &FactionRecord) -> Result<(), PersistenceError> {
        self.write(faction)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{LevelSet, MemberDirectory};
    use faction_data::TracingWarnings;
    use serde_json::json;
    use tempfile::tempdir;

    struct Host {
        members: MemberDirectory,
        levels: LevelSet,
    }

    impl Host {
        fn new() -> Self {
            Self {
                members: MemberDirectory::new(),
                levels: LevelSet::new(["world"]),
            }
        }

        fn ctx(&self) -> FactionContext<'_> {
            FactionContext {
                players: &self.members,
                worlds: &self.levels,
                warnings: &TracingWarnings,
            }
        }
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempdir().unwrap();
        let provider = JsonDataProvider::new(dir.path(), true).unwrap();
        let host = Host::new();
        let record = FactionRecord::from_value(
            &json!({ "id": "f1", "name": "Alpha", "members": ["steve"], "powerBoost": 3 }),
            &host.ctx(),
        )
        .unwrap();

        let path = provider.write(&record).unwrap();
        assert_eq!(path, dir.path().join("f1.json"));

        let loaded = provider.read(&path, &host.ctx()).unwrap();
        assert_eq!(loaded, record);
    }

    #[test]
    fn test_load_all_skips_other_files() {
        let dir = tempdir().unwrap();
        let provider = JsonDataProvider::new(dir.path(), false).unwrap();
        fs::write(dir.path().join("b.json"), r#"{"id":"b","name":"Beta"}"#).unwrap();
        fs::write(dir.path().join("a.json"), r#"{"id":"a","name":"Alpha"}"#).unwrap();
        fs::write(dir.path().join("notes.txt"), "not a faction").unwrap();

        let host = Host::new();
        let records = provider.load_all(&host.ctx()).unwrap();

        let names: Vec<&str> = records.iter().map(|r| r.name()).collect();
        assert_eq!(names, vec!["Alpha", "Beta"]);
    }

    #[test]
    fn test_load_reports_bad_file() {
        let dir = tempdir().unwrap();
        let provider = JsonDataProvider::new(dir.path(), false).unwrap();
        fs::write(dir.path().join("broken.json"), "{ not json").unwrap();
        fs::write(dir.path().join("nameless.json"), r#"{"id":"x"}"#).unwrap();

        let host = Host::new();
        let err = provider.read(&dir.path().join("broken.json"), &host.ctx()).unwrap_err();
        assert!(matches!(err, ProviderError::Json { .. }));

        let err = provider.read(&dir.path().join("nameless.json"), &host.ctx()).unwrap_err();
        assert!(matches!(
            err,
            ProviderError::Faction {
                source: FactionError::MissingField { field: "name" },
                ..
            }
        ));
    }

    #[test]
    fn test_home_survives_write() {
        let dir = tempdir().unwrap();
        let provider = JsonDataProvider::new(dir.path(), false).unwrap();
        let host = Host::new();
        let record = FactionRecord::from_value(
            &json!({ "id": "f1", "name": "Alpha", "home": "4:70:-9:world" }),
            &host.ctx(),
        )
        .unwrap();

        let path = provider.write(&record).unwrap();

        let stored: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(stored["home"], "4:70:-9:world");
        let loaded = provider.read(&path, &host.ctx()).unwrap();
        assert!(loaded.has_home(&host.levels));
        assert_eq!(loaded, record);
    }

    #[test]
    fn test_unset_home_is_not_written() {
        let dir = tempdir().unwrap();
        let provider = JsonDataProvider::new(dir.path(), false).unwrap();
        let host = Host::new();
        let record =
            FactionRecord::from_value(&json!({ "id": "f1", "name": "Alpha" }), &host.ctx()).unwrap();

        let path = provider.write(&record).unwrap();

        let stored: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert!(stored.get("home").is_none());
    }

    #[test]
    fn test_file_name_must_match_id() {
        let dir = tempdir().unwrap();
        let provider = JsonDataProvider::new(dir.path(), false).unwrap();
        fs::write(
            dir.path().join("alpha.json"),
            r#"{"id":"f1","name":"Alpha","members":["steve"]}"#,
        )
        .unwrap();
        let host = Host::new();

        let err = provider.load_all(&host.ctx()).unwrap_err();

        assert!(matches!(err, ProviderError::IdMismatch { ref id, .. } if id == "f1"));
        assert!(host.members.find("steve").is_none());
    }

    #[test]
    fn test_delete() {
        let dir = tempdir().unwrap();
        let provider = JsonDataProvider::new(dir.path(), false).unwrap();
        fs::write(dir.path().join("f1.json"), "{}").unwrap();

        assert!(provider.delete(&FactionId::from("f1")).unwrap());
        assert!(!provider.delete(&FactionId::from("f1")).unwrap());
    }

    #[test]
    fn test_save_faction_creates_file() {
        let dir = tempdir().unwrap();
        let provider = JsonDataProvider::new(dir.path().join("nested"), false).unwrap();
        let host = Host::new();
        let record =
            FactionRecord::from_value(&json!({ "id": "f1", "name": "Alpha" }), &host.ctx()).unwrap();

        provider.save_faction(&record).unwrap();

        let stored: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(provider.path_for(record.id())).unwrap())
                .unwrap();
        assert_eq!(stored, record.to_value());
    }
}
