//! Host-side storage for faction records.
//!
//! `faction-data` defines the record and the collaborator traits; this crate
//! supplies working implementations of those collaborators and ties them
//! together behind [`Factions`].
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────┐   <id>.json files   ┌──────────────────┐
//! │ data_dir/     │ ◀─────────────────▶ │ JsonDataProvider │
//! └───────────────┘                     └──────────────────┘
//!                                                ▲
//!        FactionRegistry + MemberDirectory       │ save_dirty()
//!        + LevelSet + DirtyTracker ──────── Factions
//! ```
//!
//! # Modules
//!
//! - [`config`]: TOML store configuration
//! - [`registry`]: In-memory faction registry, member directory, level set
//! - [`provider`]: JSON directory persistence

pub mod config;
pub mod provider;
pub mod registry;

// Re-export config types
pub use config::{
    default_config_toml, ConfigError, LevelsConfig, LoggingConfig, StorageConfig, StoreConfig,
};

// Re-export registry types
pub use registry::{
    generate_faction_id, DirtyTracker, FactionRegistry, LevelSet, Member, MemberDirectory,
};

// Re-export provider types
pub use provider::{JsonDataProvider, ProviderError};

use faction_data::{
    FactionContext, FactionError, FactionId, FactionRecord, TracingWarnings, WarningLog,
};
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors that can occur in store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("storage error: {0}")]
    Provider(#[from] ProviderError),
    #[error("faction error: {0}")]
    Faction(#[from] FactionError),
    #[error("no faction with id '{0}'")]
    UnknownFaction(FactionId),
    #[error("a faction named '{0}' already exists")]
    NameTaken(String),
}

/// Every faction the server knows about, plus the collaborators records
/// need while they are loaded, renamed and saved.
pub struct Factions {
    /// Loaded faction records
    registry: FactionRegistry,
    /// Players and their faction bindings
    members: MemberDirectory,
    /// Levels homes may refer to
    levels: LevelSet,
    /// Factions awaiting a save
    dirty: DirtyTracker,
    /// Backing storage
    provider: JsonDataProvider,
    /// Receives home warnings during load
    warnings: Box<dyn WarningLog>,
}

impl Factions {
    /// Creates an empty store over `provider`.
    pub fn new(provider: JsonDataProvider, levels: LevelSet) -> Self {
        Self {
            registry: FactionRegistry::new(),
            members: MemberDirectory::new(),
            levels,
            dirty: DirtyTracker::new(),
            provider,
            warnings: Box::new(TracingWarnings),
        }
    }

    /// Creates a store from configuration.
    pub fn from_config(config: &StoreConfig) -> Result<Self, StoreError> {
        let provider =
            JsonDataProvider::new(&config.storage.data_dir, config.storage.pretty_json)?;
        let levels = LevelSet::new(config.levels.loaded.iter().cloned());
        Ok(Self::new(provider, levels))
    }

    /// Replaces the sink for load warnings.
    pub fn with_warnings(mut self, warnings: Box<dyn WarningLog>) -> Self {
        self.warnings = warnings;
        self
    }

    fn context(&self) -> FactionContext<'_> {
        FactionContext {
            players: &self.members,
            worlds: &self.levels,
            warnings: self.warnings.as_ref(),
        }
    }

    /// Loads every stored faction into the registry.
    ///
    /// Returns the number of factions loaded. Loading is all or nothing: if
    /// any file fails, members bound by the files read before it are
    /// released and the registry is left untouched.
    pub fn load(&mut self) -> Result<usize, StoreError> {
        let mut records = Vec::new();
        for path in self.provider.faction_files()? {
            match self.provider.read(&path, &self.context()) {
                Ok(record) => records.push(record),
                Err(e) => {
                    self.release_unregistered(&records);
                    return Err(e.into());
                }
            }
        }

        let count = records.len();
        for record in records {
            self.registry.register(record);
        }
        tracing::info!(count, dir = %self.provider.dir().display(), "loaded factions");
        Ok(count)
    }

    /// Unbinds the members of records that never reached the registry.
    fn release_unregistered(&self, records: &[FactionRecord]) {
        for record in records {
            if self.registry.contains(record.id()) {
                continue;
            }
            let released = self.members.release_faction(record.id());
            tracing::debug!(faction = %record.id(), released, "rolled back member bindings");
        }
    }

    /// Builds and registers a brand new faction, marked for the next save.
    pub fn create_faction(&mut self, name: &str) -> Result<FactionId, StoreError> {
        if self.registry.find_by_name(name).is_some() {
            return Err(StoreError::NameTaken(name.to_string()));
        }

        let id = generate_faction_id();
        let mut source = Map::new();
        source.insert("id".to_string(), Value::from(id.as_str()));
        source.insert("name".to_string(), Value::from(name));
        let record = FactionRecord::create(&source, &self.context())?;

        self.registry.register(record);
        self.dirty.mark(&id);
        tracing::info!(faction = %id, name, "created faction");
        Ok(id)
    }

    /// Renames a faction, marking it for the next save.
    pub fn rename(&mut self, id: &FactionId, name: &str) -> Result<(), StoreError> {
        if let Some(other) = self.registry.find_by_name(name) {
            if other.id() != id {
                return Err(StoreError::NameTaken(name.to_string()));
            }
        }
        let record = self
            .registry
            .get_mut(id)
            .ok_or_else(|| StoreError::UnknownFaction(id.clone()))?;
        record.set_name(name, &self.dirty);
        Ok(())
    }

    /// Removes a faction from storage and the registry, releasing its members.
    ///
    /// The file is deleted first; if that fails the faction stays loaded
    /// with its members still bound.
    pub fn disband(&mut self, id: &FactionId) -> Result<FactionRecord, StoreError> {
        if !self.registry.contains(id) {
            return Err(StoreError::UnknownFaction(id.clone()));
        }
        self.provider.delete(id)?;
        let record = self
            .registry
            .remove(id)
            .ok_or_else(|| StoreError::UnknownFaction(id.clone()))?;
        let released = self.members.release_faction(id);
        tracing::info!(faction = %id, released, "disbanded faction");
        Ok(record)
    }

    /// Marks a faction for the next save after an in-place edit.
    pub fn touch(&self, id: &FactionId) {
        self.dirty.mark(id);
    }

    /// Saves every faction marked dirty, returning how many were written.
    ///
    /// Dirty factions that were disbanded in the meantime are skipped. On
    /// failure the failed faction and everything after it stay dirty.
    pub fn save_dirty(&self) -> Result<usize, StoreError> {
        let pending = self.dirty.take_dirty();
        let mut saved = 0;
        for (i, id) in pending.iter().enumerate() {
            let Some(record) = self.registry.get(id) else {
                tracing::debug!(faction = %id, "skipping save of removed faction");
                continue;
            };
            if let Err(e) = record.save(&self.registry, &self.provider) {
                // Unsaved factions stay dirty for the next attempt.
                for unsaved in &pending[i..] {
                    self.dirty.mark(unsaved);
                }
                return Err(e.into());
            }
            saved += 1;
        }
        Ok(saved)
    }

    /// Saves every faction regardless of dirty state.
    pub fn save_all(&self) -> Result<usize, StoreError> {
        for id in self.registry.faction_ids() {
            self.dirty.mark(id);
        }
        self.save_dirty()
    }

    pub fn get(&self, id: &FactionId) -> Option<&FactionRecord> {
        self.registry.get(id)
    }

    /// Mutable access for in-place edits. Call [`touch`](Self::touch) to persist.
    pub fn get_mut(&mut self, id: &FactionId) -> Option<&mut FactionRecord> {
        self.registry.get_mut(id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&FactionRecord> {
        self.registry.find_by_name(name)
    }

    /// Whether the faction's home is set and its level loaded.
    pub fn has_home(&self, id: &FactionId) -> bool {
        self.registry
            .get(id)
            .map_or(false, |f| f.has_home(&self.levels))
    }

    pub fn is_dirty(&self, id: &FactionId) -> bool {
        self.dirty.is_dirty(id)
    }

    pub fn registry(&self) -> &FactionRegistry {
        &self.registry
    }

    pub fn members(&self) -> &MemberDirectory {
        &self.members
    }

    pub fn levels_mut(&mut self) -> &mut LevelSet {
        &mut self.levels
    }

    pub fn provider(&self) -> &JsonDataProvider {
        &self.provider
    }
}
