//! Collaborator contracts supplied by the host server.
//!
//! A faction record never reaches for global state. Everything it needs from
//! the outside world (players, levels, the registry, storage, logging) is
//! passed in through these traits. The host dispatches commands on a single
//! thread, so player handles are shared with `Rc` and mutate through `&self`.

use std::rc::Rc;

use crate::error::PersistenceError;
use crate::record::{FactionId, FactionRecord};

/// A player as seen by the faction layer.
pub trait PlayerHandle {
    /// Display name, used as the member entry.
    fn name(&self) -> String;

    /// Faction the player currently belongs to, if any.
    fn faction_id(&self) -> Option<FactionId>;

    fn has_faction(&self) -> bool {
        self.faction_id().is_some()
    }

    /// Binds the player to `faction`.
    fn set_faction(&self, faction: &FactionId);
}

/// Resolves raw member identifiers to player handles.
pub trait PlayerDirectory {
    fn resolve(&self, identifier: &str) -> Rc<dyn PlayerHandle>;
}

/// Registry of live factions, keyed by id.
pub trait FactionLookup {
    fn get_by_id(&self, id: &FactionId) -> Option<&FactionRecord>;
}

/// Durable storage for faction records.
pub trait FactionPersistence {
    fn save_faction(&self, faction: &FactionRecord) -> Result<(), PersistenceError>;
}

/// Answers whether a level (world) is currently loaded.
pub trait WorldResolver {
    fn has_level(&self, name: &str) -> bool;
}

/// Sink for non-fatal load warnings.
pub trait WarningLog {
    fn warning(&self, message: &str);
}

/// Notified when a record changes in a way its registry should persist.
pub trait ChangeListener {
    fn changed(&self, id: &FactionId);
}

/// Collaborators needed while constructing a record.
#[derive(Clone, Copy)]
pub struct FactionContext<'a> {
    pub players: &'a dyn PlayerDirectory,
    pub worlds: &'a dyn WorldResolver,
    pub warnings: &'a dyn WarningLog,
}

/// [`WarningLog`] that forwards to `tracing` at warn level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingWarnings;

impl WarningLog for TracingWarnings {
    fn warning(&self, message: &str) {
        tracing::warn!("{}", message);
    }
}
