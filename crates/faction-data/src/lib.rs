//! Faction records and the collaborator contracts they are built against.
//!
//! This crate contains pure data structures with no I/O. A host (the game
//! server, or `faction-store` in this workspace) supplies the player
//! directory, level resolver, registry and persistence backend through the
//! traits in [`host`].
//!
//! # Example
//!
//! ```
//! use faction_data::{FactionContext, FactionRecord, PlayerDirectory, PlayerHandle, FactionId,
//!     WarningLog, WorldResolver};
//! use std::rc::Rc;
//!
//! struct NoPlayers;
//! struct Nobody(String);
//! impl PlayerHandle for Nobody {
//!     fn name(&self) -> String { self.0.clone() }
//!     fn faction_id(&self) -> Option<FactionId> { None }
//!     fn set_faction(&self, _: &FactionId) {}
//! }
//! impl PlayerDirectory for NoPlayers {
//!     fn resolve(&self, identifier: &str) -> Rc<dyn PlayerHandle> {
//!         Rc::new(Nobody(identifier.to_string()))
//!     }
//! }
//! struct NoLevels;
//! impl WorldResolver for NoLevels {
//!     fn has_level(&self, _: &str) -> bool { false }
//! }
//! struct Quiet;
//! impl WarningLog for Quiet {
//!     fn warning(&self, _: &str) {}
//! }
//!
//! let ctx = FactionContext { players: &NoPlayers, worlds: &NoLevels, warnings: &Quiet };
//! let source = serde_json::json!({ "id": "f1", "name": "Alpha" });
//! let record = FactionRecord::from_value(&source, &ctx).unwrap();
//! assert_eq!(record.name(), "Alpha");
//! assert!(record.has_power_boost());
//! ```

pub mod error;
pub mod home;
pub mod host;
pub mod record;
pub mod source;

#[cfg(feature = "test-fixtures")]
pub mod fixtures;

pub use error::{FactionError, PersistenceError};
pub use home::{Home, HomeWarning, ParseHomeError, HOME_DELIMITER};
pub use host::{
    ChangeListener, FactionContext, FactionLookup, FactionPersistence, PlayerDirectory,
    PlayerHandle, TracingWarnings, WarningLog, WorldResolver,
};
pub use record::{unix_now, FactionId, FactionRecord};
pub use source::FactionSource;
