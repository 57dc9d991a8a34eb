//! Faction Records
//!
//! One [`FactionRecord`] per faction: identity, membership, home, power boost
//! and the flag/permission/relation tables. Records are built from an untyped
//! source map and written back to one with [`FactionRecord::to_map`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::FactionError;
use crate::home::{Home, HomeWarning, ParseHomeError};
use crate::host::{
    ChangeListener, FactionContext, FactionLookup, FactionPersistence, PlayerDirectory,
    PlayerHandle, WorldResolver,
};
use crate::source::{json_type_name, FactionSource};

/// Unique identifier for a faction
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FactionId(pub String);

impl FactionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FactionId {
    fn from(s: &str) -> Self {
        FactionId(s.to_string())
    }
}

impl From<String> for FactionId {
    fn from(s: String) -> Self {
        FactionId(s)
    }
}

/// Current time in seconds since the Unix epoch.
pub fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_secs() as i64)
}

/// A single faction.
#[derive(Debug, Clone, PartialEq)]
pub struct FactionRecord {
    id: FactionId,
    name: String,
    description: Option<String>,
    motd: Option<String>,
    created_at: i64,
    home: Option<Home>,
    /// Custom increase/decrease to default and maximum power.
    power_boost: i64,
    flags: BTreeMap<String, bool>,
    /// Overrides of the default permission table.
    permissions: BTreeMap<String, Value>,
    /// Other faction id -> requested relation id.
    relation_wishes: BTreeMap<String, String>,
    invited_players: BTreeSet<String>,
    members: Vec<String>,
}

impl FactionRecord {
    /// Builds a record from an untyped source map.
    ///
    /// Fails when `id` or `name` is missing, when a field has the wrong type,
    /// or when a listed member already belongs to another faction. Member
    /// assignment is all-or-nothing: no player is rebound unless every entry
    /// passes. An unreadable or dangling `home` is logged once through
    /// `ctx.warnings` and left unset.
    pub fn create(source: &Map<String, Value>, ctx: &FactionContext<'_>) -> Result<Self, FactionError> {
        Self::from_source(FactionSource::from_map(source)?, ctx)
    }

    /// Same as [`create`](Self::create), rejecting non-object values.
    pub fn from_value(source: &Value, ctx: &FactionContext<'_>) -> Result<Self, FactionError> {
        Self::from_source(FactionSource::from_value(source)?, ctx)
    }

    fn from_source(source: FactionSource, ctx: &FactionContext<'_>) -> Result<Self, FactionError> {
        let id = FactionId(source.id.ok_or(FactionError::MissingField { field: "id" })?);
        let name = source.name.ok_or(FactionError::MissingField { field: "name" })?;

        let members = match source.members {
            Some(entries) => assign_members(&id, &entries, ctx.players)?,
            None => Vec::new(),
        };

        let home = source.home.and_then(|raw| resolve_home(&name, &raw, ctx));

        tracing::debug!(faction = %id, members = members.len(), "loaded faction record");

        Ok(Self {
            id,
            name,
            description: source.description,
            motd: source.motd,
            created_at: source.created_at.unwrap_or_else(unix_now),
            home,
            power_boost: source.power_boost.unwrap_or(0),
            flags: source.flags.unwrap_or_default(),
            permissions: source.perms.unwrap_or_default(),
            relation_wishes: source.relation_wishes.unwrap_or_default(),
            invited_players: source.invited_players.unwrap_or_default().into_iter().collect(),
            members,
        })
    }

    /// Puts everything needed to persist the faction into a map.
    ///
    /// Built from the public accessors so any derived view of the tables is
    /// what gets saved. The output is accepted by [`create`](Self::create).
    pub fn to_map(&self) -> Map<String, Value> {
        let strings = |items: &BTreeMap<String, String>| -> Value {
            Value::Object(
                items
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                    .collect(),
            )
        };

        let mut map = Map::new();
        map.insert("name".into(), Value::from(self.name()));
        map.insert("id".into(), Value::from(self.id().as_str()));
        map.insert(
            "flags".into(),
            Value::Object(
                self.flags()
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::Bool(*v)))
                    .collect(),
            ),
        );
        map.insert(
            "perms".into(),
            Value::Object(
                self.permissions()
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
            ),
        );
        map.insert("members".into(), Value::from(self.members().to_vec()));
        map.insert("powerBoost".into(), Value::from(self.power_boost()));
        map.insert("relationWishes".into(), strings(self.relation_wishes()));
        map.insert("createdAt".into(), Value::from(self.created_at()));
        map.insert("motd".into(), self.motd().map_or(Value::Null, Value::from));
        map.insert(
            "description".into(),
            self.description().map_or(Value::Null, Value::from),
        );
        map.insert(
            "invitedPlayers".into(),
            Value::from(self.invited_players().iter().cloned().collect::<Vec<_>>()),
        );
        map
    }

    /// [`to_map`](Self::to_map) wrapped as a JSON value.
    pub fn to_value(&self) -> Value {
        Value::Object(self.to_map())
    }

    /// Hands the record to `persistence` if `registry` still knows its id.
    pub fn save(
        &self,
        registry: &dyn FactionLookup,
        persistence: &dyn FactionPersistence,
    ) -> Result<(), FactionError> {
        if registry.get_by_id(&self.id).is_none() {
            return Err(FactionError::Orphaned {
                id: self.id.to_string(),
            });
        }
        persistence
            .save_faction(self)
            .map_err(|source| FactionError::Persistence {
                id: self.id.to_string(),
                source,
            })?;
        tracing::debug!(faction = %self.id, "saved faction record");
        Ok(())
    }

    pub fn id(&self) -> &FactionId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Renames the faction and tells `listener` exactly once.
    pub fn set_name(&mut self, name: impl Into<String>, listener: &dyn ChangeListener) {
        self.name = name.into();
        listener.changed(&self.id);
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = Some(description.into());
    }

    pub fn has_description(&self) -> bool {
        self.description.is_some()
    }

    pub fn remove_description(&mut self) {
        self.description = None;
    }

    /// Message of the day, shown to members when they log on.
    pub fn motd(&self) -> Option<&str> {
        self.motd.as_deref()
    }

    pub fn set_motd(&mut self, motd: impl Into<String>) {
        self.motd = Some(motd.into());
    }

    pub fn has_motd(&self) -> bool {
        self.motd.is_some()
    }

    pub fn remove_motd(&mut self) {
        self.motd = None;
    }

    pub fn created_at(&self) -> i64 {
        self.created_at
    }

    pub fn home(&self) -> Option<&Home> {
        self.home.as_ref()
    }

    pub fn set_home(&mut self, home: Home) {
        self.home = Some(home);
    }

    pub fn remove_home(&mut self) {
        self.home = None;
    }

    /// A home is usable only while its level is loaded.
    pub fn has_home(&self, worlds: &dyn WorldResolver) -> bool {
        self.home
            .as_ref()
            .map_or(false, |home| worlds.has_level(&home.level))
    }

    pub fn is_home_set(&self) -> bool {
        self.home.is_some()
    }

    pub fn power_boost(&self) -> i64 {
        self.power_boost
    }

    pub fn set_power_boost(&mut self, power: i64) {
        self.power_boost = power;
    }

    /// True exactly when the boost is zero.
    ///
    /// Callers treat a zero boost as the "has power boost" case; any other
    /// value, negative included, reports false.
    pub fn has_power_boost(&self) -> bool {
        self.power_boost == 0
    }

    /// Member names in the order they were assigned.
    pub fn members(&self) -> &[String] {
        &self.members
    }

    /// Case-insensitive, with the same Unicode lowercasing the member
    /// directory keys players by.
    pub fn is_member(&self, player: &str) -> bool {
        let player = player.to_lowercase();
        self.members.iter().any(|m| m.to_lowercase() == player)
    }

    pub fn flags(&self) -> &BTreeMap<String, bool> {
        &self.flags
    }

    pub fn flag(&self, name: &str) -> Option<bool> {
        self.flags.get(name).copied()
    }

    pub fn set_flag(&mut self, name: impl Into<String>, value: bool) {
        self.flags.insert(name.into(), value);
    }

    pub fn permissions(&self) -> &BTreeMap<String, Value> {
        &self.permissions
    }

    pub fn permission(&self, key: &str) -> Option<&Value> {
        self.permissions.get(key)
    }

    pub fn set_permission(&mut self, key: impl Into<String>, value: Value) {
        self.permissions.insert(key.into(), value);
    }

    pub fn remove_permission(&mut self, key: &str) -> Option<Value> {
        self.permissions.remove(key)
    }

    pub fn relation_wishes(&self) -> &BTreeMap<String, String> {
        &self.relation_wishes
    }

    pub fn relation_wish(&self, faction: &FactionId) -> Option<&str> {
        self.relation_wishes.get(faction.as_str()).map(String::as_str)
    }

    pub fn set_relation_wish(&mut self, faction: &FactionId, relation: impl Into<String>) {
        self.relation_wishes
            .insert(faction.0.clone(), relation.into());
    }

    pub fn remove_relation_wish(&mut self, faction: &FactionId) -> Option<String> {
        self.relation_wishes.remove(faction.as_str())
    }

    pub fn invited_players(&self) -> &BTreeSet<String> {
        &self.invited_players
    }

    /// Returns false if the player was already invited.
    pub fn invite(&mut self, player: impl Into<String>) -> bool {
        self.invited_players.insert(player.into())
    }

    pub fn uninvite(&mut self, player: &str) -> bool {
        self.invited_players.remove(player)
    }

    pub fn is_invited(&self, player: &str) -> bool {
        self.invited_players.contains(player)
    }
}

/// Resolves every entry and checks it before rebinding anyone.
fn assign_members(
    id: &FactionId,
    entries: &[String],
    players: &dyn PlayerDirectory,
) -> Result<Vec<String>, FactionError> {
    let mut accepted: Vec<(String, Rc<dyn PlayerHandle>)> = Vec::with_capacity(entries.len());

    for entry in entries {
        let player = players.resolve(entry);
        let name = player.name();
        if let Some(current) = player.faction_id() {
            if &current != id {
                return Err(FactionError::ConflictingMembership {
                    player: name,
                    faction: id.to_string(),
                    current: current.to_string(),
                });
            }
        }
        if !accepted.iter().any(|(n, _)| *n == name) {
            accepted.push((name, player));
        }
    }

    for (_, player) in &accepted {
        player.set_faction(id);
    }
    Ok(accepted.into_iter().map(|(name, _)| name).collect())
}

fn resolve_home(faction: &str, raw: &Value, ctx: &FactionContext<'_>) -> Option<Home> {
    let parsed = match raw {
        Value::String(text) => Home::parse(text),
        other => Err(ParseHomeError::NotText(json_type_name(other))),
    };
    let warning = match parsed {
        Ok(home) if ctx.worlds.has_level(&home.level) => return Some(home),
        Ok(home) => HomeWarning::UnknownLevel {
            faction: faction.to_string(),
            raw: home.to_string(),
            level: home.level,
        },
        Err(reason) => HomeWarning::Malformed {
            faction: faction.to_string(),
            raw: raw.as_str().map_or_else(|| raw.to_string(), str::to_string),
            reason,
        },
    };
    ctx.warnings.warning(&warning.to_string());
    None
}
