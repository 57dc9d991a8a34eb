//! In-memory registries the host keeps alongside its faction records.

use faction_data::{
    ChangeListener, FactionId, FactionLookup, FactionRecord, PlayerDirectory, PlayerHandle,
    WorldResolver,
};
use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::rc::Rc;

/// Generates a fresh faction id.
pub fn generate_faction_id() -> FactionId {
    FactionId(uuid::Uuid::new_v4().to_string())
}

/// Registry of all factions
#[derive(Debug, Default)]
pub struct FactionRegistry {
    factions: HashMap<FactionId, FactionRecord>,
}

impl FactionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a faction, returning any record it replaced
    pub fn register(&mut self, faction: FactionRecord) -> Option<FactionRecord> {
        self.factions.insert(faction.id().clone(), faction)
    }

    pub fn get(&self, id: &FactionId) -> Option<&FactionRecord> {
        self.factions.get(id)
    }

    pub fn get_mut(&mut self, id: &FactionId) -> Option<&mut FactionRecord> {
        self.factions.get_mut(id)
    }

    pub fn remove(&mut self, id: &FactionId) -> Option<FactionRecord> {
        self.factions.remove(id)
    }

    pub fn contains(&self, id: &FactionId) -> bool {
        self.factions.contains_key(id)
    }

    pub fn all_factions(&self) -> impl Iterator<Item = &FactionRecord> {
        self.factions.values()
    }

    /// All faction IDs, sorted
    pub fn faction_ids(&self) -> Vec<&FactionId> {
        let mut ids: Vec<_> = self.factions.keys().collect();
        ids.sort();
        ids
    }

    /// Case-insensitive lookup by display name
    pub fn find_by_name(&self, name: &str) -> Option<&FactionRecord> {
        let name = name.to_lowercase();
        self.factions
            .values()
            .find(|f| f.name().to_lowercase() == name)
    }

    pub fn len(&self) -> usize {
        self.factions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factions.is_empty()
    }
}

impl FactionLookup for FactionRegistry {
    fn get_by_id(&self, id: &FactionId) -> Option<&FactionRecord> {
        self.get(id)
    }
}

/// Factions changed since the last save.
#[derive(Debug, Default)]
pub struct DirtyTracker {
    dirty: RefCell<BTreeSet<FactionId>>,
}

impl DirtyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark(&self, id: &FactionId) {
        self.dirty.borrow_mut().insert(id.clone());
    }

    pub fn is_dirty(&self, id: &FactionId) -> bool {
        self.dirty.borrow().contains(id)
    }

    /// Drains the dirty set in id order.
    pub fn take_dirty(&self) -> Vec<FactionId> {
        std::mem::take(&mut *self.dirty.borrow_mut())
            .into_iter()
            .collect()
    }
}

impl ChangeListener for DirtyTracker {
    fn changed(&self, id: &FactionId) {
        tracing::trace!(faction = %id, "faction marked dirty");
        self.mark(id);
    }
}

/// A known player and their faction binding.
#[derive(Debug)]
pub struct Member {
    name: String,
    faction: RefCell<Option<FactionId>>,
}

impl Member {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            faction: RefCell::new(None),
        }
    }

    pub fn leave_faction(&self) {
        self.faction.borrow_mut().take();
    }
}

impl PlayerHandle for Member {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn faction_id(&self) -> Option<FactionId> {
        self.faction.borrow().clone()
    }

    fn set_faction(&self, faction: &FactionId) {
        *self.faction.borrow_mut() = Some(faction.clone());
    }
}

/// Every player the server has seen, keyed case-insensitively by name.
///
/// Unknown names are registered on first lookup.
#[derive(Debug, Default)]
pub struct MemberDirectory {
    members: RefCell<HashMap<String, Rc<Member>>>,
}

impl MemberDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the member, registering it if unseen.
    pub fn member(&self, name: &str) -> Rc<Member> {
        self.members
            .borrow_mut()
            .entry(name.to_lowercase())
            .or_insert_with(|| Rc::new(Member::new(name)))
            .clone()
    }

    /// Looks up a member without registering it.
    pub fn find(&self, name: &str) -> Option<Rc<Member>> {
        self.members.borrow().get(&name.to_lowercase()).cloned()
    }

    /// Names of every member bound to `faction`, sorted.
    pub fn members_of(&self, faction: &FactionId) -> Vec<String> {
        let mut names: Vec<String> = self
            .members
            .borrow()
            .values()
            .filter(|m| m.faction_id().as_ref() == Some(faction))
            .map(|m| m.name())
            .collect();
        names.sort();
        names
    }

    /// Unbinds every member of `faction`, returning how many were released.
    pub fn release_faction(&self, faction: &FactionId) -> usize {
        let members = self.members.borrow();
        let mut released = 0;
        for member in members.values() {
            if member.faction_id().as_ref() == Some(faction) {
                member.leave_faction();
                released += 1;
            }
        }
        released
    }

    pub fn len(&self) -> usize {
        self.members.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.borrow().is_empty()
    }
}

impl PlayerDirectory for MemberDirectory {
    fn resolve(&self, identifier: &str) -> Rc<dyn PlayerHandle> {
        self.member(identifier)
    }
}

/// Levels the server currently has loaded.
#[derive(Debug, Default, Clone)]
pub struct LevelSet {
    loaded: HashSet<String>,
}

impl LevelSet {
    pub fn new<I, S>(levels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            loaded: levels.into_iter().map(Into::into).collect(),
        }
    }

    pub fn load(&mut self, name: impl Into<String>) {
        self.loaded.insert(name.into());
    }

    pub fn unload(&mut self, name: &str) -> bool {
        self.loaded.remove(name)
    }
}

impl WorldResolver for LevelSet {
    fn has_level(&self, name: &str) -> bool {
        self.loaded.contains(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use faction_data::{FactionContext, TracingWarnings};
    use serde_json::json;

    fn record(id: &str, name: &str) -> FactionRecord {
        let members = MemberDirectory::new();
        let levels = LevelSet::default();
        let ctx = FactionContext {
            players: &members,
            worlds: &levels,
            warnings: &TracingWarnings,
        };
        FactionRecord::from_value(&json!({ "id": id, "name": name }), &ctx).unwrap()
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = FactionRegistry::new();
        assert!(registry.register(record("f2", "Beta")).is_none());
        assert!(registry.register(record("f1", "Alpha")).is_none());

        assert_eq!(registry.len(), 2);
        assert!(registry.get_by_id(&FactionId::from("f1")).is_some());
        assert_eq!(
            registry.faction_ids(),
            vec![&FactionId::from("f1"), &FactionId::from("f2")]
        );
        assert_eq!(registry.find_by_name("alpha").map(|f| f.name()), Some("Alpha"));
    }

    #[test]
    fn test_find_by_name_folds_non_ascii() {
        let mut registry = FactionRegistry::new();
        registry.register(record("f1", "Ödland"));

        assert_eq!(registry.find_by_name("ÖDLAND").map(|f| f.name()), Some("Ödland"));
        assert!(registry.find_by_name("odland").is_none());
    }

    #[test]
    fn test_register_replaces() {
        let mut registry = FactionRegistry::new();
        registry.register(record("f1", "Alpha"));
        let old = registry.register(record("f1", "Alpha Prime"));

        assert_eq!(old.map(|f| f.name().to_string()), Some("Alpha".to_string()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_remove() {
        let mut registry = FactionRegistry::new();
        registry.register(record("f1", "Alpha"));

        assert!(registry.remove(&FactionId::from("f1")).is_some());
        assert!(registry.is_empty());
        assert!(registry.get_by_id(&FactionId::from("f1")).is_none());
    }

    #[test]
    fn test_generated_ids_are_unique() {
        assert_ne!(generate_faction_id(), generate_faction_id());
    }

    #[test]
    fn test_dirty_tracker() {
        let tracker = DirtyTracker::new();
        let id = FactionId::from("f1");

        tracker.changed(&id);
        tracker.changed(&id);
        assert!(tracker.is_dirty(&id));

        assert_eq!(tracker.take_dirty(), vec![id.clone()]);
        assert!(!tracker.is_dirty(&id));
        assert!(tracker.take_dirty().is_empty());
    }

    #[test]
    fn test_member_directory_is_case_insensitive() {
        let directory = MemberDirectory::new();
        let steve = directory.member("Steve");
        steve.set_faction(&FactionId::from("f1"));

        let again = directory.resolve("steve");
        assert_eq!(again.name(), "Steve");
        assert!(again.has_faction());
        assert_eq!(directory.len(), 1);
        assert!(directory.find("STEVE").is_some());
        assert!(directory.find("alex").is_none());

        directory.member("Ölaf");
        assert!(directory.find("ölaf").is_some());
    }

    #[test]
    fn test_release_faction() {
        let directory = MemberDirectory::new();
        let f1 = FactionId::from("f1");
        directory.member("steve").set_faction(&f1);
        directory.member("alex").set_faction(&f1);
        directory.member("zed").set_faction(&FactionId::from("f2"));

        assert_eq!(directory.members_of(&f1), vec!["alex".to_string(), "steve".to_string()]);
        assert_eq!(directory.release_faction(&f1), 2);
        assert!(directory.members_of(&f1).is_empty());
        assert!(directory.member("zed").has_faction());
    }

    #[test]
    fn test_level_set() {
        let mut levels = LevelSet::new(["world"]);
        assert!(levels.has_level("world"));
        assert!(!levels.has_level("nether"));

        levels.load("nether");
        assert!(levels.has_level("nether"));
        assert!(levels.unload("world"));
        assert!(!levels.has_level("world"));
    }
}
