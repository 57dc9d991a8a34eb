//! Sample data fixtures for testing.
//!
//! This module provides ready-made faction sources for other crates to use.
//! Enable the `test-fixtures` feature to access these helpers.
//!
//! # Example
//!
//! ```ignore
//! // In your Cargo.toml:
//! // [dev-dependencies]
//! // faction-data = { path = "../faction-data", features = ["test-fixtures"] }
//!
//! use faction_data::fixtures;
//!
//! let sources = fixtures::sample_sources();
//! ```

use serde_json::{json, Map, Value};

/// Level names referenced by the sample homes.
pub const SAMPLE_LEVELS: [&str; 2] = ["world", "mines"];

/// Returns the sample faction sources from the fixtures file.
///
/// Contains 2 factions:
/// - Thornwood: 3 members, home in `world`, pending ally wish to Ironmere
/// - Ironmere: 2 members, home in `mines`, power boost of 15
pub fn sample_sources() -> Vec<Map<String, Value>> {
    let json = include_str!("../tests/fixtures/sample_factions.json");
    let values: Vec<Value> =
        serde_json::from_str(json).expect("Failed to parse sample_factions.json");
    values
        .into_iter()
        .map(|value| match value {
            Value::Object(map) => map,
            other => panic!("sample faction is not an object: {}", other),
        })
        .collect()
}

/// Smallest valid source: only the required fields.
pub fn minimal_source(id: &str, name: &str) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("id".to_string(), json!(id));
    map.insert("name".to_string(), json!(name));
    map
}
