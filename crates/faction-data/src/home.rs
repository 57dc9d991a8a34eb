//! Faction Home Locations
//!
//! A home is a point in a named level, stored as text like `"12.5:64:-3:world"`.
//!
//! # Example
//!
//! ```
//! use faction_data::Home;
//!
//! let home: Home = "12.5:64:-3:world".parse().unwrap();
//! assert_eq!(home.level, "world");
//! assert_eq!(home.to_string(), "12.5:64:-3:world");
//! ```

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Separator between the coordinates and the level name.
pub const HOME_DELIMITER: char = ':';

/// A saved location members can teleport to.
#[derive(Debug, Clone, PartialEq)]
pub struct Home {
    /// Name of the level (world) the home lives in.
    pub level: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Home {
    pub fn new(level: impl Into<String>, x: f64, y: f64, z: f64) -> Self {
        Self {
            level: level.into(),
            x,
            y,
            z,
        }
    }

    /// Parses the `x:y:z:level` text form.
    ///
    /// Everything after the third delimiter is the level name, so level names
    /// may themselves contain the delimiter.
    pub fn parse(raw: &str) -> Result<Self, ParseHomeError> {
        let parts: Vec<&str> = raw.splitn(4, HOME_DELIMITER).collect();
        if parts.len() != 4 {
            return Err(ParseHomeError::WrongArity(parts.len()));
        }

        let coordinate = |part: &str| -> Result<f64, ParseHomeError> {
            part.trim()
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| ParseHomeError::InvalidCoordinate(part.to_string()))
        };
        let x = coordinate(parts[0])?;
        let y = coordinate(parts[1])?;
        let z = coordinate(parts[2])?;

        let level = parts[3].trim();
        if level.is_empty() {
            return Err(ParseHomeError::MissingLevel);
        }

        Ok(Self::new(level, x, y, z))
    }
}

impl fmt::Display for Home {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let d = HOME_DELIMITER;
        write!(f, "{}{d}{}{d}{}{d}{}", self.x, self.y, self.z, self.level)
    }
}

impl FromStr for Home {
    type Err = ParseHomeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Home::parse(s)
    }
}

impl Serialize for Home {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Home {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Why a home string could not be parsed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseHomeError {
    #[error("expected 'x:y:z:level', found {0} part(s)")]
    WrongArity(usize),
    #[error("invalid coordinate '{0}'")]
    InvalidCoordinate(String),
    #[error("missing level name")]
    MissingLevel,
    #[error("home must be text, got {0}")]
    NotText(&'static str),
}

/// A home that was dropped while loading a faction.
///
/// Never returned as an error: construction logs the `Display` text through
/// the host's [`WarningLog`](crate::WarningLog) and leaves the home unset.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HomeWarning {
    #[error("faction '{faction}' has an unreadable home '{raw}': {reason}")]
    Malformed {
        faction: String,
        raw: String,
        reason: ParseHomeError,
    },
    #[error("faction '{faction}' has its home in level '{level}' which is not loaded ({raw})")]
    UnknownLevel {
        faction: String,
        level: String,
        raw: String,
    },
}
