//! Record key types
//!
//! Deployments key their collections either by an opaque string identifier or by
//! an integer identifier. The variant is chosen once through configuration
//! ([`KeyType`]) and every record of a run carries a [`RecordKey`] of that variant.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Key type of a deployment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum KeyType {
    /// Opaque non-empty string identifiers
    #[default]
    String,
    /// Signed 64-bit integer identifiers
    Integer,
}

impl KeyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyType::String => "string",
            KeyType::Integer => "integer",
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KeyType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "string" => Ok(KeyType::String),
            "integer" => Ok(KeyType::Integer),
            other => Err(format!(
                "Invalid key type '{other}'. Must be one of: string, integer"
            )),
        }
    }
}

/// Record key
///
/// # Examples
///
/// ```
/// use recsync::domain::ids::{KeyType, RecordKey};
///
/// let key = RecordKey::parse("42", KeyType::Integer).unwrap();
/// assert_eq!(key, RecordKey::Integer(42));
/// assert_eq!(key.to_string(), "42");
///
/// assert!(RecordKey::parse("alice", KeyType::Integer).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordKey {
    Text(String),
    Integer(i64),
}

impl RecordKey {
    /// Parses a raw key according to the deployment's key type
    ///
    /// # Errors
    ///
    /// Returns the reason the value is not a valid key of that type.
    pub fn parse(raw: &str, key_type: KeyType) -> Result<Self, String> {
        match key_type {
            KeyType::String => {
                if raw.trim().is_empty() {
                    return Err("key cannot be empty".to_string());
                }
                Ok(RecordKey::Text(raw.to_string()))
            }
            KeyType::Integer => raw
                .parse::<i64>()
                .map(RecordKey::Integer)
                .map_err(|e| format!("not an integer ({e})")),
        }
    }

    /// Key type this key belongs to
    pub fn key_type(&self) -> KeyType {
        match self {
            RecordKey::Text(_) => KeyType::String,
            RecordKey::Integer(_) => KeyType::Integer,
        }
    }

    /// Canonical text form persisted by stores
    pub fn to_stored(&self) -> String {
        self.to_string()
    }

    /// Restores a key from its persisted text form
    pub fn from_stored(stored: &str, key_type: KeyType) -> Result<Self, String> {
        Self::parse(stored, key_type)
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKey::Text(value) => f.write_str(value),
            RecordKey::Integer(value) => write!(f, "{value}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_key() {
        let key = RecordKey::parse("alice", KeyType::String).unwrap();
        assert_eq!(key, RecordKey::Text("alice".to_string()));
        assert_eq!(key.key_type(), KeyType::String);
    }

    #[test]
    fn test_string_key_blank_fails() {
        assert!(RecordKey::parse("", KeyType::String).is_err());
        assert!(RecordKey::parse("   ", KeyType::String).is_err());
    }

    #[test]
    fn test_integer_key() {
        let key = RecordKey::parse("-17", KeyType::Integer).unwrap();
        assert_eq!(key, RecordKey::Integer(-17));
        assert_eq!(key.to_stored(), "-17");
        assert_eq!(key.key_type(), KeyType::Integer);
    }

    #[test]
    fn test_integer_key_rejects_text() {
        let err = RecordKey::parse("12a", KeyType::Integer).unwrap_err();
        assert!(err.contains("not an integer"));
        assert!(RecordKey::parse("", KeyType::Integer).is_err());
    }

    #[test]
    fn test_stored_form_round_trips() {
        let key = RecordKey::Integer(9001);
        let restored = RecordKey::from_stored(&key.to_stored(), KeyType::Integer).unwrap();
        assert_eq!(restored, key);
    }

    #[test]
    fn test_key_type_from_str() {
        assert_eq!(KeyType::from_str("string").unwrap(), KeyType::String);
        assert_eq!(KeyType::from_str("INTEGER").unwrap(), KeyType::Integer);
        assert!(KeyType::from_str("uuid").is_err());
    }

    #[test]
    fn test_key_serialization() {
        assert_eq!(
            serde_json::to_string(&RecordKey::Text("bob".to_string())).unwrap(),
            "\"bob\""
        );
        assert_eq!(serde_json::to_string(&RecordKey::Integer(7)).unwrap(), "7");
    }
}
