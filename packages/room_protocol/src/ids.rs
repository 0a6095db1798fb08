use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Longest accepted room or peer identifier, in bytes.
pub const MAX_ID_LEN: usize = 128;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    #[error("{kind} must not be empty")]
    Empty { kind: &'static str },

    #[error("{kind} is longer than {MAX_ID_LEN} bytes")]
    TooLong { kind: &'static str },

    #[error("{kind} contains a forbidden character")]
    ForbiddenChar { kind: &'static str },
}

fn validate(kind: &'static str, raw: &str) -> Result<(), IdError> {
    if raw.is_empty() {
        return Err(IdError::Empty { kind });
    }
    if raw.len() > MAX_ID_LEN {
        return Err(IdError::TooLong { kind });
    }
    if raw.chars().any(|c| c.is_ascii_control() || c == '/') {
        return Err(IdError::ForbiddenChar { kind });
    }
    Ok(())
}

/// Opaque room token taken from the URL path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    pub fn parse(raw: impl Into<String>) -> Result<Self, IdError> {
        let raw = raw.into();
        validate("room id", &raw)?;
        Ok(Self(raw))
    }

    /// A fresh random room token (UUID v4).
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for RoomId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(raw).map_err(serde::de::Error::custom)
    }
}

/// Identifier assigned to a client by the media endpoint; used to address calls.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct PeerId(String);

impl PeerId {
    pub fn parse(raw: impl Into<String>) -> Result<Self, IdError> {
        let raw = raw.into();
        validate("peer id", &raw)?;
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for PeerId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_room_ids_are_valid_and_distinct() {
        let a = RoomId::generate();
        let b = RoomId::generate();
        assert_ne!(a, b);
        assert!(RoomId::parse(a.as_str()).is_ok());
        assert!(uuid::Uuid::parse_str(a.as_str()).is_ok());
    }

    #[test]
    fn test_rejects_empty_and_oversized() {
        assert_eq!(
            RoomId::parse(""),
            Err(IdError::Empty { kind: "room id" })
        );
        let long = "x".repeat(MAX_ID_LEN + 1);
        assert_eq!(
            PeerId::parse(long),
            Err(IdError::TooLong { kind: "peer id" })
        );
        assert!(PeerId::parse("x".repeat(MAX_ID_LEN)).is_ok());
    }

    #[test]
    fn test_rejects_slash_and_control_chars() {
        assert!(RoomId::parse("a/b").is_err());
        assert!(PeerId::parse("p\n1").is_err());
        assert!(RoomId::parse("room-ünïcode").is_ok());
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: PeerId = serde_json::from_str(r#""peer-1""#).unwrap();
        assert_eq!(ok.as_str(), "peer-1");
        assert!(serde_json::from_str::<PeerId>(r#""""#).is_err());
    }
}
