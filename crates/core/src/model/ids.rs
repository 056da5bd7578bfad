use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier handed out by the registration service for a quiz taker.
///
/// Opaque: whatever JSON number or string the service issued is kept as-is and
/// sent back in the same shape.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(IdRepr);

#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
enum IdRepr {
    Number(u64),
    Text(String),
}

impl UserId {
    /// Creates a numeric `UserId`
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self(IdRepr::Number(id))
    }

    /// Creates a `UserId` from a textual id, kept verbatim
    #[must_use]
    pub fn text(id: impl Into<String>) -> Self {
        Self(IdRepr::Text(id.into()))
    }

    /// True for a textual id with no visible characters.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        matches!(&self.0, IdRepr::Text(text) if text.trim().is_empty())
    }
}

impl fmt::Debug for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            IdRepr::Number(id) => write!(f, "UserId({id})"),
            IdRepr::Text(id) => write!(f, "UserId({id:?})"),
        }
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            IdRepr::Number(id) => write!(f, "{id}"),
            IdRepr::Text(id) => write!(f, "{id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_id_display() {
        assert_eq!(UserId::new(123).to_string(), "123");
        assert_eq!(UserId::text("007").to_string(), "007");
    }

    #[test]
    fn numeric_and_textual_ids_differ() {
        assert_ne!(UserId::new(7), UserId::text("7"));
        assert_ne!(UserId::text("007"), UserId::text("7"));
    }

    #[test]
    fn blank_only_for_empty_text() {
        assert!(UserId::text("  ").is_blank());
        assert!(!UserId::text("65a1").is_blank());
        assert!(!UserId::new(0).is_blank());
    }
}
