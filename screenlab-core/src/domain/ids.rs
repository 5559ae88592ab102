use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque instrument identifier, stable for the life of the security.
///
/// Used as the map key everywhere in the engine. Ordering is lexical and
/// only exists so callers can put identifiers in sorted containers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstrumentId(pub String);

impl InstrumentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstrumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for InstrumentId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for InstrumentId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn equal_ids_hash_together() {
        let mut set = HashSet::new();
        set.insert(InstrumentId::new("AAPL"));
        set.insert(InstrumentId::from("AAPL"));
        set.insert(InstrumentId::from("MSFT".to_string()));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn serializes_as_plain_string() {
        let json = serde_json::to_string(&InstrumentId::new("SPY")).unwrap();
        assert_eq!(json, "\"SPY\"");
    }

    #[test]
    fn display_is_raw_symbol() {
        assert_eq!(InstrumentId::new("QQQ").to_string(), "QQQ");
    }
}
