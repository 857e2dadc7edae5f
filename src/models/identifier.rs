use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque key understood by the remote source (a login, a node id, ...)
///
/// Identifiers are never deduplicated: repeated entries are queried and
/// returned at each of their original positions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Identifier {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for Identifier {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<u64> for Identifier {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl From<i64> for Identifier {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_and_string_keys_share_one_representation() {
        assert_eq!(Identifier::from(42_u64), Identifier::from("42"));
        assert_eq!(Identifier::from(-7_i64).as_str(), "-7");
        assert_eq!(
            serde_json::to_string(&Identifier::new("MDQ6VXNlcjE=")).unwrap(),
            "\"MDQ6VXNlcjE=\""
        );
    }
}
