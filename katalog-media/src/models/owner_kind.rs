//! Owner kinds: which catalog population a legacy image or photo belongs to

use serde::{Deserialize, Serialize};
use std::fmt;

/// Catalog entity type that can own photos
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OwnerKind {
    /// Single sellable item ("produk")
    Single,
    /// Bundle of items ("paket")
    Bundle,
}

impl OwnerKind {
    /// Both kinds, in batch processing order
    pub const ALL: [OwnerKind; 2] = [OwnerKind::Single, OwnerKind::Bundle];

    pub fn as_str(&self) -> &'static str {
        match self {
            OwnerKind::Single => "single",
            OwnerKind::Bundle => "bundle",
        }
    }

    /// Plural prefix used in object store keys
    pub fn key_prefix(&self) -> &'static str {
        match self {
            OwnerKind::Single => "produks",
            OwnerKind::Bundle => "pakets",
        }
    }
}

impl fmt::Display for OwnerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which population(s) a batch run scans
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OwnerScope {
    Single,
    Bundle,
    Both,
}

impl OwnerScope {
    /// Owner kinds covered by this scope, singles first
    pub fn kinds(&self) -> &'static [OwnerKind] {
        match self {
            OwnerScope::Single => &[OwnerKind::Single],
            OwnerScope::Bundle => &[OwnerKind::Bundle],
            OwnerScope::Both => &OwnerKind::ALL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_kinds() {
        assert_eq!(OwnerScope::Single.kinds(), &[OwnerKind::Single]);
        assert_eq!(OwnerScope::Bundle.kinds(), &[OwnerKind::Bundle]);
        assert_eq!(OwnerScope::Both.kinds(), &[OwnerKind::Single, OwnerKind::Bundle]);
    }

    #[test]
    fn test_scope_deserializes_from_request_values() {
        let scope: OwnerScope = serde_json::from_str("\"both\"").unwrap();
        assert_eq!(scope, OwnerScope::Both);
        assert!(serde_json::from_str::<OwnerScope>("\"all\"").is_err());
    }

    #[test]
    fn test_key_prefixes_differ() {
        assert_ne!(OwnerKind::Single.key_prefix(), OwnerKind::Bundle.key_prefix());
    }
}
