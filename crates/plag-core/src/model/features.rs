use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identity of a source unit: a filesystem path or a remote link.
///
/// Ordering is plain lexicographic order over the underlying string. Pair keys
/// and record ordering are both derived from it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceId(String);

impl SourceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn from_path(path: &Path) -> Self {
        Self(path.to_string_lossy().into_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SourceId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for SourceId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&Path> for SourceId {
    fn from(path: &Path) -> Self {
        Self::from_path(path)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeStructure {
    pub depth: usize,
    pub kind: String,
}

/// Structural payload produced by a tree walker.
///
/// Storage layers treat it as opaque; it only has to survive a serde round trip.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuralFeatures {
    pub count_of_nodes: usize,
    /// Names of definitions that are not nested inside another definition.
    pub head_nodes: Vec<String>,
    pub operators: BTreeMap<String, usize>,
    pub keywords: BTreeMap<String, usize>,
    pub literals: BTreeMap<String, usize>,
    /// Pre-order sequence of named node kinds.
    pub tokens: Vec<String>,
    /// 1-based line and 0-based column of each entry in `tokens`.
    pub tokens_pos: Vec<(usize, usize)>,
    pub structure: Vec<NodeStructure>,
}

/// Structural fingerprint of one source unit.
///
/// Equality and ordering look at the identity only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ASTFeatures {
    pub id: SourceId,
    pub sha256: String,
    pub modify_date: DateTime<Utc>,
    pub features: StructuralFeatures,
}

impl ASTFeatures {
    pub fn new(
        id: impl Into<SourceId>,
        sha256: impl Into<String>,
        modify_date: DateTime<Utc>,
        features: StructuralFeatures,
    ) -> Self {
        Self {
            id: id.into(),
            sha256: sha256.into(),
            modify_date,
            features,
        }
    }
}

impl PartialEq for ASTFeatures {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ASTFeatures {}

impl PartialOrd for ASTFeatures {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ASTFeatures {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, sha256: &str) -> ASTFeatures {
        ASTFeatures::new(id, sha256, Utc::now(), StructuralFeatures::default())
    }

    #[test]
    fn test_source_id_orders_lexicographically() {
        let mut ids = vec![
            SourceId::from("/b.py"),
            SourceId::from("/a/z.py"),
            SourceId::from("/a.py"),
        ];
        ids.sort();
        let ids: Vec<&str> = ids.iter().map(SourceId::as_str).collect();
        assert_eq!(ids, vec!["/a.py", "/a/z.py", "/b.py"]);
    }

    #[test]
    fn test_records_compare_by_identity_only() {
        let a = record("/a.py", "ffff");
        let a_other = record("/a.py", "0000");
        let b = record("/b.py", "0000");

        assert_eq!(a, a_other);
        assert!(a < b);
        assert!(b > a_other);
    }

    #[test]
    fn test_source_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&SourceId::from("/a.py")).unwrap();
        assert_eq!(json, "\"/a.py\"");
    }
}
