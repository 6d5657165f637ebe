use chrono::{DateTime, Utc};

use super::loader::ParsedSource;
use super::walker::{NodeWalker, TreeWalker};
use crate::model::features::{ASTFeatures, SourceId, StructuralFeatures};
use crate::utils::hash::content_hash;

/// Turns parsed sources into feature records.
///
/// This is the only place records are built, so every record carries the
/// SHA-256 of its source bytes whether it came from a file, inline content or
/// a remote snapshot.
pub struct FeatureExtractor {
    walker: Box<dyn TreeWalker>,
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new(NodeWalker)
    }
}

impl FeatureExtractor {
    pub fn new(walker: impl TreeWalker + 'static) -> Self {
        Self {
            walker: Box::new(walker),
        }
    }

    /// Builds a record dated with the source's filesystem timestamp, or now.
    pub fn extract(&self, parsed: &ParsedSource, id: impl Into<SourceId>) -> ASTFeatures {
        let modify_date = parsed.modified.unwrap_or_else(Utc::now);
        self.extract_at(parsed, id, modify_date)
    }

    /// Builds a record with an externally supplied modification date.
    pub fn extract_at(
        &self,
        parsed: &ParsedSource,
        id: impl Into<SourceId>,
        modify_date: DateTime<Utc>,
    ) -> ASTFeatures {
        let mut features = StructuralFeatures::default();
        self.walker.walk(
            &parsed.tree,
            parsed.source.as_bytes(),
            parsed.language,
            &mut features,
        );
        ASTFeatures::new(
            id,
            content_hash(parsed.source.as_bytes()),
            modify_date,
            features,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::languages::Language;
    use crate::parser::loader::SourceLoader;
    use crate::utils::hash::is_sha256_hex;
    use chrono::TimeZone;

    struct SilentWalker;

    impl TreeWalker for SilentWalker {
        fn walk(&self, _: &tree_sitter::Tree, _: &[u8], _: Language, _: &mut StructuralFeatures) {}
    }

    #[test]
    fn test_extract_stamps_source_hash() {
        let code = "def f():\n    return 1\n";
        let parsed = SourceLoader::new(Language::Py).parse_content(code, "f.py").unwrap();
        let record = FeatureExtractor::default().extract(&parsed, "f.py");

        assert_eq!(record.id.as_str(), "f.py");
        assert_eq!(record.sha256, content_hash(code.as_bytes()));
        assert!(is_sha256_hex(&record.sha256));
        assert_eq!(record.features.head_nodes, vec!["f"]);
    }

    #[test]
    fn test_custom_walker_still_gets_fingerprint() {
        let parsed = SourceLoader::new(Language::Py).parse_content("x = 1\n", "x.py").unwrap();
        let record = FeatureExtractor::new(SilentWalker).extract(&parsed, "x.py");

        assert!(is_sha256_hex(&record.sha256));
        assert_eq!(record.features, StructuralFeatures::default());
    }

    #[test]
    fn test_extract_at_uses_given_date() {
        let date = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let parsed = SourceLoader::new(Language::Py).parse_content("x = 1\n", "x.py").unwrap();
        let record = FeatureExtractor::default().extract_at(&parsed, "x.py", date);
        assert_eq!(record.modify_date, date);
    }
}
