use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use super::connection::{Collection, DocumentConnection};
use crate::model::compare::CompareInfo;
use crate::model::features::{ASTFeatures, SourceId};
use crate::report::PairKey;
use crate::{PlagError, Result};

/// Persisted form of a feature record, keyed by identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeaturesDocument {
    #[serde(rename = "_id")]
    pub id: SourceId,
    pub modify_date: DateTime<Utc>,
    pub sha256: String,
    pub features: serde_json::Value,
}

impl FeaturesDocument {
    pub fn from_features(work: &ASTFeatures) -> Result<Self> {
        Ok(Self {
            id: work.id.clone(),
            modify_date: work.modify_date,
            sha256: work.sha256.clone(),
            features: serde_json::to_value(&work.features)?,
        })
    }
}

/// Persisted form of a comparison outcome, keyed by the canonical pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompareDocument {
    #[serde(rename = "_id")]
    pub id: PairKey,
    pub first_sha256: String,
    pub second_sha256: String,
    pub first_modify_date: DateTime<Utc>,
    pub second_modify_date: DateTime<Utc>,
    pub compare_info: serde_json::Value,
}

impl CompareDocument {
    pub fn from_result(
        work1: &ASTFeatures,
        work2: &ASTFeatures,
        compare_info: &CompareInfo,
    ) -> Result<Self> {
        let (first, second) = PairKey::order(work1, work2);
        Ok(Self {
            id: PairKey::of(first, second),
            first_sha256: first.sha256.clone(),
            second_sha256: second.sha256.clone(),
            first_modify_date: first.modify_date,
            second_modify_date: second.modify_date,
            compare_info: serde_json::to_value(compare_info)?,
        })
    }
}

fn resolve_collection<'c>(
    connection: &'c DocumentConnection,
    name: &'static str,
) -> Result<Collection<'c>> {
    let Some(collection) = connection.get_collection(name) else {
        error!(collection = name, url = connection.url(), "Collection not found");
        return Err(PlagError::MissingCollection(name));
    };
    collection.ensure_exists()?;
    Ok(collection)
}

pub struct ReportRepository<'c> {
    collection: Collection<'c>,
}

impl<'c> ReportRepository<'c> {
    pub const COLLECTION_NAME: &'static str = "compare_info";

    pub fn new(connection: &'c DocumentConnection) -> Result<Self> {
        Ok(Self {
            collection: resolve_collection(connection, Self::COLLECTION_NAME)?,
        })
    }

    pub fn collection(&self) -> &Collection<'c> {
        &self.collection
    }

    /// Upserts the outcome under the sorted pair of identities.
    pub fn write_compare_info(
        &self,
        work1: &ASTFeatures,
        work2: &ASTFeatures,
        compare_info: &CompareInfo,
    ) -> Result<()> {
        let document = CompareDocument::from_result(work1, work2, compare_info)?;
        self.collection.update_one_upsert(&document.id, &document)?;
        debug!(
            first = %document.id.first,
            second = %document.id.second,
            "Comparison document inserted/updated"
        );
        Ok(())
    }
}

pub struct FeaturesRepository<'c> {
    collection: Collection<'c>,
}

impl<'c> FeaturesRepository<'c> {
    pub const COLLECTION_NAME: &'static str = "features";

    pub fn new(connection: &'c DocumentConnection) -> Result<Self> {
        Ok(Self {
            collection: resolve_collection(connection, Self::COLLECTION_NAME)?,
        })
    }

    pub fn collection(&self) -> &Collection<'c> {
        &self.collection
    }

    /// Upserts the record under its identity.
    pub fn write_features(&self, work: &ASTFeatures) -> Result<()> {
        let document = FeaturesDocument::from_features(work)?;
        self.collection.update_one_upsert(&document.id, &document)?;
        debug!(id = %document.id, "Features document inserted/updated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connection::ConnectionSettings;
    use crate::model::compare::FastCompareInfo;
    use crate::model::features::StructuralFeatures;
    use chrono::TimeZone;
    use serde_json::json;

    fn record(id: &str, sha256: &str) -> ASTFeatures {
        let mut features = StructuralFeatures::default();
        features.head_nodes.push("main".to_string());
        ASTFeatures::new(
            id,
            sha256,
            Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap(),
            features,
        )
    }

    fn outcome(score: f64) -> CompareInfo {
        CompareInfo::new(FastCompareInfo {
            jakkar: score,
            operators: score,
            keywords: score,
            literals: score,
            weighted_average: score,
        })
    }

    #[test]
    fn test_features_document_shape() {
        let conn = DocumentConnection::connect(&ConnectionSettings::in_memory()).unwrap();
        let repo = FeaturesRepository::new(&conn).unwrap();
        repo.write_features(&record("/a.py", "h1")).unwrap();

        let doc = repo.collection().find_one(&"/a.py").unwrap().unwrap();
        assert_eq!(doc["_id"], "/a.py");
        assert_eq!(doc["sha256"], "h1");
        assert_eq!(doc["modify_date"], "2024-01-02T03:04:05Z");
        assert_eq!(doc["features"]["head_nodes"], json!(["main"]));
    }

    #[test]
    fn test_write_features_is_idempotent() {
        let conn = DocumentConnection::connect(&ConnectionSettings::in_memory()).unwrap();
        let repo = FeaturesRepository::new(&conn).unwrap();

        repo.write_features(&record("/a.py", "h1")).unwrap();
        repo.write_features(&record("/a.py", "h1")).unwrap();
        assert_eq!(repo.collection().count().unwrap(), 1);

        repo.write_features(&record("/a.py", "h2")).unwrap();
        assert_eq!(repo.collection().count().unwrap(), 1);
        let doc = repo.collection().find_one(&"/a.py").unwrap().unwrap();
        assert_eq!(doc["sha256"], "h2");
    }

    #[test]
    fn test_compare_document_uses_canonical_pair() {
        let conn = DocumentConnection::connect(&ConnectionSettings::in_memory()).unwrap();
        let repo = ReportRepository::new(&conn).unwrap();
        let a = record("/a.py", "ha");
        let b = record("/b.py", "hb");

        repo.write_compare_info(&a, &b, &outcome(0.2)).unwrap();
        repo.write_compare_info(&b, &a, &outcome(0.8)).unwrap();

        assert_eq!(repo.collection().count().unwrap(), 1);
        let id = json!({"first": "/a.py", "second": "/b.py"});
        let doc = repo.collection().find_one(&id).unwrap().unwrap();
        assert_eq!(doc["_id"], id);
        assert_eq!(doc["first_sha256"], "ha");
        assert_eq!(doc["second_sha256"], "hb");
        assert_eq!(doc["compare_info"], serde_json::to_value(outcome(0.8)).unwrap());
    }

    #[test]
    fn test_repositories_share_one_connection() {
        let conn = DocumentConnection::connect(&ConnectionSettings::in_memory()).unwrap();
        let features = FeaturesRepository::new(&conn).unwrap();
        let reports = ReportRepository::new(&conn).unwrap();

        features.write_features(&record("/a.py", "h1")).unwrap();
        assert_eq!(features.collection().count().unwrap(), 1);
        assert_eq!(reports.collection().count().unwrap(), 0);
    }

    #[test]
    fn test_missing_collection_after_disconnect() {
        let mut conn = DocumentConnection::connect(&ConnectionSettings::in_memory()).unwrap();
        conn.disconnect().unwrap();

        let err = FeaturesRepository::new(&conn).err().unwrap();
        assert!(matches!(err, PlagError::MissingCollection("features")));
        let err = ReportRepository::new(&conn).err().unwrap();
        assert!(matches!(err, PlagError::MissingCollection("compare_info")));
    }
}
