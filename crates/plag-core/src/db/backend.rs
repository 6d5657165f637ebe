use super::connection::DocumentConnection;
use super::repository::{FeaturesRepository, ReportRepository};
use crate::cache::FeaturesCache;
use crate::model::compare::CompareInfo;
use crate::model::features::{ASTFeatures, SourceId};
use crate::report::Reporter;
use crate::Result;

/// Feature cache over the document store.
///
/// The read path is not implemented: `get_features` always misses, so the
/// store acts as a write-only archive and every run re-parses its sources.
pub struct DocumentFeaturesCache<'c> {
    repository: FeaturesRepository<'c>,
}

impl<'c> DocumentFeaturesCache<'c> {
    pub fn new(connection: &'c DocumentConnection) -> Result<Self> {
        Ok(Self::from_repository(FeaturesRepository::new(connection)?))
    }

    pub fn from_repository(repository: FeaturesRepository<'c>) -> Self {
        Self { repository }
    }

    pub fn repository(&self) -> &FeaturesRepository<'c> {
        &self.repository
    }
}

impl FeaturesCache for DocumentFeaturesCache<'_> {
    fn get_features(&self, _id: &SourceId) -> Result<Option<ASTFeatures>> {
        Ok(None)
    }

    fn save_features(&mut self, features: &ASTFeatures) -> Result<()> {
        self.repository.write_features(features)
    }
}

/// Comparison archive over the document store. Write-only, like
/// [`DocumentFeaturesCache`].
pub struct DocumentReporter<'c> {
    repository: ReportRepository<'c>,
}

impl<'c> DocumentReporter<'c> {
    pub fn new(connection: &'c DocumentConnection) -> Result<Self> {
        Ok(Self::from_repository(ReportRepository::new(connection)?))
    }

    pub fn from_repository(repository: ReportRepository<'c>) -> Self {
        Self { repository }
    }

    pub fn repository(&self) -> &ReportRepository<'c> {
        &self.repository
    }
}

impl Reporter for DocumentReporter<'_> {
    fn save_result(
        &mut self,
        first: &ASTFeatures,
        second: &ASTFeatures,
        compare_info: &CompareInfo,
    ) -> Result<()> {
        self.repository.write_compare_info(first, second, compare_info)
    }

    fn get_result(&self, _first: &ASTFeatures, _second: &ASTFeatures) -> Result<Option<CompareInfo>> {
        Ok(None)
    }
}
