//! Identity-keyed write-through storage for feature records.

use std::collections::HashMap;
use std::path::Path;

use tracing::debug;

use crate::model::features::{ASTFeatures, SourceId};
use crate::model::work::WorkInfo;
use crate::Result;

/// Write-through memoization store for feature records.
///
/// Lookups go by identity only; no fingerprint or timestamp validation happens
/// at lookup time. Saves are idempotent upserts that overwrite whatever was
/// stored for the same identity. Nothing is ever evicted.
pub trait FeaturesCache {
    fn get_features(&self, id: &SourceId) -> Result<Option<ASTFeatures>>;

    fn save_features(&mut self, features: &ASTFeatures) -> Result<()>;

    fn get_features_from_filepath(&self, path: &Path) -> Result<Option<ASTFeatures>> {
        self.get_features(&SourceId::from_path(path))
    }

    fn get_features_from_work_info(&self, work: &WorkInfo) -> Result<Option<ASTFeatures>> {
        self.get_features(&work.id())
    }
}

impl<C: FeaturesCache + ?Sized> FeaturesCache for &mut C {
    fn get_features(&self, id: &SourceId) -> Result<Option<ASTFeatures>> {
        (**self).get_features(id)
    }

    fn save_features(&mut self, features: &ASTFeatures) -> Result<()> {
        (**self).save_features(features)
    }
}

impl<C: FeaturesCache + ?Sized> FeaturesCache for Box<C> {
    fn get_features(&self, id: &SourceId) -> Result<Option<ASTFeatures>> {
        (**self).get_features(id)
    }

    fn save_features(&mut self, features: &ASTFeatures) -> Result<()> {
        (**self).save_features(features)
    }
}

/// Process-local cache with a full read path.
#[derive(Debug, Default)]
pub struct MemoryFeaturesCache {
    records: HashMap<SourceId, ASTFeatures>,
}

impl MemoryFeaturesCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl FeaturesCache for MemoryFeaturesCache {
    fn get_features(&self, id: &SourceId) -> Result<Option<ASTFeatures>> {
        Ok(self.records.get(id).cloned())
    }

    fn save_features(&mut self, features: &ASTFeatures) -> Result<()> {
        self.records.insert(features.id.clone(), features.clone());
        debug!(id = %features.id, "features cached");
        Ok(())
    }
}
