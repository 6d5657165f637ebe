//! Archival of pairwise comparison outcomes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::compare::CompareInfo;
use crate::model::features::{ASTFeatures, SourceId};
use crate::Result;

/// Order-independent key for two records: `first <= second` lexicographically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PairKey {
    pub first: SourceId,
    pub second: SourceId,
}

impl PairKey {
    pub fn new(a: &SourceId, b: &SourceId) -> Self {
        let (first, second) = if a <= b { (a, b) } else { (b, a) };
        Self {
            first: first.clone(),
            second: second.clone(),
        }
    }

    pub fn of(a: &ASTFeatures, b: &ASTFeatures) -> Self {
        Self::new(&a.id, &b.id)
    }

    /// The two records in key order.
    pub fn order<'r>(a: &'r ASTFeatures, b: &'r ASTFeatures) -> (&'r ASTFeatures, &'r ASTFeatures) {
        if a.id <= b.id {
            (a, b)
        } else {
            (b, a)
        }
    }
}

/// Canonical-pair-keyed store for comparison outcomes.
///
/// `save_result` upserts under `PairKey::of(first, second)`, replacing any
/// outcome stored for the same unordered pair. `get_result` may always return
/// `None`: a write-only archive is a valid implementation.
pub trait Reporter {
    fn save_result(
        &mut self,
        first: &ASTFeatures,
        second: &ASTFeatures,
        compare_info: &CompareInfo,
    ) -> Result<()>;

    fn get_result(&self, first: &ASTFeatures, second: &ASTFeatures) -> Result<Option<CompareInfo>>;
}

impl<R: Reporter + ?Sized> Reporter for &mut R {
    fn save_result(
        &mut self,
        first: &ASTFeatures,
        second: &ASTFeatures,
        compare_info: &CompareInfo,
    ) -> Result<()> {
        (**self).save_result(first, second, compare_info)
    }

    fn get_result(&self, first: &ASTFeatures, second: &ASTFeatures) -> Result<Option<CompareInfo>> {
        (**self).get_result(first, second)
    }
}

#[derive(Debug, Default)]
pub struct MemoryReporter {
    results: BTreeMap<PairKey, CompareInfo>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

impl Reporter for MemoryReporter {
    fn save_result(
        &mut self,
        first: &ASTFeatures,
        second: &ASTFeatures,
        compare_info: &CompareInfo,
    ) -> Result<()> {
        let key = PairKey::of(first, second);
        debug!(first = %key.first, second = %key.second, "comparison stored");
        self.results.insert(key, compare_info.clone());
        Ok(())
    }

    fn get_result(&self, first: &ASTFeatures, second: &ASTFeatures) -> Result<Option<CompareInfo>> {
        Ok(self.results.get(&PairKey::of(first, second)).cloned())
    }
}
