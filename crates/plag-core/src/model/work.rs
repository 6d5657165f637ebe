use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::features::SourceId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitInfo {
    pub sha: String,
    pub date: DateTime<Utc>,
}

/// A remotely fetched snapshot of one source unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkInfo {
    pub link: String,
    pub code: String,
    pub commit: CommitInfo,
}

impl WorkInfo {
    pub fn id(&self) -> SourceId {
        SourceId::new(self.link.as_str())
    }
}
