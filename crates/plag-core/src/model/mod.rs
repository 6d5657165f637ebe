pub mod compare;
pub mod features;
pub mod work;

pub use compare::{CompareInfo, FastCompareInfo, StructuresInfo};
pub use features::{ASTFeatures, NodeStructure, SourceId, StructuralFeatures};
pub use work::{CommitInfo, WorkInfo};
