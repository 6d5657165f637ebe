pub mod extractor;
pub mod languages;
pub mod layout;
pub mod loader;
pub mod walker;

pub use extractor::FeatureExtractor;
pub use languages::Language;
pub use loader::{LoadError, ParseFailure, ParsedSource, SourceLoader};
pub use walker::{NodeWalker, TreeWalker};
