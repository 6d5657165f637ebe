//! Feature extraction and result archival for source-code similarity analysis.
//!
//! Sources are parsed with tree-sitter, walked into structural feature records
//! stamped with a SHA-256 fingerprint of their content, and written through a
//! [`cache::FeaturesCache`]. Pairwise comparison outcomes are archived through a
//! [`report::Reporter`] under an order-independent [`report::PairKey`].

pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod getter;
pub mod model;
pub mod parser;
pub mod report;
pub mod utils;

pub use error::{PlagError, Result};
