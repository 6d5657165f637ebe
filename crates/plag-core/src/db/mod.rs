//! Document-store backend for the feature cache and the comparison archive.
//!
//! Documents are JSON values keyed by an `_id`, stored one table per
//! collection in SQLite. Repositories borrow the [`DocumentConnection`] they
//! were built from, so the connection owner decides when it is released.

pub mod backend;
pub mod connection;
pub mod repository;

pub use backend::{DocumentFeaturesCache, DocumentReporter};
pub use connection::{Collection, ConnectionSettings, DocumentConnection, Location};
pub use repository::{CompareDocument, FeaturesDocument, FeaturesRepository, ReportRepository};
