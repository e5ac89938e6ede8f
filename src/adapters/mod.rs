//! Adapters layer: Concrete implementations of ports.
//!
//! These modules contain the actual integration with external artifacts:
//! - `artifact`: serialized scoring pipeline and background sample
//! - `population`: CSV reference-population table
//! - `sqlite`: SQLite assessment history

pub mod artifact;
pub mod population;
pub mod sqlite;

// Re-export adapter errors for lib.rs
pub use artifact::ArtifactError;
pub use population::PopulationError;
pub use sqlite::StorageError;
