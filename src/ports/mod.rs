//! Ports layer: Trait definitions for external operations.
//!
//! Following Hexagonal Architecture, these traits define the boundaries
//! between the application and external systems (model artifact, storage).

mod classifier;
mod history;

pub use classifier::{Classifier, PredictionError};
pub use history::HistoryStore;
