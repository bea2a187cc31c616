//! # shroud-core
//!
//! Foundation crate for the shroud redaction system.
//! Defines the span/entity types, detection-layer traits, errors, and config.
//! Every other crate in the workspace depends on this.

pub mod config;
pub mod entity;
pub mod errors;
pub mod traits;

// Re-export the most commonly used types at the crate root.
pub use config::{EngineConfig, ReviewerConfig};
pub use entity::{DetectionSource, EntitySpan, EntityType};
pub use errors::{ShroudError, ShroudResult};
