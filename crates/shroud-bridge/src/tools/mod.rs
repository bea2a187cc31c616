//! Tool handlers: redact, unredact, analyze, configure, redact_file,
//! unredact_file.

pub mod analyze;
pub mod configure;
pub mod redact;
pub mod redact_file;
pub mod unredact;
pub mod unredact_file;

pub use analyze::handle_analyze;
pub use configure::{handle_configure, CustomPattern};
pub use redact::handle_redact;
pub use redact_file::handle_redact_file;
pub use unredact::handle_unredact;
pub use unredact_file::handle_unredact_file;

use shroud_core::EntityType;

/// Parse an optional tag-name filter into entity types.
pub(crate) fn parse_entity_types(entity_types: Option<&[String]>) -> Option<Vec<EntityType>> {
    entity_types.map(|tags| tags.iter().map(|tag| EntityType::from_tag(tag)).collect())
}
