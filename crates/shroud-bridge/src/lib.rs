//! # shroud-bridge
//!
//! Function-level JSON entry points over the redaction engine and the
//! document projector. A transport layer (MCP server, HTTP shim, CLI) maps
//! its requests onto these handlers; everything here is
//! JSON-compatible-in, JSON-compatible-out.
//!
//! Detection and projection failures that a caller can act on are
//! returned as `{ "error": … }` payloads rather than transport faults;
//! only malformed configuration input is a handler error.

pub mod errors;
pub mod tools;

pub use errors::{BridgeError, BridgeResult};
pub use tools::{
    handle_analyze, handle_configure, handle_redact, handle_redact_file, handle_unredact,
    handle_unredact_file,
};
