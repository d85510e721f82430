//! Request/response envelopes exchanged between client and server.
//!
//! The envelope provides a serializable, transportable format for every
//! operation. This enables:
//! - Swapping transports (in-process, scripted mocks)
//! - Operation logging and replay
//! - Debugging and inspection

mod operations;
mod serialization;
mod validation;

pub use operations::{GraphQlError, Request, Response, SourceLocation};
pub use serialization::{from_json, to_json_pretty};
pub use validation::{validate_request, MAX_TEXT_LEN};
