//! Matching and replacement engine for network identifiers.
//!
//! Recognizes IPv4 addresses, IPv6 literals, and MAC addresses in
//! free-form text and substitutes each occurrence with a synthetic
//! value of the same shape. The engine is pure, synchronous, and
//! request-local: nothing is shared between instances.

pub mod engine;
pub mod error;
pub mod patterns;

pub use engine::{IdentifierFamily, RedactMode, RedactorEngine, DEFAULT_CONTEXT};
pub use error::RedactError;
