//! REST client for the persistence and generation backend.
//!
//! The rules crate computes; this crate moves records over the wire. The
//! payload module owns the flattened wire encoding the backend expects,
//! including its JSON-encoded string columns.

pub mod characters;
pub mod companions;
pub mod config;
pub mod correlation;
pub mod error;
pub mod generation;
pub mod http;
pub mod payload;

pub use config::ApiConfig;
pub use correlation::CorrelationId;
pub use error::ApiError;
pub use generation::ContentGenerator;
pub use http::ApiClient;
pub use payload::{CharacterPayload, CharacterRecord, CompanionPayload, CompanionRecord};
