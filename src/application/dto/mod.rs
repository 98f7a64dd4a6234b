//! Data Transfer Objects - For API boundaries
//!
//! DTOs live in the application layer so infrastructure (HTTP) can
//! serialize/deserialize request and response shapes independently of the
//! persisted model.

mod adventure;
mod save_document;

pub use adventure::*;
pub use save_document::SaveDocument;
