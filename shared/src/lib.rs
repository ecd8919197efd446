//! Shared types for the admin backend
//!
//! Common types used across crates: error codes, the response envelope,
//! query/filter primitives, domain DTOs and validation.

pub mod decimal;
pub mod error;
pub mod params;
pub mod query;
pub mod response;
pub mod util;
pub mod vo;

// Re-exports
pub use http;
pub use serde::{Deserialize, Serialize};

pub use error::{AppError, ErrorCode};
pub use response::ApiResponse;
