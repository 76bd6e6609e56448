//! Schema assertions against an OpenAPI 3.x contract
//!
//! Loads the contract document once, then validates parsed response bodies
//! against named schemas under `components/schemas`. Compiling a validator
//! is comparatively expensive, so compiled validators are cached by schema
//! name; repeated assertions against the same schema are essentially free.

#![warn(unreachable_pub)]

pub mod error;
pub mod validator;

pub use error::ContractError;
pub use validator::{format_violations, CacheStats, SchemaOutcome, SchemaViolation, ValidatorCache};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
