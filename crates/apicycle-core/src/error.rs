//! Error types for the lifecycle runner
//!
//! The taxonomy mirrors how failures surface to a test author:
//! - assertion failures (status, fields, schema) fail the current spec
//! - transport failures propagate from the HTTP layer
//! - cleanup-phase failures never appear here; the runner logs and swallows
//!   them so a teardown hiccup cannot mask the original test result

use apicycle_http::TransportError;
use apicycle_schema::ContractError;

/// Failures surfaced while executing a lifecycle spec
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// Response status differed from the operation's expectation
    #[error("{operation}: expected status {expected}, got {actual}: {body}")]
    StatusMismatch {
        /// Operation name (`create`, `get`, ...)
        operation: String,
        /// Declared expected status
        expected: u16,
        /// Status actually returned
        actual: u16,
        /// Response body excerpt for diagnosis
        body: String,
    },

    /// Expected fields were not a subset of the response body
    #[error("{operation}: expected fields mismatch:\n{mismatches}")]
    FieldMismatch {
        /// Operation name
        operation: String,
        /// Formatted field-level mismatch list
        mismatches: String,
    },

    /// Response body failed contract schema validation
    #[error("{operation}: response failed schema '{schema}':\n{details}")]
    SchemaValidation {
        /// Operation name
        operation: String,
        /// Schema name under components/schemas
        schema: String,
        /// Formatted field-level violation list
        details: String,
    },

    /// An operation names a schema but the runner has no contract loaded
    #[error("{0}: schema validation requested but no contract is loaded")]
    NoValidator(String),

    /// Response body was expected to be JSON but did not parse
    #[error("{operation}: failed to parse response body as JSON: {source}")]
    InvalidBody {
        /// Operation name
        operation: String,
        /// Parser diagnostic
        #[source]
        source: serde_json::Error,
    },

    /// A parent create succeeded but the response carried no id
    #[error("created parent '{0}' but its response carried no id")]
    MissingParentId(String),

    /// A static fixture declares no usable id
    #[error("static fixture for '{0}' carries no id")]
    MissingFixtureId(String),

    /// A setup-chain entry can be neither created nor resolved
    #[error("parent '{0}' has neither a create operation nor a static fixture")]
    UnresolvableParent(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Transport-level failure
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Contract loading/lookup failure
    #[error(transparent)]
    Contract(#[from] ContractError),
}

impl RunnerError {
    /// Whether this error came from an assertion rather than infrastructure
    #[inline]
    #[must_use]
    pub fn is_assertion(&self) -> bool {
        matches!(
            self,
            Self::StatusMismatch { .. } | Self::FieldMismatch { .. } | Self::SchemaValidation { .. }
        )
    }
}
