//! Error types for contract loading and schema validation

/// Failures around the API contract document
#[derive(Debug, thiserror::Error)]
pub enum ContractError {
    /// Contract file could not be read
    #[error("failed to read contract {path}: {source}")]
    Io {
        /// Path to the contract document
        path: String,
        /// Underlying IO failure
        #[source]
        source: std::io::Error,
    },

    /// Contract file was not valid JSON/YAML
    #[error("failed to parse contract {path}: {message}")]
    Parse {
        /// Path to the contract document
        path: String,
        /// Parser diagnostic
        message: String,
    },

    /// Contract has no `components/schemas` section
    #[error("contract defines no components/schemas section")]
    NoSchemas,

    /// Requested schema name is absent from the contract
    #[error("schema not found in contract: {0}")]
    UnknownSchema(String),

    /// Named schema exists but did not compile
    #[error("schema '{name}' failed to compile: {message}")]
    Compile {
        /// Schema name under components/schemas
        name: String,
        /// Compiler diagnostic
        message: String,
    },
}
