//! apicycle core - declarative REST entity lifecycle testing
//!
//! The central piece of the workspace:
//! - Describes one API resource's test lifecycle as an [`EntitySpec`]:
//!   parent dependencies, create/read/update/delete operations, expected
//!   statuses, field subsets, and contract schema names
//! - Executes the spec with [`LifecycleRunner`]: parents are resolved in
//!   declared order, operations run sequentially, and teardown always runs
//!   in reverse dependency order, restoring static fixtures and deleting
//!   dynamically-created entities
//!
//! # Example
//!
//! ```rust,ignore
//! use apicycle_core::{EntitySpec, LifecycleRunner, Operation, RunnerConfig};
//! use apicycle_http::{Method, ReqwestTransport};
//! use std::sync::Arc;
//!
//! # async fn example() {
//! let spec = EntitySpec::new("Site", "/sites")
//!     .with_operation("create", Operation::at_base(Method::Post, 201).capture())
//!     .with_operation(
//!         "delete",
//!         Operation::from_captured(
//!             Method::Delete,
//!             |e| format!("/sites/{}", e["id"].as_str().unwrap_or_default()),
//!             204,
//!         )
//!         .releases_entity(),
//!     );
//!
//! let config = RunnerConfig::new("https://api.example.test/v1");
//! let runner = LifecycleRunner::new(config, Arc::new(ReqwestTransport::new()));
//! let (result, report) = runner.execute(&spec).await;
//! println!("{}", report.summary());
//! result.unwrap();
//! # }
//! ```

#![warn(unreachable_pub)]

pub mod config;
pub mod error;
pub mod matching;
pub mod report;
pub mod resolve;
pub mod runner;
pub mod spec;

pub use config::RunnerConfig;
pub use error::RunnerError;
pub use matching::{format_mismatches, partial_mismatches, FieldMismatch};
pub use report::{OperationRecord, RunReport};
pub use resolve::{ParentIds, Resolver};
pub use runner::{LifecycleRunner, OperationOutcome};
pub use spec::{Capture, EntitySpec, Operation, OP_CREATE, OP_DELETE, OP_UPDATE};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for writing lifecycle specs
    pub use crate::{
        Capture, EntitySpec, LifecycleRunner, Operation, ParentIds, Resolver, RunReport,
        RunnerConfig, RunnerError,
    };
    pub use apicycle_http::{Method, RetryPolicy};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
