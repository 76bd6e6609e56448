//! Declarative lifecycle specs
//!
//! An [`EntitySpec`] describes one API resource's test lifecycle: how to
//! reach it, which parents must exist first, and the ordered operations the
//! runner will execute against it. Specs only declare intent; execution
//! discipline (setup order, teardown, retries) lives in the runner.

use crate::resolve::Resolver;
use apicycle_http::Method;
use indexmap::IndexMap;
use serde_json::Value;
use std::sync::Arc;

/// Operation name the runner treats as entity creation during parent setup
pub const OP_CREATE: &str = "create";
/// Operation name the runner uses to restore a static fixture
pub const OP_UPDATE: &str = "update";
/// Operation name the runner invokes during teardown
pub const OP_DELETE: &str = "delete";

/// What to retain from a response body as the captured entity
pub enum Capture {
    /// Capture nothing
    None,
    /// The entire response body becomes the captured entity
    Whole,
    /// Extract a sub-object (for non-standard multi-status responses)
    Extract(Arc<dyn Fn(&Value) -> Value + Send + Sync>),
}

impl Clone for Capture {
    fn clone(&self) -> Self {
        match self {
            Self::None => Self::None,
            Self::Whole => Self::Whole,
            Self::Extract(f) => Self::Extract(Arc::clone(f)),
        }
    }
}

impl std::fmt::Debug for Capture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Whole => f.write_str("Whole"),
            Self::Extract(_) => f.write_str("Extract(..)"),
        }
    }
}

/// One HTTP interaction within a lifecycle
#[derive(Debug, Clone)]
pub struct Operation {
    /// HTTP method
    pub method: Method,
    /// Request path, constant or computed from parents/captured entity;
    /// `None` falls back to the spec's base path
    pub path: Option<Resolver<String>>,
    /// JSON payload, if the method carries one
    pub payload: Option<Resolver<Value>>,
    /// Status the response must carry
    pub expected_status: u16,
    /// Fields that must be a deep-partial subset of the response body
    pub expected_fields: Option<Resolver<Value>>,
    /// Contract schema name the body must satisfy
    pub schema: Option<String>,
    /// What to retain from the body
    pub capture: Capture,
    /// Clear the captured entity after this operation (typically delete)
    pub release_entity: bool,
}

impl Operation {
    /// Create an operation with no payload or assertions beyond the status
    #[must_use]
    pub fn new(method: Method, path: impl Into<Resolver<String>>, expected_status: u16) -> Self {
        Self {
            method,
            path: Some(path.into()),
            payload: None,
            expected_status,
            expected_fields: None,
            schema: None,
            capture: Capture::None,
            release_entity: false,
        }
    }

    /// Operation addressed at the spec's base path (typical for create)
    #[must_use]
    pub fn at_base(method: Method, expected_status: u16) -> Self {
        Self {
            method,
            path: None,
            payload: None,
            expected_status,
            expected_fields: None,
            schema: None,
            capture: Capture::None,
            release_entity: false,
        }
    }

    /// Operation whose path is a function of the captured entity
    #[must_use]
    pub fn from_captured<F>(method: Method, path: F, expected_status: u16) -> Self
    where
        F: Fn(&Value) -> String + Send + Sync + 'static,
    {
        Self::new(
            method,
            Resolver::from_fn(move |_, captured| path(captured.unwrap_or(&Value::Null))),
            expected_status,
        )
    }

    /// Attach a request payload
    #[must_use]
    pub fn with_payload(mut self, payload: impl Into<Resolver<Value>>) -> Self {
        self.payload = Some(payload.into());
        self
    }

    /// Assert these fields appear in the response body
    #[must_use]
    pub fn with_expected_fields(mut self, fields: impl Into<Resolver<Value>>) -> Self {
        self.expected_fields = Some(fields.into());
        self
    }

    /// Validate the body against a named contract schema
    #[must_use]
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Capture the whole response body as the entity under test
    #[must_use]
    pub fn capture(mut self) -> Self {
        self.capture = Capture::Whole;
        self
    }

    /// Capture a sub-object extracted from the response body
    #[must_use]
    pub fn capture_with<F>(mut self, extract: F) -> Self
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        self.capture = Capture::Extract(Arc::new(extract));
        self
    }

    /// Clear the captured entity once this operation succeeds
    #[must_use]
    pub fn releases_entity(mut self) -> Self {
        self.release_entity = true;
        self
    }
}

/// Declarative description of one API resource's test lifecycle
///
/// Exactly one of two modes applies: a static fixture (pre-existing entity,
/// never deleted, restored via its `update` operation) or a dynamic entity
/// (created and destroyed within the run). `setup_chain` must be a true
/// dependency order: earlier entries never depend on later ones.
#[derive(Debug, Clone)]
pub struct EntitySpec {
    /// Entity name, also the key under which its id lands in `ParentIds`
    pub name: String,
    /// Collection path, constant or parent-parameterized
    pub base_path: Resolver<String>,
    /// Pre-existing entity this spec references instead of creating one
    pub static_fixture: Option<Value>,
    /// Body field carrying the entity identifier
    pub id_field: String,
    /// Parent specs, in dependency order
    pub setup_chain: Vec<Arc<EntitySpec>>,
    /// Named operations, executed in declaration order
    pub operations: IndexMap<String, Operation>,
}

impl EntitySpec {
    /// Create a spec with no parents, operations, or fixture
    #[must_use]
    pub fn new(name: impl Into<String>, base_path: impl Into<Resolver<String>>) -> Self {
        Self {
            name: name.into(),
            base_path: base_path.into(),
            static_fixture: None,
            id_field: "id".to_string(),
            setup_chain: Vec::new(),
            operations: IndexMap::new(),
        }
    }

    /// Mark this spec as referencing a pre-existing entity
    #[must_use]
    pub fn with_static_fixture(mut self, fixture: Value) -> Self {
        self.static_fixture = Some(fixture);
        self
    }

    /// Use a different body field as the entity identifier
    #[must_use]
    pub fn with_id_field(mut self, id_field: impl Into<String>) -> Self {
        self.id_field = id_field.into();
        self
    }

    /// Append a parent dependency (declaration order = dependency order)
    #[must_use]
    pub fn with_parent(mut self, parent: Arc<EntitySpec>) -> Self {
        self.setup_chain.push(parent);
        self
    }

    /// Append a named operation (declaration order = execution order)
    #[must_use]
    pub fn with_operation(mut self, name: impl Into<String>, op: Operation) -> Self {
        self.operations.insert(name.into(), op);
        self
    }

    /// Look up a declared operation
    #[must_use]
    pub fn operation(&self, name: &str) -> Option<&Operation> {
        self.operations.get(name)
    }

    /// Whether this spec references a pre-existing entity
    #[inline]
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.static_fixture.is_some()
    }

    /// Extract this entity's identifier from a body or fixture value
    #[must_use]
    pub fn entity_id(&self, value: &Value) -> Option<String> {
        match value.get(&self.id_field) {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        }
    }
}
