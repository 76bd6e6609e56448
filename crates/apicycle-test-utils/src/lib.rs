//! Testing utilities for the apicycle workspace
//!
//! Shared helpers: a scripted in-memory transport, canned specs and
//! contracts, and tracing setup for tests that want output.

#![allow(missing_docs)]

use apicycle_core::{EntitySpec, Operation, Resolver};
use apicycle_http::{ApiRequest, ApiResponse, Method, Transport, TransportError};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::Arc;

/// One request the scripted transport saw
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub url: String,
    pub body: Option<Value>,
}

/// Transport that plays back a queued script of responses and records
/// every request for order/shape assertions.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<ApiResponse>>,
    log: Mutex<Vec<RecordedRequest>>,
}

impl ScriptedTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a JSON response
    pub fn push_json(&self, status: u16, body: Value) {
        self.script
            .lock()
            .push_back(ApiResponse::new(status, body.to_string()));
    }

    /// Queue a raw-body response (empty string for no-content)
    pub fn push_raw(&self, status: u16, body: &str) {
        self.script.lock().push_back(ApiResponse::new(status, body));
    }

    /// Builder-style variant of [`Self::push_json`]
    #[must_use]
    pub fn with_json(self, status: u16, body: Value) -> Self {
        self.push_json(status, body);
        self
    }

    /// Everything sent so far, in order
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.log.lock().clone()
    }

    /// Responses still queued
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.script.lock().len()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, req: &ApiRequest) -> Result<ApiResponse, TransportError> {
        self.log.lock().push(RecordedRequest {
            method: req.method,
            url: req.url.clone(),
            body: req.body.clone(),
        });
        self.script
            .lock()
            .pop_front()
            .ok_or_else(|| TransportError::Unavailable("scripted responses exhausted".to_string()))
    }
}

/// Install a compact tracing subscriber for test output (idempotent)
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_test_writer()
        .try_init();
}

/// Unique name for dynamically-created test entities
#[must_use]
pub fn unique_name(prefix: &str) -> String {
    format!("{prefix}-{}", uuid::Uuid::new_v4())
}

/// Minimal OpenAPI contract used across schema tests
pub static SAMPLE_CONTRACT: Lazy<Value> = Lazy::new(|| {
    json!({
        "openapi": "3.0.3",
        "info": {"title": "sample", "version": "1.0.0"},
        "paths": {},
        "components": {
            "schemas": {
                "Project": {
                    "type": "object",
                    "required": ["id", "name"],
                    "properties": {
                        "id": {"type": "string"},
                        "name": {"type": "string"},
                        "organizationId": {"type": "string"}
                    }
                },
                "Organization": {
                    "type": "object",
                    "required": ["id"],
                    "properties": {
                        "id": {"type": "string"},
                        "name": {"type": "string"}
                    }
                }
            }
        }
    })
});

fn id_of(entity: &Value) -> &str {
    entity["id"].as_str().unwrap_or("missing-id")
}

/// Static `Organization` fixture (pre-existing `org-1`, never deleted)
#[must_use]
pub fn organization_fixture() -> Arc<EntitySpec> {
    Arc::new(
        EntitySpec::new("Organization", "/organizations")
            .with_static_fixture(json!({"id": "org-1", "name": "Fixture Org"})),
    )
}

/// Dynamic `Project` spec with a full create/get/update/delete lifecycle
/// under the given organization parent
#[must_use]
pub fn project_spec(org: Arc<EntitySpec>) -> EntitySpec {
    EntitySpec::new("Project", "/projects")
        .with_parent(org)
        .with_operation(
            "create",
            Operation::at_base(Method::Post, 201)
                .with_payload(Resolver::from_fn(|parents, _| {
                    json!({
                        "name": "e2e project",
                        "organizationId": parents.get("Organization").unwrap_or(""),
                    })
                }))
                .capture(),
        )
        .with_operation(
            "get",
            Operation::from_captured(Method::Get, |e| format!("/projects/{}", id_of(e)), 200),
        )
        .with_operation(
            "update",
            Operation::from_captured(Method::Patch, |e| format!("/projects/{}", id_of(e)), 200)
                .with_payload(json!({"name": "renamed project"}))
                .capture(),
        )
        .with_operation(
            "delete",
            Operation::from_captured(Method::Delete, |e| format!("/projects/{}", id_of(e)), 204)
                .releases_entity(),
        )
}
