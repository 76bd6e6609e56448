//! Entity lifecycle execution
//!
//! The runner turns a declarative [`EntitySpec`] into a disciplined
//! sequence: resolve/create parents in declared order, run the entity's own
//! operations in declaration order with status/field/schema assertions, then
//! tear down unconditionally in reverse dependency order. Cleanup failures
//! are logged and swallowed so they never mask the original test result.

use crate::config::RunnerConfig;
use crate::error::RunnerError;
use crate::matching::{format_mismatches, partial_mismatches};
use crate::report::RunReport;
use crate::resolve::{ParentIds, Resolver};
use crate::spec::{Capture, EntitySpec, Operation, OP_CREATE, OP_DELETE, OP_UPDATE};
use apicycle_http::{send_with_retry, ApiRequest, ApiResponse, Transport};
use apicycle_schema::{format_violations, ValidatorCache};
use serde_json::Value;
use std::sync::Arc;

/// Response plus parsed body for one executed operation
#[derive(Debug)]
pub struct OperationOutcome {
    /// The full response
    pub response: ApiResponse,
    /// Parsed JSON body; `None` for no-content responses
    pub body: Option<Value>,
}

/// Executes lifecycle specs against one API environment
pub struct LifecycleRunner {
    config: RunnerConfig,
    transport: Arc<dyn Transport>,
    validator: Option<ValidatorCache>,
}

impl std::fmt::Debug for LifecycleRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifecycleRunner")
            .field("config", &self.config)
            .field("validator", &self.validator.is_some())
            .finish_non_exhaustive()
    }
}

impl LifecycleRunner {
    /// Create a runner over a transport
    #[must_use]
    pub fn new(config: RunnerConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            config,
            transport,
            validator: None,
        }
    }

    /// Attach a contract validator for operations that name a schema
    #[must_use]
    pub fn with_validator(mut self, validator: ValidatorCache) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Resolve every parent in the spec's setup chain, in order
    ///
    /// A parent with a `create` operation is created with the parent ids
    /// accumulated so far and its response id recorded; a parent without one
    /// must carry a static fixture whose declared id is used directly.
    pub async fn setup(&self, spec: &EntitySpec) -> Result<ParentIds, RunnerError> {
        let mut parents = ParentIds::new();
        self.setup_into(spec, &mut parents).await?;
        Ok(parents)
    }

    async fn setup_into(
        &self,
        spec: &EntitySpec,
        parents: &mut ParentIds,
    ) -> Result<(), RunnerError> {
        for parent in &spec.setup_chain {
            if let Some(create) = parent.operation(OP_CREATE) {
                let outcome = self
                    .run_operation(parent, OP_CREATE, create, parents, None)
                    .await?;
                if outcome.response.status != create.expected_status {
                    return Err(status_mismatch(OP_CREATE, create, &outcome.response));
                }
                let id = outcome
                    .body
                    .as_ref()
                    .and_then(|b| parent.entity_id(b))
                    .ok_or_else(|| RunnerError::MissingParentId(parent.name.clone()))?;
                tracing::info!("created parent {} ({id})", parent.name);
                parents.insert(parent.name.clone(), id);
            } else {
                let fixture = parent
                    .static_fixture
                    .as_ref()
                    .ok_or_else(|| RunnerError::UnresolvableParent(parent.name.clone()))?;
                let id = parent
                    .entity_id(fixture)
                    .ok_or_else(|| RunnerError::MissingFixtureId(parent.name.clone()))?;
                tracing::info!("using fixture parent {} ({id})", parent.name);
                parents.insert(parent.name.clone(), id);
            }
        }
        Ok(())
    }

    /// Issue one operation's request through the retry wrapper
    ///
    /// Resolves path and payload (constant or function), traces the
    /// exchange, and parses the JSON body unless the operation expects a
    /// no-content status. No assertions are applied here.
    pub async fn run_operation(
        &self,
        spec: &EntitySpec,
        name: &str,
        op: &Operation,
        parents: &ParentIds,
        captured: Option<&Value>,
    ) -> Result<OperationOutcome, RunnerError> {
        let path = op.path.as_ref().map_or_else(
            || spec.base_path.resolve(parents, captured),
            |p| p.resolve(parents, captured),
        );
        let mut req = ApiRequest::new(op.method, self.config.url_for(&path));
        if let Some(payload) = &op.payload {
            req = req.with_body(payload.resolve(parents, captured));
        }

        tracing::info!("→ {} {} [{}.{}]", op.method, req.url, spec.name, name);
        let response = send_with_retry(self.transport.as_ref(), &req, &self.config.retry).await?;
        tracing::info!(
            "← {} {} {} ({} bytes)",
            response.status,
            op.method,
            req.url,
            response.body.len()
        );

        let body = if is_no_content_status(op.expected_status) || response.is_no_content() {
            None
        } else {
            Some(
                response
                    .json()
                    .map_err(|source| RunnerError::InvalidBody {
                        operation: name.to_string(),
                        source,
                    })?,
            )
        };

        Ok(OperationOutcome { response, body })
    }

    /// Run the full lifecycle: setup, operations in order, then cleanup
    ///
    /// Cleanup runs exactly once whether setup or any operation failed; its
    /// notes land in the report. The first operation failure stops further
    /// operations and is returned alongside the report.
    pub async fn execute(&self, spec: &EntitySpec) -> (Result<(), RunnerError>, RunReport) {
        let mut report = RunReport::new(&spec.name);
        let mut parents = ParentIds::new();
        let mut captured: Option<Value> = None;

        let mut result = self.setup_into(spec, &mut parents).await;
        if let Err(e) = &result {
            tracing::error!("setup failed for {}: {e}", spec.name);
        }

        if result.is_ok() {
            for (name, op) in &spec.operations {
                match self
                    .run_operation(spec, name, op, &parents, captured.as_ref())
                    .await
                {
                    Ok(outcome) => {
                        let status = outcome.response.status;
                        match self.check(name, op, &outcome, &parents, captured.as_ref()) {
                            Ok(()) => {
                                apply_capture(op, &outcome, &mut captured);
                                report.record_pass(name, status);
                            }
                            Err(e) => {
                                report.record_fail(name, Some(status), &e.to_string());
                                result = Err(e);
                                break;
                            }
                        }
                    }
                    Err(e) => {
                        report.record_fail(name, None, &e.to_string());
                        result = Err(e);
                        break;
                    }
                }
            }
        }

        report.cleanup_notes = self.cleanup(spec, &parents, captured.as_ref()).await;
        (result, report)
    }

    fn check(
        &self,
        name: &str,
        op: &Operation,
        outcome: &OperationOutcome,
        parents: &ParentIds,
        captured: Option<&Value>,
    ) -> Result<(), RunnerError> {
        if outcome.response.status != op.expected_status {
            return Err(status_mismatch(name, op, &outcome.response));
        }

        let body = outcome.body.clone().unwrap_or(Value::Null);

        if let Some(expected) = &op.expected_fields {
            let expected = expected.resolve(parents, captured);
            let mismatches = partial_mismatches(&expected, &body);
            if !mismatches.is_empty() {
                return Err(RunnerError::FieldMismatch {
                    operation: name.to_string(),
                    mismatches: format_mismatches(&mismatches),
                });
            }
        }

        if let Some(schema) = &op.schema {
            let validator = self
                .validator
                .as_ref()
                .ok_or_else(|| RunnerError::NoValidator(name.to_string()))?;
            let verdict = validator.validate(&body, schema)?;
            if !verdict.valid {
                return Err(RunnerError::SchemaValidation {
                    operation: name.to_string(),
                    schema: schema.clone(),
                    details: format_violations(&verdict.violations),
                });
            }
        }

        Ok(())
    }

    /// Best-effort teardown; never fails the run
    ///
    /// 1. Dynamic entity with a captured id and a `delete` operation: delete.
    /// 2. Static fixture with an `update` operation: restore the fixture's
    ///    original values for exactly the keys of the update payload.
    /// 3. Setup chain in reverse: delete each dynamic parent with a resolved
    ///    id and a `delete` operation. Static fixtures are never deleted.
    ///
    /// Returns human-readable notes for the report; failures are logged via
    /// `tracing::warn!` and swallowed.
    pub async fn cleanup(
        &self,
        spec: &EntitySpec,
        parents: &ParentIds,
        captured: Option<&Value>,
    ) -> Vec<String> {
        let mut notes = Vec::new();

        if spec.is_static() {
            self.restore_fixture(spec, parents, captured, &mut notes)
                .await;
        } else if let (Some(entity), Some(delete)) = (captured, spec.operation(OP_DELETE)) {
            if spec.entity_id(entity).is_some() {
                self.teardown_delete(spec, delete, parents, Some(entity), &mut notes)
                    .await;
            }
        }

        for parent in spec.setup_chain.iter().rev() {
            if parent.is_static() {
                continue;
            }
            let Some(id) = parents.get(&parent.name) else {
                continue;
            };
            let Some(delete) = parent.operation(OP_DELETE) else {
                continue;
            };
            let stand_in = serde_json::json!({ parent.id_field.clone(): id });
            self.teardown_delete(parent, delete, parents, Some(&stand_in), &mut notes)
                .await;
        }

        notes
    }

    async fn teardown_delete(
        &self,
        spec: &EntitySpec,
        delete: &Operation,
        parents: &ParentIds,
        entity: Option<&Value>,
        notes: &mut Vec<String>,
    ) {
        match self
            .run_operation(spec, OP_DELETE, delete, parents, entity)
            .await
        {
            Ok(outcome) if outcome.response.status == delete.expected_status => {
                notes.push(format!("deleted {}", spec.name));
            }
            Ok(outcome) => {
                tracing::warn!(
                    "cleanup delete of {} returned status {}",
                    spec.name,
                    outcome.response.status
                );
                notes.push(format!(
                    "delete of {} returned status {}",
                    spec.name, outcome.response.status
                ));
            }
            Err(e) => {
                tracing::warn!("cleanup delete of {} failed: {e}", spec.name);
                notes.push(format!("delete of {} failed: {e}", spec.name));
            }
        }
    }

    async fn restore_fixture(
        &self,
        spec: &EntitySpec,
        parents: &ParentIds,
        captured: Option<&Value>,
        notes: &mut Vec<String>,
    ) {
        let Some(fixture) = &spec.static_fixture else {
            return;
        };
        let Some(update) = spec.operation(OP_UPDATE) else {
            return;
        };
        let Some(payload) = &update.payload else {
            return;
        };

        // Restore only the keys the update touched, with the fixture's
        // original values; never post-update captured state.
        let original = payload.resolve(parents, captured);
        let (Some(touched), Some(fixture_obj)) = (original.as_object(), fixture.as_object())
        else {
            return;
        };
        let mut restore = serde_json::Map::new();
        for key in touched.keys() {
            if let Some(v) = fixture_obj.get(key) {
                restore.insert(key.clone(), v.clone());
            }
        }

        let restore_op = Operation {
            payload: Some(Resolver::Value(Value::Object(restore))),
            ..update.clone()
        };

        match self
            .run_operation(spec, "restore", &restore_op, parents, Some(fixture))
            .await
        {
            Ok(outcome) if outcome.response.status == restore_op.expected_status => {
                notes.push(format!("restored fixture {}", spec.name));
            }
            Ok(outcome) => {
                tracing::warn!(
                    "fixture restore of {} returned status {}",
                    spec.name,
                    outcome.response.status
                );
                notes.push(format!(
                    "restore of {} returned status {}",
                    spec.name, outcome.response.status
                ));
            }
            Err(e) => {
                tracing::warn!("fixture restore of {} failed: {e}", spec.name);
                notes.push(format!("restore of {} failed: {e}", spec.name));
            }
        }
    }
}

fn apply_capture(op: &Operation, outcome: &OperationOutcome, captured: &mut Option<Value>) {
    match &op.capture {
        Capture::None => {}
        Capture::Whole => {
            if let Some(body) = &outcome.body {
                *captured = Some(body.clone());
            }
        }
        Capture::Extract(extract) => {
            if let Some(body) = &outcome.body {
                *captured = Some(extract(body));
            }
        }
    }
    if op.release_entity {
        *captured = None;
    }
}

#[inline]
const fn is_no_content_status(status: u16) -> bool {
    matches!(status, 204 | 205 | 304)
}

fn status_mismatch(name: &str, op: &Operation, response: &ApiResponse) -> RunnerError {
    RunnerError::StatusMismatch {
        operation: name.to_string(),
        expected: op.expected_status,
        actual: response.status,
        body: excerpt(&response.body),
    }
}

fn excerpt(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() <= MAX {
        body.to_string()
    } else {
        let cut: String = body.chars().take(MAX).collect();
        format!("{cut}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_content_statuses() {
        assert!(is_no_content_status(204));
        assert!(is_no_content_status(304));
        assert!(!is_no_content_status(200));
    }

    #[test]
    fn excerpt_truncates_long_bodies() {
        let long = "x".repeat(500);
        let cut = excerpt(&long);
        assert!(cut.len() < 500);
        assert!(cut.ends_with("..."));
        assert_eq!(excerpt("short"), "short");
    }

    #[test]
    fn capture_whole_and_release() {
        let outcome = OperationOutcome {
            response: ApiResponse::new(200, "{}"),
            body: Some(serde_json::json!({"id": "e1"})),
        };

        let mut captured = None;
        let capture_op = Operation::new(apicycle_http::Method::Get, "/x", 200).capture();
        apply_capture(&capture_op, &outcome, &mut captured);
        assert_eq!(captured.as_ref().unwrap()["id"], "e1");

        let release_op =
            Operation::new(apicycle_http::Method::Delete, "/x", 204).releases_entity();
        apply_capture(&release_op, &outcome, &mut captured);
        assert!(captured.is_none());
    }

    #[test]
    fn capture_extract_pulls_sub_object() {
        let outcome = OperationOutcome {
            response: ApiResponse::new(207, "{}"),
            body: Some(serde_json::json!({"results": [{"id": "inner"}]})),
        };

        let mut captured = None;
        let op = Operation::new(apicycle_http::Method::Post, "/x", 207)
            .capture_with(|body| body["results"][0].clone());
        apply_capture(&op, &outcome, &mut captured);
        assert_eq!(captured.as_ref().unwrap()["id"], "inner");
    }
}
