//! Cached per-schema validators over a dereferenced contract
//!
//! Each named schema is compiled by wrapping the full contract document with
//! a root `$ref` into `components/schemas/<name>`, so intra-document `$ref`s
//! resolve without a separate dereferencing pass. Compiled validators live in
//! a name-keyed cache guarded by a `parking_lot::RwLock`.

use crate::error::ContractError;
use jsonschema::{Draft, JSONSchema};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// One field-level validation failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolation {
    /// JSON pointer into the validated instance (empty string = root)
    pub instance_path: String,
    /// Human-readable diagnostic
    pub message: String,
}

/// Result of validating one instance against one named schema
#[derive(Debug, Clone)]
pub struct SchemaOutcome {
    /// Whether the instance satisfied the schema
    pub valid: bool,
    /// Every violation found (`allErrors`-style); empty iff valid
    pub violations: Vec<SchemaViolation>,
}

/// Cache performance counters
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheStats {
    /// Validators compiled so far
    pub compiled: u64,
    /// Lookups served from the cache
    pub hits: u64,
}

/// Owns the contract document and the compiled-validator cache
pub struct ValidatorCache {
    contract: Value,
    compiled: RwLock<HashMap<String, Arc<JSONSchema>>>,
    compile_count: AtomicU64,
    hit_count: AtomicU64,
}

impl std::fmt::Debug for ValidatorCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidatorCache")
            .field("schemas", &self.schema_names().len())
            .field("stats", &self.stats())
            .finish()
    }
}

impl ValidatorCache {
    /// Build a cache from an already-parsed contract document
    #[must_use]
    pub fn from_value(contract: Value) -> Self {
        Self {
            contract,
            compiled: RwLock::new(HashMap::new()),
            compile_count: AtomicU64::new(0),
            hit_count: AtomicU64::new(0),
        }
    }

    /// Load and parse the contract once from a JSON or YAML file
    ///
    /// Construction is the idempotence point: callers hold one cache per
    /// contract and reuse it across every assertion.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ContractError> {
        let path = path.as_ref();
        let display_path = path.display().to_string();

        let text = std::fs::read_to_string(path).map_err(|source| ContractError::Io {
            path: display_path.clone(),
            source,
        })?;

        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml" | "yml")
        );
        let contract: Value = if is_yaml {
            serde_yaml::from_str(&text).map_err(|e| ContractError::Parse {
                path: display_path.clone(),
                message: e.to_string(),
            })?
        } else {
            serde_json::from_str(&text).map_err(|e| ContractError::Parse {
                path: display_path.clone(),
                message: e.to_string(),
            })?
        };

        tracing::debug!("loaded API contract from {}", display_path);
        Ok(Self::from_value(contract))
    }

    /// Names declared under `components/schemas`
    #[must_use]
    pub fn schema_names(&self) -> Vec<String> {
        self.contract
            .pointer("/components/schemas")
            .and_then(Value::as_object)
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Validate `data` against the named schema
    ///
    /// Unknown schema names fail with [`ContractError::UnknownSchema`]; a
    /// shape mismatch is not an error here, it is reported through the
    /// returned [`SchemaOutcome`].
    pub fn validate(&self, data: &Value, schema_name: &str) -> Result<SchemaOutcome, ContractError> {
        let validator = self.validator_for(schema_name)?;

        let violations: Vec<SchemaViolation> = match validator.validate(data) {
            Ok(()) => Vec::new(),
            Err(errors) => errors
                .map(|e| SchemaViolation {
                    instance_path: e.instance_path.to_string(),
                    message: e.to_string(),
                })
                .collect(),
        };

        Ok(SchemaOutcome {
            valid: violations.is_empty(),
            violations,
        })
    }

    /// Current cache counters
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            compiled: self.compile_count.load(Ordering::Relaxed),
            hits: self.hit_count.load(Ordering::Relaxed),
        }
    }

    fn validator_for(&self, schema_name: &str) -> Result<Arc<JSONSchema>, ContractError> {
        if let Some(v) = self.compiled.read().get(schema_name) {
            self.hit_count.fetch_add(1, Ordering::Relaxed);
            return Ok(Arc::clone(v));
        }

        let schemas = self
            .contract
            .pointer("/components/schemas")
            .and_then(Value::as_object)
            .ok_or(ContractError::NoSchemas)?;
        if !schemas.contains_key(schema_name) {
            return Err(ContractError::UnknownSchema(schema_name.to_string()));
        }

        // Root $ref into the contract keeps nested $refs resolvable.
        let mut wrapped = self.contract.clone();
        if let Some(obj) = wrapped.as_object_mut() {
            obj.insert(
                "$ref".to_string(),
                Value::String(format!("#/components/schemas/{schema_name}")),
            );
        }

        let compiled = JSONSchema::options()
            .with_draft(Draft::Draft7)
            .compile(&wrapped)
            .map_err(|e| ContractError::Compile {
                name: schema_name.to_string(),
                message: e.to_string(),
            })?;

        self.compile_count.fetch_add(1, Ordering::Relaxed);
        tracing::debug!("compiled validator for schema '{schema_name}'");

        let arc = Arc::new(compiled);
        self.compiled
            .write()
            .entry(schema_name.to_string())
            .or_insert_with(|| Arc::clone(&arc));
        Ok(arc)
    }
}

/// Render violations as one newline-joined human-readable block
#[must_use]
pub fn format_violations(violations: &[SchemaViolation]) -> String {
    violations
        .iter()
        .map(|v| {
            if v.instance_path.is_empty() {
                v.message.clone()
            } else {
                format!("{}: {}", v.instance_path, v.message)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::io::Write;

    fn sample_contract() -> Value {
        json!({
            "openapi": "3.0.3",
            "info": {"title": "sample", "version": "1.0.0"},
            "paths": {},
            "components": {
                "schemas": {
                    "Site": {
                        "type": "object",
                        "required": ["id", "baseURL"],
                        "properties": {
                            "id": {"type": "string"},
                            "baseURL": {"type": "string"},
                            "organization": {"$ref": "#/components/schemas/Organization"}
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
    }

    #[test]
    fn valid_instance_passes() {
        let cache = ValidatorCache::from_value(sample_contract());
        let outcome = cache
            .validate(&json!({"id": "s1", "baseURL": "https://x.test"}), "Site")
            .unwrap();
        assert!(outcome.valid);
        assert!(outcome.violations.is_empty());
    }

    #[test]
    fn missing_required_field_is_reported() {
        let cache = ValidatorCache::from_value(sample_contract());
        let outcome = cache.validate(&json!({"id": "s1"}), "Site").unwrap();
        assert!(!outcome.valid);
        assert!(outcome.violations.iter().any(|v| v.message.contains("baseURL")));
    }

    #[test]
    fn nested_ref_dereferences() {
        let cache = ValidatorCache::from_value(sample_contract());
        let outcome = cache
            .validate(
                &json!({
                    "id": "s1",
                    "baseURL": "https://x.test",
                    "organization": {"name": "no id here"}
                }),
                "Site",
            )
            .unwrap();
        assert!(!outcome.valid);
        assert!(outcome
            .violations
            .iter()
            .any(|v| v.instance_path.contains("/organization")));
    }

    #[test]
    fn unknown_schema_is_an_error() {
        let cache = ValidatorCache::from_value(sample_contract());
        let err = cache.validate(&json!({}), "Nope").unwrap_err();
        assert!(matches!(err, ContractError::UnknownSchema(name) if name == "Nope"));
    }

    #[test]
    fn second_validation_hits_the_cache() {
        let cache = ValidatorCache::from_value(sample_contract());
        let data = json!({"id": "o1"});

        cache.validate(&data, "Organization").unwrap();
        let after_first = cache.stats();
        assert_eq!(after_first.compiled, 1);
        assert_eq!(after_first.hits, 0);

        cache.validate(&data, "Organization").unwrap();
        let after_second = cache.stats();
        assert_eq!(after_second.compiled, 1);
        assert_eq!(after_second.hits, 1);
    }

    #[test]
    fn distinct_schemas_compile_separately() {
        let cache = ValidatorCache::from_value(sample_contract());
        cache.validate(&json!({"id": "o1"}), "Organization").unwrap();
        cache
            .validate(&json!({"id": "s1", "baseURL": "u"}), "Site")
            .unwrap();
        assert_eq!(cache.stats().compiled, 2);
    }

    #[test]
    fn loads_contract_from_json_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, "{}", sample_contract()).unwrap();

        let cache = ValidatorCache::from_file(file.path()).unwrap();
        let mut names = cache.schema_names();
        names.sort();
        assert_eq!(names, vec!["Organization", "Site"]);
    }

    #[test]
    fn loads_contract_from_yaml_file() {
        let yaml = "\
openapi: 3.0.3
info:
  title: sample
  version: 1.0.0
paths: {}
components:
  schemas:
    Thing:
      type: object
      required: [id]
      properties:
        id:
          type: string
";
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        write!(file, "{yaml}").unwrap();

        let cache = ValidatorCache::from_file(file.path()).unwrap();
        assert_eq!(cache.schema_names(), vec!["Thing"]);
        assert!(cache.validate(&json!({"id": "t1"}), "Thing").unwrap().valid);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = ValidatorCache::from_file("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ContractError::Io { .. }));
    }

    #[test]
    fn violations_format_as_lines() {
        let violations = vec![
            SchemaViolation {
                instance_path: "/a".to_string(),
                message: "bad a".to_string(),
            },
            SchemaViolation {
                instance_path: String::new(),
                message: "bad root".to_string(),
            },
        ];
        assert_eq!(format_violations(&violations), "/a: bad a\nbad root");
    }
}
