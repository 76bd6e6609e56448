//! Value-or-function resolution
//!
//! Paths, payloads, and expected-field sets may each be a constant or a
//! function of the parent ids and the captured entity. One tagged union and
//! one `resolve` call cover every property; nothing is special-cased.

use indexmap::IndexMap;
use serde_json::Value;
use std::sync::Arc;

/// Resolver callback signature
pub type ResolveFn<T> = Arc<dyn Fn(&ParentIds, Option<&Value>) -> T + Send + Sync>;

/// A constant, or a function of `(parent ids, captured entity)`
pub enum Resolver<T> {
    /// Fixed value
    Value(T),
    /// Computed at execution time
    Fn(ResolveFn<T>),
}

impl<T: Clone> Resolver<T> {
    /// Wrap a closure
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&ParentIds, Option<&Value>) -> T + Send + Sync + 'static,
    {
        Self::Fn(Arc::new(f))
    }

    /// Produce the concrete value for this execution
    #[must_use]
    pub fn resolve(&self, parents: &ParentIds, captured: Option<&Value>) -> T {
        match self {
            Self::Value(v) => v.clone(),
            Self::Fn(f) => f(parents, captured),
        }
    }
}

impl<T: Clone> Clone for Resolver<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Value(v) => Self::Value(v.clone()),
            Self::Fn(f) => Self::Fn(Arc::clone(f)),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Resolver<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Self::Fn(_) => f.write_str("Fn(..)"),
        }
    }
}

impl<T> From<T> for Resolver<T> {
    fn from(v: T) -> Self {
        Self::Value(v)
    }
}

impl From<&str> for Resolver<String> {
    fn from(v: &str) -> Self {
        Self::Value(v.to_string())
    }
}

/// Parent entity name → resolved identifier, in setup order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParentIds(IndexMap<String, String>);

impl ParentIds {
    /// Empty map
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a resolved parent id
    pub fn insert(&mut self, name: impl Into<String>, id: impl Into<String>) {
        self.0.insert(name.into(), id.into());
    }

    /// Id of a parent, if resolved
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Parent names in resolution order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Number of resolved parents
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when no parent has been resolved
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn constant_resolves_to_itself() {
        let r: Resolver<String> = "/sites".into();
        assert_eq!(r.resolve(&ParentIds::new(), None), "/sites");
    }

    #[test]
    fn function_sees_parents_and_captured() {
        let r = Resolver::from_fn(|parents: &ParentIds, captured: Option<&Value>| {
            format!(
                "/orgs/{}/sites/{}",
                parents.get("Organization").unwrap_or("?"),
                captured.and_then(|c| c["id"].as_str()).unwrap_or("?")
            )
        });

        let mut parents = ParentIds::new();
        parents.insert("Organization", "org-1");
        let captured = json!({"id": "site-9"});

        assert_eq!(
            r.resolve(&parents, Some(&captured)),
            "/orgs/org-1/sites/site-9"
        );
    }

    #[test]
    fn resolver_clone_shares_the_closure() {
        let r = Resolver::from_fn(|_: &ParentIds, _: Option<&Value>| 42usize);
        let r2 = r.clone();
        assert_eq!(r2.resolve(&ParentIds::new(), None), 42);
    }

    #[test]
    fn parent_ids_preserve_insertion_order() {
        let mut parents = ParentIds::new();
        parents.insert("Organization", "o1");
        parents.insert("Site", "s1");
        parents.insert("Audit", "a1");

        let names: Vec<&str> = parents.names().collect();
        assert_eq!(names, vec!["Organization", "Site", "Audit"]);
        assert_eq!(parents.get("Site"), Some("s1"));
        assert_eq!(parents.len(), 3);
    }
}
