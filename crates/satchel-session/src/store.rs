//! Namespaced view over a host session store.

use satchel_config::SessionConfig;
use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::backend::{Bucket, Buckets, SessionBackend};
use crate::error::Result;
use crate::page::PageId;
use crate::value::IntoValue;

/// Namespaced key/value store bound to one request.
///
/// Every operation comes in three scopes:
/// - the unscoped default namespace (`set`, `get`, ...)
/// - an explicit namespace (`set_in`, `get_in`, ...)
/// - the current page (`page_set`, `page_get`, ...), where an explicit
///   `page` argument is used verbatim as the namespace
///
/// A namespace is present in the backend if and only if it holds at least
/// one variable; reads never distinguish a drained namespace from one that
/// was never written.
pub struct NamespacedStore<B: SessionBackend> {
    backend: B,
    page: PageId,
    default_namespace: String,

    /// Scratch mapping used when the backend could not be started.
    detached: Option<Buckets>,
}

impl<B: SessionBackend> NamespacedStore<B> {
    /// Open a store with default settings, starting the backend if needed.
    pub fn open(backend: B, page: impl Into<PageId>) -> Result<Self> {
        Self::open_with_config(backend, page, &SessionConfig::default())
    }

    /// Open a store, starting the backend if it is not already active.
    ///
    /// If the backend fails to start and `config.strict_start` is off, the
    /// store runs detached: it behaves as an empty session and nothing it
    /// writes reaches the backend.
    pub fn open_with_config(
        mut backend: B,
        page: impl Into<PageId>,
        config: &SessionConfig,
    ) -> Result<Self> {
        let page = page.into();

        let detached = if backend.is_active() {
            None
        } else {
            match backend.start() {
                Ok(()) => {
                    debug!(page = %page, "Session backend started");
                    None
                }
                Err(e) if config.strict_start => return Err(e),
                Err(e) => {
                    warn!(
                        error = %e,
                        page = %page,
                        "Session backend unavailable, running detached"
                    );
                    Some(Buckets::new())
                }
            }
        };

        Ok(Self {
            backend,
            page,
            default_namespace: config.default_namespace.clone(),
            detached,
        })
    }

    /// Identity of the current page.
    pub fn page_id(&self) -> &PageId {
        &self.page
    }

    /// The unscoped namespace name.
    pub fn default_namespace(&self) -> &str {
        &self.default_namespace
    }

    /// Whether the store is running over an empty scratch mapping.
    pub fn is_detached(&self) -> bool {
        self.detached.is_some()
    }

    /// Get the underlying backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Hand the backend back to the host at the end of the request.
    pub fn into_backend(self) -> B {
        self.backend
    }

    /// Names of the namespaces currently present, sorted.
    pub fn namespaces(&self) -> Vec<String> {
        let mut names: Vec<String> = self.buckets().keys().cloned().collect();
        names.sort();
        names
    }

    // ─────────────────────────────────────────────────────────────────────
    // Explicit namespace
    // ─────────────────────────────────────────────────────────────────────

    /// Remove a whole namespace. No-op if it does not exist.
    pub fn clear_in(&mut self, namespace: &str) {
        if let Some(bucket) = self.buckets_mut().remove(namespace) {
            debug!(namespace = %namespace, removed = bucket.len(), "Namespace cleared");
        }
    }

    /// Insert or overwrite a variable, creating the namespace if needed.
    ///
    /// A NaN or infinite float has no JSON form and is stored as `null`.
    pub fn set_in(&mut self, namespace: &str, name: &str, value: impl IntoValue) {
        if let Some(float) = value.non_finite() {
            warn!(
                namespace = %namespace,
                name = %name,
                value = %float,
                "Non-finite float stored as null"
            );
        }
        let value = value.into_value();
        self.update_bucket(namespace, |bucket| {
            bucket.insert(name.to_string(), value);
        });
        trace!(namespace = %namespace, name = %name, "Variable set");
    }

    /// Borrow a variable, if present.
    pub fn get_in(&self, namespace: &str, name: &str) -> Option<&Value> {
        self.buckets().get(namespace).and_then(|b| b.get(name))
    }

    /// Get a variable, or `default` when it is absent.
    ///
    /// A stored `null` is present and is returned instead of `default`.
    pub fn get_or_in(&self, namespace: &str, name: &str, default: impl IntoValue) -> Value {
        match self.get_in(namespace, name) {
            Some(value) => value.clone(),
            None => default.into_value(),
        }
    }

    /// All variables of a namespace in insertion order; empty if absent.
    pub fn get_all_in(&self, namespace: &str) -> Bucket {
        self.buckets().get(namespace).cloned().unwrap_or_default()
    }

    /// Presence check; a stored `null` counts as present.
    pub fn has_in(&self, namespace: &str, name: &str) -> bool {
        self.buckets()
            .get(namespace)
            .is_some_and(|b| b.contains_key(name))
    }

    /// Remove a variable. Removing the last one removes the namespace.
    pub fn delete_in(&mut self, namespace: &str, name: &str) {
        let removed = self.update_bucket(namespace, |bucket| bucket.shift_remove(name).is_some());
        if removed {
            trace!(namespace = %namespace, name = %name, "Variable deleted");
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Default namespace
    // ─────────────────────────────────────────────────────────────────────

    pub fn clear(&mut self) {
        let namespace = self.default_namespace.clone();
        self.clear_in(&namespace);
    }

    pub fn set(&mut self, name: &str, value: impl IntoValue) {
        let namespace = self.default_namespace.clone();
        self.set_in(&namespace, name, value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.get_in(&self.default_namespace, name)
    }

    pub fn get_or(&self, name: &str, default: impl IntoValue) -> Value {
        self.get_or_in(&self.default_namespace, name, default)
    }

    pub fn get_all(&self) -> Bucket {
        self.get_all_in(&self.default_namespace)
    }

    pub fn has(&self, name: &str) -> bool {
        self.has_in(&self.default_namespace, name)
    }

    pub fn delete(&mut self, name: &str) {
        let namespace = self.default_namespace.clone();
        self.delete_in(&namespace, name);
    }

    // ─────────────────────────────────────────────────────────────────────
    // Page scope
    // ─────────────────────────────────────────────────────────────────────

    pub fn page_clear(&mut self, page: Option<&str>) {
        let namespace = self.page_namespace(page);
        self.clear_in(&namespace);
    }

    pub fn page_set(&mut self, name: &str, value: impl IntoValue, page: Option<&str>) {
        let namespace = self.page_namespace(page);
        self.set_in(&namespace, name, value);
    }

    pub fn page_get(&self, name: &str, page: Option<&str>) -> Option<&Value> {
        self.get_in(page.unwrap_or(self.page.as_str()), name)
    }

    pub fn page_get_or(&self, name: &str, default: impl IntoValue, page: Option<&str>) -> Value {
        self.get_or_in(page.unwrap_or(self.page.as_str()), name, default)
    }

    pub fn page_get_all(&self, page: Option<&str>) -> Bucket {
        self.get_all_in(page.unwrap_or(self.page.as_str()))
    }

    pub fn page_has(&self, name: &str, page: Option<&str>) -> bool {
        self.has_in(page.unwrap_or(self.page.as_str()), name)
    }

    pub fn page_delete(&mut self, name: &str, page: Option<&str>) {
        let namespace = self.page_namespace(page);
        self.delete_in(&namespace, name);
    }

    // ─────────────────────────────────────────────────────────────────────
    // Internals
    // ─────────────────────────────────────────────────────────────────────

    fn page_namespace(&self, page: Option<&str>) -> String {
        page.unwrap_or(self.page.as_str()).to_string()
    }

    fn buckets(&self) -> &Buckets {
        match &self.detached {
            Some(buckets) => buckets,
            None => self.backend.buckets(),
        }
    }

    fn buckets_mut(&mut self) -> &mut Buckets {
        match &mut self.detached {
            Some(buckets) => buckets,
            None => self.backend.buckets_mut(),
        }
    }

    /// Run `f` on the namespace's bucket, then drop the bucket if it is empty.
    ///
    /// All variable-level mutation goes through here so the
    /// present-iff-non-empty invariant holds in one place.
    fn update_bucket<R>(&mut self, namespace: &str, f: impl FnOnce(&mut Bucket) -> R) -> R {
        let buckets = self.buckets_mut();
        let existed = buckets.contains_key(namespace);
        let bucket = buckets.entry(namespace.to_string()).or_default();

        let out = f(bucket);

        let empty = bucket.is_empty();
        if empty {
            buckets.remove(namespace);
            if existed {
                debug!(namespace = %namespace, "Namespace pruned");
            }
        } else if !existed {
            debug!(namespace = %namespace, "Namespace created");
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::error::Error;
    use serde_json::json;

    const NAMESPACE_1: &str = "Namespace 1";
    const NAMESPACE_2: &str = "Namespace 2";
    const PAGE: &str = "/account/settings.php";

    fn open() -> NamespacedStore<MemoryBackend> {
        NamespacedStore::open(MemoryBackend::new(), PAGE).unwrap()
    }

    /// Backend whose session cannot be started (e.g. no request context).
    #[derive(Default)]
    struct UnavailableBackend {
        buckets: Buckets,
    }

    impl SessionBackend for UnavailableBackend {
        fn is_active(&self) -> bool {
            false
        }

        fn start(&mut self) -> Result<()> {
            Err(Error::Start("headers already sent".to_string()))
        }

        fn buckets(&self) -> &Buckets {
            &self.buckets
        }

        fn buckets_mut(&mut self) -> &mut Buckets {
            &mut self.buckets
        }
    }

    #[test]
    fn test_open_starts_backend() {
        let store = open();
        assert!(store.backend().is_active());
        assert!(!store.is_detached());
        assert_eq!(store.page_id().as_str(), PAGE);
        assert_eq!(store.default_namespace(), "*");
    }

    #[test]
    fn test_open_keeps_existing_data() {
        let mut backend = MemoryBackend::new();
        {
            let mut store = NamespacedStore::open(&mut backend, PAGE).unwrap();
            store.set("visits", 3);
        }
        let store = NamespacedStore::open(&mut backend, "/other").unwrap();
        assert_eq!(store.get("visits"), Some(&json!(3)));
    }

    #[test]
    fn test_clear() {
        let mut store = open();
        store.set("test name 1", "test value 1");
        store.set_in(NAMESPACE_2, "test name 2", "test value 2");

        assert_eq!(store.get("test name 1"), Some(&json!("test value 1")));
        assert_eq!(
            store.get_in(NAMESPACE_2, "test name 2"),
            Some(&json!("test value 2"))
        );

        store.clear();
        assert_eq!(store.get("test name 1"), None);
        assert_eq!(
            store.get_in(NAMESPACE_2, "test name 2"),
            Some(&json!("test value 2"))
        );

        store.clear_in(NAMESPACE_2);
        assert_eq!(store.get_in(NAMESPACE_2, "test name 2"), None);
        assert!(store.namespaces().is_empty());

        // Clearing something that does not exist is fine
        store.clear_in("never written");
    }

    #[test]
    fn test_set_get_keeps_value_types() {
        let mut store = open();

        store.set("int", 4);
        assert!(store.get("int").unwrap().is_i64());

        store.set("float", 10.4);
        assert!(store.get("float").unwrap().is_f64());

        store.set("string", "test");
        assert!(store.get("string").unwrap().is_string());

        store.set("bool", false);
        assert_eq!(store.get("bool"), Some(&json!(false)));

        store.set("array", json!(["test"]));
        assert!(store.get("array").unwrap().is_array());

        store.set("object", json!({"nested": {"depth": 2}}));
        assert_eq!(store.get("object").unwrap()["nested"]["depth"], json!(2));
    }

    #[test]
    fn test_non_finite_float_is_stored_as_null() {
        let mut store = open();
        store.set("inf", f64::INFINITY);
        store.set("nan", f64::NAN);
        store.set("finite", 10.4);

        assert!(store.has("inf"));
        assert_eq!(store.get("inf"), Some(&Value::Null));
        assert_eq!(store.get("nan"), Some(&Value::Null));
        assert_eq!(store.get("finite"), Some(&json!(10.4)));
    }

    #[test]
    fn test_null_is_present() {
        let mut store = open();
        store.set("test", Value::Null);

        assert!(store.has("test"));
        assert_eq!(store.get_or("test", "fallback"), Value::Null);
    }

    #[test]
    fn test_get_or_returns_default_when_absent() {
        let store = open();
        assert_eq!(store.get_or("missing", "fallback"), json!("fallback"));
        assert_eq!(store.get_or("missing", Value::Null), Value::Null);
        assert_eq!(store.get_or_in("nope", "missing", 7), json!(7));
    }

    #[test]
    fn test_set_overwrites() {
        let mut store = open();
        store.set("k", 1);
        store.set("k", "two");
        assert_eq!(store.get("k"), Some(&json!("two")));
        assert_eq!(store.get_all().len(), 1);
    }

    #[test]
    fn test_get_all_preserves_insertion_order() {
        let mut store = open();
        store.set("test name 2", "test value 2");
        store.set("test name 1", "test value 1");
        store.set("a", "last");

        let all = store.get_all();
        let keys: Vec<&str> = all.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["test name 2", "test name 1", "a"]);

        assert!(store.get_all_in("unknown").is_empty());
    }

    #[test]
    fn test_delete_keeps_order_of_remaining() {
        let mut store = open();
        store.set("a", 1);
        store.set("b", 2);
        store.set("c", 3);
        store.delete("a");

        let keys: Vec<String> = store.get_all().keys().cloned().collect();
        assert_eq!(keys, vec!["b", "c"]);
    }

    #[test]
    fn test_has() {
        let mut store = open();
        assert!(!store.has("test"));
        store.set("test", "test");
        assert!(store.has("test"));
        assert!(!store.has_in(NAMESPACE_1, "test"));
    }

    #[test]
    fn test_delete_last_variable_prunes_namespace() {
        let mut store = open();
        store.set_in(NAMESPACE_1, "test", "test");
        assert_eq!(store.namespaces(), vec![NAMESPACE_1.to_string()]);

        store.delete_in(NAMESPACE_1, "test");
        assert!(!store.has_in(NAMESPACE_1, "test"));
        assert!(store.get_all_in(NAMESPACE_1).is_empty());
        assert!(!store.backend().buckets().contains_key(NAMESPACE_1));
    }

    #[test]
    fn test_delete_null_value_prunes_namespace() {
        let mut store = open();
        store.set("n", Value::Null);
        store.delete("n");
        assert!(!store.has("n"));
        assert!(store.namespaces().is_empty());
    }

    #[test]
    fn test_delete_missing_is_noop() {
        let mut store = open();
        store.delete("nothing");
        store.delete_in(NAMESPACE_2, "nothing");
        assert!(store.namespaces().is_empty());

        store.set("kept", 1);
        store.delete("nothing");
        assert!(store.has("kept"));
    }

    #[test]
    fn test_page_scope_defaults_to_current_page() {
        let mut store = open();
        store.page_set("test", "test", None);

        assert_eq!(store.page_get("test", None), Some(&json!("test")));
        assert_eq!(store.get_in(PAGE, "test"), Some(&json!("test")));
        assert_eq!(store.page_get_all(None), store.get_all_in(PAGE));
        assert!(store.page_has("test", None));
        assert!(!store.page_has("unknown", None));
    }

    #[test]
    fn test_page_scope_explicit_page_is_verbatim() {
        let mut store = open();
        store.page_set("test name 1", "test value 1", Some(NAMESPACE_1));
        store.page_set("test name 2", "test value 2", Some(NAMESPACE_2));

        assert_eq!(
            store.get_in(NAMESPACE_1, "test name 1"),
            Some(&json!("test value 1"))
        );
        assert!(!store.page_has("test name 1", None));

        store.page_clear(Some(NAMESPACE_1));
        assert_eq!(store.page_get("test name 1", Some(NAMESPACE_1)), None);
        assert_eq!(
            store.page_get("test name 2", Some(NAMESPACE_2)),
            Some(&json!("test value 2"))
        );

        store.page_clear(Some(NAMESPACE_2));
        assert!(store.namespaces().is_empty());
    }

    #[test]
    fn test_page_get_or_and_null() {
        let mut store = open();
        store.page_set("test", Value::Null, Some(NAMESPACE_1));
        assert_eq!(
            store.page_get_or("test", "test", Some(NAMESPACE_1)),
            Value::Null
        );
        assert_eq!(store.page_get_or("missing", "fallback", None), json!("fallback"));
    }

    #[test]
    fn test_page_delete_and_clear() {
        let mut store = open();

        store.page_set("test", "test", Some(NAMESPACE_1));
        assert!(store.page_has("test", Some(NAMESPACE_1)));
        store.page_delete("test", Some(NAMESPACE_1));
        assert!(!store.page_has("test", Some(NAMESPACE_1)));

        store.page_set("test", "test", None);
        assert!(store.page_has("test", None));
        store.page_delete("test", None);
        assert!(!store.page_has("test", None));

        store.page_set("a", 1, None);
        store.page_set("b", 2, None);
        store.page_clear(None);
        assert!(store.page_get_all(None).is_empty());
    }

    #[test]
    fn test_custom_default_namespace() {
        let config = SessionConfig::default().with_default_namespace("global");
        let mut store =
            NamespacedStore::open_with_config(MemoryBackend::new(), PAGE, &config).unwrap();
        store.set("k", "v");

        assert_eq!(store.get_in("global", "k"), Some(&json!("v")));
        assert!(!store.has_in("*", "k"));
    }

    #[test]
    fn test_unavailable_backend_runs_detached() {
        let mut store = NamespacedStore::open(UnavailableBackend::default(), PAGE).unwrap();
        assert!(store.is_detached());

        store.set("k", "v");
        assert_eq!(store.get("k"), Some(&json!("v")));

        let backend = store.into_backend();
        assert!(backend.buckets.is_empty());
    }

    #[test]
    fn test_unavailable_backend_strict_fails() {
        let config = SessionConfig::default().with_strict_start(true);
        let result =
            NamespacedStore::open_with_config(UnavailableBackend::default(), PAGE, &config);
        assert!(matches!(result, Err(Error::Start(_))));
    }
}
