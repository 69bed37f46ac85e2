//! Diagnostic context: request-scoped key/value annotations for logging.
//!
//! The HTTP middleware populates the map with transport metadata (method,
//! path, caller address, correlation id); services may add domain pairs.
//! The map is task-local and scoped to one request, so fields cannot leak
//! into another request handled by a reused worker; `clear` exists for
//! callers that want to drop fields early.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::future::Future;

use serde_json::Value as JsonValue;

tokio::task_local! {
    static DIAG: RefCell<BTreeMap<String, JsonValue>>;
}

/// Run `fut` with an empty diagnostic context.
pub async fn scope<F>(fut: F) -> F::Output
where
    F: Future,
{
    DIAG.scope(RefCell::new(BTreeMap::new()), fut).await
}

/// Set one field. No-op outside a scope.
pub fn set(key: impl Into<String>, value: impl Into<JsonValue>) {
    let key = key.into();
    let value = value.into();
    let _ = DIAG.try_with(|map| {
        map.borrow_mut().insert(key, value);
    });
}

/// Set several fields at once.
pub fn extend(fields: impl IntoIterator<Item = (String, JsonValue)>) {
    let _ = DIAG.try_with(|map| {
        map.borrow_mut().extend(fields);
    });
}

/// A copy of the current fields; empty outside a scope.
pub fn snapshot() -> BTreeMap<String, JsonValue> {
    DIAG.try_with(|map| map.borrow().clone()).unwrap_or_default()
}

/// Remove all fields from the current scope.
pub fn clear() {
    let _ = DIAG.try_with(|map| map.borrow_mut().clear());
}
