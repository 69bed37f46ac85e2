//! Request-scoped correlation identifier.
//!
//! Exactly one identifier is active per in-flight request. The binding
//! lives in a tokio task-local entered once per request by the HTTP
//! middleware, so concurrently processed requests can never observe or
//! overwrite each other's id, and the binding vanishes with the request
//! future on every exit path.

use std::cell::RefCell;
use std::future::Future;

use uuid::Uuid;

tokio::task_local! {
    static REQUEST_ID: RefCell<Option<String>>;
}

/// Generate a fresh correlation id: a random 128-bit value rendered
/// without separators.
pub fn generate() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Run `fut` with an empty correlation binding. The HTTP middleware wraps
/// each request in one scope; tests use it directly.
pub async fn scope<F>(fut: F) -> F::Output
where
    F: Future,
{
    REQUEST_ID.scope(RefCell::new(None), fut).await
}

/// The active correlation id, generating and binding a new one if none is
/// set. Never fails: outside any scope a fresh id is returned (and not
/// retained, since there is no request to retain it for).
pub fn get_or_create() -> String {
    REQUEST_ID
        .try_with(|cell| {
            let mut current = cell.borrow_mut();
            match current.as_ref() {
                Some(id) => id.clone(),
                None => {
                    let id = generate();
                    *current = Some(id.clone());
                    id
                }
            }
        })
        .unwrap_or_else(|_| generate())
}

/// Bind an externally supplied identifier (e.g. from an upstream caller),
/// overriding any previously generated value. No-op outside a scope.
pub fn set(id: impl Into<String>) {
    let id = id.into();
    let _ = REQUEST_ID.try_with(|cell| *cell.borrow_mut() = Some(id));
}

/// The active correlation id, if one is bound.
pub fn current() -> Option<String> {
    REQUEST_ID.try_with(|cell| cell.borrow().clone()).ok().flatten()
}

/// Remove the binding for the current scope.
pub fn clear() {
    let _ = REQUEST_ID.try_with(|cell| *cell.borrow_mut() = None);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn get_or_create_is_lazy_and_stable_within_a_scope() {
        scope(async {
            assert!(current().is_none());

            let first = get_or_create();
            assert_eq!(first.len(), 32);
            assert!(first.chars().all(|c| c.is_ascii_hexdigit()));

            // Subsequent reads within the same scope return the same id.
            assert_eq!(get_or_create(), first);
            assert_eq!(current(), Some(first));
        })
        .await;
    }

    #[tokio::test]
    async fn set_overrides_a_generated_id() {
        scope(async {
            let _ = get_or_create();
            set("upstream-id-123");
            assert_eq!(get_or_create(), "upstream-id-123");
        })
        .await;
    }

    #[tokio::test]
    async fn clear_removes_the_binding() {
        scope(async {
            set("abc");
            clear();
            assert!(current().is_none());
        })
        .await;
    }

    #[tokio::test]
    async fn works_outside_a_scope_without_retaining() {
        let a = get_or_create();
        let b = get_or_create();
        assert_ne!(a, b);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_scopes_are_isolated() {
        let mut handles = Vec::new();
        for i in 0..16 {
            handles.push(tokio::spawn(scope(async move {
                let id = format!("request-{i}");
                set(id.clone());
                // Yield so tasks interleave on the worker threads.
                for _ in 0..10 {
                    tokio::task::yield_now().await;
                    assert_eq!(current(), Some(id.clone()));
                }
                get_or_create()
            })));
        }

        let mut seen = std::collections::HashSet::new();
        for handle in handles {
            let id = handle.await.unwrap();
            assert!(seen.insert(id), "correlation id leaked between tasks");
        }
    }
}
