//! Tracing, logging, and request-scoped context (shared setup).

/// Initialize process-wide observability (tracing/logging).
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init();
}

/// Run a future with fresh request-scoped context: an unbound correlation
/// id and an empty diagnostic map. Both vanish when the future completes,
/// whatever the exit path.
pub async fn scoped<F>(fut: F) -> F::Output
where
    F: std::future::Future,
{
    request::scope(diag::scope(fut)).await
}

/// Tracing configuration (filters, layers).
pub mod tracing;

/// Request-scoped correlation identifier.
pub mod request;

/// Request-scoped diagnostic fields for logging.
pub mod diag;
