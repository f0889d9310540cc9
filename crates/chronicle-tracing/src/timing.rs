//! Span timing shared by the decorators.

use std::future::Future;
use std::time::Instant;

use chronicle_core::error::DomainError;
use tracing::{Instrument, Span};

/// Runs `fut` inside `span` and records its latency and outcome there.
pub(crate) async fn traced<T, F>(span: Span, fut: F) -> Result<T, DomainError>
where
    F: Future<Output = Result<T, DomainError>>,
{
    let started = Instant::now();
    let result = fut.instrument(span.clone()).await;
    let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    span.in_scope(|| match &result {
        Ok(_) => tracing::debug!(elapsed_ms, status = "ok", "completed"),
        Err(error) => tracing::warn!(elapsed_ms, status = "error", %error, "failed"),
    });
    result
}
