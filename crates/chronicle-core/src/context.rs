//! Request-scoped context.
//!
//! A [`Context`] is an immutable value bag passed alongside every call. It
//! carries the namespace that partitions storage, an optional
//! min-version requirement for read-after-write queries, an optional
//! deadline and cancellation signal, and arbitrary JSON values that
//! cross-cutting layers attach. Every `with_*` method returns a new
//! context; the original is never mutated.
//!
//! [`ContextCodec`] turns the ambient parts of a context into a JSON map
//! and back, so they survive a process boundary.

use std::collections::BTreeMap;
use std::fmt;
use std::future::{Future, poll_fn};
use std::pin::Pin;
use std::sync::Arc;
use std::task::Poll;
use std::time::Duration;

use serde_json::{Map, Value};
use tokio::sync::watch;
use tokio::time::Instant;

use crate::error::DomainError;

/// Namespace used when none is set on the context.
pub const DEFAULT_NAMESPACE: &str = "default";

/// Marshaled key of the namespace.
pub const NAMESPACE_KEY: &str = "namespace";

/// Marshaled key of the min-version requirement.
pub const MIN_VERSION_KEY: &str = "min_version";

/// Immutable request-scoped context.
#[derive(Debug, Clone)]
pub struct Context {
    namespace: Arc<str>,
    min_version: Option<i64>,
    deadline: Option<Instant>,
    cancel: Vec<watch::Receiver<bool>>,
    values: BTreeMap<String, Value>,
}

impl Default for Context {
    fn default() -> Self {
        Self::background()
    }
}

impl Context {
    /// An empty context: default namespace, no deadline, never cancelled.
    #[must_use]
    pub fn background() -> Self {
        Self {
            namespace: Arc::from(DEFAULT_NAMESPACE),
            min_version: None,
            deadline: None,
            cancel: Vec::new(),
            values: BTreeMap::new(),
        }
    }

    /// Returns a copy scoped to `namespace`.
    #[must_use]
    pub fn with_namespace(&self, namespace: &str) -> Self {
        let mut ctx = self.clone();
        ctx.namespace = Arc::from(namespace);
        ctx
    }

    /// Returns a copy that requires read models to have reached `version`.
    #[must_use]
    pub fn with_min_version(&self, version: i64) -> Self {
        let mut ctx = self.clone();
        ctx.min_version = Some(version);
        ctx
    }

    /// Returns a copy with the min-version requirement removed.
    #[must_use]
    pub fn without_min_version(&self) -> Self {
        let mut ctx = self.clone();
        ctx.min_version = None;
        ctx
    }

    /// Returns a copy whose deadline is `deadline`, or the existing
    /// deadline if that one is earlier.
    #[must_use]
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let mut ctx = self.clone();
        ctx.deadline = Some(match self.deadline {
            Some(existing) if existing < deadline => existing,
            _ => deadline,
        });
        ctx
    }

    /// Returns a copy that expires `timeout` from now.
    #[must_use]
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Returns a cancellable copy and the handle that cancels it.
    ///
    /// The copy is also cancelled by any handle of its ancestors.
    #[must_use]
    pub fn with_cancel(&self) -> (Self, CancelHandle) {
        let (tx, rx) = watch::channel(false);
        let mut ctx = self.clone();
        ctx.cancel.push(rx);
        (ctx, CancelHandle { sender: tx })
    }

    /// Returns a copy carrying `value` under `key`.
    #[must_use]
    pub fn with_value(&self, key: &str, value: Value) -> Self {
        let mut ctx = self.clone();
        ctx.values.insert(key.to_owned(), value);
        ctx
    }

    /// Returns a copy that keeps every value but drops the deadline and
    /// cancellation signal, for work that outlives the request.
    #[must_use]
    pub fn detached(&self) -> Self {
        let mut ctx = self.clone();
        ctx.deadline = None;
        ctx.cancel.clear();
        ctx
    }

    /// The namespace, [`DEFAULT_NAMESPACE`] unless set.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The min-version requirement, if any.
    #[must_use]
    pub fn min_version(&self) -> Option<i64> {
        self.min_version
    }

    /// The deadline, if any.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// A value attached with [`Context::with_value`].
    #[must_use]
    pub fn value(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Returns `true` once the cancel handle has fired.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.iter().any(|rx| *rx.borrow())
    }

    /// Reports whether the context is still live.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Cancelled` after cancellation, or
    /// `DomainError::Timeout` once the deadline has passed.
    pub fn check(&self) -> Result<(), DomainError> {
        if self.is_cancelled() {
            return Err(DomainError::Cancelled);
        }
        if self.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            return Err(DomainError::Timeout("context deadline elapsed".into()));
        }
        Ok(())
    }

    /// Resolves when the context is cancelled or its deadline passes.
    /// Never resolves for a background context.
    pub async fn done(&self) {
        let mut signals: Vec<Pin<Box<dyn Future<Output = ()> + Send>>> = self
            .cancel
            .iter()
            .cloned()
            .map(|mut rx| {
                Box::pin(async move {
                    let fired = rx.wait_for(|cancelled| *cancelled).await.is_ok();
                    if !fired {
                        // Handle dropped without cancelling.
                        std::future::pending::<()>().await;
                    }
                }) as Pin<Box<dyn Future<Output = ()> + Send>>
            })
            .collect();
        if let Some(deadline) = self.deadline {
            signals.push(Box::pin(tokio::time::sleep_until(deadline)));
        }
        if signals.is_empty() {
            std::future::pending::<()>().await;
        }
        poll_fn(|cx| {
            for signal in &mut signals {
                if signal.as_mut().poll(cx).is_ready() {
                    return Poll::Ready(());
                }
            }
            Poll::Pending
        })
        .await;
    }
}

/// Cancels the context it was created with, and every copy of it.
#[derive(Debug)]
pub struct CancelHandle {
    sender: watch::Sender<bool>,
}

impl CancelHandle {
    /// Signals cancellation.
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }
}

/// Writes ambient values of a context into a marshaled map.
pub type ContextMarshaler = Arc<dyn Fn(&Context, &mut Map<String, Value>) + Send + Sync>;

/// Restores ambient values from a marshaled map onto a context.
pub type ContextUnmarshaler = Arc<dyn Fn(Context, &Map<String, Value>) -> Context + Send + Sync>;

/// Registry of marshal/unmarshal pairs for crossing process boundaries.
///
/// The default codec handles the namespace and the min-version
/// requirement. Cross-cutting layers register their own pairs at startup.
#[derive(Clone)]
pub struct ContextCodec {
    marshalers: Vec<ContextMarshaler>,
    unmarshalers: Vec<ContextUnmarshaler>,
}

impl fmt::Debug for ContextCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextCodec")
            .field("marshalers", &self.marshalers.len())
            .field("unmarshalers", &self.unmarshalers.len())
            .finish()
    }
}

impl Default for ContextCodec {
    fn default() -> Self {
        let mut codec = Self::empty();
        codec.register(
            |ctx, vals| {
                vals.insert(NAMESPACE_KEY.to_owned(), Value::from(ctx.namespace()));
            },
            |ctx, vals| match vals.get(NAMESPACE_KEY).and_then(Value::as_str) {
                Some(ns) => ctx.with_namespace(ns),
                None => ctx,
            },
        );
        codec.register(
            |ctx, vals| {
                if let Some(v) = ctx.min_version() {
                    vals.insert(MIN_VERSION_KEY.to_owned(), Value::from(v));
                }
            },
            |ctx, vals| match vals.get(MIN_VERSION_KEY).and_then(Value::as_i64) {
                Some(v) => ctx.with_min_version(v),
                None => ctx,
            },
        );
        codec
    }
}

impl ContextCodec {
    /// A codec with no registered pairs.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            marshalers: Vec::new(),
            unmarshalers: Vec::new(),
        }
    }

    /// Registers a marshal/unmarshal pair.
    pub fn register<M, U>(&mut self, marshal: M, unmarshal: U)
    where
        M: Fn(&Context, &mut Map<String, Value>) + Send + Sync + 'static,
        U: Fn(Context, &Map<String, Value>) -> Context + Send + Sync + 'static,
    {
        self.marshalers.push(Arc::new(marshal));
        self.unmarshalers.push(Arc::new(unmarshal));
    }

    /// Number of registered pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.marshalers.len()
    }

    /// Returns `true` if no pairs are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.marshalers.is_empty()
    }

    /// Marshals the ambient values of `ctx`.
    #[must_use]
    pub fn marshal(&self, ctx: &Context) -> Map<String, Value> {
        let mut vals = Map::new();
        for marshal in &self.marshalers {
            marshal(ctx, &mut vals);
        }
        vals
    }

    /// Builds a background context carrying the values in `vals`.
    #[must_use]
    pub fn unmarshal(&self, vals: &Map<String, Value>) -> Context {
        self.unmarshalers
            .iter()
            .fold(Context::background(), |ctx, unmarshal| unmarshal(ctx, vals))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_KEY: &str = "test_context_one";

    #[test]
    fn test_background_uses_default_namespace() {
        let ctx = Context::background();

        assert_eq!(ctx.namespace(), DEFAULT_NAMESPACE);
        assert_eq!(ctx.min_version(), None);
        assert!(ctx.check().is_ok());
    }

    #[test]
    fn test_with_methods_do_not_mutate_original() {
        let base = Context::background();

        let scoped = base.with_namespace("ns").with_min_version(8);

        assert_eq!(base.namespace(), DEFAULT_NAMESPACE);
        assert_eq!(base.min_version(), None);
        assert_eq!(scoped.namespace(), "ns");
        assert_eq!(scoped.min_version(), Some(8));
    }

    #[test]
    fn test_namespace_round_trips_through_json() {
        let codec = ContextCodec::default();
        let ctx = Context::background().with_namespace("ns");

        let vals = codec.marshal(&ctx);
        assert_eq!(vals[NAMESPACE_KEY], "ns");
        let bytes = serde_json::to_vec(&vals).unwrap();
        let vals: Map<String, Value> = serde_json::from_slice(&bytes).unwrap();
        let restored = codec.unmarshal(&vals);

        assert_eq!(restored.namespace(), "ns");
    }

    #[test]
    fn test_min_version_round_trips_through_json() {
        let codec = ContextCodec::default();
        let ctx = Context::background().with_min_version(8);

        let vals = codec.marshal(&ctx);
        assert_eq!(vals[MIN_VERSION_KEY], 8);
        let bytes = serde_json::to_vec(&vals).unwrap();
        let vals: Map<String, Value> = serde_json::from_slice(&bytes).unwrap();
        let restored = codec.unmarshal(&vals);

        assert_eq!(restored.min_version(), Some(8));
    }

    #[test]
    fn test_absent_min_version_is_not_marshaled() {
        let codec = ContextCodec::default();

        let vals = codec.marshal(&Context::background());

        assert!(!vals.contains_key(MIN_VERSION_KEY));
        assert_eq!(codec.unmarshal(&vals).min_version(), None);
    }

    #[test]
    fn test_registered_pair_carries_custom_value() {
        let mut codec = ContextCodec::default();
        assert_eq!(codec.len(), 2);
        codec.register(
            |ctx, vals| {
                if let Some(v) = ctx.value(TEST_KEY) {
                    vals.insert(TEST_KEY.to_owned(), v.clone());
                }
            },
            |ctx, vals| match vals.get(TEST_KEY) {
                Some(v) => ctx.with_value(TEST_KEY, v.clone()),
                None => ctx,
            },
        );
        assert_eq!(codec.len(), 3);

        let empty = codec.marshal(&Context::background());
        assert!(!empty.contains_key(TEST_KEY));

        let ctx = Context::background().with_value(TEST_KEY, Value::from("testval"));
        let restored = codec.unmarshal(&codec.marshal(&ctx));

        assert_eq!(restored.value(TEST_KEY), Some(&Value::from("testval")));
    }

    #[tokio::test]
    async fn test_cancel_handle_cancels_all_copies() {
        let (ctx, handle) = Context::background().with_cancel();
        let copy = ctx.with_namespace("ns");

        handle.cancel();

        assert!(ctx.is_cancelled());
        assert!(matches!(copy.check(), Err(DomainError::Cancelled)));
        copy.done().await;
    }

    #[tokio::test]
    async fn test_deadline_elapses_into_timeout() {
        let ctx = Context::background().with_timeout(Duration::from_millis(10));

        ctx.done().await;

        assert!(matches!(ctx.check(), Err(DomainError::Timeout(_))));
    }

    #[test]
    fn test_with_deadline_keeps_earlier_deadline() {
        let now = Instant::now();
        let ctx = Context::background().with_deadline(now + Duration::from_millis(10));

        let later = ctx.with_deadline(now + Duration::from_secs(10));

        assert_eq!(later.deadline(), Some(now + Duration::from_millis(10)));
    }

    #[test]
    fn test_detached_drops_deadline_and_cancellation() {
        let (ctx, handle) = Context::background()
            .with_namespace("ns")
            .with_timeout(Duration::from_secs(1))
            .with_cancel();
        handle.cancel();

        let detached = ctx.detached();

        assert_eq!(detached.namespace(), "ns");
        assert_eq!(detached.deadline(), None);
        assert!(detached.check().is_ok());
    }
}
