//! Test event handlers.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chronicle_core::context::Context;
use chronicle_core::error::DomainError;
use chronicle_core::event::Event;
use chronicle_core::handler::{EventHandler, HandlerType};
use tokio::sync::Notify;

/// An event handler that records every event it receives, together with
/// the namespace of the context it was called under.
#[derive(Debug)]
pub struct RecordingEventHandler {
    handler_type: HandlerType,
    delay: Option<Duration>,
    handled: Mutex<Vec<(String, Event)>>,
    notify: Notify,
}

impl RecordingEventHandler {
    /// Creates a handler named `handler_type`.
    #[must_use]
    pub fn new(handler_type: &'static str) -> Self {
        Self {
            handler_type: HandlerType::from_static(handler_type),
            delay: None,
            handled: Mutex::new(Vec::new()),
            notify: Notify::new(),
        }
    }

    /// Sleeps for `delay` before recording each event.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Returns a snapshot of all handled events.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn events(&self) -> Vec<Event> {
        self.handled
            .lock()
            .unwrap()
            .iter()
            .map(|(_, event)| event.clone())
            .collect()
    }

    /// Returns the namespaces of the contexts events were handled under.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn namespaces(&self) -> Vec<String> {
        self.handled
            .lock()
            .unwrap()
            .iter()
            .map(|(namespace, _)| namespace.clone())
            .collect()
    }

    /// Waits until at least `count` events have been handled.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub async fn wait_for(&self, count: usize) {
        loop {
            if self.handled.lock().unwrap().len() >= count {
                return;
            }
            self.notify.notified().await;
        }
    }
}

#[async_trait]
impl EventHandler for RecordingEventHandler {
    fn handler_type(&self) -> HandlerType {
        self.handler_type.clone()
    }

    async fn handle_event(&self, ctx: &Context, event: &Event) -> Result<(), DomainError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.handled
            .lock()
            .unwrap()
            .push((ctx.namespace().to_owned(), event.clone()));
        self.notify.notify_one();
        Ok(())
    }
}

/// An event handler that always fails with an infrastructure error and
/// counts how often it was called.
#[derive(Debug)]
pub struct FailingEventHandler {
    handler_type: HandlerType,
    calls: Mutex<usize>,
    notify: Notify,
}

impl FailingEventHandler {
    /// Creates a failing handler named `handler_type`.
    #[must_use]
    pub fn new(handler_type: &'static str) -> Self {
        Self {
            handler_type: HandlerType::from_static(handler_type),
            calls: Mutex::new(0),
            notify: Notify::new(),
        }
    }

    /// Returns the number of calls so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }

    /// Waits until the handler has been called at least `count` times.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub async fn wait_for(&self, count: usize) {
        loop {
            if self.calls() >= count {
                return;
            }
            self.notify.notified().await;
        }
    }
}

#[async_trait]
impl EventHandler for FailingEventHandler {
    fn handler_type(&self) -> HandlerType {
        self.handler_type.clone()
    }

    async fn handle_event(&self, _ctx: &Context, _event: &Event) -> Result<(), DomainError> {
        *self.calls.lock().unwrap() += 1;
        self.notify.notify_one();
        Err(DomainError::Infrastructure("handler failed".into()))
    }
}
