//! Testing utilities for Mantle.
//!
//! # Features
//!
//! - [`RecordingListener`]: A listener that records every event it receives
//! - [`ErrorCollector`]: Captures unhandled listener errors on the current thread
//! - [`RecordingBinding`]: A binding that records where it was attached

use mantle_core::{
    BoxError, ErrorOrigin, Listener, ListenerError, ListenerId, ManagedEvent, ManagedObject,
    ObjectId, Outcome, UnhandledError, Value, unhandled,
};
use std::cell::RefCell;
use std::rc::Rc;

use crate::preset::Binding;

// ============================================================================
// Recording Listener
// ============================================================================

/// A listener that records all events it receives.
///
/// # Example
///
/// ```rust,ignore
/// let recorder = RecordingListener::new();
/// recorder.attach_to(&object);
///
/// object.emit("Click");
/// assert_eq!(recorder.names(), vec!["Click"]);
/// ```
#[derive(Clone, Default)]
pub struct RecordingListener {
    events: Rc<RefCell<Vec<ManagedEvent>>>,
}

impl RecordingListener {
    /// An empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a clone of this recorder on `object`.
    pub fn attach_to(&self, object: &ManagedObject) -> ListenerId {
        object.listen_with(self.clone())
    }

    /// Recorded events, in delivery order.
    pub fn events(&self) -> Vec<ManagedEvent> {
        self.events.borrow().clone()
    }

    /// Names of the recorded events, in delivery order.
    pub fn names(&self) -> Vec<String> {
        self.events
            .borrow()
            .iter()
            .map(|e| e.name().to_owned())
            .collect()
    }

    /// Number of recorded events.
    pub fn count(&self) -> usize {
        self.events.borrow().len()
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }
}

impl Listener for RecordingListener {
    fn on_event(&self, event: &ManagedEvent) -> Outcome {
        self.events.borrow_mut().push(event.clone());
        Outcome::Done
    }
}

// ============================================================================
// Error Collector
// ============================================================================

/// A captured unhandled error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectedError {
    /// Where the error came from.
    pub origin: ErrorOrigin,
    /// The error (or panic) message, without the listener prefix.
    pub message: String,
    /// Whether the callback panicked.
    pub panic: bool,
}

/// Routes unhandled errors on the current thread into a list while alive.
///
/// The previous handler is restored on drop.
pub struct ErrorCollector {
    errors: Rc<RefCell<Vec<CollectedError>>>,
    previous: Option<unhandled::ErrorHandler>,
}

impl ErrorCollector {
    /// Start collecting on the current thread.
    pub fn install() -> Self {
        let errors: Rc<RefCell<Vec<CollectedError>>> = Rc::default();
        let sink = errors.clone();
        let previous = unhandled::set_error_handler(Some(Rc::new(move |err: &UnhandledError| {
            let message = match err.error() {
                ListenerError::Failed(source) => source.to_string(),
                ListenerError::Panic(message) => message.clone(),
            };
            sink.borrow_mut().push(CollectedError {
                origin: err.origin().clone(),
                message,
                panic: err.is_panic(),
            });
        })));
        Self { errors, previous }
    }

    /// Everything collected so far.
    pub fn errors(&self) -> Vec<CollectedError> {
        self.errors.borrow().clone()
    }

    /// Messages of the collected errors, in order.
    pub fn messages(&self) -> Vec<String> {
        self.errors
            .borrow()
            .iter()
            .map(|e| e.message.clone())
            .collect()
    }

    /// Number of collected errors.
    pub fn count(&self) -> usize {
        self.errors.borrow().len()
    }
}

impl Drop for ErrorCollector {
    fn drop(&mut self) {
        unhandled::set_error_handler(self.previous.take());
    }
}

// ============================================================================
// Recording Binding
// ============================================================================

/// A binding that records each attachment and optionally writes a value.
#[derive(Clone, Default)]
pub struct RecordingBinding {
    bound: Rc<RefCell<Vec<(ObjectId, String)>>>,
    value: Option<Value>,
}

impl RecordingBinding {
    /// A binding that records without writing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Write `value` to the bound property when attached.
    pub fn with_value(value: impl Into<Value>) -> Self {
        Self {
            value: Some(value.into()),
            ..Self::default()
        }
    }

    /// Every `(object, property)` this binding was attached to.
    pub fn bound(&self) -> Vec<(ObjectId, String)> {
        self.bound.borrow().clone()
    }
}

impl Binding for RecordingBinding {
    fn bind_to(&self, target: &ManagedObject, property: &str) -> Result<(), BoxError> {
        self.bound
            .borrow_mut()
            .push((target.id(), property.to_owned()));
        if let Some(value) = &self.value {
            target.set(property, value.clone());
        }
        Ok(())
    }
}
