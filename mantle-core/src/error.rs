//! Error types for Mantle.
//!
//! This module provides a structured error hierarchy using `thiserror`:
//!
//! - [`MantleError`] - Top-level error type for all fallible graph and preset operations
//! - [`OperationError`] - Structural rule violations on the managed-object graph
//! - [`ListenerError`] - Failures isolated from the emitting call stack
//! - [`UnhandledError`] - A [`ListenerError`] tagged with where it happened

use std::fmt;
use thiserror::Error;

/// A boxed error type for dynamic error handling.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Top-level error type for all Mantle operations.
#[derive(Error, Debug)]
pub enum MantleError {
    /// A structural rule of the object graph was violated.
    #[error("invalid operation: {0}")]
    InvalidOperation(#[from] OperationError),

    /// A preset or remap configuration was malformed.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A binding refused to attach to its target property.
    #[error("binding for property `{property}` failed")]
    Binding {
        /// The property the binding was applied to.
        property: String,
        /// The error reported by the binding engine.
        #[source]
        source: BoxError,
    },

    /// A custom error occurred.
    #[error(transparent)]
    Custom(BoxError),
}

impl MantleError {
    /// Shorthand for [`MantleError::InvalidArgument`].
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        MantleError::InvalidArgument(message.into())
    }

    /// Returns the structural violation, if this is an `InvalidOperation`.
    pub fn operation(&self) -> Option<&OperationError> {
        match self {
            MantleError::InvalidOperation(op) => Some(op),
            _ => None,
        }
    }
}

/// Structural violations on the managed-object graph.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationError {
    /// The object (or the attach target) has already been unlinked.
    #[error("object has been unlinked")]
    Unlinked,

    /// An object was attached to itself.
    #[error("cannot attach an object to itself")]
    SelfAttach,

    /// The attach target is an ancestor of the would-be parent.
    #[error("attaching would create a cycle")]
    Cycle,

    /// Root objects never become children.
    #[error("cannot attach a root object")]
    AttachRoot,

    /// An attached object cannot be designated root.
    #[error("cannot make an attached object root")]
    RootAttached,

    /// A child cannot delegate its events to itself.
    #[error("an object cannot be its own delegate")]
    SelfDelegate,

    /// The previous relationship's detached callback attached the child elsewhere.
    #[error("child was re-attached while being moved")]
    Reattached,

    /// A preset was already applied to this object.
    #[error("a preset has already been applied to this object")]
    PresetApplied,
}

/// A failure raised by a listener, observer, attach handler or pending task.
#[derive(Error, Debug)]
pub enum ListenerError {
    /// The callback returned an error (synchronously or from its future).
    #[error("listener failed: {0}")]
    Failed(#[source] BoxError),

    /// The callback panicked.
    #[error("listener panicked: {0}")]
    Panic(String),
}

/// Where an isolated failure originated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorOrigin {
    /// A listener registered with `listen`.
    Listener {
        /// Name of the event being delivered.
        event: String,
    },
    /// An attach handler invoked for a child's event.
    AttachHandler {
        /// Name of the event being propagated.
        event: String,
    },
    /// A property observer.
    Observer {
        /// The property whose change was being reported.
        property: String,
    },
    /// A pending outcome that completed with an error after emission returned.
    Task {
        /// The origin of the callback that returned the pending outcome.
        parent: Box<ErrorOrigin>,
    },
}

impl fmt::Display for ErrorOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorOrigin::Listener { event } => write!(f, "listener for `{event}`"),
            ErrorOrigin::AttachHandler { event } => write!(f, "attach handler for `{event}`"),
            ErrorOrigin::Observer { property } => write!(f, "observer of `{property}`"),
            ErrorOrigin::Task { parent } => write!(f, "pending task of {parent}"),
        }
    }
}

/// An error that escaped a callback and was routed to the unhandled-error channel.
#[derive(Error, Debug)]
#[error("unhandled error in {origin}: {error}")]
pub struct UnhandledError {
    origin: ErrorOrigin,
    #[source]
    error: ListenerError,
}

impl UnhandledError {
    /// Create a new unhandled error.
    pub fn new(origin: ErrorOrigin, error: ListenerError) -> Self {
        Self { origin, error }
    }

    /// Where the failure happened.
    pub fn origin(&self) -> &ErrorOrigin {
        &self.origin
    }

    /// The underlying failure.
    pub fn error(&self) -> &ListenerError {
        &self.error
    }

    /// Whether the failure was a caught panic.
    pub fn is_panic(&self) -> bool {
        matches!(self.error, ListenerError::Panic(_))
    }
}

// Convenience conversions
impl From<BoxError> for MantleError {
    fn from(err: BoxError) -> Self {
        MantleError::Custom(err)
    }
}

impl From<BoxError> for ListenerError {
    fn from(err: BoxError) -> Self {
        ListenerError::Failed(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_error_converts() {
        let err: MantleError = OperationError::Cycle.into();
        assert_eq!(err.operation(), Some(&OperationError::Cycle));
        assert_eq!(
            err.to_string(),
            "invalid operation: attaching would create a cycle"
        );
    }

    #[test]
    fn test_unhandled_error_display() {
        let err = UnhandledError::new(
            ErrorOrigin::Task {
                parent: Box::new(ErrorOrigin::Listener {
                    event: "Click".into(),
                }),
            },
            ListenerError::Panic("boom".into()),
        );
        assert!(err.is_panic());
        assert_eq!(
            err.to_string(),
            "unhandled error in pending task of listener for `Click`: listener panicked: boom"
        );
    }
}
