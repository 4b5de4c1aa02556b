//! # Listeners and Outcomes
//!
//! Listeners, observers and attach handlers are plain callbacks. Whatever
//! they return is converted into an [`Outcome`] via [`IntoOutcome`]:
//!
//! - `()` → [`Outcome::Done`]
//! - `Result<T, E>` → delegates to `T`, or [`Outcome::Failed`]
//! - [`Outcome::pending`] → a future the scheduler drives after emission
//!
//! Failures never reach the emitter. They are routed to the unhandled-error
//! channel, synchronously for `Failed` and panics, and from the scheduler for
//! pending futures that resolve to an error.

use crate::error::{BoxError, ErrorOrigin, ListenerError, UnhandledError};
use crate::event::ManagedEvent;
use crate::{scheduler, unhandled};
use futures::future::LocalBoxFuture;
use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::{AssertUnwindSafe, catch_unwind};

/// What a callback produced.
pub enum Outcome {
    /// The callback completed.
    Done,
    /// The callback failed synchronously.
    Failed(BoxError),
    /// The callback started an asynchronous operation that may still fail.
    Pending(LocalBoxFuture<'static, Result<(), BoxError>>),
}

impl Outcome {
    /// Wrap a future whose error should be reported once it settles.
    pub fn pending<F, E>(future: F) -> Self
    where
        F: Future<Output = Result<(), E>> + 'static,
        E: Into<BoxError>,
    {
        Outcome::Pending(Box::pin(async move { future.await.map_err(Into::into) }))
    }
}

impl fmt::Debug for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Done => f.write_str("Done"),
            Outcome::Failed(err) => f.debug_tuple("Failed").field(err).finish(),
            Outcome::Pending(_) => f.write_str("Pending(..)"),
        }
    }
}

/// Trait for converting a callback's return value into an [`Outcome`].
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot be returned from a Mantle callback",
    label = "missing `IntoOutcome` implementation",
    note = "Return `()`, a `Result`, or an `Outcome` (see `Outcome::pending` for futures)."
)]
pub trait IntoOutcome {
    /// Convert the value into an outcome.
    fn into_outcome(self) -> Outcome;
}

impl IntoOutcome for () {
    fn into_outcome(self) -> Outcome {
        Outcome::Done
    }
}

impl IntoOutcome for Outcome {
    fn into_outcome(self) -> Outcome {
        self
    }
}

impl<T, E> IntoOutcome for Result<T, E>
where
    T: IntoOutcome,
    E: Into<BoxError>,
{
    fn into_outcome(self) -> Outcome {
        match self {
            Ok(t) => t.into_outcome(),
            Err(e) => Outcome::Failed(e.into()),
        }
    }
}

/// A synchronous event listener.
///
/// Closures `Fn(&ManagedEvent) -> R` where `R: IntoOutcome` implement this
/// trait automatically.
pub trait Listener: 'static {
    /// Called for every event the object emits.
    fn on_event(&self, event: &ManagedEvent) -> Outcome;
}

impl<F, R> Listener for F
where
    F: Fn(&ManagedEvent) -> R + 'static,
    R: IntoOutcome,
{
    fn on_event(&self, event: &ManagedEvent) -> Outcome {
        self(event).into_outcome()
    }
}

/// Run a callback, isolating any failure from the caller.
pub(crate) fn settle(origin: impl FnOnce() -> ErrorOrigin, callback: impl FnOnce() -> Outcome) {
    let outcome = match catch_unwind(AssertUnwindSafe(callback)) {
        Ok(outcome) => outcome,
        Err(payload) => {
            let error = ListenerError::Panic(panic_message(payload.as_ref()));
            unhandled::report(UnhandledError::new(origin(), error));
            return;
        }
    };

    match outcome {
        Outcome::Done => {}
        Outcome::Failed(err) => {
            unhandled::report(UnhandledError::new(origin(), ListenerError::Failed(err)));
        }
        Outcome::Pending(future) => {
            let origin = ErrorOrigin::Task {
                parent: Box::new(origin()),
            };
            scheduler::spawn_local(async move {
                if let Err(err) = future.await {
                    unhandled::report(UnhandledError::new(origin, ListenerError::Failed(err)));
                }
            });
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_owned()
    }
}
