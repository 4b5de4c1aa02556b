//! The unhandled-error channel.
//!
//! Errors raised by listeners, observers, attach handlers and pending tasks
//! are never returned to the emitter. They are handed to a single sink per
//! thread instead. Without an installed handler the error is logged through
//! `tracing` at error level.

use crate::error::UnhandledError;
use std::cell::RefCell;
use std::rc::Rc;

/// The sink signature for unhandled errors.
pub type ErrorHandler = Rc<dyn Fn(&UnhandledError)>;

thread_local! {
    static HANDLER: RefCell<Option<ErrorHandler>> = const { RefCell::new(None) };
}

/// Install `handler` as the sink for the current thread, returning the previous one.
///
/// Pass `None` to restore the default logging sink.
pub fn set_error_handler(handler: Option<ErrorHandler>) -> Option<ErrorHandler> {
    HANDLER.with(|slot| std::mem::replace(&mut *slot.borrow_mut(), handler))
}

/// Route `error` to the current sink.
pub fn report(error: UnhandledError) {
    let handler = HANDLER.with(|slot| slot.borrow().clone());
    match handler {
        Some(handler) => handler(&error),
        None => tracing::error!(origin = %error.origin(), error = %error.error(), "unhandled error"),
    }
}
