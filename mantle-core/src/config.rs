//! Runtime configuration for the current thread.

use crate::error::UnhandledError;
use crate::scheduler::{self, Spawner};
use crate::unhandled::{self, ErrorHandler};
use futures::future::LocalBoxFuture;
use std::rc::Rc;

/// Builder for the thread's unhandled-error sink and task spawner.
///
/// Managed objects are confined to the thread that created them, so both
/// settings apply per thread. Unset fields keep the defaults: errors are
/// logged through `tracing` and pending tasks queue on the built-in pool.
///
/// # Example
///
/// ```rust,ignore
/// RuntimeConfig::new()
///     .with_error_handler(|err| eprintln!("{err}"))
///     .install();
/// ```
#[derive(Default, Clone)]
pub struct RuntimeConfig {
    error_handler: Option<ErrorHandler>,
    spawner: Option<Spawner>,
}

impl RuntimeConfig {
    /// Start from the defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Route unhandled listener errors to `handler`.
    pub fn with_error_handler(mut self, handler: impl Fn(&UnhandledError) + 'static) -> Self {
        self.error_handler = Some(Rc::new(handler));
        self
    }

    /// Hand pending listener outcomes to `spawner` instead of the built-in pool.
    pub fn with_spawner(mut self, spawner: impl Fn(LocalBoxFuture<'static, ()>) + 'static) -> Self {
        self.spawner = Some(Rc::new(spawner));
        self
    }

    /// Apply the configuration to the current thread.
    pub fn install(self) {
        tracing::debug!(
            error_handler = self.error_handler.is_some(),
            spawner = self.spawner.is_some(),
            "installing runtime configuration"
        );
        unhandled::set_error_handler(self.error_handler);
        scheduler::set_spawner(self.spawner);
    }
}

impl std::fmt::Debug for RuntimeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeConfig")
            .field("error_handler", &self.error_handler.is_some())
            .field("spawner", &self.spawner.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::ManagedObject;
    use std::cell::RefCell;

    #[test]
    fn test_installed_handler_receives_listener_errors() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        RuntimeConfig::new()
            .with_error_handler(move |err| sink.borrow_mut().push(err.origin().clone()))
            .install();

        let obj = ManagedObject::new();
        obj.listen(|_| Err::<(), _>("broken"));
        obj.emit("Click");

        RuntimeConfig::new().install();
        assert_eq!(seen.borrow().len(), 1);
        assert_eq!(
            seen.borrow()[0],
            crate::error::ErrorOrigin::Listener {
                event: "Click".into()
            }
        );
    }
}
