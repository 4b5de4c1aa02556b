//! # mantle-core
//!
//! The managed-object graph underneath the Mantle UI runtime.
//!
//! This crate has minimal dependencies and is designed to be imported by view
//! layers and renderers that only need the object model, not the standard
//! presets and validators in `mantle-std`.
//!
//! # Building Blocks
//!
//! ## Ownership ([`ManagedObject`])
//!
//! Objects attach to each other to form a strict tree. The parent owns its
//! children; children keep a weak back-reference. Unlinking an object is the
//! single, terminal teardown primitive: it cascades depth-first through the
//! children, ends every stream and drops every registration.
//!
//! ## Events ([`ManagedEvent`])
//!
//! Immutable, shared event values. Events emitted by a child reach the
//! parent relationship's handler, or are re-emitted by a delegate with the
//! original kept in [`ManagedEvent::inner`].
//!
//! ## Consumption ([`Listener`], [`EventStream`])
//!
//! Synchronous listeners run in registration order; asynchronous consumers
//! read an ordered [`EventStream`] that ends when the object unlinks.
//!
//! ## Emit Layers ([`Emit`])
//!
//! Decorators composed around an object's emit path at construction time,
//! used by view presets to intercept and remap events.
//!
//! # Failure Isolation
//!
//! Callback failures never reach the emitter. They are reported through the
//! per-thread [`unhandled`] channel; pending futures are driven by the
//! cooperative [`scheduler`].
//!
//! # Error Types
//!
//! - [`MantleError`] - Top-level error type
//! - [`OperationError`] - Graph rule violations
//! - [`UnhandledError`] - Isolated callback failures

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod config;
mod emit;
mod error;
mod event;
mod listener;
mod object;
pub mod scheduler;
mod stream;
pub mod unhandled;
mod value;

// Re-exports
pub use config::RuntimeConfig;
pub use emit::Emit;
pub use error::{
    BoxError, ErrorOrigin, ListenerError, MantleError, OperationError, UnhandledError,
};
pub use event::{EventBuilder, EventData, ManagedEvent};
pub use listener::{IntoOutcome, Listener, Outcome};
pub use object::{AttachOptions, ListenerId, ManagedObject, ObjectId, WeakObject};
pub use stream::EventStream;
pub use value::{Record, Value};
