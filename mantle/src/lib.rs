//! # mantle - Observable Managed Objects for UI Runtimes
//!
//! `mantle` models a UI as a strict ownership tree of managed objects. Each
//! object can emit named events, observe its own properties, and be torn down
//! with a single cascading [`ManagedObject::unlink`].
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use mantle::prelude::*;
//!
//! let list = ManagedObject::new();
//! let row = ManagedObject::new();
//! list.attach(&row, AttachOptions::new().handler(|_, e: &ManagedEvent| {
//!     println!("row emitted {}", e.name());
//! }))?;
//!
//! ViewPreset::new().on("Click", "+RemoveItem")?.apply(&row)?;
//! row.emit("Click"); // handler sees `Click`, then `RemoveItem`
//! ```
//!
//! ## Validating Input
//!
//! ```rust,ignore
//! let reader = ObjectReader::new(
//!     Schema::new().field("quantity", Rule::number(NumberRule::new().integer().positive())),
//! );
//! let record = reader.read_json_string(r#"{"quantity": "3"}"#)?;
//! ```
//!
//! ## Asynchronous Consumers
//!
//! [`ManagedObject::listen_stream`] returns an [`EventStream`] that yields
//! every event in order and ends when the object is unlinked. Listeners that
//! return [`Outcome::Pending`] are driven by the per-thread [`scheduler`].

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

pub use mantle_core::{
    // Error types
    BoxError,
    // Object graph
    AttachOptions,
    // Emit layers
    Emit,
    ErrorOrigin,
    // Events
    EventBuilder,
    EventData,
    EventStream,
    // Listeners
    IntoOutcome,
    ListenerError,
    ListenerId,
    Listener,
    ManagedEvent,
    ManagedObject,
    MantleError,
    ObjectId,
    OperationError,
    Outcome,
    // Values
    Record,
    // Configuration
    RuntimeConfig,
    UnhandledError,
    Value,
    WeakObject,
    scheduler,
    unhandled,
};

pub use mantle_std::{
    // Presets
    Binding,
    EventInterceptor,
    EventRemap,
    PresetValue,
    RemapTarget,
    ViewPreset,
    apply_view_preset,
    testing,
};

/// Schema-driven validation of untrusted records.
pub mod reader {
    pub use mantle_std::reader::{
        ArrayRule, DEFAULT_MAX_DEPTH, DateRule, FieldErrors, FieldKey, NumberRule, ObjectReader,
        Rule, Schema, SimpleRule, StringRule, ValidationError, Validator,
    };
}

pub use reader::{FieldErrors, ObjectReader, Rule, Schema, ValidationError};

/// Commonly used types.
pub mod prelude {
    pub use crate::reader::{
        ArrayRule, DateRule, FieldErrors, NumberRule, ObjectReader, Rule, Schema, StringRule,
    };
    pub use crate::{
        AttachOptions, Emit, EventData, EventStream, IntoOutcome, Listener, ManagedEvent,
        ManagedObject, MantleError, Outcome, Record, Value, ViewPreset,
    };
}
