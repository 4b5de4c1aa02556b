//! # mantle-std
//!
//! Standard building blocks on top of the Mantle object model.
//!
//! This crate provides:
//! - **Validation**: [`ObjectReader`] with declarative [`Schema`]s and [`Rule`]s
//! - **View presets**: [`ViewPreset`] property values, bindings and event remaps
//! - **Testing**: recording listeners and error collectors in [`testing`]

#![warn(missing_docs)]
#![deny(clippy::wildcard_imports)]

// Re-export core
pub use mantle_core;

pub mod preset;
pub mod reader;
pub mod testing;

pub use preset::{
    Binding, EventInterceptor, EventRemap, PresetValue, RemapTarget, ViewPreset, apply_view_preset,
};
pub use reader::{
    ArrayRule, DateRule, FieldErrors, FieldKey, NumberRule, ObjectReader, Rule, Schema,
    StringRule, ValidationError,
};
