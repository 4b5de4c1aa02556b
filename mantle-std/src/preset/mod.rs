//! View presets: declarative property values, bindings and event remaps
//! applied to a managed object once, right after construction.
//!
//! ```rust,ignore
//! let preset = ViewPreset::new()
//!     .set("label", "Remove")
//!     .on("Click", "+RemoveItem")?;
//! preset.apply(&button)?;
//! ```

mod binding;
mod interceptor;
mod remap;

pub use binding::Binding;
pub use interceptor::EventInterceptor;
pub use remap::{EventRemap, RemapTarget, remap_source};

use mantle_core::{Emit, ManagedObject, MantleError, OperationError, Record, Value};
use std::fmt;
use std::rc::Rc;

/// A value in a preset entry list.
#[derive(Clone)]
pub enum PresetValue {
    /// Skipped entirely.
    Unset,
    /// Assigned to the property.
    Value(Value),
    /// Bound to the property.
    Binding(Rc<dyn Binding>),
}

impl fmt::Debug for PresetValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PresetValue::Unset => f.write_str("Unset"),
            PresetValue::Value(value) => f.debug_tuple("Value").field(value).finish(),
            PresetValue::Binding(_) => f.write_str("Binding(..)"),
        }
    }
}

impl From<Value> for PresetValue {
    fn from(value: Value) -> Self {
        PresetValue::Value(value)
    }
}

impl From<&str> for PresetValue {
    fn from(value: &str) -> Self {
        PresetValue::Value(value.into())
    }
}

impl From<bool> for PresetValue {
    fn from(value: bool) -> Self {
        PresetValue::Value(value.into())
    }
}

impl From<f64> for PresetValue {
    fn from(value: f64) -> Self {
        PresetValue::Value(value.into())
    }
}

impl From<Rc<dyn Binding>> for PresetValue {
    fn from(binding: Rc<dyn Binding>) -> Self {
        PresetValue::Binding(binding)
    }
}

/// A reusable set of property values, bindings and event remaps.
///
/// Remap keys are recognized once, when the preset is built; applying the
/// preset does no key inspection.
#[derive(Clone, Debug, Default)]
pub struct ViewPreset {
    properties: Vec<(String, PresetValue)>,
    remaps: Vec<EventRemap>,
}

impl ViewPreset {
    /// An empty preset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign `value` to `property` on apply.
    pub fn set(mut self, property: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties
            .push((property.into(), PresetValue::Value(value.into())));
        self
    }

    /// Attach `binding` to `property` on apply.
    pub fn bind(mut self, property: impl Into<String>, binding: impl Binding) -> Self {
        self.properties
            .push((property.into(), PresetValue::Binding(Rc::new(binding))));
        self
    }

    /// Remap events named `event` using the `[+]Target[:dataKey]` syntax.
    pub fn on(mut self, event: impl Into<String>, target: &str) -> Result<Self, MantleError> {
        self.remaps.push(EventRemap::new(event, target)?);
        Ok(self)
    }

    /// Build a preset from raw entries.
    ///
    /// Keys of the form `on<Name>` are event remaps and must carry a string
    /// value; other keys are properties. `Unset` entries are skipped.
    pub fn from_entries<K, I>(entries: I) -> Result<Self, MantleError>
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, PresetValue)>,
    {
        let mut preset = Self::new();
        for (key, value) in entries {
            let key = key.into();
            if let PresetValue::Unset = value {
                continue;
            }
            match remap_source(&key) {
                Some(source) => match &value {
                    PresetValue::Value(Value::String(target)) => {
                        preset.remaps.push(EventRemap::new(source, target)?);
                    }
                    _ => {
                        return Err(MantleError::invalid_argument(format!(
                            "remap `{key}` must be a string"
                        )));
                    }
                },
                None => preset.properties.push((key, value)),
            }
        }
        Ok(preset)
    }

    /// Build a preset from a record of plain values.
    pub fn from_record(record: &Record) -> Result<Self, MantleError> {
        Self::from_entries(
            record
                .iter()
                .map(|(key, value)| (key.clone(), PresetValue::Value(value.clone()))),
        )
    }

    /// Property entries in declaration order.
    pub fn properties(&self) -> &[(String, PresetValue)] {
        &self.properties
    }

    /// Event remaps in declaration order.
    pub fn remaps(&self) -> &[EventRemap] {
        &self.remaps
    }

    /// Apply the preset to `object`.
    ///
    /// Properties and bindings are applied in declaration order, then the
    /// event interceptor is installed if there are remaps. An object accepts
    /// at most one preset. The object is only marked once every binding has
    /// attached, so an apply that fails on a binding may be retried; values
    /// assigned before the failure stay in place.
    pub fn apply(&self, object: &ManagedObject) -> Result<(), MantleError> {
        if object.is_unlinked() {
            return Err(OperationError::Unlinked.into());
        }
        if object.has_preset() {
            return Err(OperationError::PresetApplied.into());
        }

        for (property, value) in &self.properties {
            match value {
                PresetValue::Unset => {}
                PresetValue::Value(value) => object.set(property.as_str(), value.clone()),
                PresetValue::Binding(binding) => {
                    binding
                        .bind_to(object, property)
                        .map_err(|source| MantleError::Binding {
                            property: property.clone(),
                            source,
                        })?;
                }
            }
        }

        // A binding may itself have applied a preset or unlinked the object.
        object.claim_preset()?;
        if !self.remaps.is_empty() {
            object.wrap_emitter(|inner| {
                let layer: Rc<dyn Emit> =
                    Rc::new(EventInterceptor::new(object, inner, &self.remaps));
                layer
            })?;
        }

        tracing::debug!(
            object = %object.id(),
            properties = self.properties.len(),
            remaps = self.remaps.len(),
            "applied view preset"
        );
        Ok(())
    }
}

/// Apply `preset` to `object`. See [`ViewPreset::apply`].
pub fn apply_view_preset(object: &ManagedObject, preset: &ViewPreset) -> Result<(), MantleError> {
    preset.apply(object)
}
