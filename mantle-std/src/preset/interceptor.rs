//! The emit layer installed by presets with event remaps.

use super::remap::{EventRemap, RemapTarget};
use mantle_core::{Emit, ManagedEvent, ManagedObject, WeakObject};
use std::collections::HashMap;
use std::rc::Rc;

/// Intercepts remapped events before they reach the inner emit path.
///
/// Events without a remap pass through unchanged. A remapped event is
/// replaced by a new event (the original kept as its `inner`) which is then
/// emitted through the object's full emit path, so remaps may chain. If the
/// target already appears in the `inner` chain, the new event goes straight to
/// the inner path instead.
pub struct EventInterceptor {
    object: WeakObject,
    inner: Rc<dyn Emit>,
    remaps: HashMap<String, RemapTarget>,
}

impl EventInterceptor {
    /// Build the layer for `object`, wrapping `inner`.
    pub fn new(object: &ManagedObject, inner: Rc<dyn Emit>, remaps: &[EventRemap]) -> Self {
        let remaps = remaps
            .iter()
            .map(|remap| (remap.source().to_owned(), remap.target().clone()))
            .collect();
        Self {
            object: object.downgrade(),
            inner,
            remaps,
        }
    }

    fn remapped(&self, event: &ManagedEvent, target: &RemapTarget) -> ManagedEvent {
        let data = match target.data_key() {
            Some(key) => event.data().with("target", key),
            None => event.data().clone(),
        };
        ManagedEvent::builder(target.name(), event.source())
            .data(data)
            .inner(event)
            .build()
    }
}

impl Emit for EventInterceptor {
    fn emit_event(&self, event: ManagedEvent) {
        let Some(target) = self.remaps.get(event.name()) else {
            self.inner.emit_event(event);
            return;
        };

        if target.forwards_original() {
            self.inner.emit_event(event.clone());
        }

        let looped = event.chain().any(|e| e.name() == target.name());
        let remapped = self.remapped(&event, target);
        tracing::debug!(from = event.name(), to = target.name(), "remapping event");

        match self.object.upgrade() {
            Some(object) if !looped => object.emit_event(remapped),
            // Renaming to itself only annotates or repeats the event.
            Some(_) if target.name() == event.name() => self.inner.emit_event(remapped),
            Some(object) => {
                tracing::warn!(
                    object = %object.id(),
                    event = target.name(),
                    "remap loop detected, emitting without further interception"
                );
                self.inner.emit_event(remapped);
            }
            None => self.inner.emit_event(remapped),
        }
    }
}
