//! Emit layers.
//!
//! Every [`ManagedObject`] has an emit path. Initially it is the object's own
//! dispatch (listeners, streams, then propagation to its parent). An
//! [`Emit`] layer can be composed around that path with
//! [`ManagedObject::wrap_emitter`]; the layer receives the previous path and
//! decides what to forward to it. Layers never replace dispatch in place, so
//! [`ManagedObject::dispatch`] always reaches the object's listeners directly.

use crate::event::ManagedEvent;
use crate::object::{ManagedObject, WeakObject};

/// The emit contract shared by objects and the layers wrapped around them.
pub trait Emit {
    /// Emit `event`.
    fn emit_event(&self, event: ManagedEvent);
}

impl Emit for ManagedObject {
    fn emit_event(&self, event: ManagedEvent) {
        ManagedObject::emit_event(self, event);
    }
}

/// The innermost emit path: the object's own dispatch.
pub(crate) struct DirectEmit(pub(crate) WeakObject);

impl Emit for DirectEmit {
    fn emit_event(&self, event: ManagedEvent) {
        if let Some(object) = self.0.upgrade() {
            object.dispatch(event);
        }
    }
}
