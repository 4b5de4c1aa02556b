//! # Managed Events
//!
//! [`ManagedEvent`] is an immutable description of something that happened to
//! a [`ManagedObject`]. Events are reference counted, so cloning one is O(1)
//! and every listener, stream and interceptor observes the same instance.
//!
//! Events that were intercepted, remapped or delegated keep a link to the
//! event they replaced through [`ManagedEvent::inner`]. The resulting chain is
//! what [`ManagedEvent::find_delegate`] walks.

use crate::object::ManagedObject;
use crate::value::{Record, Value};
use std::any::Any;
use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

thread_local! {
    static EMPTY_DATA: EventData = EventData(Rc::new(Record::new()));
}

/// A read-only, shared event payload.
///
/// Cloning is O(1). Events without a payload share one empty map per thread.
#[derive(Clone)]
pub struct EventData(Rc<Record>);

impl EventData {
    /// The shared empty payload.
    pub fn empty() -> Self {
        EMPTY_DATA.with(Clone::clone)
    }

    /// Returns a new payload with `key` set to `value`.
    pub fn with(&self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let mut map = (*self.0).clone();
        map.insert(key.into(), value.into());
        EventData(Rc::new(map))
    }

    /// Whether two payloads are the same shared instance.
    pub fn ptr_eq(&self, other: &EventData) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Default for EventData {
    fn default() -> Self {
        Self::empty()
    }
}

impl Deref for EventData {
    type Target = Record;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Record> for EventData {
    fn from(map: Record) -> Self {
        if map.is_empty() {
            Self::empty()
        } else {
            EventData(Rc::new(map))
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for EventData {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect::<Record>()
            .into()
    }
}

impl PartialEq for EventData {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || *self.0 == *other.0
    }
}

impl fmt::Debug for EventData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.0.iter()).finish()
    }
}

struct EventInner {
    name: String,
    source: ManagedObject,
    data: EventData,
    delegate: Option<ManagedObject>,
    inner: Option<ManagedEvent>,
    no_propagation: bool,
}

/// An immutable, shared event.
///
/// # Example
///
/// ```rust,ignore
/// let button = ManagedObject::new();
/// let event = ManagedEvent::new("Click", &button);
/// assert_eq!(event.name(), "Click");
/// assert!(event.source().ptr_eq(&button));
/// ```
#[derive(Clone)]
pub struct ManagedEvent(Rc<EventInner>);

impl ManagedEvent {
    /// Create an event with an empty payload.
    pub fn new(name: impl Into<String>, source: &ManagedObject) -> Self {
        Self::builder(name, source).build()
    }

    /// Create an event carrying `data`.
    pub fn with_data(
        name: impl Into<String>,
        source: &ManagedObject,
        data: impl Into<EventData>,
    ) -> Self {
        Self::builder(name, source).data(data).build()
    }

    /// Start building an event with optional fields.
    pub fn builder(name: impl Into<String>, source: &ManagedObject) -> EventBuilder {
        EventBuilder {
            name: name.into(),
            source: source.clone(),
            data: EventData::empty(),
            delegate: None,
            inner: None,
            no_propagation: false,
        }
    }

    /// The event name; by convention capitalized (`"Click"`).
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// The object that emitted the event.
    pub fn source(&self) -> &ManagedObject {
        &self.0.source
    }

    /// The event payload.
    pub fn data(&self) -> &EventData {
        &self.0.data
    }

    /// The object that re-emitted this event on behalf of another, if any.
    pub fn delegate(&self) -> Option<&ManagedObject> {
        self.0.delegate.as_ref()
    }

    /// The event this one encapsulates, if it was intercepted or forwarded.
    pub fn inner(&self) -> Option<&ManagedEvent> {
        self.0.inner.as_ref()
    }

    /// Whether propagation to attach handlers and delegates is suppressed.
    pub fn is_no_propagation(&self) -> bool {
        self.0.no_propagation
    }

    /// Iterate over this event followed by every encapsulated event.
    pub fn chain(&self) -> impl Iterator<Item = &ManagedEvent> {
        std::iter::successors(Some(self), |event| event.inner())
    }

    /// Find the nearest delegate along the `inner` chain matching `predicate`.
    pub fn find_delegate(
        &self,
        mut predicate: impl FnMut(&ManagedObject) -> bool,
    ) -> Option<&ManagedObject> {
        self.chain()
            .filter_map(ManagedEvent::delegate)
            .find(|delegate| predicate(delegate))
    }

    /// Find the nearest delegate carrying a capability of type `T`.
    pub fn find_delegate_of<T: Any>(&self) -> Option<&ManagedObject> {
        self.find_delegate(|delegate| delegate.capability::<T>().is_some())
    }

    /// Whether two handles refer to the same event instance.
    pub fn ptr_eq(&self, other: &ManagedEvent) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ManagedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagedEvent")
            .field("name", &self.0.name)
            .field("source", &self.0.source.id())
            .field("data", &self.0.data)
            .field("delegate", &self.0.delegate.as_ref().map(ManagedObject::id))
            .field("inner", &self.0.inner.as_ref().map(ManagedEvent::name))
            .field("no_propagation", &self.0.no_propagation)
            .finish()
    }
}

/// Builder for [`ManagedEvent`]; the event is frozen by [`EventBuilder::build`].
pub struct EventBuilder {
    name: String,
    source: ManagedObject,
    data: EventData,
    delegate: Option<ManagedObject>,
    inner: Option<ManagedEvent>,
    no_propagation: bool,
}

impl EventBuilder {
    /// Set the payload.
    pub fn data(mut self, data: impl Into<EventData>) -> Self {
        self.data = data.into();
        self
    }

    /// Mark the event as re-emitted by `delegate`.
    pub fn delegate(mut self, delegate: &ManagedObject) -> Self {
        self.delegate = Some(delegate.clone());
        self
    }

    /// Link the event this one replaces.
    pub fn inner(mut self, inner: &ManagedEvent) -> Self {
        self.inner = Some(inner.clone());
        self
    }

    /// Suppress propagation to attach handlers and delegates.
    pub fn no_propagation(mut self) -> Self {
        self.no_propagation = true;
        self
    }

    /// Finish the event.
    pub fn build(self) -> ManagedEvent {
        ManagedEvent(Rc::new(EventInner {
            name: self.name,
            source: self.source,
            data: self.data,
            delegate: self.delegate,
            inner: self.inner,
            no_propagation: self.no_propagation,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Activity;

    #[test]
    fn test_empty_data_is_shared() {
        let obj = ManagedObject::new();
        let a = ManagedEvent::new("A", &obj);
        let b = ManagedEvent::new("B", &obj);
        assert!(a.data().ptr_eq(b.data()));
        assert!(a.data().is_empty());
    }

    #[test]
    fn test_data_with_copies() {
        let data: EventData = [("x", 1)].into_iter().collect();
        let more = data.with("y", 2);
        assert_eq!(data.len(), 1);
        assert_eq!(more.len(), 2);
        assert_eq!(more["y"], Value::from(2));
    }

    #[test]
    fn test_find_delegate_walks_chain() {
        let source = ManagedObject::new();
        let plain = ManagedObject::new();
        let activity = ManagedObject::with_capability(Activity);

        let first = ManagedEvent::builder("Click", &source)
            .delegate(&activity)
            .build();
        let second = ManagedEvent::builder("Click", &source)
            .delegate(&plain)
            .inner(&first)
            .build();
        let outer = ManagedEvent::builder("Select", &source)
            .inner(&second)
            .build();

        assert_eq!(outer.chain().count(), 3);
        assert!(outer.find_delegate(|_| true).unwrap().ptr_eq(&plain));
        assert!(outer.find_delegate_of::<Activity>().unwrap().ptr_eq(&activity));
        assert!(first.find_delegate_of::<String>().is_none());
    }
}
