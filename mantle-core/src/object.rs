//! # Managed Objects
//!
//! A [`ManagedObject`] is a cheap, cloneable handle to one node of the
//! ownership graph. Each node holds:
//!
//! - its attached children (strong references, in attach order)
//! - a weak back-reference to its parent, plus the options of that relationship
//! - dynamic properties and the observers watching them
//! - synchronous listeners and asynchronous [`EventStream`]s
//!
//! # Invariants
//!
//! 1. Attachment forms a strict tree. Attaching an object to itself, to one of
//!    its descendants, attaching a root, or attaching anything unlinked fails
//!    with [`OperationError`] before the graph is touched.
//! 2. Unlinking is terminal and idempotent. The first call unlinks children
//!    depth-first, runs the `before_unlink` hooks, then notifies the parent
//!    relationship's detached callback. Later calls do nothing.
//! 3. No `RefCell` borrow is held while user callbacks run, so listeners may
//!    freely emit, attach, observe or unlink re-entrantly.

use crate::emit::{DirectEmit, Emit};
use crate::error::{ErrorOrigin, MantleError, OperationError};
use crate::event::{EventData, ManagedEvent};
use crate::listener::{IntoOutcome, Listener, Outcome, settle};
use crate::stream::{self, EventStream, SharedStream};
use crate::value::{Record, Value};
use bitflags::bitflags;
use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_OBJECT_ID: AtomicU64 = AtomicU64::new(1);

/// A process-unique object identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(u64);

impl ObjectId {
    fn next() -> Self {
        ObjectId(NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw identity value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Handle returned by [`ManagedObject::listen`], usable with [`ManagedObject::unlisten`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    struct StateFlags: u8 {
        const UNLINKED = 1 << 0;
        const ROOT = 1 << 1;
        const PRESET = 1 << 2;
    }
}

type AttachHandlerFn = Rc<dyn Fn(&ManagedObject, &ManagedEvent) -> Outcome>;
type DetachedFn = Box<dyn FnOnce(&ManagedObject)>;
type ObserverFn = Rc<dyn Fn(&ManagedObject, &str, &Value) -> Outcome>;
type UnlinkHook = Box<dyn FnOnce(&ManagedObject)>;

/// Options for [`ManagedObject::attach`].
///
/// # Example
///
/// ```rust,ignore
/// parent.attach(
///     &child,
///     AttachOptions::new()
///         .handler(|child, event| println!("{} from {}", event.name(), child.id()))
///         .on_detached(|child| println!("{} moved or unlinked", child.id())),
/// )?;
/// ```
#[derive(Default)]
pub struct AttachOptions {
    handler: Option<AttachHandlerFn>,
    delegate: Option<WeakObject>,
    detached: Option<DetachedFn>,
}

impl AttachOptions {
    /// Attach without handlers: ownership only.
    pub fn new() -> Self {
        Self::default()
    }

    /// Invoke `handler` with `(child, event)` for every propagating event the child emits.
    pub fn handler<F, R>(mut self, handler: F) -> Self
    where
        F: Fn(&ManagedObject, &ManagedEvent) -> R + 'static,
        R: IntoOutcome,
    {
        self.handler = Some(Rc::new(
            move |child: &ManagedObject, event: &ManagedEvent| handler(child, event).into_outcome(),
        ));
        self
    }

    /// Re-emit every propagating child event on `delegate`, as a new event
    /// whose `delegate` is set and whose `inner` is the original.
    pub fn delegate(mut self, delegate: &ManagedObject) -> Self {
        self.delegate = Some(delegate.downgrade());
        self
    }

    /// Called once when the child is unlinked or moved to another parent.
    pub fn on_detached(mut self, detached: impl FnOnce(&ManagedObject) + 'static) -> Self {
        self.detached = Some(Box::new(detached));
        self
    }
}

struct ParentLink {
    parent: WeakObject,
    handler: Option<AttachHandlerFn>,
    delegate: Option<WeakObject>,
    detached: Option<DetachedFn>,
}

struct Observer {
    properties: Vec<String>,
    last: Vec<Option<Value>>,
    callback: ObserverFn,
}

#[derive(Default)]
struct ObjectState {
    flags: StateFlags,
    parent: Option<ParentLink>,
    children: Vec<ManagedObject>,
    listeners: Vec<(ListenerId, Rc<dyn Listener>)>,
    next_listener: u64,
    streams: Vec<SharedStream>,
    properties: Record,
    observers: Vec<Observer>,
    emitter: Option<Rc<dyn Emit>>,
    before_unlink: Vec<UnlinkHook>,
}

struct ObjectCell {
    id: ObjectId,
    capability: Option<Rc<dyn Any>>,
    state: RefCell<ObjectState>,
}

/// A node in the managed-object graph.
///
/// Clones are handles to the same node; equality and hashing use identity.
#[derive(Clone)]
pub struct ManagedObject {
    cell: Rc<ObjectCell>,
}

/// A non-owning handle to a [`ManagedObject`].
#[derive(Clone, Default)]
pub struct WeakObject {
    cell: Weak<ObjectCell>,
}

impl WeakObject {
    /// A handle that never upgrades.
    pub fn new() -> Self {
        Self::default()
    }

    /// Recover a strong handle if the object is still alive.
    pub fn upgrade(&self) -> Option<ManagedObject> {
        self.cell.upgrade().map(|cell| ManagedObject { cell })
    }
}

impl fmt::Debug for WeakObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upgrade() {
            Some(object) => write!(f, "WeakObject({})", object.id()),
            None => f.write_str("WeakObject(<dropped>)"),
        }
    }
}

impl Default for ManagedObject {
    fn default() -> Self {
        Self::new()
    }
}

impl ManagedObject {
    /// Create a live, unattached object.
    pub fn new() -> Self {
        Self::from_capability(None)
    }

    /// Create an object carrying a typed capability.
    ///
    /// Capabilities are what [`whence_of`](Self::whence_of) and
    /// [`ManagedEvent::find_delegate_of`] filter on.
    pub fn with_capability<T: Any>(capability: T) -> Self {
        Self::from_capability(Some(Rc::new(capability)))
    }

    fn from_capability(capability: Option<Rc<dyn Any>>) -> Self {
        Self {
            cell: Rc::new(ObjectCell {
                id: ObjectId::next(),
                capability,
                state: RefCell::new(ObjectState::default()),
            }),
        }
    }

    /// This object's identity.
    pub fn id(&self) -> ObjectId {
        self.cell.id
    }

    /// The object's capability, if it has one of type `T`.
    pub fn capability<T: Any>(&self) -> Option<Rc<T>> {
        self.cell.capability.clone()?.downcast::<T>().ok()
    }

    /// A non-owning handle to this object.
    pub fn downgrade(&self) -> WeakObject {
        WeakObject {
            cell: Rc::downgrade(&self.cell),
        }
    }

    /// Whether both handles refer to the same object.
    pub fn ptr_eq(&self, other: &ManagedObject) -> bool {
        Rc::ptr_eq(&self.cell, &other.cell)
    }

    /// Whether [`unlink`](Self::unlink) has been called.
    pub fn is_unlinked(&self) -> bool {
        self.flags().contains(StateFlags::UNLINKED)
    }

    /// Whether this object was designated a root.
    pub fn is_root(&self) -> bool {
        self.flags().contains(StateFlags::ROOT)
    }

    /// Whether this object currently has a parent.
    pub fn is_attached(&self) -> bool {
        self.cell.state.borrow().parent.is_some()
    }

    fn flags(&self) -> StateFlags {
        self.cell.state.borrow().flags
    }

    // ------------------------------------------------------------------------
    // Ownership
    // ------------------------------------------------------------------------

    /// The object this one is attached to.
    pub fn parent(&self) -> Option<ManagedObject> {
        self.cell
            .state
            .borrow()
            .parent
            .as_ref()
            .and_then(|link| link.parent.upgrade())
    }

    /// Attached children, in attach order.
    pub fn children(&self) -> Vec<ManagedObject> {
        self.cell.state.borrow().children.clone()
    }

    /// Walk parent back-references, nearest first.
    pub fn ancestors(&self) -> impl Iterator<Item = ManagedObject> {
        std::iter::successors(self.parent(), ManagedObject::parent)
    }

    /// Attach `child` under this object.
    ///
    /// If `child` already has a different parent it is moved: the old
    /// relationship's detached callback fires and the child stays live.
    /// Re-attaching to the current parent replaces the relationship's options.
    ///
    /// The detached callback runs before the new link exists. If it unlinks
    /// either object, attaches the child elsewhere or otherwise makes the
    /// attach invalid, the move is abandoned with an error and the child keeps
    /// whatever relationship the callback gave it.
    pub fn attach(&self, child: &ManagedObject, options: AttachOptions) -> Result<(), MantleError> {
        let self_delegate = options
            .delegate
            .as_ref()
            .and_then(WeakObject::upgrade)
            .is_some_and(|delegate| delegate.ptr_eq(child));
        let checked = if self_delegate {
            Err(OperationError::SelfDelegate)
        } else {
            self.check_attach(child)
        };
        if let Err(err) = checked {
            tracing::warn!(parent = %self.id(), child = %child.id(), error = %err, "attach rejected");
            return Err(err.into());
        }

        let link = ParentLink {
            parent: self.downgrade(),
            handler: options.handler,
            delegate: options.delegate,
            detached: options.detached,
        };

        if child.parent().is_some_and(|parent| parent.ptr_eq(self)) {
            let previous = child.cell.state.borrow_mut().parent.replace(link);
            drop(previous);
            tracing::trace!(parent = %self.id(), child = %child.id(), "re-attached");
            return Ok(());
        }

        if let Some(detached) = child.detach() {
            tracing::trace!(child = %child.id(), "moving to new parent");
            detached(child);
            let recheck = self.check_attach(child).and_then(|()| {
                if child.is_attached() {
                    Err(OperationError::Reattached)
                } else {
                    Ok(())
                }
            });
            if let Err(err) = recheck {
                tracing::warn!(
                    parent = %self.id(),
                    child = %child.id(),
                    error = %err,
                    "move abandoned by detached callback"
                );
                return Err(err.into());
            }
        }

        self.cell.state.borrow_mut().children.push(child.clone());
        child.cell.state.borrow_mut().parent = Some(link);
        tracing::trace!(parent = %self.id(), child = %child.id(), "attached");
        Ok(())
    }

    fn check_attach(&self, child: &ManagedObject) -> Result<(), OperationError> {
        if self.is_unlinked() || child.is_unlinked() {
            return Err(OperationError::Unlinked);
        }
        if child.is_root() {
            return Err(OperationError::AttachRoot);
        }
        if self.ptr_eq(child) {
            return Err(OperationError::SelfAttach);
        }
        if self.ancestors().any(|ancestor| ancestor.ptr_eq(child)) {
            return Err(OperationError::Cycle);
        }
        Ok(())
    }

    /// Remove the parent relationship, returning its detached callback.
    fn detach(&self) -> Option<DetachedFn> {
        let link = self.cell.state.borrow_mut().parent.take()?;
        if let Some(parent) = link.parent.upgrade() {
            parent
                .cell
                .state
                .borrow_mut()
                .children
                .retain(|child| !child.ptr_eq(self));
        }
        link.detached
    }

    /// Designate this object as a root; roots are never attached.
    pub fn make_root(&self) -> Result<(), MantleError> {
        let mut state = self.cell.state.borrow_mut();
        if state.flags.contains(StateFlags::UNLINKED) {
            return Err(OperationError::Unlinked.into());
        }
        if state.parent.is_some() {
            return Err(OperationError::RootAttached.into());
        }
        state.flags.insert(StateFlags::ROOT);
        Ok(())
    }

    /// The nearest ancestor, i.e. the parent.
    pub fn whence(&self) -> Option<ManagedObject> {
        self.parent()
    }

    /// The nearest ancestor matching `predicate`.
    pub fn whence_where(
        &self,
        mut predicate: impl FnMut(&ManagedObject) -> bool,
    ) -> Option<ManagedObject> {
        self.ancestors().find(|ancestor| predicate(ancestor))
    }

    /// The nearest ancestor carrying a capability of type `T`.
    pub fn whence_of<T: Any>(&self) -> Option<ManagedObject> {
        self.whence_where(|ancestor| ancestor.capability::<T>().is_some())
    }

    /// Register a hook run once, on the first call to [`unlink`](Self::unlink),
    /// after all children have been unlinked.
    pub fn before_unlink(&self, hook: impl FnOnce(&ManagedObject) + 'static) {
        let mut state = self.cell.state.borrow_mut();
        if state.flags.contains(StateFlags::UNLINKED) {
            tracing::trace!(object = %self.id(), "ignoring unlink hook on unlinked object");
            return;
        }
        state.before_unlink.push(Box::new(hook));
    }

    /// Permanently destroy this object and everything attached to it.
    pub fn unlink(&self) {
        {
            let mut state = self.cell.state.borrow_mut();
            if state.flags.contains(StateFlags::UNLINKED) {
                return;
            }
            state.flags.insert(StateFlags::UNLINKED);
        }

        let children = self.children();
        tracing::debug!(object = %self.id(), children = children.len(), "unlinking");
        for child in &children {
            child.unlink();
        }

        let hooks = std::mem::take(&mut self.cell.state.borrow_mut().before_unlink);
        for hook in hooks {
            hook(self);
        }

        if let Some(detached) = self.detach() {
            detached(self);
        }

        let (children, listeners, streams, observers, emitter) = {
            let mut state = self.cell.state.borrow_mut();
            (
                std::mem::take(&mut state.children),
                std::mem::take(&mut state.listeners),
                std::mem::take(&mut state.streams),
                std::mem::take(&mut state.observers),
                state.emitter.take(),
            )
        };
        for shared in &streams {
            stream::close(shared);
        }
        // Captured closures are dropped here, with no borrow held.
        drop((children, listeners, observers, emitter));
    }

    // ------------------------------------------------------------------------
    // Properties
    // ------------------------------------------------------------------------

    /// Assign a property, notifying observers whose last seen value differs.
    pub fn set(&self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();

        let notify: Vec<ObserverFn> = {
            let mut state = self.cell.state.borrow_mut();
            state.properties.insert(name.clone(), value.clone());
            if state.flags.contains(StateFlags::UNLINKED) {
                return;
            }
            state
                .observers
                .iter_mut()
                .filter_map(|observer| {
                    let slot = observer.properties.iter().position(|p| *p == name)?;
                    if observer.last[slot].as_ref() == Some(&value) {
                        return None;
                    }
                    observer.last[slot] = Some(value.clone());
                    Some(observer.callback.clone())
                })
                .collect()
        };

        for callback in notify {
            settle(
                || ErrorOrigin::Observer {
                    property: name.clone(),
                },
                || callback(self, &name, &value),
            );
        }
    }

    /// The current value of a property.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.cell.state.borrow().properties.get(name).cloned()
    }

    /// Whether a property has ever been assigned.
    pub fn has(&self, name: &str) -> bool {
        self.cell.state.borrow().properties.contains_key(name)
    }

    /// Names of all assigned properties, sorted.
    pub fn property_names(&self) -> Vec<String> {
        self.cell.state.borrow().properties.keys().cloned().collect()
    }

    /// Watch `properties` for changes.
    ///
    /// `callback` receives `(object, property, new_value)` each time one of the
    /// properties is set to a value different from the last one observed.
    /// Values present when observation starts count as already observed.
    pub fn observe<P, F, R>(&self, properties: P, callback: F) -> Result<(), MantleError>
    where
        P: IntoIterator,
        P::Item: Into<String>,
        F: Fn(&ManagedObject, &str, &Value) -> R + 'static,
        R: IntoOutcome,
    {
        let mut state = self.cell.state.borrow_mut();
        if state.flags.contains(StateFlags::UNLINKED) {
            return Err(OperationError::Unlinked.into());
        }
        let properties: Vec<String> = properties.into_iter().map(Into::into).collect();
        let last = properties
            .iter()
            .map(|p| state.properties.get(p).cloned())
            .collect();
        state.observers.push(Observer {
            properties,
            last,
            callback: Rc::new(
                move |object: &ManagedObject, property: &str, value: &Value| {
                    callback(object, property, value).into_outcome()
                },
            ),
        });
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------------

    /// Call `handler` for every event this object emits, until it is unlinked.
    pub fn listen<F, R>(&self, handler: F) -> ListenerId
    where
        F: Fn(&ManagedEvent) -> R + 'static,
        R: IntoOutcome,
    {
        self.listen_with(handler)
    }

    /// Register a [`Listener`] implementation.
    pub fn listen_with(&self, listener: impl Listener) -> ListenerId {
        let mut state = self.cell.state.borrow_mut();
        state.next_listener += 1;
        let id = ListenerId(state.next_listener);
        if state.flags.contains(StateFlags::UNLINKED) {
            tracing::trace!(object = %self.id(), "ignoring listener on unlinked object");
            return id;
        }
        let listener: Rc<dyn Listener> = Rc::new(listener);
        state.listeners.push((id, listener));
        id
    }

    /// Remove a listener; returns whether it was registered.
    pub fn unlisten(&self, id: ListenerId) -> bool {
        let removed = {
            let mut state = self.cell.state.borrow_mut();
            let index = state.listeners.iter().position(|(lid, _)| *lid == id);
            index.map(|i| state.listeners.remove(i))
        };
        removed.is_some()
    }

    /// Subscribe to events as an asynchronous stream.
    ///
    /// Events emitted before the consumer polls are buffered in order. The
    /// stream ends when the object is unlinked; a stream requested from an
    /// unlinked object is already finished.
    pub fn listen_stream(&self) -> EventStream {
        let mut state = self.cell.state.borrow_mut();
        if state.flags.contains(StateFlags::UNLINKED) {
            return EventStream::closed();
        }
        let shared = SharedStream::default();
        state.streams.push(shared.clone());
        EventStream::new(shared)
    }

    /// Emit an event named `name` with an empty payload.
    pub fn emit(&self, name: impl Into<String>) {
        self.emit_event(ManagedEvent::new(name, self));
    }

    /// Emit an event named `name` carrying `data`.
    pub fn emit_with(&self, name: impl Into<String>, data: impl Into<EventData>) {
        self.emit_event(ManagedEvent::with_data(name, self, data));
    }

    /// Emit `event` through this object's emit path, including any layers.
    pub fn emit_event(&self, event: ManagedEvent) {
        let emitter = self.cell.state.borrow().emitter.clone();
        match emitter {
            Some(emitter) => emitter.emit_event(event),
            None => self.dispatch(event),
        }
    }

    /// Deliver `event` to this object's listeners and streams, then propagate
    /// it to the parent relationship. Bypasses emit layers.
    ///
    /// Listener failures are routed to the unhandled-error channel and never
    /// stop delivery to the remaining listeners.
    pub fn dispatch(&self, event: ManagedEvent) {
        let (listeners, streams) = {
            let mut state = self.cell.state.borrow_mut();
            if state.flags.contains(StateFlags::UNLINKED) {
                tracing::trace!(object = %self.id(), event = event.name(), "dropping event from unlinked object");
                return;
            }
            state.streams.retain(|s| !s.borrow().is_closed());
            let listeners: Vec<Rc<dyn Listener>> =
                state.listeners.iter().map(|(_, l)| l.clone()).collect();
            (listeners, state.streams.clone())
        };
        tracing::trace!(
            object = %self.id(),
            event = event.name(),
            listeners = listeners.len(),
            streams = streams.len(),
            "dispatching"
        );

        for listener in listeners {
            settle(
                || ErrorOrigin::Listener {
                    event: event.name().to_owned(),
                },
                || listener.on_event(&event),
            );
        }
        for shared in &streams {
            stream::push(shared, event.clone());
        }

        if !event.is_no_propagation() {
            self.propagate(&event);
        }
    }

    fn propagate(&self, event: &ManagedEvent) {
        let (handler, delegate) = {
            let state = self.cell.state.borrow();
            match state.parent.as_ref() {
                Some(link) => (
                    link.handler.clone(),
                    link.delegate.as_ref().and_then(WeakObject::upgrade),
                ),
                None => return,
            }
        };

        if let Some(handler) = handler {
            settle(
                || ErrorOrigin::AttachHandler {
                    event: event.name().to_owned(),
                },
                || handler(self, event),
            );
        }
        if let Some(delegate) = delegate {
            // Stop once the same delegate shows up again in the chain.
            let seen = event
                .chain()
                .filter_map(ManagedEvent::delegate)
                .any(|previous| previous.ptr_eq(&delegate));
            if seen {
                tracing::warn!(
                    object = %self.id(),
                    delegate = %delegate.id(),
                    event = event.name(),
                    "delegate cycle detected, not re-emitting"
                );
                return;
            }
            let delegated = ManagedEvent::builder(event.name(), event.source())
                .data(event.data().clone())
                .delegate(&delegate)
                .inner(event)
                .build();
            delegate.emit_event(delegated);
        }
    }

    /// Compose an emit layer around the current emit path.
    ///
    /// `wrap` receives the current path (the object's own dispatch if no layer
    /// is installed yet) and returns the layer that replaces it.
    pub fn wrap_emitter(
        &self,
        wrap: impl FnOnce(Rc<dyn Emit>) -> Rc<dyn Emit>,
    ) -> Result<(), MantleError> {
        let inner: Rc<dyn Emit> = {
            let state = self.cell.state.borrow();
            if state.flags.contains(StateFlags::UNLINKED) {
                return Err(OperationError::Unlinked.into());
            }
            match state.emitter.clone() {
                Some(emitter) => emitter,
                None => Rc::new(DirectEmit(self.downgrade())),
            }
        };
        let outer = wrap(inner);
        self.cell.state.borrow_mut().emitter = Some(outer);
        Ok(())
    }

    /// Whether a preset has configured this object.
    pub fn has_preset(&self) -> bool {
        self.flags().contains(StateFlags::PRESET)
    }

    /// Record that a preset configured this object; fails if one already did.
    pub fn claim_preset(&self) -> Result<(), MantleError> {
        let mut state = self.cell.state.borrow_mut();
        if state.flags.contains(StateFlags::UNLINKED) {
            return Err(OperationError::Unlinked.into());
        }
        if state.flags.contains(StateFlags::PRESET) {
            return Err(OperationError::PresetApplied.into());
        }
        state.flags.insert(StateFlags::PRESET);
        Ok(())
    }
}

impl PartialEq for ManagedObject {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for ManagedObject {}

impl Hash for ManagedObject {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.cell.id.hash(state);
    }
}

impl fmt::Debug for ManagedObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("ManagedObject");
        s.field("id", &self.cell.id);
        match self.cell.state.try_borrow() {
            Ok(state) => s
                .field("unlinked", &state.flags.contains(StateFlags::UNLINKED))
                .field("root", &state.flags.contains(StateFlags::ROOT))
                .field("children", &state.children.len())
                .field("listeners", &state.listeners.len())
                .finish(),
            Err(_) => s.finish_non_exhaustive(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_attach_sets_back_reference() {
        let parent = ManagedObject::new();
        let child = ManagedObject::new();
        parent.attach(&child, AttachOptions::new()).unwrap();

        assert!(child.parent().unwrap().ptr_eq(&parent));
        assert_eq!(parent.children(), vec![child.clone()]);
        assert!(child.is_attached());
    }

    #[test]
    fn test_self_attach_rejected() {
        let obj = ManagedObject::new();
        let err = obj.attach(&obj, AttachOptions::new()).unwrap_err();
        assert_eq!(err.operation(), Some(&OperationError::SelfAttach));
    }

    #[test]
    fn test_root_rules() {
        let parent = ManagedObject::new();
        let root = ManagedObject::new();
        root.make_root().unwrap();
        assert!(root.is_root());
        let err = parent.attach(&root, AttachOptions::new()).unwrap_err();
        assert_eq!(err.operation(), Some(&OperationError::AttachRoot));

        let child = ManagedObject::new();
        parent.attach(&child, AttachOptions::new()).unwrap();
        let err = child.make_root().unwrap_err();
        assert_eq!(err.operation(), Some(&OperationError::RootAttached));
    }

    #[test]
    fn test_reattach_same_parent_keeps_position() {
        let parent = ManagedObject::new();
        let a = ManagedObject::new();
        let b = ManagedObject::new();
        let fired = Rc::new(Cell::new(false));
        let flag = fired.clone();
        parent
            .attach(&a, AttachOptions::new().on_detached(move |_| flag.set(true)))
            .unwrap();
        parent.attach(&b, AttachOptions::new()).unwrap();
        parent.attach(&a, AttachOptions::new()).unwrap();

        assert!(!fired.get());
        assert_eq!(parent.children(), vec![a, b]);
    }

    #[test]
    fn test_unlink_hook_runs_once() {
        let obj = ManagedObject::new();
        let count = Rc::new(Cell::new(0));
        let counter = count.clone();
        obj.before_unlink(move |_| counter.set(counter.get() + 1));

        obj.unlink();
        obj.unlink();
        assert!(obj.is_unlinked());
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_listener_removed() {
        let obj = ManagedObject::new();
        let count = Rc::new(Cell::new(0));
        let counter = count.clone();
        let id = obj.listen(move |_| counter.set(counter.get() + 1));

        obj.emit("A");
        assert!(obj.unlisten(id));
        assert!(!obj.unlisten(id));
        obj.emit("B");
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_no_propagation_skips_handler() {
        let parent = ManagedObject::new();
        let child = ManagedObject::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        parent
            .attach(
                &child,
                AttachOptions::new().handler(move |_, event| {
                    sink.borrow_mut().push(event.name().to_owned())
                }),
            )
            .unwrap();

        child.emit_event(ManagedEvent::builder("Quiet", &child).no_propagation().build());
        child.emit("Loud");
        assert_eq!(*seen.borrow(), vec!["Loud".to_string()]);
    }

    #[test]
    fn test_observer_starts_from_current_value() {
        let obj = ManagedObject::new();
        obj.set("x", 1);
        let count = Rc::new(Cell::new(0));
        let counter = count.clone();
        obj.observe(["x"], move |_, _, _| counter.set(counter.get() + 1))
            .unwrap();

        obj.set("x", 1);
        assert_eq!(count.get(), 0);
        obj.set("x", 2);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_wrap_emitter_sees_events() {
        struct Renamer {
            inner: Rc<dyn Emit>,
        }
        impl Emit for Renamer {
            fn emit_event(&self, event: ManagedEvent) {
                let renamed = ManagedEvent::builder("Renamed", event.source())
                    .inner(&event)
                    .build();
                self.inner.emit_event(renamed);
            }
        }

        let obj = ManagedObject::new();
        obj.wrap_emitter(|inner| {
            let layer: Rc<dyn Emit> = Rc::new(Renamer { inner });
            layer
        })
        .unwrap();
        let names = Rc::new(RefCell::new(Vec::new()));
        let sink = names.clone();
        obj.listen(move |event| sink.borrow_mut().push(event.name().to_owned()));

        obj.emit("Click");
        obj.dispatch(ManagedEvent::new("Direct", &obj));
        assert_eq!(*names.borrow(), vec!["Renamed".to_string(), "Direct".to_string()]);
    }

    #[test]
    fn test_claim_preset_once() {
        let obj = ManagedObject::new();
        obj.claim_preset().unwrap();
        let err = obj.claim_preset().unwrap_err();
        assert_eq!(err.operation(), Some(&OperationError::PresetApplied));
    }
}
