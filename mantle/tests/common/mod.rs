#![allow(dead_code)]

use mantle::{AttachOptions, ManagedEvent, ManagedObject};
use std::cell::RefCell;
use std::rc::Rc;

// ============================================================================
// Capabilities
// ============================================================================

/// Marks an object as a list view.
pub struct ListView {
    pub title: String,
}

/// Marks an object as a row.
pub struct Row {
    pub index: usize,
}

// ============================================================================
// Recorders
// ============================================================================

/// A shared, ordered log of strings.
#[derive(Clone, Default)]
pub struct Log(Rc<RefCell<Vec<String>>>);

impl Log {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.borrow_mut().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }
}

/// Record every event name emitted on `object` into `log`, prefixed with `tag`.
pub fn log_events(object: &ManagedObject, tag: &str, log: &Log) {
    let log = log.clone();
    let tag = tag.to_owned();
    object.listen(move |e: &ManagedEvent| log.push(format!("{tag}:{}", e.name())));
}

/// Attach `child` under `parent` with a handler that logs `parent-tag:event`.
pub fn attach_logged(parent: &ManagedObject, child: &ManagedObject, tag: &str, log: &Log) {
    let log = log.clone();
    let tag = tag.to_owned();
    parent
        .attach(
            child,
            AttachOptions::new().handler(move |_: &ManagedObject, e: &ManagedEvent| {
                log.push(format!("{tag}:{}", e.name()))
            }),
        )
        .unwrap();
}

/// Build a `root -> middle -> leaf` chain.
pub fn chain() -> (ManagedObject, ManagedObject, ManagedObject) {
    let root = ManagedObject::new();
    let middle = ManagedObject::new();
    let leaf = ManagedObject::new();
    root.attach(&middle, AttachOptions::new()).unwrap();
    middle.attach(&leaf, AttachOptions::new()).unwrap();
    (root, middle, leaf)
}
