//! Cooperative, single-threaded task scheduling.
//!
//! Pending listener outcomes are queued here rather than awaited by the
//! emitter. By default tasks go to a per-thread [`LocalPool`] that the host
//! drains with [`run_until_stalled`] (or [`run`]). A host that already owns a
//! local executor installs its own spawner through
//! [`RuntimeConfig`](crate::RuntimeConfig).

use futures::executor::{LocalPool, LocalSpawner};
use futures::future::LocalBoxFuture;
use futures::task::LocalSpawnExt;
use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;

/// A function that takes ownership of a task and arranges for it to run.
pub type Spawner = Rc<dyn Fn(LocalBoxFuture<'static, ()>)>;

struct ThreadPool {
    pool: RefCell<LocalPool>,
    spawner: LocalSpawner,
}

thread_local! {
    static POOL: ThreadPool = {
        let pool = LocalPool::new();
        let spawner = pool.spawner();
        ThreadPool {
            pool: RefCell::new(pool),
            spawner,
        }
    };
    static CUSTOM_SPAWNER: RefCell<Option<Spawner>> = const { RefCell::new(None) };
}

/// Queue a task on the current thread.
pub fn spawn_local(task: impl Future<Output = ()> + 'static) {
    let custom = CUSTOM_SPAWNER.with(|slot| slot.borrow().clone());
    if let Some(spawner) = custom {
        spawner(Box::pin(task));
        return;
    }
    POOL.with(|thread| {
        if let Err(err) = thread.spawner.spawn_local(task) {
            tracing::error!(error = %err, "failed to queue task");
        }
    });
}

/// Run queued tasks until none of them can make progress.
///
/// Returns `false` without running anything if called from inside a task
/// that the pool is already driving.
pub fn run_until_stalled() -> bool {
    POOL.with(|thread| match thread.pool.try_borrow_mut() {
        Ok(mut pool) => {
            pool.run_until_stalled();
            true
        }
        Err(_) => {
            tracing::warn!("run_until_stalled called re-entrantly; ignoring");
            false
        }
    })
}

/// Run queued tasks until all of them complete.
///
/// Blocks the thread if a task waits on something that never wakes it.
pub fn run() {
    POOL.with(|thread| thread.pool.borrow_mut().run());
}

/// Replace the spawner for the current thread, returning the previous one.
pub fn set_spawner(spawner: Option<Spawner>) -> Option<Spawner> {
    CUSTOM_SPAWNER.with(|slot| std::mem::replace(&mut *slot.borrow_mut(), spawner))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_tasks_wait_for_the_pool() {
        let ran = Rc::new(Cell::new(false));
        let flag = ran.clone();
        spawn_local(async move { flag.set(true) });
        assert!(!ran.get());
        assert!(run_until_stalled());
        assert!(ran.get());
    }

    #[test]
    fn test_custom_spawner_receives_tasks() {
        let queued = Rc::new(RefCell::new(Vec::new()));
        let sink = queued.clone();
        let previous = set_spawner(Some(Rc::new(move |task: LocalBoxFuture<'static, ()>| {
            sink.borrow_mut().push(task)
        })));

        spawn_local(async {});
        assert_eq!(queued.borrow().len(), 1);

        set_spawner(previous);
    }
}
