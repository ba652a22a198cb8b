use std::cell::RefCell;
use std::collections::BTreeMap;
use std::future::Future;
use std::rc::Rc;

use futures_util::FutureExt;
use futures_util::future::{AbortHandle, Abortable};

use crate::spawn::Spawn;

/// Identifies one spawned request. Ids increase monotonically per registry.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(pub u64);

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "req-{}", self.0)
    }
}

/// Cancellable tasks keyed by [`RequestId`].
///
/// Key properties:
/// - A task leaves the registry when it completes or is cancelled.
/// - [`TaskRegistry::cancel_all`] aborts every live task; an aborted task's
///   future is dropped at its next poll and never resumes.
/// - Dropping the registry cancels everything it still tracks.
#[derive(Debug, Default)]
pub struct TaskRegistry {
    next_id: u64,
    live: Rc<RefCell<BTreeMap<RequestId, AbortHandle>>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns the future built by `make` on `spawner` under a fresh id.
    pub fn spawn<S, F, M>(&mut self, spawner: &S, make: M) -> RequestId
    where
        S: Spawn + ?Sized,
        M: FnOnce(RequestId) -> F,
        F: Future<Output = ()> + 'static,
    {
        let id = RequestId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);

        let (handle, registration) = AbortHandle::new_pair();
        self.live.borrow_mut().insert(id, handle);

        let task = Abortable::new(make(id), registration);
        let live = Rc::clone(&self.live);
        spawner.spawn_local(
            async move {
                // Err(Aborted) means cancel() already removed the entry.
                let _ = task.await;
                live.borrow_mut().remove(&id);
            }
            .boxed_local(),
        );
        id
    }

    pub fn len(&self) -> usize {
        self.live.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: RequestId) -> bool {
        self.live.borrow().contains_key(&id)
    }

    pub fn cancel(&mut self, id: RequestId) -> bool {
        match self.live.borrow_mut().remove(&id) {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    /// Aborts every live task and returns their ids in ascending order.
    pub fn cancel_all(&mut self) -> Vec<RequestId> {
        let live = std::mem::take(&mut *self.live.borrow_mut());
        let mut ids = Vec::with_capacity(live.len());
        for (id, handle) in live {
            handle.abort();
            ids.push(id);
        }
        ids
    }
}

impl Drop for TaskRegistry {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

#[cfg(test)]
mod tests {
    use super::{RequestId, TaskRegistry};
    use crate::spawn::LocalQueue;
    use futures_util::future::pending;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn completed_tasks_leave_the_registry() {
        let q = LocalQueue::new();
        let mut reg = TaskRegistry::new();
        let ran = Rc::new(Cell::new(false));
        let ran_in_task = Rc::clone(&ran);
        let id = reg.spawn(&q, move |_| async move { ran_in_task.set(true) });

        assert_eq!(id, RequestId(0));
        assert!(reg.contains(id));
        q.run_until_stalled();
        assert!(ran.get());
        assert!(reg.is_empty());
    }

    #[test]
    fn ids_are_monotonic() {
        let q = LocalQueue::new();
        let mut reg = TaskRegistry::new();
        let a = reg.spawn(&q, |_| async {});
        let b = reg.spawn(&q, |_| async {});
        assert!(a < b);
        assert_eq!(b.to_string(), "req-1");
    }

    #[test]
    fn cancel_all_stops_pending_tasks() {
        let q = LocalQueue::new();
        let mut reg = TaskRegistry::new();
        let resumed = Rc::new(Cell::new(false));
        let resumed_in_task = Rc::clone(&resumed);
        reg.spawn(&q, move |_| async move {
            pending::<()>().await;
            resumed_in_task.set(true);
        });
        reg.spawn(&q, |_| pending::<()>());

        q.run_until_stalled();
        assert_eq!(reg.len(), 2);

        let cancelled = reg.cancel_all();
        assert_eq!(cancelled, vec![RequestId(0), RequestId(1)]);
        assert!(reg.is_empty());

        assert_eq!(q.run_until_stalled(), 2);
        assert!(q.is_empty());
        assert!(!resumed.get());
    }

    #[test]
    fn cancel_single_task() {
        let q = LocalQueue::new();
        let mut reg = TaskRegistry::new();
        let a = reg.spawn(&q, |_| pending::<()>());
        let b = reg.spawn(&q, |_| pending::<()>());
        assert!(reg.cancel(a));
        assert!(!reg.cancel(a));
        q.run_until_stalled();
        assert!(!reg.contains(a));
        assert!(reg.contains(b));
    }
}
