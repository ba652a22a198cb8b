use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;
use std::task::{Context, Poll};

use futures_util::future::LocalBoxFuture;
use futures_util::task::noop_waker;

/// Runs `!Send` futures on the current thread's event loop.
pub trait Spawn {
    fn spawn_local(&self, task: LocalBoxFuture<'static, ()>);
}

impl<S: Spawn + ?Sized> Spawn for Rc<S> {
    fn spawn_local(&self, task: LocalBoxFuture<'static, ()>) {
        (**self).spawn_local(task)
    }
}

/// Deterministic single-threaded executor driven by explicit polling.
///
/// Tasks run only inside [`LocalQueue::run_until_stalled`], in spawn order.
/// Wakers are no-ops; a pending task is simply polled again on the next pass.
#[derive(Clone, Default)]
pub struct LocalQueue {
    tasks: Rc<RefCell<Vec<LocalBoxFuture<'static, ()>>>>,
}

impl std::fmt::Debug for LocalQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalQueue")
            .field("pending", &self.len())
            .finish()
    }
}

impl LocalQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tasks.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Polls queued tasks until a full pass completes nothing and spawns nothing.
    ///
    /// Returns the number of tasks that completed.
    pub fn run_until_stalled(&self) -> usize {
        let waker = noop_waker();
        let mut cx = Context::from_waker(&waker);
        let mut completed = 0;

        loop {
            let batch = std::mem::take(&mut *self.tasks.borrow_mut());
            if batch.is_empty() {
                break;
            }

            let mut still_pending = Vec::new();
            let mut progressed = false;
            for mut task in batch {
                match task.as_mut().poll(&mut cx) {
                    Poll::Ready(()) => {
                        completed += 1;
                        progressed = true;
                    }
                    Poll::Pending => still_pending.push(task),
                }
            }

            let mut queue = self.tasks.borrow_mut();
            let spawned_meanwhile = std::mem::take(&mut *queue);
            let spawned_any = !spawned_meanwhile.is_empty();
            queue.extend(still_pending);
            queue.extend(spawned_meanwhile);
            if !progressed && !spawned_any {
                break;
            }
        }

        completed
    }
}

impl Spawn for LocalQueue {
    fn spawn_local(&self, task: LocalBoxFuture<'static, ()>) {
        self.tasks.borrow_mut().push(task);
    }
}
