use futures::{
    future::{BoxFuture, FutureExt},
    task::{waker_ref, ArcWake, Context, Poll},
};
use futures_channel::oneshot;
use queues::{IsQueue, Queue};
use std::{
    cell::RefCell,
    future::Future,
    pin::Pin,
    sync::{Arc, Mutex},
};

use crate::error::{TbError, TbResult};

thread_local! {
    static READY_QUEUE: RefCell<Queue<Arc<Task>>> = RefCell::new(Queue::new());
}

pub(crate) fn schedule_task(task: Arc<Task>) {
    READY_QUEUE.with(|q| {
        let _ = q.borrow_mut().add(task);
    });
}

fn next_task() -> Option<Arc<Task>> {
    READY_QUEUE.with(|q| q.borrow_mut().remove().ok())
}

/// Polls every ready task until the ready queue is empty.
#[inline]
pub fn run_once() {
    while let Some(task) = next_task() {
        process_task(task);
    }
}

pub(crate) fn clear_ready_queue() {
    let dropped = READY_QUEUE.with(|q| std::mem::replace(&mut *q.borrow_mut(), Queue::new()));
    // tasks may release drivers on drop; do it outside the borrow
    drop(dropped);
}

#[inline]
fn process_task(task: Arc<Task>) {
    if *lock(&task.state) == TaskState::Cancelled {
        // do not execute if state is cancelled, will be dropped once all references disappear
        return;
    }

    let fut = lock(&task.future).take();
    // a task woken more than once per step is queued twice; the second entry finds no future
    let Some(mut fut) = fut else { return };

    let waker = waker_ref(&task);
    let context = &mut Context::from_waker(&waker);
    match fut.as_mut().poll(context) {
        Poll::Pending => {
            if *lock(&task.state) == TaskState::Cancelled {
                // cancelled from within its own poll
                drop(fut);
            } else {
                *lock(&task.future) = Some(fut);
            }
        }
        Poll::Ready(result) => {
            *lock(&task.state) = TaskState::Done;
            if let Some(tx) = lock(&task.join_tx).take() {
                let _ = tx.send(result);
            }
        }
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    // single threaded: a poisoned lock only means a task panicked, its data is still usable
    m.lock().unwrap_or_else(|e| e.into_inner())
}

#[derive(PartialEq, Debug, Clone, Copy)]
enum TaskState {
    Pending,
    Done,
    Cancelled,
}

pub struct Task {
    future: Mutex<Option<BoxFuture<'static, TbResult>>>,
    state: Mutex<TaskState>,
    name: String,
    join_tx: Mutex<Option<oneshot::Sender<TbResult>>>,
}

impl Task {
    /// Runs `future` concurrently with the calling task.
    pub fn fork(future: impl Future<Output = TbResult> + Send + 'static) -> JoinHandle {
        Task::spawn_from_future(future, "forked")
    }

    pub fn spawn_from_future(
        future: impl Future<Output = TbResult> + Send + 'static,
        name: &str,
    ) -> JoinHandle {
        let (task, join_handle) = Task::new(future.boxed(), name);
        schedule_task(task);
        join_handle
    }

    fn new(fut: BoxFuture<'static, TbResult>, name: &str) -> (Arc<Self>, JoinHandle) {
        let (tx, rx) = oneshot::channel::<TbResult>();
        let task = Arc::new(Self {
            future: Mutex::new(Some(fut)),
            state: Mutex::new(TaskState::Pending),
            name: name.to_string(),
            join_tx: Mutex::new(Some(tx)),
        });
        let join_handle = JoinHandle {
            join_rx: rx,
            awaited_task: Some(task.clone()),
        };
        (task, join_handle)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stops the task. Its future is dropped right away unless the task is currently running,
    /// in which case it is dropped when it next suspends.
    pub fn cancel(&self) {
        *lock(&self.state) = TaskState::Cancelled;
        let fut = match self.future.try_lock() {
            Ok(mut slot) => slot.take(),
            Err(_) => None,
        };
        drop(fut);
        // joiners observe the cancellation
        lock(&self.join_tx).take();
    }

    pub fn is_finished(&self) -> bool {
        *lock(&self.state) != TaskState::Pending
    }
}

impl ArcWake for Task {
    fn wake_by_ref(arc_self: &Arc<Self>) {
        schedule_task(arc_self.clone());
    }
}

pub struct JoinHandle {
    awaited_task: Option<Arc<Task>>,
    join_rx: oneshot::Receiver<TbResult>,
}

impl JoinHandle {
    pub fn task(&self) -> Option<&Arc<Task>> {
        self.awaited_task.as_ref()
    }

    pub fn cancel(mut self) {
        // take awaited_task, cancel it and drop its reference
        if let Some(task) = self.awaited_task.take() {
            task.cancel();
        }
    }

    /// Result of the task if it has completed, without waiting.
    pub fn try_result(&mut self) -> Option<TbResult> {
        match self.join_rx.try_recv() {
            Ok(Some(result)) => Some(result),
            Ok(None) => None,
            Err(_) => Some(Err(TbError::TaskCancelled)),
        }
    }
}

impl Future for JoinHandle {
    type Output = TbResult;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match self.join_rx.poll_unpin(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(_)) => Poll::Ready(Err(TbError::TaskCancelled)),
            Poll::Pending => Poll::Pending,
        }
    }
}
