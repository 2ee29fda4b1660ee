use intmap::IntMap;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll, Waker};

use crate::error::TbResult;
use crate::executor;
use crate::signal::SimObject;
use crate::sim_if::{self, SimCallback, TimeUnit};

thread_local! {
    static TRIGGERS: RefCell<TriggerTable> = RefCell::new(TriggerTable::default());
}

struct TriggerTable {
    // key is signal handle
    edges: IntMap<CallbackHandles>,
    // key is absolute callback time
    timers: IntMap<CallbackHandles>,
    read_only: CallbackHandles,
    read_write: CallbackHandles,
    // registration order of waiters, see `registration_mark`
    next_seq: u64,
}

impl Default for TriggerTable {
    fn default() -> Self {
        TriggerTable {
            edges: IntMap::new(),
            timers: IntMap::new(),
            read_only: CallbackHandles::default(),
            read_write: CallbackHandles::default(),
            next_seq: 0,
        }
    }
}

#[derive(Default)]
struct CallbackHandles {
    handle: Option<usize>,
    callbacks: VecDeque<TrigShared>,
}

#[derive(PartialEq, Clone, Copy, Debug)]
pub enum EdgeKind {
    Any,
    Rising,
    Falling,
}

pub(crate) fn cancel_all_triggers() {
    let table = TRIGGERS.with(|t| std::mem::take(&mut *t.borrow_mut()));
    if let Ok(sim) = sim_if::sim() {
        let handles = table
            .edges
            .iter()
            .chain(table.timers.iter())
            .filter_map(|(_, cb)| cb.handle)
            .chain(table.read_only.handle)
            .chain(table.read_write.handle);
        for handle in handles {
            let _ = sim.cancel_callback(handle);
        }
    }
    // wakers are dropped here, releasing the tasks they reference
    drop(table);
}

#[derive(Debug, Clone)]
struct TrigShared {
    waker: Waker,
    fired: Arc<AtomicBool>,
    // the react method needs to know which edge this trigger waits for
    // so an existing callback does not have to be rescheduled.
    edge_kind: EdgeKind,
    seq: u64,
}

impl TrigShared {
    fn fire(self) {
        self.fired.store(true, Ordering::Release);
        self.waker.wake();
    }
}

#[derive(Clone, Copy, Debug)]
enum Delay {
    Steps(u64),
    Time(u64, TimeUnit),
}

#[derive(Clone, Copy, Debug)]
enum TrigKind {
    Edge(usize, EdgeKind),
    Timer(Delay),
    ReadWrite,
    ReadOnly,
}

/// A single suspension point of a testbench task.
///
/// Awaiting a trigger registers a callback with the simulator; the task resumes when
/// the simulator reports the event. Resolves to an error only if the callback can't
/// be registered.
#[derive(Clone, Debug)]
pub struct Trigger {
    kind: TrigKind,
    fired: Option<Arc<AtomicBool>>,
}

impl Trigger {
    fn new(kind: TrigKind) -> Self {
        Trigger { kind, fired: None }
    }
    pub fn timer(time: u64, unit: TimeUnit) -> Self {
        Trigger::new(TrigKind::Timer(Delay::Time(time, unit)))
    }
    pub fn timer_steps(steps: u64) -> Self {
        Trigger::new(TrigKind::Timer(Delay::Steps(steps)))
    }
    pub fn edge(signal: SimObject) -> Self {
        Trigger::new(TrigKind::Edge(signal.handle(), EdgeKind::Any))
    }
    pub fn rising_edge(signal: SimObject) -> Self {
        Trigger::new(TrigKind::Edge(signal.handle(), EdgeKind::Rising))
    }
    pub fn falling_edge(signal: SimObject) -> Self {
        Trigger::new(TrigKind::Edge(signal.handle(), EdgeKind::Falling))
    }
    pub fn read_write() -> Self {
        Trigger::new(TrigKind::ReadWrite)
    }
    pub fn read_only() -> Self {
        Trigger::new(TrigKind::ReadOnly)
    }

    fn register(&self, shared: TrigShared) -> TbResult<bool> {
        let sim = sim_if::sim()?;
        match self.kind {
            TrigKind::Timer(delay) => {
                let steps = match delay {
                    Delay::Steps(steps) => steps,
                    Delay::Time(time, unit) => sim.get_sim_steps(time, unit)?,
                };
                if steps == 0 {
                    return Ok(false);
                }
                // the simulator reports absolute time, not delta
                let abs_time = steps + sim.get_sim_time_steps();
                let appended = TRIGGERS.with(|t| {
                    t.borrow_mut()
                        .timers
                        .get_mut(abs_time)
                        .map(|cbs| cbs.callbacks.push_back(shared.clone()))
                        .is_some()
                });
                if !appended {
                    let handle = sim.register_callback(SimCallback::Time(steps))?;
                    TRIGGERS.with(|t| {
                        t.borrow_mut().timers.insert(abs_time, new_handles(handle, shared));
                    });
                }
            }
            TrigKind::Edge(sig_hdl, _) => {
                let appended = TRIGGERS.with(|t| {
                    t.borrow_mut()
                        .edges
                        .get_mut(sig_hdl as u64)
                        .map(|cbs| cbs.callbacks.push_back(shared.clone()))
                        .is_some()
                });
                if !appended {
                    let handle = sim.register_callback(SimCallback::Edge(sig_hdl))?;
                    TRIGGERS.with(|t| {
                        t.borrow_mut().edges.insert(sig_hdl as u64, new_handles(handle, shared));
                    });
                }
            }
            TrigKind::ReadWrite | TrigKind::ReadOnly => {
                let read_only = matches!(self.kind, TrigKind::ReadOnly);
                let needs_handle = TRIGGERS.with(|t| {
                    let mut t = t.borrow_mut();
                    let cbs = if read_only { &mut t.read_only } else { &mut t.read_write };
                    cbs.callbacks.push_back(shared);
                    cbs.handle.is_none()
                });
                if needs_handle {
                    let cb = if read_only { SimCallback::ReadOnly } else { SimCallback::ReadWrite };
                    let handle = sim.register_callback(cb)?;
                    TRIGGERS.with(|t| {
                        let mut t = t.borrow_mut();
                        let cbs = if read_only { &mut t.read_only } else { &mut t.read_write };
                        cbs.handle = Some(handle);
                    });
                }
            }
        }
        Ok(true)
    }
}

fn new_handles(handle: usize, shared: TrigShared) -> CallbackHandles {
    let mut callbacks = VecDeque::new();
    callbacks.push_back(shared);
    CallbackHandles {
        handle: Some(handle),
        callbacks,
    }
}

impl Future for Trigger {
    type Output = TbResult;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if let Some(fired) = &self.fired {
            // only the simulator callback completes a registered trigger
            return match fired.load(Ordering::Acquire) {
                true => Poll::Ready(Ok(())),
                false => Poll::Pending,
            };
        }
        let fired = Arc::new(AtomicBool::new(false));
        let edge_kind = match self.kind {
            TrigKind::Edge(_, kind) => kind,
            _ => EdgeKind::Any,
        };
        let seq = TRIGGERS.with(|t| {
            let mut t = t.borrow_mut();
            t.next_seq += 1;
            t.next_seq - 1
        });
        let shared = TrigShared {
            waker: cx.waker().clone(),
            fired: fired.clone(),
            edge_kind,
            seq,
        };
        match self.register(shared) {
            Ok(true) => {
                self.fired = Some(fired);
                Poll::Pending
            }
            Ok(false) => Poll::Ready(Ok(())),
            Err(e) => Poll::Ready(Err(e)),
        }
    }
}

/// Sequence number the next registered trigger will get.
///
/// Triggers registered at or after a mark are not woken by edges dispatched with it.
pub(crate) fn registration_mark() -> u64 {
    TRIGGERS.with(|t| t.borrow().next_seq)
}

/// Dispatches a timer, read-write or read-only callback and runs the woken tasks.
pub fn react(cb: SimCallback) {
    let wake: VecDeque<TrigShared> = TRIGGERS.with(|t| {
        let mut t = t.borrow_mut();
        match cb {
            SimCallback::ReadWrite => {
                t.read_write.handle = None;
                std::mem::take(&mut t.read_write.callbacks)
            }
            SimCallback::ReadOnly => {
                t.read_only.handle = None;
                std::mem::take(&mut t.read_only.callbacks)
            }
            SimCallback::Time(abs_time) => t
                .timers
                .remove(abs_time)
                .map(|cbs| cbs.callbacks)
                .unwrap_or_default(),
            SimCallback::Edge(_) => VecDeque::new(),
        }
    });
    fire(wake);
}

/// Dispatches a change of signal `sig_hdl` and runs the woken tasks.
///
/// A rising or falling transition wakes triggers waiting for that edge and for any
/// edge; any other change (to `X` or `Z`) only wakes triggers waiting for any edge.
/// Triggers registered at or after `mark` wait for the next change.
pub fn react_edge(sig_hdl: usize, edge: EdgeKind, mark: u64) {
    let mut cancel = None;
    let wake: VecDeque<TrigShared> = TRIGGERS.with(|t| {
        let mut t = t.borrow_mut();
        let Some(mut cbs) = t.edges.remove(sig_hdl as u64) else {
            return VecDeque::new();
        };
        let (wake, resched): (VecDeque<_>, VecDeque<_>) = cbs.callbacks.drain(..).partition(|trig| {
            trig.seq < mark && (trig.edge_kind == EdgeKind::Any || trig.edge_kind == edge)
        });
        if resched.is_empty() {
            // if no callbacks are remaining, cancel
            cancel = cbs.handle;
        } else {
            cbs.callbacks = resched;
            t.edges.insert(sig_hdl as u64, cbs);
        }
        wake
    });

    if let Some(handle) = cancel {
        if let Ok(sim) = sim_if::sim() {
            let _ = sim.cancel_callback(handle);
        }
    }
    fire(wake);
}

fn fire(wake: VecDeque<TrigShared>) {
    if !wake.is_empty() {
        for shared in wake {
            shared.fire();
        }
        // execute woken tasks
        executor::run_once();
    }
}
