//! Built-in event-driven simulation kernel.
//!
//! [`Kernel`] implements [`SimIf`] for behavioral [`Model`]s so testbenches can run
//! in-process. One time step proceeds as:
//!
//! 1. timer callbacks due at this time fire and the woken tasks run;
//! 2. delta loop: the model evaluates, changed signals are committed and edge
//!    callbacks fire. Every change of a delta, including the model's response to
//!    a clock edge, is applied before any edge waiter resumes;
//! 3. a pending read-write callback fires, which may start another delta;
//! 4. the read-only callback fires, writes are rejected during it;
//! 5. time advances to the next scheduled timer.
//!
//! When the test task has not finished but nothing is scheduled any more, the
//! run ends with [`TbError::Stalled`].

use futures::future::BoxFuture;
use intmap::IntMap;
use log::Level;
use num_format::{Locale, ToFormattedString};
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;
use std::time::Instant;

use crate::error::{ConfigError, TbError, TbResult};
use crate::executor::{self, Task};
use crate::signal::SimObject;
use crate::sim_if::{self, time_to_steps, ObjectKind, SimCallback, SimIf, TimeUnit};
use crate::testcase::TestOutcome;
use crate::trigger::{self, EdgeKind};
use crate::value::{Logic, LogicVec};

pub const DEFAULT_MAX_DELTAS: u32 = 1_000;

const ROOT_HANDLE: usize = 0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PortDir {
    Input,
    Output,
}

#[derive(Clone, Debug)]
pub struct PortDecl {
    pub name: String,
    pub width: u32,
    pub dir: PortDir,
    /// Value before anything drives the port; all `X` when `None`.
    pub init: Option<LogicVec>,
}

impl PortDecl {
    pub fn input(name: &str, width: u32) -> Self {
        Self {
            name: name.to_string(),
            width,
            dir: PortDir::Input,
            init: None,
        }
    }

    pub fn output(name: &str, width: u32) -> Self {
        Self {
            name: name.to_string(),
            width,
            dir: PortDir::Output,
            init: None,
        }
    }

    pub fn with_init(mut self, init: LogicVec) -> Self {
        self.init = Some(init);
        self
    }
}

/// Behavioral model of a design under test.
///
/// The kernel calls [`eval`](Model::eval) once per delta cycle with the current port
/// values. A model keeps its own state between calls and detects clock edges itself;
/// it must produce the same outputs when evaluated twice with unchanged inputs.
pub trait Model {
    fn ports(&self) -> Vec<PortDecl>;
    fn eval(&mut self, ports: &mut PortBank<'_>);
}

/// A model's view of its ports during one evaluation.
pub struct PortBank<'a> {
    signals: &'a mut [SignalState],
    index: &'a HashMap<String, usize>,
    // rejected writes, logged by the kernel after the evaluation
    warnings: Vec<String>,
}

impl PortBank<'_> {
    pub fn get(&self, port: &str) -> Option<&LogicVec> {
        self.index.get(port).map(|&i| &self.signals[i].value)
    }

    /// Bit 0 of `port`, `X` for an unknown port.
    pub fn bit(&self, port: &str) -> Logic {
        self.get(port).map(|v| v.get(0)).unwrap_or(Logic::X)
    }

    /// Drives an output port. Writes to inputs or with the wrong width are ignored.
    pub fn set(&mut self, port: &str, value: LogicVec) {
        let Some(&i) = self.index.get(port) else {
            self.warnings.push(format!("model drives undeclared port '{}'", port));
            return;
        };
        let signal = &mut self.signals[i];
        if signal.dir != PortDir::Output || signal.width != value.width() {
            self.warnings
                .push(format!("model can't drive '{}' with {:?}", signal.name, value));
            return;
        }
        signal.value = value;
    }
}

#[derive(Clone, Debug)]
pub struct KernelConfig {
    /// Name of the top-level scope; signals are named `<root>.<port>`.
    pub root_name: String,
    /// Length of one simulator step.
    pub precision: TimeUnit,
    /// Simulated-time ceiling for a test run.
    pub time_limit: Option<(u64, TimeUnit)>,
    pub max_deltas: u32,
    /// Fault injection: simulated time never advances to or beyond this point.
    pub halt_at: Option<(u64, TimeUnit)>,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            root_name: "tb".to_string(),
            precision: TimeUnit::Ps,
            time_limit: None,
            max_deltas: DEFAULT_MAX_DELTAS,
            halt_at: None,
        }
    }
}

/// One message handed to the kernel's logging collaborator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogRecord {
    pub time_steps: u64,
    pub level: Level,
    pub message: String,
}

#[derive(Debug)]
struct SignalState {
    name: String,
    width: u32,
    dir: PortDir,
    value: LogicVec,
    // value at the end of the previous delta, for edge detection
    committed: LogicVec,
    driven: bool,
}

struct KernelState {
    now: u64,
    signals: Vec<SignalState>,
    full_names: HashMap<String, usize>,
    port_index: HashMap<String, usize>,
    next_cb: usize,
    callbacks: IntMap<SimCallback>,
    timers: BTreeMap<u64, Vec<usize>>,
    watched: BTreeMap<usize, Vec<usize>>,
    read_write: Option<usize>,
    read_only: Option<usize>,
}

pub struct Kernel {
    root_name: String,
    precision: i8,
    time_limit: Option<u64>,
    halt_at: Option<u64>,
    max_deltas: u32,
    state: RefCell<KernelState>,
    model: RefCell<Box<dyn Model>>,
    in_read_only: Cell<bool>,
    messages: RefCell<Vec<LogRecord>>,
}

impl Kernel {
    pub fn new(model: impl Model + 'static, config: KernelConfig) -> TbResult<Rc<Self>> {
        let precision = config.precision.exponent();
        let to_steps = |t: Option<(u64, TimeUnit)>| {
            t.map(|(time, unit)| time_to_steps(time, unit, precision))
                .transpose()
        };
        let time_limit = to_steps(config.time_limit)?;
        let halt_at = to_steps(config.halt_at)?;

        let mut signals = Vec::new();
        let mut full_names = HashMap::new();
        let mut port_index = HashMap::new();
        for port in model.ports() {
            if port.width == 0 {
                return Err(ConfigError::ZeroWidthPort(port.name).into());
            }
            if port_index.contains_key(&port.name) {
                return Err(ConfigError::DuplicatePort(port.name).into());
            }
            let init = match port.init {
                Some(init) if init.width() == port.width => init,
                _ => LogicVec::new_x(port.width),
            };
            let full_name = format!("{}.{}", config.root_name, port.name);
            port_index.insert(port.name.clone(), signals.len());
            // handle 0 is the root scope
            full_names.insert(full_name.clone(), signals.len() + 1);
            signals.push(SignalState {
                name: full_name,
                width: port.width,
                dir: port.dir,
                committed: init.clone(),
                value: init,
                driven: false,
            });
        }

        Ok(Rc::new(Self {
            root_name: config.root_name,
            precision,
            time_limit,
            halt_at,
            max_deltas: config.max_deltas,
            state: RefCell::new(KernelState {
                now: 0,
                signals,
                full_names,
                port_index,
                next_cb: 1,
                callbacks: IntMap::new(),
                timers: BTreeMap::new(),
                watched: BTreeMap::new(),
                read_write: None,
                read_only: None,
            }),
            model: RefCell::new(Box::new(model)),
            in_read_only: Cell::new(false),
            messages: RefCell::new(Vec::new()),
        }))
    }

    pub fn now(&self) -> u64 {
        self.state.borrow().now
    }

    /// Current value of a port, by port name.
    pub fn peek(&self, port: &str) -> Option<LogicVec> {
        let state = self.state.borrow();
        state
            .port_index
            .get(port)
            .map(|&i| state.signals[i].value.clone())
    }

    /// Every message logged so far, oldest first.
    pub fn messages(&self) -> Vec<LogRecord> {
        self.messages.borrow().clone()
    }

    /// Runs one test coroutine against this kernel until it finishes, stalls or times out.
    pub fn run_test<F>(self: &Rc<Self>, name: &str, generator: F) -> TestOutcome
    where
        F: FnOnce(SimObject) -> BoxFuture<'static, TbResult>,
    {
        let _guard = sim_if::install(self.clone());
        let wall_start = Instant::now();
        let sim_start = self.now();

        self.log(&format!("TEST {} started", name));
        let result = self.execute(name, generator);

        trigger::cancel_all_triggers();
        executor::clear_ready_queue();

        let outcome = TestOutcome {
            name: name.to_string(),
            result,
            wall_secs: wall_start.elapsed().as_secs_f64(),
            sim_time_steps: self.now() - sim_start,
            precision: self.precision,
        };
        match outcome.result {
            Ok(()) => self.log(&outcome.summary()),
            Err(_) => self.log_error(&outcome.summary()),
        }
        outcome
    }

    fn execute<F>(&self, name: &str, generator: F) -> TbResult
    where
        F: FnOnce(SimObject) -> BoxFuture<'static, TbResult>,
    {
        let root = SimObject::get_root()?;
        let mut handle = Task::spawn_from_future(generator(root), name);
        executor::run_once();
        loop {
            self.settle()?;
            self.fire_read_only();
            if let Some(result) = handle.try_result() {
                return result;
            }
            let now = self.now();
            let Some(next) = self.next_timer() else {
                return Err(TbError::Stalled { time_steps: now });
            };
            if self.halt_at.is_some_and(|halt| next >= halt) {
                return Err(TbError::Stalled { time_steps: now });
            }
            if let Some(limit) = self.time_limit.filter(|&limit| next > limit) {
                return Err(TbError::Timeout { limit_steps: limit });
            }
            self.state.borrow_mut().now = next;
            self.fire_timers(next);
        }
    }

    fn next_timer(&self) -> Option<u64> {
        self.state.borrow().timers.keys().next().copied()
    }

    fn fire_timers(&self, time: u64) {
        let due = {
            let mut state = self.state.borrow_mut();
            let ids = state.timers.remove(&time).unwrap_or_default();
            for id in &ids {
                state.callbacks.remove(*id as u64);
            }
            ids
        };
        if !due.is_empty() {
            trigger::react(SimCallback::Time(time));
        }
    }

    fn settle(&self) -> TbResult {
        let mut deltas = 0;
        loop {
            executor::run_once();
            self.eval_model();
            let changes = self.commit_changes();
            if changes.is_empty() {
                let read_write = {
                    let mut state = self.state.borrow_mut();
                    let id = state.read_write.take();
                    if let Some(id) = id {
                        state.callbacks.remove(id as u64);
                    }
                    id
                };
                if read_write.is_none() {
                    return Ok(());
                }
                trigger::react(SimCallback::ReadWrite);
            } else {
                // triggers registered while dispatching wait for the next change
                let watermark = self.state.borrow().next_cb;
                let mark = trigger::registration_mark();
                for (sig, kind) in changes {
                    if self.is_watched(sig, watermark) {
                        trigger::react_edge(sig, kind, mark);
                    }
                }
            }
            deltas += 1;
            if deltas > self.max_deltas {
                return Err(TbError::DeltaLimit {
                    time_steps: self.now(),
                    max_deltas: self.max_deltas,
                });
            }
        }
    }

    fn is_watched(&self, sig: usize, watermark: usize) -> bool {
        self.state
            .borrow()
            .watched
            .get(&sig)
            .is_some_and(|ids| ids.iter().any(|&id| id < watermark))
    }

    fn eval_model(&self) {
        let warnings = {
            let mut guard = self.state.borrow_mut();
            let state = &mut *guard;
            let mut bank = PortBank {
                signals: &mut state.signals,
                index: &state.port_index,
                warnings: Vec::new(),
            };
            self.model.borrow_mut().eval(&mut bank);
            bank.warnings
        };
        for warning in warnings {
            self.record(Level::Warn, &warning);
        }
    }

    /// Commits this delta's changes and returns the changed signals with their edge kind.
    fn commit_changes(&self) -> Vec<(usize, EdgeKind)> {
        let mut state = self.state.borrow_mut();
        let mut changes = Vec::new();
        for (i, signal) in state.signals.iter_mut().enumerate() {
            if signal.value != signal.committed {
                changes.push((i + 1, edge_kind(signal.committed.get(0), signal.value.get(0))));
                signal.committed = signal.value.clone();
            }
        }
        changes
    }

    fn fire_read_only(&self) {
        let read_only = {
            let mut state = self.state.borrow_mut();
            let id = state.read_only.take();
            if let Some(id) = id {
                state.callbacks.remove(id as u64);
            }
            id
        };
        if read_only.is_some() {
            self.in_read_only.set(true);
            trigger::react(SimCallback::ReadOnly);
            self.in_read_only.set(false);
        }
    }

    fn record(&self, level: Level, msg: &str) {
        let time_steps = self.now();
        let unit = TimeUnit::from_exponent(self.precision).map_or("steps", |u| u.as_str());
        log::log!(
            level,
            "{:>14}{} {}",
            time_steps.to_formatted_string(&Locale::en),
            unit,
            msg
        );
        self.messages.borrow_mut().push(LogRecord {
            time_steps,
            level,
            message: msg.to_string(),
        });
    }

    fn signal_index(&self, handle: usize) -> TbResult<usize> {
        if handle == ROOT_HANDLE {
            return Err(TbError::NotASignal(self.root_name.clone()));
        }
        if handle > self.state.borrow().signals.len() {
            return Err(TbError::InvalidHandle(handle));
        }
        Ok(handle - 1)
    }
}

/// Transition of bit 0 from `old` to `new`.
fn edge_kind(old: Logic, new: Logic) -> EdgeKind {
    match new {
        Logic::One if old != Logic::One => EdgeKind::Rising,
        Logic::Zero if old != Logic::Zero => EdgeKind::Falling,
        _ => EdgeKind::Any,
    }
}

impl SimIf for Kernel {
    fn get_handle_by_name(&self, name: &str) -> TbResult<usize> {
        if name == self.root_name {
            return Ok(ROOT_HANDLE);
        }
        self.state
            .borrow()
            .full_names
            .get(name)
            .copied()
            .ok_or_else(|| TbError::UnknownObject(name.to_string()))
    }

    fn get_root_handle(&self) -> TbResult<usize> {
        Ok(ROOT_HANDLE)
    }

    fn get_full_name(&self, handle: usize) -> TbResult<String> {
        if handle == ROOT_HANDLE {
            return Ok(self.root_name.clone());
        }
        let i = self.signal_index(handle)?;
        Ok(self.state.borrow().signals[i].name.clone())
    }

    fn get_kind(&self, handle: usize) -> TbResult<ObjectKind> {
        if handle == ROOT_HANDLE {
            return Ok(ObjectKind::Hier);
        }
        let i = self.signal_index(handle)?;
        Ok(ObjectKind::Signal(self.state.borrow().signals[i].width))
    }

    fn get_value(&self, handle: usize) -> TbResult<LogicVec> {
        let i = self.signal_index(handle)?;
        Ok(self.state.borrow().signals[i].value.clone())
    }

    fn set_value(&self, handle: usize, value: LogicVec) -> TbResult<()> {
        let i = self.signal_index(handle)?;
        let mut state = self.state.borrow_mut();
        let signal = &mut state.signals[i];
        if self.in_read_only.get() {
            return Err(TbError::ReadOnlyPhase(signal.name.clone()));
        }
        if signal.dir != PortDir::Input || !signal.driven {
            return Err(TbError::NotWritable(signal.name.clone()));
        }
        if value.width() != signal.width {
            return Err(TbError::WidthMismatch {
                name: signal.name.clone(),
                expected: signal.width,
                actual: value.width(),
            });
        }
        signal.value = value;
        Ok(())
    }

    fn claim_driver(&self, handle: usize) -> TbResult<()> {
        let i = self.signal_index(handle)?;
        let mut state = self.state.borrow_mut();
        let signal = &mut state.signals[i];
        if signal.dir != PortDir::Input {
            return Err(TbError::NotWritable(signal.name.clone()));
        }
        if signal.driven {
            return Err(TbError::AlreadyDriven(signal.name.clone()));
        }
        signal.driven = true;
        Ok(())
    }

    fn release_driver(&self, handle: usize) {
        if let Ok(i) = self.signal_index(handle) {
            self.state.borrow_mut().signals[i].driven = false;
        }
    }

    fn get_sim_time_steps(&self) -> u64 {
        self.now()
    }

    fn get_sim_precision(&self) -> i8 {
        self.precision
    }

    fn register_callback(&self, cb: SimCallback) -> TbResult<usize> {
        if let SimCallback::Edge(sig) = cb {
            self.signal_index(sig)?;
        }
        let mut state = self.state.borrow_mut();
        let id = state.next_cb;
        state.next_cb += 1;
        let stored = match cb {
            SimCallback::Time(delay) => {
                let abs_time = state.now + delay;
                state.timers.entry(abs_time).or_default().push(id);
                SimCallback::Time(abs_time)
            }
            SimCallback::Edge(sig) => {
                state.watched.entry(sig).or_default().push(id);
                cb
            }
            SimCallback::ReadWrite => {
                state.read_write = Some(id);
                cb
            }
            SimCallback::ReadOnly => {
                state.read_only = Some(id);
                cb
            }
        };
        state.callbacks.insert(id as u64, stored);
        Ok(id)
    }

    fn cancel_callback(&self, cb_hdl: usize) -> TbResult<()> {
        let mut state = self.state.borrow_mut();
        let cb = state
            .callbacks
            .remove(cb_hdl as u64)
            .ok_or(TbError::InvalidHandle(cb_hdl))?;
        match cb {
            SimCallback::Time(abs_time) => {
                if let Some(ids) = state.timers.get_mut(&abs_time) {
                    ids.retain(|&id| id != cb_hdl);
                    if ids.is_empty() {
                        state.timers.remove(&abs_time);
                    }
                }
            }
            SimCallback::Edge(sig) => {
                if let Some(ids) = state.watched.get_mut(&sig) {
                    ids.retain(|&id| id != cb_hdl);
                    if ids.is_empty() {
                        state.watched.remove(&sig);
                    }
                }
            }
            SimCallback::ReadWrite => {
                if state.read_write == Some(cb_hdl) {
                    state.read_write = None;
                }
            }
            SimCallback::ReadOnly => {
                if state.read_only == Some(cb_hdl) {
                    state.read_only = None;
                }
            }
        }
        Ok(())
    }

    fn log(&self, msg: &str) {
        self.record(Level::Info, msg);
    }

    fn log_warn(&self, msg: &str) {
        self.record(Level::Warn, msg);
    }

    fn log_error(&self, msg: &str) {
        self.record(Level::Error, msg);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trigger::Trigger;
    use futures::FutureExt;

    /// Output follows input one rising clock edge later.
    struct Dff {
        prev_clk: Logic,
        q: LogicVec,
    }

    impl Dff {
        fn new() -> Self {
            Dff {
                prev_clk: Logic::X,
                q: LogicVec::new_x(1),
            }
        }
    }

    impl Model for Dff {
        fn ports(&self) -> Vec<PortDecl> {
            vec![
                PortDecl::input("clk", 1),
                PortDecl::input("d", 1),
                PortDecl::output("q", 1),
            ]
        }

        fn eval(&mut self, ports: &mut PortBank<'_>) {
            let clk = ports.bit("clk");
            if edge_kind(self.prev_clk, clk) == EdgeKind::Rising {
                self.q = ports.get("d").cloned().unwrap_or_else(|| LogicVec::new_x(1));
            }
            self.prev_clk = clk;
            ports.set("q", self.q.clone());
        }
    }

    fn kernel() -> Rc<Kernel> {
        Kernel::new(Dff::new(), KernelConfig::default()).unwrap()
    }

    #[test]
    fn edge_kinds_follow_bit_zero() {
        assert_eq!(edge_kind(Logic::Zero, Logic::One), EdgeKind::Rising);
        assert_eq!(edge_kind(Logic::X, Logic::One), EdgeKind::Rising);
        assert_eq!(edge_kind(Logic::One, Logic::Zero), EdgeKind::Falling);
        assert_eq!(edge_kind(Logic::Zero, Logic::Z), EdgeKind::Any);
    }

    #[test]
    fn rejects_bad_port_declarations() {
        struct Bad;
        impl Model for Bad {
            fn ports(&self) -> Vec<PortDecl> {
                vec![PortDecl::input("a", 1), PortDecl::output("a", 2)]
            }
            fn eval(&mut self, _ports: &mut PortBank<'_>) {}
        }
        assert!(matches!(
            Kernel::new(Bad, KernelConfig::default()),
            Err(TbError::Config(ConfigError::DuplicatePort(_)))
        ));
    }

    #[test]
    fn resolves_names_and_widths() {
        let k = kernel();
        assert_eq!(k.get_handle_by_name("tb"), Ok(ROOT_HANDLE));
        let d = k.get_handle_by_name("tb.d").unwrap();
        assert_eq!(k.get_kind(d), Ok(ObjectKind::Signal(1)));
        assert_eq!(k.get_full_name(d).unwrap(), "tb.d");
        assert!(matches!(
            k.get_handle_by_name("tb.nope"),
            Err(TbError::UnknownObject(_))
        ));
        assert_eq!(k.peek("q"), Some(LogicVec::new_x(1)));
    }

    #[test]
    fn writes_require_a_claimed_input() {
        let k = kernel();
        let d = k.get_handle_by_name("tb.d").unwrap();
        let q = k.get_handle_by_name("tb.q").unwrap();
        assert!(matches!(
            k.set_value(d, LogicVec::from_u64(1, 1)),
            Err(TbError::NotWritable(_))
        ));
        assert!(matches!(k.claim_driver(q), Err(TbError::NotWritable(_))));
        k.claim_driver(d).unwrap();
        assert!(matches!(k.claim_driver(d), Err(TbError::AlreadyDriven(_))));
        k.set_value(d, LogicVec::from_u64(1, 1)).unwrap();
        assert_eq!(k.get_value(d), Ok(LogicVec::from_u64(1, 1)));
        k.release_driver(d);
        k.claim_driver(d).unwrap();
    }

    async fn dff_samples_on_rising_edge(dut: SimObject) -> TbResult {
        let clk = dut.c("clk")?.drive()?;
        let d = dut.c("d")?.drive()?;
        let q = dut.c("q")?;
        clk.set(0)?;
        d.set(1)?;
        Trigger::timer(5, TimeUnit::Ns).await?;
        assert_eq!(q.u64()?, None);
        clk.set(1)?;
        dut.c("clk")?.rising_edge().await?;
        // the flop already updated when the edge waiter resumes
        assert_eq!(q.u64()?, Some(1));
        d.set(0)?;
        Trigger::read_only().await?;
        assert_eq!(q.u64()?, Some(1));
        Ok(())
    }

    #[test]
    fn flop_samples_input_on_rising_edge() {
        let k = kernel();
        let outcome = k.run_test("dff", |dut| dff_samples_on_rising_edge(dut).boxed());
        assert_eq!(outcome.result, Ok(()));
        assert_eq!(outcome.sim_time_steps, 5_000);
    }

    async fn write_in_read_only(dut: SimObject) -> TbResult {
        let d = dut.c("d")?.drive()?;
        Trigger::read_only().await?;
        d.set(1)
    }

    #[test]
    fn writes_in_read_only_phase_fail() {
        let k = kernel();
        let outcome = k.run_test("ro", |dut| write_in_read_only(dut).boxed());
        assert!(matches!(outcome.result, Err(TbError::ReadOnlyPhase(_))));
    }

    async fn wait_for_idle_clock(dut: SimObject) -> TbResult {
        dut.c("clk")?.rising_edge().await
    }

    #[test]
    fn nothing_scheduled_is_a_stall() {
        let k = kernel();
        let outcome = k.run_test("stall", |dut| wait_for_idle_clock(dut).boxed());
        assert_eq!(outcome.result, Err(TbError::Stalled { time_steps: 0 }));
    }

    async fn tick_forever(_dut: SimObject) -> TbResult {
        loop {
            Trigger::timer(100, TimeUnit::Ns).await?;
        }
    }

    #[test]
    fn time_limit_ends_the_run() {
        let config = KernelConfig {
            time_limit: Some((1, TimeUnit::Us)),
            ..KernelConfig::default()
        };
        let k = Kernel::new(Dff::new(), config).unwrap();
        let outcome = k.run_test("timeout", |dut| tick_forever(dut).boxed());
        assert_eq!(outcome.result, Err(TbError::Timeout { limit_steps: 1_000_000 }));
        assert_eq!(k.now(), 1_000_000);
    }

    /// Drives its own input, which the kernel refuses.
    struct Rogue;

    impl Model for Rogue {
        fn ports(&self) -> Vec<PortDecl> {
            vec![PortDecl::input("a", 1), PortDecl::output("y", 1)]
        }

        fn eval(&mut self, ports: &mut PortBank<'_>) {
            ports.set("a", LogicVec::from_u64(1, 1));
            ports.set("y", LogicVec::from_u64(0, 1));
        }
    }

    #[test]
    fn rejected_model_writes_are_logged() {
        let k = Kernel::new(Rogue, KernelConfig::default()).unwrap();
        let outcome = k.run_test("rogue", |_| futures::future::ready(Ok(())).boxed());
        assert_eq!(outcome.result, Ok(()));
        assert_eq!(k.peek("a"), Some(LogicVec::new_x(1)));
        assert_eq!(k.peek("y"), Some(LogicVec::from_u64(0, 1)));
        let warnings: Vec<LogRecord> = k
            .messages()
            .into_iter()
            .filter(|m| m.level == Level::Warn)
            .collect();
        assert!(!warnings.is_empty());
        assert!(warnings[0].message.starts_with("model can't drive 'tb.a'"));
    }

    #[test]
    fn test_summary_is_logged() {
        let k = kernel();
        k.run_test("quiet", |_| futures::future::ready(Ok(())).boxed());
        let messages = k.messages();
        assert!(messages[0].message.contains("TEST quiet started"));
        let last = messages.last().unwrap();
        assert_eq!(last.level, Level::Info);
        assert!(last.message.contains("Result=passed"));
    }
}
