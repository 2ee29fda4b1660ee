use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use crate::error::{ConfigError, TbError, TbResult};
use crate::value::LogicVec;

thread_local! {
    static SIM_IF: RefCell<Option<Rc<dyn SimIf>>> = const { RefCell::new(None) };
}

/// Returns the simulator installed on the current thread.
pub fn sim() -> TbResult<Rc<dyn SimIf>> {
    // tasks dropped during thread teardown still try to release their drivers
    SIM_IF
        .try_with(|s| s.borrow().clone())
        .ok()
        .flatten()
        .ok_or(TbError::NoSimulator)
}

/// Installs `sim` as the active simulator of this thread until the guard is dropped.
pub fn install(sim: Rc<dyn SimIf>) -> SimGuard {
    let previous = SIM_IF.with(|s| s.borrow_mut().replace(sim));
    SimGuard { previous }
}

pub struct SimGuard {
    previous: Option<Rc<dyn SimIf>>,
}

impl Drop for SimGuard {
    fn drop(&mut self) {
        let previous = self.previous.take();
        // drop the outgoing simulator after the borrow is released
        let _outgoing = SIM_IF.with(|s| std::mem::replace(&mut *s.borrow_mut(), previous));
    }
}

/// Current simulation time in simulator steps, 0 when no simulator is installed.
pub fn sim_time_steps() -> u64 {
    sim().map(|s| s.get_sim_time_steps()).unwrap_or(0)
}

#[derive(Debug, Hash, Clone, Copy, Eq, PartialEq)]
pub enum SimCallback {
    /// Relative delay when registering; absolute time when fired.
    Time(u64),
    Edge(usize),
    ReadWrite,
    ReadOnly,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ObjectKind {
    Hier,
    Signal(u32),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TimeUnit {
    Fs,
    Ps,
    Ns,
    Us,
    Ms,
    Sec,
}

impl TimeUnit {
    /// Power of ten relative to one second.
    pub fn exponent(self) -> i8 {
        match self {
            TimeUnit::Fs => -15,
            TimeUnit::Ps => -12,
            TimeUnit::Ns => -9,
            TimeUnit::Us => -6,
            TimeUnit::Ms => -3,
            TimeUnit::Sec => 0,
        }
    }

    pub fn from_exponent(exp: i8) -> Option<Self> {
        match exp {
            -15 => Some(TimeUnit::Fs),
            -12 => Some(TimeUnit::Ps),
            -9 => Some(TimeUnit::Ns),
            -6 => Some(TimeUnit::Us),
            -3 => Some(TimeUnit::Ms),
            0 => Some(TimeUnit::Sec),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TimeUnit::Fs => "fs",
            TimeUnit::Ps => "ps",
            TimeUnit::Ns => "ns",
            TimeUnit::Us => "us",
            TimeUnit::Ms => "ms",
            TimeUnit::Sec => "sec",
        }
    }
}

impl FromStr for TimeUnit {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fs" => Ok(TimeUnit::Fs),
            "ps" => Ok(TimeUnit::Ps),
            "ns" => Ok(TimeUnit::Ns),
            "us" => Ok(TimeUnit::Us),
            "ms" => Ok(TimeUnit::Ms),
            "sec" | "s" => Ok(TimeUnit::Sec),
            _ => Err(ConfigError::UnknownTimeUnit(s.to_string())),
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Boundary to the simulation kernel.
///
/// Everything the testbench core knows about the simulated design goes through
/// this trait: handle lookup, value access, time, callbacks and logging.
/// Writes must be visible to subsequent reads immediately.
pub trait SimIf {
    fn get_handle_by_name(&self, name: &str) -> TbResult<usize>;
    fn get_root_handle(&self) -> TbResult<usize>;
    fn get_full_name(&self, handle: usize) -> TbResult<String>;
    fn get_kind(&self, handle: usize) -> TbResult<ObjectKind>;
    fn get_value(&self, handle: usize) -> TbResult<LogicVec>;
    fn set_value(&self, handle: usize, value: LogicVec) -> TbResult<()>;
    /// Grants exclusive write access to a signal. Fails if it is already driven.
    fn claim_driver(&self, handle: usize) -> TbResult<()>;
    fn release_driver(&self, handle: usize);
    fn get_sim_time_steps(&self) -> u64;
    /// Simulator step as a power of ten of seconds, e.g. -12 for 1 ps.
    fn get_sim_precision(&self) -> i8;
    fn register_callback(&self, cb: SimCallback) -> TbResult<usize>;
    fn cancel_callback(&self, cb_hdl: usize) -> TbResult<()>;
    fn log(&self, msg: &str);
    fn log_warn(&self, msg: &str) {
        self.log(msg)
    }
    fn log_error(&self, msg: &str) {
        self.log(msg)
    }

    fn get_sim_steps(&self, time: u64, unit: TimeUnit) -> TbResult<u64> {
        Ok(time_to_steps(time, unit, self.get_sim_precision())?)
    }
}

/// Converts `time` in `unit` to whole simulator steps of precision `10^precision` s.
pub fn time_to_steps(time: u64, unit: TimeUnit, precision: i8) -> Result<u64, ConfigError> {
    let shift = unit.exponent() - precision;
    if shift >= 0 {
        10_u64
            .checked_pow(shift as u32)
            .and_then(|scale| time.checked_mul(scale))
            .ok_or_else(|| ConfigError::TimeOverflow {
                time,
                unit: unit.to_string(),
            })
    } else {
        let div = 10_u64.pow((-shift) as u32);
        if time % div == 0 {
            Ok(time / div)
        } else {
            Err(ConfigError::NonIntegralTime {
                time,
                unit: unit.to_string(),
                precision: precision_name(precision),
            })
        }
    }
}

fn precision_name(precision: i8) -> String {
    match TimeUnit::from_exponent(precision) {
        Some(unit) => format!("1 {}", unit),
        None => format!("1e{} s", precision),
    }
}
