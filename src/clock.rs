use crate::error::{ConfigError, TbResult};
use crate::executor::{JoinHandle, Task};
use crate::signal::{Driver, SimObject};
use crate::sim_if::{sim, TimeUnit};
use crate::trigger::Trigger;

/// Period and starting level of a clock. Immutable once the clock runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClockSpec {
    period: u64,
    unit: TimeUnit,
    start_high: bool,
}

impl ClockSpec {
    pub fn new(period: u64, unit: TimeUnit) -> TbResult<Self> {
        if period == 0 {
            return Err(ConfigError::ZeroPeriod.into());
        }
        Ok(Self {
            period,
            unit,
            start_high: false,
        })
    }

    /// Start with the high phase instead of the low phase.
    pub fn starting_high(mut self) -> Self {
        self.start_high = true;
        self
    }

    pub fn period(&self) -> u64 {
        self.period
    }

    pub fn unit(&self) -> TimeUnit {
        self.unit
    }

    pub fn start_high(&self) -> bool {
        self.start_high
    }
}

/// Free-running clock on one signal. Owns the signal's [`Driver`].
pub struct Clock {
    driver: Driver,
    spec: ClockSpec,
}

impl Clock {
    pub fn new(driver: Driver, spec: ClockSpec) -> Self {
        Self { driver, spec }
    }

    /// Forks the toggling task. Fails before driving anything if the period can't be
    /// split into two non-empty phases of whole simulator steps.
    pub fn start(self) -> TbResult<RunningClock> {
        let sim = sim()?;
        let period = sim.get_sim_steps(self.spec.period, self.spec.unit)?;
        if period < 2 {
            return Err(ConfigError::PeriodTooShort { steps: period }.into());
        }
        let high = period / 2;
        let low = period - high;
        if period % 2 != 0 {
            sim.log_warn(&format!(
                "Clock period of {} steps not dividable by 2. High time will be {} steps; low time will be {} steps.",
                period, high, low
            ));
        }
        let signal = self.driver.object();
        let spec = self.spec;
        let phases = match spec.start_high {
            false => [(0, low), (1, high)],
            true => [(1, high), (0, low)],
        };
        let handle = Task::spawn_from_future(toggle(self.driver, phases), "clock");
        Ok(RunningClock {
            handle,
            signal,
            spec,
        })
    }
}

async fn toggle(driver: Driver, phases: [(u64, u64); 2]) -> TbResult {
    loop {
        for (level, steps) in phases {
            driver.set(level)?;
            Trigger::timer_steps(steps).await?;
        }
    }
}

pub struct RunningClock {
    handle: JoinHandle,
    signal: SimObject,
    spec: ClockSpec,
}

impl RunningClock {
    pub fn signal(&self) -> SimObject {
        self.signal
    }

    pub fn spec(&self) -> ClockSpec {
        self.spec
    }

    /// Stops toggling and releases the signal, so a new clock can be started on it.
    pub fn stop(self) {
        self.handle.cancel();
    }
}

/// Starts a clock on `signal`, the usual way to kick off a test.
pub fn start_clock(signal: SimObject, period: u64, unit: TimeUnit) -> TbResult<RunningClock> {
    let spec = ClockSpec::new(period, unit)?;
    Clock::new(signal.drive()?, spec).start()
}
