//! Reset and initialization sequencing.
//!
//! [`BringUp`] walks a design through a fixed, non-repeating phase sequence:
//!
//! | phase         | on entry                                   | leaves after              |
//! |---------------|--------------------------------------------|---------------------------|
//! | power-up      | enable = 1, data inputs = 0, reset asserted | immediately               |
//! | hold-reset    | -                                          | `hold_cycles` rising edges |
//! | release-reset | reset deasserted                           | immediately               |
//! | init-wait     | -                                          | `init_cycles` rising edges |
//! | check         | outputs sampled and validated              | immediately, to done      |
//!
//! Outputs are never read before `check`. If the clock stops, the sequencer waits
//! forever; the kernel is responsible for reporting the stall.

use std::fmt;

use crate::clock::{start_clock, RunningClock};
use crate::config::BringUpConfig;
use crate::cycles::clock_cycles;
use crate::error::TbResult;
use crate::signal::{Driver, SimObject};
use crate::sim_if::sim;
use crate::validator::{CheckReport, OutputValidator};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    PowerUp,
    HoldReset,
    ReleaseReset,
    InitWait,
    Check,
    Done,
}

impl Phase {
    pub fn name(self) -> &'static str {
        match self {
            Phase::PowerUp => "power-up",
            Phase::HoldReset => "hold-reset",
            Phase::ReleaseReset => "release-reset",
            Phase::InitWait => "init-wait",
            Phase::Check => "check",
            Phase::Done => "done",
        }
    }

    pub fn next(self) -> Option<Phase> {
        match self {
            Phase::PowerUp => Some(Phase::HoldReset),
            Phase::HoldReset => Some(Phase::ReleaseReset),
            Phase::ReleaseReset => Some(Phase::InitWait),
            Phase::InitWait => Some(Phase::Check),
            Phase::Check => Some(Phase::Done),
            Phase::Done => None,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Signal assignment applied when a phase is entered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Assignment {
    Enable,
    ClearInputs,
    AssertReset,
    DeassertReset,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PhaseStep {
    pub phase: Phase,
    pub assignments: Vec<Assignment>,
    pub wait_cycles: u32,
}

/// When a phase was entered, in simulator steps, and how many cycles it waited.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PhaseRecord {
    pub phase: Phase,
    pub entered_at: u64,
    pub cycles: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BringUpReport {
    pub phases: Vec<PhaseRecord>,
    pub check: CheckReport,
}

impl BringUpReport {
    pub fn record(&self, phase: Phase) -> Option<&PhaseRecord> {
        self.phases.iter().find(|r| r.phase == phase)
    }

    /// `Ok` iff every sampled output group was defined.
    pub fn verdict(&self) -> TbResult {
        self.check.verdict()
    }
}

/// The design's pins as seen by the sequencer.
#[derive(Clone, Debug)]
pub struct DutPorts {
    pub clk: SimObject,
    pub reset: SimObject,
    pub enable: SimObject,
    pub inputs: Vec<SimObject>,
    pub outputs: Vec<(String, SimObject)>,
}

impl DutPorts {
    /// Tiny Tapeout pinout: `clk`, `rst_n`, `ena`, inputs `ui_in`/`uio_in`,
    /// checked outputs `uo_out`/`uio_out`.
    pub fn tiny_tapeout(dut: SimObject) -> TbResult<Self> {
        Ok(Self {
            clk: dut.c("clk")?,
            reset: dut.c("rst_n")?,
            enable: dut.c("ena")?,
            inputs: vec![dut.c("ui_in")?, dut.c("uio_in")?],
            outputs: vec![
                ("uo_out".to_string(), dut.c("uo_out")?),
                ("uio_out".to_string(), dut.c("uio_out")?),
            ],
        })
    }
}

pub struct BringUp {
    clk: SimObject,
    reset: Driver,
    enable: Driver,
    inputs: Vec<Driver>,
    validator: OutputValidator,
    config: BringUpConfig,
}

impl BringUp {
    /// Validates `config` and claims the reset, enable and data input drivers.
    /// Nothing is driven until [`run`](Self::run).
    pub fn new(ports: DutPorts, config: BringUpConfig) -> TbResult<Self> {
        config.validate()?;
        let validator = ports
            .outputs
            .iter()
            .fold(OutputValidator::new(), |v, (name, obj)| v.with_group(name, *obj));
        Ok(Self {
            clk: ports.clk,
            reset: ports.reset.drive()?,
            enable: ports.enable.drive()?,
            inputs: ports
                .inputs
                .into_iter()
                .map(SimObject::drive)
                .collect::<TbResult<_>>()?,
            validator,
            config,
        })
    }

    pub fn plan(&self) -> Vec<PhaseStep> {
        let step = |phase, assignments: &[Assignment], wait_cycles| PhaseStep {
            phase,
            assignments: assignments.to_vec(),
            wait_cycles,
        };
        vec![
            step(
                Phase::PowerUp,
                &[Assignment::Enable, Assignment::ClearInputs, Assignment::AssertReset],
                0,
            ),
            step(Phase::HoldReset, &[], self.config.hold_cycles),
            step(Phase::ReleaseReset, &[Assignment::DeassertReset], 0),
            step(Phase::InitWait, &[], self.config.init_cycles),
            step(Phase::Check, &[], 0),
        ]
    }

    fn apply(&self, assignment: Assignment) -> TbResult {
        let polarity = self.config.reset_polarity;
        match assignment {
            Assignment::Enable => self.enable.set(1),
            Assignment::ClearInputs => self.inputs.iter().try_for_each(|input| input.set(0)),
            Assignment::AssertReset => self.reset.set(polarity.asserted()),
            Assignment::DeassertReset => self.reset.set(polarity.deasserted()),
        }
    }

    /// Runs every phase in order. An undefined output does not fail the run; it is
    /// logged as an error and reflected in [`BringUpReport::verdict`].
    pub async fn run(self) -> TbResult<BringUpReport> {
        let mut phases = Vec::new();
        let mut check = CheckReport::default();
        for step in self.plan() {
            {
                let sim = sim()?;
                sim.log(&format!("Entering {}", step.phase));
                phases.push(PhaseRecord {
                    phase: step.phase,
                    entered_at: sim.get_sim_time_steps(),
                    cycles: step.wait_cycles,
                });
            }
            for assignment in &step.assignments {
                self.apply(*assignment)?;
            }
            if step.phase == Phase::Check {
                check = self.validator.sample()?;
            }
            clock_cycles(self.clk, step.wait_cycles).await?;
        }

        let sim = sim()?;
        match check.passed() {
            true => sim.log("Check passed: all outputs defined"),
            false => sim.log_error("Check failed: undefined outputs after initialization"),
        }
        phases.push(PhaseRecord {
            phase: Phase::Done,
            entered_at: sim.get_sim_time_steps(),
            cycles: 0,
        });
        Ok(BringUpReport { phases, check })
    }
}

/// Starts the clock and brings a Tiny Tapeout style design out of reset.
///
/// Configuration errors are reported before any signal is driven. The clock keeps
/// running after this returns.
pub async fn bring_up(dut: SimObject, config: BringUpConfig) -> TbResult<(BringUpReport, RunningClock)> {
    let ports = DutPorts::tiny_tapeout(dut)?;
    let sequencer = BringUp::new(ports.clone(), config.clone())?;
    let clock = start_clock(ports.clk, config.clock_period, config.time_unit)?;
    let report = sequencer.run().await?;
    Ok((report, clock))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phases_advance_without_repeating() {
        let mut order = vec![Phase::PowerUp];
        while let Some(next) = order.last().and_then(|p| p.next()) {
            order.push(next);
        }
        let names: Vec<&str> = order.iter().map(|p| p.name()).collect();
        assert_eq!(
            names,
            ["power-up", "hold-reset", "release-reset", "init-wait", "check", "done"]
        );
        assert!(order.windows(2).all(|w| w[0] < w[1]));
    }
}
