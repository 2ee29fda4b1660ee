//! Bring-up configuration.
//!
//! The hold and init cycle counts are empirical margins, not derived from the
//! design: reset is held long enough for any plausible internal pipeline or
//! counter to clear, and the post-reset wait covers the design's own start-up
//! (e.g. memory initialization). Tune them per design.

use crate::error::{ConfigError, TbResult};
use crate::sim_if::TimeUnit;

/// Rising edges to hold reset asserted.
pub const HOLD_RESET_CYCLES: u32 = 20;
/// Rising edges to wait after reset release before outputs are trusted.
pub const INIT_WAIT_CYCLES: u32 = 20;
/// 50 MHz.
pub const DEFAULT_CLOCK_PERIOD_NS: u64 = 20;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ResetPolarity {
    /// Reset asserted at 0, e.g. `rst_n`.
    #[default]
    ActiveLow,
    ActiveHigh,
}

impl ResetPolarity {
    pub fn asserted(self) -> u64 {
        match self {
            ResetPolarity::ActiveLow => 0,
            ResetPolarity::ActiveHigh => 1,
        }
    }

    pub fn deasserted(self) -> u64 {
        1 - self.asserted()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BringUpConfig {
    pub clock_period: u64,
    pub time_unit: TimeUnit,
    pub hold_cycles: u32,
    pub init_cycles: u32,
    pub reset_polarity: ResetPolarity,
}

impl Default for BringUpConfig {
    fn default() -> Self {
        Self {
            clock_period: DEFAULT_CLOCK_PERIOD_NS,
            time_unit: TimeUnit::Ns,
            hold_cycles: HOLD_RESET_CYCLES,
            init_cycles: INIT_WAIT_CYCLES,
            reset_polarity: ResetPolarity::ActiveLow,
        }
    }
}

impl BringUpConfig {
    pub fn validate(&self) -> TbResult {
        if self.clock_period == 0 {
            return Err(ConfigError::ZeroPeriod.into());
        }
        Ok(())
    }

    /// Minimum rising edges between power-up and the output check.
    pub fn total_cycles(&self) -> u64 {
        u64::from(self.hold_cycles) + u64::from(self.init_cycles)
    }
}
