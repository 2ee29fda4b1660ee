//! Cycle-exact clock, reset and bring-up sequencing for HDL testbenches.
//!
//! Testbenches are `async` functions running on a single-threaded cooperative
//! executor. Tasks only suspend on [`Trigger`](trigger::Trigger)s, which the
//! simulation kernel (anything implementing [`SimIf`](sim_if::SimIf)) completes
//! as simulated time advances. On top of that sit a free-running
//! [`Clock`](clock::Clock), [`clock_cycles`](cycles::clock_cycles), the reset
//! [`BringUp`](sequencer::BringUp) sequencer and the
//! [`OutputValidator`](validator::OutputValidator).
//!
//! ```no_run
//! use bringup::prelude::*;
//!
//! async fn test_bring_up(dut: SimObject) -> TbResult {
//!     let (report, _clock) = bring_up(dut, BringUpConfig::default()).await?;
//!     report.verdict()
//! }
//!
//! let kernel = Kernel::new(TinyCore::new(), KernelConfig::default()).unwrap();
//! let outcome = kernel.run_test("test_bring_up", |dut| test_bring_up(dut).boxed());
//! assert!(outcome.passed());
//! ```

pub mod clock;
pub mod config;
pub mod cycles;
pub mod error;
pub mod executor;
pub mod kernel;
pub mod models;
pub mod prelude;
pub mod sequencer;
pub mod shared;
pub mod signal;
pub mod sim_if;
pub mod testcase;
pub mod trigger;
pub mod validator;
pub mod value;

pub use error::{ConfigError, TbError, TbResult};
