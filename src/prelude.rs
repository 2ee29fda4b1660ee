pub use crate::clock::{start_clock, Clock, ClockSpec, RunningClock};
pub use crate::config::{BringUpConfig, ResetPolarity, HOLD_RESET_CYCLES, INIT_WAIT_CYCLES};
pub use crate::cycles::clock_cycles;
pub use crate::error::{ConfigError, TbError, TbResult};
pub use crate::executor::{JoinHandle, Task};
pub use crate::kernel::{Kernel, KernelConfig, Model, PortBank, PortDecl};
pub use crate::models::TinyCore;
pub use crate::sequencer::{bring_up, BringUp, BringUpReport, DutPorts, Phase};
pub use crate::shared::Shared;
pub use crate::signal::{Driver, SimObject};
pub use crate::sim_if::{sim, sim_time_steps, SimIf, TimeUnit};
pub use crate::testcase::{run_suite, TestCase, TestOutcome};
pub use crate::trigger::Trigger;
pub use crate::validator::{CheckReport, OutputValidator, SampledOutput};
pub use crate::value::{Logic, LogicVec};
pub use futures::future::FutureExt;
