use futures::future::BoxFuture;
use num_format::{Locale, ToFormattedString};
use std::fmt;

use crate::error::TbResult;
use crate::kernel::{Kernel, KernelConfig, Model};
use crate::signal::SimObject;
use crate::sim_if::TimeUnit;

pub type TestFn = fn(SimObject) -> BoxFuture<'static, TbResult>;

#[derive(Clone)]
pub struct TestCase {
    pub name: String,
    pub generator: TestFn,
}

impl TestCase {
    pub fn new(name: &str, generator: TestFn) -> Self {
        Self {
            name: name.to_string(),
            generator,
        }
    }
}

impl fmt::Debug for TestCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestCase").field("name", &self.name).finish()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TestOutcome {
    pub name: String,
    pub result: TbResult,
    pub wall_secs: f64,
    pub sim_time_steps: u64,
    /// Simulator step of the kernel that ran the test, see `SimIf::get_sim_precision`.
    pub precision: i8,
}

impl TestOutcome {
    pub fn passed(&self) -> bool {
        self.result.is_ok()
    }

    pub fn summary(&self) -> String {
        let result = match &self.result {
            Ok(()) => "passed".to_string(),
            Err(e) => format!("failed ({})", e),
        };
        let unit = TimeUnit::from_exponent(self.precision).map_or("steps", |u| u.as_str());
        let speed = self.sim_time_steps as f64 / self.wall_secs.max(f64::EPSILON);
        format!(
            "TEST {}: Result={}, Time={:.3}s, SimTime={}{}, SimSpeed={:.3}{}/s",
            self.name,
            result,
            self.wall_secs,
            self.sim_time_steps.to_formatted_string(&Locale::en),
            unit,
            speed,
            unit
        )
    }
}

/// Runs every test on a fresh kernel and model, in order.
pub fn run_suite<M, F>(tests: &[TestCase], make_model: F, config: &KernelConfig) -> TbResult<Vec<TestOutcome>>
where
    M: Model + 'static,
    F: Fn() -> M,
{
    let mut outcomes = Vec::with_capacity(tests.len());
    for test in tests {
        let kernel = Kernel::new(make_model(), config.clone())?;
        outcomes.push(kernel.run_test(&test.name, test.generator));
    }
    let passed = outcomes.iter().filter(|o| o.passed()).count();
    log::info!("TOTAL: {} of {} test(s) passed", passed, outcomes.len());
    Ok(outcomes)
}
