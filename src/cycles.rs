use crate::error::TbResult;
use crate::signal::SimObject;

/// Suspends the calling task until `n_cycles` rising edges of `clk` have occurred.
///
/// Edges are counted as they happen; any number of tasks may wait on the same clock.
/// Waiting for 0 cycles returns without suspending.
pub async fn clock_cycles(clk: SimObject, n_cycles: u32) -> TbResult {
    for _ in 0..n_cycles {
        clk.rising_edge().await?;
    }
    Ok(())
}
