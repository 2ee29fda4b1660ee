use bringup::prelude::*;
use log::Level;
use std::rc::Rc;

struct Run {
    outcome: TestOutcome,
    report: Option<BringUpReport>,
    rising_edges: u32,
    kernel: Rc<Kernel>,
}

async fn count_rising(clk: SimObject, count: Shared<u32>) -> TbResult {
    loop {
        clk.rising_edge().await?;
        count.with_mut(|n| *n += 1);
    }
}

async fn bring_up_and_record(
    dut: SimObject,
    config: BringUpConfig,
    report: Shared<Option<BringUpReport>>,
    rising_edges: Shared<u32>,
) -> TbResult {
    Task::fork(count_rising(dut.c("clk")?, rising_edges));
    let (result, _clock) = bring_up(dut, config).await?;
    // let every waiter of the last edge run before the counter is read
    Trigger::read_only().await?;
    let verdict = result.verdict();
    report.with_mut(|r| *r = Some(result));
    verdict
}

fn run(model: TinyCore, kernel_config: KernelConfig, config: BringUpConfig) -> Run {
    let kernel = Kernel::new(model, kernel_config).unwrap();
    let report = Shared::new(None);
    let rising_edges = Shared::new(0);
    let (r, e) = (report.clone(), rising_edges.clone());
    let outcome = kernel.run_test("bring_up", move |dut| {
        bring_up_and_record(dut, config, r, e).boxed()
    });
    let report = report.snapshot();
    let rising_edges = rising_edges.snapshot();
    Run {
        outcome,
        report,
        rising_edges,
        kernel,
    }
}

fn messages(kernel: &Kernel) -> Vec<String> {
    kernel.messages().into_iter().map(|m| m.message).collect()
}

#[test]
fn scenario_a_outputs_defined_after_reset_and_init() {
    let run = run(TinyCore::new(), KernelConfig::default(), BringUpConfig::default());
    assert_eq!(run.outcome.result, Ok(()));

    let report = run.report.unwrap();
    assert!(report.check.passed());
    let uo_out = report.check.sample("uo_out").unwrap();
    let uio_out = report.check.sample("uio_out").unwrap();
    assert_eq!(uo_out.value.to_u64(), Some(0x04));
    assert_eq!(uio_out.value.to_u64(), Some(0x00));

    // rising edge k of a 20 ns clock is at (k - 1) * 20 ns + 10 ns
    let entered: Vec<(Phase, u64)> = report.phases.iter().map(|r| (r.phase, r.entered_at)).collect();
    assert_eq!(
        entered,
        vec![
            (Phase::PowerUp, 0),
            (Phase::HoldReset, 0),
            (Phase::ReleaseReset, 390_000),
            (Phase::InitWait, 390_000),
            (Phase::Check, 790_000),
            (Phase::Done, 790_000),
        ]
    );
    assert_eq!(report.record(Phase::HoldReset).unwrap().cycles, HOLD_RESET_CYCLES);
    assert_eq!(report.record(Phase::InitWait).unwrap().cycles, INIT_WAIT_CYCLES);
    assert_eq!(run.rising_edges, 40);

    let log = messages(&run.kernel);
    assert!(log.iter().any(|m| m == "uo_out = 0x04"));
    assert!(log.iter().any(|m| m == "uio_out = 0x00"));
    assert!(log.iter().any(|m| m == "Check passed: all outputs defined"));
}

#[test]
fn scenario_b_stopped_clock_hangs_in_init_wait() {
    let kernel_config = KernelConfig {
        // the kernel stops advancing time right after reset release at 390 ns
        halt_at: Some((400, TimeUnit::Ns)),
        ..KernelConfig::default()
    };
    let run = run(TinyCore::new(), kernel_config, BringUpConfig::default());
    assert_eq!(run.outcome.result, Err(TbError::Stalled { time_steps: 390_000 }));
    assert!(run.report.is_none());

    let log = messages(&run.kernel);
    assert!(log.iter().any(|m| m == "Entering init-wait"));
    assert!(!log.iter().any(|m| m == "Entering check"));
    assert_eq!(run.rising_edges, 20);
}

#[test]
fn scenario_c_unknown_output_bit_fails_the_check() {
    let model = TinyCore::new().with_stuck_unknown("uio_out", 3);
    let run = run(model, KernelConfig::default(), BringUpConfig::default());
    assert_eq!(
        run.outcome.result,
        Err(TbError::UndefinedOutputs {
            first: "uio_out".to_string(),
            groups: vec![("uio_out".to_string(), "0000x000".to_string())],
        })
    );

    let report = run.report.unwrap();
    assert!(report.check.sample("uo_out").unwrap().defined);
    assert!(!report.check.sample("uio_out").unwrap().defined);
    assert_eq!(report.phases.last().unwrap().phase, Phase::Done);

    let errors: Vec<String> = run
        .kernel
        .messages()
        .into_iter()
        .filter(|m| m.level == Level::Error)
        .map(|m| m.message)
        .collect();
    assert!(errors.iter().any(|m| m.starts_with("uio_out = 0b0000x000 is undefined")));
    assert!(errors.iter().any(|m| m.contains("Result=failed")));
}

#[test]
fn check_never_precedes_forty_cycles_for_any_period() {
    for period in [2, 10, 20, 34, 1_000] {
        let config = BringUpConfig {
            clock_period: period,
            ..BringUpConfig::default()
        };
        let run = run(TinyCore::new(), KernelConfig::default(), config);
        assert_eq!(run.outcome.result, Ok(()), "period {} ns", period);
        assert_eq!(run.rising_edges, 40, "period {} ns", period);

        let check = run.report.unwrap().record(Phase::Check).unwrap().entered_at;
        let period_ps = period * 1_000;
        assert_eq!(check, 39 * period_ps + period_ps / 2, "period {} ns", period);
    }
}

#[test]
fn rerunning_on_a_fresh_design_is_deterministic() {
    let first = run(TinyCore::new(), KernelConfig::default(), BringUpConfig::default());
    let second = run(TinyCore::new(), KernelConfig::default(), BringUpConfig::default());
    assert_eq!(first.outcome.result, second.outcome.result);
    assert_eq!(first.outcome.sim_time_steps, second.outcome.sim_time_steps);
    assert_eq!(first.report, second.report);
}

#[test]
fn sampling_before_memory_init_completes_fails() {
    let too_early = BringUpConfig {
        init_cycles: 15,
        ..BringUpConfig::default()
    };
    let run_early = run(TinyCore::new(), KernelConfig::default(), too_early);
    assert!(matches!(
        run_early.outcome.result,
        Err(TbError::UndefinedOutputs { ref first, .. }) if first == "uio_out"
    ));

    let just_enough = BringUpConfig {
        init_cycles: 16,
        ..BringUpConfig::default()
    };
    let run_ok = run(TinyCore::new(), KernelConfig::default(), just_enough);
    assert_eq!(run_ok.outcome.result, Ok(()));
}

#[test]
fn wrong_reset_polarity_keeps_the_design_in_reset() {
    // rst_n stays low after "release", so memory initialization never completes
    let config = BringUpConfig {
        reset_polarity: ResetPolarity::ActiveHigh,
        ..BringUpConfig::default()
    };
    let run = run(TinyCore::new(), KernelConfig::default(), config);
    match run.outcome.result {
        Err(TbError::UndefinedOutputs { first, groups }) => {
            assert_eq!(first, "uio_out");
            assert_eq!(groups.len(), 1);
        }
        other => panic!("unexpected result {:?}", other),
    }
    let uo_out = run.report.unwrap().check.sample("uo_out").unwrap().value.to_u64();
    assert_eq!(uo_out, Some(0));
}

#[test]
fn zero_period_is_rejected_before_driving_anything() {
    let config = BringUpConfig {
        clock_period: 0,
        ..BringUpConfig::default()
    };
    let run = run(TinyCore::new(), KernelConfig::default(), config);
    assert_eq!(run.outcome.result, Err(TbError::Config(ConfigError::ZeroPeriod)));
    for port in ["clk", "rst_n", "ena", "ui_in"] {
        assert!(!run.kernel.peek(port).unwrap().is_defined(), "{} was driven", port);
    }
    assert_eq!(run.kernel.now(), 0);
}

#[test]
fn period_shorter_than_two_steps_is_rejected() {
    let kernel_config = KernelConfig {
        precision: TimeUnit::Ns,
        ..KernelConfig::default()
    };
    let config = BringUpConfig {
        clock_period: 1,
        ..BringUpConfig::default()
    };
    let run = run(TinyCore::new(), kernel_config, config);
    assert_eq!(
        run.outcome.result,
        Err(TbError::Config(ConfigError::PeriodTooShort { steps: 1 }))
    );
    assert!(!run.kernel.peek("rst_n").unwrap().is_defined());
}

async fn default_bring_up(dut: SimObject) -> TbResult {
    let (report, _clock) = bring_up(dut, BringUpConfig::default()).await?;
    report.verdict()
}

async fn sample_without_reset(dut: SimObject) -> TbResult {
    let ports = DutPorts::tiny_tapeout(dut)?;
    let _clock = start_clock(ports.clk, 20, TimeUnit::Ns)?;
    clock_cycles(ports.clk, 5).await?;
    let validator = ports
        .outputs
        .iter()
        .fold(OutputValidator::new(), |v, (name, obj)| v.with_group(name, *obj));
    validator.check().map(|_| ())
}

#[test]
fn suite_runs_each_test_on_a_fresh_design() {
    let tests = [
        TestCase::new("default_bring_up", |dut| default_bring_up(dut).boxed()),
        TestCase::new("sample_without_reset", |dut| sample_without_reset(dut).boxed()),
        TestCase::new("default_bring_up_again", |dut| default_bring_up(dut).boxed()),
    ];
    let outcomes = run_suite(&tests, TinyCore::new, &KernelConfig::default()).unwrap();
    let passed: Vec<bool> = outcomes.iter().map(|o| o.passed()).collect();
    assert_eq!(passed, vec![true, false, true]);
    assert_eq!(outcomes[0].sim_time_steps, 790_000);
    assert_eq!(outcomes[2].sim_time_steps, 790_000);
    assert!(outcomes[1].summary().starts_with("TEST sample_without_reset: Result=failed"));
}
