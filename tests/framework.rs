// Framework-level integration runs against the single-flip-flop model: clock
// and edge timing, cooperative locking, bounded waits and the two abnormal
// run outcomes (starvation, watchdog).

use orfifo_tb::prelude::*;

fn run(scenarios: &Scenarios, config: &TbConfig) -> bool {
    run_scenarios(scenarios, || Box::new(DffModel::new()), config)
}

fn config(dir: &str) -> TbConfig {
    TbConfig::with_result_dir(std::env::temp_dir().join(dir))
}

fn check(cond: bool, msg: &str) -> TbResult {
    if cond {
        Ok(Val::None)
    } else {
        Err(Val::String(msg.to_string()))
    }
}

async fn edge_timing(dut: SimObject) -> TbResult {
    let clk = dut.c("CLK");
    Task::fork(utils::clock(clk, 10, "ns"));
    clk.rising_edge().await;
    check(SIM_IF.get_sim_time_steps() == 5, "first rising edge not at 5 ns")?;
    clk.falling_edge().await;
    check(SIM_IF.get_sim_time_steps() == 10, "falling edge not at 10 ns")?;
    utils::clock_cycles(clk, 2).await?;
    check(SIM_IF.get_sim_time_steps() == 25, "two cycles later not at 25 ns")?;
    Ok(Val::None)
}

async fn dff_follows_d(dut: SimObject) -> TbResult {
    let clk = dut.c("CLK");
    let rst_n = dut.c("RST_N");
    let d = dut.c("d");
    let q = dut.c("q");
    Task::fork(utils::clock(clk, 10, "ns"));
    rst_n.set(1);
    d.set(1);
    clk.rising_edge().await;
    check(q.u32() == 1, "q did not follow d=1")?;
    d.set(0);
    clk.rising_edge().await;
    check(q.u32() == 0, "q did not follow d=0")?;
    d.set(1);
    rst_n.set(0);
    clk.rising_edge().await;
    check(q.u32() == 0, "q not cleared under reset")?;
    Ok(Val::None)
}

async fn lock_is_exclusive(dut: SimObject) -> TbResult {
    let clk = dut.c("CLK");
    Task::fork(utils::clock(clk, 10, "ns"));
    let lock = Lock::new();
    let acquired = TbObj::new(false);

    let guard = lock.acquire().await;
    let contender_lock = lock.clone();
    let contender_flag = acquired.clone();
    Task::fork(async move {
        let _g = contender_lock.acquire().await;
        *contender_flag.get_mut() = true;
        Ok(Val::None)
    });

    clk.rising_edge().await;
    check(!*acquired.get(), "contender acquired a held lock")?;
    drop(guard);
    clk.rising_edge().await;
    check(*acquired.get(), "contender not woken after release")?;
    Ok(Val::None)
}

async fn bounded_wait(dut: SimObject) -> TbResult {
    let clk = dut.c("CLK");
    Task::fork(utils::clock(clk, 10, "ns"));

    // a predicate that already holds consumes no simulation time
    let before = SIM_IF.get_sim_time_steps();
    wait_until(|| Trigger::timer(1, "ns"), || true, 5).await?;
    check(
        SIM_IF.get_sim_time_steps() == before,
        "immediate predicate consumed time",
    )?;

    let err = wait_until(|| Trigger::timer(1, "ns"), || false, 3).await;
    match err {
        Err(Val::String(msg)) if msg.contains("timeout") => Ok(Val::None),
        other => Err(Val::String(format!(
            "expected a timeout error, got {:?}",
            other
        ))),
    }
}

async fn starved_scenario(dut: SimObject) -> TbResult {
    // no clock task: this edge can never fire
    dut.c("CLK").rising_edge().await;
    Ok(Val::None)
}

async fn slow_scenario(_dut: SimObject) -> TbResult {
    Trigger::timer(1_000, "ns").await;
    Ok(Val::None)
}

#[test]
fn edge_timing_and_dff_behavior() {
    let scenarios = scenarios!(edge_timing, dff_follows_d);
    assert!(run(&scenarios, &config("orfifo_tb_framework_edges")));
}

#[test]
fn lock_and_bounded_wait() {
    let scenarios = scenarios!(lock_is_exclusive, bounded_wait);
    assert!(run(&scenarios, &config("orfifo_tb_framework_sync")));
}

#[test]
fn starvation_is_reported() {
    let scenarios = scenarios!(starved_scenario);
    assert!(!run(&scenarios, &config("orfifo_tb_framework_starved")));
    let s = scenarios.iter().next().unwrap();
    let result = format!("{:?}", s.get().result);
    assert!(result.contains("stalled"), "unexpected result: {}", result);
}

#[test]
fn watchdog_fails_overlong_scenario() {
    let scenarios = scenarios!(slow_scenario);
    let mut config = config("orfifo_tb_framework_watchdog");
    config.max_sim_time_ns = 100;
    assert!(!run(&scenarios, &config));
    let s = scenarios.iter().next().unwrap();
    assert!(!s.get().passed());
    let result = format!("{:?}", s.get().result);
    assert!(result.contains("timeout"), "unexpected result: {}", result);
}
