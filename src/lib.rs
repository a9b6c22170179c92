use lazy_static::lazy_static;
use once_cell::sync::OnceCell;
use prettytable::{Cell, Row, Table};
use std::sync::{Arc, Mutex};

pub mod bus;
pub mod config;
pub mod coverage;
pub mod driver;
pub mod executor;
mod junit;
pub mod kernel;
pub mod model;
pub mod monitor;
pub mod obj;
pub mod phase;
pub mod prelude;
pub mod scoreboard;
pub mod signal;
pub mod sim_if;
pub mod sync;
pub mod tb;
pub mod test;
pub mod trigger;
pub mod utils;
pub mod value;

use crate::config::TbConfig;
use crate::executor::Task;
use crate::model::DutModel;
use crate::obj::TbObjSafe;
use crate::signal::SimObject;
use crate::sim_if::{SimIf, SIM_IF};
use crate::test::{Scenario, Scenarios};
use crate::value::Val;

/// Result type of scenarios and testbench tasks.
pub type TbResult = Result<Val, Val>;
pub type SimpleResult<T> = Result<T, ()>;

/// Test-suite name used in the JUnit report. Set once from the binary.
pub static CRATE_NAME: OnceCell<String> = OnceCell::new();

lazy_static! {
    // The framework statics (signal caches, trigger maps, kernel state) hold
    // one simulation at a time, so runs from concurrent test threads are
    // serialized here.
    static ref RUN_LOCK: Mutex<()> = Mutex::new(());
}
lazy_static! {
    static ref CURRENT_SCENARIO: TbObjSafe<Option<(Arc<Task>, TbObjSafe<Scenario>)>> =
        TbObjSafe::new(None);
}

pub fn pass_test(msg: &str) {
    finish_scenario(Ok(Val::String(msg.to_string())));
}

pub fn fail_test(msg: &str) {
    finish_scenario(Err(Val::String(msg.to_string())));
}

/// Records the result of the running scenario and tears the run down:
/// remaining triggers are cancelled, queued tasks dropped and the root task
/// cancelled. Idempotent; only the first result of a scenario counts.
fn finish_scenario(result: TbResult) {
    let finished = CURRENT_SCENARIO.with_mut(|mut cur| cur.take());
    if let Some((task, scenario)) = finished {
        match &result {
            Ok(v) => SIM_IF.log(&format!("Scenario PASSED. ({:?})", v)),
            Err(v) => SIM_IF.log(&format!("Scenario FAILED: {:?}", v)),
        }
        scenario.with_mut(|mut s| {
            s.sim_time_ns = SIM_IF.get_sim_time("ns");
            s.set_result(result);
        });
        task.cancel();
        trigger::cancel_all_triggers();
        executor::clear_ready_queue();
    }
}

fn scenario_finished() -> bool {
    CURRENT_SCENARIO.get().is_none()
}

/// Runs every scenario against a fresh model instance, prints the summary
/// table and writes the JUnit report. Returns whether all scenarios passed.
pub fn run_scenarios(
    scenarios: &Scenarios,
    model: fn() -> Box<dyn DutModel>,
    config: &TbConfig,
) -> bool {
    let _run = RUN_LOCK.lock().unwrap_or_else(|p| p.into_inner());
    std::fs::create_dir_all(&config.result_dir).ok();

    for scenario in scenarios.iter() {
        let (name, generator) = {
            let s = scenario.get();
            (s.name.clone(), s.generator)
        };
        kernel::init(model(), config.max_sim_time_ns);
        SIM_IF.log(&format!("Starting scenario '{}'", name));

        let wall_start = std::time::Instant::now();
        let join = Task::spawn_from_future(
            async move {
                let root = SimObject::get_root().map_err(|_| {
                    Val::String("no hierarchy root: kernel not initialized".to_string())
                })?;
                finish_scenario(generator(root).await);
                Ok(Val::None)
            },
            &name,
        );
        let task = join
            .get_task()
            .expect("spawned scenario has no task")
            .clone();
        CURRENT_SCENARIO.with_mut(|mut cur| *cur = Some((task, scenario.clone())));

        match kernel::run_sim(scenario_finished) {
            kernel::RunOutcome::Finished => {}
            kernel::RunOutcome::Watchdog => fail_test(&format!(
                "timeout: scenario still running at {} ns",
                config.max_sim_time_ns
            )),
            kernel::RunOutcome::Starved => {
                fail_test("scenario stalled: no pending simulation events")
            }
        }
        scenario.with_mut(|mut s| s.time_secs = wall_start.elapsed().as_secs_f64());
        kernel::log_run_stats();
    }

    print_summary(scenarios);
    junit::create_junit_xml(scenarios, &config.result_dir);
    scenarios.iter().all(|s| s.get().passed())
}

fn print_summary(scenarios: &Scenarios) {
    let mut table = Table::new();
    table.add_row(Row::new(vec![
        Cell::new("scenario"),
        Cell::new("result"),
        Cell::new("sim time [ns]"),
        Cell::new("wall time [s]"),
    ]));
    for s in scenarios.iter() {
        let s = s.get();
        table.add_row(Row::new(vec![
            Cell::new(&s.name),
            Cell::new(if s.passed() { "PASS" } else { "FAIL" }),
            Cell::new(&format!("{:.0}", s.sim_time_ns)),
            Cell::new(&format!("{:.3}", s.time_secs)),
        ]));
    }
    table.printstd();
}
