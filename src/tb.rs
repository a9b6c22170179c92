use crate::bus::{ReadAddr, WriteAddr};
use crate::config::TbConfig;
use crate::coverage::CoverageDb;
use crate::driver::{InputDriver, OutputDriver};
use crate::executor::Task;
use crate::model::OrFifoModel;
use crate::monitor::{InputMonitor, OutputMonitor};
use crate::obj::TbObj;
use crate::phase::Phase;
use crate::scoreboard::Scoreboard;
use crate::signal::SimObject;
use crate::sim_if::SIM_IF;
use crate::sync::wait_until;
use crate::trigger::Trigger;
use crate::utils;
use crate::value::Val;
use crate::TbResult;

pub const NUM_VECTORS: usize = 50;

// the result reader polls the operand lists with bounded retries
const RESULT_POLL_STEP_NS: u64 = 10;
const RESULT_POLL_BOUND: u64 = 1000;

fn or_fn(a: u32, b: u32) -> u32 {
    a | b
}

/// Declares every coverage point and cross of the OR-peripheral testbench.
pub fn or_fifo_coverage() -> CoverageDb {
    let mut db = CoverageDb::new();
    db.add_point("top.a", &["0", "1"]);
    db.add_point("top.b", &["0", "1"]);
    db.add_point("top.read_address", &["0", "1", "2", "3"]);
    let phase_bins: Vec<&str> = Phase::ALL.iter().map(|p| p.name()).collect();
    db.add_point("top.input.previous", &phase_bins);
    db.add_point("top.input.current", &phase_bins);
    db.add_point("top.output.previous", &phase_bins);
    db.add_point("top.output.current", &phase_bins);
    db.add_cross("top.cross.ab", &["top.a", "top.b"]);
    db.add_cross("top.cross.input", &["top.input.previous", "top.input.current"]);
    db.add_cross("top.cross.output", &["top.output.previous", "top.output.current"]);
    db
}

/// Testbench environment for the OR peripheral: clock, drivers, monitors,
/// scoreboard and coverage. Constructing it forks the clock and monitor
/// tasks.
#[derive(Clone)]
pub struct OrFifoTb {
    pub dut: SimObject,
    pub clk: SimObject,
    rst_n: SimObject,
    pub wdrv: InputDriver,
    pub rdrv: OutputDriver,
    pub scoreboard: TbObj<Scoreboard>,
    pub coverage: TbObj<CoverageDb>,
}

impl OrFifoTb {
    pub fn new(dut: SimObject) -> Self {
        let scoreboard = TbObj::new(Scoreboard::new(or_fn));
        let coverage = TbObj::new(or_fifo_coverage());
        let tb = Self {
            dut,
            clk: dut.c("CLK"),
            rst_n: dut.c("RST_N"),
            wdrv: InputDriver::new(dut),
            rdrv: OutputDriver::new(dut, scoreboard.clone()),
            scoreboard,
            coverage,
        };
        Task::fork(utils::clock(tb.clk, 10, "ns"));
        Task::fork(InputMonitor::new(dut, tb.coverage.clone()).run());
        Task::fork(OutputMonitor::new(dut, tb.coverage.clone()).run());
        tb
    }

    /// Reset sequence: 50 ns idle, 50 ns with RST_N asserted, then one
    /// rising edge before any stimulus so the DUT has seen at least one
    /// clocked reset cycle.
    pub async fn reset(&self) -> TbResult {
        self.rst_n.set(1);
        Trigger::timer(50, "ns").await;
        self.rst_n.set(0);
        Trigger::timer(50, "ns").await;
        self.rst_n.set(1);
        self.clk.rising_edge().await;
        Ok(Val::None)
    }

    /// Issues one read, recording read-address coverage.
    pub async fn read(&self, addr: ReadAddr) -> TbResult {
        self.coverage
            .get_mut()
            .record("top.read_address", &addr.value().to_string());
        self.rdrv.send(addr).await
    }

    /// Diagnostic reads at addresses 0-2.
    pub async fn read_diagnostics(&self) -> TbResult {
        for addr in ReadAddr::DIAGNOSTIC {
            self.read(addr).await?;
        }
        Ok(Val::None)
    }

    pub fn verdict(&self) -> TbResult {
        self.scoreboard.get().result()
    }
}

/// Operand generator: draws random bits, records them for the result reader
/// and commits them to the addressed FIFO.
async fn drive_operand(
    tb: OrFifoTb,
    addr: WriteAddr,
    vals: TbObj<Vec<u32>>,
    n: usize,
) -> TbResult {
    for _ in 0..n {
        let v = utils::rand_int(2);
        vals.get_mut().push(v);
        tb.wdrv.send(addr, v).await?;
        tb.clk.rising_edge().await;
        Trigger::timer(utils::rand_range(1, 100) as u64, "ns").await;
    }
    Ok(Val::None)
}

/// Result reader: for each index, waits (bounded) until both operand
/// generators have committed that index's values, enqueues the expectation
/// and reads the result register back.
async fn read_results(
    tb: OrFifoTb,
    a_vals: TbObj<Vec<u32>>,
    b_vals: TbObj<Vec<u32>>,
    n: usize,
) -> TbResult {
    for idx in 0..n {
        let a_ref = a_vals.clone();
        let b_ref = b_vals.clone();
        wait_until(
            || Trigger::timer(RESULT_POLL_STEP_NS, "ns"),
            move || a_ref.get().len() > idx && b_ref.get().len() > idx,
            RESULT_POLL_BOUND,
        )
        .await?;
        let a = a_vals.get()[idx];
        let b = b_vals.get()[idx];
        let (a_bin, b_bin) = (a.to_string(), b.to_string());
        tb.coverage.with_mut(|mut db| {
            db.record("top.a", &a_bin);
            db.record("top.b", &b_bin);
            db.record_cross("top.cross.ab", &[&a_bin, &b_bin]);
        });
        tb.scoreboard.get_mut().expect(a, b);
        tb.read(ReadAddr::Result).await?;
        tb.clk.rising_edge().await;
        Trigger::timer(utils::rand_range(1, 100) as u64, "ns").await;
    }
    Ok(Val::None)
}

/// Randomized main scenario: reset, priming diagnostic reads, then three
/// concurrent stimulus tasks, then coverage report/export and the verdict.
pub async fn run_random_vectors(dut: SimObject, n: usize) -> TbResult {
    let tb = OrFifoTb::new(dut);
    tb.reset().await?;
    tb.read_diagnostics().await?;

    let a_vals: TbObj<Vec<u32>> = TbObj::new(Vec::new());
    let b_vals: TbObj<Vec<u32>> = TbObj::new(Vec::new());
    let task_a = Task::fork(drive_operand(
        tb.clone(),
        WriteAddr::OperandA,
        a_vals.clone(),
        n,
    ));
    let task_b = Task::fork(drive_operand(
        tb.clone(),
        WriteAddr::OperandB,
        b_vals.clone(),
        n,
    ));
    let task_r = Task::fork(read_results(tb.clone(), a_vals, b_vals, n));
    task_a.await?;
    task_b.await?;
    task_r.await?;

    finish(&tb)
}

fn finish(tb: &OrFifoTb) -> TbResult {
    tb.coverage.get().report();
    let path = TbConfig::from_env().result_dir.join("coverage.xml");
    if let Err(e) = tb.coverage.get().export_xml(&path) {
        return Err(Val::String(format!(
            "could not write {}: {}",
            path.display(),
            e
        )));
    }
    let verdict = tb.verdict();
    if verdict.is_ok() {
        SIM_IF.log("All test vectors passed!");
    }
    verdict
}

pub async fn dut_test(dut: SimObject) -> TbResult {
    run_random_vectors(dut, NUM_VECTORS).await
}

/// Directed vectors with an explicit data check on top of the scoreboard.
pub async fn directed_test(dut: SimObject) -> TbResult {
    let tb = OrFifoTb::new(dut);
    tb.reset().await?;
    for (a, b) in [(1u32, 1u32), (0, 0)] {
        tb.wdrv.send(WriteAddr::OperandA, a).await?;
        tb.wdrv.send(WriteAddr::OperandB, b).await?;
        tb.scoreboard.get_mut().expect(a, b);
        let got = tb.read(ReadAddr::Result).await?;
        if got.i64() as u32 != (a | b) {
            return Err(Val::String(format!(
                "read_data {} for operands ({}, {}), expected {}",
                got.i64(),
                a,
                b,
                a | b
            )));
        }
    }
    finish(&tb)
}

/// Fills the operand-A FIFO to its depth, verifies that the full flag
/// deasserts readiness (backpressure), then drains through the B channel and
/// reads all results back.
pub async fn fifo_fill_test(dut: SimObject) -> TbResult {
    let tb = OrFifoTb::new(dut);
    let depth = OrFifoModel::DEFAULT_DEPTH;
    tb.reset().await?;

    let a_sent: Vec<u32> = (0..depth).map(|i| (i as u32) & 1).collect();
    for &a in &a_sent {
        tb.wdrv.send(WriteAddr::OperandA, a).await?;
    }

    // a fourth write must block: the flag stays deasserted until a drain
    let a_full_n = tb.dut.c("a_full_n");
    let clk = tb.clk;
    match wait_until(
        move || Trigger::rising_edge(clk),
        move || a_full_n.u32() == 1,
        20,
    )
    .await
    {
        Ok(_) => {
            return Err(Val::String(
                "write-ready still asserted with operand-A FIFO full".to_string(),
            ))
        }
        Err(_) => SIM_IF.log("backpressure observed: operand-A channel not ready while full"),
    }

    for &a in &a_sent {
        let b = 1u32;
        tb.scoreboard.get_mut().expect(a, b);
        tb.wdrv.send(WriteAddr::OperandB, b).await?;
        tb.read(ReadAddr::Result).await?;
    }
    tb.read_diagnostics().await?;
    finish(&tb)
}
