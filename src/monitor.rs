use crate::bus::{ReadBus, WriteAddr, WriteBus};
use crate::coverage::CoverageDb;
use crate::obj::TbObj;
use crate::phase::{Phase, PhaseMap};
use crate::signal::SimObject;
use crate::trigger::Trigger;
use crate::value::Val;
use crate::TbResult;

// Monitors never drive the bus. They sample at the read-only point of every
// falling edge, classify the protocol phase and feed the phase-transition
// coverage. They run for the lifetime of the test and are discarded with the
// simulation environment.

#[derive(Clone)]
pub struct InputMonitor {
    bus: WriteBus,
    clk: SimObject,
    phases: PhaseMap,
    coverage: TbObj<CoverageDb>,
}

impl InputMonitor {
    pub fn new(dut: SimObject, coverage: TbObj<CoverageDb>) -> Self {
        Self {
            bus: WriteBus::new(dut),
            clk: dut.c("CLK"),
            phases: PhaseMap::full(),
            coverage,
        }
    }

    #[allow(unreachable_code)]
    pub async fn run(self) -> TbResult {
        let mut prev = Phase::Idle;
        loop {
            self.clk.falling_edge().await;
            Trigger::read_only().await;
            // the ready flag belongs to the currently addressed channel
            let full_n = if self.bus.write_address.u32() == WriteAddr::OperandB.value() {
                self.bus.b_full_n
            } else {
                self.bus.a_full_n
            };
            if let Some(curr) = self.phases.classify(self.bus.write_en.u32(), full_n.u32()) {
                self.coverage.with_mut(|mut db| {
                    db.record("top.input.previous", prev.name());
                    db.record("top.input.current", curr.name());
                    db.record_cross("top.cross.input", &[prev.name(), curr.name()]);
                });
                prev = curr;
            }
        }
        Ok(Val::None)
    }
}

#[derive(Clone)]
pub struct OutputMonitor {
    bus: ReadBus,
    clk: SimObject,
    phases: PhaseMap,
    coverage: TbObj<CoverageDb>,
}

impl OutputMonitor {
    pub fn new(dut: SimObject, coverage: TbObj<CoverageDb>) -> Self {
        Self {
            bus: ReadBus::new(dut),
            clk: dut.c("CLK"),
            phases: PhaseMap::full(),
            coverage,
        }
    }

    #[allow(unreachable_code)]
    pub async fn run(self) -> TbResult {
        let mut prev = Phase::Idle;
        loop {
            self.clk.falling_edge().await;
            Trigger::read_only().await;
            if let Some(curr) = self
                .phases
                .classify(self.bus.read_en.u32(), self.bus.y_empty_n.u32())
            {
                self.coverage.with_mut(|mut db| {
                    db.record("top.output.previous", prev.name());
                    db.record("top.output.current", curr.name());
                    db.record_cross("top.cross.output", &[prev.name(), curr.name()]);
                });
                prev = curr;
            }
        }
        Ok(Val::None)
    }
}
