use crate::bus::{ReadAddr, ReadBus, WriteAddr, WriteBus};
use crate::obj::TbObj;
use crate::scoreboard::Scoreboard;
use crate::signal::SimObject;
use crate::sim_if::SIM_IF;
use crate::sync::{wait_until, Lock};
use crate::trigger::Trigger;
use crate::utils;
use crate::value::Val;
use crate::TbResult;

// Drivers poll the ready flag indefinitely in spirit, but a hard bound turns
// protocol starvation into an explicit timeout instead of a silent hang.
const READY_BOUND_CYCLES: u64 = 10_000;

/// Active agent on the shared write port. Both operand channels go through
/// one physical port, so assertion through deassertion is serialized behind
/// a lock; the stimulus jitter and the initial ready-wait stay outside of
/// it.
#[derive(Clone)]
pub struct InputDriver {
    bus: WriteBus,
    clk: SimObject,
    port_lock: Lock,
}

impl InputDriver {
    pub fn new(dut: SimObject) -> Self {
        let bus = WriteBus::new(dut);
        bus.write_en.set(0);
        bus.write_address.set(0);
        bus.write_data.set(0);
        Self {
            bus,
            clk: dut.c("CLK"),
            port_lock: Lock::new(),
        }
    }

    /// Issues exactly one write transaction: wait for the addressed channel
    /// to be ready, assert for one rising edge, deassert. Does not return
    /// before the transaction has been accepted.
    pub async fn send(&self, addr: WriteAddr, data: u32) -> TbResult {
        for _ in 0..utils::rand_range(1, 10) {
            self.clk.rising_edge().await;
        }
        let clk = self.clk;
        let full_n = self.bus.full_n(addr);
        // The ready-wait must happen outside the critical section: draining a
        // full operand FIFO requires a write on the other channel, and that
        // writer may be queued on this lock. Re-checked below since another
        // holder can fill the channel between the wait and the acquire.
        wait_until(
            move || Trigger::rising_edge(clk),
            move || full_n.u32() == 1,
            READY_BOUND_CYCLES,
        )
        .await?;
        let _port = self.port_lock.acquire().await;
        wait_until(
            move || Trigger::rising_edge(clk),
            move || full_n.u32() == 1,
            READY_BOUND_CYCLES,
        )
        .await?;
        Trigger::read_write().await;
        self.bus.write_address.set(addr.value());
        self.bus.write_data.set(data & 1);
        self.bus.write_en.set(1);
        self.clk.rising_edge().await;
        Trigger::read_write().await;
        self.bus.write_en.set(0);
        Ok(Val::None)
    }
}

/// Active agent on the read port. Captured data from the result register is
/// forwarded to the scoreboard; diagnostic registers only go to the log.
#[derive(Clone)]
pub struct OutputDriver {
    bus: ReadBus,
    clk: SimObject,
    scoreboard: TbObj<Scoreboard>,
}

impl OutputDriver {
    pub fn new(dut: SimObject, scoreboard: TbObj<Scoreboard>) -> Self {
        let bus = ReadBus::new(dut);
        bus.read_en.set(0);
        bus.read_address.set(0);
        Self {
            bus,
            clk: dut.c("CLK"),
            scoreboard,
        }
    }

    /// Issues one read transaction and returns the captured data. The data
    /// is sampled at the read-only point of the assert cycle, so it reflects
    /// the value present while the transaction was on the bus.
    pub async fn send(&self, addr: ReadAddr) -> TbResult {
        for _ in 0..utils::rand_range(1, 10) {
            self.clk.rising_edge().await;
        }
        if addr == ReadAddr::Result {
            let clk = self.clk;
            let empty_n = self.bus.y_empty_n;
            wait_until(
                move || Trigger::rising_edge(clk),
                move || empty_n.u32() == 1,
                READY_BOUND_CYCLES,
            )
            .await?;
        }
        Trigger::read_write().await;
        self.bus.read_address.set(addr.value());
        self.bus.read_en.set(1);
        Trigger::read_only().await;
        let data = self.bus.read_data.u32();
        if addr == ReadAddr::Result {
            self.scoreboard.get_mut().check(data);
        } else {
            SIM_IF.log(&format!("ADDR={} DATA={}", addr.value(), data));
        }
        self.clk.rising_edge().await;
        Trigger::read_write().await;
        self.bus.read_en.set(0);
        Ok(Val::Int(data as i64))
    }
}
