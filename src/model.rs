use crate::kernel::{PortDef, SigTable};
use std::collections::VecDeque;

/// A behavioral device model hosted by the simulation kernel. `eval` is
/// called until the signal table is stable within a timestep; clocked state
/// advances when the model detects a rising edge on its clock port.
pub trait DutModel: Send {
    /// Name of the hierarchy root, e.g. `"top"`.
    fn name(&self) -> &'static str;
    /// Port declarations. A port's handle is its index in this slice.
    fn ports(&self) -> &'static [PortDef];
    fn eval(&mut self, sig: &mut SigTable);
}

// port indices of OrFifoModel, in declaration order
const CLK: usize = 0;
const RST_N: usize = 1;
const WRITE_EN: usize = 2;
const WRITE_ADDRESS: usize = 3;
const WRITE_DATA: usize = 4;
const A_FULL_N: usize = 5;
const B_FULL_N: usize = 6;
const READ_EN: usize = 7;
const READ_ADDRESS: usize = 8;
const READ_DATA: usize = 9;
const Y_EMPTY_N: usize = 10;

static OR_FIFO_PORTS: [PortDef; 11] = [
    PortDef { name: "CLK", width: 1 },
    PortDef { name: "RST_N", width: 1 },
    PortDef { name: "write_en", width: 1 },
    PortDef { name: "write_address", width: 3 },
    PortDef { name: "write_data", width: 1 },
    PortDef { name: "a_full_n", width: 1 },
    PortDef { name: "b_full_n", width: 1 },
    PortDef { name: "read_en", width: 1 },
    PortDef { name: "read_address", width: 2 },
    PortDef { name: "read_data", width: 8 },
    PortDef { name: "y_empty_n", width: 1 },
];

/// Memory-mapped OR peripheral: two operand FIFOs fed through a shared,
/// address-selected write port, a result FIFO read back at address 3, and
/// occupancy diagnostics at addresses 0-2. Whenever both operand FIFOs hold
/// data and the result FIFO has room, one element is popped from each and
/// `a | b` is pushed into the result FIFO.
pub struct OrFifoModel {
    depth: usize,
    prev_clk: u32,
    fifo_a: VecDeque<u32>,
    fifo_b: VecDeque<u32>,
    fifo_y: VecDeque<u32>,
}

impl OrFifoModel {
    pub const DEFAULT_DEPTH: usize = 3;

    pub fn new(depth: usize) -> Self {
        Self {
            depth,
            prev_clk: 0,
            fifo_a: VecDeque::new(),
            fifo_b: VecDeque::new(),
            fifo_y: VecDeque::new(),
        }
    }
}

impl Default for OrFifoModel {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DEPTH)
    }
}

impl DutModel for OrFifoModel {
    fn name(&self) -> &'static str {
        "top"
    }
    fn ports(&self) -> &'static [PortDef] {
        &OR_FIFO_PORTS
    }
    fn eval(&mut self, sig: &mut SigTable) {
        let clk = sig.get(CLK);
        if self.prev_clk == 0 && clk == 1 {
            if sig.get(RST_N) == 0 {
                // active-low reset, sampled at the rising edge
                self.fifo_a.clear();
                self.fifo_b.clear();
                self.fifo_y.clear();
            } else {
                if sig.get(WRITE_EN) == 1 {
                    match sig.get(WRITE_ADDRESS) {
                        4 => {
                            if self.fifo_a.len() < self.depth {
                                self.fifo_a.push_back(sig.get(WRITE_DATA));
                            }
                        }
                        5 => {
                            if self.fifo_b.len() < self.depth {
                                self.fifo_b.push_back(sig.get(WRITE_DATA));
                            }
                        }
                        _ => {}
                    }
                }
                if sig.get(READ_EN) == 1 && sig.get(READ_ADDRESS) == 3 {
                    self.fifo_y.pop_front();
                }
                if !self.fifo_a.is_empty()
                    && !self.fifo_b.is_empty()
                    && self.fifo_y.len() < self.depth
                {
                    let a = self.fifo_a.pop_front().unwrap();
                    let b = self.fifo_b.pop_front().unwrap();
                    self.fifo_y.push_back(a | b);
                }
            }
        }
        self.prev_clk = clk;

        // combinational outputs
        sig.set(A_FULL_N, (self.fifo_a.len() < self.depth) as u32);
        sig.set(B_FULL_N, (self.fifo_b.len() < self.depth) as u32);
        sig.set(Y_EMPTY_N, (!self.fifo_y.is_empty()) as u32);
        let read_data = match sig.get(READ_ADDRESS) {
            0 => self.fifo_a.len() as u32,
            1 => self.fifo_b.len() as u32,
            2 => self.fifo_y.len() as u32,
            _ => self.fifo_y.front().copied().unwrap_or(0),
        };
        sig.set(READ_DATA, read_data);
    }
}

// port indices of DffModel
const DFF_CLK: usize = 0;
const DFF_RST_N: usize = 1;
const DFF_D: usize = 2;
const DFF_Q: usize = 3;

static DFF_PORTS: [PortDef; 4] = [
    PortDef { name: "CLK", width: 1 },
    PortDef { name: "RST_N", width: 1 },
    PortDef { name: "d", width: 1 },
    PortDef { name: "q", width: 1 },
];

/// Single d-flip-flop with synchronous active-low reset. Used by the
/// framework integration tests.
pub struct DffModel {
    prev_clk: u32,
}

impl DffModel {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self { prev_clk: 0 }
    }
}

impl DutModel for DffModel {
    fn name(&self) -> &'static str {
        "top"
    }
    fn ports(&self) -> &'static [PortDef] {
        &DFF_PORTS
    }
    fn eval(&mut self, sig: &mut SigTable) {
        let clk = sig.get(DFF_CLK);
        if self.prev_clk == 0 && clk == 1 {
            let q = if sig.get(DFF_RST_N) == 0 { 0 } else { sig.get(DFF_D) };
            sig.set(DFF_Q, q);
        }
        self.prev_clk = clk;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tick(model: &mut OrFifoModel, sig: &mut SigTable) {
        sig.set(CLK, 1);
        model.eval(sig);
        sig.set(CLK, 0);
        model.eval(sig);
    }

    fn write(model: &mut OrFifoModel, sig: &mut SigTable, addr: u32, data: u32) {
        sig.set(WRITE_ADDRESS, addr);
        sig.set(WRITE_DATA, data);
        sig.set(WRITE_EN, 1);
        tick(model, sig);
        sig.set(WRITE_EN, 0);
    }

    fn setup() -> (OrFifoModel, SigTable) {
        let mut model = OrFifoModel::new(3);
        let mut sig = SigTable::new(model.ports());
        sig.set(RST_N, 1);
        model.eval(&mut sig);
        (model, sig)
    }

    #[test]
    fn computes_or_with_one_cycle_latency() {
        let (mut model, mut sig) = setup();
        write(&mut model, &mut sig, 4, 1);
        assert_eq!(sig.get(Y_EMPTY_N), 0);
        write(&mut model, &mut sig, 5, 0);
        // pair popped and result pushed at the write edge of the b operand
        assert_eq!(sig.get(Y_EMPTY_N), 1);
        sig.set(READ_ADDRESS, 3);
        model.eval(&mut sig);
        assert_eq!(sig.get(READ_DATA), 1);
    }

    #[test]
    fn read_pops_result_fifo() {
        let (mut model, mut sig) = setup();
        write(&mut model, &mut sig, 4, 0);
        write(&mut model, &mut sig, 5, 0);
        sig.set(READ_ADDRESS, 3);
        sig.set(READ_EN, 1);
        tick(&mut model, &mut sig);
        sig.set(READ_EN, 0);
        assert_eq!(sig.get(Y_EMPTY_N), 0);
    }

    #[test]
    fn full_operand_fifo_deasserts_ready_and_drops_writes() {
        let (mut model, mut sig) = setup();
        for _ in 0..3 {
            write(&mut model, &mut sig, 4, 1);
        }
        assert_eq!(sig.get(A_FULL_N), 0);
        assert_eq!(sig.get(B_FULL_N), 1);
        // a write against the full FIFO is not committed
        write(&mut model, &mut sig, 4, 0);
        sig.set(READ_ADDRESS, 0);
        model.eval(&mut sig);
        assert_eq!(sig.get(READ_DATA), 3);
    }

    #[test]
    fn occupancy_diagnostics() {
        let (mut model, mut sig) = setup();
        write(&mut model, &mut sig, 4, 1);
        write(&mut model, &mut sig, 4, 0);
        sig.set(READ_ADDRESS, 0);
        model.eval(&mut sig);
        assert_eq!(sig.get(READ_DATA), 2);
        sig.set(READ_ADDRESS, 1);
        model.eval(&mut sig);
        assert_eq!(sig.get(READ_DATA), 0);
        sig.set(READ_ADDRESS, 2);
        model.eval(&mut sig);
        assert_eq!(sig.get(READ_DATA), 0);
    }

    #[test]
    fn reset_clears_all_fifos() {
        let (mut model, mut sig) = setup();
        write(&mut model, &mut sig, 4, 1);
        write(&mut model, &mut sig, 5, 1);
        assert_eq!(sig.get(Y_EMPTY_N), 1);
        sig.set(RST_N, 0);
        tick(&mut model, &mut sig);
        sig.set(RST_N, 1);
        assert_eq!(sig.get(Y_EMPTY_N), 0);
        sig.set(READ_ADDRESS, 0);
        model.eval(&mut sig);
        assert_eq!(sig.get(READ_DATA), 0);
    }

    #[test]
    fn results_preserve_submission_order() {
        let (mut model, mut sig) = setup();
        write(&mut model, &mut sig, 4, 0);
        write(&mut model, &mut sig, 5, 0);
        write(&mut model, &mut sig, 4, 1);
        write(&mut model, &mut sig, 5, 0);
        sig.set(READ_ADDRESS, 3);
        model.eval(&mut sig);
        assert_eq!(sig.get(READ_DATA), 0);
        sig.set(READ_EN, 1);
        tick(&mut model, &mut sig);
        sig.set(READ_EN, 0);
        model.eval(&mut sig);
        assert_eq!(sig.get(READ_DATA), 1);
    }

    #[test]
    fn dff_follows_d_on_rising_edge() {
        let mut model = DffModel::new();
        let mut sig = SigTable::new(model.ports());
        sig.set(DFF_RST_N, 1);
        sig.set(DFF_D, 1);
        model.eval(&mut sig);
        assert_eq!(sig.get(DFF_Q), 0);
        sig.set(DFF_CLK, 1);
        model.eval(&mut sig);
        assert_eq!(sig.get(DFF_Q), 1);
    }
}
