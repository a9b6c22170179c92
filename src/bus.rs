use crate::signal::SimObject;

/// Write-port targets: the two operand FIFOs. No other write address is ever
/// issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteAddr {
    OperandA = 4,
    OperandB = 5,
}

impl WriteAddr {
    pub fn value(self) -> u32 {
        self as u32
    }
}

/// Read-port targets: occupancy diagnostics at 0-2, the result register at 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadAddr {
    DepthA = 0,
    DepthB = 1,
    DepthY = 2,
    Result = 3,
}

impl ReadAddr {
    pub fn value(self) -> u32 {
        self as u32
    }
    pub const DIAGNOSTIC: [ReadAddr; 3] = [ReadAddr::DepthA, ReadAddr::DepthB, ReadAddr::DepthY];
}

/// Signal bundle of the shared write port.
#[derive(Clone, Copy)]
pub struct WriteBus {
    pub write_en: SimObject,
    pub write_address: SimObject,
    pub write_data: SimObject,
    pub a_full_n: SimObject,
    pub b_full_n: SimObject,
}

impl WriteBus {
    pub fn new(dut: SimObject) -> Self {
        Self {
            write_en: dut.c("write_en"),
            write_address: dut.c("write_address"),
            write_data: dut.c("write_data"),
            a_full_n: dut.c("a_full_n"),
            b_full_n: dut.c("b_full_n"),
        }
    }

    /// Not-full flag of the addressed operand channel.
    pub fn full_n(&self, addr: WriteAddr) -> SimObject {
        match addr {
            WriteAddr::OperandA => self.a_full_n,
            WriteAddr::OperandB => self.b_full_n,
        }
    }
}

/// Signal bundle of the read port.
#[derive(Clone, Copy)]
pub struct ReadBus {
    pub read_en: SimObject,
    pub read_address: SimObject,
    pub read_data: SimObject,
    pub y_empty_n: SimObject,
}

impl ReadBus {
    pub fn new(dut: SimObject) -> Self {
        Self {
            read_en: dut.c("read_en"),
            read_address: dut.c("read_address"),
            read_data: dut.c("read_data"),
            y_empty_n: dut.c("y_empty_n"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_encodings() {
        assert_eq!(WriteAddr::OperandA.value(), 4);
        assert_eq!(WriteAddr::OperandB.value(), 5);
        assert_eq!(ReadAddr::DepthA.value(), 0);
        assert_eq!(ReadAddr::DepthB.value(), 1);
        assert_eq!(ReadAddr::DepthY.value(), 2);
        assert_eq!(ReadAddr::Result.value(), 3);
    }
}
