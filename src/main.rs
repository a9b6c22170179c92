use orfifo_tb::prelude::*;
use orfifo_tb::tb::{directed_test, dut_test, fifo_fill_test};

fn main() {
    let _ = orfifo_tb::CRATE_NAME.set(env!("CARGO_PKG_NAME").to_string());
    let scenarios = scenarios!(dut_test, directed_test, fifo_fill_test);
    let config = TbConfig::from_env();
    let passed = run_scenarios(&scenarios, || Box::new(OrFifoModel::default()), &config);
    std::process::exit(if passed { 0 } else { 1 });
}
