pub use crate::bus::{ReadAddr, WriteAddr};
pub use crate::config::TbConfig;
pub use crate::executor::Task;
pub use crate::model::{DffModel, DutModel, OrFifoModel};
pub use crate::obj::{TbObj, TbObjSafe};
pub use crate::scenarios;
pub use crate::signal::SimObject;
pub use crate::sim_if::{SimIf, SIM_IF};
pub use crate::sync::{wait_until, Lock};
pub use crate::test::{Scenario, Scenarios};
pub use crate::trigger::Trigger;
pub use crate::utils;
pub use crate::value::Val;
pub use crate::{fail_test, pass_test, run_scenarios, TbResult};
pub use futures::future::FutureExt;
