use crate::obj::TbObjSafe;
use crate::signal;
use crate::TbResult;
use futures::future::BoxFuture;

pub struct Scenarios(Vec<TbObjSafe<Scenario>>);

impl Scenarios {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self(Vec::new())
    }
    pub fn len(&self) -> usize {
        self.0.len()
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
    pub fn iter(&self) -> core::slice::Iter<TbObjSafe<Scenario>> {
        self.0.iter()
    }
    pub fn push(&mut self, scenario: Scenario) {
        self.0.push(TbObjSafe::new(scenario));
    }
}

#[derive(Debug)]
pub struct Scenario {
    pub name: String,
    pub generator: fn(signal::SimObject) -> BoxFuture<'static, TbResult>,
    pub result: Option<TbResult>,
    pub time_secs: f64,
    pub sim_time_ns: f64,
}

impl Scenario {
    pub fn new(
        name: String,
        generator: fn(signal::SimObject) -> BoxFuture<'static, TbResult>,
    ) -> Self {
        Self {
            name,
            generator,
            result: None,
            time_secs: 0.0,
            sim_time_ns: 0.0,
        }
    }
    pub fn set_result(&mut self, result: TbResult) {
        self.result = Some(result);
    }
    pub fn passed(&self) -> bool {
        matches!(self.result, Some(Ok(_)))
    }
}

/// Builds a scenario list from async functions taking the hierarchy root.
#[macro_export]
macro_rules! scenarios {
    ($( $i:ident ),+ $(,)?) => {{
        #[allow(clippy::vec_init_then_push)]
        {
            let mut s = $crate::test::Scenarios::new();
            $(s.push($crate::test::Scenario::new(
                stringify!($i).to_string(),
                |sim_root| { $i(sim_root).boxed() },
            ));)+
            s
        }
    }};
}
