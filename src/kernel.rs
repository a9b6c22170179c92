use num_format::{Locale, ToFormattedString};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::executor;
use crate::model::DutModel;
use crate::obj::TbObjSafe;
use crate::signal::{ObjectKind, SimObject};
use crate::sim_if::{SimCallback, SimIf};
use crate::trigger::{self, EdgeKind};
use crate::SimpleResult;
use intmap::IntMap;
use lazy_static::lazy_static;

// Event-driven simulation backend hosting a behavioral DUT model in-process.
// It serves the same callback contract as an external simulator would:
// timer callbacks fire first at each timestep, then the model is evaluated
// until the signal table is stable (firing edge callbacks as values change),
// then the read-write and read-only phases run.

/// Handle used for the hierarchy root. Port handles are indices into the
/// signal table, so the root gets a value no port can take.
const ROOT_HANDLE: usize = usize::MAX;

enum CbKind {
    Time(u64),
    Edge(usize),
    Rw,
    Ro,
}

lazy_static! {
    static ref CB_HDL_CNT: TbObjSafe<usize> = TbObjSafe::new(0);
}
lazy_static! {
    static ref CB_HDL_MAP: TbObjSafe<IntMap<CbKind>> = TbObjSafe::new(IntMap::new());
}
static RO: AtomicBool = AtomicBool::new(false);
static RW: AtomicBool = AtomicBool::new(false);
lazy_static! {
    static ref TIME_SET: TbObjSafe<BTreeSet<u64>> = TbObjSafe::new(BTreeSet::new());
}
lazy_static! {
    // key is signal handle, value is the last value seen by edge detection
    static ref EDGE_MAP: TbObjSafe<IntMap<u64>> = TbObjSafe::new(IntMap::new());
}
lazy_static! {
    static ref STATE: TbObjSafe<Option<KernelState>> = TbObjSafe::new(None);
}

struct KernelState {
    model: Box<dyn DutModel>,
    sig: SigTable,
    time: u64,
    max_time: u64,
    evals: u64,
}

pub struct PortDef {
    pub name: &'static str,
    pub width: u32,
}

/// The kernel's signal table. Values are masked to the declared port width;
/// writes track whether any value actually changed, which drives the
/// evaluate-until-stable loop.
pub struct SigTable {
    values: Vec<u32>,
    widths: Vec<u32>,
    names: Vec<&'static str>,
    dirty: bool,
}

impl SigTable {
    pub(crate) fn new(ports: &[PortDef]) -> Self {
        Self {
            values: vec![0; ports.len()],
            widths: ports.iter().map(|p| p.width).collect(),
            names: ports.iter().map(|p| p.name).collect(),
            dirty: false,
        }
    }

    #[inline]
    pub fn get(&self, idx: usize) -> u32 {
        self.values[idx]
    }

    #[inline]
    pub fn set(&mut self, idx: usize, val: u32) {
        let mask = mask_for(self.widths[idx]);
        if val & !mask != 0 {
            panic!(
                "Value {} does not fit {} ({} bits)",
                val, self.names[idx], self.widths[idx]
            );
        }
        if self.values[idx] != val {
            self.values[idx] = val;
            self.dirty = true;
        }
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| *n == name)
    }
}

#[inline]
fn mask_for(width: u32) -> u32 {
    if width >= 32 {
        u32::MAX
    } else {
        (1 << width) - 1
    }
}

pub(crate) struct Kernel {}

impl SimIf for Kernel {
    fn set_value(&self, obj: &SimObject, value: u32) -> SimpleResult<()> {
        match obj.kind {
            ObjectKind::Int(_) => {
                STATE.with_mut(|mut s| {
                    let s = s.as_mut().expect("kernel not initialized");
                    s.sig.set(obj.handle, value);
                });
                Ok(())
            }
            _ => Err(()),
        }
    }
    fn get_value(&self, obj: &SimObject) -> SimpleResult<u32> {
        match obj.kind {
            ObjectKind::Int(_) => Ok(STATE.with_mut(|s| {
                let s = s.as_ref().expect("kernel not initialized");
                s.sig.get(obj.handle)
            })),
            _ => Err(()),
        }
    }
    fn get_object_by_name(&self, name: &str) -> SimpleResult<SimObject> {
        STATE.with_mut(|s| {
            let s = s.as_ref().expect("kernel not initialized");
            let top = s.model.name();
            if name == top {
                return Ok(SimObject {
                    handle: ROOT_HANDLE,
                    kind: ObjectKind::Hier,
                });
            }
            let port = name.strip_prefix(top).and_then(|n| n.strip_prefix('.')).ok_or(())?;
            let idx = s.sig.index_of(port).ok_or(())?;
            Ok(SimObject {
                handle: idx,
                kind: ObjectKind::Int(s.sig.widths[idx] as i32),
            })
        })
    }
    fn get_root_object(&self) -> SimpleResult<SimObject> {
        STATE.with_mut(|s| match s.as_ref() {
            Some(_) => Ok(SimObject {
                handle: ROOT_HANDLE,
                kind: ObjectKind::Hier,
            }),
            None => Err(()),
        })
    }
    fn get_full_name(&self, obj: &SimObject) -> SimpleResult<String> {
        STATE.with_mut(|s| {
            let s = s.as_ref().ok_or(())?;
            match obj.kind {
                ObjectKind::Hier => Ok(s.model.name().to_string()),
                ObjectKind::Int(_) => Ok(format!("{}.{}", s.model.name(), s.sig.names[obj.handle])),
            }
        })
    }
    fn get_sim_time_steps(&self) -> u64 {
        STATE.with_mut(|s| s.as_ref().map(|s| s.time).unwrap_or(0))
    }
    fn get_sim_precision(&self) -> i8 {
        // 1 step = 1 ns
        -9
    }
    fn log(&self, msg: &str) {
        let t = self.get_sim_time_steps();
        println!("{}ns {}", t.to_formatted_string(&Locale::en), msg);
    }
    fn register_callback(&self, cb: SimCallback) -> SimpleResult<usize> {
        let cb_hdl = new_cb_hdl();
        match cb {
            SimCallback::Time(t) => {
                let t_abs = t + self.get_sim_time_steps();
                TIME_SET.with_mut(|mut set| {
                    if !set.insert(t_abs) {
                        panic!("Can not register same timer callback twice.");
                    }
                });
                CB_HDL_MAP.with_mut(|mut map| {
                    let _ = map.insert(cb_hdl as u64, CbKind::Time(t_abs));
                });
            }
            SimCallback::Edge(sig_hdl) => {
                let current = STATE.with_mut(|s| {
                    let s = s.as_ref().expect("kernel not initialized");
                    s.sig.get(sig_hdl)
                });
                EDGE_MAP.with_mut(|mut map| {
                    if map.insert(sig_hdl as u64, current as u64).is_some() {
                        panic!("Edge callback already registered for signal.");
                    }
                });
                CB_HDL_MAP.with_mut(|mut map| {
                    let _ = map.insert(cb_hdl as u64, CbKind::Edge(sig_hdl));
                });
            }
            SimCallback::ReadWrite => {
                RW.store(true, Ordering::Relaxed);
                CB_HDL_MAP.with_mut(|mut map| {
                    let _ = map.insert(cb_hdl as u64, CbKind::Rw);
                });
            }
            SimCallback::ReadOnly => {
                RO.store(true, Ordering::Relaxed);
                CB_HDL_MAP.with_mut(|mut map| {
                    let _ = map.insert(cb_hdl as u64, CbKind::Ro);
                });
            }
        }
        Ok(cb_hdl)
    }
    fn cancel_callback(&self, cb_hdl: usize) -> SimpleResult<()> {
        let cb = CB_HDL_MAP.with_mut(|mut map| {
            map.remove(cb_hdl as u64)
                .expect("Could not find callback handle.")
        });
        match cb {
            CbKind::Time(t_abs) => TIME_SET.with_mut(|mut set| {
                if !set.remove(&t_abs) {
                    panic!("Callback was not registered at t_abs.")
                }
            }),
            CbKind::Edge(sig_hdl) => EDGE_MAP.with_mut(|mut map| {
                if map.remove(sig_hdl as u64).is_none() {
                    panic!("Callback was not registered for signal.")
                }
            }),
            CbKind::Rw => RW.store(false, Ordering::Relaxed),
            CbKind::Ro => RO.store(false, Ordering::Relaxed),
        };
        Ok(())
    }
}

fn new_cb_hdl() -> usize {
    CB_HDL_CNT.with_mut(|mut cnt| {
        let out = *cnt;
        *cnt += 1;
        out
    })
}

/// Installs a fresh model and resets all framework state. Must run before
/// every scenario: signal handles, trigger maps and the ready queue from a
/// previous run are meaningless against a new model.
pub(crate) fn init(model: Box<dyn DutModel>, max_time: u64) {
    trigger::cancel_all_triggers();
    executor::clear_ready_queue();
    crate::signal::clear_signal_caches();
    CB_HDL_MAP.with_mut(|mut map| map.clear());
    TIME_SET.with_mut(|mut set| set.clear());
    EDGE_MAP.with_mut(|mut map| map.clear());
    RW.store(false, Ordering::Relaxed);
    RO.store(false, Ordering::Relaxed);
    let sig = SigTable::new(model.ports());
    STATE.with_mut(|mut s| {
        *s = Some(KernelState {
            model,
            sig,
            time: 0,
            max_time,
            evals: 0,
        });
    });
}

#[derive(Debug, PartialEq)]
pub(crate) enum RunOutcome {
    /// The scenario recorded a result.
    Finished,
    /// The maximum simulation time was exceeded.
    Watchdog,
    /// No pending timers while the scenario is unfinished.
    Starved,
}

/// Runs the scheduling loop until `finished` reports true.
pub(crate) fn run_sim(finished: impl Fn() -> bool) -> RunOutcome {
    // first tick: start the scheduled tasks, which register their triggers
    executor::run_once();
    settle();
    loop {
        if finished() {
            return RunOutcome::Finished;
        }
        // scheduled phases of the current timestep
        if RW.swap(false, Ordering::Relaxed) {
            trigger::react(SimCallback::ReadWrite, None);
            settle();
            continue;
        }
        if RO.swap(false, Ordering::Relaxed) {
            trigger::react(SimCallback::ReadOnly, None);
            settle();
            continue;
        }
        // advance to the next pending timer
        let next = TIME_SET.with_mut(|set| set.iter().next().copied());
        match next {
            None => return RunOutcome::Starved,
            Some(t) => {
                let expired = STATE.with_mut(|mut s| {
                    let s = s.as_mut().expect("kernel not initialized");
                    s.time = t;
                    t > s.max_time
                });
                if expired {
                    return RunOutcome::Watchdog;
                }
                TIME_SET.with_mut(|mut set| set.remove(&t));
                trigger::react(SimCallback::Time(t), None);
                settle();
            }
        }
    }
}

/// Evaluates the model until the signal table is stable, firing edge
/// callbacks for watched signals that changed. Woken tasks may write signals,
/// so the loop repeats until no further edges fire.
fn settle() {
    loop {
        loop {
            let dirty = STATE.with_mut(|mut s| {
                let s = s.as_mut().expect("kernel not initialized");
                s.evals += 1;
                s.sig.dirty = false;
                let KernelState { model, sig, .. } = s;
                model.eval(sig);
                sig.dirty
            });
            if !dirty {
                break;
            }
        }
        let fired = EDGE_MAP.with_mut(|mut map| {
            let mut fired = Vec::new();
            STATE.with_mut(|st| {
                let st = st.as_ref().expect("kernel not initialized");
                for (hdl, last) in map.iter_mut() {
                    let cur = st.sig.get(*hdl as usize) as u64;
                    if cur != *last {
                        let kind = match (*last, cur) {
                            (0, 1) => EdgeKind::Rising,
                            (1, 0) => EdgeKind::Falling,
                            _ => EdgeKind::Any,
                        };
                        fired.push((*hdl as usize, kind));
                        *last = cur;
                    }
                }
            });
            fired
        });
        if fired.is_empty() {
            break;
        }
        for (hdl, kind) in fired {
            // an earlier react in this round may have cancelled this callback
            let registered = EDGE_MAP.with_mut(|map| map.contains_key(hdl as u64));
            if registered {
                trigger::react(SimCallback::Edge(hdl), Some(kind));
            }
        }
    }
}

/// End-of-run statistics for the log.
pub(crate) fn log_run_stats() {
    STATE.with_mut(|s| {
        if let Some(s) = s.as_ref() {
            println!(
                "     simulated {} ns, {} model evaluations",
                s.time.to_formatted_string(&Locale::en),
                s.evals.to_formatted_string(&Locale::en)
            );
        }
    });
}
