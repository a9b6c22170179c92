use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll, Waker};

use crate::obj::TbObj;
use crate::trigger::Trigger;
use crate::value::Val;
use crate::TbResult;

/// Cooperative mutual exclusion between tasks. Guards shared physical
/// resources such as the DUT's write port: at most one holder at a time, the
/// critical section released when the guard drops.
pub struct Lock {
    inner: TbObj<LockInner>,
}

struct LockInner {
    locked: bool,
    waiters: VecDeque<Waker>,
}

impl Lock {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            inner: TbObj::new(LockInner {
                locked: false,
                waiters: VecDeque::new(),
            }),
        }
    }
    pub fn acquire(&self) -> Acquire {
        Acquire { lock: self.clone() }
    }
    pub fn is_locked(&self) -> bool {
        self.inner.get().locked
    }
}

impl Clone for Lock {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

pub struct Acquire {
    lock: Lock,
}

impl Future for Acquire {
    type Output = LockGuard;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut inner = self.lock.inner.get_mut();
        if !inner.locked {
            inner.locked = true;
            drop(inner);
            Poll::Ready(LockGuard {
                lock: self.lock.clone(),
            })
        } else {
            inner.waiters.push_back(cx.waker().clone());
            Poll::Pending
        }
    }
}

pub struct LockGuard {
    lock: Lock,
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        let mut inner = self.lock.inner.get_mut();
        inner.locked = false;
        if let Some(waker) = inner.waiters.pop_front() {
            waker.wake();
        }
    }
}

/// Polls `predicate` at each tick until it holds, up to `max_ticks` ticks.
/// The bound converts a silently starving wait into an explicit timeout
/// error. The predicate is checked before the first tick, so a condition
/// that already holds consumes no simulation time.
pub async fn wait_until(
    tick: impl Fn() -> Trigger,
    predicate: impl Fn() -> bool,
    max_ticks: u64,
) -> TbResult {
    for _ in 0..max_ticks {
        if predicate() {
            return Ok(Val::None);
        }
        tick().await;
    }
    if predicate() {
        return Ok(Val::None);
    }
    Err(Val::String(format!(
        "timeout: condition not met after {} ticks",
        max_ticks
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::task::noop_waker;

    fn poll_acquire(acq: &mut Acquire) -> Poll<LockGuard> {
        let waker = noop_waker();
        let mut cx = Context::from_waker(&waker);
        Pin::new(acq).poll(&mut cx)
    }

    #[test]
    fn lock_is_exclusive_until_released() {
        let lock = Lock::new();
        let mut first = lock.acquire();
        let guard = match poll_acquire(&mut first) {
            Poll::Ready(g) => g,
            Poll::Pending => panic!("uncontended acquire must be ready"),
        };
        assert!(lock.is_locked());

        let mut second = lock.acquire();
        assert!(poll_acquire(&mut second).is_pending());

        drop(guard);
        assert!(!lock.is_locked());
        let second_guard = match poll_acquire(&mut second) {
            Poll::Ready(g) => g,
            Poll::Pending => panic!("released lock must be acquirable"),
        };
        assert!(lock.is_locked());
        drop(second_guard);
        assert!(!lock.is_locked());
    }
}
