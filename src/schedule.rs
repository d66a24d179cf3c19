//! Repeating-work schedulers.
//!
//! A [`Scheduler`] calls a tick closure repeatedly. [`SteppedScheduler`] runs a fixed number of
//! ticks back to back for offline rendering and tests; [`IntervalScheduler`] paces ticks against
//! the wall clock.

use std::ops::ControlFlow;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::foundation::core::TickIndex;
use crate::foundation::error::{RainError, RainResult};

/// Tick callback: receives the 0-based tick index, returns `Break` to stop after this tick.
pub type TickFn<'a> = dyn FnMut(TickIndex) -> RainResult<ControlFlow<()>> + 'a;

/// "Schedule repeating work" capability.
pub trait Scheduler {
    /// Call `work` once per `period` until the scheduler's limit, a stop request, or `Break`.
    ///
    /// Returns the number of ticks that ran. An error from `work` aborts the loop.
    fn run_repeating(&mut self, period: Duration, work: &mut TickFn<'_>) -> RainResult<u64>;
}

/// Cloneable handle that ends an [`IntervalScheduler`] loop before its next tick.
#[derive(Clone, Debug, Default)]
pub struct StopHandle {
    stopped: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }
}

/// Runs exactly `ticks` ticks without waiting.
#[derive(Clone, Copy, Debug)]
pub struct SteppedScheduler {
    ticks: u64,
}

impl SteppedScheduler {
    pub fn new(ticks: u64) -> Self {
        Self { ticks }
    }
}

impl Scheduler for SteppedScheduler {
    fn run_repeating(&mut self, _period: Duration, work: &mut TickFn<'_>) -> RainResult<u64> {
        let mut ran = 0u64;
        while ran < self.ticks {
            let flow = work(TickIndex(ran))?;
            ran += 1;
            if flow.is_break() {
                break;
            }
        }
        Ok(ran)
    }
}

/// Paces ticks at a fixed period using absolute deadlines.
///
/// A tick that starts late runs immediately and the schedule restarts from it: ticks are never
/// skipped and never run in a burst to catch up.
#[derive(Debug)]
pub struct IntervalScheduler {
    max_ticks: Option<u64>,
    stop: StopHandle,
}

impl IntervalScheduler {
    /// `max_ticks = None` runs until stopped.
    pub fn new(max_ticks: Option<u64>) -> Self {
        Self {
            max_ticks,
            stop: StopHandle::default(),
        }
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }
}

impl Scheduler for IntervalScheduler {
    fn run_repeating(&mut self, period: Duration, work: &mut TickFn<'_>) -> RainResult<u64> {
        if period.is_zero() {
            return Err(RainError::validation("tick period must be > 0"));
        }

        let mut ran = 0u64;
        let mut deadline = Instant::now();
        loop {
            if self.max_ticks.is_some_and(|max| ran >= max) {
                break;
            }
            let now = Instant::now();
            if deadline > now {
                std::thread::sleep(deadline - now);
            }
            if self.stop.is_stopped() {
                tracing::debug!(ticks = ran, "interval scheduler stopped");
                break;
            }

            let flow = work(TickIndex(ran))?;
            ran += 1;
            if flow.is_break() {
                break;
            }

            deadline += period;
            let now = Instant::now();
            if deadline < now {
                tracing::trace!(
                    tick = ran,
                    late_ms = (now - deadline).as_secs_f64() * 1000.0,
                    "tick overran its period"
                );
                deadline = now;
            }
        }
        Ok(ran)
    }
}

#[cfg(test)]
#[path = "../tests/unit/schedule.rs"]
mod tests;
