//! Cancellable periodic task driving one simulation generation.
//!
//! Each `CycleTask` owns exactly one thread. The thread waits one cycle,
//! runs the step closure, and repeats until it is cancelled or the step asks
//! to exit. Cancellation wakes the thread out of its pause immediately, so at
//! most one in-flight step completes after `cancel` is called.

use crate::error::{LiftError, Result};
use crate::util::pace;
use crossbeam_channel as xch;
use lift_traits::Clock;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

/// What the task does after a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleControl {
    /// Pause for the rest of the cycle, then step again.
    Continue,
    /// Step failed; pause a full cycle before retrying.
    Backoff,
    /// Leave the loop (e.g. the generation was superseded).
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleTiming {
    pub cycle: Duration,
    pub min_tick: Duration,
}

pub struct CycleTask {
    generation: u64,
    cancel_tx: xch::Sender<()>,
    done_rx: xch::Receiver<()>,
    join_handle: Option<JoinHandle<()>>,
}

impl CycleTask {
    pub fn spawn<F>(
        generation: u64,
        timing: CycleTiming,
        clock: Arc<dyn Clock + Send + Sync>,
        mut step: F,
    ) -> Result<Self>
    where
        F: FnMut() -> CycleControl + Send + 'static,
    {
        let (cancel_tx, cancel_rx) = xch::bounded::<()>(1);
        let (done_tx, done_rx) = xch::bounded::<()>(1);

        let join_handle = std::thread::Builder::new()
            .name(format!("lift-cycle-{generation}"))
            .spawn(move || {
                let mut wait = timing.cycle;
                loop {
                    match cancel_rx.recv_timeout(wait) {
                        Err(xch::RecvTimeoutError::Timeout) => {}
                        Ok(()) | Err(xch::RecvTimeoutError::Disconnected) => {
                            tracing::debug!(generation, "cycle task received cancel");
                            break;
                        }
                    }

                    let started = clock.now();
                    let control = match panic::catch_unwind(AssertUnwindSafe(&mut step)) {
                        Ok(c) => c,
                        Err(_) => {
                            tracing::error!(generation, "cycle step panicked; backing off");
                            CycleControl::Backoff
                        }
                    };
                    wait = match control {
                        CycleControl::Continue => {
                            pace(clock.as_ref(), started, timing.cycle, timing.min_tick)
                        }
                        CycleControl::Backoff => timing.cycle,
                        CycleControl::Exit => break,
                    };
                }
                let _ = done_tx.send(());
                tracing::trace!(generation, "cycle task exiting cleanly");
            })
            .map_err(|e| LiftError::State(format!("failed to spawn cycle task: {e}")))?;

        Ok(Self {
            generation,
            cancel_tx,
            done_rx,
            join_handle: Some(join_handle),
        })
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_finished(&self) -> bool {
        self.join_handle
            .as_ref()
            .is_none_or(JoinHandle::is_finished)
    }

    /// Cancel and wait up to `timeout` for the thread to acknowledge.
    ///
    /// On timeout the thread is detached and left to exit on its own; the
    /// generation check in its step keeps it from touching newer state.
    pub fn cancel(mut self, timeout: Duration) -> Result<()> {
        self.stop(timeout)
    }

    fn stop(&mut self, timeout: Duration) -> Result<()> {
        let Some(handle) = self.join_handle.take() else {
            return Ok(());
        };
        let _ = self.cancel_tx.try_send(());
        match self.done_rx.recv_timeout(timeout) {
            Ok(()) | Err(xch::RecvTimeoutError::Disconnected) => {
                if handle.join().is_err() {
                    tracing::warn!(generation = self.generation, "cycle task panicked");
                }
                tracing::debug!(generation = self.generation, "cycle task stopped");
                Ok(())
            }
            Err(xch::RecvTimeoutError::Timeout) => {
                tracing::warn!(
                    generation = self.generation,
                    ?timeout,
                    "cycle task did not stop in time; abandoning it"
                );
                Err(LiftError::TaskTerminationTimeout(timeout))
            }
        }
    }
}

impl Drop for CycleTask {
    fn drop(&mut self) {
        if let Err(e) = self.stop(crate::util::DEFAULT_CANCEL_TIMEOUT) {
            tracing::warn!(error = %e, "cycle task dropped while still running");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lift_traits::MonotonicClock;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Instant;

    fn fast() -> CycleTiming {
        CycleTiming {
            cycle: Duration::from_millis(20),
            min_tick: Duration::from_millis(5),
        }
    }

    #[test]
    fn steps_until_cancelled() {
        let count = Arc::new(AtomicU32::new(0));
        let c = count.clone();
        let task = CycleTask::spawn(1, fast(), Arc::new(MonotonicClock::new()), move || {
            c.fetch_add(1, Ordering::SeqCst);
            CycleControl::Continue
        })
        .unwrap();
        std::thread::sleep(Duration::from_millis(150));
        task.cancel(Duration::from_secs(1)).unwrap();
        let seen = count.load(Ordering::SeqCst);
        assert!(seen >= 2, "expected several steps, saw {seen}");
        std::thread::sleep(Duration::from_millis(60));
        assert_eq!(count.load(Ordering::SeqCst), seen);
    }

    #[test]
    fn cancel_interrupts_long_pause() {
        let timing = CycleTiming {
            cycle: Duration::from_secs(10),
            min_tick: Duration::from_millis(50),
        };
        let task =
            CycleTask::spawn(1, timing, Arc::new(MonotonicClock::new()), || CycleControl::Continue)
                .unwrap();
        let t0 = Instant::now();
        task.cancel(Duration::from_secs(1)).unwrap();
        assert!(t0.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn exit_stops_the_thread() {
        let task =
            CycleTask::spawn(7, fast(), Arc::new(MonotonicClock::new()), || CycleControl::Exit)
                .unwrap();
        assert_eq!(task.generation(), 7);
        std::thread::sleep(Duration::from_millis(100));
        assert!(task.is_finished());
        task.cancel(Duration::from_millis(10)).unwrap();
    }

    #[test]
    fn slow_step_times_out() {
        let task = CycleTask::spawn(3, fast(), Arc::new(MonotonicClock::new()), || {
            std::thread::sleep(Duration::from_millis(400));
            CycleControl::Continue
        })
        .unwrap();
        std::thread::sleep(Duration::from_millis(50));
        let err = task.cancel(Duration::from_millis(20)).unwrap_err();
        assert!(matches!(err, LiftError::TaskTerminationTimeout(_)));
    }

    #[test]
    fn panicking_step_keeps_running() {
        let count = Arc::new(AtomicU32::new(0));
        let c = count.clone();
        let task = CycleTask::spawn(1, fast(), Arc::new(MonotonicClock::new()), move || {
            let n = c.fetch_add(1, Ordering::SeqCst);
            assert!(n != 0, "first step fails");
            CycleControl::Continue
        })
        .unwrap();
        std::thread::sleep(Duration::from_millis(200));
        task.cancel(Duration::from_secs(1)).unwrap();
        assert!(count.load(Ordering::SeqCst) >= 2);
    }
}
