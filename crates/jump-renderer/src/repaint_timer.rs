//! Periodic repaint while rendering is in progress.
//!
//! The timer asks its target on every tick whether anything is still
//! drawing. Once nothing is, it marks itself stopped, repaints one last time
//! so the finished images are shown, and its thread exits.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, RecvTimeoutError, Sender};

pub trait RepaintTarget: Send + Sync {
    fn is_active(&self) -> bool;

    fn repaint(&self);
}

#[derive(Default)]
struct TimerState {
    running: bool,
    /// Bumped on every start and stop so an old thread can tell it has been
    /// replaced.
    run: u64,
    stop: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

pub struct RepaintTimer {
    period: Duration,
    coalesce: bool,
    state: Arc<Mutex<TimerState>>,
}

impl RepaintTimer {
    pub fn new(period: Duration, coalesce: bool) -> Self {
        Self {
            period: period.max(Duration::from_millis(1)),
            coalesce,
            state: Arc::new(Mutex::new(TimerState::default())),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Starts ticking against `target`. Returns false if already running.
    pub fn start(&self, target: Arc<dyn RepaintTarget>) -> bool {
        let (started, previous) = {
            let mut state = lock(&self.state);
            if state.running {
                return false;
            }
            let previous = state.thread.take();

            let (stop_tx, stop_rx) = bounded::<()>(1);
            state.run += 1;
            let run = state.run;
            let shared = Arc::clone(&self.state);
            let period = self.period;
            let coalesce = self.coalesce;
            let spawned = thread::Builder::new()
                .name("repaint-timer".to_string())
                .spawn(move || {
                    let mut next = Instant::now() + period;
                    loop {
                        match stop_rx.recv_deadline(next) {
                            Err(RecvTimeoutError::Timeout) => {}
                            Ok(()) | Err(RecvTimeoutError::Disconnected) => return,
                        }
                        if !tick(&shared, run, target.as_ref()) {
                            return;
                        }
                        next += period;
                        let now = Instant::now();
                        if coalesce && next <= now {
                            next = now + period;
                        }
                    }
                });
            let started = match spawned {
                Ok(handle) => {
                    state.running = true;
                    state.stop = Some(stop_tx);
                    state.thread = Some(handle);
                    log::debug!("Repaint timer started ({:?})", self.period);
                    true
                }
                Err(e) => {
                    log::error!("Could not start the repaint timer: {e}");
                    false
                }
            };
            (started, previous)
        };
        if let Some(previous) = previous {
            join(previous);
        }
        started
    }

    /// Stops the timer without a final repaint and waits for its thread.
    pub fn stop(&self) {
        let (stop, thread) = {
            let mut state = lock(&self.state);
            state.running = false;
            state.run += 1;
            (state.stop.take(), state.thread.take())
        };
        drop(stop);
        if let Some(thread) = thread {
            join(thread);
        }
    }

    pub fn is_running(&self) -> bool {
        lock(&self.state).running
    }
}

impl Drop for RepaintTimer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// One timer tick. Returns whether the timer keeps running.
fn tick(state: &Mutex<TimerState>, run: u64, target: &dyn RepaintTarget) -> bool {
    let active = {
        let mut state = lock(state);
        if state.run != run {
            return false;
        }
        // Decided under the lock so a concurrent start sees either a running
        // timer or a stopped one, never one that is about to stop.
        let active = target.is_active();
        if !active {
            state.running = false;
            state.stop = None;
            log::debug!("Repaint timer stopped, nothing is rendering");
        }
        active
    };
    target.repaint();
    active
}

fn join(handle: JoinHandle<()>) {
    if handle.thread().id() == thread::current().id() {
        return;
    }
    if handle.join().is_err() {
        log::error!("Repaint timer thread panicked");
    }
}

fn lock(state: &Mutex<TimerState>) -> MutexGuard<'_, TimerState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::wait_until;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    struct Target {
        active: AtomicBool,
        repaints: AtomicUsize,
    }

    impl Target {
        fn new(active: bool) -> Arc<Self> {
            Arc::new(Self {
                active: AtomicBool::new(active),
                repaints: AtomicUsize::new(0),
            })
        }

        fn repaints(&self) -> usize {
            self.repaints.load(Ordering::SeqCst)
        }
    }

    impl RepaintTarget for Target {
        fn is_active(&self) -> bool {
            self.active.load(Ordering::SeqCst)
        }

        fn repaint(&self) {
            self.repaints.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_ticks_while_active_and_stops_after_one_more_repaint() {
        let timer = RepaintTimer::new(Duration::from_millis(5), true);
        let target = Target::new(true);
        assert!(timer.start(target.clone()));
        assert!(!timer.start(target.clone()));

        assert!(wait_until(|| target.repaints() >= 3));
        target.active.store(false, Ordering::SeqCst);
        assert!(wait_until(|| !timer.is_running()));
        // Joins the thread, so the final repaint has happened.
        timer.stop();
        let settled = target.repaints();
        thread::sleep(Duration::from_millis(30));
        assert_eq!(target.repaints(), settled);
    }

    #[test]
    fn test_idle_target_gets_exactly_one_repaint() {
        let timer = RepaintTimer::new(Duration::from_millis(5), false);
        let target = Target::new(false);
        assert!(timer.start(target.clone()));
        assert!(wait_until(|| !timer.is_running()));
        assert!(wait_until(|| target.repaints() == 1));
    }

    #[test]
    fn test_restarts_after_stopping_itself() {
        let timer = RepaintTimer::new(Duration::from_millis(5), true);
        let target = Target::new(false);
        assert!(timer.start(target.clone()));
        assert!(wait_until(|| !timer.is_running()));

        target.active.store(true, Ordering::SeqCst);
        assert!(timer.start(target.clone()));
        assert!(timer.is_running());
        timer.stop();
        assert!(!timer.is_running());
    }

    #[test]
    fn test_stop_joins_without_repainting() {
        let timer = RepaintTimer::new(Duration::from_secs(60), true);
        let target = Target::new(true);
        assert!(timer.start(target.clone()));
        timer.stop();
        assert!(!timer.is_running());
        assert_eq!(target.repaints(), 0);
    }
}
