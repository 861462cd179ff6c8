//! A pool that runs render jobs on at most N threads at once.
//!
//! Workers are spawned on demand and exit as soon as the queue is empty, so
//! an idle queue holds no threads.

use std::collections::VecDeque;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use crate::error::RenderError;
use crate::renderer::RenderJob;

struct QueueState {
    jobs: VecDeque<RenderJob>,
    running: usize,
    disposed: bool,
    workers: Vec<JoinHandle<()>>,
    spawned: u64,
}

struct Shared {
    name: String,
    max_threads: usize,
    state: Mutex<QueueState>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

type Spawner = fn(String, Arc<Shared>) -> io::Result<JoinHandle<()>>;

fn spawn_worker(name: String, shared: Arc<Shared>) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name(name)
        .spawn(move || worker_loop(&shared))
}

pub struct ThreadQueue {
    shared: Arc<Shared>,
    spawner: Spawner,
}

impl ThreadQueue {
    /// `max_threads` is clamped to at least one.
    pub fn new(name: &str, max_threads: usize) -> Self {
        Self::with_spawner(name, max_threads, spawn_worker)
    }

    fn with_spawner(name: &str, max_threads: usize, spawner: Spawner) -> Self {
        Self {
            spawner,
            shared: Arc::new(Shared {
                name: name.to_string(),
                max_threads: max_threads.max(1),
                state: Mutex::new(QueueState {
                    jobs: VecDeque::new(),
                    running: 0,
                    disposed: false,
                    workers: Vec::new(),
                    spawned: 0,
                }),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    pub fn max_threads(&self) -> usize {
        self.shared.max_threads
    }

    /// Queues `job`, starting a worker if fewer than `max_threads` are busy.
    pub fn add(&self, job: RenderJob) -> Result<(), RenderError> {
        let mut state = self.shared.lock();
        if state.disposed {
            return Err(RenderError::Disposed);
        }
        state.jobs.push_back(job);
        if state.running >= self.shared.max_threads {
            return Ok(());
        }

        state.workers.retain(|w| !w.is_finished());
        state.spawned += 1;
        let worker_name = format!("{}-{}", self.shared.name, state.spawned);
        match (self.spawner)(worker_name, Arc::clone(&self.shared)) {
            Ok(handle) => {
                state.running += 1;
                state.workers.push(handle);
                Ok(())
            }
            Err(e) => {
                // No worker will run it; dropping it ends its draw session.
                let orphan = state.jobs.pop_back();
                drop(state);
                drop(orphan);
                log::error!("Could not start a '{}' worker: {e}", self.shared.name);
                Err(RenderError::Spawn(e))
            }
        }
    }

    /// Drops every job that has not started yet. Running jobs continue.
    pub fn clear(&self) {
        let dropped: Vec<RenderJob> = self.shared.lock().jobs.drain(..).collect();
        if !dropped.is_empty() {
            log::debug!("Cleared {} queued '{}' jobs", dropped.len(), self.shared.name);
        }
        // Jobs are dropped outside the lock; their destructors may take other locks.
        drop(dropped);
    }

    /// Refuses further work, drops queued jobs and waits for running ones.
    pub fn dispose(&self) {
        let (dropped, workers) = {
            let mut state = self.shared.lock();
            state.disposed = true;
            let dropped: Vec<RenderJob> = state.jobs.drain(..).collect();
            (dropped, std::mem::take(&mut state.workers))
        };
        drop(dropped);
        for worker in workers {
            if worker.join().is_err() {
                log::error!("A '{}' worker panicked outside a job", self.shared.name);
            }
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.shared.lock().disposed
    }

    pub fn running_count(&self) -> usize {
        self.shared.lock().running
    }

    pub fn queued_count(&self) -> usize {
        self.shared.lock().jobs.len()
    }

    pub fn is_idle(&self) -> bool {
        let state = self.shared.lock();
        state.running == 0 && state.jobs.is_empty()
    }
}

fn worker_loop(shared: &Shared) {
    loop {
        let job = {
            let mut state = shared.lock();
            match state.jobs.pop_front() {
                Some(job) => job,
                None => {
                    state.running -= 1;
                    return;
                }
            }
        };
        run_job(&shared.name, job);
    }
}

/// A failing or panicking job must not take the worker down with it.
fn run_job(queue: &str, job: RenderJob) {
    match panic::catch_unwind(AssertUnwindSafe(job)) {
        Ok(Ok(())) => {}
        Ok(Err(RenderError::Cancelled)) => {
            log::debug!("'{queue}' job stopped after cancellation");
        }
        Ok(Err(e)) => log::warn!("'{queue}' render job failed: {e}"),
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            log::error!("'{queue}' render job panicked: {message}");
        }
    }
}
