use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::Duration;

use log::{debug, trace};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Shared cached worker pool.
///
/// The pool grows on demand: [`execute`][Pool::execute] spawns a fresh
/// worker whenever no worker is idle, so a submitted job never waits behind
/// a blocked one. Evaluation tasks block while consuming child results, so
/// any fixed-size pool could deadlock once every worker waits on a
/// grandchild; unbounded growth is the same policy as a cached thread pool.
/// Workers idle longer than the keep-alive period exit on their own.
///
/// [`shutdown`][Pool::shutdown] discards all queued jobs and releases every
/// idle worker; jobs already running are left to finish (they are expected
/// to observe their cancellation token and return promptly).
#[derive(Clone)]
pub struct Pool {
    inner: Arc<PoolInner>,
}

struct PoolInner {
    state: Mutex<PoolState>,
    available: Condvar,
    keep_alive: Duration,
}

struct PoolState {
    queue: VecDeque<Job>,
    idle: usize,
    workers: usize,
    shutdown: bool,
}

impl Pool {
    pub const DEFAULT_KEEP_ALIVE: Duration = Duration::from_secs(60);

    pub fn new(keep_alive: Duration) -> Self {
        Self {
            inner: Arc::new(PoolInner {
                state: Mutex::new(PoolState {
                    queue: VecDeque::new(),
                    idle: 0,
                    workers: 0,
                    shutdown: false,
                }),
                available: Condvar::new(),
                keep_alive,
            }),
        }
    }

    /// Submit a job. Dropped silently if the pool is already shut down.
    pub fn execute<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let mut state = self.inner.state.lock().unwrap();
        if state.shutdown {
            // The dropped job takes its result sender with it, which the
            // consumer side observes as a disconnect.
            return;
        }
        state.queue.push_back(Box::new(job));
        if state.idle == 0 {
            state.workers += 1;
            let id = state.workers;
            trace!("pool: no idle worker, spawning worker #{}", id);
            let inner = Arc::clone(&self.inner);
            thread::spawn(move || worker_loop(inner, id));
        } else {
            self.inner.available.notify_one();
        }
    }

    /// Discard queued jobs and release all idle workers. Idempotent.
    pub fn shutdown(&self) {
        let mut state = self.inner.state.lock().unwrap();
        if state.shutdown {
            return;
        }
        debug!(
            "pool: shutting down ({} queued, {} workers)",
            state.queue.len(),
            state.workers
        );
        state.shutdown = true;
        state.queue.clear();
        drop(state);
        self.inner.available.notify_all();
    }

    /// Number of live worker threads (for diagnostics).
    pub fn workers(&self) -> usize {
        self.inner.state.lock().unwrap().workers
    }
}

impl Default for Pool {
    fn default() -> Self {
        Self::new(Self::DEFAULT_KEEP_ALIVE)
    }
}

fn worker_loop(inner: Arc<PoolInner>, id: usize) {
    let mut state = inner.state.lock().unwrap();
    loop {
        if state.shutdown {
            break;
        }
        if let Some(job) = state.queue.pop_front() {
            drop(state);
            job();
            state = inner.state.lock().unwrap();
            continue;
        }
        state.idle += 1;
        let (guard, timeout) = inner
            .available
            .wait_timeout(state, inner.keep_alive)
            .unwrap();
        state = guard;
        state.idle -= 1;
        if timeout.timed_out() && state.queue.is_empty() {
            trace!("pool: worker #{} idle past keep-alive, exiting", id);
            break;
        }
    }
    state.workers -= 1;
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::mpsc;

    use test_log::test;

    #[test]
    fn test_runs_jobs() {
        let pool = Pool::default();
        let (tx, rx) = mpsc::channel();
        for i in 0..8 {
            let tx = tx.clone();
            pool.execute(move || {
                tx.send(i).unwrap();
            });
        }
        drop(tx);
        let mut seen: Vec<i32> = rx.iter().collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..8).collect::<Vec<_>>());
    }

    #[test]
    fn test_grows_past_blocked_workers() {
        // The first job blocks until the second runs. A pool that cannot
        // grow would never schedule the second job.
        let pool = Pool::default();
        let (unblock_tx, unblock_rx) = mpsc::channel();
        let (done_tx, done_rx) = mpsc::channel();

        pool.execute(move || {
            unblock_rx.recv().unwrap();
            done_tx.send(()).unwrap();
        });
        pool.execute(move || {
            unblock_tx.send(()).unwrap();
        });

        done_rx
            .recv_timeout(Duration::from_secs(5))
            .expect("pool failed to grow past a blocked worker");
        assert!(pool.workers() >= 2);
    }

    #[test]
    fn test_shutdown_drops_queued_jobs() {
        let pool = Pool::default();
        pool.shutdown();
        let (tx, rx) = mpsc::channel::<()>();
        pool.execute(move || {
            tx.send(()).unwrap();
        });
        // The job was dropped, so the sender is gone.
        assert!(rx.recv().is_err());
    }

    #[test]
    fn test_shutdown_is_idempotent() {
        let pool = Pool::default();
        pool.shutdown();
        pool.shutdown();
    }
}
