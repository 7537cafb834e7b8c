use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, trace};

use crate::eval::run_task;
use crate::node::Circuit;
use crate::pool::Pool;
use crate::token::CancelToken;
use crate::value::CircuitValue;

/// Concurrent circuit solver.
///
/// Owns the shared worker pool and the global stop signal.
/// [`solve`][Solver::solve] schedules one task that evaluates the circuit's
/// root and returns a [`CircuitValue`] immediately; every composite node
/// then fans out one task per argument, so independent subtrees evaluate in
/// parallel. [`stop`][Solver::stop] cancels everything in flight and makes
/// the solver permanently unusable: outstanding handles resolve as
/// cancelled, future `solve` calls return pre-cancelled handles.
pub struct Solver {
    pool: Pool,
    stop: Arc<CancelToken>,
}

impl Solver {
    pub fn new() -> Self {
        Self::with_keep_alive(Pool::DEFAULT_KEEP_ALIVE)
    }

    /// A solver whose idle workers are reaped after `keep_alive`. The pool
    /// itself always grows on demand (see [`Pool`]); the keep-alive is the
    /// one tunable of the policy.
    pub fn with_keep_alive(keep_alive: Duration) -> Self {
        Self {
            pool: Pool::new(keep_alive),
            stop: CancelToken::new(),
        }
    }

    /// Schedule `circuit` for evaluation and return a handle to the
    /// pending result. Never blocks and never fails synchronously; once
    /// the solver is stopped, returns a pre-cancelled handle without
    /// scheduling any work.
    pub fn solve(&self, circuit: &Circuit) -> CircuitValue {
        if self.stop.is_cancelled() {
            debug!("solve: solver is stopped, returning a broken value");
            return CircuitValue::broken();
        }
        trace!("solve: scheduling root task for {}", circuit);

        let (tx, rx) = mpsc::channel();
        let pool = self.pool.clone();
        let root = Arc::clone(circuit.root());
        let token = self.stop.child();
        self.pool.execute(move || {
            let outcome = run_task(&pool, &root, &token);
            // The handle may have been dropped unread.
            let _ = tx.send(outcome);
        });
        CircuitValue::bound(rx)
    }

    /// Stop the solver: set the stop signal, cancel every outstanding
    /// task, and release the pooled workers. Idempotent, safe to call from
    /// any number of threads. Every handle obtained before or during the
    /// stop eventually resolves as cancelled (unless its result was
    /// already in).
    pub fn stop(&self) {
        debug!("stop: cancelling all evaluation");
        self.stop.cancel();
        self.pool.shutdown();
    }
}

impl Default for Solver {
    fn default() -> Self {
        Self::new()
    }
}
