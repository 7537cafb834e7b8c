//! # circuit-rs: Parallel Boolean Circuit Solving in Rust
//!
//! **`circuit-rs`** evaluates boolean circuits --- trees of logical operators over
//! constant leaves --- by exploiting parallelism across independent subtrees.
//! Solving returns a handle to the pending result immediately, and the whole
//! computation can be cancelled mid-flight.
//!
//! ## Key Features
//!
//! - **Solver-Centric Architecture**: All evaluation goes through the [`Solver`][crate::solver::Solver],
//!   which owns a shared worker pool and the global stop signal.
//! - **Short-Circuit Parallelism**: Every composite node races its arguments and consumes results in
//!   *completion order*: AND stops at the first false, OR at the first true, threshold operators the
//!   moment the count is decided, and IF resolves from whichever of its three children settle first.
//! - **Cooperative Cancellation**: The moment an answer is determined, every task whose result can no
//!   longer matter is cancelled. [`stop`][crate::solver::Solver::stop] cancels everything, and every
//!   pending handle resolves promptly.
//! - **Deterministic Results**: A circuit's value is a pure function of its leaves. Scheduling order
//!   and thread interleaving only ever affect which tasks get cancelled, never the answer.
//!
//! ## Basic Usage
//!
//! ```rust
//! use circuit_rs::node::{Circuit, Node};
//! use circuit_rs::solver::Solver;
//!
//! // 1. Initialize the solver
//! let solver = Solver::new();
//!
//! // 2. Build a circuit: GT_1(true, true, IF(false, false, true))
//! let circuit = Circuit::new(Node::gt(
//!     1,
//!     vec![
//!         Node::leaf(true),
//!         Node::leaf(true),
//!         Node::ite(Node::leaf(false), Node::leaf(false), Node::leaf(true)),
//!     ],
//! ));
//!
//! // 3. Schedule it; `solve` never blocks
//! let value = solver.solve(&circuit);
//!
//! // 4. Block on the result: three of three arguments are true, 3 > 1
//! assert_eq!(value.get_value(), Ok(true));
//!
//! // 5. Shut down; from now on every solve is pre-cancelled
//! solver.stop();
//! assert!(solver.solve(&circuit).get_value().is_err());
//! ```
//!
//! ## Core Components
//!
//! - **[`solver`]**: The [`Solver`][crate::solver::Solver] orchestrator: `solve` and `stop`.
//! - **[`node`]**: The circuit model: [`Node`][crate::node::Node] operators and [`Circuit`][crate::node::Circuit].
//! - **[`value`]**: [`CircuitValue`][crate::value::CircuitValue], the blocking one-shot result handle.
//! - **[`pool`]**: The cached, grow-on-demand worker pool.
//! - **[`token`]**: Hierarchical cooperative cancellation tokens.
//! - **[`error`]**: The [`EvalError`][crate::error::EvalError] outcome taxonomy
//!   (cancellation vs. internal fault).

mod completion;
mod eval;

pub mod error;
pub mod node;
pub mod pool;
pub mod solver;
pub mod token;
pub mod value;
