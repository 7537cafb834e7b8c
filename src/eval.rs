use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use log::trace;

use crate::completion::CompletionQueue;
use crate::error::{EvalError, Outcome};
use crate::node::Node;
use crate::pool::Pool;
use crate::token::CancelToken;

// Child indices of an IF node in its completion queue.
const COND: usize = 0;
const THEN: usize = 1;
const ELSE: usize = 2;

/// Task entry point: evaluate `node` behind a panic barrier, so that a
/// panic inside an operator strategy surfaces at the value handle as a
/// [`Fault`][EvalError::Fault] instead of silently killing the worker.
pub(crate) fn run_task(pool: &Pool, node: &Arc<Node>, token: &Arc<CancelToken>) -> Outcome {
    match panic::catch_unwind(AssertUnwindSafe(|| eval_node(pool, node, token))) {
        Ok(outcome) => outcome,
        Err(payload) => Err(EvalError::Fault(panic_message(payload))),
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "panic in evaluation task".to_string()
    }
}

/// Recursively evaluate one node.
///
/// The token check at entry is the sole cooperative cancellation point;
/// since it recurs at every level, cancellation propagates promptly even
/// through deep trees. Leaves return their constant, NOT evaluates its
/// single child in the same task, and every other kind fans out one task
/// per argument and consumes results in completion order.
pub(crate) fn eval_node(pool: &Pool, node: &Arc<Node>, token: &Arc<CancelToken>) -> Outcome {
    if token.is_cancelled() {
        return Err(EvalError::Cancelled);
    }
    match node.as_ref() {
        Node::Leaf(value) => Ok(*value),
        // A single child gains nothing from another task.
        Node::Not(arg) => Ok(!eval_node(pool, arg, token)?),
        Node::And(args) => eval_and(pool, token, args),
        Node::Or(args) => eval_or(pool, token, args),
        Node::Gt(k, args) => eval_gt(pool, token, *k, args),
        Node::Lt(k, args) => eval_lt(pool, token, *k, args),
        Node::If(cond, then, other) => eval_if(pool, token, cond, then, other),
    }
}

fn eval_and(pool: &Pool, token: &Arc<CancelToken>, args: &[Arc<Node>]) -> Outcome {
    let queue = CompletionQueue::spawn(pool, token, args);
    for _ in 0..args.len() {
        let value = match queue.take() {
            Ok((_, Ok(value))) => value,
            Ok((_, Err(e))) | Err(e) => {
                queue.cancel_all();
                return Err(e);
            }
        };
        if !value {
            trace!("AND: observed false, cancelling remaining arguments");
            queue.cancel_all();
            return Ok(false);
        }
    }
    Ok(true)
}

fn eval_or(pool: &Pool, token: &Arc<CancelToken>, args: &[Arc<Node>]) -> Outcome {
    let queue = CompletionQueue::spawn(pool, token, args);
    for _ in 0..args.len() {
        let value = match queue.take() {
            Ok((_, Ok(value))) => value,
            Ok((_, Err(e))) | Err(e) => {
                queue.cancel_all();
                return Err(e);
            }
        };
        if value {
            trace!("OR: observed true, cancelling remaining arguments");
            queue.cancel_all();
            return Ok(true);
        }
    }
    Ok(false)
}

/// GT(k): true iff more than `k` arguments are true.
///
/// With `i` arguments observed and `got_true` of them true, the result is
/// known early as soon as `got_true > k` (true), or as soon as the
/// unobserved rest cannot lift the count above `k`, i.e.
/// `i - got_true >= n - k` (false).
fn eval_gt(pool: &Pool, token: &Arc<CancelToken>, k: usize, args: &[Arc<Node>]) -> Outcome {
    let n = args.len();
    if k >= n {
        // The count can never exceed k; nothing to schedule.
        return Ok(false);
    }

    let queue = CompletionQueue::spawn(pool, token, args);
    let mut got_true = 0;
    for i in 1..=n {
        let value = match queue.take() {
            Ok((_, Ok(value))) => value,
            Ok((_, Err(e))) | Err(e) => {
                queue.cancel_all();
                return Err(e);
            }
        };
        if value {
            got_true += 1;
        }
        if got_true > k {
            trace!("GT: {} true after {} observed, early true", got_true, i);
            queue.cancel_all();
            return Ok(true);
        }
        if i - got_true >= n - k {
            trace!("GT: {} false after {} observed, early false", i - got_true, i);
            queue.cancel_all();
            return Ok(false);
        }
    }
    // The exit conditions above are exhaustive; an exhausted loop implies
    // got_true <= k.
    Ok(false)
}

/// LT(k): true iff fewer than `k` arguments are true.
///
/// Early-false as soon as `got_true >= k`; early-true as soon as the
/// unobserved rest cannot lift the count up to `k`, i.e.
/// `i - got_true > n - k`.
fn eval_lt(pool: &Pool, token: &Arc<CancelToken>, k: usize, args: &[Arc<Node>]) -> Outcome {
    let n = args.len();
    if k == 0 {
        // The count can never be negative; nothing to schedule.
        return Ok(false);
    }
    if k > n {
        // The count can never reach k; nothing to schedule.
        return Ok(true);
    }

    let queue = CompletionQueue::spawn(pool, token, args);
    let mut got_true = 0;
    for i in 1..=n {
        let value = match queue.take() {
            Ok((_, Ok(value))) => value,
            Ok((_, Err(e))) | Err(e) => {
                queue.cancel_all();
                return Err(e);
            }
        };
        if value {
            got_true += 1;
        }
        if got_true >= k {
            trace!("LT: {} true after {} observed, early false", got_true, i);
            queue.cancel_all();
            return Ok(false);
        }
        if i - got_true > n - k {
            trace!("LT: {} false after {} observed, early true", i - got_true, i);
            queue.cancel_all();
            return Ok(true);
        }
    }
    Ok(true)
}

/// IF(condition, then, else): race all three children and decide as soon as
/// the observed subset determines the answer.
///
/// The answer always equals the branch selected by the condition's value,
/// no matter which task finishes first. Decision rules, applied after every
/// observation:
/// - condition known true/false: the selected branch alone decides; the
///   other branch is cancelled the moment the condition lands.
/// - both branches known and equal: the condition cannot change the
///   outcome; cancel it and return the common value.
/// - a failure is only propagated once the failed task is provably needed
///   (the condition selected a failed branch, or the condition itself
///   failed and the branches do not agree).
fn eval_if(
    pool: &Pool,
    token: &Arc<CancelToken>,
    cond: &Arc<Node>,
    then: &Arc<Node>,
    other: &Arc<Node>,
) -> Outcome {
    let children = [Arc::clone(cond), Arc::clone(then), Arc::clone(other)];
    let queue = CompletionQueue::spawn(pool, token, &children);
    let mut seen: [Option<Outcome>; 3] = [None, None, None];

    for _ in 0..3 {
        let (index, outcome) = match queue.take() {
            Ok(observed) => observed,
            Err(e) => {
                queue.cancel_all();
                return Err(e);
            }
        };
        if index == COND {
            if let Ok(c) = &outcome {
                // The non-selected branch can no longer matter.
                trace!("IF: condition is {}, cancelling the other branch", c);
                queue.cancel(if *c { ELSE } else { THEN });
            }
        }
        seen[index] = Some(outcome);

        if let Some(decided) = decide_if(&seen) {
            queue.cancel_all();
            return decided;
        }
    }

    // `decide_if` is total once all three outcomes are in.
    decide_if(&seen).unwrap_or(Err(EvalError::Cancelled))
}

/// The IF race-decision rule, as a pure function of which outcomes have
/// been observed so far (`seen[COND]`, `seen[THEN]`, `seen[ELSE]`).
///
/// Returns `None` while the observed subset cannot determine the answer
/// yet. The rules, in order:
/// - condition known good: the selected branch alone decides (its value,
///   or its failure);
/// - both branches known good and equal: their common value, regardless of
///   the condition;
/// - condition failed and the branches provably cannot agree (one failed,
///   or both known and different): the condition's verdict was needed, so
///   its failure propagates.
///
/// Failures of tasks that are not (yet) needed never surface.
fn decide_if(seen: &[Option<Outcome>; 3]) -> Option<Outcome> {
    if let Some(Ok(c)) = &seen[COND] {
        let selected = if *c { THEN } else { ELSE };
        return seen[selected].clone();
    }

    if let (Some(Ok(t)), Some(Ok(e))) = (&seen[THEN], &seen[ELSE]) {
        if t == e {
            return Some(Ok(*t));
        }
    }

    if let Some(Err(e)) = &seen[COND] {
        let agreement_impossible = matches!(&seen[THEN], Some(Err(_)))
            || matches!(&seen[ELSE], Some(Err(_)))
            || (seen[THEN].is_some() && seen[ELSE].is_some());
        if agreement_impossible {
            return Some(Err(e.clone()));
        }
    }

    None
}
