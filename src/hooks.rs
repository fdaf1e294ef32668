//! Hook combinators: wrap setup and teardown behavior around whole subtrees.
//!
//! Everything derives from [`around_with`], which rewrites every action in a
//! forest through a caller-supplied transformer. Hooks nest like onion
//! layers: the last combinator applied is outermost, so its setup runs first
//! and its cleanup runs last, while the first-applied hook runs closest to
//! the item's own action.
//!
//! The same combinators are available as consuming methods on
//! [`Spec`](crate::Spec); the free functions here operate on raw forests.

use std::panic::{catch_unwind, resume_unwind, AssertUnwindSafe};
use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::outcome::{describe_panic, FailureReason, Outcome};
use crate::tree::{map_forest_actions, ActionWith, SpecForest, SpecTree};

// ============================================================================
// CORE PRIMITIVE
// ============================================================================

/// Rewrites every action in the forest through `wrap`, items and cleanups
/// alike, changing the required parameter type from `P` to `Q`.
///
/// Composing `around_with(f)` and then `around_with(g)` over a forest is
/// observably equivalent to one `around_with` of the composed transformer.
pub fn around_with<P, Q, W>(forest: SpecForest<P>, wrap: W) -> SpecForest<Q>
where
    P: 'static,
    Q: 'static,
    W: Fn(ActionWith<P>) -> ActionWith<Q>,
{
    map_forest_actions(forest, &wrap)
}

// ============================================================================
// BEFORE HOOKS
// ============================================================================

/// Runs `setup` immediately before each item and supplies its result as the
/// item's required value.
pub fn before<A, S>(forest: SpecForest<A>, setup: S) -> SpecForest<()>
where
    A: 'static,
    S: Fn() -> A + Send + Sync + 'static,
{
    let setup = Arc::new(setup);
    around_with(forest, move |inner: ActionWith<A>| -> ActionWith<()> {
        let setup = Arc::clone(&setup);
        Box::new(move |_: &()| inner(&setup()))
    })
}

/// Runs `setup` before each item without touching the parameter type.
pub fn before_<P, S>(forest: SpecForest<P>, setup: S) -> SpecForest<P>
where
    P: 'static,
    S: Fn() + Send + Sync + 'static,
{
    let setup = Arc::new(setup);
    around_with(forest, move |inner: ActionWith<P>| -> ActionWith<P> {
        let setup = Arc::clone(&setup);
        Box::new(move |param: &P| {
            setup();
            inner(param)
        })
    })
}

/// Derives each item's required value from the new outer parameter, layering
/// a narrower setup on top of an existing one.
pub fn before_with<A, Q, T>(forest: SpecForest<A>, transform: T) -> SpecForest<Q>
where
    A: 'static,
    Q: 'static,
    T: Fn(&Q) -> A + Send + Sync + 'static,
{
    let transform = Arc::new(transform);
    around_with(forest, move |inner: ActionWith<A>| -> ActionWith<Q> {
        let transform = Arc::clone(&transform);
        Box::new(move |outer: &Q| inner(&transform(outer)))
    })
}

/// Like [`before`], but `setup` executes at most once per run, the first
/// time any covered item demands the value; later and concurrent callers
/// reuse the memoized result.
///
/// Racing items block on the cell rather than recomputing, so `setup` runs
/// exactly once even under parallel execution. A panicking `setup` is
/// memoized as a fault, failing every covered item with its description.
pub fn before_all<A, S>(forest: SpecForest<A>, setup: S) -> SpecForest<()>
where
    A: Send + Sync + 'static,
    S: Fn() -> A + Send + Sync + 'static,
{
    let memo: Arc<OnceCell<Result<A, String>>> = Arc::new(OnceCell::new());
    let setup = Arc::new(setup);
    around_with(forest, move |inner: ActionWith<A>| -> ActionWith<()> {
        let memo = Arc::clone(&memo);
        let setup = Arc::clone(&setup);
        Box::new(move |_: &()| match memo.get_or_init(|| memoized(|| setup())) {
            Ok(value) => inner(value),
            Err(description) => Outcome::Failure(FailureReason::Fault(description.clone())),
        })
    })
}

/// Memoized parameter-preserving variant of [`before_all`].
pub fn before_all_<P, S>(forest: SpecForest<P>, setup: S) -> SpecForest<P>
where
    P: 'static,
    S: Fn() + Send + Sync + 'static,
{
    let memo: Arc<OnceCell<Result<(), String>>> = Arc::new(OnceCell::new());
    let setup = Arc::new(setup);
    around_with(forest, move |inner: ActionWith<P>| -> ActionWith<P> {
        let memo = Arc::clone(&memo);
        let setup = Arc::clone(&setup);
        Box::new(
            move |param: &P| match memo.get_or_init(|| memoized(|| setup())) {
                Ok(()) => inner(param),
                Err(description) => Outcome::Failure(FailureReason::Fault(description.clone())),
            },
        )
    })
}

/// Runs a one-time setup under the memo cell, capturing panics so the cell
/// always ends up initialized.
fn memoized<A>(setup: impl FnOnce() -> A) -> Result<A, String> {
    catch_unwind(AssertUnwindSafe(setup)).map_err(|payload| {
        format!(
            "memoized setup panicked: {}",
            describe_panic(payload.as_ref())
        )
    })
}

// ============================================================================
// AFTER HOOKS
// ============================================================================

/// Runs `cleanup` with the item's parameter after its action completes,
/// unconditionally: a panicking action is caught, the cleanup runs, and the
/// panic then resumes.
pub fn after<P, C>(forest: SpecForest<P>, cleanup: C) -> SpecForest<P>
where
    P: 'static,
    C: Fn(&P) + Send + Sync + 'static,
{
    let cleanup = Arc::new(cleanup);
    around_with(forest, move |inner: ActionWith<P>| -> ActionWith<P> {
        let cleanup = Arc::clone(&cleanup);
        Box::new(move |param: &P| {
            let result = catch_unwind(AssertUnwindSafe(|| inner(param)));
            cleanup(param);
            match result {
                Ok(outcome) => outcome,
                Err(payload) => resume_unwind(payload),
            }
        })
    })
}

/// Parameterless variant of [`after`], with the same release guarantee.
pub fn after_<P, C>(forest: SpecForest<P>, cleanup: C) -> SpecForest<P>
where
    P: 'static,
    C: Fn() + Send + Sync + 'static,
{
    let cleanup = Arc::new(cleanup);
    around_with(forest, move |inner: ActionWith<P>| -> ActionWith<P> {
        let cleanup = Arc::clone(&cleanup);
        Box::new(move |param: &P| {
            let result = catch_unwind(AssertUnwindSafe(|| inner(param)));
            cleanup();
            match result {
                Ok(outcome) => outcome,
                Err(payload) => resume_unwind(payload),
            }
        })
    })
}

/// Wraps the whole forest in one cleanup node; `cleanup` executes exactly
/// once, after every covered item has finished with whatever outcome.
pub fn after_all<P, C>(forest: SpecForest<P>, cleanup: C) -> SpecForest<P>
where
    P: 'static,
    C: FnOnce(&P) + Send + 'static,
{
    vec![SpecTree::WithCleanup {
        cleanup: Box::new(move |param: &P| {
            cleanup(param);
            Outcome::Success
        }),
        children: forest,
    }]
}

/// Parameterless variant of [`after_all`].
pub fn after_all_<P, C>(forest: SpecForest<P>, cleanup: C) -> SpecForest<P>
where
    P: 'static,
    C: FnOnce() + Send + 'static,
{
    vec![SpecTree::WithCleanup {
        cleanup: Box::new(move |_: &P| {
            cleanup();
            Outcome::Success
        }),
        children: forest,
    }]
}

// ============================================================================
// AROUND HOOKS
// ============================================================================

/// Hands each item's action to `wrap`, which must invoke it with a parameter
/// value it constructs. A wrap that returns without invoking the action
/// fails the item with a descriptive reason.
pub fn around<P, W>(forest: SpecForest<P>, wrap: W) -> SpecForest<()>
where
    P: 'static,
    W: Fn(&mut dyn FnMut(&P)) + Send + Sync + 'static,
{
    let wrap = Arc::new(wrap);
    around_with(forest, move |inner: ActionWith<P>| -> ActionWith<()> {
        let wrap = Arc::clone(&wrap);
        Box::new(move |_: &()| {
            let mut inner = Some(inner);
            let mut outcome = None;
            wrap(&mut |param: &P| {
                if let Some(action) = inner.take() {
                    outcome = Some(action(param));
                }
            });
            outcome.unwrap_or_else(|| {
                Outcome::Failure(FailureReason::Reason(
                    "around hook finished without invoking the item's action".into(),
                ))
            })
        })
    })
}

/// Parameter-preserving wrap for acquire/release-style hooks that carry no
/// value of their own; `wrap` receives the run of the item as a thunk.
pub fn around_<P, W>(forest: SpecForest<P>, wrap: W) -> SpecForest<P>
where
    P: 'static,
    W: Fn(&mut dyn FnMut()) + Send + Sync + 'static,
{
    let wrap = Arc::new(wrap);
    around_with(forest, move |inner: ActionWith<P>| -> ActionWith<P> {
        let wrap = Arc::clone(&wrap);
        Box::new(move |param: &P| {
            let mut inner = Some(inner);
            let mut outcome = None;
            wrap(&mut || {
                if let Some(action) = inner.take() {
                    outcome = Some(action(param));
                }
            });
            outcome.unwrap_or_else(|| {
                Outcome::Failure(FailureReason::Reason(
                    "around hook finished without invoking the item's action".into(),
                ))
            })
        })
    })
}
