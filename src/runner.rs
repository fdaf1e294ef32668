//! Tree execution: scheduling, aggregation, and event emission.
//!
//! A run makes two passes over the tree. The spawn pass walks the declared
//! shape once, submitting every parallel item to a worker pool immediately
//! and leaving sequential items in place. The report pass walks the same
//! shape again in declaration order, executing sequential items inline and
//! blocking on each parallel item's channel, so formatter events always
//! arrive in declaration order no matter how execution interleaved.

use std::io;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver};

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::ThreadPool;
use termcolor::{StandardStream, WriteColor};

use crate::builder::Spec;
use crate::config::{FormatMode, Interrupt, RunConfig};
use crate::error::PramanaError;
use crate::format::{FailedExamples, FormatCtx, Formatter, Progress, Silent, Specdoc};
use crate::outcome::{describe_panic, FailureReason, Outcome, SourceLocation};
use crate::state::{FailureRecord, RunReport, RunState, SpecPath};
use crate::tree::{forest_item_count, ActionWith, Item, SpecForest, SpecTree};

// ============================================================================
// ENTRY POINTS
// ============================================================================

/// Runs the spec against stdout, with the formatter and color behavior
/// selected by `config`.
pub fn run(spec: Spec<()>, config: &RunConfig) -> Result<RunReport, PramanaError> {
    let mut out = StandardStream::stdout(config.color.to_color_choice());
    match config.format {
        FormatMode::Specdoc => run_with(spec, &mut Specdoc::new(), &mut out, config),
        FormatMode::Progress => run_with(spec, &mut Progress::new(), &mut out, config),
        FormatMode::FailedExamples => run_with(spec, &mut FailedExamples, &mut out, config),
        FormatMode::Silent => run_with(spec, &mut Silent, &mut out, config),
    }
}

/// Runs the spec, driving `formatter` with events in declaration order and
/// writing its output through `out`.
pub fn run_with<F: Formatter>(
    spec: Spec<()>,
    formatter: &mut F,
    out: &mut dyn WriteColor,
    config: &RunConfig,
) -> Result<RunReport, PramanaError> {
    let mut forest = spec.into_forest();

    let mut state = RunState::new();
    if config.randomize {
        let seed = config.seed.unwrap_or_else(rand::random::<u64>);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        shuffle_forest(&mut forest, &mut rng);
        state.seed = Some(seed);
    }

    let total = forest_item_count(&forest);
    let pool = build_pool(&forest, config)?;
    let exec = spawn_forest(forest, pool.as_ref(), &config.interrupt);

    let mut reporter = Reporter {
        formatter,
        out,
        state,
        total,
        live_progress: config.live_progress_enabled(),
        interrupt: &config.interrupt,
        groups: Vec::new(),
        ordinal: 0,
    };

    reporter.emit(|f, ctx| f.on_header(ctx))?;
    reporter.report_forest(exec)?;
    if reporter.state.failure_count > 0 {
        reporter.emit(|f, ctx| f.on_failures_summary(ctx))?;
    }
    reporter.emit(|f, ctx| f.on_footer(ctx))?;

    Ok(reporter.state.snapshot(config.interrupt.is_triggered()))
}

// ============================================================================
// SPAWN PASS
// ============================================================================

/// The declared shape with every parallel item replaced by the receiving
/// end of its result channel.
enum ExecTree {
    Group {
        name: String,
        children: Vec<ExecTree>,
    },
    Inline(Item<()>),
    Spawned {
        requirement: String,
        location: Option<SourceLocation>,
        rx: Receiver<Option<Outcome>>,
    },
    WithCleanup {
        cleanup: ActionWith<()>,
        children: Vec<ExecTree>,
    },
}

fn spawn_forest(
    forest: SpecForest<()>,
    pool: Option<&ThreadPool>,
    interrupt: &Interrupt,
) -> Vec<ExecTree> {
    forest
        .into_iter()
        .map(|tree| spawn_tree(tree, pool, interrupt))
        .collect()
}

fn spawn_tree(tree: SpecTree<()>, pool: Option<&ThreadPool>, interrupt: &Interrupt) -> ExecTree {
    match tree {
        SpecTree::Group { name, children } => ExecTree::Group {
            name,
            children: spawn_forest(children, pool, interrupt),
        },
        SpecTree::Item(item) => match pool {
            Some(pool) if item.parallel => {
                let (tx, rx) = mpsc::channel();
                let interrupt = interrupt.clone();
                let action = item.action;
                pool.spawn(move || {
                    // A `None` result marks the item as skipped rather than
                    // executed.
                    let result = if interrupt.is_triggered() {
                        None
                    } else {
                        Some(execute_action(action))
                    };
                    let _ = tx.send(result);
                });
                ExecTree::Spawned {
                    requirement: item.requirement,
                    location: item.location,
                    rx,
                }
            }
            _ => ExecTree::Inline(item),
        },
        SpecTree::WithCleanup { cleanup, children } => ExecTree::WithCleanup {
            cleanup,
            children: spawn_forest(children, pool, interrupt),
        },
    }
}

/// Runs one action behind a panic boundary; an unwind becomes a fault.
fn execute_action(action: ActionWith<()>) -> Outcome {
    match catch_unwind(AssertUnwindSafe(move || action(&()))) {
        Ok(outcome) => outcome,
        Err(payload) => Outcome::Failure(FailureReason::Fault(describe_panic(payload.as_ref()))),
    }
}

fn build_pool(
    forest: &[SpecTree<()>],
    config: &RunConfig,
) -> Result<Option<ThreadPool>, PramanaError> {
    if !forest_has_parallel(forest) {
        return Ok(None);
    }
    let mut builder = rayon::ThreadPoolBuilder::new();
    if config.jobs > 0 {
        builder = builder.num_threads(config.jobs);
    }
    Ok(Some(builder.build()?))
}

fn forest_has_parallel(forest: &[SpecTree<()>]) -> bool {
    forest.iter().any(|tree| match tree {
        SpecTree::Group { children, .. } | SpecTree::WithCleanup { children, .. } => {
            forest_has_parallel(children)
        }
        SpecTree::Item(item) => item.parallel,
    })
}

fn shuffle_forest<P>(forest: &mut [SpecTree<P>], rng: &mut Xoshiro256PlusPlus) {
    forest.shuffle(rng);
    for tree in forest {
        match tree {
            SpecTree::Group { children, .. } | SpecTree::WithCleanup { children, .. } => {
                shuffle_forest(children, rng)
            }
            SpecTree::Item(_) => {}
        }
    }
}

// ============================================================================
// REPORT PASS
// ============================================================================

struct Reporter<'a, F: Formatter> {
    formatter: &'a mut F,
    out: &'a mut dyn WriteColor,
    state: RunState,
    total: usize,
    live_progress: bool,
    interrupt: &'a Interrupt,
    groups: Vec<String>,
    ordinal: usize,
}

impl<'a, F: Formatter> Reporter<'a, F> {
    fn emit<E>(&mut self, event: E) -> Result<(), PramanaError>
    where
        E: FnOnce(&mut F, &mut FormatCtx<'_>) -> io::Result<()>,
    {
        let mut ctx = FormatCtx::new(&mut *self.out, &self.state, self.total, self.live_progress);
        event(&mut *self.formatter, &mut ctx)?;
        Ok(())
    }

    fn report_forest(&mut self, forest: Vec<ExecTree>) -> Result<(), PramanaError> {
        for tree in forest {
            self.report_tree(tree)?;
        }
        Ok(())
    }

    fn report_tree(&mut self, tree: ExecTree) -> Result<(), PramanaError> {
        match tree {
            ExecTree::Group { name, children } => {
                let path = self.groups.clone();
                self.emit(|f, ctx| f.on_group_started(ctx, &path, &name))?;
                self.groups.push(name);
                let children_result = self.report_forest(children);
                self.groups.pop();
                children_result?;
                self.emit(|f, ctx| f.on_group_done(ctx))
            }
            ExecTree::Inline(item) => {
                if self.interrupt.is_triggered() {
                    return Ok(());
                }
                self.announce_item(item.location.as_ref())?;
                let outcome = execute_action(item.action);
                self.record_outcome(item.requirement, item.location, outcome)
            }
            ExecTree::Spawned {
                requirement,
                location,
                rx,
            } => {
                // Join the worker even when interrupted so no spawned job
                // outlives the run.
                let received = rx.recv().unwrap_or(None);
                match received {
                    Some(outcome) => {
                        self.announce_item(location.as_ref())?;
                        self.record_outcome(requirement, location, outcome)
                    }
                    None => Ok(()),
                }
            }
            ExecTree::WithCleanup { cleanup, children } => {
                let children_result = self.report_forest(children);
                // Cleanups run even after an interrupt or a reporting error.
                let outcome = execute_action(cleanup);
                children_result?;
                self.record_cleanup_outcome(outcome)
            }
        }
    }

    fn announce_item(&mut self, location: Option<&SourceLocation>) -> Result<(), PramanaError> {
        self.ordinal += 1;
        let (current, total) = (self.ordinal, self.total);
        self.emit(|f, ctx| f.on_item_progress(ctx, location, current, total))
    }

    fn record_outcome(
        &mut self,
        requirement: String,
        location: Option<SourceLocation>,
        outcome: Outcome,
    ) -> Result<(), PramanaError> {
        let path = SpecPath::new(self.groups.clone(), requirement);
        match outcome {
            Outcome::Success => {
                self.state.record_success();
                self.emit(|f, ctx| f.on_item_succeeded(ctx, &path))
            }
            Outcome::Pending(reason) => {
                self.state.record_pending();
                self.emit(|f, ctx| f.on_item_pending(ctx, &path, reason.as_deref()))
            }
            Outcome::Failure(reason) => {
                self.state.record_failure(FailureRecord {
                    location,
                    path: path.clone(),
                    reason: reason.clone(),
                });
                self.emit(|f, ctx| f.on_item_failed(ctx, &path, &reason))
            }
        }
    }

    /// A cleanup that did not succeed is recorded as an extra failure
    /// attributed to the enclosing `after_all` hook.
    fn record_cleanup_outcome(&mut self, outcome: Outcome) -> Result<(), PramanaError> {
        let reason = match outcome {
            Outcome::Success => return Ok(()),
            Outcome::Failure(reason) => reason,
            Outcome::Pending(_) => FailureReason::Reason("cleanup reported pending".to_owned()),
        };
        let path = SpecPath::new(self.groups.clone(), "after_all hook");
        self.state.record_failure(FailureRecord {
            location: None,
            path: path.clone(),
            reason: reason.clone(),
        });
        self.emit(|f, ctx| f.on_item_failed(ctx, &path, &reason))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::Spec;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use termcolor::NoColor;

    fn run_silently(spec: Spec<()>, config: &RunConfig) -> RunReport {
        let mut out = NoColor::new(Vec::new());
        run_with(spec, &mut Silent, &mut out, config).expect("silent run should not fail")
    }

    #[test]
    fn aggregates_success_pending_and_failure_counts() {
        let mut spec = Spec::new();
        spec.describe("counting", |s| {
            s.it("passes", || true);
            s.it("passes again", || Outcome::Success);
            s.it("waits", || Outcome::pending("not yet"));
            s.it("fails", || false);
        });

        let report = run_silently(spec, &RunConfig::default());
        assert_eq!(report.successes, 2);
        assert_eq!(report.pending, 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.example_count(), 4);
        assert!(!report.is_success());
        assert!(!report.interrupted);
    }

    #[test]
    fn a_panicking_item_is_recorded_as_a_fault() {
        let mut spec = Spec::new();
        spec.it("explodes", || -> Outcome { panic!("kaboom") });

        let report = run_silently(spec, &RunConfig::default());
        assert_eq!(report.failures.len(), 1);
        match &report.failures[0].reason {
            FailureReason::Fault(description) => assert!(description.contains("kaboom")),
            other => panic!("expected a fault, got {:?}", other),
        }
    }

    #[test]
    fn parallel_results_are_reported_in_declaration_order() {
        let mut spec = Spec::new();
        spec.describe("ordering", |s| {
            for index in 0..6u64 {
                s.it(format!("item {}", index), move || {
                    // Stagger so later items tend to finish first.
                    std::thread::sleep(std::time::Duration::from_millis(20 - index * 3));
                    true
                });
            }
        });
        let spec = spec.parallel();

        let config = RunConfig {
            jobs: 4,
            ..RunConfig::default()
        };
        let mut out = NoColor::new(Vec::new());
        run_with(spec, &mut Specdoc::new(), &mut out, &config).expect("run should not fail");

        let rendered = String::from_utf8(out.into_inner()).unwrap();
        let positions: Vec<usize> = (0..6)
            .map(|index| {
                rendered
                    .find(&format!("item {}", index))
                    .expect("every item should be reported")
            })
            .collect();
        let mut sorted = positions.clone();
        sorted.sort_unstable();
        assert_eq!(positions, sorted);
    }

    #[test]
    fn interrupt_skips_later_items_but_runs_cleanups() {
        let released = Arc::new(AtomicUsize::new(0));
        let observed = Arc::clone(&released);

        let mut spec = Spec::new();
        spec.describe("interruptible", |s| {
            s.it("never runs, the interrupt lands first", || true);
        });
        let config = RunConfig::default();
        let interrupt = config.interrupt.clone();
        let mut tripwire = Spec::new();
        tripwire.it("trips the interrupt", move || {
            interrupt.trigger();
            true
        });
        tripwire.append(spec);
        let spec = tripwire.after_all_(move || {
            released.fetch_add(1, Ordering::SeqCst);
        });

        let report = run_silently(spec, &config);
        assert_eq!(report.successes, 1);
        assert_eq!(report.example_count(), 1);
        assert!(report.interrupted);
        assert_eq!(observed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn a_failing_cleanup_is_attributed_to_the_hook() {
        let mut spec = Spec::new();
        spec.it("fine", || true);
        let spec = spec.after_all_(|| panic!("release failed"));

        let report = run_silently(spec, &RunConfig::default());
        assert_eq!(report.successes, 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].path.requirement, "after_all hook");
        match &report.failures[0].reason {
            FailureReason::Fault(description) => {
                assert!(description.contains("release failed"))
            }
            other => panic!("expected a fault, got {:?}", other),
        }
    }

    #[test]
    fn randomized_order_is_reproducible_for_a_seed() {
        fn build() -> Spec<()> {
            let mut spec = Spec::new();
            spec.describe("shuffled", |s| {
                for index in 0..8 {
                    s.it(format!("case {}", index), || true);
                }
            });
            spec
        }

        let config = RunConfig {
            randomize: true,
            seed: Some(99),
            ..RunConfig::default()
        };

        let render = |spec: Spec<()>| {
            let mut out = NoColor::new(Vec::new());
            let report =
                run_with(spec, &mut Specdoc::new(), &mut out, &config).expect("run should not fail");
            (String::from_utf8(out.into_inner()).unwrap(), report)
        };

        let (first_output, first_report) = render(build());
        let (second_output, _) = render(build());
        assert_eq!(first_output, second_output);
        assert_eq!(first_report.seed, Some(99));
    }

    #[test]
    fn a_sequential_tree_builds_no_worker_pool() {
        let mut spec = Spec::new();
        spec.it("plain", || true);
        let pool = build_pool(&spec.into_forest(), &RunConfig::default())
            .expect("pool construction should not fail");
        assert!(pool.is_none());
    }
}
