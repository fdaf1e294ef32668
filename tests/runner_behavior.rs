// Scheduling and aggregation behavior observed through full runs.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use pramana::{FailedExamples, Outcome, RunConfig, RunReport, Silent, Spec, Specdoc};
use termcolor::NoColor;

fn run_quietly(spec: Spec<()>, config: &RunConfig) -> RunReport {
    let mut out = NoColor::new(Vec::new());
    pramana::run_with(spec, &mut Silent, &mut out, config).unwrap()
}

fn mixed_suite() -> Spec<()> {
    let mut spec = Spec::new();
    spec.describe("mixed", |s| {
        s.it("one", || true);
        s.it("two", || true);
        s.it("three", || true);
        s.it("sleeps on it", || Outcome::pending("undecided"));
        s.it("misses", || false);
        s.it("mismatches", || Outcome::expected_but_got("left", "right"));
    });
    spec
}

#[test]
fn the_report_aggregates_every_outcome_kind() {
    let report = run_quietly(mixed_suite(), &RunConfig::default());
    assert_eq!(report.successes, 3);
    assert_eq!(report.pending, 1);
    assert_eq!(report.failures.len(), 2);
    assert_eq!(report.example_count(), 6);
    assert!(!report.is_success());
}

#[test]
fn failure_records_carry_the_full_path() {
    let report = run_quietly(mixed_suite(), &RunConfig::default());
    let paths: Vec<String> = report
        .failures
        .iter()
        .map(|record| record.path.to_string())
        .collect();
    assert_eq!(paths, vec!["mixed misses", "mixed mismatches"]);
}

#[test]
fn memoized_setup_runs_once_under_parallel_execution() {
    let setup_calls = Arc::new(AtomicUsize::new(0));
    let seen = Arc::new(Mutex::new(Vec::new()));

    let mut spec = Spec::new();
    for index in 0..8 {
        let seen = Arc::clone(&seen);
        spec.it_with(format!("reader {}", index), move |value: &u64| {
            seen.lock().unwrap().push(*value);
            true
        });
    }
    let calls = Arc::clone(&setup_calls);
    let spec = spec
        .before_all(move || {
            calls.fetch_add(1, Ordering::SeqCst);
            9000
        })
        .parallel();

    let config = RunConfig {
        jobs: 4,
        ..RunConfig::default()
    };
    let report = run_quietly(spec, &config);

    assert_eq!(report.successes, 8);
    assert_eq!(setup_calls.load(Ordering::SeqCst), 1);
    assert!(seen.lock().unwrap().iter().all(|value| *value == 9000));
}

#[test]
fn an_interrupt_skips_the_rest_but_still_reports_a_footer() {
    let config = RunConfig::default();
    let interrupt = config.interrupt.clone();

    let mut spec = Spec::new();
    spec.it("pulls the plug", move || {
        interrupt.trigger();
        true
    });
    spec.it("never runs", || false);
    spec.it("also never runs", || false);

    let mut out = NoColor::new(Vec::new());
    let report = pramana::run_with(spec, &mut FailedExamples, &mut out, &config).unwrap();
    let rendered = String::from_utf8(out.into_inner()).unwrap();

    assert!(report.interrupted);
    assert_eq!(report.example_count(), 1);
    assert_eq!(report.successes, 1);
    assert!(report.failures.is_empty());
    assert!(rendered.contains("Finished in"));
    assert!(rendered.contains("1 example, 0 failures"));
}

#[test]
fn an_interrupt_does_not_cancel_registered_cleanups() {
    let released = Arc::new(AtomicUsize::new(0));
    let config = RunConfig::default();
    let interrupt = config.interrupt.clone();

    let mut spec = Spec::new();
    spec.it("stops the world", move || {
        interrupt.trigger();
        true
    });
    spec.it("skipped", || true);
    let observed = Arc::clone(&released);
    let spec = spec.after_all_(move || {
        released.fetch_add(1, Ordering::SeqCst);
    });

    run_quietly(spec, &config);
    assert_eq!(observed.load(Ordering::SeqCst), 1);
}

#[test]
fn randomized_runs_share_output_for_a_shared_seed() {
    fn build() -> Spec<()> {
        let mut spec = Spec::new();
        spec.describe("outer", |s| {
            for index in 0..5 {
                s.it(format!("leaf {}", index), || true);
            }
            s.describe("inner", |s| {
                for index in 0..5 {
                    s.it(format!("nested {}", index), || true);
                }
            });
        });
        spec
    }

    let config = RunConfig {
        randomize: true,
        seed: Some(1203),
        ..RunConfig::default()
    };
    let render = |spec: Spec<()>| {
        let mut out = NoColor::new(Vec::new());
        let report = pramana::run_with(spec, &mut Specdoc::new(), &mut out, &config).unwrap();
        (String::from_utf8(out.into_inner()).unwrap(), report)
    };

    let (first, first_report) = render(build());
    let (second, _) = render(build());
    assert_eq!(first, second);
    assert_eq!(first_report.seed, Some(1203));
    assert!(first.contains("Randomized with seed 1203"));
}

#[test]
fn an_unseeded_randomized_run_reports_the_seed_it_drew() {
    let mut spec = Spec::new();
    spec.it("only", || true);
    let config = RunConfig {
        randomize: true,
        ..RunConfig::default()
    };
    let report = run_quietly(spec, &config);
    assert!(report.seed.is_some());
}

#[test]
fn a_cleanup_fault_is_reported_under_the_hook_name() {
    let mut spec = Spec::new();
    spec.describe("guarded", |s| {
        let mut inner = Spec::new();
        inner.it("works", || true);
        s.append(inner.after_all_(|| panic!("double free")));
    });

    let report = run_quietly(spec, &RunConfig::default());
    assert_eq!(report.successes, 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].path.to_string(), "guarded after_all hook");
}

#[test]
fn parallel_and_sequential_items_mix_in_declaration_order() {
    let mut spec = Spec::new();
    spec.describe("mixture", |s| {
        let mut eager = Spec::new();
        eager.it("parallel early", || {
            std::thread::sleep(std::time::Duration::from_millis(15));
            true
        });
        s.append(eager.parallel());
        s.it("sequential middle", || true);
        let mut tail = Spec::new();
        tail.it("parallel late", || true);
        s.append(tail.parallel());
    });

    let config = RunConfig {
        jobs: 2,
        ..RunConfig::default()
    };
    let mut out = NoColor::new(Vec::new());
    pramana::run_with(spec, &mut Specdoc::new(), &mut out, &config).unwrap();
    let rendered = String::from_utf8(out.into_inner()).unwrap();

    let early = rendered.find("parallel early").unwrap();
    let middle = rendered.find("sequential middle").unwrap();
    let late = rendered.find("parallel late").unwrap();
    assert!(early < middle && middle < late);
}
