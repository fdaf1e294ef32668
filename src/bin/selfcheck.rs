// Runs pramana against a suite describing pramana itself.
// Usage: cargo run --bin selfcheck [pass|fail] [specdoc|progress|failed|silent]

use std::env;
use std::process;

use pramana::{FormatMode, Outcome, RunConfig, Spec};

fn demo_suite(include_failures: bool) -> Spec<()> {
    let mut spec = Spec::new();

    spec.describe("arithmetic", |s| {
        s.it("adds small numbers", || 2 + 2 == 4);
        s.it("multiplies by zero", || 7 * 0 == 0);
        s.describe("division", |s| {
            s.it("rounds toward zero", || -7 / 2 == -3);
            s.it("awaits a euclidean variant", || {
                Outcome::pending("not specified yet")
            });
        });
    });

    spec.describe("strings", |s| {
        s.it("trims whitespace", || "  padded  ".trim() == "padded");
        s.it("splits on commas", || "a,b,c".split(',').count() == 3);
    });

    spec.describe("memoized setup", |s| {
        let mut counted = Spec::new();
        counted.it_with("sees the supplied value", |value: &u64| *value == 42);
        counted.it_with("sees it unchanged", |value: &u64| *value == 42);
        s.append(counted.before_all(|| 42));
    });

    spec.describe("parallel sleepers", |s| {
        let mut pool = Spec::new();
        for index in 0..4u64 {
            pool.it(format!("sleeper {}", index), move || {
                std::thread::sleep(std::time::Duration::from_millis(5 + index));
                true
            });
        }
        s.append(pool.parallel());
    });

    if include_failures {
        spec.describe("deliberate failures", |s| {
            s.it("compares clashing text", || {
                Outcome::expected_but_got("alpha\nbeta", "alpha\ngamma")
            });
            s.it("panics on purpose", || -> Outcome { panic!("selfcheck panic") });
        });
    }

    spec
}

fn main() {
    let args: Vec<String> = env::args().skip(1).collect();

    let include_failures = match args.first().map(String::as_str) {
        Some("fail") => true,
        Some("pass") | None => false,
        Some(other) => {
            eprintln!("unknown scenario `{}`; expected `pass` or `fail`", other);
            process::exit(2);
        }
    };
    let format = match args.get(1).map(String::as_str) {
        Some("progress") => FormatMode::Progress,
        Some("failed") => FormatMode::FailedExamples,
        Some("silent") => FormatMode::Silent,
        _ => FormatMode::Specdoc,
    };

    let config = RunConfig {
        format,
        jobs: 2,
        ..RunConfig::default()
    };

    match pramana::run(demo_suite(include_failures), &config) {
        Ok(report) => {
            if !report.is_success() {
                process::exit(1);
            }
        }
        Err(error) => {
            eprintln!("{:?}", miette::Report::new(error));
            process::exit(2);
        }
    }
}
