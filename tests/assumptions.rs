//! End-to-end behaviour of checks and finalization through `Assumptions::run`.

use std::sync::{Arc, Mutex};

use assume::{assume, AssumeConfig, Assumptions, Expectation, Failure, Locals, Outcome};

fn context() -> Assumptions {
    Assumptions::new(AssumeConfig::default())
}

fn aggregate_of(outcome: Outcome) -> assume::AggregateFailure {
    match outcome {
        Outcome::Failed(Failure::Assumptions(aggregate)) => aggregate,
        other => panic!("expected an assumption failure, got {other:?}"),
    }
}

#[test]
fn passing_assumption_passes() {
    let outcome = context().run("passing", &Expectation::Pass, |t| {
        assume!(t, 1 == 1);
    });
    assert_eq!(outcome, Outcome::Passed);
}

#[test]
fn failing_assumption_fails_with_summary() {
    let outcome = context().run("failing", &Expectation::Pass, |t| {
        assume!(t, 1 == 2);
    });
    let report = outcome.to_string();
    assert!(report.contains("1 Failed Assumptions:"));
    assert!(report.contains("tests/assumptions.rs:"));
    assert!(!report.contains("context.rs"));
}

#[test]
fn entry_points_at_the_failing_call() {
    let ctx = context();
    let mut expected_line = 0;
    let outcome = ctx.run("call-line", &Expectation::Pass, |t| {
        assume!(t, 1 == 1);
        expected_line = line!() + 1;
        assume!(t, 1 == 2);
    });
    let aggregate = aggregate_of(outcome);
    assert_eq!(aggregate.count(), 1);
    assert_eq!(aggregate.entries()[0].line(), expected_line);
    assert!(aggregate.entries()[0].file().ends_with("assumptions.rs"));
}

#[test]
fn only_falsy_checks_are_counted_in_call_order() {
    let outcome = context().run("interleaved", &Expectation::Pass, |t| {
        assume!(t, "abcdefghijklmnopqrstuvwxyz".contains("xyz"));
        assume!(t, 2 == 2);
        assume!(t, 1 == 2, "first");
        assume!(t, "abcd".contains("xyz"), "second");
    });
    let aggregate = aggregate_of(outcome);
    assert_eq!(aggregate.count(), 2);
    let messages: Vec<_> = aggregate.entries().iter().map(|e| e.message()).collect();
    assert_eq!(messages, vec!["first", "second"]);
    assert!(aggregate.to_string().starts_with("2 Failed Assumptions:"));
}

#[test]
fn count_matches_falsy_checks_for_mixed_sequences() {
    let results = [false, true, false, false, true, true, false];
    let outcome = context().run("mixed", &Expectation::Pass, |t| {
        for held in results {
            assume!(t, held);
        }
    });
    let expected = results.iter().filter(|held| !**held).count();
    assert_eq!(aggregate_of(outcome).count(), expected);
}

#[test]
fn passing_assumption_does_not_cloak_a_panic() {
    let outcome = context().run("cloak-pass", &Expectation::Pass, |t| {
        assume!(t, 1 == 1);
        assert_eq!(1, 2);
    });
    let Outcome::Failed(Failure::Error(failure)) = outcome else {
        panic!("expected the panic to surface");
    };
    assert_eq!(failure.kind(), "panic");
    assert!(failure.message().contains("assertion `left == right` failed"));
    assert!(failure.sections().is_empty());
}

#[test]
fn failing_assumption_is_appended_to_a_panic() {
    let outcome = context().run("cloak-fail", &Expectation::Pass, |t| {
        let (a, b) = (1, 2);
        assume!(t, 1 == 2);
        assert_eq!(a, b);
    });
    let Outcome::Failed(Failure::Error(failure)) = outcome else {
        panic!("expected the panic to surface");
    };
    let report = failure.to_string();
    assert!(report.starts_with("panic: assertion `left == right` failed"));
    assert!(report.contains("1 Failed Assumptions:"));
}

fn failing_helper() {
    panic!("helper gave up");
}

#[test]
fn panic_from_a_helper_keeps_its_own_message() {
    let outcome = context().run("helper", &Expectation::Pass, |t| {
        assume!(t, 1 == 2);
        failing_helper();
    });
    let Outcome::Failed(Failure::Error(failure)) = outcome else {
        panic!("expected the helper panic to surface");
    };
    assert_eq!(failure.message(), "helper gave up");
    assert!(failure.sections()[0].text.contains("1 Failed Assumptions:"));
}

#[test]
fn message_is_in_output() {
    let outcome = context().run("message", &Expectation::Pass, |t| {
        let (a, b) = (1, 2);
        assume!(t, a == b, "a:{} b:{}", a, b);
    });
    assert!(outcome.to_string().contains("a:1 b:2"));
}

#[test]
fn locals_are_listed_when_enabled() {
    let ctx = Assumptions::new(AssumeConfig::default().with_capture_locals(true));
    let outcome = ctx.run("with-locals", &Expectation::Pass, |t| {
        let a = 1;
        let b = 2;
        assume!(t, a == b; a, b);
    });
    let report = outcome.to_string();
    assert!(report.contains("1 Failed Assumptions:"));
    assert!(report.contains("a          = 1"));
    assert!(report.contains("b          = 2"));
}

#[test]
fn locals_are_absent_when_disabled() {
    let config = AssumeConfig::default()
        .with_capture_locals(false)
        .with_source_context(false);
    let ctx = Assumptions::new(config);
    let outcome = ctx.run("without-locals", &Expectation::Pass, |t| {
        let a = 1;
        let b = 2;
        assume!(t, a == b; a, b);
    });
    let aggregate = aggregate_of(outcome);
    assert_eq!(aggregate.count(), 1);
    assert_eq!(aggregate.entries()[0].rendered_detail(), ">       a == b");
}

#[test]
fn failing_assumption_satisfies_xfail() {
    let outcome = context().run("xfail", &Expectation::xfail("testfail"), |t| {
        assume!(t, 1 == 2, "ledger out of balance");
    });
    let Outcome::XFailed { reason } = outcome else {
        panic!("expected xfail");
    };
    assert!(reason.contains("testfail"));
    assert!(reason.contains("ledger out of balance"));
}

#[test]
fn passing_assumption_under_xfail_is_xpass() {
    let outcome = context().run("xpass", &Expectation::xfail("testfail"), |t| {
        assume!(t, true);
    });
    assert_eq!(
        outcome,
        Outcome::XPassed {
            reason: "testfail".into()
        }
    );
}

#[test]
fn strict_xfail_turns_a_pass_into_a_failure() {
    let outcome = context().run("strict", &Expectation::strict_xfail("testfail"), |t| {
        assume!(t, true);
    });
    assert_eq!(outcome.to_string(), "FAIL\n[XPASS(strict)] testfail");
}

#[test]
fn byte_strings_fail_cleanly() {
    let outcome = context().run("bytes", &Expectation::Pass, |t| {
        assume!(t, b"\x01" == b"\x5b");
    });
    assert_eq!(aggregate_of(outcome).count(), 1);
}

#[test]
fn unicode_strings_fail_cleanly() {
    let outcome = context().run("unicode", &Expectation::Pass, |t| {
        assume!(t, "\u{5b}" == "\u{5a}");
    });
    assert_eq!(aggregate_of(outcome).count(), 1);
}

#[test]
fn mixed_byte_and_text_fail_cleanly() {
    let ctx = Assumptions::new(AssumeConfig::default().with_capture_locals(true));
    let outcome = ctx.run("mixed-strings", &Expectation::Pass, |t| {
        let raw: &[u8] = b"\x5b";
        let text = "\u{5a}";
        assume!(t, raw == text.as_bytes(); raw, text);
    });
    let aggregate = aggregate_of(outcome);
    assert_eq!(aggregate.count(), 1);
    assert!(aggregate.entries()[0].rendered_detail().contains("\"Z\""));
}

#[test]
fn byte_locals_render_as_byte_strings() {
    let ctx = Assumptions::new(
        AssumeConfig::default()
            .with_capture_locals(true)
            .with_source_context(false),
    );
    let outcome = ctx.run("byte-locals", &Expectation::Pass, |t| {
        let raw: &[u8] = b"\x5b";
        let text = "\u{5a}";
        let mut locals = Locals::new().with("text", text);
        locals.push_bytes("raw", raw);
        let site = assume::call_site!(raw == text.as_bytes()).with_locals(locals);
        t.check(site, raw == text.as_bytes(), None);
    });
    let aggregate = aggregate_of(outcome);
    assert_eq!(
        aggregate.entries()[0].rendered_detail(),
        ">       raw == text.as_bytes()\n\n\
         raw        = b\"[\"\n\
         text       = \"Z\""
    );
}

#[test]
fn erroring_condition_is_a_failure_with_its_error() {
    let outcome = context().run("raises", &Expectation::Pass, |t| {
        let parsed = assume!(t, "seven".parse::<u8>().map(|n| n == 7));
        assert!(!parsed);
    });
    let aggregate = aggregate_of(outcome);
    let entry = &aggregate.entries()[0];
    assert!(entry.message().contains("ParseIntError"));
    assert!(entry.rendered_detail().contains("invalid digit found in string"));
}

#[test]
fn pass_hook_sees_line_and_check_returns_true() {
    let ctx = context();
    let lines = Arc::new(Mutex::new(Vec::new()));
    {
        let lines = Arc::clone(&lines);
        ctx.on_pass(move |line| lines.lock().unwrap().push(line));
    }
    let mut returned = None;
    let mut line = 0;
    let outcome = ctx.run("pass-hook", &Expectation::Pass, |t| {
        line = line!() + 1;
        returned = Some(assume!(t, 1 == 1));
        failing_helper();
    });
    assert!(outcome.is_failure());
    assert_eq!(returned, Some(true));
    assert_eq!(*lines.lock().unwrap(), vec![line]);
}

#[test]
fn fail_hook_sees_entry_and_check_returns_false() {
    let ctx = context();
    let seen = Arc::new(Mutex::new(Vec::new()));
    {
        let seen = Arc::clone(&seen);
        ctx.on_fail(move |line, entry| {
            seen.lock()
                .unwrap()
                .push((line, entry.line(), entry.message().to_string()))
        });
    }
    let mut returned = None;
    let outcome = ctx.run("fail-hook", &Expectation::Pass, |t| {
        returned = Some(assume!(t, 1 == 2));
    });
    assert!(outcome.is_failure());
    assert_eq!(returned, Some(false));
    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].0, seen[0].1);
    assert_eq!(seen[0].2, "AssumptionFailure: `1 == 2`");
}

#[test]
fn panicking_hook_does_not_disturb_the_test() {
    let ctx = context();
    ctx.on_fail(|_, _| panic!("hook bug"));
    let outcome = ctx.run("bad-hook", &Expectation::Pass, |t| {
        assert!(!assume!(t, false));
        assume!(t, false);
    });
    assert_eq!(aggregate_of(outcome).count(), 2);
}

#[test]
fn tests_do_not_see_each_other() {
    let ctx = context();
    let first = ctx.run("a", &Expectation::Pass, |t| {
        assume!(t, false);
        assume!(t, false);
    });
    assert_eq!(aggregate_of(first).count(), 2);
    let second = ctx.run("b", &Expectation::Pass, |t| {
        assert_eq!(t.failures(), 0);
        assume!(t, true);
    });
    assert_eq!(second, Outcome::Passed);
    assert_eq!(ctx.registry().active(), 0);
}

#[test]
fn concurrent_tests_are_isolated() {
    let ctx = Arc::new(context());
    let handles: Vec<_> = (0..6usize)
        .map(|n| {
            let ctx = Arc::clone(&ctx);
            std::thread::spawn(move || {
                ctx.run(format!("parallel-{n}"), &Expectation::Pass, |t| {
                    for _ in 0..n {
                        assume!(t, false);
                    }
                })
            })
        })
        .collect();
    for (n, handle) in handles.into_iter().enumerate() {
        let outcome = handle.join().unwrap();
        if n == 0 {
            assert_eq!(outcome, Outcome::Passed);
        } else {
            assert_eq!(aggregate_of(outcome).count(), n);
        }
    }
    assert_eq!(ctx.registry().active(), 0);
}
