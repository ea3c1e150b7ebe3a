//! `soft` inside ordinary `#[test]` functions, against the global context.

use assume::{assume, soft, TestFailure};

#[test]
fn passing_checks_let_the_test_pass() {
    soft(|t| {
        assert!(assume!(t, 2 + 2 == 4));
        assume!(t, "abc".starts_with('a'), "prefix");
    });
}

#[test]
#[should_panic(expected = "1 Failed Assumptions:")]
fn failing_check_fails_at_the_end() {
    soft(|t| {
        assume!(t, 1 == 2);
        assume!(t, 1 == 1);
    });
}

#[test]
#[should_panic(expected = "3 Failed Assumptions:")]
fn every_failure_is_collected_before_failing() {
    soft(|t| {
        for n in 0..3 {
            assume!(t, n > 5, "n was {}", n);
        }
    });
}

#[test]
#[should_panic(expected = "panic: index out of bounds")]
fn body_panic_leads_the_report() {
    soft(|t| {
        let values: Vec<u8> = Vec::new();
        assume!(t, values.len() == 1);
        let first = values[0];
        assume!(t, first == 0);
    });
}

#[test]
#[should_panic(expected = "checksum mismatch")]
fn returned_error_leads_the_report() {
    soft(|t| -> Result<(), TestFailure> {
        assume!(t, false);
        Err(TestFailure::new("io", "checksum mismatch"))
    });
}
