// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use proptest::prelude::*;

fn topic(name: &str) -> Topic {
    Topic::new(name)
}

#[test]
fn exact_pattern_matches_exact_topic() {
    let pattern = TopicPattern::new("service.status.changed");
    assert!(pattern.matches(&topic("service.status.changed")));
    assert!(!pattern.matches(&topic("service.error")));
    assert!(!pattern.matches(&topic("service.status")));
}

#[test]
fn wildcard_matches_single_segment() {
    let pattern = TopicPattern::new("service.*");
    assert!(pattern.matches(&topic("service.error")));
    assert!(!pattern.matches(&topic("service.status.changed")));
    assert!(!pattern.matches(&topic("metrics.performance")));
}

#[test]
fn double_wildcard_matches_remaining_segments() {
    let pattern = TopicPattern::new("service.**");
    assert!(pattern.matches(&topic("service.error")));
    assert!(pattern.matches(&topic("service.status.changed")));
    assert!(!pattern.matches(&topic("service")));
    assert!(!pattern.matches(&topic("speech.transcript")));
}

#[test]
fn empty_pattern_matches_nothing() {
    let empty = TopicPattern::new("");
    assert!(!empty.matches(&topic("ping")));
}

proptest! {
    #[test]
    fn global_wildcard_matches_any_topic(segments in proptest::collection::vec("[a-z]{1,6}", 1..5)) {
        let name = segments.join(".");
        prop_assert!(TopicPattern::new("**").matches(&topic(&name)));
        prop_assert!(TopicPattern::new(&name).matches(&topic(&name)));
    }
}
