// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subscription handles and topic patterns

use crate::topic::Topic;
use serde::{Deserialize, Serialize};

/// Opaque token returned by `subscribe`, used to unsubscribe
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(pub String);

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Description of a live subscription
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub topic: Topic,
    /// Service that owns the handler, if any
    pub owner: Option<String>,
}

/// Pattern over dot-separated topic names
/// Supports:
///   - Exact: "service.status.changed"
///   - Single wildcard: "service.*" matches "service.error"
///   - Tail: "speech.**" matches every topic under speech
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TopicPattern(String);

impl TopicPattern {
    pub fn new(pattern: &str) -> Self {
        Self(pattern.to_string())
    }

    /// Check if this pattern matches a topic
    pub fn matches(&self, topic: &Topic) -> bool {
        if self.0.is_empty() {
            return false;
        }

        if self.0 == "**" {
            return true;
        }

        let pattern_parts: Vec<&str> = self.0.split('.').collect();
        let topic_parts: Vec<&str> = topic.as_str().split('.').collect();

        Self::match_segments(&pattern_parts, &topic_parts)
    }

    fn match_segments(pattern: &[&str], topic: &[&str]) -> bool {
        match (pattern.first(), topic.first()) {
            (None, None) => true,
            (Some(&"**"), Some(_)) => true,
            (Some(&"*"), Some(_)) => Self::match_segments(&pattern[1..], &topic[1..]),
            (Some(p), Some(t)) if p == t => Self::match_segments(&pattern[1..], &topic[1..]),
            _ => false,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[path = "subscription_tests.rs"]
mod tests;
