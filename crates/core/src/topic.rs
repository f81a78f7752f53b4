// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Topic identifiers
//!
//! Topics are dot-namespaced strings (`service.status.changed`). Three of them
//! are reserved for lifecycle and metrics reporting and always exist in a
//! registry.

use serde::{Deserialize, Serialize};

/// Lifecycle status changes of every service
pub const STATUS_CHANGED: &str = "service.status.changed";
/// Contained handler failures
pub const SERVICE_ERROR: &str = "service.error";
/// Timing samples reported by services
pub const PERFORMANCE: &str = "metrics.performance";

/// All reserved topic names
pub const RESERVED: [&str; 3] = [STATUS_CHANGED, SERVICE_ERROR, PERFORMANCE];

/// Named channel on the event bus
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Topic(pub String);

impl Topic {
    pub fn new(name: impl Into<String>) -> Self {
        Topic(name.into())
    }

    pub fn status_changed() -> Self {
        Topic::new(STATUS_CHANGED)
    }

    pub fn service_error() -> Self {
        Topic::new(SERVICE_ERROR)
    }

    pub fn performance() -> Self {
        Topic::new(PERFORMANCE)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is one of the reporting topics owned by the framework
    pub fn is_reserved(&self) -> bool {
        RESERVED.contains(&self.0.as_str())
    }

    /// A topic name must be non-empty, free of whitespace, and must not start,
    /// end, or contain an empty `.` segment.
    pub fn is_well_formed(&self) -> bool {
        !self.0.is_empty()
            && !self.0.chars().any(char::is_whitespace)
            && self.0.split('.').all(|segment| !segment.is_empty())
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Topic {
    fn from(s: &str) -> Self {
        Topic(s.to_string())
    }
}

impl From<String> for Topic {
    fn from(s: String) -> Self {
        Topic(s)
    }
}

impl From<&Topic> for Topic {
    fn from(t: &Topic) -> Self {
        t.clone()
    }
}

impl PartialEq<str> for Topic {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Topic {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_topics_are_recognized() {
        assert!(Topic::status_changed().is_reserved());
        assert!(Topic::service_error().is_reserved());
        assert!(Topic::performance().is_reserved());
        assert!(!Topic::new("audio.chunk").is_reserved());
    }

    #[test]
    fn well_formed_names() {
        assert!(Topic::new("ping").is_well_formed());
        assert!(Topic::new("speech.transcript.final").is_well_formed());
        assert!(!Topic::new("").is_well_formed());
        assert!(!Topic::new(".audio").is_well_formed());
        assert!(!Topic::new("audio.").is_well_formed());
        assert!(!Topic::new("audio..chunk").is_well_formed());
        assert!(!Topic::new("audio chunk").is_well_formed());
    }

    #[test]
    fn compares_with_str() {
        let topic = Topic::from("ping");
        assert_eq!(topic, "ping");
        assert_eq!(topic.to_string(), "ping");
    }
}
