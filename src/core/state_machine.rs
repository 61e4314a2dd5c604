//! Deployment status state machine
//!
//! Tracks the status of a Central Portal deployment as reported by the
//! status endpoint, enforcing that statuses only ever move forward and
//! keeping a timestamped history of every transition.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Deployment status as reported by the Central Portal
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeploymentStatus {
    Pending,
    Validating,
    Validated,
    Publishing,
    Published,
    Failed,
    /// Any state the portal reports that this client does not know
    #[serde(other)]
    Unknown,
}

impl DeploymentStatus {
    /// Whether no further transition happens after this status
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Validated | Self::Published | Self::Failed)
    }

    /// Position in the forward order of non-terminal statuses
    fn rank(self) -> Option<u8> {
        match self {
            Self::Pending => Some(0),
            Self::Validating => Some(1),
            Self::Publishing => Some(2),
            _ => None,
        }
    }

    /// Whether moving from `self` to `next` would go backwards
    pub fn regresses_to(self, next: DeploymentStatus) -> bool {
        if self.is_terminal() {
            return next != self;
        }
        match (self.rank(), next.rank()) {
            (Some(current), Some(next)) => next < current,
            _ => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Validating => "VALIDATING",
            Self::Validated => "VALIDATED",
            Self::Publishing => "PUBLISHING",
            Self::Published => "PUBLISHED",
            Self::Failed => "FAILED",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for DeploymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State transition
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusTransition {
    /// From status
    pub from: DeploymentStatus,

    /// To status
    pub to: DeploymentStatus,

    /// Timestamp
    pub timestamp: DateTime<Utc>,
}

/// Rejected transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Regression {
    pub from: DeploymentStatus,
    pub to: DeploymentStatus,
}

/// Forward-only status tracker
#[derive(Debug, Clone)]
pub struct StatusMachine {
    current: DeploymentStatus,
    transitions: Vec<StatusTransition>,
}

impl Default for StatusMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusMachine {
    /// Create a new state machine, starting in `PENDING`
    pub fn new() -> Self {
        Self {
            current: DeploymentStatus::Pending,
            transitions: Vec::new(),
        }
    }

    /// Move to `to`, returning whether the status actually changed
    pub fn transition(&mut self, to: DeploymentStatus) -> Result<bool, Regression> {
        if to == self.current {
            return Ok(false);
        }
        if self.current.regresses_to(to) {
            return Err(Regression {
                from: self.current,
                to,
            });
        }

        self.transitions.push(StatusTransition {
            from: self.current,
            to,
            timestamp: Utc::now(),
        });
        self.current = to;

        Ok(true)
    }

    /// Get current status
    pub fn current(&self) -> DeploymentStatus {
        self.current
    }

    pub fn transitions(&self) -> &[StatusTransition] {
        &self.transitions
    }

    /// Milliseconds between the first and the last transition
    pub fn elapsed_millis(&self) -> i64 {
        match (self.transitions.first(), self.transitions.last()) {
            (Some(first), Some(last)) => (last.timestamp - first.timestamp).num_milliseconds(),
            _ => 0,
        }
    }

    /// Get transition history as human-readable string
    pub fn history(&self) -> String {
        self.transitions
            .iter()
            .map(|t| format!("{}: {} → {}", t.timestamp.to_rfc3339(), t.from, t.to))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
