//! Subscription lifecycle
//!
//! `Idle -> Subscribed -> Emitting -> Completed`, with `Failed` and
//! `Cancelled` as the other terminal states. There is no way back to `Idle`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// State of a single subscription
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionState {
    /// Sequence built, nobody subscribed yet
    #[default]
    Idle,
    /// Subscribed, no element seen yet
    Subscribed,
    /// At least one element delivered
    Emitting,
    /// Upstream finished normally
    Completed,
    /// A stage failed
    Failed,
    /// Subscriber cancelled
    Cancelled,
}

impl SubscriptionState {
    /// Whether no further signal can follow
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// Whether `self -> next` is a legal transition
    pub fn can_transition_to(self, next: Self) -> bool {
        use SubscriptionState::*;
        match (self, next) {
            (Idle, Subscribed) => true,
            (Subscribed, Emitting) | (Emitting, Emitting) => true,
            (Subscribed | Emitting, Completed | Failed | Cancelled) => true,
            _ => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Subscribed => "subscribed",
            Self::Emitting => "emitting",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for SubscriptionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
