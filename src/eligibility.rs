//! Vote eligibility
//!
//! Decides whether the bot may vote on a post. Checks run in a fixed order:
//! duplicate vote first, then the post age window.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::chain::ContentRecord;
use crate::config::{ConfigStore, Parameter};
use crate::relative_time::parse_instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
    AlreadyVoted,
    /// Post is newer than `minPostAge` allows
    TooEarly,
    /// Post is older than `maxPostAge` allows
    TooLate,
    Eligible,
}

/// Snapshot of the settings the decision depends on
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VotePolicy {
    pub voter: String,
    pub min_post_age: Option<String>,
    pub max_post_age: Option<String>,
}

impl VotePolicy {
    pub fn from_store(store: &ConfigStore) -> Self {
        Self {
            voter: store.text(Parameter::Username).unwrap_or_default().to_string(),
            min_post_age: store.bound(Parameter::MinPostAge).map(str::to_string),
            max_post_age: store.bound(Parameter::MaxPostAge).map(str::to_string),
        }
    }
}

pub fn evaluate(record: &ContentRecord, policy: &VotePolicy, now: DateTime<Utc>) -> VoteOutcome {
    if record.has_vote_from(&policy.voter) {
        return VoteOutcome::AlreadyVoted;
    }

    let Some(created) = record.created else {
        debug!(id = record.id, "Post has no creation time, skipping age window");
        return VoteOutcome::Eligible;
    };

    if let Some(min) = resolve_bound("minPostAge", policy.min_post_age.as_deref(), now)
        && created > min
    {
        return VoteOutcome::TooEarly;
    }
    if let Some(max) = resolve_bound("maxPostAge", policy.max_post_age.as_deref(), now)
        && created < max
    {
        return VoteOutcome::TooLate;
    }

    VoteOutcome::Eligible
}

fn resolve_bound(
    name: &str,
    expression: Option<&str>,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    let expression = expression.filter(|text| !text.trim().is_empty())?;
    let instant = parse_instant(expression, now);
    if instant.is_none() {
        warn!(
            parameter = %name,
            value = %expression,
            "Ignoring post age bound that does not parse"
        );
    }
    instant
}
