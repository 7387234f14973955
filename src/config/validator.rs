//! Validation of candidate config values
//!
//! Returns human-readable messages; an empty list means the value is fine.
//! Parameters without rules always pass.

use chrono::{DateTime, Utc};
use tracing::warn;

use super::format::CandidateValue;
use super::parameter::Parameter;
use super::store::ConfigStore;
use crate::constants::weight;
use crate::relative_time::parse_instant;

const UNPARSEABLE_DATE: &str = "Cannot receive Date from provided config value, please use another one.";

pub fn validate(
    store: &ConfigStore,
    key: &str,
    value: &CandidateValue,
    now: DateTime<Utc>,
) -> Vec<String> {
    let Some(parameter) = Parameter::from_identifier(key) else {
        return Vec::new();
    };

    match (parameter, value) {
        (Parameter::VoteWeight, CandidateValue::Number(number)) => validate_weight(*number),
        (Parameter::VoteWeight, CandidateValue::Expression(text)) => {
            validate_weight(text.trim().parse().unwrap_or(f64::NAN))
        }
        (Parameter::MinPostAge | Parameter::MaxPostAge, CandidateValue::Expression(text)) => {
            validate_post_age(store, parameter, text, now)
        }
        (Parameter::MinPostAge | Parameter::MaxPostAge, CandidateValue::Number(_)) => {
            vec![UNPARSEABLE_DATE.to_string()]
        }
        _ => Vec::new(),
    }
}

fn validate_weight(number: f64) -> Vec<String> {
    if number.is_finite() && (weight::MIN..=weight::MAX).contains(&number) {
        Vec::new()
    } else {
        vec![format!(
            "Vote weight must be a number from {} to {}.",
            weight::MIN,
            weight::MAX
        )]
    }
}

/// The window only makes sense when the minimum bound is more recent than
/// the maximum bound. Both are compared as instants against the same `now`;
/// phrases don't sort lexically.
fn validate_post_age(
    store: &ConfigStore,
    parameter: Parameter,
    text: &str,
    now: DateTime<Utc>,
) -> Vec<String> {
    let Some(candidate) = parse_instant(text, now) else {
        return vec![UNPARSEABLE_DATE.to_string()];
    };
    let Some(sibling) = parameter.sibling_bound() else {
        return Vec::new();
    };
    let Some(sibling_text) = store.bound(sibling) else {
        return Vec::new();
    };
    let Some(sibling_instant) = parse_instant(sibling_text, now) else {
        warn!(
            parameter = %sibling,
            value = %sibling_text,
            "Stored post age bound does not parse, skipping order check"
        );
        return Vec::new();
    };

    let (ordered, relation) = match parameter {
        Parameter::MinPostAge => (candidate > sibling_instant, "more recent than"),
        _ => (candidate < sibling_instant, "older than"),
    };
    if ordered {
        Vec::new()
    } else {
        vec![format!(
            "Provided value must be {relation} \"{sibling}\" parameter (its value \"{sibling_text}\"). Change it before."
        )]
    }
}
