//! Value conversion around validation
//!
//! `pre_format` turns the raw tokens of a `config` command into a candidate
//! value, `post_format` turns a validated candidate into what gets stored.

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::parameter::{DomainType, Parameter};
use crate::relative_time::{humanize, parse_instant};

/// Candidate value awaiting validation
#[derive(Debug, Clone, PartialEq)]
pub enum CandidateValue {
    Number(f64),
    Expression(String),
}

/// Build a candidate from user tokens.
///
/// `None` means the parameter can't be changed this way at all, which is
/// different from a value that fails validation. Non-numeric weights become
/// NaN and are left for the validator to reject.
pub fn pre_format(key: &str, tokens: &[String]) -> Option<CandidateValue> {
    let parameter = Parameter::from_identifier(key).filter(|p| p.is_mutable())?;
    match parameter.domain_type() {
        DomainType::Number => {
            let number = tokens
                .first()
                .and_then(|token| token.trim().parse::<f64>().ok())
                .unwrap_or(f64::NAN);
            Some(CandidateValue::Number(number))
        }
        DomainType::DurationExpression => Some(CandidateValue::Expression(tokens.join(" "))),
        DomainType::Other => None,
    }
}

/// Canonical stored form of a validated candidate.
///
/// Post age phrases are re-rendered relative to `now`, so "72 hours ago"
/// and "3 days ago" are both stored as "3 days ago".
pub fn post_format(key: &str, value: &CandidateValue, now: DateTime<Utc>) -> Option<Value> {
    let parameter = Parameter::from_identifier(key).filter(|p| p.is_mutable())?;
    match (parameter.domain_type(), value) {
        (DomainType::Number, CandidateValue::Number(number)) => {
            serde_json::Number::from_f64(*number).map(Value::Number)
        }
        (DomainType::DurationExpression, CandidateValue::Expression(text)) => {
            let instant = parse_instant(text, now)?;
            Some(Value::String(humanize(instant, now)))
        }
        _ => None,
    }
}
