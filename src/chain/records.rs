//! Typed chain records
//!
//! Raw account/content JSON from the chain API is turned into typed records
//! here, once. Downstream code never inspects raw JSON.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::constants::chain::{MISSING_CONTENT_ID, TIMESTAMP_FORMAT};
use crate::error::IngestError;
use crate::voting_power::{Account, LegacyAccount, ManaBarAccount};

/// Chain timestamps carry no zone marker but are always UTC
pub fn parse_chain_timestamp(text: &str) -> Result<DateTime<Utc>, IngestError> {
    let text = text.trim();
    if let Ok(naive) = NaiveDateTime::parse_from_str(text, TIMESTAMP_FORMAT) {
        return Ok(Utc.from_utc_datetime(&naive));
    }
    DateTime::parse_from_rfc3339(text)
        .map(|instant| instant.with_timezone(&Utc))
        .map_err(|_| IngestError::InvalidTimestamp(text.to_string()))
}

fn deserialize_optional_timestamp<'de, D>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let raw = Option::<String>::deserialize(deserializer)?;
    raw.map(|text| parse_chain_timestamp(&text).map_err(D::Error::custom))
        .transpose()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ActiveVote {
    pub voter: String,
    #[serde(default)]
    pub weight: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContentRecord {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub permlink: String,
    #[serde(default, deserialize_with = "deserialize_optional_timestamp")]
    pub created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub active_votes: Vec<ActiveVote>,
}

impl ContentRecord {
    pub fn from_json(text: &str) -> Result<Self, IngestError> {
        Ok(serde_json::from_str(text)?)
    }

    /// The chain answers unknown posts with an empty record, id 0
    pub fn is_missing(&self) -> bool {
        self.id == MISSING_CONTENT_ID
    }

    pub fn has_vote_from(&self, voter: &str) -> bool {
        self.active_votes.iter().any(|vote| vote.voter == voter)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawManabar {
    pub current_mana: Value,
    pub last_update_time: i64,
}

/// Account as returned by the chain API, before its shape is decided
#[derive(Debug, Clone, Deserialize)]
pub struct RawAccount {
    #[serde(default)]
    pub name: String,
    pub vesting_shares: Option<Value>,
    pub received_vesting_shares: Option<Value>,
    pub delegated_vesting_shares: Option<Value>,
    pub vesting_withdraw_rate: Option<Value>,
    pub voting_manabar: Option<RawManabar>,
    pub energy: Option<i64>,
    pub voting_power: Option<i64>,
    pub last_vote_time: Option<String>,
}

impl RawAccount {
    pub fn from_json(text: &str) -> Result<Self, IngestError> {
        Ok(serde_json::from_str(text)?)
    }
}

impl TryFrom<RawAccount> for Account {
    type Error = IngestError;

    /// Mana bar wins over `energy`, which wins over `voting_power`
    fn try_from(raw: RawAccount) -> Result<Self, Self::Error> {
        if let Some(manabar) = raw.voting_manabar {
            return Ok(Account::ManaBar(ManaBarAccount {
                vesting_shares: required_amount("vesting_shares", raw.vesting_shares.as_ref())?,
                received_vesting_shares: required_amount(
                    "received_vesting_shares",
                    raw.received_vesting_shares.as_ref(),
                )?,
                delegated_vesting_shares: required_amount(
                    "delegated_vesting_shares",
                    raw.delegated_vesting_shares.as_ref(),
                )?,
                vesting_withdraw_rate: required_amount(
                    "vesting_withdraw_rate",
                    raw.vesting_withdraw_rate.as_ref(),
                )?,
                current_mana: required_amount("current_mana", Some(&manabar.current_mana))?,
                last_update_time: manabar.last_update_time,
            }));
        }

        let last_vote_time = raw
            .last_vote_time
            .as_deref()
            .ok_or(IngestError::MissingField("last_vote_time"))
            .and_then(parse_chain_timestamp)?;

        match (raw.energy, raw.voting_power) {
            (Some(stored), _) => Ok(Account::Energy(LegacyAccount { stored, last_vote_time })),
            (None, Some(stored)) => {
                Ok(Account::VotingPower(LegacyAccount { stored, last_vote_time }))
            }
            (None, None) => Err(IngestError::MissingField("voting_power")),
        }
    }
}

/// Asset amounts arrive as numbers or as "1234.567890 VESTS"
fn required_amount(field: &'static str, value: Option<&Value>) -> Result<f64, IngestError> {
    let invalid = |value: &Value| IngestError::InvalidNumber {
        field,
        value: value.to_string(),
    };
    match value {
        None | Some(Value::Null) => Err(IngestError::MissingField(field)),
        Some(Value::Number(n)) => n.as_f64().ok_or_else(|| invalid(&Value::Number(n.clone()))),
        Some(value @ Value::String(text)) => leading_number(text).ok_or_else(|| invalid(value)),
        Some(other) => Err(invalid(other)),
    }
}

/// Parse the numeric prefix of an amount string, ignoring the asset symbol
fn leading_number(text: &str) -> Option<f64> {
    let text = text.trim_start();
    let end = text
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || c == '.' || (i == 0 && (c == '-' || c == '+'))))
        .map_or(text.len(), |(i, _)| i);
    text[..end].parse().ok()
}
