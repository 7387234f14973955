//! Voting power of the bot account
//!
//! Voting capacity regenerates linearly over a five day window. Depending on
//! chain version an account reports it as a mana bar or as a legacy
//! `energy` / `voting_power` number; the shape is fixed at ingestion.

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::constants::voting_power::{LEGACY_SCALE, MANA_PER_SHARE, REGEN_WINDOW_SECONDS};

#[derive(Debug, Clone, PartialEq)]
pub struct ManaBarAccount {
    pub vesting_shares: f64,
    pub received_vesting_shares: f64,
    pub delegated_vesting_shares: f64,
    pub vesting_withdraw_rate: f64,
    pub current_mana: f64,
    /// Unix seconds
    pub last_update_time: i64,
}

/// Pre-mana-bar account: stored value on the 0..=10000 scale at last vote
#[derive(Debug, Clone, PartialEq)]
pub struct LegacyAccount {
    pub stored: i64,
    pub last_vote_time: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Account {
    ManaBar(ManaBarAccount),
    Energy(LegacyAccount),
    VotingPower(LegacyAccount),
}

/// Current voting power in percent (0–100)
pub fn calculate(account: &Account, now: DateTime<Utc>) -> f64 {
    match account {
        Account::ManaBar(account) => mana_bar_percent(account, now),
        Account::Energy(account) | Account::VotingPower(account) => legacy_percent(account, now),
    }
}

fn mana_bar_percent(account: &ManaBarAccount, now: DateTime<Utc>) -> f64 {
    let total_shares = account.vesting_shares + account.received_vesting_shares
        - account.delegated_vesting_shares
        - account.vesting_withdraw_rate;
    let max_mana = total_shares * MANA_PER_SHARE;

    // No effective stake means no voting power
    if max_mana.is_nan() || max_mana <= 0.0 {
        warn!(total_shares, "Account has no effective vesting shares, reporting 0% voting power");
        return 0.0;
    }

    let elapsed = (now.timestamp() - account.last_update_time) as f64;
    let regenerated = elapsed * max_mana / REGEN_WINDOW_SECONDS;
    let current_mana = (account.current_mana + regenerated).min(max_mana);

    round_to_hundredths(current_mana * 100.0 / max_mana)
}

fn legacy_percent(account: &LegacyAccount, now: DateTime<Utc>) -> f64 {
    let elapsed = (now - account.last_vote_time).num_seconds() as f64;
    let regenerated = account.stored as f64 + elapsed * LEGACY_SCALE as f64 / REGEN_WINDOW_SECONDS;
    let current = (regenerated.trunc() as i64).min(LEGACY_SCALE);

    current as f64 / 100.0
}

fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Presence line shown by the chat client
pub fn status_line(percent: f64) -> String {
    format!("VP - {percent:.2}%.")
}
