//! Constants shared across the bot
//!
//! File names, vote weight limits, and the chain's regeneration parameters.

/// Config file locations
pub mod config {
    /// Directory under the platform config dir
    pub const APP_DIR: &str = "upvote-bot";

    /// Default (read-only) config filename
    pub const FILENAME: &str = "config.json";

    /// Key in the default config naming the override file
    pub const RUNTIME_FILE_KEY: &str = "runtimeConfigFile";

    /// Override filename used when the default config doesn't name one
    pub const DEFAULT_RUNTIME_FILENAME: &str = "runtime-config.json";

    /// Environment variable pointing at the default config file
    pub const CONFIG_ENV_VAR: &str = "UPVOTE_BOT_CONFIG";

    /// Keys whose values are never echoed back to chat
    pub const SECRET_KEYS: &[&str] = &["postingKey", "botToken"];
}

/// Vote weight limits (percent)
pub mod weight {
    /// Smallest accepted vote weight
    pub const MIN: f64 = 0.01;

    /// Largest accepted vote weight
    pub const MAX: f64 = 100.0;

    /// Multiplier from percent to chain basis points (100% = 10000)
    pub const BASIS_POINTS_PER_PERCENT: f64 = 100.0;
}

/// Voting power regeneration constants
pub mod voting_power {
    /// Full regeneration window: 432000 sec = 5 days
    pub const REGEN_WINDOW_SECONDS: f64 = 432_000.0;

    /// Mana per vesting share
    pub const MANA_PER_SHARE: f64 = 1_000_000.0;

    /// Legacy energy / voting_power scale (100.00% = 10000)
    pub const LEGACY_SCALE: i64 = 10_000;
}

/// Chain record formats
pub mod chain {
    /// Timestamp layout used by chain records (always UTC, no suffix)
    pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

    /// Content id signalling "not found"
    pub const MISSING_CONTENT_ID: u64 = 0;
}

/// Logging
pub mod logging {
    /// Environment variable selecting the log level
    pub const LEVEL_ENV_VAR: &str = "LOG_LEVEL";
}
