//! Error taxonomy for command handling and chain record ingestion

use thiserror::Error;

/// Errors surfaced to whoever issued a bot command.
///
/// Collaborator failures are translated into one of these at the command
/// boundary so nothing raw escapes to the chat layer.
#[derive(Error, Debug)]
pub enum BotError {
    #[error("{}", serde_json::to_string(.0).unwrap_or_default())]
    Validation(Vec<String>),

    #[error("Config parameter \"{0}\" cannot be changed.")]
    UnsupportedParameter(String),

    #[error("Requested content was not found")]
    NotFound,

    #[error("Chain adapter failure: {0}")]
    TransientAdapterFailure(String),
}

impl BotError {
    /// Messages to show the requester, one per line item
    pub fn messages(&self) -> Vec<String> {
        match self {
            BotError::Validation(errors) => errors.clone(),
            other => vec![other.to_string()],
        }
    }
}

impl From<anyhow::Error> for BotError {
    fn from(err: anyhow::Error) -> Self {
        BotError::TransientAdapterFailure(format!("{err:#}"))
    }
}

/// Errors while turning raw chain JSON into typed records
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Missing field \"{0}\"")]
    MissingField(&'static str),

    #[error("Field \"{field}\" is not a number: {value}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("Invalid chain timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Malformed record: {0}")]
    Json(#[from] serde_json::Error),
}
