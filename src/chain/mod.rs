//! Blockchain collaborator boundary
//!
//! The bot only needs three things from the chain: an account, a post, and a
//! way to hand over a vote. `RecordedChain` serves JSON snapshots from disk
//! and queues votes for an external broadcaster instead of signing them.

use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

mod records;
pub use records::{parse_chain_timestamp, ActiveVote, ContentRecord, RawAccount};

use crate::voting_power::Account;

pub trait Chain {
    fn account(&self, username: &str) -> Result<Account>;
    fn content(&self, author: &str, permlink: &str) -> Result<ContentRecord>;
    fn vote(&self, request: &VoteRequest) -> Result<()>;
}

/// Everything needed to cast one vote
#[derive(Clone, PartialEq, Serialize)]
pub struct VoteRequest {
    #[serde(skip)]
    pub posting_key: String,
    pub voter: String,
    pub author: String,
    pub permlink: String,
    /// Basis points, 10000 = 100%
    pub weight: i32,
}

// Keep the posting key out of logs
impl fmt::Debug for VoteRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VoteRequest")
            .field("voter", &self.voter)
            .field("author", &self.author)
            .field("permlink", &self.permlink)
            .field("weight", &self.weight)
            .finish_non_exhaustive()
    }
}

/// Chain backed by JSON snapshots of `get_accounts` / `get_content` replies
#[derive(Debug, Default)]
pub struct RecordedChain {
    account: Option<PathBuf>,
    content: Option<PathBuf>,
    outbox: Option<PathBuf>,
}

impl RecordedChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_account(mut self, path: PathBuf) -> Self {
        self.account = Some(path);
        self
    }

    pub fn with_content(mut self, path: PathBuf) -> Self {
        self.content = Some(path);
        self
    }

    /// JSON-lines file collecting accepted votes
    pub fn with_outbox(mut self, path: PathBuf) -> Self {
        self.outbox = Some(path);
        self
    }
}

impl Chain for RecordedChain {
    fn account(&self, username: &str) -> Result<Account> {
        let path = self.account.as_ref().context("No account snapshot provided")?;
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read account snapshot {:?}", path))?;
        let raw = RawAccount::from_json(&contents)
            .with_context(|| format!("Failed to parse account snapshot {:?}", path))?;
        if !raw.name.is_empty() && raw.name != username {
            bail!("Account snapshot is for \"{}\", not \"{}\"", raw.name, username);
        }
        Ok(Account::try_from(raw)?)
    }

    fn content(&self, author: &str, permlink: &str) -> Result<ContentRecord> {
        let path = self.content.as_ref().context("No content snapshot provided")?;
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read content snapshot {:?}", path))?;
        let record = ContentRecord::from_json(&contents)
            .with_context(|| format!("Failed to parse content snapshot {:?}", path))?;
        let matches_post = record.author.is_empty()
            || (record.author == author && record.permlink == permlink);
        if !record.is_missing() && !matches_post {
            bail!(
                "Content snapshot is for @{}/{}, not @{}/{}",
                record.author,
                record.permlink,
                author,
                permlink
            );
        }
        Ok(record)
    }

    fn vote(&self, request: &VoteRequest) -> Result<()> {
        let Some(path) = &self.outbox else {
            info!(request = ?request, "No outbox configured, vote not forwarded");
            return Ok(());
        };
        let line = serde_json::to_string(request).context("Failed to serialize vote request")?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open vote outbox {:?}", path))?;
        writeln!(file, "{line}")
            .with_context(|| format!("Failed to append to vote outbox {:?}", path))?;
        info!(request = ?request, outbox = %path.display(), "Queued vote");
        Ok(())
    }
}
