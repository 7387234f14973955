//! Bot command handling
//!
//! A command arrives already split into a name and parameters. Handlers turn
//! it into reply text; every failure is reported to the user as a reply and
//! never escapes as an error.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{error, info, warn};

use crate::chain::{Chain, VoteRequest};
use crate::config::{post_format, pre_format, validate, CandidateValue, ConfigStore, Parameter};
use crate::constants::config::SECRET_KEYS;
use crate::constants::weight::BASIS_POINTS_PER_PERCENT;
use crate::eligibility::{evaluate, VoteOutcome, VotePolicy};
use crate::error::BotError;
use crate::messages;
use crate::persistence::PendingWrite;
use crate::post_url::{parse_post_url, PostRef};
use crate::voting_power;

const MASKED_VALUE: &str = "\"********\"";

/// Reply text plus the config save it triggered, if any
#[derive(Debug)]
pub struct Reply {
    pub text: String,
    pub pending: Option<PendingWrite>,
}

impl From<String> for Reply {
    fn from(text: String) -> Self {
        Self { text, pending: None }
    }
}

pub fn dispatch(
    store: &mut ConfigStore,
    chain: &dyn Chain,
    user_id: &str,
    command: &str,
    params: &[String],
    now: DateTime<Utc>,
) -> Reply {
    info!(user = %user_id, command = %command, params = params.len(), "Handling command");
    let prefix = store.text(Parameter::CommandPrefix).unwrap_or_default().to_string();

    match command {
        "help" | "info" => handle_help(store, user_id).into(),
        "config" => {
            if !check_permission(store, user_id) {
                warn!(user = %user_id, command = %command, "Permission denied");
                return messages::permission_denied(user_id, &prefix, command).into();
            }
            handle_config(store, user_id, params, now)
        }
        "upvote" => handle_upvote(store, chain, user_id, params, now).into(),
        _ => messages::unsupported_command(user_id, &prefix, command).into(),
    }
}

/// Without an admin list everybody may change settings
pub fn check_permission(store: &ConfigStore, user_id: &str) -> bool {
    match store.get(Parameter::AdminList.identifier()) {
        None | Some(Value::Null) => true,
        Some(Value::Array(admins)) => admins.iter().any(|admin| match admin {
            Value::String(id) => id == user_id,
            Value::Number(id) => id.to_string() == user_id,
            _ => false,
        }),
        Some(Value::String(admins)) => admins
            .split(|c: char| c == ',' || c.is_whitespace())
            .any(|id| id == user_id),
        Some(other) => {
            warn!(value = %other, "Unexpected adminList value, denying");
            false
        }
    }
}

pub fn handle_help(store: &ConfigStore, user_id: &str) -> String {
    messages::help(
        user_id,
        store.text(Parameter::Username).unwrap_or_default(),
        store.text(Parameter::CommandPrefix).unwrap_or_default(),
    )
}

pub fn handle_config(
    store: &mut ConfigStore,
    user_id: &str,
    params: &[String],
    now: DateTime<Utc>,
) -> Reply {
    let Some((name, value_tokens)) = params.split_first() else {
        let prefix = store.text(Parameter::CommandPrefix).unwrap_or_default();
        return messages::config_info(user_id, prefix).into();
    };

    if value_tokens.is_empty() {
        return messages::config_value(user_id, name, &display_value(store, name)).into();
    }

    match apply_config_change(store, name, value_tokens, now) {
        Ok(pending) => Reply {
            text: messages::config_changed(user_id, name, &display_value(store, name)),
            pending: Some(pending),
        },
        Err(err) => {
            let errors = serde_json::to_string(&err.messages()).unwrap_or_default();
            messages::config_error(user_id, name, &errors).into()
        }
    }
}

/// Pre-format, validate, post-format and store a new value.
///
/// The stored form is validated again: rounding a post age phrase can move
/// it past the other end of the window.
pub fn apply_config_change(
    store: &mut ConfigStore,
    name: &str,
    tokens: &[String],
    now: DateTime<Utc>,
) -> Result<PendingWrite, BotError> {
    let unsupported = || BotError::UnsupportedParameter(name.to_string());
    let candidate = pre_format(name, tokens).ok_or_else(unsupported)?;
    check_candidate(store, name, &candidate, now)?;

    let value = post_format(name, &candidate, now).ok_or_else(unsupported)?;
    let stored = match &value {
        Value::String(text) => CandidateValue::Expression(text.clone()),
        Value::Number(number) => CandidateValue::Number(number.as_f64().unwrap_or(f64::NAN)),
        _ => return Err(unsupported()),
    };
    check_candidate(store, name, &stored, now)?;

    // Keys missing from the default file are not settable
    store.set(name, Some(value)).ok_or_else(unsupported)
}

fn check_candidate(
    store: &ConfigStore,
    name: &str,
    candidate: &CandidateValue,
    now: DateTime<Utc>,
) -> Result<(), BotError> {
    let errors = validate(store, name, candidate, now);
    if errors.is_empty() {
        return Ok(());
    }
    info!(key = %name, candidate = ?candidate, errors = ?errors, "Rejected config change");
    Err(BotError::Validation(errors))
}

fn display_value(store: &ConfigStore, name: &str) -> String {
    let secret = SECRET_KEYS.contains(&name)
        || Parameter::from_identifier(name).is_some_and(Parameter::is_secret);
    match store.get(name) {
        None => Value::Null.to_string(),
        Some(value) if secret && !value.is_null() => MASKED_VALUE.to_string(),
        Some(value) => value.to_string(),
    }
}

pub fn handle_upvote(
    store: &ConfigStore,
    chain: &dyn Chain,
    user_id: &str,
    params: &[String],
    now: DateTime<Utc>,
) -> String {
    let Some(url) = params.first().filter(|url| !url.trim().is_empty()) else {
        warn!(user = %user_id, "Upvote without post URL");
        let prefix = store.text(Parameter::CommandPrefix).unwrap_or_default();
        return messages::upvote_url_missing(user_id, prefix);
    };
    let Some(post) = parse_post_url(url) else {
        warn!(url = %url, "Failed to parse post URL");
        return messages::post_not_found(user_id);
    };

    let policy = VotePolicy::from_store(store);
    let min = policy.min_post_age.as_deref().unwrap_or_default();
    let max = policy.max_post_age.as_deref().unwrap_or_default();

    match upvote(store, chain, &post, now) {
        Ok(VoteOutcome::Eligible) => messages::upvote_success(
            user_id,
            &policy.voter,
            store.number(Parameter::VoteWeight).unwrap_or_default(),
        ),
        Ok(VoteOutcome::AlreadyVoted) => messages::already_voted(user_id, &policy.voter),
        Ok(VoteOutcome::TooEarly) => messages::too_early(user_id, min, max),
        Ok(VoteOutcome::TooLate) => messages::too_late(user_id, min, max),
        Err(BotError::NotFound) => messages::post_not_found(user_id),
        Err(e) => {
            error!(author = %post.author, permlink = %post.permlink, error = %e, "Upvote failed");
            messages::system_error(user_id)
        }
    }
}

/// Look the post up, decide, and vote when eligible
pub fn upvote(
    store: &ConfigStore,
    chain: &dyn Chain,
    post: &PostRef,
    now: DateTime<Utc>,
) -> Result<VoteOutcome, BotError> {
    let record = chain.content(&post.author, &post.permlink)?;
    if record.is_missing() {
        return Err(BotError::NotFound);
    }

    let policy = VotePolicy::from_store(store);
    let outcome = evaluate(&record, &policy, now);
    if outcome != VoteOutcome::Eligible {
        info!(author = %post.author, permlink = %post.permlink, outcome = ?outcome, "Not voting");
        return Ok(outcome);
    }

    // The default file and env placeholders never went through validation
    let weight = store
        .number(Parameter::VoteWeight)
        .ok_or_else(|| BotError::Validation(vec!["Vote weight is not configured.".to_string()]))?;
    let weight_key = Parameter::VoteWeight.identifier();
    check_candidate(store, weight_key, &CandidateValue::Number(weight), now)?;
    let request = VoteRequest {
        posting_key: store.text(Parameter::PostingKey).unwrap_or_default().to_string(),
        voter: policy.voter,
        author: post.author.clone(),
        permlink: post.permlink.clone(),
        weight: basis_points(weight),
    };
    chain.vote(&request)?;
    info!(request = ?request, "Voted");
    Ok(outcome)
}

fn basis_points(weight: f64) -> i32 {
    (weight * BASIS_POINTS_PER_PERCENT).round() as i32
}

/// Presence line for the bot account, e.g. "VP - 97.53%."
pub fn voting_power_status(
    chain: &dyn Chain,
    username: &str,
    now: DateTime<Utc>,
) -> Result<String> {
    let account = chain.account(username)?;
    Ok(voting_power::status_line(voting_power::calculate(&account, now)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{ActiveVote, ContentRecord};
    use crate::persistence::OverrideWriter;
    use crate::voting_power::{Account, LegacyAccount};
    use anyhow::bail;
    use chrono::{Duration, TimeZone};
    use serde_json::{json, Map};
    use std::cell::RefCell;
    use std::path::Path;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap()
    }

    #[derive(Default)]
    struct FakeChain {
        record: Option<ContentRecord>,
        fail_vote: bool,
        votes: RefCell<Vec<VoteRequest>>,
    }

    impl Chain for FakeChain {
        fn account(&self, _username: &str) -> anyhow::Result<Account> {
            Ok(Account::VotingPower(LegacyAccount {
                stored: 9753,
                last_vote_time: fixed_now(),
            }))
        }

        fn content(&self, _author: &str, _permlink: &str) -> anyhow::Result<ContentRecord> {
            match &self.record {
                Some(record) => Ok(record.clone()),
                None => bail!("node unreachable"),
            }
        }

        fn vote(&self, request: &VoteRequest) -> anyhow::Result<()> {
            if self.fail_vote {
                bail!("broadcast rejected");
            }
            self.votes.borrow_mut().push(request.clone());
            Ok(())
        }
    }

    fn chain_with(id: u64, age: Duration, voters: &[&str]) -> FakeChain {
        FakeChain {
            record: Some(ContentRecord {
                id,
                author: "alice".to_string(),
                permlink: "hello".to_string(),
                created: Some(fixed_now() - age),
                active_votes: voters
                    .iter()
                    .map(|voter| ActiveVote {
                        voter: voter.to_string(),
                        weight: json!(0),
                        extra: Map::new(),
                    })
                    .collect(),
            }),
            ..Default::default()
        }
    }

    fn store_in(dir: &Path, defaults: Value) -> ConfigStore {
        let writer = OverrideWriter::spawn(dir.join("runtime.json")).unwrap();
        ConfigStore::from_layers(defaults.as_object().cloned().unwrap(), Map::new(), writer)
    }

    fn bot_defaults() -> Value {
        json!({
            "weight": 50,
            "minPostAge": "a day ago",
            "maxPostAge": "6 days ago",
            "username": "curator",
            "postingKey": "5Jsecret",
            "commandPrefix": "!",
            "adminList": ["1001"],
            "botToken": "xyz"
        })
    }

    fn params(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    const URL: &str = "https://steemit.com/@alice/hello";

    #[test]
    fn test_dispatch_help_and_unknown() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(dir.path(), bot_defaults());
        let chain = FakeChain::default();

        let help = dispatch(&mut store, &chain, "1", "info", &[], fixed_now());
        assert!(help.text.contains("!upvote"));
        assert!(help.pending.is_none());

        let unknown = dispatch(&mut store, &chain, "1", "dance", &[], fixed_now());
        assert_eq!(unknown.text, messages::unsupported_command("1", "!", "dance"));
    }

    #[test]
    fn test_config_requires_admin() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(dir.path(), bot_defaults());
        let chain = FakeChain::default();

        let change = params(&["weight", "10"]);
        let reply = dispatch(&mut store, &chain, "2002", "config", &change, fixed_now());
        assert_eq!(reply.text, messages::permission_denied("2002", "!", "config"));
        assert_eq!(store.number(Parameter::VoteWeight), Some(50.0));
    }

    #[test]
    fn test_check_permission_shapes() {
        let dir = tempfile::tempdir().unwrap();

        let open = store_in(dir.path(), json!({"username": "curator"}));
        assert!(check_permission(&open, "anyone"));

        let null = store_in(dir.path(), json!({"adminList": null}));
        assert!(check_permission(&null, "anyone"));

        let listed = store_in(dir.path(), json!({"adminList": ["1001", 1002]}));
        assert!(check_permission(&listed, "1001"));
        assert!(check_permission(&listed, "1002"));
        assert!(!check_permission(&listed, "100"));

        let text = store_in(dir.path(), json!({"adminList": "1001, 1003"}));
        assert!(check_permission(&text, "1003"));
        assert!(!check_permission(&text, "100"));
    }

    #[test]
    fn test_config_change_is_stored_and_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(dir.path(), bot_defaults());
        let chain = FakeChain::default();

        let change = params(&["maxPostAge", "72", "hours", "ago"]);
        let reply = dispatch(&mut store, &chain, "1001", "config", &change, fixed_now());
        assert_eq!(reply.text, messages::config_changed("1001", "maxPostAge", "\"3 days ago\""));
        reply.pending.expect("change is persisted").wait().unwrap();

        assert_eq!(store.bound(Parameter::MaxPostAge), Some("3 days ago"));
        let saved = std::fs::read_to_string(dir.path().join("runtime.json")).unwrap();
        assert!(saved.contains("3 days ago"));
    }

    #[test]
    fn test_config_change_validation_errors() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(dir.path(), bot_defaults());

        let reply = handle_config(&mut store, "1001", &params(&["weight", "abc"]), fixed_now());
        assert!(reply.pending.is_none());
        assert!(reply.text.contains("[\"Vote weight must be a number"));

        let change = params(&["minPostAge", "10", "days", "ago"]);
        let reply = handle_config(&mut store, "1001", &change, fixed_now());
        assert!(reply.text.contains("maxPostAge"));
        assert_eq!(store.bound(Parameter::MinPostAge), Some("a day ago"));
    }

    #[test]
    fn test_config_read_only_parameter() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(dir.path(), bot_defaults());

        let err = apply_config_change(&mut store, "username", &params(&["mallory"]), fixed_now())
            .unwrap_err();
        assert!(matches!(err, BotError::UnsupportedParameter(ref name) if name == "username"));
        assert_eq!(store.text(Parameter::Username), Some("curator"));
    }

    #[test]
    fn test_rounded_post_age_cannot_invert_window() {
        let dir = tempfile::tempdir().unwrap();
        let mut defaults = bot_defaults();
        defaults["maxPostAge"] = json!("47 days ago");
        let mut store = store_in(dir.path(), defaults);

        // 46 days is after the maximum, but it is stored as "2 months ago", which is before it
        let change = params(&["46", "days", "ago"]);
        let err = apply_config_change(&mut store, "minPostAge", &change, fixed_now()).unwrap_err();
        match err {
            BotError::Validation(errors) => {
                assert_eq!(errors.len(), 1);
                assert!(errors[0].contains("maxPostAge"), "{errors:?}");
            }
            other => panic!("expected a validation error, got {other:?}"),
        }
        assert_eq!(store.bound(Parameter::MinPostAge), Some("a day ago"));
        assert!(store.overrides().is_empty());
    }

    #[test]
    fn test_tuning_key_missing_from_defaults_is_not_changed() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(
            dir.path(),
            json!({"weight": 50, "username": "curator", "maxPostAge": "6 days ago"}),
        );

        let change = params(&["a", "day", "ago"]);
        let err = apply_config_change(&mut store, "minPostAge", &change, fixed_now()).unwrap_err();
        assert!(matches!(err, BotError::UnsupportedParameter(ref name) if name == "minPostAge"));
        assert_eq!(store.get("minPostAge"), None);

        let change = params(&["minPostAge", "a", "day", "ago"]);
        let reply = handle_config(&mut store, "1001", &change, fixed_now());
        assert!(reply.pending.is_none());
        assert!(reply.text.contains("cannot be changed"), "{}", reply.text);
    }

    #[test]
    fn test_config_show_masks_secrets() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(dir.path(), bot_defaults());

        let weight = handle_config(&mut store, "1001", &params(&["weight"]), fixed_now());
        assert_eq!(weight.text, messages::config_value("1001", "weight", "50"));

        for secret in ["postingKey", "botToken"] {
            let reply = handle_config(&mut store, "1001", &params(&[secret]), fixed_now());
            let leaked = reply.text.contains("5Jsecret") || reply.text.contains("xyz");
            assert!(!leaked, "{}", reply.text);
            assert!(reply.text.contains(MASKED_VALUE));
        }

        let missing = handle_config(&mut store, "1001", &params(&["nope"]), fixed_now());
        assert_eq!(missing.text, messages::config_value("1001", "nope", "null"));

        let usage = handle_config(&mut store, "1001", &[], fixed_now());
        assert_eq!(usage.text, messages::config_info("1001", "!"));
    }

    #[test]
    fn test_upvote_eligible_post_votes() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path(), bot_defaults());
        let chain = chain_with(7, Duration::days(3), &["bob"]);

        let reply = handle_upvote(&store, &chain, "1", &params(&[URL]), fixed_now());
        assert_eq!(reply, messages::upvote_success("1", "curator", 50.0));

        let votes = chain.votes.borrow();
        assert_eq!(votes.len(), 1);
        assert_eq!(votes[0].weight, 5000);
        assert_eq!(votes[0].posting_key, "5Jsecret");
        assert_eq!((votes[0].author.as_str(), votes[0].permlink.as_str()), ("alice", "hello"));
    }

    #[test]
    fn test_upvote_outcomes() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path(), bot_defaults());

        let voted = chain_with(7, Duration::days(3), &["curator"]);
        assert_eq!(
            handle_upvote(&store, &voted, "1", &params(&[URL]), fixed_now()),
            messages::already_voted("1", "curator")
        );
        assert!(voted.votes.borrow().is_empty());

        let fresh = chain_with(7, Duration::hours(1), &[]);
        assert_eq!(
            handle_upvote(&store, &fresh, "1", &params(&[URL]), fixed_now()),
            messages::too_early("1", "a day ago", "6 days ago")
        );

        let stale = chain_with(7, Duration::days(10), &[]);
        assert_eq!(
            handle_upvote(&store, &stale, "1", &params(&[URL]), fixed_now()),
            messages::too_late("1", "a day ago", "6 days ago")
        );
    }

    #[test]
    fn test_upvote_failures() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path(), bot_defaults());
        let missing = chain_with(0, Duration::days(3), &[]);
        let trending = params(&["https://steemit.com/trending"]);

        assert_eq!(
            handle_upvote(&store, &missing, "1", &[], fixed_now()),
            messages::upvote_url_missing("1", "!")
        );
        assert_eq!(
            handle_upvote(&store, &missing, "1", &trending, fixed_now()),
            messages::post_not_found("1")
        );
        assert_eq!(
            handle_upvote(&store, &missing, "1", &params(&[URL]), fixed_now()),
            messages::post_not_found("1")
        );

        let unreachable = FakeChain::default();
        assert_eq!(
            handle_upvote(&store, &unreachable, "1", &params(&[URL]), fixed_now()),
            messages::system_error("1")
        );

        let mut rejecting = chain_with(7, Duration::days(3), &[]);
        rejecting.fail_vote = true;
        assert_eq!(
            handle_upvote(&store, &rejecting, "1", &params(&[URL]), fixed_now()),
            messages::system_error("1")
        );
    }

    #[test]
    fn test_upvote_not_found_is_error_variant() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path(), bot_defaults());
        let chain = chain_with(0, Duration::days(3), &["curator"]);
        let post = PostRef {
            author: "alice".to_string(),
            permlink: "hello".to_string(),
        };
        assert!(matches!(upvote(&store, &chain, &post, fixed_now()), Err(BotError::NotFound)));
    }

    #[test]
    fn test_out_of_range_weight_is_never_sent() {
        let dir = tempfile::tempdir().unwrap();
        let post = PostRef {
            author: "alice".to_string(),
            permlink: "hello".to_string(),
        };

        for weight in [json!(500), json!("0"), json!(-10)] {
            let mut defaults = bot_defaults();
            defaults["weight"] = weight;
            let store = store_in(dir.path(), defaults);
            let chain = chain_with(7, Duration::days(3), &[]);

            let result = upvote(&store, &chain, &post, fixed_now());
            assert!(matches!(result, Err(BotError::Validation(_))), "{result:?}");
            assert_eq!(
                handle_upvote(&store, &chain, "1", &params(&[URL]), fixed_now()),
                messages::system_error("1")
            );
            assert!(chain.votes.borrow().is_empty());
        }
    }

    #[test]
    fn test_basis_points() {
        assert_eq!(basis_points(100.0), 10_000);
        assert_eq!(basis_points(0.01), 1);
        assert_eq!(basis_points(25.5), 2550);
    }

    #[test]
    fn test_voting_power_status() {
        let status = voting_power_status(&FakeChain::default(), "curator", fixed_now()).unwrap();
        assert_eq!(status, "VP - 97.53%.");
    }
}
