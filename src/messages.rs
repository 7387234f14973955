//! Reply texts
//!
//! Every reply starts by mentioning the user who issued the command.

use crate::config::Parameter;

fn mention(user_id: &str) -> String {
    format!("<@{user_id}>")
}

pub fn help(user_id: &str, username: &str, prefix: &str) -> String {
    format!(
        "{}, I'm the upvote bot of @{username}.\n\
         Commands:\n\
         `{prefix}upvote <post url>` - upvote a post as @{username}\n\
         `{prefix}config` - show or change settings (admins only)\n\
         `{prefix}help` - this message",
        mention(user_id)
    )
}

pub fn permission_denied(user_id: &str, prefix: &str, command: &str) -> String {
    format!(
        "{}, you don't have permission to use `{prefix}{command}`.",
        mention(user_id)
    )
}

pub fn unsupported_command(user_id: &str, prefix: &str, command: &str) -> String {
    format!(
        "{}, `{prefix}{command}` is not a known command. Try `{prefix}help`.",
        mention(user_id)
    )
}

pub fn config_info(user_id: &str, prefix: &str) -> String {
    let names: Vec<&str> = Parameter::ALL.iter().map(|p| p.identifier()).collect();
    format!(
        "{}, use `{prefix}config <name>` to see a value or `{prefix}config <name> <value>` to change it.\n\
         Parameters: {}",
        mention(user_id),
        names.join(", ")
    )
}

pub fn config_value(user_id: &str, name: &str, value_json: &str) -> String {
    format!("{}, \"{name}\" is {value_json}.", mention(user_id))
}

pub fn config_changed(user_id: &str, name: &str, value_json: &str) -> String {
    format!("{}, \"{name}\" is now {value_json}.", mention(user_id))
}

pub fn config_error(user_id: &str, name: &str, errors_json: &str) -> String {
    format!("{}, \"{name}\" was not changed: {errors_json}", mention(user_id))
}

pub fn upvote_url_missing(user_id: &str, prefix: &str) -> String {
    format!(
        "{}, please give a post URL: `{prefix}upvote <post url>`.",
        mention(user_id)
    )
}

pub fn post_not_found(user_id: &str) -> String {
    format!("{}, I couldn't find that post.", mention(user_id))
}

pub fn already_voted(user_id: &str, voter: &str) -> String {
    format!("{}, @{voter} has already voted for this post.", mention(user_id))
}

pub fn too_early(user_id: &str, min_post_age: &str, max_post_age: &str) -> String {
    format!(
        "{}, this post is too new. Posts created between \"{max_post_age}\" and \"{min_post_age}\" can be upvoted.",
        mention(user_id)
    )
}

pub fn too_late(user_id: &str, min_post_age: &str, max_post_age: &str) -> String {
    format!(
        "{}, this post is too old. Posts created between \"{max_post_age}\" and \"{min_post_age}\" can be upvoted.",
        mention(user_id)
    )
}

pub fn upvote_success(user_id: &str, voter: &str, weight: f64) -> String {
    format!("{}, @{voter} upvoted the post with {weight}% weight.", mention(user_id))
}

pub fn system_error(user_id: &str) -> String {
    format!("{}, something went wrong, please try again later.", mention(user_id))
}
