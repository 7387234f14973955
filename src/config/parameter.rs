//! Registry of recognized config parameters
//!
//! Each parameter has a stable identifier that doubles as its key in the
//! JSON config files and as the name users type in the `config` command.

use std::fmt;

/// Kind of value a parameter holds once validated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomainType {
    /// Plain number (vote weight in percent)
    Number,
    /// Free-form relative time phrase, resolved at use time
    DurationExpression,
    /// Opaque value only settable through the default config file
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Parameter {
    /// Weight of vote in percent
    VoteWeight,
    /// Minimum age of post to receive vote
    MinPostAge,
    /// Maximum age of post to receive vote
    MaxPostAge,
    /// Account which casts the votes
    Username,
    /// Posting credential of the voting account
    PostingKey,
    /// Character that marks a chat message as a command
    CommandPrefix,
    /// Users allowed to run privileged commands
    AdminList,
}

impl Parameter {
    pub const ALL: [Parameter; 7] = [
        Parameter::VoteWeight,
        Parameter::MinPostAge,
        Parameter::MaxPostAge,
        Parameter::Username,
        Parameter::PostingKey,
        Parameter::CommandPrefix,
        Parameter::AdminList,
    ];

    pub fn identifier(self) -> &'static str {
        match self {
            Parameter::VoteWeight => "weight",
            Parameter::MinPostAge => "minPostAge",
            Parameter::MaxPostAge => "maxPostAge",
            Parameter::Username => "username",
            Parameter::PostingKey => "postingKey",
            Parameter::CommandPrefix => "commandPrefix",
            Parameter::AdminList => "adminList",
        }
    }

    /// Look up a parameter by identifier; unknown names yield `None`
    pub fn from_identifier(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.identifier() == name)
    }

    pub fn domain_type(self) -> DomainType {
        match self {
            Parameter::VoteWeight => DomainType::Number,
            Parameter::MinPostAge | Parameter::MaxPostAge => DomainType::DurationExpression,
            _ => DomainType::Other,
        }
    }

    /// Only behavioral tuning parameters may change at runtime.
    /// Identity and credentials come from the default config file alone.
    pub fn is_mutable(self) -> bool {
        matches!(
            self,
            Parameter::VoteWeight | Parameter::MinPostAge | Parameter::MaxPostAge
        )
    }

    pub fn is_secret(self) -> bool {
        self == Parameter::PostingKey
    }

    /// The other end of the post age window
    pub fn sibling_bound(self) -> Option<Parameter> {
        match self {
            Parameter::MinPostAge => Some(Parameter::MaxPostAge),
            Parameter::MaxPostAge => Some(Parameter::MinPostAge),
            _ => None,
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier())
    }
}
