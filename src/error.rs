// Error taxonomy shared by the three upstream collaborators.

use std::fmt;
use thiserror::Error;

/// Which upstream a failure came from (for operator diagnostics in logs).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Console,
    Panel,
    Database,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Source::Console => "console",
            Source::Panel => "panel",
            Source::Database => "database",
        })
    }
}

#[derive(Debug, Error)]
pub enum AggregatorError {
    /// A required secret or identifier is missing; names the config key.
    #[error("configuration missing: {0}")]
    Configuration(&'static str),

    #[error("{upstream} unavailable at {target}: {detail}")]
    Unavailable {
        upstream: Source,
        target: String,
        detail: String,
    },

    #[error("{upstream} timed out at {target}")]
    Timeout { upstream: Source, target: String },

    #[error("{upstream} at {target} answered HTTP {status}")]
    Upstream {
        upstream: Source,
        target: String,
        status: u16,
    },

    #[error("console at {target} rejected the password")]
    Authentication { target: String },
}

impl AggregatorError {
    pub fn unavailable(
        upstream: Source,
        target: impl Into<String>,
        detail: impl fmt::Display,
    ) -> Self {
        AggregatorError::Unavailable {
            upstream,
            target: target.into(),
            detail: detail.to_string(),
        }
    }

    /// The failing collaborator, if any (configuration errors have none).
    pub fn upstream_source(&self) -> Option<Source> {
        match self {
            AggregatorError::Configuration(_) => None,
            AggregatorError::Unavailable { upstream, .. }
            | AggregatorError::Timeout { upstream, .. }
            | AggregatorError::Upstream { upstream, .. } => Some(*upstream),
            AggregatorError::Authentication { .. } => Some(Source::Console),
        }
    }
}
