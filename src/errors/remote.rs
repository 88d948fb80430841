//! Errors reported by the remote project collaborator.
//!
//! Every call the session issues can fail in one of a few well-known ways:
//! the target does not exist, the remote side rejected the request with a
//! message worth surfacing verbatim, the remote side returned per-field
//! messages, or the transport itself failed. Timeouts belong to the transport
//! implementation and arrive here as [`RemoteError::Transport`].

use std::collections::BTreeMap;

use thiserror::Error;

use crate::model::ProjectId;

/// Remote project operation errors.
#[derive(Error, Debug)]
pub enum RemoteError {
    /// The requested project does not exist.
    #[error("Project {0} was not found")]
    NotFound(ProjectId),

    /// The remote side rejected the request; the message is surfaced to the
    /// user verbatim.
    #[error("{message}")]
    Rejected { message: String },

    /// The remote side returned field-scoped validation messages.
    #[error("The submission was rejected for {} field(s)", .0.len())]
    FieldErrors(BTreeMap<String, String>),

    /// Network or protocol failure.
    #[error("Transport failure: {0}")]
    Transport(String),
}

impl RemoteError {
    pub fn rejected(message: impl Into<String>) -> Self {
        RemoteError::Rejected {
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, RemoteError::NotFound(_))
    }

    /// Whether the remote side supplied a message meant for the user.
    pub fn user_message(&self) -> Option<&str> {
        match self {
            RemoteError::Rejected { message } => Some(message),
            _ => None,
        }
    }

    /// Field-scoped messages, when the remote side provided them.
    pub fn field_errors(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            RemoteError::FieldErrors(fields) => Some(fields),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_message_is_surfaced_verbatim() {
        let err = RemoteError::rejected("A project named \"census\" is already registered.");
        assert_eq!(
            err.to_string(),
            "A project named \"census\" is already registered."
        );
        assert!(err.user_message().is_some());
    }

    #[test]
    fn classification_helpers() {
        assert!(RemoteError::NotFound(9).is_not_found());
        assert!(RemoteError::Transport("reset".into()).user_message().is_none());
    }
}
