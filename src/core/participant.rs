use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a member of the expense-sharing group.
///
/// Participants are compared by their exact identifier string. The engine
/// never interprets the identifier; display names, usernames or numeric
/// account keys rendered as text all work.
///
/// # Examples
///
/// ```
/// use expense_settlement::core::participant::ParticipantId;
///
/// let alice = ParticipantId::new("Alice");
/// let bob = ParticipantId::new("Bob");
/// assert_ne!(alice, bob);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the string representation of this participant.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ParticipantId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ParticipantId {
    fn from(s: String) -> Self {
        Self(s)
    }
}
