//! Settlement configuration: how the share is derived and how close to
//! zero a balance must be to count as settled.
//!
//! Configuration files are JSON:
//!
//! ```json
//! {
//!   "policy": { "fixed_group_size": 3 },
//!   "epsilon": "0.01"
//! }
//! ```
//!
//! The other policies are written `"policy": "distinct_participants"` and
//! `"policy": { "roster": ["Alice", "Bob", "Carol"] }`.

use crate::core::error::SettlementError;
use crate::core::participant::ParticipantId;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Group size used when nothing else is configured: a household of three.
pub const DEFAULT_GROUP_SIZE: usize = 3;

/// Tolerance used when nothing else is configured: one minor currency unit.
pub fn default_epsilon() -> Decimal {
    dec!(0.01)
}

/// How the equal share is derived from the total spend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SharePolicy {
    /// Divide by a fixed group size regardless of who recorded expenses.
    FixedGroupSize(usize),
    /// Divide by the number of distinct participants who recorded expenses.
    DistinctParticipants,
    /// Divide by the size of a known roster. Roster members who paid
    /// nothing still receive a balance.
    Roster(Vec<ParticipantId>),
}

impl Default for SharePolicy {
    fn default() -> Self {
        SharePolicy::FixedGroupSize(DEFAULT_GROUP_SIZE)
    }
}

/// Errors arising while loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed configuration: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Invalid(#[from] SettlementError),
}

/// Parameters of a settlement run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettlementConfig {
    pub policy: SharePolicy,
    /// Balances and remainders below this are treated as zero.
    pub epsilon: Decimal,
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self {
            policy: SharePolicy::default(),
            epsilon: default_epsilon(),
        }
    }
}

impl SettlementConfig {
    pub fn with_policy(mut self, policy: SharePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_epsilon(mut self, epsilon: Decimal) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Load and validate a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: SettlementConfig = serde_json::from_str(&content)?;
        config.validate()?;
        log::debug!("loaded settlement config from {}", path.as_ref().display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SettlementError> {
        if self.epsilon <= Decimal::ZERO {
            return Err(SettlementError::InvalidConfiguration(format!(
                "epsilon must be positive, got {}",
                self.epsilon
            )));
        }
        match &self.policy {
            SharePolicy::FixedGroupSize(0) => Err(SettlementError::InvalidConfiguration(
                "group size must be positive".to_string(),
            )),
            SharePolicy::Roster(members) if members.is_empty() => Err(
                SettlementError::InvalidConfiguration("roster must not be empty".to_string()),
            ),
            _ => Ok(()),
        }
    }

    /// Roster members, if the policy names them.
    pub fn roster(&self) -> &[ParticipantId] {
        match &self.policy {
            SharePolicy::Roster(members) => members.as_slice(),
            _ => &[],
        }
    }

    /// Number of people the total is split between.
    ///
    /// `payers` is the number of distinct participants who recorded
    /// expenses; only [`SharePolicy::DistinctParticipants`] looks at it.
    pub fn divisor(&self, payers: usize) -> Result<Decimal, SettlementError> {
        let count = match &self.policy {
            SharePolicy::FixedGroupSize(n) => *n,
            SharePolicy::DistinctParticipants => payers,
            SharePolicy::Roster(members) => members.len(),
        };
        if count == 0 {
            return Err(SettlementError::InvalidConfiguration(
                "cannot split between zero participants".to_string(),
            ));
        }
        Ok(Decimal::from(count))
    }

    /// Each participant's target contribution for a given total.
    pub fn share_for(&self, total: Decimal, payers: usize) -> Result<Decimal, SettlementError> {
        Ok(total / self.divisor(payers)?)
    }
}
