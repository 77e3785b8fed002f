//! # expense-settlement
//!
//! Shared-expense balance and settlement engine.
//!
//! Given the expenses a group has recorded, the engine computes how far
//! each participant is above or below an equal share and a short list of
//! transfers that squares everyone up.
//!
//! ## Architecture
//!
//! - **core** — Foundational types: participants, expenses, balances, transfers
//! - **settlement** — Share policy configuration and the settlement engine
//! - **store** — Append-only JSON expense log
//! - **report** — Spend summaries and human-readable settlement messages
//! - **simulation** — Random expense logs for benchmarks and testing

pub mod core;
pub mod report;
pub mod settlement;
pub mod simulation;
pub mod store;

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::core::balance::{Balance, BalanceSheet, BalanceStatus};
    pub use crate::core::error::SettlementError;
    pub use crate::core::expense::{ExpenseLog, ExpenseRecord};
    pub use crate::core::participant::ParticipantId;
    pub use crate::core::transfer::Transfer;
    pub use crate::settlement::config::{SettlementConfig, SharePolicy};
    pub use crate::settlement::engine::{Settlement, SettlementEngine};
}
