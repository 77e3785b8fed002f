//! Three flatmates splitting the household bills.
//!
//! Shows the default three-way split, a split among payers only, and the
//! text report the CLI prints.

use expense_settlement::core::expense::{ExpenseLog, ExpenseRecord};
use expense_settlement::core::participant::ParticipantId;
use expense_settlement::report::{render_settlement, GroupSummary};
use expense_settlement::settlement::config::{SettlementConfig, SharePolicy};
use expense_settlement::settlement::engine::SettlementEngine;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn record(who: &ParticipantId, amount: Decimal, description: &str) -> ExpenseRecord {
    ExpenseRecord::new(who.clone(), amount)
        .expect("demo amounts are non-negative")
        .with_description(description)
}

fn main() {
    println!("╔══════════════════════════════════════════════╗");
    println!("║  expense-settlement: Three-Way Split Example ║");
    println!("╚══════════════════════════════════════════════╝\n");

    let anna = ParticipantId::new("Anna");
    let ben = ParticipantId::new("Ben");
    let chloe = ParticipantId::new("Chloe");

    let log: ExpenseLog = vec![
        record(&anna, dec!(84.20), "groceries"),
        record(&ben, dec!(45.00), "internet"),
        record(&anna, dec!(12.50), "cleaning supplies"),
        record(&chloe, dec!(120.00), "electricity"),
        record(&ben, dec!(33.80), "groceries"),
    ]
    .into_iter()
    .collect();

    // --- Scenario 1: everyone splits everything ---
    println!("━━━ Scenario 1: Three-way split ━━━\n");

    let config = SettlementConfig::default();
    let settlement = match SettlementEngine::settle(log.records(), &config) {
        Ok(settlement) => settlement,
        Err(e) => {
            eprintln!("settlement failed: {e}");
            return;
        }
    };
    println!("{}", settlement);
    println!("{}\n", render_settlement(&settlement));

    // --- Scenario 2: Chloe is away, only payers split ---
    println!("━━━ Scenario 2: Split among payers ━━━\n");

    let without_chloe: Vec<ExpenseRecord> = log
        .records()
        .iter()
        .filter(|r| r.participant() != &chloe)
        .cloned()
        .collect();
    let config = SettlementConfig::default().with_policy(SharePolicy::DistinctParticipants);
    match SettlementEngine::settle(&without_chloe, &config) {
        Ok(settlement) => println!("{}\n", render_settlement(&settlement)),
        Err(e) => eprintln!("settlement failed: {e}"),
    }

    // --- Group summary ---
    println!("━━━ Group Summary ━━━\n");
    let summary = GroupSummary::new(&log, Decimal::from(3));
    println!("{}", summary.render());
}
