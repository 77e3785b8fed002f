//! expense-settle CLI
//!
//! Record shared expenses and work out who owes whom.
//!
//! # Usage
//!
//! ```bash
//! # Record an expense
//! expense-settle add --who Alice --amount 42,50 --description groceries
//!
//! # Show balances and the transfers that square everyone up
//! expense-settle balance
//!
//! # Split among the people who actually paid, as JSON
//! expense-settle balance --split-among-payers --format json
//!
//! # Generate a random store for testing
//! expense-settle generate --participants 4 --expenses 40 --output demo.json
//! ```

use expense_settlement::core::expense::{parse_amount, ExpenseLog, ExpenseRecord};
use expense_settlement::core::participant::ParticipantId;
use expense_settlement::report::{money, render_settlement, GroupSummary, ParticipantSummary};
use expense_settlement::settlement::config::{SettlementConfig, SharePolicy};
use expense_settlement::settlement::engine::{Settlement, SettlementEngine};
use expense_settlement::simulation::random_log::{generate_random_log, RandomLogConfig};
use expense_settlement::store::ExpenseStore;
use rust_decimal::Decimal;
use std::fmt::Display;
use std::fs;
use std::process;
use std::str::FromStr;

const DEFAULT_STORE: &str = "data/expenses.json";

fn print_usage() {
    eprintln!(
        r#"expense-settle — shared expenses and who owes whom

USAGE:
    expense-settle <COMMAND> [OPTIONS]

COMMANDS:
    add         Record an expense
    list        List recent expenses (all, or one participant's)
    balance     Show balances and the transfers that settle them
    clear       Delete every recorded expense
    generate    Generate a random expense store (for testing)
    help        Show this message

COMMON OPTIONS:
    --store <FILE>          Expense store (default: data/expenses.json)

OPTIONS (add):
    --who <NAME>            Who paid
    --amount <AMOUNT>       How much; ',' or '.' as decimal separator
    --description <TEXT>    What it was for (optional)

OPTIONS (list):
    --who <NAME>            Only this participant's expenses

OPTIONS (list, balance):
    --config <FILE>         JSON settlement configuration
    --group-size <N>        Split the total between N people (default: 3)
    --split-among-payers    Split between everyone who recorded an expense
    --roster <LIST>         Comma-separated group members to split between
    --epsilon <AMOUNT>      Balances below this count as settled (default: 0.01)

OPTIONS (balance):
    --format <FORMAT>       Output format: text (default) or json

OPTIONS (clear):
    --yes                   Confirm deletion

OPTIONS (generate):
    --participants <N>      Number of participants (default: 3)
    --expenses <N>          Number of expenses (default: 30)
    --output <FILE>         Write to file instead of stdout

EXAMPLES:
    expense-settle add --who Alice --amount 300
    expense-settle balance --roster Alice,Bob,Carol
    expense-settle list --who Alice
    expense-settle clear --yes"#
    );
}

fn fail(message: impl Display) -> ! {
    eprintln!("Error: {}", message);
    process::exit(1);
}

/// JSON output schema for a settlement.
#[derive(serde::Serialize)]
struct SettlementOutput {
    total: String,
    share: String,
    /// Present only for zero-sum sheets.
    #[serde(skip_serializing_if = "Option::is_none")]
    closes_balances: Option<bool>,
    balances: Vec<BalanceOutput>,
    transfers: Vec<TransferOutput>,
}

#[derive(serde::Serialize)]
struct BalanceOutput {
    participant: String,
    spent: String,
    net_amount: String,
    status: String,
}

#[derive(serde::Serialize)]
struct TransferOutput {
    from: String,
    to: String,
    amount: String,
}

impl From<&Settlement> for SettlementOutput {
    fn from(settlement: &Settlement) -> Self {
        let balances = settlement.balances();
        SettlementOutput {
            total: money(balances.total()),
            share: money(balances.share()),
            closes_balances: settlement.closure_check(),
            balances: balances
                .iter()
                .map(|b| BalanceOutput {
                    participant: b.participant.to_string(),
                    spent: money(b.spent),
                    net_amount: money(b.net_amount),
                    status: format!("{:?}", b.status(settlement.epsilon())).to_uppercase(),
                })
                .collect(),
            transfers: settlement
                .transfers()
                .iter()
                .map(|t| TransferOutput {
                    from: t.from.to_string(),
                    to: t.to.to_string(),
                    amount: money(t.amount),
                })
                .collect(),
        }
    }
}

/// Options shared by every command that computes shares.
#[derive(Default)]
struct ConfigOptions {
    config_path: Option<String>,
    policy: Option<SharePolicy>,
    epsilon: Option<Decimal>,
}

impl ConfigOptions {
    /// Consume a config option at `args[*i]`, returning false if it is not one.
    fn parse(&mut self, args: &[String], i: &mut usize) -> bool {
        match args[*i].as_str() {
            "--config" => {
                *i += 1;
                self.config_path = Some(required(args, *i, "--config requires a file path"));
            }
            "--group-size" => {
                *i += 1;
                let size = required(args, *i, "--group-size requires a number")
                    .parse()
                    .unwrap_or_else(|_| fail("--group-size requires a number"));
                self.policy = Some(SharePolicy::FixedGroupSize(size));
            }
            "--split-among-payers" => {
                self.policy = Some(SharePolicy::DistinctParticipants);
            }
            "--roster" => {
                *i += 1;
                let list = required(args, *i, "--roster requires a comma-separated list");
                let members = list
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(|name| ParticipantId::new(name))
                    .collect();
                self.policy = Some(SharePolicy::Roster(members));
            }
            "--epsilon" => {
                *i += 1;
                let raw = required(args, *i, "--epsilon requires an amount");
                self.epsilon = Some(
                    Decimal::from_str(&raw)
                        .unwrap_or_else(|e| fail(format!("invalid epsilon '{}': {}", raw, e))),
                );
            }
            _ => return false,
        }
        true
    }

    fn resolve(self) -> SettlementConfig {
        let mut config = match self.config_path {
            Some(path) => SettlementConfig::from_file(&path)
                .unwrap_or_else(|e| fail(format!("{} ({})", e, path))),
            None => SettlementConfig::default(),
        };
        if let Some(policy) = self.policy {
            config.policy = policy;
        }
        if let Some(epsilon) = self.epsilon {
            config.epsilon = epsilon;
        }
        if let Err(e) = config.validate() {
            fail(e);
        }
        config
    }
}

fn required(args: &[String], i: usize, message: &str) -> String {
    args.get(i).cloned().unwrap_or_else(|| fail(message))
}

fn open_store(path: Option<String>) -> ExpenseStore {
    let path = path.unwrap_or_else(|| DEFAULT_STORE.to_string());
    ExpenseStore::open(&path).unwrap_or_else(|e| fail(e))
}

fn load_log(store: &ExpenseStore) -> ExpenseLog {
    store.load().unwrap_or_else(|e| fail(e))
}

fn cmd_add(args: &[String]) {
    let mut store_path = None;
    let mut who = None;
    let mut amount = None;
    let mut description = None;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--store" => {
                i += 1;
                store_path = Some(required(args, i, "--store requires a file path"));
            }
            "--who" => {
                i += 1;
                who = Some(required(args, i, "--who requires a name"));
            }
            "--amount" => {
                i += 1;
                amount = Some(required(args, i, "--amount requires a value"));
            }
            "--description" => {
                i += 1;
                description = Some(required(args, i, "--description requires text"));
            }
            _ => fail(format!("Unknown option: {}", args[i])),
        }
        i += 1;
    }

    let who = who.unwrap_or_else(|| fail("--who <NAME> is required"));
    let raw_amount = amount.unwrap_or_else(|| fail("--amount <AMOUNT> is required"));
    let amount = parse_amount(&raw_amount).unwrap_or_else(|e| fail(e));

    let mut record = ExpenseRecord::new(ParticipantId::new(who), amount).unwrap_or_else(|e| fail(e));
    if let Some(text) = description.filter(|d| !d.trim().is_empty()) {
        record = record.with_description(text.trim());
    }

    let store = open_store(store_path);
    let summary = format!(
        "Expense recorded: {} by {}{}",
        money(record.amount()),
        record.participant(),
        record
            .description()
            .map(|d| format!(" ({})", d))
            .unwrap_or_default()
    );
    store.append(record).unwrap_or_else(|e| fail(e));
    println!("{}", summary);
}

fn cmd_list(args: &[String]) {
    let mut store_path = None;
    let mut who = None;
    let mut options = ConfigOptions::default();
    let mut i = 0;
    while i < args.len() {
        if !options.parse(args, &mut i) {
            match args[i].as_str() {
                "--store" => {
                    i += 1;
                    store_path = Some(required(args, i, "--store requires a file path"));
                }
                "--who" => {
                    i += 1;
                    who = Some(ParticipantId::new(required(args, i, "--who requires a name")));
                }
                _ => fail(format!("Unknown option: {}", args[i])),
            }
        }
        i += 1;
    }

    let config = options.resolve();
    let store = open_store(store_path);
    let log = load_log(&store);
    let divisor = config
        .divisor(log.participants().len().max(1))
        .unwrap_or_else(|e| fail(e));

    match who {
        Some(participant) => {
            let records = store
                .for_participant(&participant)
                .unwrap_or_else(|e| fail(e));
            println!("{}", ParticipantSummary::new(participant, records, divisor).render());
        }
        None => println!("{}", GroupSummary::new(&log, divisor).render()),
    }
}

fn cmd_balance(args: &[String]) {
    let mut store_path = None;
    let mut format = "text".to_string();
    let mut options = ConfigOptions::default();
    let mut i = 0;
    while i < args.len() {
        if !options.parse(args, &mut i) {
            match args[i].as_str() {
                "--store" => {
                    i += 1;
                    store_path = Some(required(args, i, "--store requires a file path"));
                }
                "--format" => {
                    i += 1;
                    format = required(args, i, "--format requires 'text' or 'json'");
                }
                _ => fail(format!("Unknown option: {}", args[i])),
            }
        }
        i += 1;
    }

    let config = options.resolve();
    let store = open_store(store_path);
    let log = load_log(&store);
    let settlement = SettlementEngine::settle(log.records(), &config).unwrap_or_else(|e| fail(e));

    match format.as_str() {
        "json" => {
            let output = SettlementOutput::from(&settlement);
            let json = serde_json::to_string_pretty(&output).unwrap_or_else(|e| fail(e));
            println!("{}", json);
        }
        "text" => println!("{}", render_settlement(&settlement)),
        other => fail(format!("unknown format '{}', expected 'text' or 'json'", other)),
    }
}

fn cmd_clear(args: &[String]) {
    let mut store_path = None;
    let mut confirmed = false;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--store" => {
                i += 1;
                store_path = Some(required(args, i, "--store requires a file path"));
            }
            "--yes" => confirmed = true,
            _ => fail(format!("Unknown option: {}", args[i])),
        }
        i += 1;
    }

    if !confirmed {
        fail("clearing deletes every expense and cannot be undone; pass --yes to confirm");
    }
    let store = open_store(store_path);
    store.clear().unwrap_or_else(|e| fail(e));
    println!("All expenses deleted");
}

fn cmd_generate(args: &[String]) {
    let mut config = RandomLogConfig::default();
    let mut output_path: Option<String> = None;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--participants" => {
                i += 1;
                config.participant_count = required(args, i, "--participants requires a number")
                    .parse()
                    .unwrap_or_else(|_| fail("--participants requires a number"));
            }
            "--expenses" => {
                i += 1;
                config.expense_count = required(args, i, "--expenses requires a number")
                    .parse()
                    .unwrap_or_else(|_| fail("--expenses requires a number"));
            }
            "--output" => {
                i += 1;
                output_path = Some(required(args, i, "--output requires a file path"));
            }
            _ => fail(format!("Unknown option: {}", args[i])),
        }
        i += 1;
    }

    let log = generate_random_log(&config);
    let json = serde_json::to_string_pretty(&log).unwrap_or_else(|e| fail(e));

    if let Some(path) = output_path {
        fs::write(&path, &json)
            .unwrap_or_else(|e| fail(format!("cannot write to '{}': {}", path, e)));
        eprintln!(
            "Generated {} expenses across {} participants → {}",
            log.len(),
            config.participant_count,
            path
        );
    } else {
        println!("{}", json);
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let command = args[1].as_str();
    let rest = &args[2..];
    log::debug!("running command '{}'", command);

    match command {
        "add" => cmd_add(rest),
        "list" => cmd_list(rest),
        "balance" => cmd_balance(rest),
        "clear" => cmd_clear(rest),
        "generate" => cmd_generate(rest),
        "help" | "--help" | "-h" => print_usage(),
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            process::exit(1);
        }
    }
}
