//! Line-oriented terminal session standing in for the wallet screens.
//!
//! The home view prints balances; the converter view is driven by
//! `convert FROM TO AMOUNT` lines. A background task renders every state
//! transition the engine publishes.

use tokio::io::{AsyncBufReadExt, BufReader};
use wallet_hex::ConversionEngine;
use wallet_types::{
    Balances, ConversionState, Currency, DecimalSeparator, QuoteProvider, format_amount,
};

/// One line of user input.
#[derive(Debug, PartialEq)]
pub enum Command {
    Convert {
        from: Currency,
        to: Currency,
        amount: String,
    },
    Balances,
    Reset,
    Help,
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> Result<Self, String> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Ok(Command::Help);
        };
        match verb.to_ascii_lowercase().as_str() {
            "convert" | "c" => {
                let (Some(from), Some(to), Some(amount), None) =
                    (words.next(), words.next(), words.next(), words.next())
                else {
                    return Err("usage: convert FROM TO AMOUNT".into());
                };
                Ok(Command::Convert {
                    from: from.parse()?,
                    to: to.parse()?,
                    amount: amount.to_string(),
                })
            }
            "balances" | "b" => Ok(Command::Balances),
            "reset" | "back" => Ok(Command::Reset),
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" | "q" => Ok(Command::Quit),
            other => Err(format!("unknown command: {other}")),
        }
    }
}

/// Renders a state the way the converter screen shows it.
pub fn describe(state: &ConversionState, separator: DecimalSeparator) -> String {
    match state {
        ConversionState::Idle => "ready".to_string(),
        ConversionState::Loading => "fetching quote...".to_string(),
        ConversionState::Success { dest, dest_amount } => {
            format!("converted: {}", format_amount(*dest, *dest_amount, separator))
        }
        ConversionState::Error(e) => format!("error: {e}"),
    }
}

pub fn render_balances(balances: &Balances, separator: DecimalSeparator) -> String {
    balances
        .iter()
        .map(|(currency, amount)| format!("  {:<4}{}", currency, format_amount(currency, amount, separator)))
        .collect::<Vec<_>>()
        .join("\n")
}

const HELP: &str = "commands: convert FROM TO AMOUNT | balances | reset | quit";

/// Runs the interactive session until `quit` or end of input.
pub async fn run<Q: QuoteProvider>(
    engine: &ConversionEngine<Q>,
    separator: DecimalSeparator,
) -> anyhow::Result<()> {
    let mut states = engine.subscribe();
    let observer = tokio::spawn(async move {
        while states.changed().await.is_ok() {
            let state = states.borrow_and_update().clone();
            println!("[{}]", describe(&state, separator));
        }
    });

    println!("{}", render_balances(&engine.ledger().snapshot(), separator));
    println!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match Command::parse(&line) {
            Ok(Command::Convert { from, to, amount }) => {
                // Outcome is rendered by the observer.
                let _ = engine.start_conversion(from, to, &amount).await;
                tokio::task::yield_now().await;
                println!("{}", render_balances(&engine.ledger().snapshot(), separator));
            }
            Ok(Command::Balances) => {
                println!("{}", render_balances(&engine.ledger().snapshot(), separator));
            }
            Ok(Command::Reset) => engine.reset_state(),
            Ok(Command::Help) => println!("{HELP}"),
            Ok(Command::Quit) => break,
            Err(e) => println!("{e}"),
        }
    }

    engine.reset_state();
    observer.abort();
    tracing::debug!("Interactive session ended");
    Ok(())
}
