//! # Wallet Application
//!
//! Binary that wires together all the components:
//! - Load configuration from environment
//! - Initialize logging
//! - Create the ledger, quote client, and conversion engine
//! - Drive the engine from the terminal

mod config;
mod session;

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use quote_client::HttpQuoteClient;
use wallet_hex::ConversionEngine;
use wallet_ledger::Ledger;
use wallet_types::{Currency, format_amount};

#[derive(Parser)]
#[command(name = "wallet")]
#[command(author, version, about = "BRL/USD/BTC wallet with live conversion", long_about = None)]
struct Cli {
    /// Base URL of the quote API (overrides QUOTE_API_URL)
    #[arg(long)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the wallet balances
    Balances,
    /// Convert an amount between two currencies
    Convert {
        /// Source currency (BRL, USD, BTC)
        from: String,
        /// Destination currency (BRL, USD, BTC)
        to: String,
        /// Amount in the source currency; `.` or `,` as decimal separator
        amount: String,
    },
    /// Start an interactive session that keeps balances until exit
    Interactive,
}

fn parse_currency(s: &str) -> Result<Currency> {
    s.parse().map_err(|e: String| anyhow::anyhow!(e))
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,wallet_app=debug,wallet_hex=debug".into());
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut config = config::Config::from_env()?;
    if let Some(url) = cli.api_url {
        config.quote_api_url = url;
    }

    init_tracing(config.log_json);
    tracing::debug!("Using quote API: {}", config.quote_api_url);

    let quotes = HttpQuoteClient::new(&config.quote_api_url).with_timeout(config.quote_timeout);
    let ledger = Arc::new(Ledger::new());
    let engine = ConversionEngine::new(quotes, ledger);
    let separator = config.decimal_separator;

    match cli.command {
        Commands::Balances => {
            println!("{}", session::render_balances(&engine.ledger().snapshot(), separator));
        }

        Commands::Convert { from, to, amount } => {
            let from = parse_currency(&from)?;
            let to = parse_currency(&to)?;
            let outcome = engine.start_conversion(from, to, &amount).await?;
            println!(
                "{} -> {}",
                format_amount(outcome.source, outcome.source_amount, separator),
                format_amount(outcome.dest, outcome.dest_amount, separator)
            );
            println!("{}", session::render_balances(&engine.ledger().snapshot(), separator));
        }

        Commands::Interactive => {
            session::run(&engine, separator).await?;
        }
    }

    Ok(())
}
