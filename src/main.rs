// src/main.rs
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;

use paper_trade::application::{
    ErrorResponse, PortfolioResponse, ServiceSettings, TradeOrder, TradeOutcome, TradeResponse,
    TradeService,
};
use paper_trade::config::Config;
use paper_trade::domain::errors::{AppError, AppResult};
use paper_trade::domain::models::TradeType;
use paper_trade::domain::portfolio::PortfolioSummary;
use paper_trade::domain::repository::QuoteSource;
use paper_trade::infrastructure::quote::{StaticQuoteSource, TwelveDataQuoteSource};
use paper_trade::infrastructure::store::FileAccountStore;

#[derive(Parser, Debug)]
#[command(name = "paper_trade", version, about = "Paper-trading accounts from the command line")]
struct Cli {
    /// JSON config file; environment variables are used when omitted
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Open a new account
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
    },
    /// Buy shares
    Buy(TradeArgs),
    /// Sell shares
    Sell(TradeArgs),
    /// Sell an entire position at the current quote
    Close {
        #[arg(long)]
        email: String,
        #[arg(long)]
        symbol: String,
    },
    /// Show positions, cash and P&L
    Portfolio {
        #[arg(long)]
        email: String,
        /// Value positions at current quotes
        #[arg(long)]
        live: bool,
    },
    /// List executed trades, newest first
    History {
        #[arg(long)]
        email: String,
        #[arg(long)]
        symbol: Option<String>,
    },
    /// Manage the watchlist
    Watch {
        #[command(subcommand)]
        action: WatchAction,
    },
    /// Print the current quote for a symbol
    Quote {
        #[arg(long)]
        symbol: String,
    },
}

#[derive(clap::Args, Debug)]
struct TradeArgs {
    #[arg(long)]
    email: String,
    #[arg(long)]
    symbol: String,
    #[arg(long)]
    quantity: u64,
    /// Execution price; the current quote is used when omitted
    #[arg(long)]
    price: Option<Decimal>,
}

#[derive(Subcommand, Debug)]
enum WatchAction {
    Add {
        #[arg(long)]
        email: String,
        #[arg(long)]
        symbol: String,
    },
    Remove {
        #[arg(long)]
        email: String,
        #[arg(long)]
        symbol: String,
    },
    List {
        #[arg(long)]
        email: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        let body = ErrorResponse::from(&e);
        match serde_json::to_string_pretty(&body) {
            Ok(json) => println!("{}", json),
            Err(_) => eprintln!("{}", e),
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> AppResult<()> {
    // Load configuration
    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    };

    // Initialize logging
    config.init_logging()?;

    log::info!("Starting paper_trade v{}", env!("CARGO_PKG_VERSION"));

    let store = Arc::new(FileAccountStore::open(&config.store.data_dir).await?);
    let quotes = create_quote_source(&config)?;
    log::info!("Using {} quotes", quotes.name());

    let service = TradeService::new(store, quotes, ServiceSettings::from(&config));

    match cli.command {
        Command::Register { name, email } => {
            let account = service.register(&name, &email).await?;
            print_json(&account)?;
        }
        Command::Buy(args) => trade(&service, TradeType::Buy, args).await?,
        Command::Sell(args) => trade(&service, TradeType::Sell, args).await?,
        Command::Close { email, symbol } => {
            let account = service.account_by_email(&email).await?;
            let outcome = service.close_position(account.id, &symbol).await?;
            print_json(&trade_response(outcome))?;
        }
        Command::Portfolio { email, live } => {
            let account = service.account_by_email(&email).await?;
            let summary = if live {
                service.live_portfolio(account.id).await?
            } else {
                PortfolioSummary::from_account(&account)
            };
            print_json(&PortfolioResponse {
                portfolio: account.positions.into_values().collect(),
                transactions: account.transactions,
                wallet: account.wallet,
                summary,
            })?;
        }
        Command::History { email, symbol } => {
            let account = service.account_by_email(&email).await?;
            let history = service.history(account.id, symbol.as_deref()).await?;
            print_json(&history)?;
        }
        Command::Watch { action } => {
            let watchlist = match action {
                WatchAction::Add { email, symbol } => {
                    let account = service.account_by_email(&email).await?;
                    service.add_to_watchlist(account.id, &symbol).await?
                }
                WatchAction::Remove { email, symbol } => {
                    let account = service.account_by_email(&email).await?;
                    service.remove_from_watchlist(account.id, &symbol).await?
                }
                WatchAction::List { email } => service.account_by_email(&email).await?.watchlist,
            };
            print_json(&watchlist)?;
        }
        Command::Quote { symbol } => {
            let price = service.quote(&symbol).await?;
            print_json(&serde_json::json!({ "symbol": symbol.to_uppercase(), "price": price }))?;
        }
    }

    log::info!("Done");
    Ok(())
}

async fn trade(service: &TradeService, trade_type: TradeType, args: TradeArgs) -> AppResult<()> {
    let account = service.account_by_email(&args.email).await?;
    let order = match args.price {
        Some(price) => TradeOrder::limit(&args.symbol, trade_type, args.quantity, price),
        None => TradeOrder::market(&args.symbol, trade_type, args.quantity),
    };

    let outcome = service.execute(account.id, order).await?;
    print_json(&trade_response(outcome))
}

fn trade_response(outcome: TradeOutcome) -> TradeResponse {
    TradeResponse {
        message: format!("{} transaction successful", outcome.transaction.trade_type),
        portfolio: outcome.account.positions.into_values().collect(),
        transactions: outcome.account.transactions,
        wallet: outcome.account.wallet,
        realized_pnl: outcome.realized_pnl,
    }
}

fn print_json<T: Serialize>(value: &T) -> AppResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Create quote source based on configuration
fn create_quote_source(config: &Config) -> AppResult<Arc<dyn QuoteSource>> {
    match config.quotes.provider.to_lowercase().as_str() {
        "static" => Ok(Arc::new(StaticQuoteSource::from(
            config.quotes.static_prices.clone(),
        ))),
        "twelvedata" => {
            let api_key = config.quotes.api_key.as_deref().ok_or_else(|| {
                AppError::Config("Missing TWELVEDATA_API_KEY".to_string())
            })?;
            Ok(Arc::new(TwelveDataQuoteSource::new(
                api_key,
                &config.quotes.base_url,
                config.quotes.timeout_secs,
            )))
        }
        _ => Err(AppError::Config(format!(
            "Unsupported quote provider: {}",
            config.quotes.provider
        ))),
    }
}
