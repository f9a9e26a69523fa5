// src/config.rs
use crate::domain::errors::{AppError, AppResult};
use crate::infrastructure::quote::twelvedata::DEFAULT_BASE_URL;
use dotenv::dotenv;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// New account defaults
    pub account: AccountConfig,

    /// Account store location
    pub store: StoreConfig,

    /// Market data provider
    pub quotes: QuoteConfig,

    /// Trade application policy
    pub ledger: LedgerConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Defaults applied at registration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountConfig {
    /// Cash credited to every new account
    pub starting_balance: Decimal,

    /// Wallet currency tag
    pub currency: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory holding account documents
    pub data_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteConfig {
    /// "static" or "twelvedata"
    pub provider: String,

    /// Twelve Data API key
    pub api_key: Option<String>,

    /// Twelve Data base URL
    pub base_url: String,

    /// Per-request timeout
    pub timeout_secs: u64,

    /// Price table for the static provider
    #[serde(default)]
    pub static_prices: HashMap<String, Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Extra attempts after a version conflict on save
    pub max_retries: u32,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (e.g., "info", "debug", "warn", "error")
    pub level: String,

    /// Log to file
    pub to_file: bool,

    /// Log file path
    pub file_path: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> AppResult<Self> {
        // Load .env file if it exists
        dotenv().ok();

        let defaults = Config::default();

        let account_config = AccountConfig {
            starting_balance: parse_var("STARTING_BALANCE", defaults.account.starting_balance)?,
            currency: env::var("ACCOUNT_CURRENCY").unwrap_or(defaults.account.currency),
        };

        let store_config = StoreConfig {
            data_dir: env::var("DATA_DIR").unwrap_or(defaults.store.data_dir),
        };

        let static_prices = match env::var("STATIC_PRICES") {
            Ok(raw) => parse_price_table(&raw)?,
            Err(_) => defaults.quotes.static_prices,
        };

        let quote_config = QuoteConfig {
            provider: env::var("QUOTE_PROVIDER").unwrap_or(defaults.quotes.provider),
            api_key: env::var("TWELVEDATA_API_KEY").ok().filter(|k| !k.is_empty()),
            base_url: env::var("TWELVEDATA_BASE_URL").unwrap_or(defaults.quotes.base_url),
            timeout_secs: parse_var("QUOTE_TIMEOUT_SECS", defaults.quotes.timeout_secs)?,
            static_prices,
        };

        let ledger_config = LedgerConfig {
            max_retries: parse_var("MAX_RETRIES", defaults.ledger.max_retries)?,
        };

        let logging_config = LoggingConfig {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            to_file: env::var("LOG_TO_FILE")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .unwrap_or(false),
            file_path: env::var("LOG_FILE_PATH").ok(),
        };

        let config = Config {
            account: account_config,
            store: store_config,
            quotes: quote_config,
            ledger: ledger_config,
            logging: logging_config,
        };
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let mut file = File::open(path).map_err(|e| {
            AppError::Config(format!("Failed to open config file: {}", e))
        })?;

        let mut contents = String::new();
        file.read_to_string(&mut contents).map_err(|e| {
            AppError::Config(format!("Failed to read config file: {}", e))
        })?;

        let config: Config = serde_json::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file: {}", e))
        })?;
        config.validate()?;

        Ok(config)
    }

    /// Save configuration to a file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> AppResult<()> {
        let contents = serde_json::to_string_pretty(self).map_err(|e| {
            AppError::Config(format!("Failed to serialize config: {}", e))
        })?;

        std::fs::write(path, contents).map_err(|e| {
            AppError::Config(format!("Failed to write config file: {}", e))
        })?;

        Ok(())
    }

    /// Reject settings the application cannot run with
    pub fn validate(&self) -> AppResult<()> {
        if self.account.starting_balance < Decimal::ZERO {
            return Err(AppError::Config(format!(
                "Starting balance must not be negative: {}",
                self.account.starting_balance
            )));
        }

        match self.quotes.provider.to_lowercase().as_str() {
            "static" => Ok(()),
            "twelvedata" if self.quotes.api_key.is_none() => Err(AppError::Config(
                "Missing TWELVEDATA_API_KEY for the twelvedata quote provider".to_string(),
            )),
            "twelvedata" => Ok(()),
            other => Err(AppError::Config(format!("Unsupported quote provider: {}", other))),
        }
    }

    /// Initialize logging based on configuration
    pub fn init_logging(&self) -> AppResult<()> {
        let mut builder = env_logger::Builder::new();

        // Set log level
        let log_level = match self.logging.level.to_lowercase().as_str() {
            "trace" => log::LevelFilter::Trace,
            "debug" => log::LevelFilter::Debug,
            "info" => log::LevelFilter::Info,
            "warn" => log::LevelFilter::Warn,
            "error" => log::LevelFilter::Error,
            _ => log::LevelFilter::Info,
        };

        builder.filter_level(log_level);

        // Configure output
        if self.logging.to_file {
            if let Some(file_path) = &self.logging.file_path {
                let file = File::create(file_path).map_err(|e| {
                    AppError::Config(format!("Failed to create log file: {}", e))
                })?;

                builder.target(env_logger::Target::Pipe(Box::new(file)));
            }
        } else {
            // Keep stdout free for command output
            builder.target(env_logger::Target::Stderr);
        }

        builder.try_init().map_err(|e| {
            AppError::Config(format!("Failed to initialize logger: {}", e))
        })?;

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            account: AccountConfig {
                starting_balance: Decimal::new(10000, 0),
                currency: "USD".to_string(),
            },
            store: StoreConfig {
                data_dir: "./data".to_string(),
            },
            quotes: QuoteConfig {
                provider: "static".to_string(),
                api_key: None,
                base_url: DEFAULT_BASE_URL.to_string(),
                timeout_secs: 10,
                static_prices: HashMap::new(),
            },
            ledger: LedgerConfig { max_retries: 3 },
            logging: LoggingConfig {
                level: "info".to_string(),
                to_file: false,
                file_path: None,
            },
        }
    }
}

fn parse_var<T: FromStr>(name: &str, default: T) -> AppResult<T> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::Config(format!("Invalid value for {}: {}", name, raw))),
        Err(_) => Ok(default),
    }
}

/// Parse `AAPL=187.2,MSFT=402.5` into a price table
pub fn parse_price_table(raw: &str) -> AppResult<HashMap<String, Decimal>> {
    let mut prices = HashMap::new();

    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (symbol, price) = entry.split_once('=').ok_or_else(|| {
            AppError::Config(format!("Expected SYMBOL=PRICE, got {:?}", entry))
        })?;

        let price = Decimal::from_str(price.trim()).map_err(|e| {
            AppError::Config(format!("Invalid price for {}: {}", symbol.trim(), e))
        })?;

        if price <= Decimal::ZERO {
            return Err(AppError::Config(format!(
                "Price for {} must be positive",
                symbol.trim()
            )));
        }

        prices.insert(symbol.trim().to_uppercase(), price);
    }

    Ok(prices)
}
