use std::path::{Path, PathBuf};

use clap::Args;
use serde::Deserialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::error::{Error, Result};
use crate::format::{Grouping, MoneyFormat};

const APP_DIR: &str = "expense-statement";

/// Flags shared by every command.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Path to config file [default: <data dir>/expenses.toml]
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// SQLite database file (overrides config file)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Log level (overrides config file)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub statement: StatementConfig,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct StorageConfig {
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub json: bool,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct StatementConfig {
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,

    #[serde(default)]
    pub grouping: Grouping,

    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from("."))
}

pub fn default_config_path() -> PathBuf {
    data_dir().join("expenses.toml")
}

fn default_db_path() -> PathBuf {
    data_dir().join("expenses.db")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_currency_symbol() -> String {
    "₹".to_string()
}

fn default_output_dir() -> PathBuf {
    dirs::download_dir().unwrap_or_else(|| PathBuf::from("."))
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Default for StatementConfig {
    fn default() -> Self {
        Self {
            currency_symbol: default_currency_symbol(),
            grouping: Grouping::default(),
            output_dir: default_output_dir(),
        }
    }
}

impl Config {
    /// Reads the config file (a missing file means defaults), then applies
    /// the CLI overrides.
    pub fn load(args: &GlobalArgs) -> Result<Self> {
        let path = args.config.clone().unwrap_or_else(default_config_path);
        let mut config = Self::from_file(&path)?;

        if let Some(db) = &args.db {
            config.storage.db_path = db.clone();
        }
        if let Some(level) = &args.log_level {
            config.logging.level = level.clone();
        }
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents)
                .map_err(|e| Error::Config(format!("failed to parse {}: {e}", path.display()))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(Error::Config(format!("failed to read {}: {e}", path.display()))),
        }
    }

    pub fn money_format(&self) -> MoneyFormat {
        MoneyFormat {
            symbol: self.statement.currency_symbol.clone(),
            grouping: self.statement.grouping,
        }
    }
}

/// `RUST_LOG` wins over the configured level. Output goes to stderr.
pub fn init_tracing(logging: &LoggingConfig) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&logging.level));

    let registry = tracing_subscriber::registry().with(env_filter);
    if logging.json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }
}
