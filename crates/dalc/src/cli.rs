//! Command-line interface.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use dalc_celestia::{account_address, generate_key, load_key};
use eyre::{Context, Result};
use tracing::info;

use crate::config::{self, CONFIG_FILE};
use crate::node;

/// Data availability light client.
#[derive(Parser)]
#[command(name = "dalc")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Log level used when RUST_LOG is unset (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Create a home directory with default configuration, key and ledger.
    Init {
        /// Home directory.
        #[arg(long, default_value = config::DEFAULT_HOME)]
        home: PathBuf,
    },

    /// Run the bridge.
    Start {
        /// Home directory.
        #[arg(long, default_value = config::DEFAULT_HOME)]
        home: PathBuf,

        /// Configuration file. Defaults to `<home>/dalc.toml`.
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Generate a new secp256k1 account key.
    Keygen {
        /// Output path for the key file.
        #[arg(short, long, default_value = "dalc.key")]
        output: PathBuf,
    },

    /// Print the account address of a key file.
    Address {
        /// Path to a hex-encoded secp256k1 key file.
        #[arg(short, long)]
        key: PathBuf,
    },
}

impl Cli {
    /// Log filter directive for the subscriber.
    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::Init { home } => Self::init_home(&home),
            Commands::Start { home, config } => {
                let config = config.unwrap_or_else(|| home.join(CONFIG_FILE));
                Self::start(&home, &config).await
            }
            Commands::Keygen { output } => Self::generate_key(&output),
            Commands::Address { key } => Self::address(&key),
        }
    }

    async fn start(home: &Path, config: &Path) -> Result<()> {
        info!(config = %config.display(), "Loading configuration");
        let cfg = config::load(config, home)?;
        node::run(cfg).await
    }

    fn init_home(home: &Path) -> Result<()> {
        info!(home = %home.display(), "Initializing home directory");
        std::fs::create_dir_all(home)
            .wrap_err_with(|| format!("failed to create {}", home.display()))?;

        let cfg = config::default_config();

        let config_path = home.join(CONFIG_FILE);
        if config_path.exists() {
            info!(path = %config_path.display(), "Configuration exists, leaving it");
        } else {
            std::fs::write(&config_path, toml::to_string_pretty(&cfg)?)?;
            info!(path = %config_path.display(), "Configuration written");
        }

        let ledger_path = home.join(&cfg.ledger_path);
        if !ledger_path.exists() {
            std::fs::write(&ledger_path, "{}\n")?;
            info!(path = %ledger_path.display(), "Empty height ledger created");
        }

        let key_path = home.join(cfg.keyring.key_file());
        if !key_path.exists() {
            if let Some(dir) = key_path.parent() {
                std::fs::create_dir_all(dir)?;
            }
            Self::generate_key(&key_path)?;
        }

        Ok(())
    }

    fn generate_key(output: &Path) -> Result<()> {
        let key = generate_key();
        let address = account_address(&key)?;
        std::fs::write(output, hex::encode(key.to_bytes()))
            .wrap_err_with(|| format!("failed to write {}", output.display()))?;

        info!(path = %output.display(), %address, "Account key generated");
        Ok(())
    }

    fn address(key_path: &Path) -> Result<()> {
        let key = load_key(key_path)?;
        println!("{}", account_address(&key)?);
        Ok(())
    }
}
