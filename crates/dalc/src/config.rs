//! Configuration loading and validation.

use std::net::SocketAddr;
use std::path::Path;

use dalc_celestia::validate_square_sizes;
use dalc_types::{
    BridgeConfig, DaConfig, KeyringConfig, NamespaceId, RetrievalMode, SubmitterConfig,
};
use eyre::{Context, Result};

/// Default home directory.
pub const DEFAULT_HOME: &str = ".dalc";

/// Configuration file name inside the home directory.
pub const CONFIG_FILE: &str = "dalc.toml";

/// Load configuration from a TOML file.
///
/// Relative ledger and keyring paths resolve against `home`.
///
/// # Errors
///
/// Returns an error if the file cannot be read, parsed or validated.
pub fn load(path: &Path, home: &Path) -> Result<BridgeConfig> {
    let contents = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("failed to read config file: {}", path.display()))?;

    let mut config: BridgeConfig =
        toml::from_str(&contents).wrap_err("failed to parse configuration")?;

    config.ledger_path = home.join(&config.ledger_path);
    config.keyring.path = home.join(&config.keyring.path);

    validate(&config)?;
    Ok(config)
}

/// Validate the configuration.
///
/// # Errors
///
/// Returns an error if validation fails.
pub fn validate(config: &BridgeConfig) -> Result<()> {
    config
        .listen_addr
        .parse::<SocketAddr>()
        .wrap_err_with(|| format!("invalid listen_addr {:?}", config.listen_addr))?;

    if config.request_timeout_ms == 0 {
        eyre::bail!("request_timeout_ms must be non-zero");
    }

    if config.da.tx_endpoint.is_empty() {
        eyre::bail!("da tx_endpoint is required");
    }
    if config.da.query_endpoint.is_empty() {
        eyre::bail!("da query_endpoint is required");
    }
    if config.da.chain_id.is_empty() {
        eyre::bail!("da chain_id is required");
    }

    if config.submitter.gas_limit == 0 {
        eyre::bail!("submitter gas_limit must be non-zero");
    }
    if config.submitter.denom.is_empty() {
        eyre::bail!("submitter denom is required");
    }
    validate_square_sizes(&config.submitter.square_sizes)?;

    if config.keyring.account_name.is_empty() {
        eyre::bail!("keyring account_name is required");
    }

    Ok(())
}

/// Generate a default configuration.
#[must_use]
pub fn default_config() -> BridgeConfig {
    BridgeConfig {
        listen_addr: "127.0.0.1:4200".to_string(),
        namespace_id: NamespaceId::new([1, 2, 3, 4, 5, 6, 7, 8]),
        ledger_path: "height_map.json".into(),
        request_timeout_ms: 60_000,
        retrieval_mode: RetrievalMode::Multi,
        da: DaConfig {
            tx_endpoint: "http://127.0.0.1:9090".to_string(),
            query_endpoint: "http://127.0.0.1:26658".to_string(),
            auth_token: String::new(),
            chain_id: "test".to_string(),
        },
        submitter: SubmitterConfig::default(),
        keyring: KeyringConfig::default(),
    }
}
