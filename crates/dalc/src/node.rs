//! Node wiring and lifecycle.

use std::sync::Arc;
use std::time::Duration;

use dalc_celestia::{
    AvailabilityHeaderResolver, BlockRetriever, BlockSubmitter, BridgeService, DaNodeClient,
    HeightLedger, KeyringSigner, XorSquareCodec,
};
use dalc_types::BridgeConfig;
use eyre::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::server::{self, DalcRpc};

/// Build the bridge service from configuration.
///
/// # Errors
///
/// Returns an error if the ledger, DA client or keyring cannot be set up.
pub async fn build_service(config: &BridgeConfig) -> Result<BridgeService> {
    let ledger = HeightLedger::load(&config.ledger_path)
        .await
        .wrap_err("failed to load height ledger")?;

    let node = Arc::new(DaNodeClient::new(&config.da)?);
    let signer = KeyringSigner::from_config(&config.keyring, &config.da.chain_id, node.clone())
        .wrap_err("failed to load keyring")?;

    let submitter = BlockSubmitter::new(Arc::new(signer), node.clone(), &config.submitter)?;
    let resolver = AvailabilityHeaderResolver::new(node.clone(), Arc::new(XorSquareCodec));
    let retriever = BlockRetriever::new(Arc::new(resolver), node);

    Ok(BridgeService::new(
        Arc::new(ledger),
        submitter,
        retriever,
        config.namespace_id,
        config.retrieval_mode,
    ))
}

/// Serve the bridge until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the node fails to start.
pub async fn run(config: BridgeConfig) -> Result<()> {
    let service = Arc::new(build_service(&config).await?);
    let mappings = service.ledger().mappings().await;
    if let Some(last) = mappings.last() {
        info!(
            rollup_height = last.rollup_height,
            da_height = last.da_height,
            "Last recorded submission"
        );
    }
    info!(
        namespace = %config.namespace_id,
        mode = ?config.retrieval_mode,
        mappings = mappings.len(),
        "Bridge ready"
    );

    let shutdown = CancellationToken::new();
    let rpc = DalcRpc::new(
        service,
        shutdown.clone(),
        Duration::from_millis(config.request_timeout_ms),
    );
    let (handle, _) = server::start(&config.listen_addr, rpc).await?;

    tokio::signal::ctrl_c()
        .await
        .wrap_err("failed to listen for shutdown signal")?;
    info!("Shutting down");

    shutdown.cancel();
    if handle.stop().is_err() {
        warn!("RPC server already stopped");
    }
    handle.stopped().await;

    Ok(())
}
