//! JSON-RPC server exposing the bridge.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use dalc_celestia::{Availability, BridgeService, CallContext, DaError, ErrorKind};
use dalc_types::rpc::{
    CheckBlockAvailabilityResponse, DaResponse, HeightRef, RetrieveBlocksResponse,
    SubmitBlockResponse,
};
use dalc_types::{NamespaceId, RollupBlock};
use eyre::{Context, Result};
use jsonrpsee::core::{async_trait, RpcResult};
use jsonrpsee::proc_macros::rpc;
use jsonrpsee::server::{ServerBuilder, ServerHandle};
use jsonrpsee::types::ErrorObjectOwned;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Rollup height already submitted.
pub const CONFLICT_CODE: i32 = -32001;
/// No mapping for the rollup height, or nothing at the DA height.
pub const NOT_FOUND_CODE: i32 = -32002;
/// DA node unreachable, timed out or cancelled.
pub const TRANSPORT_CODE: i32 = -32003;
/// Malformed data from the DA node.
pub const CONSISTENCY_CODE: i32 = -32004;
/// Local failure.
pub const INTERNAL_CODE: i32 = -32603;

/// Bridge RPC API.
#[rpc(server, namespace = "dalc")]
pub trait DalcApi {
    /// Submit a rollup block to the DA network.
    #[method(name = "submitBlock")]
    async fn submit_block(&self, block: RollupBlock) -> RpcResult<SubmitBlockResponse>;

    /// Check whether the referenced block is available.
    #[method(name = "checkBlockAvailability")]
    async fn check_block_availability(
        &self,
        height: HeightRef,
    ) -> RpcResult<CheckBlockAvailabilityResponse>;

    /// Retrieve the blocks stored at the referenced height.
    #[method(name = "retrieveBlocks")]
    async fn retrieve_blocks(
        &self,
        height: HeightRef,
        namespace_id: Option<NamespaceId>,
    ) -> RpcResult<RetrieveBlocksResponse>;
}

/// Map a pipeline error onto its wire error.
pub fn to_rpc_error(err: &DaError) -> ErrorObjectOwned {
    let code = match err.kind() {
        ErrorKind::Conflict => CONFLICT_CODE,
        ErrorKind::NotFound => NOT_FOUND_CODE,
        ErrorKind::Transport => TRANSPORT_CODE,
        ErrorKind::Consistency => CONSISTENCY_CODE,
        ErrorKind::Internal => INTERNAL_CODE,
    };
    ErrorObjectOwned::owned(code, err.to_string(), None::<()>)
}

/// Wire form of an availability outcome.
///
/// A failed sample has no definite outcome, so it is reported as unspecified
/// with the node's reason.
pub fn availability_response(availability: Availability) -> CheckBlockAvailabilityResponse {
    match availability {
        Availability::Available => CheckBlockAvailabilityResponse {
            result: DaResponse::success(),
            data_available: true,
        },
        Availability::Unavailable(reason) => CheckBlockAvailabilityResponse {
            result: DaResponse::unspecified(reason),
            data_available: false,
        },
    }
}

/// RPC handler state.
pub struct DalcRpc {
    service: Arc<BridgeService>,
    shutdown: CancellationToken,
    timeout: Duration,
}

impl DalcRpc {
    /// Create a handler. Every request is cancelled when `shutdown` fires.
    pub fn new(
        service: Arc<BridgeService>,
        shutdown: CancellationToken,
        timeout: Duration,
    ) -> Self {
        Self {
            service,
            shutdown,
            timeout,
        }
    }

    fn context(&self) -> CallContext {
        CallContext::new(self.shutdown.child_token(), Some(self.timeout))
    }
}

#[async_trait]
impl DalcApiServer for DalcRpc {
    async fn submit_block(&self, block: RollupBlock) -> RpcResult<SubmitBlockResponse> {
        debug!(rollup_height = block.height(), txs = block.tx_count(), "submitBlock");

        let result = self
            .service
            .submit_block(&self.context(), &block)
            .await
            .map_err(|e| to_rpc_error(&e))?;

        let envelope = if result.is_success() {
            DaResponse::success()
        } else {
            DaResponse::error(result.message)
        };
        Ok(SubmitBlockResponse {
            result: envelope,
            da_height: result.da_height,
        })
    }

    async fn check_block_availability(
        &self,
        height: HeightRef,
    ) -> RpcResult<CheckBlockAvailabilityResponse> {
        debug!(?height, "checkBlockAvailability");

        let availability = self
            .service
            .check_block_availability(&self.context(), height)
            .await
            .map_err(|e| to_rpc_error(&e))?;

        Ok(availability_response(availability))
    }

    async fn retrieve_blocks(
        &self,
        height: HeightRef,
        namespace_id: Option<NamespaceId>,
    ) -> RpcResult<RetrieveBlocksResponse> {
        debug!(?height, ?namespace_id, "retrieveBlocks");

        let blocks = self
            .service
            .retrieve_blocks(&self.context(), height, namespace_id)
            .await
            .map_err(|e| to_rpc_error(&e))?;

        Ok(RetrieveBlocksResponse {
            result: DaResponse::success(),
            blocks,
        })
    }
}

/// Start serving `rpc` on `listen_addr`.
///
/// # Errors
///
/// Returns an error if the address is invalid or cannot be bound.
pub async fn start(listen_addr: &str, rpc: DalcRpc) -> Result<(ServerHandle, SocketAddr)> {
    let addr: SocketAddr = listen_addr
        .parse()
        .wrap_err_with(|| format!("invalid listen address {listen_addr:?}"))?;

    let server = ServerBuilder::default()
        .build(addr)
        .await
        .wrap_err_with(|| format!("failed to bind RPC server to {addr}"))?;
    let local_addr = server.local_addr()?;

    let handle = server.start(rpc.into_rpc());
    info!(addr = %local_addr, "RPC server started");

    Ok((handle, local_addr))
}
