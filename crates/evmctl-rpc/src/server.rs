use std::net::SocketAddr;
use std::sync::Arc;

use jsonrpsee::core::{async_trait, RpcResult};
use jsonrpsee::server::{Server, ServerHandle};
use jsonrpsee::types::ErrorObject;
use jsonrpsee::RpcModule;
use serde_json::Value;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use evmctl_core::parse_quantity;

use crate::api::{EthApiServer, EvmApiServer};
use crate::chain::DevChain;
use crate::types::RpcBlock;

fn rpc_err(code: i32, msg: impl Into<String>) -> ErrorObject<'static> {
    ErrorObject::owned(code, msg.into(), None::<()>)
}

fn wall_clock() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}

/// Development node settings.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Genesis block timestamp; the current wall clock when unset.
    pub genesis_timestamp: Option<u64>,
    /// Returned by `web3_clientVersion`.
    pub client_version: String,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            genesis_timestamp: None,
            client_version: format!("evmctl-devnode/v{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Shared state passed to the RPC server.
pub struct RpcServerState {
    pub chain: Mutex<DevChain>,
    pub client_version: String,
}

impl RpcServerState {
    pub fn new(config: &NodeConfig) -> Self {
        let genesis = config.genesis_timestamp.unwrap_or_else(wall_clock);
        Self {
            chain: Mutex::new(DevChain::new(genesis)),
            client_version: config.client_version.clone(),
        }
    }
}

/// The RPC server implementation.
#[derive(Clone)]
pub struct RpcServer {
    state: Arc<RpcServerState>,
}

impl RpcServer {
    pub fn new(state: Arc<RpcServerState>) -> Self {
        Self { state }
    }

    /// Both method groups merged into one module.
    pub fn into_module(self) -> anyhow::Result<RpcModule<()>> {
        let mut module = RpcModule::new(());
        module.merge(EvmApiServer::into_rpc(self.clone()))?;
        module.merge(EthApiServer::into_rpc(self))?;
        Ok(module)
    }

    /// Start the JSON-RPC server on `addr`. Returns the bound address (useful
    /// with port 0) and a handle to stop it.
    pub async fn start(self, addr: SocketAddr) -> anyhow::Result<(SocketAddr, ServerHandle)> {
        let middleware = tower::ServiceBuilder::new().layer(CorsLayer::permissive());
        let server = Server::builder()
            .set_http_middleware(middleware)
            .build(addr)
            .await?;
        let local_addr = server.local_addr()?;
        let handle = server.start(self.into_module()?);
        info!(addr = %local_addr, "RPC server started");
        Ok((local_addr, handle))
    }
}

#[async_trait]
impl EvmApiServer for RpcServer {
    async fn snapshot(&self) -> RpcResult<String> {
        let id = self.state.chain.lock().await.snapshot();
        Ok(format!("0x{id:x}"))
    }

    async fn revert(&self, snapshot_id: Value) -> RpcResult<bool> {
        let id = parse_quantity(&snapshot_id)
            .map_err(|e| rpc_err(-32602, format!("invalid snapshot id: {e}")))?;

        let reverted = self.state.chain.lock().await.revert(id);
        if !reverted {
            warn!(id, "revert to unknown snapshot");
        }
        Ok(reverted)
    }

    async fn increase_time(&self, seconds: u64) -> RpcResult<u64> {
        self.state
            .chain
            .lock()
            .await
            .increase_time(seconds)
            .ok_or_else(|| rpc_err(-32602, format!("time offset overflow: cannot add {seconds}s")))
    }

    async fn mine(&self) -> RpcResult<String> {
        self.state.chain.lock().await.mine(wall_clock());
        Ok("0x0".to_string())
    }
}

#[async_trait]
impl EthApiServer for RpcServer {
    async fn block_number(&self) -> RpcResult<String> {
        let height = self.state.chain.lock().await.block_number();
        Ok(format!("0x{height:x}"))
    }

    async fn block_by_number(&self, block: String, _full: bool) -> RpcResult<Option<RpcBlock>> {
        let chain = self.state.chain.lock().await;
        let found = match block.as_str() {
            "latest" | "pending" => Some(chain.latest()),
            "earliest" => chain.block(0),
            n => {
                let number = parse_quantity(&Value::String(n.to_string()))
                    .map_err(|e| rpc_err(-32602, format!("invalid block number: {e}")))?;
                chain.block(number)
            }
        };
        Ok(found.map(RpcBlock::from))
    }

    async fn client_version(&self) -> RpcResult<String> {
        Ok(self.state.client_version.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn server() -> RpcServer {
        let config = NodeConfig {
            genesis_timestamp: Some(1_000),
            ..NodeConfig::default()
        };
        RpcServer::new(Arc::new(RpcServerState::new(&config)))
    }

    #[tokio::test]
    async fn snapshot_mine_revert() {
        let s = server();
        let id = EvmApiServer::snapshot(&s).await.unwrap();
        assert_eq!(id, "0x1");

        s.mine().await.unwrap();
        s.mine().await.unwrap();
        assert_eq!(s.block_number().await.unwrap(), "0x2");

        assert!(s.revert(json!(id)).await.unwrap());
        assert_eq!(s.block_number().await.unwrap(), "0x0");
        assert!(!s.revert(json!("0x1")).await.unwrap());
    }

    #[tokio::test]
    async fn revert_accepts_numeric_id() {
        let s = server();
        EvmApiServer::snapshot(&s).await.unwrap();
        assert!(s.revert(json!(1)).await.unwrap());
    }

    #[tokio::test]
    async fn revert_rejects_garbage_id() {
        let s = server();
        let err = s.revert(json!({"id": 1})).await.unwrap_err();
        assert_eq!(err.code(), -32602);
    }

    #[tokio::test]
    async fn increase_time_shifts_next_block() {
        let s = server();
        assert_eq!(s.increase_time(0).await.unwrap(), 0);
        assert_eq!(s.increase_time(3_600).await.unwrap(), 3_600);
        s.mine().await.unwrap();

        let genesis = s.block_by_number("earliest".into(), false).await.unwrap().unwrap();
        let latest = s.block_by_number("latest".into(), false).await.unwrap().unwrap();
        let ts = |b: &RpcBlock| parse_quantity(&json!(b.timestamp)).unwrap();
        assert_eq!(latest.number, "0x1");
        assert!(ts(&latest) >= ts(&genesis) + 3_600);
    }

    #[tokio::test]
    async fn increase_time_overflow_is_invalid_params() {
        let s = server();
        assert_eq!(s.increase_time(u64::MAX - 10).await.unwrap(), u64::MAX - 10);
        let err = s.increase_time(11).await.unwrap_err();
        assert_eq!(err.code(), -32602);

        // The node keeps serving after the rejected call.
        s.mine().await.unwrap();
        let latest = s.block_by_number("latest".into(), false).await.unwrap().unwrap();
        assert_eq!(latest.timestamp, format!("0x{:x}", u64::MAX));
    }

    #[tokio::test]
    async fn unknown_block_is_null() {
        let s = server();
        assert_eq!(s.block_by_number("0x5".into(), false).await.unwrap(), None);
        assert!(s.block_by_number("nope".into(), false).await.is_err());
    }

    #[tokio::test]
    async fn client_version_from_config() {
        let s = server();
        assert!(s.client_version().await.unwrap().starts_with("evmctl-devnode/v"));
    }

    #[test]
    fn module_registers_every_method() {
        let module = server().into_module().unwrap();
        let mut names: Vec<_> = module.method_names().collect();
        names.sort();
        assert_eq!(
            names,
            vec![
                "eth_blockNumber",
                "eth_getBlockByNumber",
                "evm_increaseTime",
                "evm_mine",
                "evm_revert",
                "evm_snapshot",
                "web3_clientVersion",
            ]
        );
    }
}
