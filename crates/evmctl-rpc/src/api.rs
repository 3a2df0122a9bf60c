use jsonrpsee::core::RpcResult;
use jsonrpsee::proc_macros::rpc;
use serde_json::Value;

use crate::types::RpcBlock;

/// Control methods, declared once and expanded by jsonrpsee into both the
/// server trait and a typed client (`EvmApiClient`).
///
/// All method names are prefixed with "evm_" via `namespace = "evm"`.
#[rpc(server, client, namespace = "evm")]
pub trait EvmApi {
    /// Snapshot the chain. Returns the id to pass to `evm_revert`.
    #[method(name = "snapshot")]
    async fn snapshot(&self) -> RpcResult<String>;

    /// Roll back to a snapshot. `false` if the id is unknown or already used.
    #[method(name = "revert")]
    async fn revert(&self, snapshot_id: Value) -> RpcResult<bool>;

    /// Add `seconds` to the node clock. Returns the cumulative offset.
    #[method(name = "increaseTime")]
    async fn increase_time(&self, seconds: u64) -> RpcResult<u64>;

    /// Mine one block.
    #[method(name = "mine")]
    async fn mine(&self) -> RpcResult<String>;
}

/// The few standard methods the dev node answers.
#[rpc(server, client)]
pub trait EthApi {
    #[method(name = "eth_blockNumber")]
    async fn block_number(&self) -> RpcResult<String>;

    /// `block` is a hex number or one of "latest" / "earliest" / "pending".
    /// The second flag (full transactions) is accepted and ignored.
    #[method(name = "eth_getBlockByNumber")]
    async fn block_by_number(&self, block: String, full: bool) -> RpcResult<Option<RpcBlock>>;

    #[method(name = "web3_clientVersion")]
    async fn client_version(&self) -> RpcResult<String>;
}
