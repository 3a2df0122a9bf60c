//! evmctl-rpc
//!
//! JSON-RPC 2.0 surface of the in-memory development node.
//!
//! Methods:
//!   evm_snapshot              — snapshot chain state, returns "0x<n>"
//!   evm_revert                — restore a snapshot (drops it and later ones)
//!   evm_increaseTime          — shift the node clock, returns total offset
//!   evm_mine                  — mine one empty block
//!   eth_blockNumber           — latest block number (hex)
//!   eth_getBlockByNumber      — block header summary by number or tag
//!   web3_clientVersion        — node identification string

pub mod api;
pub mod chain;
pub mod server;
pub mod types;

pub use chain::{Block, DevChain};
pub use server::{NodeConfig, RpcServer, RpcServerState};
pub use types::RpcBlock;
