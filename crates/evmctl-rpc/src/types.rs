use serde::{Deserialize, Serialize};

use crate::chain::Block;

/// Block summary returned by `eth_getBlockByNumber`. Quantities are hex.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcBlock {
    pub number: String,
    pub timestamp: String,
}

impl From<&Block> for RpcBlock {
    fn from(b: &Block) -> Self {
        Self {
            number: format!("0x{:x}", b.number),
            timestamp: format!("0x{:x}", b.timestamp),
        }
    }
}
