//! evmctl-core
//!
//! Wire types and the request/response plumbing shared by every evmctl crate.
//!
//! Control operations (all non-standard, served by development nodes):
//!   evm_snapshot      — capture node state, returns an opaque id
//!   evm_revert        — roll back to a snapshot id
//!   evm_increaseTime  — advance the node clock by N seconds
//!   evm_mine          — force a new block

pub mod error;
pub mod id;
pub mod normalize;
pub mod request;
pub mod types;

pub use error::RpcError;
pub use id::{next_id, IdGenerator};
pub use normalize::{as_bool, into_result, parse_quantity, OutputFormatter};
pub use request::build_request;
pub use types::*;
