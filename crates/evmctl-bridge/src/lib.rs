//! evmctl-bridge
//!
//! Attaches the `evm` control namespace (snapshot / revert / increaseTime /
//! mine) to a node client, dispatching raw JSON-RPC through its transport.
//!
//! Conventions, picked once when the namespace is attached:
//!   Deferred     — members return a future resolving to the unwrapped result
//!   Normalized   — members take a callback receiving `Result<result, error>`
//!   Passthrough  — members hand the caller's callback straight to the
//!                  transport; the caller unwraps `.result` itself
//!   MethodRegistry — declarative: describe each method to the registry and
//!                  let it build, send and format the call

pub mod adapter;
pub mod namespace;
pub mod registry;
pub mod transport;

#[cfg(test)]
mod testing;

pub use adapter::{
    Convention, Deferred, DeferredFn, DeferredOp, Normalized, NormalizedFn, NormalizedOp,
    Passthrough, PassthroughFn, PassthroughOp, ResultCallback,
};
pub use namespace::{attach, EvmNamespace, NodeClient, Slot};
pub use registry::{evm_method_spec, register_evm_methods, MethodRegistry, MethodSpec};
pub use transport::{HttpTransport, Reply, ReplyCallback, Transport};
