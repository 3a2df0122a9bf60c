//! evmctl-eventual
//!
//! Poll an async operation until it yields a value.
//!
//! `retry` keeps calling until the operation stops failing. `eventually`
//! additionally treats a `None` result as "not there yet" and bounds the whole
//! loop with a timeout; it is what waits for receipts, confirmations and other
//! values that only appear after the node has moved on.

pub mod eventual;
pub mod policy;
pub mod retry;

pub use eventual::{eventually, EventuallyExt, PollError};
pub use policy::{PollArgs, RetryPolicy, DEFAULT_INTERVAL, DEFAULT_TIMEOUT};
pub use retry::retry;
