use thiserror::Error;

use crate::types::RpcErrorObject;

/// Every failure a control call can report.
///
/// Transport and node errors carry exactly what the transport or node
/// produced; nothing above this layer rewrites them.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RpcError {
    // ── Transport ────────────────────────────────────────────────────────────
    #[error("transport error: {0}")]
    Transport(String),

    #[error("transport dropped the request without replying")]
    NoReply,

    // ── Node ─────────────────────────────────────────────────────────────────
    #[error("node error {}: {}", .0.code, .0.message)]
    Node(RpcErrorObject),

    // ── Bridge ───────────────────────────────────────────────────────────────
    #[error("{method} expects {expected} parameter(s), got {got}")]
    InvalidParams {
        method: String,
        expected: usize,
        got: usize,
    },

    #[error("namespace member `{0}` is not callable")]
    NotCallable(String),

    #[error("no method `{0}` registered")]
    UnknownMethod(String),

    #[error("unexpected result: expected {expected}, got {got}")]
    UnexpectedResult { expected: &'static str, got: String },
}
