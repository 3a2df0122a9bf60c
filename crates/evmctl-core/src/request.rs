use serde_json::Value;

use crate::error::RpcError;
use crate::id::next_id;
use crate::types::{ControlOp, JsonRpcRequest, JSONRPC_VERSION};

impl JsonRpcRequest {
    /// Build a request for any method, stamped with a fresh id.
    pub fn new(method: impl Into<String>, params: Vec<Value>) -> Self {
        Self::with_id(method, params, next_id())
    }

    pub fn with_id(method: impl Into<String>, params: Vec<Value>, id: u64) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.into(),
            params,
            id,
        }
    }
}

/// Build the request for a control operation, rejecting a wrong parameter count.
pub fn build_request(op: ControlOp, params: Vec<Value>) -> Result<JsonRpcRequest, RpcError> {
    if params.len() != op.arity() {
        return Err(RpcError::InvalidParams {
            method: op.method().to_string(),
            expected: op.arity(),
            got: params.len(),
        });
    }
    Ok(JsonRpcRequest::new(op.method(), params))
}
