use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Protocol version stamped on every request.
pub const JSONRPC_VERSION: &str = "2.0";

/// A JSON-RPC 2.0 request envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub method: String,
    pub params: Vec<Value>,
    pub id: u64,
}

/// A JSON-RPC 2.0 response envelope.
///
/// Exactly one of `result` / `error` is meaningful. No id matching happens at
/// this layer: each bridge call sends one request and awaits one reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    #[serde(default)]
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcErrorObject>,
}

impl JsonRpcResponse {
    pub fn success(id: impl Into<Value>, result: impl Into<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.into(),
            id: id.into(),
            result: Some(result.into()),
            error: None,
        }
    }

    pub fn failure(id: impl Into<Value>, error: RpcErrorObject) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.into(),
            id: id.into(),
            result: None,
            error: Some(error),
        }
    }
}

/// The `error` member of a failed response, as the node sent it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RpcErrorObject {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }
}

/// The four node-management calls outside the standard `eth_*` surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ControlOp {
    Snapshot,
    Revert,
    IncreaseTime,
    Mine,
}

impl ControlOp {
    pub const ALL: [ControlOp; 4] = [
        ControlOp::Snapshot,
        ControlOp::Revert,
        ControlOp::IncreaseTime,
        ControlOp::Mine,
    ];

    /// JSON-RPC method name on the wire.
    pub fn method(self) -> &'static str {
        match self {
            ControlOp::Snapshot => "evm_snapshot",
            ControlOp::Revert => "evm_revert",
            ControlOp::IncreaseTime => "evm_increaseTime",
            ControlOp::Mine => "evm_mine",
        }
    }

    /// Member name inside the `evm` namespace.
    pub fn field(self) -> &'static str {
        match self {
            ControlOp::Snapshot => "snapshot",
            ControlOp::Revert => "revert",
            ControlOp::IncreaseTime => "increaseTime",
            ControlOp::Mine => "mine",
        }
    }

    /// Number of positional parameters the method takes.
    pub fn arity(self) -> usize {
        match self {
            ControlOp::Snapshot | ControlOp::Mine => 0,
            ControlOp::Revert | ControlOp::IncreaseTime => 1,
        }
    }

    pub fn from_field(field: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.field() == field)
    }
}

impl fmt::Display for ControlOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.method())
    }
}

/// Opaque token returned by `evm_snapshot` and handed back to `evm_revert`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SnapshotId(pub Value);

impl SnapshotId {
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

impl From<Value> for SnapshotId {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

impl From<&str> for SnapshotId {
    fn from(s: &str) -> Self {
        Self(Value::String(s.to_string()))
    }
}

impl From<u64> for SnapshotId {
    fn from(n: u64) -> Self {
        Self(Value::from(n))
    }
}

impl fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Value::String(s) => f.write_str(s),
            other => write!(f, "{other}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn control_ops_map_to_fixed_methods_and_arity() {
        let table: Vec<_> = ControlOp::ALL
            .iter()
            .map(|op| (op.method(), op.field(), op.arity()))
            .collect();
        assert_eq!(
            table,
            vec![
                ("evm_snapshot", "snapshot", 0),
                ("evm_revert", "revert", 1),
                ("evm_increaseTime", "increaseTime", 1),
                ("evm_mine", "mine", 0),
            ]
        );
        assert_eq!(ControlOp::from_field("increaseTime"), Some(ControlOp::IncreaseTime));
        assert_eq!(ControlOp::from_field("evm_mine"), None);
    }

    #[test]
    fn response_branches_deserialize() {
        let ok: JsonRpcResponse =
            serde_json::from_value(json!({"jsonrpc": "2.0", "id": 7, "result": "0x5"})).unwrap();
        assert_eq!(ok.result, Some(json!("0x5")));
        assert!(ok.error.is_none());

        let err: JsonRpcResponse = serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "id": 7,
            "error": {"code": -32000, "message": "snapshot not found", "data": {"id": "0x9"}}
        }))
        .unwrap();
        assert!(err.result.is_none());
        let obj = err.error.unwrap();
        assert_eq!(obj.code, -32000);
        assert_eq!(obj.data, Some(json!({"id": "0x9"})));
    }

    #[test]
    fn snapshot_id_is_transparent() {
        let id: SnapshotId = serde_json::from_value(json!("0x1")).unwrap();
        assert_eq!(id, SnapshotId::from("0x1"));
        assert_eq!(serde_json::to_value(&id).unwrap(), json!("0x1"));
        assert_eq!(SnapshotId::from(3u64).to_string(), "3");
    }
}
