use serde_json::Value;

use crate::error::RpcError;
use crate::types::JsonRpcResponse;

/// Unwrap a response: the `error` object verbatim on failure, the `result`
/// otherwise. A reply with neither (e.g. `evm_mine` on some nodes) yields `null`.
pub fn into_result(response: JsonRpcResponse) -> Result<Value, RpcError> {
    match response.error {
        Some(err) => Err(RpcError::Node(err)),
        None => Ok(response.result.unwrap_or(Value::Null)),
    }
}

/// Post-processing applied to a method's result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormatter {
    /// Pass the result through untouched.
    #[default]
    Raw,
    /// Hex (`0x..`) or decimal quantity → JSON number. Well-formed quantities
    /// wider than `u64` are passed through as the node sent them.
    Quantity,
}

impl OutputFormatter {
    pub fn apply(self, value: Value) -> Result<Value, RpcError> {
        match self {
            OutputFormatter::Raw => Ok(value),
            OutputFormatter::Quantity => match parse_quantity(&value) {
                Ok(n) => Ok(Value::from(n)),
                Err(_) if is_wide_quantity(&value) => Ok(value),
                Err(e) => Err(e),
            },
        }
    }
}

/// A syntactically valid quantity string that `parse_quantity` rejected,
/// i.e. one that overflows `u64`.
fn is_wide_quantity(value: &Value) -> bool {
    let Value::String(s) = value else {
        return false;
    };
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => !hex.is_empty() && hex.bytes().all(|b| b.is_ascii_hexdigit()),
        None => !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()),
    }
}

/// Read a quantity the way nodes emit them: a JSON number, a `0x` hex string,
/// or a decimal string. Values above `u64::MAX` are rejected.
pub fn parse_quantity(value: &Value) -> Result<u64, RpcError> {
    let parsed = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            Some(hex) => u64::from_str_radix(hex, 16).ok(),
            None => s.parse().ok(),
        },
        _ => None,
    };
    parsed.ok_or_else(|| unexpected("quantity", value))
}

pub fn as_bool(value: &Value) -> Result<bool, RpcError> {
    value.as_bool().ok_or_else(|| unexpected("boolean", value))
}

fn unexpected(expected: &'static str, got: &Value) -> RpcError {
    RpcError::UnexpectedResult {
        expected,
        got: got.to_string(),
    }
}
