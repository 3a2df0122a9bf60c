use std::collections::BTreeMap;
use std::sync::Arc;

use futures::future::{self, BoxFuture, FutureExt};
use serde_json::Value;
use tracing::debug;

use evmctl_core::{ControlOp, JsonRpcRequest, OutputFormatter, RpcError};

use crate::adapter::{dispatch, settle};
use crate::transport::Transport;

/// Declarative description of one extension method.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodSpec {
    /// Member name under the property, e.g. `increaseTime`.
    pub name: String,
    /// JSON-RPC method sent on the wire, e.g. `evm_increaseTime`.
    pub call: String,
    /// Exact number of positional parameters.
    pub params: usize,
    pub output_formatter: OutputFormatter,
}

impl MethodSpec {
    pub fn new(name: impl Into<String>, call: impl Into<String>, params: usize) -> Self {
        Self {
            name: name.into(),
            call: call.into(),
            params,
            output_formatter: OutputFormatter::Raw,
        }
    }

    pub fn with_formatter(mut self, formatter: OutputFormatter) -> Self {
        self.output_formatter = formatter;
        self
    }
}

/// Client-side method extension registry.
///
/// Methods are grouped by property (`evm`, `debug`, ...). The registry owns
/// request construction, dispatch, result unwrapping and output formatting;
/// callers only describe the method.
pub struct MethodRegistry {
    transport: Arc<dyn Transport>,
    properties: BTreeMap<String, BTreeMap<String, MethodSpec>>,
}

impl MethodRegistry {
    pub fn new(transport: impl Transport) -> Self {
        Self::from_arc(Arc::new(transport))
    }

    pub fn from_arc(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            properties: BTreeMap::new(),
        }
    }

    /// Register `methods` under `property`. A method of the same name is
    /// replaced.
    pub fn extend(&mut self, property: &str, methods: impl IntoIterator<Item = MethodSpec>) {
        let group = self.properties.entry(property.to_string()).or_default();
        for spec in methods {
            debug!(property, name = %spec.name, call = %spec.call, "extension method registered");
            group.insert(spec.name.clone(), spec);
        }
    }

    pub fn method(&self, property: &str, name: &str) -> Option<&MethodSpec> {
        self.properties.get(property)?.get(name)
    }

    pub fn has_method(&self, property: &str, name: &str) -> bool {
        self.method(property, name).is_some()
    }

    /// Call a registered method. The request goes out before this returns.
    pub fn call(
        &self,
        property: &str,
        name: &str,
        params: Vec<Value>,
    ) -> BoxFuture<'static, Result<Value, RpcError>> {
        let Some(spec) = self.method(property, name) else {
            return future::ready(Err(RpcError::UnknownMethod(format!("{property}.{name}")))).boxed();
        };
        if params.len() != spec.params {
            return future::ready(Err(RpcError::InvalidParams {
                method: spec.call.clone(),
                expected: spec.params,
                got: params.len(),
            }))
            .boxed();
        }

        let formatter = spec.output_formatter;
        let rx = dispatch(self.transport.as_ref(), JsonRpcRequest::new(spec.call.as_str(), params));
        async move { formatter.apply(settle(rx).await?) }.boxed()
    }
}

/// Registry description of a control operation. Snapshot ids and time
/// offsets come back as plain numbers.
pub fn evm_method_spec(op: ControlOp) -> MethodSpec {
    let spec = MethodSpec::new(op.field(), op.method(), op.arity());
    match op {
        ControlOp::Snapshot | ControlOp::IncreaseTime => spec.with_formatter(OutputFormatter::Quantity),
        ControlOp::Revert | ControlOp::Mine => spec,
    }
}

/// Register the control operations under `evm`, skipping any the registry
/// already exposes. Returns how many were added.
pub fn register_evm_methods(registry: &mut MethodRegistry) -> usize {
    let missing: Vec<MethodSpec> = ControlOp::ALL
        .into_iter()
        .filter(|op| !registry.has_method("evm", op.field()))
        .map(evm_method_spec)
        .collect();
    let added = missing.len();
    registry.extend("evm", missing);
    added
}
