use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use futures::future::{self, BoxFuture, FutureExt};
use serde_json::Value;
use tracing::debug;

use evmctl_core::{as_bool, parse_quantity, ControlOp, RpcError, SnapshotId};

use crate::adapter::{Convention, DeferredOp, NormalizedOp, PassthroughOp};
use crate::transport::{Reply, Transport};

/// One member of the `evm` namespace.
#[derive(Debug)]
pub enum Slot<H> {
    /// A callable member, installed by `attach` or supplied by the consumer.
    Op(H),
    /// A non-callable value a consumer put there first: a sentinel, a marker.
    Preset(Value),
}

/// The `evm` control namespace: member name → slot.
///
/// Attaching only fills names that are absent, so existing members, callable
/// or not, survive any number of attach passes.
#[derive(Debug)]
pub struct EvmNamespace<H> {
    slots: BTreeMap<String, Slot<H>>,
}

impl<H> Default for EvmNamespace<H> {
    fn default() -> Self {
        Self {
            slots: BTreeMap::new(),
        }
    }
}

impl<H> EvmNamespace<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh namespace with every control operation installed.
    pub fn build<C>(transport: Arc<dyn Transport>, convention: &C) -> Self
    where
        C: Convention<Handler = H>,
    {
        let mut ns = Self::new();
        ns.install_missing(transport, convention);
        ns
    }

    /// Install `handler` under `field`, e.g. a consumer stub built with
    /// `DeferredOp::custom`. `attach` never replaces it.
    pub fn with_op(mut self, field: &str, handler: H) -> Self {
        self.set_op(field, handler);
        self
    }

    pub fn set_op(&mut self, field: &str, handler: H) {
        self.slots.insert(field.to_string(), Slot::Op(handler));
    }

    pub fn with_preset(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.set_preset(field, value);
        self
    }

    pub fn set_preset(&mut self, field: &str, value: impl Into<Value>) {
        self.slots.insert(field.to_string(), Slot::Preset(value.into()));
    }

    pub fn get(&self, field: &str) -> Option<&Slot<H>> {
        self.slots.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.slots.contains_key(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.slots.keys().map(String::as_str)
    }

    /// Install a handler for every control operation whose member is absent.
    /// Returns how many were installed.
    pub fn install_missing<C>(&mut self, transport: Arc<dyn Transport>, convention: &C) -> usize
    where
        C: Convention<Handler = H>,
    {
        let mut installed = 0;
        for op in ControlOp::ALL {
            if self.slots.contains_key(op.field()) {
                continue;
            }
            let handler = convention.handler(Arc::clone(&transport), op);
            self.slots.insert(op.field().to_string(), Slot::Op(handler));
            installed += 1;
        }
        installed
    }

    fn handler(&self, op: ControlOp) -> Result<&H, RpcError> {
        match self.slots.get(op.field()) {
            Some(Slot::Op(h)) => Ok(h),
            _ => Err(RpcError::NotCallable(op.field().to_string())),
        }
    }
}

/// A node client handle: its transport plus an optional `evm` namespace.
pub struct NodeClient<H> {
    transport: Arc<dyn Transport>,
    pub evm: Option<EvmNamespace<H>>,
}

impl<H> NodeClient<H> {
    pub fn new(transport: impl Transport) -> Self {
        Self::from_arc(Arc::new(transport))
    }

    pub fn from_arc(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            evm: None,
        }
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }
}

/// Ensure `client` carries a complete `evm` namespace.
///
/// Reuses an existing namespace and installs only members that are missing.
/// Never fails; safe to call repeatedly.
pub fn attach<'a, C: Convention>(
    client: &'a mut NodeClient<C::Handler>,
    convention: &C,
) -> &'a mut EvmNamespace<C::Handler> {
    let transport = Arc::clone(&client.transport);
    let ns = client.evm.get_or_insert_with(EvmNamespace::new);
    let installed = ns.install_missing(transport, convention);
    debug!(installed, "evm namespace attached");
    ns
}

impl EvmNamespace<DeferredOp> {
    /// Run `op` with raw parameters; resolves to the untouched `result`.
    pub fn invoke(&self, op: ControlOp, params: Vec<Value>) -> BoxFuture<'static, Result<Value, RpcError>> {
        match self.handler(op) {
            Ok(h) => h.call(params),
            Err(e) => future::ready(Err(e)).boxed(),
        }
    }

    pub fn snapshot(&self) -> impl Future<Output = Result<SnapshotId, RpcError>> + Send + 'static {
        self.invoke(ControlOp::Snapshot, vec![])
            .map(|r| r.map(SnapshotId::from))
    }

    /// `true` when the node rolled back to `id`.
    pub fn revert(&self, id: &SnapshotId) -> impl Future<Output = Result<bool, RpcError>> + Send + 'static {
        self.invoke(ControlOp::Revert, vec![id.as_value().clone()])
            .map(|r| r.and_then(|v| as_bool(&v)))
    }

    /// Advance the node clock; resolves to the cumulative offset in seconds.
    pub fn increase_time(&self, seconds: u64) -> impl Future<Output = Result<u64, RpcError>> + Send + 'static {
        self.invoke(ControlOp::IncreaseTime, vec![Value::from(seconds)])
            .map(|r| r.and_then(|v| parse_quantity(&v)))
    }

    pub fn mine(&self) -> impl Future<Output = Result<Value, RpcError>> + Send + 'static {
        self.invoke(ControlOp::Mine, vec![])
    }
}

impl EvmNamespace<NormalizedOp> {
    pub fn invoke<F>(&self, op: ControlOp, params: Vec<Value>, callback: F)
    where
        F: FnOnce(Result<Value, RpcError>) + Send + 'static,
    {
        match self.handler(op) {
            Ok(h) => h.call(params, Box::new(callback)),
            Err(e) => callback(Err(e)),
        }
    }

    pub fn snapshot<F>(&self, callback: F)
    where
        F: FnOnce(Result<Value, RpcError>) + Send + 'static,
    {
        self.invoke(ControlOp::Snapshot, vec![], callback)
    }

    pub fn revert<F>(&self, id: &SnapshotId, callback: F)
    where
        F: FnOnce(Result<Value, RpcError>) + Send + 'static,
    {
        self.invoke(ControlOp::Revert, vec![id.as_value().clone()], callback)
    }

    pub fn increase_time<F>(&self, seconds: u64, callback: F)
    where
        F: FnOnce(Result<Value, RpcError>) + Send + 'static,
    {
        self.invoke(ControlOp::IncreaseTime, vec![Value::from(seconds)], callback)
    }

    pub fn mine<F>(&self, callback: F)
    where
        F: FnOnce(Result<Value, RpcError>) + Send + 'static,
    {
        self.invoke(ControlOp::Mine, vec![], callback)
    }
}

/// Members of this flavour do not unwrap the reply: the callback receives the
/// response envelope and reads `result` itself.
impl EvmNamespace<PassthroughOp> {
    pub fn invoke<F>(&self, op: ControlOp, params: Vec<Value>, callback: F)
    where
        F: FnOnce(Reply) + Send + 'static,
    {
        match self.handler(op) {
            Ok(h) => h.call(params, Box::new(callback)),
            Err(e) => callback(Err(e)),
        }
    }

    pub fn snapshot<F>(&self, callback: F)
    where
        F: FnOnce(Reply) + Send + 'static,
    {
        self.invoke(ControlOp::Snapshot, vec![], callback)
    }

    pub fn revert<F>(&self, id: &SnapshotId, callback: F)
    where
        F: FnOnce(Reply) + Send + 'static,
    {
        self.invoke(ControlOp::Revert, vec![id.as_value().clone()], callback)
    }

    pub fn increase_time<F>(&self, seconds: u64, callback: F)
    where
        F: FnOnce(Reply) + Send + 'static,
    {
        self.invoke(ControlOp::IncreaseTime, vec![Value::from(seconds)], callback)
    }

    pub fn mine<F>(&self, callback: F)
    where
        F: FnOnce(Reply) + Send + 'static,
    {
        self.invoke(ControlOp::Mine, vec![], callback)
    }
}
