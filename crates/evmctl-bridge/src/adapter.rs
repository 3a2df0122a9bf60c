use std::fmt;
use std::sync::Arc;

use futures::future::{self, BoxFuture, FutureExt};
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::debug;

use evmctl_core::{build_request, into_result, ControlOp, JsonRpcRequest, RpcError};

use crate::transport::{Reply, ReplyCallback, Transport};

/// Callback receiving an already-unwrapped result.
pub type ResultCallback = Box<dyn FnOnce(Result<Value, RpcError>) + Send + 'static>;

/// How control members are exposed on the namespace.
///
/// One implementation per convention; the choice is made once, when the
/// namespace is attached, never per call.
pub trait Convention {
    type Handler;

    fn handler(&self, transport: Arc<dyn Transport>, op: ControlOp) -> Self::Handler;
}

/// Future-returning members; the transport callback is bridged internally.
#[derive(Debug, Clone, Copy, Default)]
pub struct Deferred;

/// Callback members; the transport reply is unwrapped before the caller sees it.
#[derive(Debug, Clone, Copy, Default)]
pub struct Normalized;

/// Callback members forwarded to the transport untouched.
///
/// Unlike the other conventions the caller receives the full response
/// envelope and must pull `result` out itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl Convention for Deferred {
    type Handler = DeferredOp;

    fn handler(&self, transport: Arc<dyn Transport>, op: ControlOp) -> DeferredOp {
        DeferredOp {
            op,
            route: Route::Node(transport),
        }
    }
}

impl Convention for Normalized {
    type Handler = NormalizedOp;

    fn handler(&self, transport: Arc<dyn Transport>, op: ControlOp) -> NormalizedOp {
        NormalizedOp {
            op,
            route: Route::Node(transport),
        }
    }
}

impl Convention for Passthrough {
    type Handler = PassthroughOp;

    fn handler(&self, transport: Arc<dyn Transport>, op: ControlOp) -> PassthroughOp {
        PassthroughOp {
            op,
            route: Route::Node(transport),
        }
    }
}

/// Send `request` now and return the receiving half of its reply.
pub(crate) fn dispatch(transport: &dyn Transport, request: JsonRpcRequest) -> oneshot::Receiver<Reply> {
    debug!(method = %request.method, id = request.id, "dispatching");
    let (tx, rx) = oneshot::channel();
    transport.send(
        request,
        Box::new(move |reply| {
            // Receiver gone means the caller stopped waiting.
            let _ = tx.send(reply);
        }),
    );
    rx
}

/// Await a dispatched reply and unwrap it.
pub(crate) async fn settle(rx: oneshot::Receiver<Reply>) -> Result<Value, RpcError> {
    let response = rx.await.map_err(|_| RpcError::NoReply)??;
    into_result(response)
}

/// Signature of a caller-supplied future-returning member.
pub type DeferredFn = dyn Fn(Vec<Value>) -> BoxFuture<'static, Result<Value, RpcError>> + Send + Sync;
/// Signature of a caller-supplied normalized member.
pub type NormalizedFn = dyn Fn(Vec<Value>, ResultCallback) + Send + Sync;
/// Signature of a caller-supplied passthrough member.
pub type PassthroughFn = dyn Fn(Vec<Value>, ReplyCallback) + Send + Sync;

/// Where a handler sends its calls: the node, or a consumer's own function.
enum Route<F: ?Sized> {
    Node(Arc<dyn Transport>),
    Custom(Arc<F>),
}

impl<F: ?Sized> Clone for Route<F> {
    fn clone(&self) -> Self {
        match self {
            Route::Node(t) => Route::Node(Arc::clone(t)),
            Route::Custom(f) => Route::Custom(Arc::clone(f)),
        }
    }
}

impl<F: ?Sized> Route<F> {
    fn kind(&self) -> &'static str {
        match self {
            Route::Node(_) => "node",
            Route::Custom(_) => "custom",
        }
    }
}

#[derive(Clone)]
pub struct DeferredOp {
    op: ControlOp,
    route: Route<DeferredFn>,
}

impl DeferredOp {
    /// A member backed by `f` instead of the node. Parameters reach `f`
    /// unchecked and nothing is sent to the transport.
    pub fn custom<F>(op: ControlOp, f: F) -> Self
    where
        F: Fn(Vec<Value>) -> BoxFuture<'static, Result<Value, RpcError>> + Send + Sync + 'static,
    {
        Self {
            op,
            route: Route::Custom(Arc::new(f)),
        }
    }

    pub fn op(&self) -> ControlOp {
        self.op
    }

    /// Issue the request immediately; the returned future yields `result`
    /// or the transport/node error exactly as reported.
    pub fn call(&self, params: Vec<Value>) -> BoxFuture<'static, Result<Value, RpcError>> {
        let transport = match &self.route {
            Route::Node(t) => t,
            Route::Custom(f) => return f(params),
        };
        match build_request(self.op, params) {
            Ok(request) => settle(dispatch(transport.as_ref(), request)).boxed(),
            Err(e) => future::ready(Err(e)).boxed(),
        }
    }
}

#[derive(Clone)]
pub struct NormalizedOp {
    op: ControlOp,
    route: Route<NormalizedFn>,
}

impl NormalizedOp {
    /// A member backed by `f` instead of the node.
    pub fn custom<F>(op: ControlOp, f: F) -> Self
    where
        F: Fn(Vec<Value>, ResultCallback) + Send + Sync + 'static,
    {
        Self {
            op,
            route: Route::Custom(Arc::new(f)),
        }
    }

    pub fn op(&self) -> ControlOp {
        self.op
    }

    /// `callback` gets either the error or the unwrapped result, never both.
    pub fn call(&self, params: Vec<Value>, callback: ResultCallback) {
        let transport = match &self.route {
            Route::Node(t) => t,
            Route::Custom(f) => return f(params, callback),
        };
        match build_request(self.op, params) {
            Ok(request) => transport.send(
                request,
                Box::new(move |reply| callback(reply.and_then(into_result))),
            ),
            Err(e) => callback(Err(e)),
        }
    }
}

#[derive(Clone)]
pub struct PassthroughOp {
    op: ControlOp,
    route: Route<PassthroughFn>,
}

impl PassthroughOp {
    /// A member backed by `f` instead of the node.
    pub fn custom<F>(op: ControlOp, f: F) -> Self
    where
        F: Fn(Vec<Value>, ReplyCallback) + Send + Sync + 'static,
    {
        Self {
            op,
            route: Route::Custom(Arc::new(f)),
        }
    }

    pub fn op(&self) -> ControlOp {
        self.op
    }

    /// Hand `callback` to the transport as-is.
    pub fn call(&self, params: Vec<Value>, callback: ReplyCallback) {
        let transport = match &self.route {
            Route::Node(t) => t,
            Route::Custom(f) => return f(params, callback),
        };
        match build_request(self.op, params) {
            Ok(request) => transport.send(request, callback),
            Err(e) => callback(Err(e)),
        }
    }
}

macro_rules! debug_handler {
    ($($ty:ident),*) => {$(
        impl fmt::Debug for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_struct(stringify!($ty))
                    .field("op", &self.op)
                    .field("route", &self.route.kind())
                    .finish()
            }
        }
    )*};
}

debug_handler!(DeferredOp, NormalizedOp, PassthroughOp);
