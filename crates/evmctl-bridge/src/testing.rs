//! Scriptable transport used by the unit tests.

use std::sync::Mutex;

use evmctl_core::JsonRpcRequest;

use crate::transport::{Reply, ReplyCallback, Transport};

/// Records every request. With a scripted reply it answers synchronously
/// (like a stubbed `send` that yields); without one it parks the callback.
#[derive(Default)]
pub(crate) struct StubTransport {
    reply: Mutex<Option<Reply>>,
    requests: Mutex<Vec<JsonRpcRequest>>,
    parked: Mutex<Vec<ReplyCallback>>,
    callback_addrs: Mutex<Vec<usize>>,
}

impl StubTransport {
    pub(crate) fn replying(reply: Reply) -> Self {
        Self {
            reply: Mutex::new(Some(reply)),
            ..Self::default()
        }
    }

    pub(crate) fn silent() -> Self {
        Self::default()
    }

    pub(crate) fn requests(&self) -> Vec<JsonRpcRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Heap addresses of the callbacks the transport was handed.
    pub(crate) fn callback_addrs(&self) -> Vec<usize> {
        self.callback_addrs.lock().unwrap().clone()
    }

    /// Drop every parked callback without invoking it.
    pub(crate) fn drop_parked(&self) {
        self.parked.lock().unwrap().clear();
    }
}

pub(crate) fn callback_addr(cb: &ReplyCallback) -> usize {
    &**cb as *const (dyn FnOnce(Reply) + Send) as *const () as usize
}

impl Transport for StubTransport {
    fn send(&self, request: JsonRpcRequest, callback: ReplyCallback) {
        self.requests.lock().unwrap().push(request);
        self.callback_addrs.lock().unwrap().push(callback_addr(&callback));
        let reply = self.reply.lock().unwrap().clone();
        match reply {
            Some(reply) => callback(reply),
            None => self.parked.lock().unwrap().push(callback),
        }
    }
}
