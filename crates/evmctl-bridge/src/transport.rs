use std::sync::Arc;

use tracing::{debug, trace};

use evmctl_core::{JsonRpcRequest, JsonRpcResponse, RpcError};

/// What a transport hands back for one request.
pub type Reply = Result<JsonRpcResponse, RpcError>;

/// Node-style completion callback: invoked at most once.
pub type ReplyCallback = Box<dyn FnOnce(Reply) + Send + 'static>;

/// A channel that can carry one JSON-RPC request to a node and report back.
pub trait Transport: Send + Sync + 'static {
    fn send(&self, request: JsonRpcRequest, callback: ReplyCallback);
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send(&self, request: JsonRpcRequest, callback: ReplyCallback) {
        (**self).send(request, callback)
    }
}

/// JSON-RPC over HTTP POST.
///
/// Requests run on the ambient tokio runtime; `send` returns immediately.
pub struct HttpTransport {
    url: String,
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

async fn post(client: &reqwest::Client, url: &str, request: &JsonRpcRequest) -> Reply {
    let resp = client
        .post(url)
        .json(request)
        .send()
        .await
        .map_err(|e| RpcError::Transport(format!("connecting to node at {url}: {e}")))?;

    resp.json::<JsonRpcResponse>()
        .await
        .map_err(|e| RpcError::Transport(format!("parsing RPC response: {e}")))
}

impl Transport for HttpTransport {
    fn send(&self, request: JsonRpcRequest, callback: ReplyCallback) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            callback(Err(RpcError::Transport(
                "no tokio runtime available to drive the request".into(),
            )));
            return;
        };

        debug!(url = %self.url, method = %request.method, id = request.id, "POST");
        let client = self.client.clone();
        let url = self.url.clone();
        runtime.spawn(async move {
            let reply = post(&client, &url, &request).await;
            trace!(id = request.id, ok = reply.is_ok(), "reply received");
            callback(reply);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn no_runtime_reports_through_callback() {
        let transport = HttpTransport::new("http://127.0.0.1:1");
        let (tx, rx) = mpsc::channel();
        transport.send(
            JsonRpcRequest::new("evm_mine", vec![]),
            Box::new(move |reply| tx.send(reply).unwrap()),
        );
        let reply = rx.recv().unwrap();
        assert!(matches!(reply, Err(RpcError::Transport(_))));
    }

    #[tokio::test]
    async fn unreachable_node_is_transport_error() {
        // Port 1 on loopback is never listening in CI.
        let transport = HttpTransport::new("http://127.0.0.1:1");
        let (tx, rx) = tokio::sync::oneshot::channel();
        transport.send(
            JsonRpcRequest::new("evm_snapshot", vec![]),
            Box::new(move |reply| {
                let _ = tx.send(reply);
            }),
        );
        match rx.await.unwrap() {
            Err(RpcError::Transport(msg)) => assert!(msg.contains("127.0.0.1:1")),
            other => panic!("expected transport error, got {other:?}"),
        }
    }
}
