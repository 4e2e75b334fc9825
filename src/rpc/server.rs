//! Line-delimited JSON-RPC server.

use std::time::Duration;

use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;

use super::protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, RequestId};
use crate::plugin::{CallContext, ConfigMap, CratesPlugin, ExecuteRequest};

/// Serves plugin calls over a line-delimited JSON-RPC stream.
#[derive(Debug, Clone)]
pub struct RpcServer {
    plugin: CratesPlugin,
    timeout: Option<Duration>,
}

impl RpcServer {
    /// Create a server for a plugin.
    pub fn new(plugin: CratesPlugin) -> Self {
        Self { plugin, timeout: None }
    }

    /// Apply a timeout to every `execute` call.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Read requests until EOF or cancellation, writing one response line per
    /// request that carries an `id`.
    pub async fn serve<R, W>(
        &self,
        reader: R,
        mut writer: W,
        cancel: &CancellationToken,
    ) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();

        loop {
            let line = tokio::select! {
                () = cancel.cancelled() => break,
                line = lines.next_line() => line?,
            };

            let Some(line) = line else {
                break;
            };
            if line.trim().is_empty() {
                continue;
            }

            let Some(response) = self.handle_line(&line, cancel).await else {
                continue;
            };
            let mut payload = serde_json::to_vec(&response)?;
            payload.push(b'\n');
            writer.write_all(&payload).await?;
            writer.flush().await?;
        }

        tracing::debug!("RPC server stopped");
        Ok(())
    }

    /// Handle one raw request line.
    ///
    /// Returns `None` for notifications (requests without an `id`), which are
    /// processed but never answered. Parse errors and malformed requests are
    /// always answered.
    pub async fn handle_line(
        &self,
        line: &str,
        cancel: &CancellationToken,
    ) -> Option<JsonRpcResponse> {
        let value: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => {
                return Some(JsonRpcResponse::error(RequestId::Null, JsonRpcError::parse_error(e)));
            }
        };

        let is_notification = value.get("id").is_none();
        let id = value
            .get("id")
            .cloned()
            .and_then(|id| serde_json::from_value(id).ok())
            .unwrap_or_default();

        match serde_json::from_value::<JsonRpcRequest>(value) {
            Ok(request) => {
                let response = self.handle_request(request, cancel).await;
                if is_notification {
                    tracing::debug!("Notification handled; no response sent");
                    None
                } else {
                    Some(response)
                }
            }
            Err(e) => Some(JsonRpcResponse::error(id, JsonRpcError::invalid_request(e))),
        }
    }

    /// Dispatch a parsed request.
    pub async fn handle_request(
        &self,
        request: JsonRpcRequest,
        cancel: &CancellationToken,
    ) -> JsonRpcResponse {
        tracing::debug!(method = %request.method, "RPC request");
        let id = request.id;

        let result = match request.method.as_str() {
            "info" => serde_json::to_value(self.plugin.info()),
            "validate" => {
                let config = match config_params(request.params) {
                    Ok(config) => config,
                    Err(e) => return JsonRpcResponse::error(id, e),
                };
                serde_json::to_value(self.plugin.validate(&config).await)
            }
            "execute" => {
                let Some(params) = request.params else {
                    return JsonRpcResponse::error(
                        id,
                        JsonRpcError::invalid_params("missing execute request"),
                    );
                };
                let execute: ExecuteRequest = match serde_json::from_value(params) {
                    Ok(execute) => execute,
                    Err(e) => return JsonRpcResponse::error(id, JsonRpcError::invalid_params(e)),
                };
                let ctx = CallContext::new().with_cancel(cancel.clone()).with_timeout(self.timeout);
                serde_json::to_value(self.plugin.execute(&ctx, &execute).await)
            }
            other => return JsonRpcResponse::error(id, JsonRpcError::method_not_found(other)),
        };

        match result {
            Ok(value) => JsonRpcResponse::result(id, value),
            Err(e) => JsonRpcResponse::error(id, JsonRpcError::internal(e)),
        }
    }
}

/// `validate` takes the configuration object itself; null or absent means empty.
fn config_params(params: Option<Value>) -> Result<ConfigMap, JsonRpcError> {
    match params {
        None | Some(Value::Null) => Ok(ConfigMap::new()),
        Some(Value::Object(map)) => Ok(map),
        Some(_) => Err(JsonRpcError::invalid_params("config must be an object")),
    }
}
