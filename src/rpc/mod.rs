//! Stdio JSON-RPC adapter.
//!
//! Lets a release host drive the plugin as a child process: one JSON-RPC 2.0
//! request per line on stdin, one response per line on stdout. Notifications
//! (no `id`) are handled without a reply.
//!
//! Methods:
//! - `info`: plugin metadata
//! - `validate`: params are the configuration object
//! - `execute`: params are an `ExecuteRequest`

mod protocol;
mod server;

pub use protocol::{
    JsonRpcError, JsonRpcRequest, JsonRpcResponse, RequestId, INTERNAL_ERROR, INVALID_PARAMS,
    INVALID_REQUEST, METHOD_NOT_FOUND, PARSE_ERROR,
};
pub use server::RpcServer;
