//! # Crates Publisher
//!
//! Release-workflow plugin that publishes Rust crates with `cargo publish`.
//!
//! The plugin acts on the `post-publish` hook. It turns an untyped
//! configuration map into `cargo publish` arguments, validates the manifest
//! path and registry before anything runs, and either previews the command
//! (dry run) or executes it.
//!
//! ## Features
//!
//! - **Argument building**: Deterministic, order-stable `cargo publish` flags
//! - **Path safety**: Rejects absolute manifest paths and `..` escapes
//! - **SSRF protection**: Registry URLs must be HTTPS and must not resolve to
//!   private, loopback or link-local addresses (local development hosts aside)
//! - **Token hygiene**: The API token is zeroed on drop and redacted in output
//! - **Host adapter**: A stdio JSON-RPC server for release tooling
//!
//! ## Quick Start
//!
//! ```bash
//! # Preview a publish
//! crates-publisher publish --release-version v1.2.3 --dry-run
//!
//! # Serve requests from a release host
//! crates-publisher serve
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
// Allow common patterns that are intentional in this codebase
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::significant_drop_tightening)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]

pub mod core;
pub mod plugin;
pub mod rpc;
pub mod security;

// Re-export commonly used types
pub use core::{CommandExecutor, CommandOutput, HostResolver, ProcessExecutor, Settings};
pub use plugin::{
    CallContext, CratesPlugin, ExecuteRequest, ExecuteResponse, Hook, PluginInfo, PublishConfig,
    PublishError, ReleaseContext,
};
pub use rpc::RpcServer;
pub use security::{RegistryToken, ValidateResponse};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "crates-publisher";
