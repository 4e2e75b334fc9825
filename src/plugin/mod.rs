//! The crates publishing plugin.
//!
//! # Flow
//!
//! 1. The host sends an [`ExecuteRequest`] for a lifecycle [`Hook`]
//! 2. The untyped configuration becomes a [`PublishConfig`]
//! 3. Manifest path and registry are validated
//! 4. `cargo publish` arguments are built and either previewed (dry run) or run
//!
//! Only `post-publish` does anything; other hooks succeed as no-ops.
//!
//! # Example Configuration
//!
//! ```json
//! {
//!   "registry": "my-registry",
//!   "manifest_path": "crates/lib/Cargo.toml",
//!   "features": ["serde"],
//!   "jobs": 4
//! }
//! ```

mod args;
mod config;
mod crates;
mod error;
mod types;

pub use args::{build_publish_args, display_command, registry_name, working_dir};
pub use config::{ConfigParser, PublishConfig};
pub use crates::{CallContext, CratesPlugin};
pub use error::{PublishError, PublishResult};
pub use types::{
    config_schema, normalize_version, ConfigMap, ExecuteRequest, ExecuteResponse, Hook,
    PluginInfo, ReleaseContext, DEFAULT_MANIFEST_PATH, DEFAULT_REGISTRY_NAME, PLUGIN_AUTHOR,
    PLUGIN_DESCRIPTION, PLUGIN_NAME,
};
