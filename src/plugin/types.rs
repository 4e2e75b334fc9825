//! Plugin contract types exchanged with the release host.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Plugin name reported to the host.
pub const PLUGIN_NAME: &str = "crates";

/// Plugin description reported to the host.
pub const PLUGIN_DESCRIPTION: &str = "Publish crates to crates.io (Rust)";

/// Plugin author reported to the host.
pub const PLUGIN_AUTHOR: &str = "Crates Publisher Contributors";

/// Manifest path used when the configuration does not name one.
pub const DEFAULT_MANIFEST_PATH: &str = "Cargo.toml";

/// Registry shown when publishing to the default registry.
pub const DEFAULT_REGISTRY_NAME: &str = "crates.io";

/// Untyped configuration map as sent by the host.
pub type ConfigMap = Map<String, Value>;

/// Lifecycle point in the release workflow.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Hook {
    PreInit,
    PostInit,
    PrePlan,
    PostPlan,
    PreVersion,
    PostVersion,
    PreNotes,
    PostNotes,
    PreApprove,
    PostApprove,
    PrePublish,
    PostPublish,
    OnSuccess,
    OnError,
    /// Any hook this plugin does not know about
    Other(String),
}

impl Hook {
    /// Wire name of the hook.
    pub fn as_str(&self) -> &str {
        match self {
            Self::PreInit => "pre-init",
            Self::PostInit => "post-init",
            Self::PrePlan => "pre-plan",
            Self::PostPlan => "post-plan",
            Self::PreVersion => "pre-version",
            Self::PostVersion => "post-version",
            Self::PreNotes => "pre-notes",
            Self::PostNotes => "post-notes",
            Self::PreApprove => "pre-approve",
            Self::PostApprove => "post-approve",
            Self::PrePublish => "pre-publish",
            Self::PostPublish => "post-publish",
            Self::OnSuccess => "on-success",
            Self::OnError => "on-error",
            Self::Other(name) => name,
        }
    }
}

impl fmt::Display for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Hook {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "pre-init" => Self::PreInit,
            "post-init" => Self::PostInit,
            "pre-plan" => Self::PrePlan,
            "post-plan" => Self::PostPlan,
            "pre-version" => Self::PreVersion,
            "post-version" => Self::PostVersion,
            "pre-notes" => Self::PreNotes,
            "post-notes" => Self::PostNotes,
            "pre-approve" => Self::PreApprove,
            "post-approve" => Self::PostApprove,
            "pre-publish" => Self::PrePublish,
            "post-publish" => Self::PostPublish,
            "on-success" => Self::OnSuccess,
            "on-error" => Self::OnError,
            other => Self::Other(other.to_string()),
        })
    }
}

impl TryFrom<String> for Hook {
    type Error = std::convert::Infallible;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Hook> for String {
    fn from(hook: Hook) -> Self {
        hook.as_str().to_string()
    }
}

/// Release metadata supplied with each request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReleaseContext {
    /// Version being released, possibly `v`-prefixed
    pub version: String,

    /// Previously released version
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_version: Option<String>,

    /// Repository URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository_url: Option<String>,
}

impl ReleaseContext {
    /// Create a context for a version.
    pub fn new(version: impl Into<String>) -> Self {
        Self { version: version.into(), ..Self::default() }
    }

    /// Version with a single leading `v` removed.
    pub fn normalized_version(&self) -> &str {
        normalize_version(&self.version)
    }
}

/// Strip a single leading `v` from a version string.
pub fn normalize_version(version: &str) -> &str {
    version.strip_prefix('v').unwrap_or(version)
}

/// A request to run the plugin at a hook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecuteRequest {
    /// Lifecycle hook being executed
    pub hook: Hook,

    /// Plugin configuration
    #[serde(default)]
    pub config: ConfigMap,

    /// Release metadata
    #[serde(default)]
    pub context: ReleaseContext,

    /// Preview without side effects
    #[serde(default)]
    pub dry_run: bool,
}

impl ExecuteRequest {
    /// Create a request with an empty configuration.
    pub fn new(hook: Hook, context: ReleaseContext) -> Self {
        Self { hook, config: ConfigMap::new(), context, dry_run: false }
    }

    /// Set the configuration map.
    #[must_use]
    pub fn with_config(mut self, config: ConfigMap) -> Self {
        self.config = config;
        self
    }

    /// Set dry-run mode.
    #[must_use]
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

/// Outcome of a plugin execution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecuteResponse {
    /// Whether the hook completed successfully
    pub success: bool,

    /// Human-readable summary
    #[serde(default)]
    pub message: String,

    /// Structured outputs
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub outputs: Map<String, Value>,

    /// Error description on failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExecuteResponse {
    /// A successful response.
    pub fn success(message: impl Into<String>) -> Self {
        Self { success: true, message: message.into(), ..Self::default() }
    }

    /// A failed response.
    pub fn failure(error: impl Into<String>) -> Self {
        Self { success: false, error: Some(error.into()), ..Self::default() }
    }

    /// Attach structured outputs.
    #[must_use]
    pub fn with_outputs(mut self, outputs: Map<String, Value>) -> Self {
        self.outputs = outputs;
        self
    }
}

/// Plugin metadata and configuration schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginInfo {
    /// Plugin name
    pub name: String,
    /// Plugin version
    pub version: String,
    /// Plugin description
    pub description: String,
    /// Plugin author
    pub author: String,
    /// Hooks the plugin acts on
    pub hooks: Vec<Hook>,
    /// JSON Schema of the configuration map
    pub config_schema: Value,
}

/// JSON Schema describing the configuration map.
pub fn config_schema() -> Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "token": {
                "type": "string",
                "description": "Crates.io API token (or use CARGO_REGISTRY_TOKEN env)"
            },
            "registry": {
                "type": "string",
                "description": "Registry to publish to (optional, for private registries)"
            },
            "allow_dirty": {
                "type": "boolean",
                "description": "Allow publishing with uncommitted changes",
                "default": false
            },
            "no_verify": {
                "type": "boolean",
                "description": "Skip crate verification",
                "default": false
            },
            "manifest_path": {
                "type": "string",
                "description": "Path to Cargo.toml",
                "default": DEFAULT_MANIFEST_PATH
            },
            "features": {
                "type": "array",
                "items": { "type": "string" },
                "description": "Features to activate"
            },
            "all_features": {
                "type": "boolean",
                "description": "Activate all available features",
                "default": false
            },
            "no_default_features": {
                "type": "boolean",
                "description": "Do not activate the default feature",
                "default": false
            },
            "jobs": {
                "type": "integer",
                "minimum": 0,
                "description": "Number of parallel jobs"
            }
        }
    })
}
