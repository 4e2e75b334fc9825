//! The crates publishing plugin.
//!
//! Acts on the `post-publish` hook: validates the configuration, then either
//! previews the `cargo publish` invocation (dry run) or runs it.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Map, Value};
use tokio_util::sync::CancellationToken;

use super::args::{build_publish_args, display_command, registry_name, working_dir};
use super::config::{ConfigParser, PublishConfig};
use super::error::{PublishError, PublishResult};
use super::types::{
    config_schema, ConfigMap, ExecuteRequest, ExecuteResponse, Hook, PluginInfo, ReleaseContext,
    DEFAULT_MANIFEST_PATH, PLUGIN_AUTHOR, PLUGIN_DESCRIPTION, PLUGIN_NAME,
};
use crate::core::{CommandExecutor, HostResolver, ProcessExecutor, SystemResolver};
use crate::security::{
    validate_path, validate_registry, ValidateResponse, ValidationBuilder,
};

/// Per-call controls supplied by the caller.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    /// Cancelling this token aborts an in-flight publish
    pub cancel: CancellationToken,

    /// Abort the publish after this long
    pub timeout: Option<Duration>,
}

impl CallContext {
    /// A context that is never cancelled and has no timeout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use the given cancellation token.
    #[must_use]
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Set a timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Publishes crates with `cargo publish`.
#[derive(Clone)]
pub struct CratesPlugin {
    executor: Arc<dyn CommandExecutor>,
    resolver: Arc<dyn HostResolver>,
    program: String,
}

impl std::fmt::Debug for CratesPlugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CratesPlugin").field("program", &self.program).finish_non_exhaustive()
    }
}

impl Default for CratesPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl CratesPlugin {
    /// Create a plugin that runs the real `cargo` and resolves hosts via DNS.
    pub fn new() -> Self {
        Self {
            executor: Arc::new(ProcessExecutor::new()),
            resolver: Arc::new(SystemResolver::new()),
            program: "cargo".to_string(),
        }
    }

    /// Use a different command executor.
    #[must_use]
    pub fn with_executor(mut self, executor: Arc<dyn CommandExecutor>) -> Self {
        self.executor = executor;
        self
    }

    /// Use a different hostname resolver.
    #[must_use]
    pub fn with_resolver(mut self, resolver: Arc<dyn HostResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Run a different program in place of `cargo`.
    #[must_use]
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Program that will be invoked.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Plugin metadata.
    pub fn info(&self) -> PluginInfo {
        PluginInfo {
            name: PLUGIN_NAME.to_string(),
            version: crate::VERSION.to_string(),
            description: PLUGIN_DESCRIPTION.to_string(),
            author: PLUGIN_AUTHOR.to_string(),
            hooks: vec![Hook::PostPublish],
            config_schema: config_schema(),
        }
    }

    /// Run the plugin for a hook.
    ///
    /// Always returns a response; failures are reported through
    /// [`ExecuteResponse::failure`].
    pub async fn execute(&self, ctx: &CallContext, request: &ExecuteRequest) -> ExecuteResponse {
        match request.hook {
            Hook::PostPublish => {
                let config = PublishConfig::from_map(&request.config);
                match self.publish(ctx, &config, &request.context, request.dry_run).await {
                    Ok(response) => response,
                    Err(e) => {
                        tracing::warn!(error = %config.token.redact(&e.to_string()), "Publish failed");
                        ExecuteResponse::failure(config.token.redact(&e.to_string()))
                    }
                }
            }
            ref other => {
                tracing::debug!(hook = %other, "Hook not handled");
                ExecuteResponse::success(format!("Hook {} not handled", other))
            }
        }
    }

    /// Validate a configuration map, reporting every failing field.
    pub async fn validate(&self, config: &ConfigMap) -> ValidateResponse {
        let parser = ConfigParser::new(config);
        let mut builder = ValidationBuilder::new();

        let manifest_path = parser.get_string("manifest_path", None, DEFAULT_MANIFEST_PATH);
        builder.check("manifest_path", validate_path(&manifest_path));

        let registry = parser.get_string("registry", None, "");
        if !registry.is_empty() {
            builder.check("registry", validate_registry(&registry, self.resolver.as_ref()).await);
        }

        if let Some(jobs) = parser.get("jobs").filter(|jobs| !jobs.is_null()) {
            match jobs.as_f64() {
                Some(n) if n < 0.0 => builder.add_error("jobs", "jobs must be a positive integer"),
                Some(n) if n.fract() != 0.0 => {
                    builder.add_error("jobs", "jobs must be a positive integer");
                }
                Some(_) => {}
                None => builder.add_error("jobs", "jobs must be an integer"),
            }
        }

        builder.build()
    }

    /// Validate a typed configuration, stopping at the first failure.
    pub async fn validate_config(&self, config: &PublishConfig) -> PublishResult<()> {
        validate_path(&config.manifest_path).map_err(PublishError::InvalidManifestPath)?;

        if !config.registry.is_empty() {
            validate_registry(&config.registry, self.resolver.as_ref())
                .await
                .map_err(PublishError::InvalidRegistry)?;
        }

        Ok(())
    }

    async fn publish(
        &self,
        ctx: &CallContext,
        config: &PublishConfig,
        release: &ReleaseContext,
        dry_run: bool,
    ) -> PublishResult<ExecuteResponse> {
        self.validate_config(config).await?;

        let args = build_publish_args(config);
        let version = release.normalized_version();
        let registry = registry_name(config);

        if dry_run {
            let command = display_command(&self.program, &args);
            tracing::info!(%version, %registry, %command, "Dry run: skipping cargo publish");

            let outputs = object(json!({
                "version": version,
                "registry": config.registry,
                "manifest_path": config.manifest_path,
                "allow_dirty": config.allow_dirty,
                "no_verify": config.no_verify,
                "features": config.features,
                "all_features": config.all_features,
                "no_default_features": config.no_default_features,
                "jobs": config.jobs,
                "command": command,
            }));

            return Ok(ExecuteResponse::success(format!(
                "Would publish crate version {} to {}",
                version, registry
            ))
            .with_outputs(outputs));
        }

        if config.token.is_empty() {
            return Err(PublishError::MissingToken);
        }

        let dir = working_dir(config);
        tracing::info!(
            %version,
            %registry,
            dir = ?dir,
            command = %display_command(&self.program, &args),
            "Running cargo publish"
        );

        let output = self.run(ctx, &args, dir).await?;
        if !output.success {
            return Err(PublishError::CommandFailed {
                status: output.status_text(),
                output: output.output,
            });
        }

        tracing::info!(%version, %registry, "Crate published");

        let outputs = object(json!({
            "version": version,
            "registry": config.registry,
            "output": config.token.redact(&output.output),
        }));

        Ok(ExecuteResponse::success(format!("Published crate version {} to {}", version, registry))
            .with_outputs(outputs))
    }

    /// Invoke the executor, honouring cancellation and the timeout.
    async fn run(
        &self,
        ctx: &CallContext,
        args: &[String],
        dir: Option<PathBuf>,
    ) -> PublishResult<crate::core::CommandOutput> {
        let invocation = async {
            let call = self.executor.run(&self.program, args, dir.as_deref());
            let result = match ctx.timeout {
                Some(limit) => match tokio::time::timeout(limit, call).await {
                    Ok(result) => result,
                    Err(_) => return Err(PublishError::TimedOut(limit)),
                },
                None => call.await,
            };
            result.map_err(|source| PublishError::Spawn { source })
        };

        tokio::select! {
            biased;
            () = ctx.cancel.cancelled() => Err(PublishError::Cancelled),
            result = invocation => result,
        }
    }
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}
