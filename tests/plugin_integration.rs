//! Plugin integration tests.
//!
//! Drives `CratesPlugin` through its public API with an injected executor.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use serial_test::serial;

use crates_publisher::core::StaticResolver;
use crates_publisher::plugin::ConfigMap;
use crates_publisher::{
    CallContext, CommandExecutor, CommandOutput, CratesPlugin, ExecuteRequest, Hook,
    ReleaseContext,
};

/// Records every invocation and replies with a fixed output.
struct RecordingExecutor {
    calls: Mutex<Vec<(String, Vec<String>, Option<PathBuf>)>>,
    reply: CommandOutput,
    delay: Option<Duration>,
}

impl RecordingExecutor {
    fn new(reply: CommandOutput) -> Arc<Self> {
        Arc::new(Self { calls: Mutex::new(Vec::new()), reply, delay: None })
    }

    fn slow(reply: CommandOutput, delay: Duration) -> Arc<Self> {
        Arc::new(Self { calls: Mutex::new(Vec::new()), reply, delay: Some(delay) })
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl CommandExecutor for RecordingExecutor {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        dir: Option<&Path>,
    ) -> io::Result<CommandOutput> {
        self.calls.lock().unwrap().push((
            program.to_string(),
            args.to_vec(),
            dir.map(Path::to_path_buf),
        ));
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.reply.clone())
    }
}

fn plugin(executor: Arc<RecordingExecutor>) -> CratesPlugin {
    CratesPlugin::new().with_executor(executor).with_resolver(Arc::new(StaticResolver::new()))
}

fn config(value: serde_json::Value) -> ConfigMap {
    value.as_object().cloned().unwrap()
}

fn post_publish(version: &str, value: serde_json::Value) -> ExecuteRequest {
    ExecuteRequest::new(Hook::PostPublish, ReleaseContext::new(version)).with_config(config(value))
}

// ============================================================================
// Publish Flow
// ============================================================================

#[tokio::test]
async fn test_full_configuration_reaches_executor() {
    let executor = RecordingExecutor::new(CommandOutput::success("Uploading mylib v1.4.0"));
    let plugin = plugin(executor.clone()).with_program("/usr/local/bin/cargo");

    let request = post_publish(
        "v1.4.0",
        json!({
            "token": "tok",
            "registry": "my-registry",
            "allow_dirty": true,
            "no_verify": true,
            "manifest_path": "crates/mylib/Cargo.toml",
            "features": "serde, tokio",
            "all_features": true,
            "no_default_features": true,
            "jobs": 2
        }),
    );

    let response = plugin.execute(&CallContext::new(), &request).await;
    assert!(response.success, "{:?}", response.error);
    assert_eq!(response.message, "Published crate version 1.4.0 to my-registry");

    let calls = executor.calls.lock().unwrap();
    let (program, args, dir) = &calls[0];
    assert_eq!(program, "/usr/local/bin/cargo");
    assert_eq!(
        args,
        &vec![
            "publish",
            "--token",
            "tok",
            "--registry",
            "my-registry",
            "--allow-dirty",
            "--no-verify",
            "--manifest-path",
            "crates/mylib/Cargo.toml",
            "--features",
            "serde,tokio",
            "--all-features",
            "--no-default-features",
            "--jobs",
            "2",
        ]
    );
    assert_eq!(dir.as_deref(), Some(Path::new("crates/mylib")));
}

#[tokio::test]
#[serial(token_env)]
async fn test_token_from_environment() {
    let original = std::env::var("CARGO_REGISTRY_TOKEN").ok();
    std::env::set_var("CARGO_REGISTRY_TOKEN", "from-env");

    let executor = RecordingExecutor::new(CommandOutput::success(""));
    let response = plugin(executor.clone())
        .execute(&CallContext::new(), &post_publish("1.0.0", json!({})))
        .await;

    match original {
        Some(v) => std::env::set_var("CARGO_REGISTRY_TOKEN", v),
        None => std::env::remove_var("CARGO_REGISTRY_TOKEN"),
    }

    assert!(response.success);
    let calls = executor.calls.lock().unwrap();
    assert_eq!(calls[0].1, vec!["publish", "--token", "from-env"]);
}

#[tokio::test]
#[serial(token_env)]
async fn test_missing_token_never_runs() {
    let original = std::env::var("CARGO_REGISTRY_TOKEN").ok();
    std::env::remove_var("CARGO_REGISTRY_TOKEN");

    let executor = RecordingExecutor::new(CommandOutput::success(""));
    let response = plugin(executor.clone())
        .execute(&CallContext::new(), &post_publish("1.0.0", json!({})))
        .await;

    if let Some(v) = original {
        std::env::set_var("CARGO_REGISTRY_TOKEN", v);
    }

    assert!(!response.success);
    assert!(response.error.unwrap().contains("CARGO_REGISTRY_TOKEN"));
    assert_eq!(executor.call_count(), 0);
}

#[tokio::test]
async fn test_private_registry_blocked_before_run() {
    let executor = RecordingExecutor::new(CommandOutput::success(""));
    let resolver = StaticResolver::new().with_host("registry.internal", ["10.0.0.8".parse().unwrap()]);
    let plugin = CratesPlugin::new().with_executor(executor.clone()).with_resolver(Arc::new(resolver));

    let response = plugin
        .execute(
            &CallContext::new(),
            &post_publish("1.0.0", json!({ "token": "t", "registry": "https://registry.internal/index" })),
        )
        .await;

    assert!(!response.success);
    assert!(response.error.unwrap().contains("private networks"));
    assert_eq!(executor.call_count(), 0);
}

// ============================================================================
// Dry Run
// ============================================================================

#[tokio::test]
async fn test_dry_run_outputs() {
    let executor = RecordingExecutor::new(CommandOutput::success(""));
    let request = post_publish(
        "v2.0.0",
        json!({ "token": "hidden", "features": ["a", "b"], "jobs": 3 }),
    )
    .dry_run(true);

    let response = plugin(executor.clone()).execute(&CallContext::new(), &request).await;

    assert!(response.success);
    assert_eq!(response.message, "Would publish crate version 2.0.0 to crates.io");
    assert_eq!(response.outputs["registry"], "");
    assert_eq!(response.outputs["manifest_path"], "Cargo.toml");
    assert_eq!(response.outputs["features"], json!(["a", "b"]));
    assert_eq!(response.outputs["jobs"], 3);
    assert_eq!(
        response.outputs["command"],
        "cargo publish --token *** --features a,b --jobs 3"
    );
    assert_eq!(executor.call_count(), 0);
}

// ============================================================================
// Cancellation
// ============================================================================

#[tokio::test]
async fn test_timeout_shorter_than_run() {
    let executor = RecordingExecutor::slow(CommandOutput::success(""), Duration::from_secs(30));
    let ctx = CallContext::new().with_timeout(Some(Duration::from_millis(10)));

    let response = plugin(executor.clone())
        .execute(&ctx, &post_publish("1.0.0", json!({ "token": "t" })))
        .await;

    assert!(!response.success);
    assert!(response.error.unwrap().starts_with("cargo publish timed out"));
    assert_eq!(executor.call_count(), 1);
}

#[tokio::test]
async fn test_already_cancelled() {
    let executor = RecordingExecutor::slow(CommandOutput::success(""), Duration::from_secs(30));
    let ctx = CallContext::new();
    ctx.cancel.cancel();

    let response = plugin(executor)
        .execute(&ctx, &post_publish("1.0.0", json!({ "token": "t" })))
        .await;

    assert_eq!(response.error.as_deref(), Some("publish cancelled"));
}

// ============================================================================
// Validation
// ============================================================================

#[tokio::test]
async fn test_validate_good_and_bad() {
    let plugin = plugin(RecordingExecutor::new(CommandOutput::success("")));

    let good = plugin
        .validate(&config(json!({ "manifest_path": "crates/lib/Cargo.toml", "registry": "http://localhost:8080", "jobs": 4 })))
        .await;
    assert!(good.valid);
    assert!(good.errors.is_empty());

    let bad = plugin.validate(&config(json!({ "jobs": "many" }))).await;
    assert!(!bad.valid);
    assert!(bad.has_error_for("jobs"));
}
