//! Crates Publisher - publish Rust crates from a release workflow.
//!
//! Drives the crates plugin from the command line or serves it over stdio
//! JSON-RPC for a release host.

use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crates_publisher::plugin::{ConfigMap, ExecuteRequest, Hook, ReleaseContext};
use crates_publisher::{CallContext, CratesPlugin, RpcServer, Settings};

/// Publish Rust crates to crates.io or a private registry
#[derive(Parser)]
#[command(name = "crates-publisher")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Settings file (defaults to .crates-publisher.toml, then the user config dir)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Program to run instead of `cargo`
    #[arg(long, global = true, env = "CRATES_PUBLISHER_CARGO")]
    cargo: Option<String>,

    /// Abort the publish after this many seconds (0 disables)
    #[arg(long, global = true, env = "CRATES_PUBLISHER_TIMEOUT")]
    timeout: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print plugin metadata and configuration schema
    Info,

    /// Validate a plugin configuration file
    Validate {
        /// Configuration file (JSON, or TOML by extension)
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Execute a JSON request read from a file or stdin
    Execute {
        /// Request file (reads stdin when omitted)
        #[arg(short, long)]
        request: Option<PathBuf>,
    },

    /// Publish a release version
    Publish {
        /// Version being released
        #[arg(long)]
        release_version: String,

        /// Configuration file (JSON, or TOML by extension)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Lifecycle hook to run
        #[arg(long, default_value = "post-publish")]
        hook: Hook,

        /// Dry run - show the command without running it
        #[arg(long)]
        dry_run: bool,
    },

    /// Serve JSON-RPC requests on stdin/stdout
    Serve,

    /// Show settings
    Config {
        /// Show settings file path
        #[arg(long)]
        path: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let settings = match &cli.settings {
        Some(path) => Settings::load_from_file(path)?,
        None => Settings::load()?,
    };

    // Setup logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.logging.level))
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr).with_target(false))
        .with(filter)
        .init();

    let program = cli.cargo.clone().unwrap_or_else(|| settings.executor.program.clone());
    let timeout = match cli.timeout {
        Some(0) => None,
        Some(secs) => Some(Duration::from_secs(secs)),
        None => settings.executor.timeout(),
    };
    let plugin = CratesPlugin::new().with_program(program);

    let ok = match cli.command {
        Commands::Info => cmd_info(&plugin)?,
        Commands::Validate { config } => cmd_validate(&plugin, &config)?,
        Commands::Execute { request } => cmd_execute(&plugin, timeout, request.as_deref())?,
        Commands::Publish { release_version, config, hook, dry_run } => {
            let config = match config {
                Some(path) => load_config_map(&path)?,
                None => ConfigMap::new(),
            };
            let request = ExecuteRequest::new(hook, ReleaseContext::new(release_version))
                .with_config(config)
                .dry_run(dry_run);
            run_request(&plugin, timeout, &request)?
        }
        Commands::Serve => cmd_serve(plugin, timeout)?,
        Commands::Config { path } => cmd_config(&settings, cli.settings.as_deref(), path)?,
        Commands::Completions { shell } => {
            cmd_completions(shell);
            true
        }
    };

    if !ok {
        std::process::exit(1);
    }
    Ok(())
}

/// Print plugin metadata.
fn cmd_info(plugin: &CratesPlugin) -> Result<bool> {
    print_json(&plugin.info())?;
    Ok(true)
}

/// Validate a configuration file.
fn cmd_validate(plugin: &CratesPlugin, path: &Path) -> Result<bool> {
    let config = load_config_map(path)?;
    let rt = tokio::runtime::Runtime::new()?;
    let response = rt.block_on(plugin.validate(&config));
    print_json(&response)?;
    Ok(response.valid)
}

/// Execute a request from a file or stdin.
fn cmd_execute(plugin: &CratesPlugin, timeout: Option<Duration>, path: Option<&Path>) -> Result<bool> {
    let raw = match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf).context("Failed to read request from stdin")?;
            buf
        }
    };
    let request: ExecuteRequest = serde_json::from_str(&raw).context("Invalid execute request")?;
    run_request(plugin, timeout, &request)
}

/// Run one request with Ctrl-C cancellation.
fn run_request(plugin: &CratesPlugin, timeout: Option<Duration>, request: &ExecuteRequest) -> Result<bool> {
    let rt = tokio::runtime::Runtime::new()?;

    let response = rt.block_on(async {
        let cancel = CancellationToken::new();
        spawn_ctrl_c(cancel.clone());
        let ctx = CallContext::new().with_cancel(cancel).with_timeout(timeout);
        plugin.execute(&ctx, request).await
    });

    print_json(&response)?;
    Ok(response.success)
}

/// Serve JSON-RPC on stdio until EOF or Ctrl-C.
fn cmd_serve(plugin: CratesPlugin, timeout: Option<Duration>) -> Result<bool> {
    let rt = tokio::runtime::Runtime::new()?;
    let server = RpcServer::new(plugin).with_timeout(timeout);

    rt.block_on(async {
        let cancel = CancellationToken::new();
        spawn_ctrl_c(cancel.clone());
        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        server.serve(stdin, tokio::io::stdout(), &cancel).await
    })?;

    Ok(true)
}

/// Show settings.
fn cmd_config(settings: &Settings, explicit: Option<&Path>, show_path: bool) -> Result<bool> {
    if show_path {
        let path = explicit.map(Path::to_path_buf).or_else(Settings::resolved_path);
        match path {
            Some(path) => println!("{}", path.display()),
            None => println!("(defaults)"),
        }
        return Ok(true);
    }

    println!("{}", settings.to_toml()?);
    Ok(true)
}

/// Generate shell completions.
fn cmd_completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "crates-publisher", &mut io::stdout());
}

fn spawn_ctrl_c(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling");
            cancel.cancel();
        }
    });
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Read a plugin configuration map from JSON, or TOML when the extension says so.
fn load_config_map(path: &Path) -> Result<ConfigMap> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let is_toml = path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
    let value: serde_json::Value = if is_toml {
        let table: toml::Table =
            toml::from_str(&content).with_context(|| format!("Invalid TOML in {}", path.display()))?;
        serde_json::to_value(table)?
    } else {
        serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {}", path.display()))?
    };

    match value {
        serde_json::Value::Object(map) => Ok(map),
        _ => anyhow::bail!("{} must contain an object", path.display()),
    }
}
