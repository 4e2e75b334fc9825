//! Core infrastructure: settings, process execution and name resolution.

mod config;
mod executor;
mod resolver;

pub use config::{ExecutorSettings, LoggingSettings, Settings, LOCAL_SETTINGS_FILE};
pub use executor::{CommandExecutor, CommandOutput, ProcessExecutor};
pub use resolver::{HostResolver, StaticResolver, SystemResolver};
