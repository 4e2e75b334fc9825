//! Publish configuration extraction.
//!
//! The host hands over an untyped JSON object. [`ConfigParser`] reads typed
//! values out of it with defaults and optional environment fallbacks, and
//! [`PublishConfig::from_map`] assembles the typed record.

use serde_json::Value;

use super::types::{ConfigMap, DEFAULT_MANIFEST_PATH};
use crate::security::{RegistryToken, TOKEN_ENV_VAR};

/// Typed reader over an untyped configuration map.
#[derive(Debug, Clone, Copy)]
pub struct ConfigParser<'a> {
    raw: &'a ConfigMap,
}

impl<'a> ConfigParser<'a> {
    /// Wrap a configuration map.
    pub fn new(raw: &'a ConfigMap) -> Self {
        Self { raw }
    }

    /// Raw value for a key.
    pub fn get(&self, key: &str) -> Option<&'a Value> {
        self.raw.get(key)
    }

    /// Read a string.
    ///
    /// A non-empty string value wins, then the environment variable `env_var`
    /// (when given and non-empty), then `default`.
    pub fn get_string(&self, key: &str, env_var: Option<&str>, default: &str) -> String {
        if let Some(value) = self.get(key).and_then(Value::as_str) {
            if !value.is_empty() {
                return value.to_string();
            }
        }

        if let Some(var) = env_var {
            if let Ok(value) = std::env::var(var) {
                if !value.is_empty() {
                    return value;
                }
            }
        }

        default.to_string()
    }

    /// Read a boolean. `"true"` and `"false"` strings are accepted.
    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.get(key) {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => true,
                "false" => false,
                _ => default,
            },
            _ => default,
        }
    }

    /// Read an integer. Floats without a fractional part are accepted.
    pub fn get_int(&self, key: &str, default: i64) -> i64 {
        match self.get(key) {
            Some(Value::Number(n)) => n.as_i64().or_else(|| whole_float(n.as_f64()?)).unwrap_or(default),
            _ => default,
        }
    }

    /// Read a list of strings.
    ///
    /// Accepts a JSON array (non-string items are skipped) or a single
    /// comma-separated string. Empty entries are dropped.
    pub fn get_string_slice(&self, key: &str) -> Vec<String> {
        match self.get(key) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            Some(Value::String(s)) => s
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        }
    }
}

fn whole_float(f: f64) -> Option<i64> {
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

/// Typed publish configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishConfig {
    /// Registry API token
    pub token: RegistryToken,

    /// Registry name or index URL; empty means crates.io
    pub registry: String,

    /// Pass `--allow-dirty`
    pub allow_dirty: bool,

    /// Pass `--no-verify`
    pub no_verify: bool,

    /// Manifest path relative to the working directory
    pub manifest_path: String,

    /// Features to activate
    pub features: Vec<String>,

    /// Pass `--all-features`
    pub all_features: bool,

    /// Pass `--no-default-features`
    pub no_default_features: bool,

    /// Parallel jobs; zero leaves it to cargo
    pub jobs: u32,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            token: RegistryToken::default(),
            registry: String::new(),
            allow_dirty: false,
            no_verify: false,
            manifest_path: DEFAULT_MANIFEST_PATH.to_string(),
            features: Vec::new(),
            all_features: false,
            no_default_features: false,
            jobs: 0,
        }
    }
}

impl PublishConfig {
    /// Build the configuration from an untyped map.
    ///
    /// The token comes from `token`, then `CARGO_REGISTRY_TOKEN`.
    pub fn from_map(raw: &ConfigMap) -> Self {
        let parser = ConfigParser::new(raw);

        Self {
            token: RegistryToken::new(parser.get_string("token", Some(TOKEN_ENV_VAR), "")),
            registry: parser.get_string("registry", None, ""),
            allow_dirty: parser.get_bool("allow_dirty", false),
            no_verify: parser.get_bool("no_verify", false),
            manifest_path: parser.get_string("manifest_path", None, DEFAULT_MANIFEST_PATH),
            features: parser.get_string_slice("features"),
            all_features: parser.get_bool("all_features", false),
            no_default_features: parser.get_bool("no_default_features", false),
            jobs: u32::try_from(parser.get_int("jobs", 0)).unwrap_or(0),
        }
    }

    /// Whether the manifest path differs from the default.
    pub fn has_custom_manifest(&self) -> bool {
        !self.manifest_path.is_empty() && self.manifest_path != DEFAULT_MANIFEST_PATH
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use serial_test::serial;

    fn map(value: Value) -> ConfigMap {
        value.as_object().cloned().unwrap()
    }

    /// Run `f` with `CARGO_REGISTRY_TOKEN` set to `value` (or unset).
    fn with_token_env<T>(value: Option<&str>, f: impl FnOnce() -> T) -> T {
        let original = std::env::var(TOKEN_ENV_VAR).ok();
        match value {
            Some(v) => std::env::set_var(TOKEN_ENV_VAR, v),
            None => std::env::remove_var(TOKEN_ENV_VAR),
        }

        let result = f();

        match original {
            Some(v) => std::env::set_var(TOKEN_ENV_VAR, v),
            None => std::env::remove_var(TOKEN_ENV_VAR),
        }
        result
    }

    #[test]
    #[serial(token_env)]
    fn test_defaults_with_empty_config() {
        let config = with_token_env(None, || PublishConfig::from_map(&ConfigMap::new()));
        assert_eq!(config, PublishConfig::default());
        assert_eq!(config.manifest_path, "Cargo.toml");
        assert!(config.token.is_empty());
        assert!(!config.has_custom_manifest());
    }

    #[test]
    #[serial(token_env)]
    fn test_token_from_config() {
        let config = with_token_env(None, || {
            PublishConfig::from_map(&map(json!({ "token": "direct-token" })))
        });
        assert_eq!(config.token.expose(), "direct-token");
    }

    #[test]
    #[serial(token_env)]
    fn test_token_from_env() {
        let config =
            with_token_env(Some("env-token-12345"), || PublishConfig::from_map(&ConfigMap::new()));
        assert_eq!(config.token.expose(), "env-token-12345");
    }

    #[test]
    #[serial(token_env)]
    fn test_config_token_overrides_env() {
        let config = with_token_env(Some("env-token"), || {
            PublishConfig::from_map(&map(json!({ "token": "config-token" })))
        });
        assert_eq!(config.token.expose(), "config-token");
    }

    #[test]
    #[serial(token_env)]
    fn test_empty_config_token_falls_back_to_env() {
        let config = with_token_env(Some("env-token"), || {
            PublishConfig::from_map(&map(json!({ "token": "" })))
        });
        assert_eq!(config.token.expose(), "env-token");
    }

    #[test]
    #[serial(token_env)]
    fn test_full_config() {
        let config = with_token_env(None, || {
            PublishConfig::from_map(&map(json!({
                "token": "my-token",
                "registry": "my-registry",
                "allow_dirty": true,
                "no_verify": true,
                "manifest_path": "./my-crate/Cargo.toml",
                "features": ["feature1", "feature2"],
                "all_features": true,
                "no_default_features": true,
                "jobs": 8
            })))
        });

        assert_eq!(config.token.expose(), "my-token");
        assert_eq!(config.registry, "my-registry");
        assert!(config.allow_dirty);
        assert!(config.no_verify);
        assert_eq!(config.manifest_path, "./my-crate/Cargo.toml");
        assert_eq!(config.features, vec!["feature1", "feature2"]);
        assert!(config.all_features);
        assert!(config.no_default_features);
        assert_eq!(config.jobs, 8);
        assert!(config.has_custom_manifest());
    }

    #[test]
    fn test_parser_lenient_values() {
        let raw = map(json!({
            "flag": "true",
            "bad_flag": "maybe",
            "float_jobs": 4.0,
            "fractional": 2.5,
            "csv": "a, b,,c",
            "mixed": ["x", 1, "y"],
            "number_string": 3
        }));
        let parser = ConfigParser::new(&raw);

        assert!(parser.get_bool("flag", false));
        assert!(parser.get_bool("bad_flag", true));
        assert_eq!(parser.get_int("float_jobs", 0), 4);
        assert_eq!(parser.get_int("fractional", 7), 7);
        assert_eq!(parser.get_string_slice("csv"), vec!["a", "b", "c"]);
        assert_eq!(parser.get_string_slice("mixed"), vec!["x", "y"]);
        assert_eq!(parser.get_string("number_string", None, "dflt"), "dflt");
        assert!(parser.get_string_slice("missing").is_empty());
    }

    #[test]
    #[serial(token_env)]
    fn test_negative_jobs_treated_as_unset() {
        let config = with_token_env(None, || PublishConfig::from_map(&map(json!({ "jobs": -1 }))));
        assert_eq!(config.jobs, 0);
    }
}
