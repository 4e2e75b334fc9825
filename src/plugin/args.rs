//! `cargo publish` argument construction.

use std::path::{Path, PathBuf};

use super::config::PublishConfig;
use super::types::DEFAULT_REGISTRY_NAME;
use crate::security::REDACTED;

/// Build the `cargo` arguments for a publish.
///
/// Order is fixed: subcommand, token, registry, dirty, verify, manifest path,
/// features, all-features, no-default-features, jobs. A flag is present only
/// when its field differs from the default.
pub fn build_publish_args(config: &PublishConfig) -> Vec<String> {
    let mut args = vec!["publish".to_string()];

    if !config.token.is_empty() {
        args.push("--token".to_string());
        args.push(config.token.expose().to_string());
    }

    if !config.registry.is_empty() {
        args.push("--registry".to_string());
        args.push(config.registry.clone());
    }

    if config.allow_dirty {
        args.push("--allow-dirty".to_string());
    }

    if config.no_verify {
        args.push("--no-verify".to_string());
    }

    if config.has_custom_manifest() {
        args.push("--manifest-path".to_string());
        args.push(config.manifest_path.clone());
    }

    if !config.features.is_empty() {
        args.push("--features".to_string());
        args.push(config.features.join(","));
    }

    if config.all_features {
        args.push("--all-features".to_string());
    }

    if config.no_default_features {
        args.push("--no-default-features".to_string());
    }

    if config.jobs > 0 {
        args.push("--jobs".to_string());
        args.push(config.jobs.to_string());
    }

    args
}

/// Render the command for display with the token value masked.
pub fn display_command(program: &str, args: &[String]) -> String {
    let mut parts = Vec::with_capacity(args.len() + 1);
    parts.push(program.to_string());

    let mut mask_next = false;
    for arg in args {
        if mask_next {
            parts.push(REDACTED.to_string());
            mask_next = false;
            continue;
        }
        mask_next = arg == "--token";
        parts.push(arg.clone());
    }

    parts.join(" ")
}

/// Human-readable registry name.
pub fn registry_name(config: &PublishConfig) -> &str {
    if config.registry.is_empty() {
        DEFAULT_REGISTRY_NAME
    } else {
        &config.registry
    }
}

/// Working directory for the publish.
///
/// A custom manifest path runs `cargo` from the manifest's directory; the
/// default manifest runs in the current directory.
pub fn working_dir(config: &PublishConfig) -> Option<PathBuf> {
    if !config.has_custom_manifest() {
        return None;
    }

    Path::new(&config.manifest_path)
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(Path::to_path_buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::RegistryToken;

    fn config_with_token() -> PublishConfig {
        PublishConfig { token: RegistryToken::new("test-token"), ..PublishConfig::default() }
    }

    #[test]
    fn test_minimal_config() {
        let args = build_publish_args(&config_with_token());
        assert_eq!(args, vec!["publish", "--token", "test-token"]);
    }

    #[test]
    fn test_without_token() {
        assert_eq!(build_publish_args(&PublishConfig::default()), vec!["publish"]);
    }

    #[test]
    fn test_each_flag_alone() {
        let cases: Vec<(PublishConfig, Vec<&str>)> = vec![
            (
                PublishConfig { registry: "my-registry".to_string(), ..config_with_token() },
                vec!["--registry", "my-registry"],
            ),
            (PublishConfig { allow_dirty: true, ..config_with_token() }, vec!["--allow-dirty"]),
            (PublishConfig { no_verify: true, ..config_with_token() }, vec!["--no-verify"]),
            (
                PublishConfig {
                    manifest_path: "crates/mylib/Cargo.toml".to_string(),
                    ..config_with_token()
                },
                vec!["--manifest-path", "crates/mylib/Cargo.toml"],
            ),
            (
                PublishConfig {
                    features: vec!["feature1".to_string(), "feature2".to_string()],
                    ..config_with_token()
                },
                vec!["--features", "feature1,feature2"],
            ),
            (PublishConfig { all_features: true, ..config_with_token() }, vec!["--all-features"]),
            (
                PublishConfig { no_default_features: true, ..config_with_token() },
                vec!["--no-default-features"],
            ),
            (PublishConfig { jobs: 4, ..config_with_token() }, vec!["--jobs", "4"]),
        ];

        for (config, extra) in cases {
            let mut expected = vec!["publish", "--token", "test-token"];
            expected.extend(extra);
            assert_eq!(build_publish_args(&config), expected);
        }
    }

    #[test]
    fn test_full_config_order() {
        let config = PublishConfig {
            token: RegistryToken::new("test-token"),
            registry: "my-registry".to_string(),
            allow_dirty: true,
            no_verify: true,
            manifest_path: "path/to/Cargo.toml".to_string(),
            features: vec!["f1".to_string(), "f2".to_string()],
            all_features: true,
            no_default_features: true,
            jobs: 8,
        };

        assert_eq!(
            build_publish_args(&config),
            vec![
                "publish",
                "--token",
                "test-token",
                "--registry",
                "my-registry",
                "--allow-dirty",
                "--no-verify",
                "--manifest-path",
                "path/to/Cargo.toml",
                "--features",
                "f1,f2",
                "--all-features",
                "--no-default-features",
                "--jobs",
                "8",
            ]
        );
    }

    #[test]
    fn test_default_and_empty_manifest_omitted() {
        for manifest in ["Cargo.toml", ""] {
            let config =
                PublishConfig { manifest_path: manifest.to_string(), ..PublishConfig::default() };
            assert!(!build_publish_args(&config).contains(&"--manifest-path".to_string()));
            assert!(working_dir(&config).is_none());
        }
    }

    #[test]
    fn test_build_is_deterministic() {
        let config = PublishConfig {
            registry: "r".to_string(),
            features: vec!["a".to_string()],
            jobs: 2,
            ..config_with_token()
        };
        assert_eq!(build_publish_args(&config), build_publish_args(&config.clone()));
    }

    #[test]
    fn test_display_command_masks_token() {
        let args = build_publish_args(&PublishConfig {
            registry: "my-registry".to_string(),
            ..config_with_token()
        });
        let shown = display_command("cargo", &args);
        assert_eq!(shown, "cargo publish --token *** --registry my-registry");
        assert!(!shown.contains("test-token"));
    }

    #[test]
    fn test_registry_name() {
        assert_eq!(registry_name(&PublishConfig::default()), "crates.io");
        let config = PublishConfig { registry: "my-registry".to_string(), ..PublishConfig::default() };
        assert_eq!(registry_name(&config), "my-registry");
    }

    #[test]
    fn test_working_dir_from_manifest() {
        let config = PublishConfig {
            manifest_path: "crates/lib/Cargo.toml".to_string(),
            ..PublishConfig::default()
        };
        assert_eq!(working_dir(&config), Some(PathBuf::from("crates/lib")));

        let config =
            PublishConfig { manifest_path: "Other.toml".to_string(), ..PublishConfig::default() };
        assert!(working_dir(&config).is_none());
    }
}
