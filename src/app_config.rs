//! Application configuration loading for CLI defaults.

use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use linkcard_core::ResolverConfig;
use serde::Deserialize;

/// TOML-backed file configuration.
///
/// ```toml
/// concurrency = 8
///
/// [resolver]
/// page_timeout_ms = 2000
/// order = "scrape-first"
/// crossref_mailto = "me@example.com"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Default concurrency (same range as CLI).
    pub concurrency: Option<u8>,
    /// Resolver settings; omitted keys keep their defaults.
    pub resolver: ResolverConfig,
}

impl FileConfig {
    /// Validates config values against runtime and CLI constraints.
    pub fn validate(&self) -> Result<()> {
        if let Some(concurrency) = self.concurrency
            && !(1..=64).contains(&concurrency)
        {
            bail!("Invalid config value for `concurrency`: {concurrency}. Expected range: 1..=64");
        }
        self.resolver
            .validate()
            .context("Invalid `[resolver]` section")?;
        Ok(())
    }
}

/// Loaded config metadata.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// Config path that was consulted, if any.
    pub path: Option<PathBuf>,
    /// Parsed config, or defaults when no file exists.
    pub config: FileConfig,
    /// Indicates whether configuration was loaded from disk.
    pub loaded_from_file: bool,
}

/// Resolves default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/linkcard/config.toml`
/// 2. `$HOME/.config/linkcard/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    config_path_from(
        env_var_non_empty_os("XDG_CONFIG_HOME"),
        env_var_non_empty_os("HOME"),
    )
}

fn config_path_from(xdg_config_home: Option<OsString>, home: Option<OsString>) -> Option<PathBuf> {
    if let Some(xdg_config_home) = xdg_config_home {
        return Some(
            PathBuf::from(xdg_config_home)
                .join("linkcard")
                .join("config.toml"),
        );
    }
    Some(
        PathBuf::from(home?)
            .join(".config")
            .join("linkcard")
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads config from `explicit` (which must exist) or from the default path if present.
pub fn load_config(explicit: Option<&Path>) -> Result<LoadedConfig> {
    if let Some(path) = explicit {
        let config = load_file_config(path)?;
        return Ok(LoadedConfig {
            path: Some(path.to_path_buf()),
            config,
            loaded_from_file: true,
        });
    }

    let path = resolve_default_config_path();
    match path.as_deref() {
        Some(path_ref) if path_ref.exists() => {
            let config = load_file_config(path_ref)?;
            Ok(LoadedConfig {
                path,
                config,
                loaded_from_file: true,
            })
        }
        _ => Ok(LoadedConfig {
            path,
            config: FileConfig::default(),
            loaded_from_file: false,
        }),
    }
}

fn load_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let config: FileConfig = toml::from_str(raw)?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use linkcard_core::{IconFetchPolicy, ResolutionOrder};
    use tempfile::TempDir;

    #[test]
    fn test_config_path_prefers_xdg() {
        let path = config_path_from(Some("/xdg".into()), Some("/home/me".into())).unwrap();
        assert_eq!(path, PathBuf::from("/xdg/linkcard/config.toml"));
    }

    #[test]
    fn test_config_path_falls_back_to_home() {
        let path = config_path_from(None, Some("/home/me".into())).unwrap();
        assert_eq!(path, PathBuf::from("/home/me/.config/linkcard/config.toml"));
        assert!(config_path_from(None, None).is_none());
    }

    #[test]
    fn test_parse_config_str_full() {
        let config = parse_config_str(
            r#"
            concurrency = 8

            [resolver]
            page_timeout_ms = 2000
            order = "doi-before-scrape"
            icon_policy = "always"
            crossref_mailto = "me@example.com"
            "#,
        )
        .unwrap();
        assert_eq!(config.concurrency, Some(8));
        assert_eq!(config.resolver.page_timeout_ms, 2000);
        assert_eq!(config.resolver.order, ResolutionOrder::DoiBeforeScrape);
        assert_eq!(config.resolver.icon_policy, IconFetchPolicy::Always);
        assert_eq!(config.resolver.crossref_mailto.as_deref(), Some("me@example.com"));
    }

    #[test]
    fn test_parse_config_str_empty_is_default() {
        assert_eq!(parse_config_str("").unwrap(), FileConfig::default());
    }

    #[test]
    fn test_parse_config_str_rejects_bad_values() {
        let err = parse_config_str("concurrency = 0").unwrap_err();
        assert!(err.to_string().contains("concurrency"));

        let err = parse_config_str("[resolver]\npage_timeout_ms = 0").unwrap_err();
        assert!(format!("{err:#}").contains("page_timeout_ms"));

        assert!(parse_config_str("unknown = true").is_err());
        assert!(parse_config_str("[resolver]\norder = \"sideways\"").is_err());
    }

    #[test]
    fn test_load_config_explicit_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("linkcard.toml");
        fs::write(&path, "[resolver]\nregistry_timeout_ms = 700\n").unwrap();

        let loaded = load_config(Some(&path)).unwrap();
        assert!(loaded.loaded_from_file);
        assert_eq!(loaded.path.as_deref(), Some(path.as_path()));
        assert_eq!(loaded.config.resolver.registry_timeout_ms, 700);
    }

    #[test]
    fn test_load_config_explicit_missing_file_errors() {
        let dir = TempDir::new().unwrap();
        let err = load_config(Some(&dir.path().join("missing.toml"))).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
