use miette::{Result, miette};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::{env, fs};

use crate::catalog;
use crate::error::CatalogError;
use crate::link::DEFAULT_NO_PREVIEW_HOSTS;
use crate::provider::Catalog;

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct EndpointConfig {
    /// Site root the `oembed/1.0/proxy` route hangs off.
    pub base_url: String,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/wp-json".into(),
            timeout_secs: 15,
            user_agent: concat!("weaver-oembed/", env!("CARGO_PKG_VERSION")).into(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub endpoint: EndpointConfig,
    /// Provider catalog file. The built-in catalog is used when unset.
    pub catalog_path: Option<PathBuf>,
    pub no_preview_hosts: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: EndpointConfig::default(),
            catalog_path: None,
            no_preview_hosts: DEFAULT_NO_PREVIEW_HOSTS
                .iter()
                .map(|h| h.to_string())
                .collect(),
        }
    }
}

impl Config {
    pub fn load(config_file: &str) -> Result<Config> {
        let config_string = fs::read_to_string(config_file)
            .map_err(|e| miette!("error reading config file {}: {}", config_file, e))?;
        Self::from_toml_str(&config_string)
    }

    /// Parses a TOML config, substituting `$VAR` references from the environment first.
    pub fn from_toml_str(source: &str) -> Result<Config> {
        let mut config_string = source.to_owned();
        for (k, v) in env::vars() {
            config_string = config_string.replace(&format!("${}", k), &v);
        }

        toml::from_str(&config_string).map_err(|e| miette!("error parsing config file {}", e))
    }

    pub fn catalog(&self) -> std::result::Result<Catalog, CatalogError> {
        match &self.catalog_path {
            Some(path) => catalog::load_catalog(path),
            None => Ok(catalog::builtin().clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.no_preview_hosts, vec!["facebook.com".to_string()]);
        assert_eq!(config.catalog().unwrap().len(), catalog::builtin().len());
    }

    #[test]
    fn test_partial_endpoint() {
        let config = Config::from_toml_str(
            r#"
            no_preview_hosts = []

            [endpoint]
            base_url = "https://blog.test/wp-json"
            "#,
        )
        .unwrap();
        assert_eq!(config.endpoint.base_url, "https://blog.test/wp-json");
        assert_eq!(config.endpoint.timeout_secs, 15);
        assert!(config.no_preview_hosts.is_empty());
    }

    #[test]
    fn test_missing_catalog_file() {
        let config = Config {
            catalog_path: Some(PathBuf::from("/definitely/not/here.toml")),
            ..Default::default()
        };
        assert!(matches!(config.catalog(), Err(CatalogError::Io { .. })));
    }

    #[test]
    fn test_bad_toml() {
        assert!(Config::from_toml_str("endpoint = 12").is_err());
    }
}
