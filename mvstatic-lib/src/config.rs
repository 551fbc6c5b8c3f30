/*
 Copyright (c) 2025 Mark Hughes

 This program is free software: you can redistribute it and/or modify
 it under the terms of the GNU Affero General Public License as published by
 the Free Software Foundation, either version 3 of the License, or
 (at your option) any later version.

 This program is distributed in the hope that it will be useful,
 but WITHOUT ANY WARRANTY; without even the implied warranty of
 MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 GNU Affero General Public License for more details.

 You should have received a copy of the GNU Affero General Public License
 along with this program. If not, see <https://www.gnu.org/licenses/>.
*/

//! Settings for serving static assets, read from an optional JSON file:
//!
//! ```json
//! {
//!     "deployment_dir": "/srv/mediawiki",
//!     "url_prefix": "/w",
//!     "script_name": "/w/static.php",
//!     "default_db_name": "enwiki",
//!     "hosts": { "test.wikipedia.org": "testwiki" }
//! }
//! ```
//!
//! Any setting left out takes its default. Command line options override the file.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::metrics::DEFAULT_METRICS_PREFIX;
use crate::registry::WikiversionsRegistry;
use crate::site::HostTable;

pub const DEFAULT_DEPLOYMENT_DIR: &str = "/srv/mediawiki";
pub const DEFAULT_WIKIVERSIONS_FILE: &str = "wikiversions.json";
pub const DEFAULT_URL_PREFIX: &str = "/w";
pub const DEFAULT_SCRIPT_NAME: &str = "/w/static.php";
pub const DEFAULT_DB_NAME: &str = "enwiki";
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unable to read config {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("url_prefix must be empty or begin with '/' (got '{0}')")]
    InvalidPrefix(String),
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct StaticConfig {
    /// Directory holding one subdirectory per deployed version
    pub deployment_dir: PathBuf,
    /// The wikiversions file, relative to deployment_dir unless absolute
    pub wikiversions_file: PathBuf,
    /// Stripped from request paths to give the path within a version
    pub url_prefix: String,
    /// Path of the handler itself, requests for it are rejected
    pub script_name: String,
    /// Site used when the request host is not in `hosts`
    pub default_db_name: String,
    /// Request host to site database name
    pub hosts: HashMap<String, String>,
    /// Prepended to every counter name
    pub metrics_prefix: String,
    /// Address for the server to listen on
    pub host: String,
    pub port: u16,
}

impl Default for StaticConfig {
    fn default() -> Self {
        StaticConfig {
            deployment_dir: PathBuf::from(DEFAULT_DEPLOYMENT_DIR),
            wikiversions_file: PathBuf::from(DEFAULT_WIKIVERSIONS_FILE),
            url_prefix: String::from(DEFAULT_URL_PREFIX),
            script_name: String::from(DEFAULT_SCRIPT_NAME),
            default_db_name: String::from(DEFAULT_DB_NAME),
            hosts: HashMap::new(),
            metrics_prefix: String::from(DEFAULT_METRICS_PREFIX),
            host: String::from(DEFAULT_HOST),
            port: DEFAULT_PORT,
        }
    }
}

impl StaticConfig {
    pub fn from_file(path: &Path) -> Result<StaticConfig, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: StaticConfig =
            serde_json::from_str(&json).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.url_prefix.is_empty() && !self.url_prefix.starts_with('/') {
            return Err(ConfigError::InvalidPrefix(self.url_prefix.clone()));
        }
        Ok(())
    }

    pub fn registry(&self) -> WikiversionsRegistry {
        WikiversionsRegistry::new(&self.deployment_dir, &self.wikiversions_file)
    }

    pub fn host_table(&self) -> HostTable {
        HostTable::new(self.hosts.clone(), &self.default_db_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("mvstatic.json");
        std::fs::write(
            &path,
            r#"{"deployment_dir": "/srv/deploy", "hosts": {"test.wikipedia.org": "testwiki"}}"#,
        )
        .expect("write");

        let config = StaticConfig::from_file(&path).expect("config");
        assert_eq!(config.deployment_dir, PathBuf::from("/srv/deploy"));
        assert_eq!(config.url_prefix, DEFAULT_URL_PREFIX);
        assert_eq!(config.script_name, DEFAULT_SCRIPT_NAME);
        assert_eq!(config.metrics_prefix, "wmfstatic");
        assert_eq!(config.hosts.get("test.wikipedia.org").map(String::as_str), Some("testwiki"));
    }

    #[test]
    fn unknown_fields_and_bad_prefix_are_errors() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("mvstatic.json");

        std::fs::write(&path, r#"{"deployment_directory": "/srv"}"#).expect("write");
        assert!(matches!(StaticConfig::from_file(&path), Err(ConfigError::Parse { .. })));

        std::fs::write(&path, r#"{"url_prefix": "w"}"#).expect("write");
        assert!(matches!(
            StaticConfig::from_file(&path),
            Err(ConfigError::InvalidPrefix(_))
        ));
    }

    #[test]
    fn wikiversions_file_is_relative_to_deployment_dir() {
        let config = StaticConfig::default();
        assert_eq!(
            config.registry().deployment_dir(),
            Path::new(DEFAULT_DEPLOYMENT_DIR)
        );
    }
}
