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

//! The version registry lists the deployed version directories and says which
//! one is current for a given site.
//!
//! [`WikiversionsRegistry`] reads a `wikiversions.json` file, a JSON object
//! mapping each site's database name to its version directory:
//!
//! ```json
//! {
//!     "enwiki": "php-1.27.0-wmf.12",
//!     "testwiki": "php-1.27.0-wmf.13"
//! }
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

use crate::version::VersionRoot;

/// Every version directory name starts with this
pub const VERSION_DIR_PREFIX: &str = "php-";

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("unable to read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("{} did not decode to a JSON object: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error(
        "{} version entry for `{db_name}` does not start with `php-` (got `{version}`)",
        path.display()
    )]
    InvalidVersion {
        path: PathBuf,
        db_name: String,
        version: String,
    },
}

/// The deployed versions as seen by one request
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RegistrySnapshot {
    /// All deployed version roots, in no particular order
    pub available: Vec<VersionRoot>,
    /// The version root configured for the requested site, if it has one
    pub current: Option<VersionRoot>,
}

/// Source of the deployed version directories
#[async_trait]
pub trait VersionRegistry: Send + Sync {
    /// Read the deployed versions and the current version for the site
    /// `db_name` together, so both come from the same deployment state.
    async fn snapshot(&self, db_name: &str) -> Result<RegistrySnapshot, RegistryError>;
}

/// A [`VersionRegistry`] backed by a wikiversions.json file.
///
/// The file is read once per snapshot so that a deployment is picked up by the
/// next request without a restart.
#[derive(Clone, Debug)]
pub struct WikiversionsRegistry {
    deployment_dir: PathBuf,
    wikiversions_file: PathBuf,
}

impl WikiversionsRegistry {
    /// `wikiversions_file` is resolved relative to `deployment_dir` unless absolute
    pub fn new(deployment_dir: impl Into<PathBuf>, wikiversions_file: impl AsRef<Path>) -> Self {
        let deployment_dir = deployment_dir.into();
        let wikiversions_file = deployment_dir.join(wikiversions_file);
        WikiversionsRegistry {
            deployment_dir,
            wikiversions_file,
        }
    }

    pub fn deployment_dir(&self) -> &Path {
        &self.deployment_dir
    }

    /// Read and validate the wikiversions file as `db_name -> version directory`
    pub async fn read_wikiversions(&self) -> Result<BTreeMap<String, String>, RegistryError> {
        let path = &self.wikiversions_file;
        let json = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| RegistryError::Read {
                path: path.clone(),
                source,
            })?;
        self.parse_wikiversions(&json)
    }

    fn parse_wikiversions(&self, json: &str) -> Result<BTreeMap<String, String>, RegistryError> {
        let path = &self.wikiversions_file;
        let versions: BTreeMap<String, String> =
            serde_json::from_str(json).map_err(|source| RegistryError::Parse {
                path: path.clone(),
                source,
            })?;

        for (db_name, version) in &versions {
            if !version.starts_with(VERSION_DIR_PREFIX) {
                return Err(RegistryError::InvalidVersion {
                    path: path.clone(),
                    db_name: db_name.clone(),
                    version: version.clone(),
                });
            }
        }
        Ok(versions)
    }

    fn root(&self, version: &str) -> VersionRoot {
        VersionRoot::new(self.deployment_dir.join(version))
    }
}

#[async_trait]
impl VersionRegistry for WikiversionsRegistry {
    async fn snapshot(&self, db_name: &str) -> Result<RegistrySnapshot, RegistryError> {
        let versions = self.read_wikiversions().await?;
        let distinct: BTreeSet<&String> = versions.values().collect();
        Ok(RegistrySnapshot {
            available: distinct.into_iter().map(|version| self.root(version)).collect(),
            current: versions.get(db_name).map(|version| self.root(version)),
        })
    }
}
