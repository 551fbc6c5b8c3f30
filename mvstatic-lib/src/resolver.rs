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

//! The file resolver walks a chain of version roots and decides which copy of
//! an asset to serve, and with what [`ResponseClass`].
//!
//! Without a validation token the first root containing the file wins. With a
//! well formed token, roots are searched for a file whose content hash matches
//! and the first existing copy is kept as a fallback in case none does. This
//! lets pages cached against an older deployment keep loading the assets they
//! were built with.

use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use http::StatusCode;
use log::{debug, error, warn};

use crate::chain::{build_chain, ChainError};
use crate::content_type::ContentTypeClassifier;
use crate::hash::{ContentHasher, Md5Hasher, TOKEN_LENGTH};
use crate::registry::VersionRegistry;
use crate::request::ResolutionRequest;
use crate::version::VersionRoot;

/// Cache policy category of a successful response
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResponseClass {
    /// No validation token was given
    NoHash,
    /// The content matches the validation token
    Verified,
    /// A token was given but could not be confirmed
    UnknownHash,
}

impl ResponseClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseClass::NoHash => "nohash",
            ResponseClass::Verified => "verified",
            ResponseClass::UnknownHash => "unknown",
        }
    }
}

impl fmt::Display for ResponseClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the file was chosen from the chain
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Selection {
    /// First existing copy, no token given
    Unvalidated,
    /// First existing copy, the token was not [`TOKEN_LENGTH`] characters
    MalformedToken,
    /// The copy whose content hash matches the token
    Verified,
    /// No copy matched the token so the first existing copy is used
    HashFallback,
}

impl Selection {
    pub fn response_class(&self) -> ResponseClass {
        match self {
            Selection::Unvalidated => ResponseClass::NoHash,
            Selection::Verified => ResponseClass::Verified,
            Selection::MalformedToken | Selection::HashFallback => ResponseClass::UnknownHash,
        }
    }
}

/// File metadata read once for the selected candidate
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FileStat {
    pub size: u64,
    pub modified: SystemTime,
}

impl FileStat {
    fn from_metadata(metadata: &std::fs::Metadata) -> FileStat {
        FileStat {
            size: metadata.len(),
            modified: metadata.modified().unwrap_or(UNIX_EPOCH),
        }
    }
}

/// The copy of an asset chosen to be served
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedFile {
    /// Canonical path of the file
    pub path: PathBuf,
    /// The version root it was found in
    pub root: VersionRoot,
    pub selection: Selection,
    pub content_type: String,
    pub stat: FileStat,
}

impl ResolvedFile {
    pub fn response_class(&self) -> ResponseClass {
        self.selection.response_class()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BadRequestReason {
    /// The handler's own script path was requested
    DirectRequest,
    /// The path is outside the configured URL prefix
    PrefixMismatch,
    /// The path has a scheme, device prefix or NUL byte
    InvalidPath,
    /// The path resolves outside its version root
    PathEscape,
    /// Directory, extension-less file or unknown extension
    InvalidFileType,
}

impl BadRequestReason {
    /// Text for the response body
    pub fn message(&self) -> &'static str {
        match self {
            BadRequestReason::DirectRequest => "Invalid request",
            BadRequestReason::PrefixMismatch
            | BadRequestReason::InvalidPath
            | BadRequestReason::PathEscape => "Bad request",
            BadRequestReason::InvalidFileType => "Invalid file type",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NotFoundReason {
    /// No version root contains the file
    NoCandidate,
    /// No chain of versions could be built, which is a deployment problem
    Configuration(String),
}

/// The result of resolving one request
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResolutionOutcome {
    Served(ResolvedFile),
    NotModified(ResolvedFile),
    NotFound(NotFoundReason),
    BadRequest(BadRequestReason),
}

impl ResolutionOutcome {
    pub fn status(&self) -> StatusCode {
        match self {
            ResolutionOutcome::Served(_) => StatusCode::OK,
            ResolutionOutcome::NotModified(_) => StatusCode::NOT_MODIFIED,
            ResolutionOutcome::NotFound(_) => StatusCode::NOT_FOUND,
            ResolutionOutcome::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    pub fn resolved_file(&self) -> Option<&ResolvedFile> {
        match self {
            ResolutionOutcome::Served(file) | ResolutionOutcome::NotModified(file) => Some(file),
            _ => None,
        }
    }
}

/// Everything needed to resolve requests for one site, built per request
/// and passed down explicitly.
pub struct ResolutionContext<'a> {
    pub registry: &'a dyn VersionRegistry,
    pub classifier: &'a dyn ContentTypeClassifier,
    pub hasher: &'a dyn ContentHasher,
    /// Database name of the site the request is for, used to find its current version
    pub db_name: String,
}

// An existing file below a version root
struct Candidate {
    root: VersionRoot,
    path: PathBuf,
}

impl<'a> ResolutionContext<'a> {
    pub fn new(
        registry: &'a dyn VersionRegistry,
        classifier: &'a dyn ContentTypeClassifier,
        db_name: impl Into<String>,
    ) -> Self {
        ResolutionContext {
            registry,
            classifier,
            hasher: &Md5Hasher,
            db_name: db_name.into(),
        }
    }

    pub fn with_hasher(mut self, hasher: &'a dyn ContentHasher) -> Self {
        self.hasher = hasher;
        self
    }

    /// Build the version chain for the request and resolve it
    pub async fn resolve(&self, request: &ResolutionRequest) -> ResolutionOutcome {
        if climbs_above_root(request.relative_path()) {
            return escaped(request);
        }

        let chain = match build_chain(self.registry, &self.db_name, request.has_token()).await {
            Ok(chain) => chain,
            Err(e) => {
                if let ChainError::NoVersions = e {
                    warn!("no deployed versions for '{}': {e}", self.db_name);
                } else {
                    error!("failed to build version chain for '{}': {e}", self.db_name);
                }
                return ResolutionOutcome::NotFound(NotFoundReason::Configuration(e.to_string()));
            }
        };
        self.resolve_in_chain(request, &chain).await
    }

    /// Resolve the request against an already ordered chain of version roots
    pub async fn resolve_in_chain(
        &self,
        request: &ResolutionRequest,
        chain: &[VersionRoot],
    ) -> ResolutionOutcome {
        let relative_path = request.relative_path();
        if climbs_above_root(relative_path) {
            return escaped(request);
        }
        let mut fallback: Option<(Candidate, String, FileStat)> = None;

        for root in chain {
            let candidate = match locate(root, relative_path).await {
                Located::Missing => continue,
                Located::Escaped(path) => {
                    warn!(
                        "path escape: '{}' resolves to {} outside {root}",
                        request.logical_path,
                        path.display()
                    );
                    return ResolutionOutcome::BadRequest(BadRequestReason::PathEscape);
                }
                Located::Found(candidate) => candidate,
            };

            // Check the symlink target too so a link can't expose a file of another type
            let content_type = match (
                self.classifier.classify(relative_path),
                self.classifier.classify(&candidate.path),
            ) {
                (Some(content_type), Some(_)) => content_type,
                _ => return ResolutionOutcome::BadRequest(BadRequestReason::InvalidFileType),
            };

            let stat = match tokio::fs::metadata(&candidate.path).await {
                Ok(metadata) if metadata.is_file() => FileStat::from_metadata(&metadata),
                Ok(_) => return ResolutionOutcome::BadRequest(BadRequestReason::InvalidFileType),
                Err(e) => {
                    debug!("skipping {}: {e}", candidate.path.display());
                    continue;
                }
            };

            let token = match request.validation_token.as_deref() {
                None => {
                    return finish(request, candidate, Selection::Unvalidated, content_type, stat)
                }
                Some(token) if token.len() != TOKEN_LENGTH => {
                    debug!("malformed validation token '{token}'");
                    return finish(request, candidate, Selection::MalformedToken, content_type, stat);
                }
                Some(token) => token,
            };

            let file_token = match self.hasher.token(&candidate.path).await {
                Ok(file_token) => Some(file_token),
                Err(e) => {
                    debug!("unable to hash {}: {e}", candidate.path.display());
                    None
                }
            };

            if file_token.as_deref() == Some(token) {
                return finish(request, candidate, Selection::Verified, content_type, stat);
            }

            debug!(
                "hash mismatch for {} (wanted '{token}', got '{}')",
                candidate.path.display(),
                file_token.as_deref().unwrap_or("")
            );
            if fallback.is_none() {
                fallback = Some((candidate, content_type, stat));
            }
        }

        match fallback {
            Some((candidate, content_type, stat)) => {
                finish(request, candidate, Selection::HashFallback, content_type, stat)
            }
            None => ResolutionOutcome::NotFound(NotFoundReason::NoCandidate),
        }
    }
}

// True when ".." segments lead above the start of the path, whether or not the
// target exists. Symlinks are caught later by the canonical containment check.
fn climbs_above_root(relative_path: &Path) -> bool {
    let mut depth = 0usize;
    for component in relative_path.components() {
        match component {
            Component::ParentDir => match depth.checked_sub(1) {
                Some(parent) => depth = parent,
                None => return true,
            },
            Component::Normal(_) => depth += 1,
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
        }
    }
    false
}

fn escaped(request: &ResolutionRequest) -> ResolutionOutcome {
    warn!("path escape: '{}' leads outside the version root", request.logical_path);
    ResolutionOutcome::BadRequest(BadRequestReason::PathEscape)
}

enum Located {
    Missing,
    Escaped(PathBuf),
    Found(Candidate),
}

// Canonicalise root/relative_path and check it stays within the root. Roots and
// files which don't exist (or can't be read) are simply missing.
async fn locate(root: &VersionRoot, relative_path: &Path) -> Located {
    let Ok(canonical_root) = tokio::fs::canonicalize(root.path()).await else {
        return Located::Missing;
    };
    let Ok(path) = tokio::fs::canonicalize(root.path().join(relative_path)).await else {
        return Located::Missing;
    };
    if !path.starts_with(&canonical_root) {
        return Located::Escaped(path);
    }
    Located::Found(Candidate {
        root: root.clone(),
        path,
    })
}

fn finish(
    request: &ResolutionRequest,
    candidate: Candidate,
    selection: Selection,
    content_type: String,
    stat: FileStat,
) -> ResolutionOutcome {
    let file = ResolvedFile {
        path: candidate.path,
        root: candidate.root,
        selection,
        content_type,
        stat,
    };

    match request.if_modified_since {
        Some(since) if unix_seconds(file.stat.modified) <= unix_seconds(since) => {
            ResolutionOutcome::NotModified(file)
        }
        _ => ResolutionOutcome::Served(file),
    }
}

// HTTP dates have one second resolution
fn unix_seconds(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_secs())
        .unwrap_or(0)
}
