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

use std::path::{Component, Path};
use std::time::SystemTime;

use crate::resolver::BadRequestReason;

/// What to resolve, extracted from the raw request
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolutionRequest {
    /// Path of the asset relative to a version root, eg. "/skins/Vector/main.css"
    pub logical_path: String,
    /// The raw query string if present and non-empty, expected to be a content hash
    pub validation_token: Option<String>,
    /// From any If-Modified-Since request header
    pub if_modified_since: Option<SystemTime>,
}

impl ResolutionRequest {
    pub fn has_token(&self) -> bool {
        self.validation_token.is_some()
    }

    /// The logical path made relative, ready to join onto a version root
    pub fn relative_path(&self) -> &Path {
        Path::new(self.logical_path.trim_start_matches('/'))
    }
}

/// Parse a request URI such as `/w/skins/Vector/main.css?a1b2c`
///
/// `script_name` is the path of this handler itself, which is not a valid asset
/// request, and `url_prefix` is stripped from the path to give the logical path.
pub fn parse_request(
    request_uri: &str,
    script_name: &str,
    url_prefix: &str,
) -> Result<ResolutionRequest, BadRequestReason> {
    // Direct requests such as "/w/static.php" or "/w/static.php/test"
    if !script_name.is_empty() && request_uri.starts_with(script_name) {
        return Err(BadRequestReason::DirectRequest);
    }

    let (without_fragment, _fragment) = request_uri
        .split_once('#')
        .unwrap_or((request_uri, ""));
    let (path, query) = match without_fragment.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (without_fragment, None),
    };

    let Some(logical_path) = path.strip_prefix(url_prefix) else {
        return Err(BadRequestReason::PrefixMismatch);
    };

    if !is_confined_path(logical_path) {
        return Err(BadRequestReason::InvalidPath);
    }

    Ok(ResolutionRequest {
        logical_path: logical_path.to_string(),
        validation_token: query.filter(|q| !q.is_empty()).map(String::from),
        if_modified_since: None,
    })
}

// Reject paths which could name something other than a file below a root: NUL
// bytes, URL schemes ("file:", "php:") and drive or device prefixes. Parent
// components are left to the containment check made after canonicalisation.
fn is_confined_path(logical_path: &str) -> bool {
    if logical_path.contains('\0') {
        return false;
    }
    let relative = logical_path.trim_start_matches('/');
    if let Some((scheme, _)) = relative.split_once(':') {
        if !scheme.contains('/') {
            return false;
        }
    }
    Path::new(relative)
        .components()
        .all(|component| !matches!(component, Component::Prefix(_) | Component::RootDir))
}
