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

use log::warn;

use crate::registry::{RegistryError, RegistrySnapshot, VersionRegistry};
use crate::version::VersionRoot;

/// Why no chain could be built. Both are deployment problems rather than
/// problems with the request.
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    #[error("the version registry lists no deployed versions")]
    NoVersions,
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Build the ordered list of version roots to search for a request.
///
/// Roots are sorted newest first and deduplicated. When the request carries no
/// validation token the site's current version is moved to the front, so that
/// unvalidated requests get the live version rather than the newest deployed one.
///
/// If the site has no current version the chain is still returned, sorted
/// newest first.
pub async fn build_chain(
    registry: &dyn VersionRegistry,
    db_name: &str,
    has_token: bool,
) -> Result<Vec<VersionRoot>, ChainError> {
    let RegistrySnapshot { available, current } = registry.snapshot(db_name).await?;
    if available.is_empty() {
        return Err(ChainError::NoVersions);
    }

    let current = if has_token {
        None
    } else {
        if current.is_none() {
            warn!("no current version for '{db_name}', using newest first");
        }
        current
    };

    Ok(order_chain(available, current))
}

/// Sort newest first, drop duplicates and put `current` (if any) at the front
pub fn order_chain(mut roots: Vec<VersionRoot>, current: Option<VersionRoot>) -> Vec<VersionRoot> {
    roots.sort_by(|a, b| b.cmp(a));
    roots.dedup();

    if let Some(current) = current {
        roots.retain(|root| *root != current);
        roots.insert(0, current);
    }
    roots
}
