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

use std::path::PathBuf;

use color_eyre::{eyre::eyre, Result};

use mvstatic::hash::content_token;

/// Print the validation token for each file in the form used by `sha256sum`
pub(crate) async fn handle_hash(files: &[PathBuf]) -> Result<()> {
    for file in files {
        let token = content_token(file)
            .await
            .map_err(|e| eyre!("failed to read {}: {e}", file.display()))?;
        println!("{token}  {}", file.display());
    }
    Ok(())
}
