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

//! Content hashes used as validation tokens in asset URLs.
//!
//! An asset URL like `/w/skins/Vector/main.css?a1b2c` carries the first
//! [`TOKEN_LENGTH`] hex characters of the MD5 digest of the file. This is a
//! cache-busting fingerprint rather than a security control, so tokens are
//! compared with plain equality.

use std::io;
use std::path::Path;

use async_trait::async_trait;
use md5::{Digest, Md5};
use tokio::io::AsyncReadExt;

/// Length of a well formed validation token
pub const TOKEN_LENGTH: usize = 5;

const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Compute the validation token for the file at `path`
pub async fn content_token(path: &Path) -> io::Result<String> {
    let mut file = tokio::fs::File::open(path).await?;
    let mut hasher = Md5::new();
    let mut buffer = vec![0u8; READ_BUFFER_SIZE];
    loop {
        let count = file.read(&mut buffer).await?;
        if count == 0 {
            break;
        }
        hasher.update(&buffer[..count]);
    }
    Ok(token_from_digest(&hasher.finalize()))
}

/// Computes validation tokens for candidate files
#[async_trait]
pub trait ContentHasher: Send + Sync {
    async fn token(&self, path: &Path) -> io::Result<String>;
}

/// Hashes file contents with [`content_token`]
#[derive(Clone, Copy, Debug, Default)]
pub struct Md5Hasher;

#[async_trait]
impl ContentHasher for Md5Hasher {
    async fn token(&self, path: &Path) -> io::Result<String> {
        content_token(path).await
    }
}

/// Compute the validation token for content already in memory
pub fn content_token_for_bytes(bytes: &[u8]) -> String {
    token_from_digest(&Md5::digest(bytes))
}

fn token_from_digest(digest: &[u8]) -> String {
    let mut token = hex::encode(digest);
    token.truncate(TOKEN_LENGTH);
    token
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_is_md5_prefix() {
        // md5("") = d41d8cd98f00b204e9800998ecf8427e
        assert_eq!(content_token_for_bytes(b""), "d41d8");
        // md5("hello world") = 5eb63bbbe01eeed093cb22bb8f5acdc3
        assert_eq!(content_token_for_bytes(b"hello world"), "5eb63");
    }

    #[tokio::test]
    async fn file_token_matches_bytes_token() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("big.js");
        let content: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
        std::fs::write(&path, &content).expect("write");

        let token = content_token(&path).await.expect("token");
        assert_eq!(token, content_token_for_bytes(&content));
        assert_eq!(token.len(), TOKEN_LENGTH);
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(content_token(&dir.path().join("nope.css")).await.is_err());
    }
}
