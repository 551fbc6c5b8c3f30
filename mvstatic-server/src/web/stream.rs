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

use std::io;

use actix_web::body::SizedStream;
use bytes::Bytes;
use futures::Stream;
use tokio::{fs::File, io::AsyncReadExt};

const CHUNK_SIZE: usize = 64 * 1024;

/// Wrap an open file as a response body of known length, read in chunks as
/// the client accepts them.
///
/// If the client goes away the body is dropped, closing the file.
pub(crate) fn file_body(
    file: File,
    size: u64,
) -> SizedStream<impl Stream<Item = Result<Bytes, io::Error>> + 'static> {
    SizedStream::new(size, chunks(file))
}

fn chunks(mut file: File) -> impl Stream<Item = Result<Bytes, io::Error>> {
    async_stream::try_stream! {
        let mut buffer = vec![0u8; CHUNK_SIZE];
        loop {
            let count = file.read(&mut buffer).await?;
            if count == 0 {
                break;
            }
            yield Bytes::copy_from_slice(&buffer[..count]);
        }
    }
}
