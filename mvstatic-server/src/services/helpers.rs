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

use actix_web::{
    http::{header, StatusCode},
    HttpResponse, HttpResponseBuilder,
};

use crate::web::cache_control::NOT_FOUND_CACHE_CONTROL;

pub const NOT_FOUND_MESSAGE: &str = "Unknown file path";

/// A plain text error response with the message as its body
pub(crate) fn show_error(status_code: StatusCode, message: &str) -> HttpResponse {
    HttpResponseBuilder::new(status_code)
        .insert_header((header::CONTENT_TYPE, "text/plain; charset=utf-8"))
        .body(format!("{message}\n"))
}

/// Not found, cached briefly so that a newly deployed file soon becomes visible
pub(crate) fn not_found() -> HttpResponse {
    let mut response = show_error(StatusCode::NOT_FOUND, NOT_FOUND_MESSAGE);
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static(NOT_FOUND_CACHE_CONTROL),
    );
    response
}
