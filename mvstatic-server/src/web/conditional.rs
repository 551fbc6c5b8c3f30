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

use std::time::SystemTime;

use actix_web::{
    http::header::{self, HttpDate},
    HttpRequest,
};

/// The time from a conditional If-Modified-Since request header, if any.
///
/// Some clients append attributes such as "; length=1234" which are ignored.
/// An invalid date is treated as if the header were absent (rfc7232 section 3.3).
pub(crate) fn if_modified_since(request: &HttpRequest) -> Option<SystemTime> {
    let value = request.headers().get(header::IF_MODIFIED_SINCE)?.to_str().ok()?;
    let value = value.split(';').next().unwrap_or(value).trim();
    if value.is_empty() {
        return None;
    }
    match value.parse::<HttpDate>() {
        Ok(date) => Some(SystemTime::from(date)),
        Err(_e) => {
            log::debug!("ignoring invalid If-Modified-Since: '{value}'");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, UNIX_EPOCH};

    use actix_web::test::TestRequest;

    use super::*;

    #[test]
    fn parses_http_date() {
        let request = TestRequest::default()
            .insert_header((header::IF_MODIFIED_SINCE, "Sun, 06 Nov 1994 08:49:37 GMT"))
            .to_http_request();
        assert_eq!(
            if_modified_since(&request),
            Some(UNIX_EPOCH + Duration::from_secs(784111777))
        );
    }

    #[test]
    fn ignores_trailing_attributes() {
        let request = TestRequest::default()
            .insert_header((
                header::IF_MODIFIED_SINCE,
                "Sun, 06 Nov 1994 08:49:37 GMT; length=1024",
            ))
            .to_http_request();
        assert_eq!(
            if_modified_since(&request),
            Some(UNIX_EPOCH + Duration::from_secs(784111777))
        );
    }

    #[test]
    fn missing_or_invalid_is_none() {
        let request = TestRequest::default().to_http_request();
        assert_eq!(if_modified_since(&request), None);

        let request = TestRequest::default()
            .insert_header((header::IF_MODIFIED_SINCE, "yesterday"))
            .to_http_request();
        assert_eq!(if_modified_since(&request), None);
    }
}
