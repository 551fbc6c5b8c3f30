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

use mvstatic::resolver::ResponseClass;

/// 5 minutes on proxies, not cached by clients
pub const NOT_FOUND_CACHE_CONTROL: &str = "s-maxage=300, must-revalidate, max-age=0";

/// 5 minutes on proxies and 24 hours on clients, so a new deployment reaches
/// proxies quickly
pub const SHORT_CACHE_CONTROL: &str = "public, s-maxage=300, must-revalidate, max-age=86400";

/// 1 year on proxies and clients. Only for content matching the hash in its URL.
pub const LONG_CACHE_CONTROL: &str = "public, s-maxage=31536000, max-age=31536000";

pub(crate) fn cache_control(class: ResponseClass) -> &'static str {
    match class {
        ResponseClass::Verified => LONG_CACHE_CONTROL,
        // An unconfirmed hash must not pin the pairing in caches for long
        ResponseClass::NoHash | ResponseClass::UnknownHash => SHORT_CACHE_CONTROL,
    }
}

#[test]
fn only_verified_is_cached_long() {
    assert_eq!(cache_control(ResponseClass::Verified), LONG_CACHE_CONTROL);
    assert_eq!(cache_control(ResponseClass::NoHash), SHORT_CACHE_CONTROL);
    assert_eq!(cache_control(ResponseClass::UnknownHash), SHORT_CACHE_CONTROL);
}
