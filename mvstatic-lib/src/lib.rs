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

//! # mvstatic
//!
//! Resolve requests for static assets (stylesheets, scripts, images) against
//! every deployed version of a site, so that pages cached against an older
//! deployment keep working after a newer one goes live.
//!
//! The pipeline for a request is:
//!
//! - [`request::parse_request`] turns the raw request URI into a [`request::ResolutionRequest`]
//! - [`chain::build_chain`] orders the deployed [`version::VersionRoot`]s newest first
//! - [`resolver::ResolutionContext::resolve`] walks the chain and picks the file to serve
//!
//! Turning the [`resolver::ResolutionOutcome`] into a response is left to the caller
//! (see the `mvstatic-server` crate).

pub mod chain;
pub mod config;
pub mod content_type;
pub mod hash;
pub mod metrics;
pub mod registry;
pub mod request;
pub mod resolver;
pub mod site;
pub mod version;
