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
    http::{
        header::{self, HeaderValue, HttpDate, LastModified},
        StatusCode,
    },
    web::Data,
    HttpRequest, HttpResponse, HttpResponseBuilder,
};
use log::{debug, warn};

use mvstatic::content_type::is_web_asset;
use mvstatic::metrics::{outcome_counter, prefixed, COUNTER_NOT_FOUND};
use mvstatic::request::parse_request;
use mvstatic::resolver::{ResolutionContext, ResolutionOutcome, ResolvedFile};

use super::helpers::{not_found, show_error};
use crate::web::{cache_control::cache_control, conditional::if_modified_since, stream::file_body};
use crate::StaticState;

/// Serve a static asset from whichever deployed version holds it.
///
/// Requests take the form `http://<HOST>/w/skins/Vector/main.css?a1b2c`,
/// where the optional query is the first five hex digits of the md5 of the
/// content the page expected. The Host header selects the site, and so the
/// version preferred when no query is given.
pub async fn static_handler(request: HttpRequest, state: Data<StaticState>) -> HttpResponse {
    let config = &state.config;
    let uri = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| request.uri().path());

    let outcome = match parse_request(uri, &config.script_name, &config.url_prefix) {
        Ok(mut resolution_request) => {
            resolution_request.if_modified_since = if_modified_since(&request);
            let host = request.connection_info().host().to_string();
            let db_name = state.sites.db_name_for_host(&host);
            debug!("static_handler() '{uri}' for host '{host}' ({db_name})");

            let context = ResolutionContext::new(
                state.registry.as_ref(),
                state.classifier.as_ref(),
                db_name,
            );
            context.resolve(&resolution_request).await
        }
        Err(reason) => ResolutionOutcome::BadRequest(reason),
    };

    let (response, counter) = respond(&outcome).await;
    state
        .metrics
        .increment(&prefixed(&config.metrics_prefix, &counter));
    response
}

// The response for an outcome and the counter to report for it
async fn respond(outcome: &ResolutionOutcome) -> (HttpResponse, String) {
    let counter = outcome_counter(outcome);
    match outcome {
        ResolutionOutcome::BadRequest(reason) => {
            debug!("bad request: {reason:?}");
            (show_error(StatusCode::BAD_REQUEST, reason.message()), counter)
        }
        ResolutionOutcome::NotFound(_) => (not_found(), counter),
        ResolutionOutcome::NotModified(file) => {
            let mut builder = HttpResponseBuilder::new(StatusCode::NOT_MODIFIED);
            add_file_headers(&mut builder, file);
            (builder.finish(), counter)
        }
        ResolutionOutcome::Served(file) => match tokio::fs::File::open(&file.path).await {
            Ok(opened) => {
                let mut builder = HttpResponseBuilder::new(StatusCode::OK);
                add_file_headers(&mut builder, file);
                (
                    builder.body(file_body(opened, file.stat.size)),
                    counter,
                )
            }
            Err(e) => {
                // Removed between resolving and opening
                warn!("failed to open '{}': {e}", file.path.display());
                (not_found(), COUNTER_NOT_FOUND.to_string())
            }
        },
    }
}

fn add_file_headers(builder: &mut HttpResponseBuilder, file: &ResolvedFile) {
    if is_web_asset(&file.path) {
        builder.insert_header((
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ));
    }
    builder.insert_header(LastModified(HttpDate::from(file.stat.modified)));
    builder.insert_header((header::CONTENT_TYPE, file.content_type.as_str()));
    builder.insert_header((
        header::CACHE_CONTROL,
        HeaderValue::from_static(cache_control(file.response_class())),
    ));
}
