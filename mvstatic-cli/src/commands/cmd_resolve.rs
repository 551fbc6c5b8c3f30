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

use actix_web::http::header::HttpDate;
use color_eyre::{eyre::eyre, Result};

use mvstatic::config::StaticConfig;
use mvstatic::content_type::MimeGuessClassifier;
use mvstatic::metrics::{outcome_counter, prefixed};
use mvstatic::request::parse_request;
use mvstatic::resolver::{ResolutionContext, ResolutionOutcome};
use mvstatic::site::SiteResolver;

/// Run a request through the resolver and print the outcome, without serving
/// anything. Useful for checking what a deployment will serve for a URL.
pub(crate) async fn handle_resolve(
    config: &StaticConfig,
    request_uri: &str,
    request_host: &str,
    if_modified_since: Option<&str>,
) -> Result<()> {
    let if_modified_since = match if_modified_since {
        Some(date) => Some(SystemTime::from(
            date.parse::<HttpDate>()
                .map_err(|e| eyre!("invalid date '{date}': {e}"))?,
        )),
        None => None,
    };

    let db_name = config.host_table().db_name_for_host(request_host);
    let outcome = match parse_request(request_uri, &config.script_name, &config.url_prefix) {
        Ok(mut request) => {
            request.if_modified_since = if_modified_since;
            let registry = config.registry();
            let classifier = MimeGuessClassifier;
            let context = ResolutionContext::new(&registry, &classifier, db_name.as_str());
            context.resolve(&request).await
        }
        Err(reason) => ResolutionOutcome::BadRequest(reason),
    };

    println!("site:    {db_name}");
    println!("status:  {}", outcome.status());
    match &outcome {
        ResolutionOutcome::Served(file) | ResolutionOutcome::NotModified(file) => {
            println!("class:   {}", file.response_class());
            println!("version: {}", file.root.version());
            println!("file:    {}", file.path.display());
            println!("type:    {}", file.content_type);
            println!("size:    {}", file.stat.size);
        }
        ResolutionOutcome::BadRequest(reason) => println!("reason:  {}", reason.message()),
        ResolutionOutcome::NotFound(reason) => println!("reason:  {reason:?}"),
    }
    println!(
        "counter: {}",
        prefixed(&config.metrics_prefix, &outcome_counter(&outcome))
    );
    Ok(())
}
