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

use std::fs;
use std::sync::Arc;

use actix_web::{
    http::{header, StatusCode},
    test, web::Data, App,
};

use mvstatic::config::StaticConfig;
use mvstatic::hash::content_token_for_bytes;
use mvstatic::metrics::MemoryMetrics;
use mvstatic_server::{configure_static_service, StaticState};

const OLD_CSS: &str = "body { color: red; }";
const NEW_CSS: &str = "body { color: blue; }";

// Two deployed versions: enwiki on the older one, testwiki on the newer
fn deployment() -> tempfile::TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    let write = |version: &str, path: &str, content: &str| {
        let path = dir.path().join(version).join(path);
        fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        fs::write(path, content).expect("write");
    };
    write("php-1.44.0-wmf.1", "skins/main.css", OLD_CSS);
    write("php-1.44.0-wmf.2", "skins/main.css", NEW_CSS);
    write("php-1.44.0-wmf.1", "skins/only-old.js", "old();");
    write("php-1.44.0-wmf.2", "LocalSettings.php", "<?php");
    fs::write(
        dir.path().join("wikiversions.json"),
        r#"{"enwiki": "php-1.44.0-wmf.1", "testwiki": "php-1.44.0-wmf.2"}"#,
    )
    .expect("write");
    dir
}

fn state(dir: &tempfile::TempDir, metrics: &Arc<MemoryMetrics>) -> StaticState {
    let mut config = StaticConfig {
        deployment_dir: dir.path().to_path_buf(),
        ..StaticConfig::default()
    };
    config
        .hosts
        .insert("test.wikipedia.org".to_string(), "testwiki".to_string());
    let metrics: Arc<MemoryMetrics> = Arc::clone(metrics);
    StaticState::from_config(config).with_metrics(metrics)
}

macro_rules! service {
    ($state:expr) => {{
        let state = Data::new($state);
        test::init_service(App::new().configure(move |cfg| configure_static_service(cfg, state)))
            .await
    }};
}

fn header_value<'a>(response: &'a actix_web::dev::ServiceResponse, name: header::HeaderName) -> Option<&'a str> {
    response.headers().get(name).and_then(|v| v.to_str().ok())
}

#[actix_web::test]
async fn without_hash_serves_the_current_version_of_the_site() {
    let dir = deployment();
    let metrics = Arc::new(MemoryMetrics::new());
    let app = service!(state(&dir, &metrics));

    let request = test::TestRequest::get()
        .uri("/w/skins/main.css")
        .insert_header((header::HOST, "en.wikipedia.org"))
        .to_request();
    let response = test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header_value(&response, header::CONTENT_TYPE), Some("text/css"));
    assert_eq!(
        header_value(&response, header::CACHE_CONTROL),
        Some("public, s-maxage=300, must-revalidate, max-age=86400")
    );
    assert_eq!(header_value(&response, header::ACCESS_CONTROL_ALLOW_ORIGIN), Some("*"));
    assert!(response.headers().contains_key(header::LAST_MODIFIED));
    assert_eq!(test::read_body(response).await, OLD_CSS.as_bytes());

    let request = test::TestRequest::get()
        .uri("/w/skins/main.css")
        .insert_header((header::HOST, "test.wikipedia.org:443"))
        .to_request();
    let response = test::call_service(&app, request).await;
    assert_eq!(test::read_body(response).await, NEW_CSS.as_bytes());

    assert_eq!(metrics.count("wmfstatic.success.nohash"), 2);
    assert_eq!(metrics.total(), 2);
}

#[actix_web::test]
async fn matching_hash_is_cached_long() {
    let dir = deployment();
    let metrics = Arc::new(MemoryMetrics::new());
    let app = service!(state(&dir, &metrics));

    let token = content_token_for_bytes(OLD_CSS.as_bytes());
    let request = test::TestRequest::get()
        .uri(&format!("/w/skins/main.css?{token}"))
        .insert_header((header::HOST, "test.wikipedia.org"))
        .to_request();
    let response = test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        header_value(&response, header::CACHE_CONTROL),
        Some("public, s-maxage=31536000, max-age=31536000")
    );
    assert_eq!(test::read_body(response).await, OLD_CSS.as_bytes());
    assert_eq!(metrics.count("wmfstatic.success.verified"), 1);
}

#[actix_web::test]
async fn unmatched_hash_falls_back_to_newest() {
    let dir = deployment();
    let metrics = Arc::new(MemoryMetrics::new());
    let app = service!(state(&dir, &metrics));

    let request = test::TestRequest::get()
        .uri("/w/skins/main.css?00000")
        .to_request();
    let response = test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        header_value(&response, header::CACHE_CONTROL),
        Some("public, s-maxage=300, must-revalidate, max-age=86400")
    );
    assert_eq!(test::read_body(response).await, NEW_CSS.as_bytes());
    assert_eq!(metrics.count("wmfstatic.mismatch"), 1);

    let request = test::TestRequest::get()
        .uri("/w/skins/main.css?abc")
        .to_request();
    let response = test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(metrics.count("wmfstatic.success.unknown"), 1);
}

#[actix_web::test]
async fn file_only_in_older_version_is_found() {
    let dir = deployment();
    let metrics = Arc::new(MemoryMetrics::new());
    let app = service!(state(&dir, &metrics));

    let request = test::TestRequest::get()
        .uri("/w/skins/only-old.js?12345")
        .to_request();
    let response = test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(test::read_body(response).await, "old();".as_bytes());
}

#[actix_web::test]
async fn missing_file_is_not_found() {
    let dir = deployment();
    let metrics = Arc::new(MemoryMetrics::new());
    let app = service!(state(&dir, &metrics));

    let request = test::TestRequest::get()
        .uri("/w/skins/missing.css")
        .to_request();
    let response = test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        header_value(&response, header::CACHE_CONTROL),
        Some("s-maxage=300, must-revalidate, max-age=0")
    );
    assert_eq!(test::read_body(response).await, "Unknown file path\n".as_bytes());
    assert_eq!(metrics.count("wmfstatic.notfound"), 1);
}

#[actix_web::test]
async fn bad_requests_are_rejected() {
    let dir = deployment();
    let metrics = Arc::new(MemoryMetrics::new());
    let app = service!(state(&dir, &metrics));

    let cases = [
        ("/w/static.php", "Invalid request\n"),
        ("/w/static.php/skins/main.css", "Invalid request\n"),
        ("/elsewhere/main.css", "Bad request\n"),
        ("/w/skins/../../wikiversions.json", "Bad request\n"),
        ("/w/../../etc/passwd", "Bad request\n"),
        ("/w/skins/../../../nothing-here.css", "Bad request\n"),
        ("/w/LocalSettings.php", "Invalid file type\n"),
        ("/w/skins", "Invalid file type\n"),
    ];
    for (uri, message) in cases {
        let request = test::TestRequest::get().uri(uri).to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(test::read_body(response).await, message.as_bytes(), "{uri}");
    }
    assert_eq!(metrics.count("wmfstatic.badrequest"), cases.len() as u64);
}

#[actix_web::test]
async fn unchanged_file_is_not_modified() {
    let dir = deployment();
    let metrics = Arc::new(MemoryMetrics::new());
    let app = service!(state(&dir, &metrics));

    let request = test::TestRequest::get()
        .uri("/w/skins/main.css")
        .insert_header((header::IF_MODIFIED_SINCE, "Fri, 01 Jan 2100 00:00:00 GMT"))
        .to_request();
    let response = test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
    assert!(response.headers().contains_key(header::CACHE_CONTROL));
    assert!(test::read_body(response).await.is_empty());

    let request = test::TestRequest::get()
        .uri("/w/skins/main.css")
        .insert_header((header::IF_MODIFIED_SINCE, "Thu, 01 Jan 1970 00:00:00 GMT"))
        .to_request();
    let response = test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(metrics.count("wmfstatic.success.nohash"), 2);
}

#[actix_web::test]
async fn no_deployed_versions_is_not_found() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join("wikiversions.json"), "{}").expect("write");
    let metrics = Arc::new(MemoryMetrics::new());
    let app = service!(state(&dir, &metrics));

    let request = test::TestRequest::get()
        .uri("/w/skins/main.css")
        .to_request();
    let response = test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(metrics.count("wmfstatic.noversions"), 1);
}

#[actix_web::test]
async fn head_is_routed() {
    let dir = deployment();
    let metrics = Arc::new(MemoryMetrics::new());
    let app = service!(state(&dir, &metrics));

    let request = test::TestRequest::default()
        .method(actix_web::http::Method::HEAD)
        .uri("/w/skins/main.css")
        .to_request();
    let response = test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header_value(&response, header::CONTENT_TYPE), Some("text/css"));
}
