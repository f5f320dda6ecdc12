//! Shared helpers: spec parsing, resolvers pointed at a mock server, and
//! canned upstream responses.

use deps_pin::config::{Endpoints, Settings};
use deps_pin::manifest::{DependencySpec, RawDependency};
use deps_pin::resolver::Resolver;
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Parse one dependency record.
pub fn spec(record: &str) -> DependencySpec {
    let raw: RawDependency = serde_json::from_str(record).expect("valid record");
    raw.parse().expect("supported record")
}

/// Resolver with every endpoint on the mock server and no token.
pub fn resolver(server: &MockServer) -> Resolver {
    resolver_with_token(server, None)
}

/// Resolver with every endpoint on the mock server.
pub fn resolver_with_token(server: &MockServer, token: Option<&str>) -> Resolver {
    let settings = Settings::new(std::env::temp_dir())
        .with_endpoints(Endpoints::single_host(&server.uri()))
        .with_token(token.map(str::to_string));
    Resolver::new(&settings).expect("resolver")
}

/// Answer GET `route` with a JSON body.
pub async fn mount_json(server: &MockServer, route: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Answer GET `route` with raw bytes.
pub async fn mount_bytes(server: &MockServer, route: &str, body: Vec<u8>) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
        .mount(server)
        .await;
}

/// Answer GET `route` with an empty error response.
pub async fn mount_status(server: &MockServer, route: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// Download route of a release asset.
pub fn asset_route(tag: &str, name: &str) -> String {
    format!("/dl/{tag}/{name}")
}

/// Release JSON whose assets download from [`asset_route`] on the server.
pub fn release_json(server: &MockServer, tag: &str, assets: &[&str], tarball_url: Option<&str>) -> Value {
    let assets: Vec<Value> = assets
        .iter()
        .map(|name| {
            json!({
                "name": name,
                "browser_download_url": format!("{}{}", server.uri(), asset_route(tag, name)),
            })
        })
        .collect();
    json!({
        "tag_name": tag,
        "prerelease": false,
        "assets": assets,
        "tarball_url": tarball_url,
    })
}

/// Paths the server was asked for, in order.
pub async fn requested_paths(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|r| r.url.path().to_string())
        .collect()
}
