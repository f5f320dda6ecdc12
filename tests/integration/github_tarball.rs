//! `github_tarball` dependencies, plus forge API behaviour shared by every
//! GitHub-backed type: authentication and rate limiting.

use deps_pin::archive::ArchiveType;
use deps_pin::core::PinError;
use deps_pin::net::sha256_hex;
use deps_pin::resolver::{Artifact, Reference};
use deps_pin::test_utils::archives;
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::{mount_bytes, mount_json, requested_paths, resolver, resolver_with_token, spec};

const HEAD: &str = "4f2e8a1c9b7d6e5f4a3b2c1d0e9f8a7b6c5d4e3f";
const OLD: &str = "0123456789abcdef0123456789abcdef01234567";
const COMMITS_MASTER: &str = "/repos/acme/lib/commits/master";

fn forge_tarball(commit: &str) -> Vec<u8> {
    let dir = format!("acme-lib-{}/", &commit[..7]);
    let file = format!("acme-lib-{}/src/lib.c", &commit[..7]);
    archives::tar_gz(&[(dir.as_str(), b""), (file.as_str(), b"int x;\n")])
}

#[tokio::test]
async fn test_branch_head_is_pinned() {
    let server = MockServer::start().await;
    mount_json(&server, COMMITS_MASTER, json!({"sha": HEAD, "commit": {"message": "ignored"}})).await;
    let content = forge_tarball(HEAD);
    mount_bytes(&server, &format!("/acme/lib/tarball/{HEAD}"), content.clone()).await;

    let resolved = resolver(&server)
        .resolve(&spec(r#"{"name": "lib", "type": "github_tarball", "owner": "acme", "repo": "lib"}"#))
        .await
        .unwrap();

    assert_eq!(resolved.reference, Reference::Commit(HEAD.to_string()));
    assert!(resolved.drift.is_none());
    assert_eq!(
        resolved.artifact,
        Artifact::Archive {
            url: format!("{}/acme/lib/tarball/{HEAD}", server.uri()),
            archive_type: ArchiveType::Tgz,
            strip_prefix: "acme-lib-4f2e8a1".to_string(),
            sha256: sha256_hex(&content),
        }
    );
}

#[tokio::test]
async fn test_extra_strip_prefix_and_branch() {
    let server = MockServer::start().await;
    mount_json(&server, "/repos/acme/lib/commits/stable", json!({"sha": HEAD})).await;
    mount_bytes(&server, &format!("/acme/lib/tarball/{HEAD}"), forge_tarball(HEAD)).await;

    let resolved = resolver(&server)
        .resolve(&spec(
            r#"{"name": "lib", "type": "github_tarball", "owner": "acme", "repo": "lib",
                "branch": "stable", "extra_strip_prefix": "/src"}"#,
        ))
        .await
        .unwrap();

    match resolved.artifact {
        Artifact::Archive {
            strip_prefix,
            ..
        } => assert_eq!(strip_prefix, "acme-lib-4f2e8a1/src"),
        other => panic!("unexpected artifact {other:?}"),
    }
}

#[tokio::test]
async fn test_pins_win_over_upstream() {
    let server = MockServer::start().await;
    mount_json(&server, COMMITS_MASTER, json!({"sha": HEAD})).await;

    let resolved = resolver(&server)
        .resolve(&spec(&format!(
            r#"{{"name": "lib", "type": "github_tarball", "owner": "acme", "repo": "lib",
                "freeze_commit": "{OLD}", "freeze_sha256": "feedface"}}"#
        )))
        .await
        .unwrap();

    assert_eq!(resolved.reference, Reference::Commit(OLD.to_string()));
    assert_eq!(resolved.artifact.sha256(), Some("feedface"));
    match &resolved.artifact {
        Artifact::Archive {
            url,
            strip_prefix,
            ..
        } => {
            assert!(url.ends_with(&format!("/acme/lib/tarball/{OLD}")));
            assert_eq!(strip_prefix, "acme-lib-0123456");
        }
        other => panic!("unexpected artifact {other:?}"),
    }
    assert_eq!(resolved.drift.unwrap().to_string(), "frozen, update available 0123456 -> 4f2e8a1");
    // Fully pinned: only the branch head was looked up.
    assert_eq!(requested_paths(&server).await, vec![COMMITS_MASTER.to_string()]);
}

#[tokio::test]
async fn test_frozen_commit_equal_to_head_is_not_drift() {
    let server = MockServer::start().await;
    mount_json(&server, COMMITS_MASTER, json!({"sha": HEAD})).await;
    mount_bytes(&server, &format!("/acme/lib/tarball/{HEAD}"), forge_tarball(HEAD)).await;

    let resolved = resolver(&server)
        .resolve(&spec(&format!(
            r#"{{"name": "lib", "type": "github_tarball", "owner": "acme", "repo": "lib",
                "freeze_commit": "{HEAD}"}}"#
        )))
        .await
        .unwrap();
    assert!(resolved.drift.is_none());
}

#[tokio::test]
async fn test_rate_limit_is_classified() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(COMMITS_MASTER))
        .respond_with(ResponseTemplate::new(403).insert_header("x-ratelimit-reset", "1700000000"))
        .mount(&server)
        .await;

    let record = r#"{"name": "lib", "type": "github_tarball", "owner": "acme", "repo": "lib"}"#;

    let err = resolver(&server).resolve(&spec(record)).await.unwrap_err();
    match err {
        PinError::RateLimited {
            reset_at,
            authenticated,
        } => {
            assert_eq!(reset_at.timestamp(), 1_700_000_000);
            assert!(!authenticated);
        }
        other => panic!("unexpected {other:?}"),
    }

    let err = resolver_with_token(&server, Some("t0k3n")).resolve(&spec(record)).await.unwrap_err();
    assert!(matches!(
        err,
        PinError::RateLimited {
            authenticated: true,
            ..
        }
    ));
}

#[tokio::test]
async fn test_forbidden_without_reset_header_is_plain_http_error() {
    let server = MockServer::start().await;
    crate::common::mount_status(&server, COMMITS_MASTER, 403).await;

    let err = resolver(&server)
        .resolve(&spec(r#"{"name": "lib", "type": "github_tarball", "owner": "acme", "repo": "lib"}"#))
        .await
        .unwrap_err();
    assert!(matches!(err, PinError::HttpStatus { status: 403, .. }));
}

#[tokio::test]
async fn test_token_is_sent_to_the_api_only() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(COMMITS_MASTER))
        .and(header("authorization", "Bearer t0k3n"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"sha": HEAD})))
        .mount(&server)
        .await;
    mount_bytes(&server, &format!("/acme/lib/tarball/{HEAD}"), forge_tarball(HEAD)).await;

    resolver_with_token(&server, Some("t0k3n"))
        .resolve(&spec(r#"{"name": "lib", "type": "github_tarball", "owner": "acme", "repo": "lib"}"#))
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    let download = requests.iter().find(|r| r.url.path().contains("/tarball/")).unwrap();
    assert!(download.headers.get("authorization").is_none());
}

#[tokio::test]
async fn test_malformed_commit_response() {
    let server = MockServer::start().await;
    mount_json(&server, COMMITS_MASTER, json!({"message": "Not a commit"})).await;

    let err = resolver(&server)
        .resolve(&spec(r#"{"name": "lib", "type": "github_tarball", "owner": "acme", "repo": "lib"}"#))
        .await
        .unwrap_err();
    assert!(matches!(err, PinError::InvalidResponse { .. }));
}
