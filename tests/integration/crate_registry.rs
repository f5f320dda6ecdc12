//! `crate` dependencies against a mock registry.

use deps_pin::core::PinError;
use deps_pin::resolver::{Artifact, Reference};
use deps_pin::test_utils::{DepsDir, init_test_logging};
use deps_pin::updater::{UpdateOptions, Updater};
use serde_json::json;
use wiremock::MockServer;

use crate::common::{mount_json, requested_paths, resolver, spec};

const SUM_2_0_0: &str = "2e0c5bd1bd6d3cc8bd9e7c7e6d04c2be5b0b3f3c6d8b3f4e7e3d9a1b5c6d7e8f";
const SUM_1_9_0: &str = "19c0ffee19c0ffee19c0ffee19c0ffee19c0ffee19c0ffee19c0ffee19c0ffee";

async fn mount_foo(server: &MockServer) {
    mount_json(
        server,
        "/api/v1/crates/foo",
        json!({
            "crate": {"id": "foo"},
            "versions": [
                {"num": "2.0.0", "dl_path": "/api/v1/crates/foo/2.0.0/download", "checksum": SUM_2_0_0, "yanked": false},
                {"num": "1.9.0", "dl_path": "/api/v1/crates/foo/1.9.0/download", "checksum": SUM_1_9_0, "yanked": false}
            ]
        }),
    )
    .await;
}

#[tokio::test]
async fn test_crate_end_to_end_emits_newest_version() {
    init_test_logging(None);
    let server = MockServer::start().await;
    mount_foo(&server).await;

    let deps = DepsDir::new().unwrap();
    deps.write_deps(r#"{"repositories": [{"name": "foo", "type": "crate"}]}"#).unwrap();

    let updater = Updater::new(&deps.settings(&server.uri()), UpdateOptions::default()).unwrap();
    let summary = updater.run(|_| {}).await.unwrap();
    assert_eq!(summary.resolved, 1);
    assert_eq!(summary.drifted, 0);

    let fragment = deps.read_gen("dep_foo.bzl").unwrap();
    assert!(fragment.contains(&format!("URL = \"{}/api/v1/crates/foo/2.0.0/download\"\n", server.uri())));
    assert!(fragment.contains("STRIP_PREFIX = \"foo-2.0.0\"\n"));
    assert!(fragment.contains(&format!("SHA256 = \"{SUM_2_0_0}\"\n")));
    assert!(fragment.contains("TYPE = \"tgz\"\nVERSION = \"2.0.0\"\n"));
    assert!(!fragment.contains("1.9.0"));

    // The checksum comes from the registry; the package is never downloaded.
    assert_eq!(requested_paths(&server).await, vec!["/api/v1/crates/foo".to_string()]);
}

#[tokio::test]
async fn test_frozen_crate_version_wins_and_reports_drift() {
    let server = MockServer::start().await;
    mount_foo(&server).await;

    let resolved = resolver(&server)
        .resolve(&spec(r#"{"name": "foo", "type": "crate", "freeze_version": "1.9.0"}"#))
        .await
        .unwrap();

    assert_eq!(resolved.reference, Reference::Version("1.9.0".to_string()));
    assert_eq!(resolved.artifact.sha256(), Some(SUM_1_9_0));
    match &resolved.artifact {
        Artifact::Archive {
            strip_prefix,
            ..
        } => assert_eq!(strip_prefix, "foo-1.9.0"),
        other => panic!("unexpected artifact {other:?}"),
    }
    let drift = resolved.drift.unwrap();
    assert_eq!(drift.to_string(), "frozen, update available 1.9.0 -> 2.0.0");
}

#[tokio::test]
async fn test_unknown_frozen_version_fails() {
    let server = MockServer::start().await;
    mount_foo(&server).await;

    let err = resolver(&server)
        .resolve(&spec(r#"{"name": "foo", "type": "crate", "freeze_version": "3.0.0"}"#))
        .await
        .unwrap_err();
    assert!(matches!(err, PinError::FrozenVersionNotFound { ref version, .. } if version == "3.0.0"));
}

#[tokio::test]
async fn test_unknown_crate_is_http_error() {
    let server = MockServer::start().await;
    crate::common::mount_status(&server, "/api/v1/crates/nope", 404).await;

    let err = resolver(&server).resolve(&spec(r#"{"name": "nope", "type": "crate"}"#)).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_crate_without_versions_is_invalid_response() {
    let server = MockServer::start().await;
    mount_json(&server, "/api/v1/crates/ghost", json!({"versions": []})).await;

    let err = resolver(&server)
        .resolve(&spec(r#"{"name": "ghost", "type": "crate", "freeze_version": "1.0.0"}"#))
        .await
        .unwrap_err();
    assert!(matches!(err, PinError::InvalidResponse { .. }));
}

#[tokio::test]
async fn test_yanked_newest_still_resolves() {
    let server = MockServer::start().await;
    mount_json(
        &server,
        "/api/v1/crates/bar",
        json!({"versions": [
            {"num": "0.2.0", "dl_path": "/api/v1/crates/bar/0.2.0/download", "checksum": "aa", "yanked": true},
            {"num": "0.1.0", "dl_path": "/api/v1/crates/bar/0.1.0/download", "checksum": "bb", "yanked": false}
        ]}),
    )
    .await;

    let resolved = resolver(&server).resolve(&spec(r#"{"name": "bar", "type": "crate"}"#)).await.unwrap();
    assert_eq!(resolved.reference.as_str(), "0.2.0");
}
