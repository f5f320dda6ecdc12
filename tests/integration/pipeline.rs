//! Whole runs over both dependency lists: cleanup, filtering, aggregates and
//! failure handling.

use deps_pin::core::{PinError, user_friendly_error};
use deps_pin::test_utils::{DepsDir, init_test_logging};
use deps_pin::updater::{UpdateEvent, UpdateOptions, Updater};
use serde_json::json;
use wiremock::MockServer;

use crate::common::mount_json;

async fn mount_crate(server: &MockServer, name: &str, version: &str) {
    mount_json(
        server,
        &format!("/api/v1/crates/{name}"),
        json!({"versions": [{
            "num": version,
            "dl_path": format!("/api/v1/crates/{name}/{version}/download"),
            "checksum": format!("{name}-{version}-checksum"),
            "yanked": false
        }]}),
    )
    .await;
}

fn options(filter: Option<&str>) -> UpdateOptions {
    UpdateOptions {
        filter: filter.map(str::to_string),
        dry_run: false,
    }
}

const TWO_CRATES: &str = r#"{
    // runtime dependencies
    "repositories": [
        {"name": "zeta", "type": "crate"},
        {"name": "alpha-beta", "type": "crate"} // trailing comment
    ]
}"#;

#[tokio::test]
async fn test_aggregate_sorts_loads_and_keeps_call_order() {
    init_test_logging(None);
    let server = MockServer::start().await;
    mount_crate(&server, "zeta", "1.0.0").await;
    mount_crate(&server, "alpha-beta", "0.3.1").await;

    let deps = DepsDir::new().unwrap();
    deps.write_deps(TWO_CRATES).unwrap();
    let updater = Updater::new(&deps.settings(&server.uri()), options(None)).unwrap();
    updater.run(|_| {}).await.unwrap();

    let aggregate = deps.read_gen("deps.bzl").unwrap();
    let expected = format!(
        "{}\n\n\
         load(\"@//build/deps:gen/dep_alpha_beta.bzl\", \"dep_alpha_beta\")\n\
         load(\"@//build/deps:gen/dep_zeta.bzl\", \"dep_zeta\")\n\
         \n\
         def deps_gen():\n    dep_zeta()\n    dep_alpha_beta()\n",
        deps_pin::constants::AUTOGENERATED_MARKER
    );
    assert_eq!(aggregate, expected);
    assert!(deps.gen_exists("dep_zeta.bzl"));
    assert!(deps.gen_exists("dep_alpha_beta.bzl"));

    let build_aggregate = deps.read_gen("build_deps.bzl").unwrap();
    assert!(build_aggregate.contains("def deps_gen():\n    pass\n"));
}

#[tokio::test]
async fn test_runs_are_deterministic() {
    let server = MockServer::start().await;
    mount_crate(&server, "zeta", "1.0.0").await;
    mount_crate(&server, "alpha-beta", "0.3.1").await;

    let deps = DepsDir::new().unwrap();
    deps.write_deps(TWO_CRATES).unwrap();
    let updater = Updater::new(&deps.settings(&server.uri()), options(None)).unwrap();

    updater.run(|_| {}).await.unwrap();
    let first = (deps.read_gen("deps.bzl").unwrap(), deps.read_gen("dep_zeta.bzl").unwrap());
    updater.run(|_| {}).await.unwrap();
    let second = (deps.read_gen("deps.bzl").unwrap(), deps.read_gen("dep_zeta.bzl").unwrap());
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_unfiltered_run_removes_stale_fragments() {
    let server = MockServer::start().await;
    mount_crate(&server, "zeta", "1.0.0").await;

    let deps = DepsDir::new().unwrap();
    deps.write_deps(r#"{"repositories": [{"name": "zeta", "type": "crate"}]}"#).unwrap();
    std::fs::create_dir_all(deps.gen_dir()).unwrap();
    std::fs::write(deps.gen_dir().join("dep_removed.bzl"), "# old\n").unwrap();
    std::fs::write(deps.gen_dir().join("notes.txt"), "kept\n").unwrap();

    let mut removed = None;
    let updater = Updater::new(&deps.settings(&server.uri()), options(None)).unwrap();
    updater
        .run(|event| {
            if let UpdateEvent::StaleRemoved {
                count,
            } = event
            {
                removed = Some(*count);
            }
        })
        .await
        .unwrap();

    assert_eq!(removed, Some(1));
    assert!(!deps.gen_exists("dep_removed.bzl"));
    assert!(deps.gen_exists("notes.txt"));
    assert!(deps.gen_exists("dep_zeta.bzl"));
}

#[tokio::test]
async fn test_filtered_run_keeps_other_fragments() {
    let server = MockServer::start().await;
    mount_crate(&server, "alpha-beta", "0.3.1").await;

    let deps = DepsDir::new().unwrap();
    deps.write_deps(TWO_CRATES).unwrap();
    std::fs::create_dir_all(deps.gen_dir()).unwrap();
    std::fs::write(deps.gen_dir().join("dep_zeta.bzl"), "# previous run\n").unwrap();

    let mut skipped = Vec::new();
    let updater = Updater::new(&deps.settings(&server.uri()), options(Some("alpha"))).unwrap();
    let summary = updater
        .run(|event| {
            if let UpdateEvent::Skipped {
                name,
            } = event
            {
                skipped.push(name.clone());
            }
        })
        .await
        .unwrap();

    assert_eq!(summary.resolved, 1);
    assert_eq!(summary.skipped, 1);
    assert_eq!(skipped, vec!["zeta".to_string()]);
    assert_eq!(deps.read_gen("dep_zeta.bzl").unwrap(), "# previous run\n");
    assert!(deps.read_gen("dep_alpha_beta.bzl").unwrap().contains("VERSION = \"0.3.1\""));

    // The aggregate still lists every declared dependency.
    let aggregate = deps.read_gen("deps.bzl").unwrap();
    assert!(aggregate.contains("    dep_zeta()\n    dep_alpha_beta()\n"));
}

#[tokio::test]
async fn test_unsupported_type_stops_the_run_at_its_position() {
    let server = MockServer::start().await;
    mount_crate(&server, "first", "1.0.0").await;
    mount_crate(&server, "last", "1.0.0").await;

    let deps = DepsDir::new().unwrap();
    deps.write_deps(
        r#"{"repositories": [
            {"name": "first", "type": "crate"},
            {"name": "weird", "type": "svn", "url": "svn://example"},
            {"name": "last", "type": "crate"}
        ]}"#,
    )
    .unwrap();

    let updater = Updater::new(&deps.settings(&server.uri()), options(None)).unwrap();
    let err = updater.run(|_| {}).await.unwrap_err();

    let pin_error = err.chain().find_map(|cause| cause.downcast_ref::<PinError>()).unwrap();
    assert!(matches!(
        pin_error,
        PinError::UnsupportedStrategy { field, value, .. } if field == "type" && value == "svn"
    ));
    assert!(err.to_string().contains("Failed to update 'weird'"));

    assert!(deps.gen_exists("dep_first.bzl"));
    assert!(!deps.gen_exists("dep_last.bzl"));
    assert!(!deps.gen_exists("deps.bzl"));

    let context = user_friendly_error(err);
    assert!(context.suggestion.is_some());
}

#[tokio::test]
async fn test_dry_run_writes_nothing() {
    let server = MockServer::start().await;
    mount_crate(&server, "zeta", "1.0.0").await;

    let deps = DepsDir::new().unwrap();
    deps.write_deps(r#"{"repositories": [{"name": "zeta", "type": "crate"}]}"#).unwrap();
    std::fs::create_dir_all(deps.gen_dir()).unwrap();
    std::fs::write(deps.gen_dir().join("dep_old.bzl"), "# old\n").unwrap();

    let updater = Updater::new(
        &deps.settings(&server.uri()),
        UpdateOptions {
            filter: None,
            dry_run: true,
        },
    )
    .unwrap();
    let summary = updater.run(|_| {}).await.unwrap();

    assert_eq!(summary.resolved, 1);
    assert!(deps.gen_exists("dep_old.bzl"));
    assert!(!deps.gen_exists("dep_zeta.bzl"));
    assert!(!deps.gen_exists("deps.bzl"));
}

#[tokio::test]
async fn test_events_report_drift_per_dependency() {
    let server = MockServer::start().await;
    mount_json(
        &server,
        "/api/v1/crates/zeta",
        json!({"versions": [
            {"num": "1.1.0", "dl_path": "/dl/zeta/1.1.0", "checksum": "new", "yanked": false},
            {"num": "1.0.0", "dl_path": "/dl/zeta/1.0.0", "checksum": "old", "yanked": false}
        ]}),
    )
    .await;

    let deps = DepsDir::new().unwrap();
    deps.write_build_deps(r#"{"repositories": [{"name": "zeta", "type": "crate", "freeze_version": "1.0.0"}]}"#)
        .unwrap();

    let mut events = Vec::new();
    let updater = Updater::new(&deps.settings(&server.uri()), options(None)).unwrap();
    let summary = updater.run(|event| events.push(event.clone())).await.unwrap();

    assert_eq!(summary.drifted, 1);
    let drift = events
        .iter()
        .find_map(|event| match event {
            UpdateEvent::Resolved {
                dependency,
                ..
            } => dependency.drift.clone(),
            _ => None,
        })
        .unwrap();
    assert_eq!(drift.to_string(), "frozen, update available 1.0.0 -> 1.1.0");

    // The build list gets its own aggregate.
    assert!(deps.read_gen("build_deps.bzl").unwrap().contains("    dep_zeta()\n"));
    assert!(deps.read_gen("dep_zeta.bzl").unwrap().contains("SHA256 = \"old\""));
}

#[tokio::test]
async fn test_custom_lists_from_config() {
    let server = MockServer::start().await;
    mount_crate(&server, "zeta", "1.0.0").await;

    let deps = DepsDir::new().unwrap();
    std::fs::write(deps.path().join("tools.jsonc"), r#"{"repositories": [{"name": "zeta", "type": "crate"}]}"#)
        .unwrap();
    let config: deps_pin::config::ToolConfig = toml::from_str(
        r#"
        [[lists]]
        spec = "tools.jsonc"
        output = "tools.bzl"
        "#,
    )
    .unwrap();
    let mut settings = deps.settings(&server.uri());
    settings.tool.lists = config.lists;

    Updater::new(&settings, options(None)).unwrap().run(|_| {}).await.unwrap();
    assert!(deps.read_gen("tools.bzl").unwrap().contains("    dep_zeta()\n"));
    assert!(!deps.gen_exists("deps.bzl"));
}

#[tokio::test]
async fn test_malformed_list_is_reported_with_its_path() {
    let deps = DepsDir::new().unwrap();
    deps.write_deps(r#"{"repositories": [ {"name": "x" "type": "crate"} ]}"#).unwrap();

    let updater = Updater::new(&deps.settings("http://127.0.0.1:9"), options(None)).unwrap();
    let err = updater.run(|_| {}).await.unwrap_err();
    assert!(err.to_string().contains("deps.jsonc"));
}
