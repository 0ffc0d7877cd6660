//! Importer integration tests against a scripted registry

use pkg_importer::importer::{ImportOptions, Importer, ResolutionState};
use pkg_importer::module::Resolution;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

mod common;
use common::*;

fn importer(client: &Arc<MockHttpClient>) -> Importer {
    Importer::new(test_config(), client.clone())
}

#[tokio::test]
async fn test_reimport_is_idempotent() {
    let client = Arc::new(MockHttpClient::new());
    publish(&client, "alpha", "1.0.0", &[]);
    let importer = importer(&client);

    let first = importer.import_batch(&["alpha@1.0.0"]).await;
    assert!(first.is_success());
    assert_eq!(first.succeeded_names(), vec!["alpha"]);

    let second = importer.import_batch(&["alpha@^1.0.0"]).await;
    assert!(second.is_success());
    assert_eq!(second.succeeded_names(), vec!["alpha"]);

    assert_eq!(client.hits(&cdn_manifest_url("alpha", "1.0.0")), 1);
    assert_eq!(client.hits(&cdn_file_url("alpha", "1.0.0", "index.js")), 1);
    assert_eq!(importer.state_of("alpha"), ResolutionState::Loaded);
}

#[tokio::test]
async fn test_dependency_cycle_terminates_with_warning() {
    let client = Arc::new(MockHttpClient::new());
    publish(&client, "a", "1.0.0", &[("b", "^1.0.0")]);
    publish(&client, "b", "1.0.0", &[("a", "1.0.0")]);
    let importer = importer(&client);

    let report = tokio::time::timeout(Duration::from_secs(5), importer.import_batch(&["a@1.0.0"]))
        .await
        .expect("cyclic import must terminate");

    assert!(report.is_success());
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.warnings[0].name, "a");
    assert_eq!(report.warnings[0].requested_by.as_deref(), Some("b"));
    assert_eq!(importer.state_of("a"), ResolutionState::Loaded);
    assert_eq!(importer.state_of("b"), ResolutionState::Loaded);
    assert_eq!(client.hits(&cdn_manifest_url("a", "1.0.0")), 1);
}

#[tokio::test]
async fn test_diamond_dependency_loads_each_package_once() {
    // Delayed responses keep c in flight while b reaches it
    let client = Arc::new(MockHttpClient::new().with_delay(Duration::from_millis(10)));
    publish(&client, "root", "1.0.0", &[("b", "1.0.0"), ("c", "1.0.0")]);
    publish(&client, "b", "1.0.0", &[("c", "1.0.0")]);
    publish(&client, "c", "1.0.0", &[]);
    let importer = importer(&client);

    let report = tokio::time::timeout(Duration::from_secs(5), importer.import_batch(&["root@1.0.0"]))
        .await
        .expect("diamond import must terminate");

    assert!(report.is_success());
    let mut names = report.succeeded_names();
    names.sort_unstable();
    assert_eq!(names, vec!["b", "c", "root"]);
    assert!(report.warnings.is_empty());
    assert_eq!(report.concurrent_skips.len(), 1);
    assert_eq!(report.concurrent_skips[0].name, "c");
    assert_eq!(report.concurrent_skips[0].requested_by.as_deref(), Some("b"));
    for name in ["root", "b", "c"] {
        assert_eq!(client.hits(&cdn_manifest_url(name, "1.0.0")), 1, "{}", name);
        assert_eq!(client.hits(&cdn_file_url(name, "1.0.0", "index.js")), 1, "{}", name);
        assert_eq!(importer.state_of(name), ResolutionState::Loaded);
    }
}

#[tokio::test]
async fn test_failed_and_successful_specifiers_reported_separately() {
    let client = Arc::new(MockHttpClient::new());
    publish(&client, "present", "2.0.0", &[]);
    let importer = importer(&client);

    let report = importer
        .import_batch(&["missing@1.0.0", "present@2.0.0"])
        .await;

    assert!(!report.is_success());
    assert_eq!(report.failed_names(), vec!["missing"]);
    assert_eq!(report.succeeded_names(), vec!["present"]);
    let message = report.failed[0].error_message.clone().unwrap();
    assert!(message.contains("404"), "unexpected message: {}", message);
    // CDN first, then the registry API.
    assert_eq!(client.hits(&cdn_manifest_url("missing", "1.0.0")), 1);
    assert_eq!(client.hits(&registry_api_url("missing", "1.0.0")), 1);
    assert!(matches!(
        importer.state_of("missing"),
        ResolutionState::Failed(_)
    ));
}

#[tokio::test]
async fn test_clear_all_forces_fresh_fetch() {
    let client = Arc::new(MockHttpClient::new());
    publish(&client, "alpha", "1.0.0", &[]);
    let importer = importer(&client);

    importer.import_batch(&["alpha@1.0.0"]).await;
    let before = importer.resolve_module("alpha").unwrap();

    importer.clear_all();
    assert!(importer.list_loaded().is_empty());
    assert_eq!(importer.state_of("alpha"), ResolutionState::NotStarted);
    // Handed-out records survive the clear.
    assert_eq!(before.logical_name, "alpha");

    let report = importer.import_batch(&["alpha@1.0.0"]).await;
    assert!(report.is_success());
    assert_eq!(client.hits(&cdn_manifest_url("alpha", "1.0.0")), 2);
    let after = importer.resolve_module("alpha").unwrap();
    assert!(!Arc::ptr_eq(&before, &after));
}

#[tokio::test]
async fn test_dependency_failure_does_not_fail_parent() {
    let client = Arc::new(MockHttpClient::new());
    publish(
        &client,
        "parent",
        "1.0.0",
        &[("good-dep", "1.0.0"), ("bad-dep", "1.0.0")],
    );
    publish(&client, "good-dep", "1.0.0", &[]);
    let importer = importer(&client);

    let report = importer.import_batch(&["parent@1.0.0"]).await;

    let mut succeeded = report.succeeded_names();
    succeeded.sort();
    assert_eq!(succeeded, vec!["good-dep", "parent"]);
    assert_eq!(report.failed_names(), vec!["bad-dep"]);
    let message = report.failed[0].error_message.clone().unwrap();
    assert!(
        message.contains("Dependency bad-dep of parent failed"),
        "unexpected message: {}",
        message
    );
    assert_eq!(importer.state_of("parent"), ResolutionState::Loaded);
}

#[tokio::test]
async fn test_entry_failure_is_fatal_and_remembered() {
    let client = Arc::new(MockHttpClient::new());
    client.respond_json(
        cdn_manifest_url("hollow", "1.0.0"),
        &json!({ "name": "hollow", "version": "1.0.0" }),
    );
    let importer = importer(&client);

    let report = importer.import_batch(&["hollow@1.0.0"]).await;
    assert_eq!(report.failed_names(), vec!["hollow"]);
    assert!(matches!(importer.state_of("hollow"), ResolutionState::Failed(_)));
    assert!(importer.resolve_module("hollow").is_none());

    // The failure is terminal until cleared: no new fetches.
    let again = importer.import_batch(&["hollow@1.0.0"]).await;
    assert_eq!(again.failed_names(), vec!["hollow"]);
    assert_eq!(client.hits(&cdn_file_url("hollow", "1.0.0", "index.js")), 1);
}

#[tokio::test]
async fn test_compile_error_is_fatal() {
    let client = Arc::new(MockHttpClient::new());
    client.respond_json(
        cdn_manifest_url("broken", "1.0.0"),
        &json!({ "name": "broken", "version": "1.0.0" }),
    );
    client.respond(
        cdn_file_url("broken", "1.0.0", "index.js"),
        200,
        "module.exports = function (",
    );
    let importer = importer(&client);

    let report = importer.import_batch(&["broken@1.0.0"]).await;
    assert_eq!(report.failed_names(), vec!["broken"]);
    let message = report.failed[0].error_message.clone().unwrap();
    assert!(message.contains("compile"), "unexpected message: {}", message);
}

#[tokio::test]
async fn test_dependency_groups_bounded_by_max_concurrency() {
    let client = Arc::new(MockHttpClient::new().with_delay(Duration::from_millis(20)));
    let deps: Vec<(String, String)> = (0..6)
        .map(|i| (format!("leaf{}", i), "1.0.0".to_string()))
        .collect();
    let dep_refs: Vec<(&str, &str)> = deps
        .iter()
        .map(|(n, v)| (n.as_str(), v.as_str()))
        .collect();
    publish(&client, "root", "1.0.0", &dep_refs);
    for (name, version) in &deps {
        publish(&client, name, version, &[]);
    }

    let mut config = test_config();
    config.max_concurrency = 2;
    let importer = Importer::new(config, client.clone());

    let report = importer.import_batch(&["root@1.0.0"]).await;
    assert!(report.is_success());
    assert_eq!(report.succeeded.len(), 7);
    assert_eq!(client.peak_concurrency(), 2);
}

#[tokio::test]
async fn test_registry_api_fallback() {
    let client = Arc::new(MockHttpClient::new());
    client.respond_json(
        registry_api_url("fallback", "3.1.0"),
        &json!({ "name": "fallback", "version": "3.1.0", "main": "lib/main" }),
    );
    client.respond(
        cdn_file_url("fallback", "3.1.0", "lib/main.js"),
        200,
        "module.exports = 3;",
    );
    let importer = importer(&client);

    let report = importer.import_batch(&["fallback@3.1.0"]).await;
    assert!(report.is_success());
    assert_eq!(client.hits(&cdn_manifest_url("fallback", "3.1.0")), 1);
    let record = importer.resolve_module("fallback").unwrap();
    assert_eq!(
        record.storage_path,
        PathBuf::from("virtual_modules/fallback/lib/main.js")
    );
}

#[tokio::test]
async fn test_module_entry_preferred_over_main() {
    let client = Arc::new(MockHttpClient::new());
    client.respond_json(
        cdn_manifest_url("dual", "1.0.0"),
        &json!({
            "name": "dual",
            "version": "1.0.0",
            "module": "dist/dual.mjs",
            "main": "dist/dual.cjs",
        }),
    );
    client.respond(
        cdn_file_url("dual", "1.0.0", "dist/dual.mjs"),
        200,
        "export default 1;",
    );
    let importer = importer(&client);

    let report = importer.import_batch(&["dual@1.0.0"]).await;
    assert!(report.is_success());
    assert_eq!(client.hits(&cdn_file_url("dual", "1.0.0", "dist/dual.cjs")), 0);
    let record = importer.resolve_module("dual").unwrap();
    assert_eq!(
        record.source_url,
        cdn_file_url("dual", "1.0.0", "dist/dual.mjs")
    );
}

#[tokio::test]
async fn test_alias_registers_under_alias() {
    let client = Arc::new(MockHttpClient::new());
    publish(&client, "left-pad", "1.3.0", &[]);
    let importer = importer(&client);

    let report = importer.import_batch(&["pad@npm:left-pad@1.3.0"]).await;
    assert_eq!(report.succeeded_names(), vec!["pad"]);
    assert!(importer.resolve_module("pad").is_some());
    assert!(importer.resolve_module("left-pad").is_none());

    let loaded = importer.list_loaded();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].name, "pad");
    assert!(loaded[0].is_loaded);
    assert_eq!(
        loaded[0].storage_path,
        PathBuf::from("virtual_modules/pad/index.js")
    );
}

#[tokio::test]
async fn test_yarn_manifest_from_yarn_registry() {
    let client = Arc::new(MockHttpClient::new());
    client.respond_json(
        format!("{}/tiny/2.0.0", YARN_REGISTRY),
        &json!({ "name": "tiny", "version": "2.0.0" }),
    );
    client.respond(
        cdn_file_url("tiny", "2.0.0", "index.js"),
        200,
        "module.exports = 'tiny';",
    );
    let importer = importer(&client);

    let report = importer.import_batch(&["yarn:tiny@2.0.0"]).await;
    assert!(report.is_success());
    assert_eq!(client.hits(&cdn_manifest_url("tiny", "2.0.0")), 0);
}

#[tokio::test]
async fn test_loaded_dependencies_resolve_transitively() {
    let client = Arc::new(MockHttpClient::new());
    publish(&client, "app", "1.0.0", &[("lib", "1.0.0")]);
    publish(&client, "lib", "1.0.0", &[]);
    let importer = importer(&client);

    importer.import_batch(&["app@1.0.0"]).await;

    let app = importer.resolve_module("app").unwrap();
    assert_eq!(app.compiled.requests(), ["lib".to_string()]);
    match app.compiled.require("lib") {
        Some(Resolution::Virtual(record)) => assert_eq!(record.logical_name, "lib"),
        other => panic!("expected lib from the registry, got {:?}", other),
    }
    assert!(importer.require("unknown").is_none());
}

#[tokio::test]
async fn test_force_reload_refetches() {
    let client = Arc::new(MockHttpClient::new());
    publish(&client, "alpha", "1.0.0", &[]);
    let importer = importer(&client);

    importer.import_batch(&["alpha@1.0.0"]).await;
    let report = importer
        .import_batch_with(&["alpha@1.0.0"], &ImportOptions { force_reload: true })
        .await;
    assert!(report.is_success());
    assert_eq!(client.hits(&cdn_manifest_url("alpha", "1.0.0")), 2);
    assert_eq!(client.hits(&cdn_file_url("alpha", "1.0.0", "index.js")), 2);
}

#[tokio::test]
async fn test_empty_specifier_fails_without_fetching() {
    let client = Arc::new(MockHttpClient::new());
    let importer = importer(&client);

    let report = importer.import_batch(&[""]).await;
    assert_eq!(report.failed.len(), 1);
    assert_eq!(client.total_hits(), 0);
}

#[tokio::test]
async fn test_github_falls_back_to_master() {
    let client = Arc::new(MockHttpClient::new());
    client.respond_json(
        github_url("acme", "widget", "master", "package.json"),
        &json!({ "name": "widget", "main": "lib/index.js" }),
    );
    client.respond(
        github_url("acme", "widget", "master", "lib/index.js"),
        200,
        "export const widget = true;",
    );
    let importer = importer(&client);

    let report = importer.import_batch(&["github:acme/widget"]).await;
    assert!(report.is_success(), "{:?}", report.failed);
    assert_eq!(
        client.hits(&github_url("acme", "widget", "main", "package.json")),
        1
    );
    let record = importer.resolve_module("acme/widget").unwrap();
    assert_eq!(
        record.source_url,
        github_url("acme", "widget", "master", "lib/index.js")
    );
}

#[tokio::test]
async fn test_github_branch_needs_manifest_and_entry() {
    let client = Arc::new(MockHttpClient::new());
    // main has a manifest but no entry file; master has neither.
    client.respond_json(
        github_url("acme", "ghost", "main", "package.json"),
        &json!({ "name": "ghost" }),
    );
    let importer = importer(&client);

    let report = importer.import_batch(&["github:acme/ghost"]).await;
    assert_eq!(report.failed_names(), vec!["acme/ghost"]);
    let message = report.failed[0].error_message.clone().unwrap();
    assert!(message.contains("no usable branch"), "unexpected message: {}", message);
    assert_eq!(
        client.hits(&github_url("acme", "ghost", "main", "index.js")),
        1
    );
    assert_eq!(
        client.hits(&github_url("acme", "ghost", "master", "package.json")),
        1
    );
}

#[tokio::test]
async fn test_independent_importers_do_not_share_state() {
    let client = Arc::new(MockHttpClient::new());
    publish(&client, "alpha", "1.0.0", &[]);
    let first = importer(&client);
    let second = importer(&client);

    first.import_batch(&["alpha@1.0.0"]).await;
    assert_eq!(second.state_of("alpha"), ResolutionState::NotStarted);
    assert!(second.resolve_module("alpha").is_none());
}
