//! End-to-end runs with a scripted browser and a mock export endpoint

#[path = "common/mod.rs"]
mod common;

use common::*;
use polar_flow_cli::errors::AppError;
use polar_flow_cli::models::{Credentials, Period};
use polar_flow_cli::pipeline::run_export;
use secrecy::SecretString;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn credentials() -> Credentials {
    Credentials::new("runner@example.com", SecretString::new("hunter2".into()))
}

async fn mount_export(server: &MockServer, id: &str, filename: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/api/export/training/csv/{id}")))
        .and(header("cookie", "SESSION=abc"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header(
                    "Content-Disposition",
                    format!(r#"attachment; filename="{filename}""#).as_str(),
                )
                .set_body_string(format!("export of {id}\n")),
        )
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_run_exports_discovered_sessions() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_export(&server, "1001", "run_2022-09-27_06-35-25.CSV").await;
    mount_export(&server, "1002", "ride_2022-09-28_17-00-00.CSV").await;

    let browser = ScriptedBrowser::new(&base)
        .with_page(
            format!("{base}/diary/2022/month/9"),
            diary_page(&["/training/analysis2/1001", "/training/analysis2/1002"]),
        )
        .with_failing_url(format!("{base}/diary/2022/month/10"));
    let log = browser.log();
    let out = TempDir::new().unwrap();
    let periods = vec![Period::new(2022, 9).unwrap(), Period::new(2022, 10).unwrap()];

    let summary = run_export(
        browser,
        &credentials(),
        &periods,
        out.path(),
        &test_config(&base),
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(summary.discovered, 2);
    assert_eq!(summary.report.succeeded(), 2);
    assert_eq!(summary.discovery_failures.len(), 1);
    assert_eq!(summary.discovery_failures[0].0, Period::new(2022, 10).unwrap());
    assert_eq!(
        std::fs::read_to_string(out.path().join("run_2022-09-27_06-35-25.CSV")).unwrap(),
        "export of 1001\n"
    );
    assert!(out.path().join("ride_2022-09-28_17-00-00.CSV").exists());
    assert_eq!(log.lock().unwrap().quit_calls, 1);
}

#[tokio::test]
async fn test_empty_month_exports_nothing() {
    let server = MockServer::start().await;
    let base = server.uri();
    let browser = ScriptedBrowser::new(&base);
    let log = browser.log();
    let tmp = TempDir::new().unwrap();
    let out = tmp.path().join("exports");

    let summary = run_export(
        browser,
        &credentials(),
        &[Period::new(2022, 2).unwrap()],
        &out,
        &test_config(&base),
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(summary.discovered, 0);
    assert!(summary.report.is_empty());
    assert!(!out.exists());
    assert_eq!(log.lock().unwrap().quit_calls, 1);
}

#[tokio::test]
async fn test_failed_login_aborts_and_releases_browser() {
    let server = MockServer::start().await;
    let base = server.uri();
    let browser = ScriptedBrowser::new(&base).login_lands_on(format!("{base}/login"));
    let log = browser.log();
    let out = TempDir::new().unwrap();

    let result = run_export(
        browser,
        &credentials(),
        &Period::months_of(2022),
        out.path(),
        &test_config(&base),
        &CancellationToken::new(),
    )
    .await;

    assert!(matches!(result, Err(AppError::Authentication(_))));
    let log = log.lock().unwrap();
    assert_eq!(log.quit_calls, 1);
    // Nothing past the login page was visited
    assert_eq!(log.visited, vec![format!("{base}/login")]);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_cancelled_run_stops_before_discovery() {
    let server = MockServer::start().await;
    let base = server.uri();
    let browser = ScriptedBrowser::new(&base);
    let log = browser.log();
    let out = TempDir::new().unwrap();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = run_export(
        browser,
        &credentials(),
        &Period::months_of(2022),
        out.path(),
        &test_config(&base),
        &cancel,
    )
    .await;

    assert!(matches!(result, Err(AppError::Cancelled)));
    assert_eq!(log.lock().unwrap().quit_calls, 1);
}

#[tokio::test]
async fn test_invalid_base_url_still_quits_browser() {
    let browser = ScriptedBrowser::new("http://unused");
    let log = browser.log();
    let out = TempDir::new().unwrap();

    let result = run_export(
        browser,
        &credentials(),
        &[Period::new(2022, 1).unwrap()],
        out.path(),
        &test_config("not a url"),
        &CancellationToken::new(),
    )
    .await;

    assert!(matches!(result, Err(AppError::InvalidInput(_))));
    assert_eq!(log.lock().unwrap().quit_calls, 1);
}
