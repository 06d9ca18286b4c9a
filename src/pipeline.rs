//! End-to-end export run: login, bridge, discovery, export.

use crate::bridge::{build_client, snapshot_cookies};
use crate::config::ResolvedConfig;
use crate::discovery::discover_range;
use crate::errors::{AppError, AppResult};
use crate::export::export_all;
use crate::models::{Credentials, Period, RunSummary};
use crate::session::{Browser, Session};
use std::path::Path;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use url::Url;

/// Runs one full export with `browser` as the login session.
///
/// The browser is always released before this returns, whether the run
/// succeeds, fails at login, or is cancelled. Item-scoped failures (a diary
/// page, a single export) end up in the returned [`RunSummary`]; fatal ones
/// (`Authentication`, `Bridge`, cancellation during discovery) are returned
/// as errors.
pub async fn run_export<B: Browser>(
    mut browser: B,
    credentials: &Credentials,
    periods: &[Period],
    output_dir: &Path,
    config: &ResolvedConfig,
    cancel: &CancellationToken,
) -> AppResult<RunSummary> {
    let base_url = match Url::parse(&config.base_url) {
        Ok(url) => url,
        Err(e) => {
            if let Err(quit) = browser.quit().await {
                warn!(error = %quit, "Failed to close browser");
            }
            return Err(e.into());
        }
    };

    let started = Instant::now();
    let mut session = Session::new(browser, base_url, config);
    let result = drive(&mut session, credentials, periods, output_dir, config, cancel).await;
    close_session(&mut session).await;

    match &result {
        Ok(summary) => log_summary(summary, started.elapsed()),
        Err(e) => error!(error = %e, "Export run aborted"),
    }
    result
}

async fn drive<B: Browser>(
    session: &mut Session<B>,
    credentials: &Credentials,
    periods: &[Period],
    output_dir: &Path,
    config: &ResolvedConfig,
    cancel: &CancellationToken,
) -> AppResult<RunSummary> {
    info!("Starting login process");
    session.login(credentials).await?;

    let cookies = snapshot_cookies(session).await?;
    let client = build_client(&cookies, session.base_url(), config.request_timeout())?;

    info!(periods = periods.len(), "Starting discovery");
    let outcome = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(AppError::Cancelled),
        outcome = discover_range(session, periods) => outcome?,
    };

    // Exports only need the bridged client; free the browser early.
    close_session(session).await;

    info!(
        identifiers = outcome.identifiers.len(),
        "Preparing to export training sessions"
    );
    let report = export_all(
        &client,
        &outcome.identifiers,
        output_dir,
        config.concurrent_exports,
        cancel,
    )
    .await?;

    Ok(RunSummary {
        discovered: outcome.identifiers.len(),
        discovery_failures: outcome
            .failures
            .into_iter()
            .map(|(period, e)| (period, e.to_string()))
            .collect(),
        report,
    })
}

async fn close_session<B: Browser>(session: &mut Session<B>) {
    if let Err(e) = session.close().await {
        warn!(error = %e, "Failed to close browser session");
    }
}

fn log_summary(summary: &RunSummary, elapsed: Duration) {
    for (period, reason) in &summary.discovery_failures {
        warn!(period = %period, reason = %reason, "Diary page failed");
    }
    for (identifier, reason) in summary.report.failures() {
        warn!(identifier = %identifier, reason = reason, "Export failed");
    }
    info!(
        discovered = summary.discovered,
        succeeded = summary.report.succeeded(),
        failed = summary.report.len() - summary.report.succeeded(),
        failed_periods = summary.discovery_failures.len(),
        elapsed = %format_duration(elapsed),
        "Run finished"
    );
}

fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}
