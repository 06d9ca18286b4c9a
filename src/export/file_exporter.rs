use super::filename::filename_from_content_disposition;
use crate::bridge::FlowClient;
use crate::constants::LOGIN_PATH;
use crate::errors::{AppError, AppResult};
use crate::models::{ExportReport, ExportResult, ResourceIdentifier};
use crate::ui;
use reqwest::header::CONTENT_DISPOSITION;
use reqwest::StatusCode;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Distinguishes temp files when the same filename is exported twice at once.
static TMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// Exports one training session into `output_dir`.
///
/// Fetches the CSV export, takes the filename from `Content-Disposition`, and
/// writes the body verbatim to `output_dir/filename`, replacing any existing
/// file of that name. The body goes to a `.part` file first and is renamed
/// into place, so a failed write never leaves a truncated export behind.
///
/// # Errors
///
/// - `Unauthorized` on HTTP 401/403 or a redirect back to the login page
/// - `Network` on transport failures and other non-2xx statuses
/// - `ExportFormat` if the filename header is missing or malformed; nothing is written
/// - `Io` if the file cannot be written
pub async fn export_one(
    client: &FlowClient,
    identifier: &ResourceIdentifier,
    output_dir: &Path,
) -> AppResult<ExportResult> {
    let (filename, body) = fetch_export(client, identifier).await?;
    write_export(output_dir, &filename, &body).await?;
    debug!(identifier = %identifier, filename = %filename, bytes = body.len(), "Export written");

    Ok(ExportResult::succeeded(identifier.clone(), filename))
}

/// Network half of [`export_one`]: `(filename, body)` with nothing on disk yet.
async fn fetch_export(
    client: &FlowClient,
    identifier: &ResourceIdentifier,
) -> AppResult<(String, String)> {
    let url = client.export_url(identifier)?;
    debug!(identifier = %identifier, url = %url, "Requesting export");

    let response = client
        .http()
        .get(url)
        .send()
        .await
        .map_err(|e| AppError::Network(format!("Failed to export {identifier}: {e}")))?;

    let status = response.status();
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(AppError::Unauthorized(format!(
            "HTTP {}: export of {identifier} was rejected",
            status.as_u16()
        )));
    }
    if response.url().path().trim_end_matches('/') == LOGIN_PATH {
        return Err(AppError::Unauthorized(format!(
            "export of {identifier} redirected to the login page"
        )));
    }
    if !status.is_success() {
        return Err(AppError::Network(format!(
            "HTTP {}: Failed to export {identifier}",
            status.as_u16()
        )));
    }

    let header = response
        .headers()
        .get(CONTENT_DISPOSITION)
        .and_then(|v| v.to_str().ok());
    let filename = filename_from_content_disposition(header)?;

    let body = response
        .text()
        .await
        .map_err(|e| AppError::Network(format!("Failed to read export of {identifier}: {e}")))?;

    Ok((filename, body))
}

async fn write_export(output_dir: &Path, filename: &str, body: &str) -> AppResult<()> {
    let file_path = output_dir.join(filename);
    let seq = TMP_SEQ.fetch_add(1, Ordering::Relaxed);
    let tmp_path = output_dir.join(format!("{filename}.{seq}.part"));

    fs::write(&tmp_path, body).await.map_err(|e| {
        AppError::Io(format!(
            "Failed to write temp file {}: {}",
            tmp_path.display(),
            e
        ))
    })?;

    // Atomically move the temp file to the final destination
    if let Err(e) = fs::rename(&tmp_path, &file_path).await {
        if let Err(cleanup) = fs::remove_file(&tmp_path).await {
            warn!(
                file_path = %tmp_path.display(),
                error = %cleanup,
                "Failed to remove temp file"
            );
        }
        return Err(AppError::Io(format!(
            "Failed to rename temp file {} to {}: {}",
            tmp_path.display(),
            file_path.display(),
            e
        )));
    }

    Ok(())
}

/// Exports every identifier with bounded concurrency and continue-on-error.
///
/// # Behavior
///
/// - **Bounded pool**: at most `concurrency` exports are in flight.
/// - **Continue on error**: a failed export is recorded and the batch goes on.
/// - **Halt on auth loss**: an `Unauthorized` failure cancels `cancel`; queued
///   and in-flight exports are then reported as skipped. External interrupts
///   use the same token.
/// - **Report**: one result per identifier, in input order. Zero identifiers
///   yields an empty report without touching the filesystem.
///
/// If the output directory cannot be created, every identifier is reported
/// as failed with that `Io` error and nothing is requested.
///
/// # Errors
///
/// Returns an error only if the progress bar cannot be set up.
pub async fn export_all(
    client: &FlowClient,
    identifiers: &[ResourceIdentifier],
    output_dir: &Path,
    concurrency: usize,
    cancel: &CancellationToken,
) -> AppResult<ExportReport> {
    if identifiers.is_empty() {
        info!("No training sessions to export");
        return Ok(ExportReport::default());
    }

    if let Err(e) = fs::create_dir_all(output_dir).await {
        let err = AppError::Io(format!(
            "Failed to create output directory {}: {e}",
            output_dir.display()
        ));
        error!(error = %err, "Cannot export any training session");
        let reason = err.to_string();
        return Ok(ExportReport {
            results: identifiers
                .iter()
                .map(|id| ExportResult::failed(id.clone(), reason.clone()))
                .collect(),
        });
    }

    let total = identifiers.len();
    let pb = ui::create_progress_bar(total as u64)?;
    info!(total = total, concurrency = concurrency, "Starting export");

    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let output_dir = Arc::new(output_dir.to_path_buf());
    let mut handles: Vec<JoinHandle<ExportResult>> = Vec::with_capacity(total);

    for identifier in identifiers {
        let semaphore = semaphore.clone();
        let client = client.clone();
        let output_dir: Arc<PathBuf> = output_dir.clone();
        let cancel = cancel.clone();
        let pb = pb.clone();
        let identifier = identifier.clone();

        let handle = tokio::spawn(async move {
            let result = run_export_task(&client, identifier, &output_dir, &semaphore, &cancel).await;
            pb.inc(1);
            result
        });
        handles.push(handle);
    }

    let mut report = ExportReport::default();
    for (handle, identifier) in handles.into_iter().zip(identifiers) {
        match handle.await {
            Ok(result) => report.results.push(result),
            Err(e) => report
                .results
                .push(ExportResult::failed(identifier.clone(), format!("Task join error: {e}"))),
        }
    }

    let succeeded = report.succeeded();
    let failed = report.len() - succeeded;
    if failed == 0 {
        pb.finish_with_message(format!("Exported {succeeded} session(s)"));
        info!(exported = succeeded, "Export completed");
    } else {
        pb.finish_with_message(format!("Exported {succeeded} session(s), {failed} failed"));
        info!(exported = succeeded, failed = failed, "Export completed with errors");
    }

    Ok(report)
}

async fn run_export_task(
    client: &FlowClient,
    identifier: ResourceIdentifier,
    output_dir: &Path,
    semaphore: &Semaphore,
    cancel: &CancellationToken,
) -> ExportResult {
    let _permit = tokio::select! {
        _ = cancel.cancelled() => {
            return ExportResult::skipped(identifier, "batch halted before export started");
        }
        permit = semaphore.acquire() => match permit {
            Ok(permit) => permit,
            Err(e) => {
                return ExportResult::failed(identifier, format!("Failed to acquire export slot: {e}"));
            }
        },
    };

    if cancel.is_cancelled() {
        return ExportResult::skipped(identifier, "batch halted before export started");
    }

    // Cancel abandons only the request; a fetched export is always written.
    let fetched = tokio::select! {
        _ = cancel.cancelled() => {
            return ExportResult::skipped(identifier.clone(), "batch halted during export");
        }
        fetched = fetch_export(client, &identifier) => fetched,
    };

    let outcome = match fetched {
        Ok((filename, body)) => write_export(output_dir, &filename, &body)
            .await
            .map(|()| ExportResult::succeeded(identifier.clone(), filename)),
        Err(e) => Err(e),
    };

    match outcome {
        Ok(result) => result,
        Err(e @ AppError::Unauthorized(_)) => {
            error!(identifier = %identifier, error = %e, "Authorization lost, halting export batch");
            cancel.cancel();
            ExportResult::failed(identifier, e.to_string())
        }
        Err(e) => {
            warn!(identifier = %identifier, error = %e, "Failed to export training session");
            ExportResult::failed(identifier, e.to_string())
        }
    }
}
