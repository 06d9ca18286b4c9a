use crate::errors::{AppError, AppResult};
use chrono::{Datelike, NaiveDate};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Counts reported by [`organize_by_date`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct OrganizeSummary {
    pub moved: usize,
    pub already_in_place: usize,
    pub skipped: usize,
}

/// Files exported CSVs into `YYYY/MM/` sub-directories of `dir`.
///
/// Every `.csv` file (any case) below `dir` is inspected. The date is the
/// second-to-last `_`-separated part of the file name, e.g. `2022-09-27` in
/// `run_2022-09-27_06-35-25.CSV`. Files whose names carry no such date are
/// left alone. Moving replaces a file of the same name at the destination.
///
/// # Errors
///
/// Returns `Io` if `dir` cannot be walked or a destination folder cannot be
/// created. A file that fails to move is logged and counted as skipped.
pub fn organize_by_date(dir: &Path) -> AppResult<OrganizeSummary> {
    if !dir.is_dir() {
        return Err(AppError::Io(format!(
            "Directory does not exist: {}",
            dir.display()
        )));
    }

    // Collect first: moving files while walking would revisit them.
    let mut csv_files: Vec<PathBuf> = Vec::new();
    for entry in WalkDir::new(dir) {
        let entry = entry.map_err(|e| AppError::Io(format!("Failed to walk {}: {e}", dir.display())))?;
        if entry.file_type().is_file() && has_csv_extension(entry.path()) {
            csv_files.push(entry.into_path());
        }
    }

    let mut summary = OrganizeSummary::default();
    for path in csv_files {
        let Some(filename) = path.file_name().and_then(|n| n.to_str()) else {
            summary.skipped += 1;
            continue;
        };
        let Some(date) = date_from_filename(filename) else {
            debug!(file = %path.display(), "No date in file name, leaving in place");
            summary.skipped += 1;
            continue;
        };

        let target_dir = dir
            .join(format!("{:04}", date.year()))
            .join(format!("{:02}", date.month()));
        let target = target_dir.join(filename);
        if path == target {
            summary.already_in_place += 1;
            continue;
        }

        fs::create_dir_all(&target_dir).map_err(|e| {
            AppError::Io(format!("Failed to create {}: {e}", target_dir.display()))
        })?;
        match fs::rename(&path, &target) {
            Ok(()) => summary.moved += 1,
            Err(e) => {
                warn!(
                    file = %path.display(),
                    target = %target.display(),
                    error = %e,
                    "Failed to move export"
                );
                summary.skipped += 1;
            }
        }
    }

    info!(
        moved = summary.moved,
        already_in_place = summary.already_in_place,
        skipped = summary.skipped,
        "Organization completed"
    );
    Ok(summary)
}

fn has_csv_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}

/// Date encoded as the second-to-last `_` part of an export file name.
fn date_from_filename(filename: &str) -> Option<NaiveDate> {
    let parts: Vec<&str> = filename.split('_').collect();
    if parts.len() < 2 {
        return None;
    }
    NaiveDate::parse_from_str(parts[parts.len() - 2], "%Y-%m-%d").ok()
}
