use super::link_extractor::parse_exercise_ids;
use crate::errors::{AppError, AppResult};
use crate::models::{Period, ResourceIdentifier};
use crate::session::{Browser, Session};
use tracing::{info, warn};

/// Identifiers found across a range of periods, plus the periods that failed.
#[derive(Debug, Default)]
pub struct DiscoveryOutcome {
    pub identifiers: Vec<ResourceIdentifier>,
    pub failures: Vec<(Period, AppError)>,
}

/// Loads one diary month and extracts its training session identifiers.
///
/// # Errors
///
/// `Navigation` if the page cannot be loaded, `SessionState` if the session
/// is not logged in.
pub async fn discover<B: Browser>(
    session: &mut Session<B>,
    period: Period,
) -> AppResult<Vec<ResourceIdentifier>> {
    session.navigate_to_period(period).await?;
    let markup = session
        .extract_current_markup()
        .await
        .map_err(|e| match e {
            AppError::Network(message) => AppError::Navigation {
                period: period.to_string(),
                message,
            },
            other => other,
        })?;

    let ids = parse_exercise_ids(&markup, session.base_url())?;
    info!(period = %period, found = ids.len(), "Diary page processed");
    Ok(ids)
}

/// Runs [`discover`] over `periods` strictly in order on the one session.
///
/// A period whose page fails to load is recorded in
/// [`DiscoveryOutcome::failures`] and the walk continues. Fatal errors
/// (e.g. the session is not logged in) abort immediately.
pub async fn discover_range<B: Browser>(
    session: &mut Session<B>,
    periods: &[Period],
) -> AppResult<DiscoveryOutcome> {
    let mut outcome = DiscoveryOutcome::default();

    for &period in periods {
        match discover(session, period).await {
            Ok(ids) => outcome.identifiers.extend(ids),
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                warn!(period = %period, error = %e, "Failed to process diary page");
                outcome.failures.push((period, e));
            }
        }
    }

    info!(
        periods = periods.len(),
        identifiers = outcome.identifiers.len(),
        failed_periods = outcome.failures.len(),
        "Discovery completed"
    );
    Ok(outcome)
}
