use crate::errors::{AppError, AppResult};
use crate::models::Period;

/// Validates that a period string matches the expected format (YYYY or YYYYMM).
///
/// Checks that the period contains only ASCII digits and has exactly 4 digits (YYYY) or 6 digits (YYYYMM).
///
/// Returns `Ok(())` if valid, or `InvalidInput` error otherwise.
pub fn validate_period_format(period: &str) -> AppResult<()> {
    if period.is_empty() {
        return Err(AppError::InvalidInput(
            "Period must be YYYY or YYYYMM format (4 or 6 digits), got empty string".to_string(),
        ));
    }
    if !period.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::InvalidInput(format!(
            "Period must contain only digits, got: {period}"
        )));
    }
    match period.len() {
        4 | 6 => Ok(()),
        _ => Err(AppError::InvalidInput(format!(
            "Period must be YYYY or YYYYMM format (4 or 6 digits), got: {} ({} digits)",
            period,
            period.len()
        ))),
    }
}

/// Parses a period string into `(year, month_opt)`.
///
/// - For YYYY format (4 digits): `month_opt` is `None`
/// - For YYYYMM format (6 digits): `month_opt` is `Some(1..=12)`
pub fn parse_period(period: &str) -> AppResult<(i32, Option<u32>)> {
    validate_period_format(period)?;
    let year: i32 = period[..4].parse()?;
    if period.len() == 4 {
        return Ok((year, None));
    }
    let month: u32 = period[4..].parse()?;
    Period::new(year, month)?;
    Ok((year, Some(month)))
}

/// Expands an inclusive period range into every month it covers, ascending.
///
/// A bare `YYYY` start means January of that year and a bare `YYYY` end means
/// December. A missing bound takes the other one's year.
///
/// # Errors
///
/// Returns `InvalidInput` if both bounds are missing, either bound is malformed,
/// or the start comes after the end.
pub fn periods_between(start: Option<&str>, end: Option<&str>) -> AppResult<Vec<Period>> {
    let (start, end) = match (start, end) {
        (Some(s), Some(e)) => (s, e),
        (Some(s), None) => (s, s),
        (None, Some(e)) => (e, e),
        (None, None) => {
            return Err(AppError::InvalidInput(
                "A year or a start/end period is required".into(),
            ))
        }
    };

    let (start_year, start_month) = parse_period(start)?;
    let (end_year, end_month) = parse_period(end)?;
    let first = Period::new(start_year, start_month.unwrap_or(1))?;
    let last = Period::new(end_year, end_month.unwrap_or(12))?;

    if first > last {
        return Err(AppError::InvalidInput(format!(
            "Start period {first} is after end period {last}"
        )));
    }

    let mut periods = Vec::new();
    let mut current = first;
    while current <= last {
        periods.push(current);
        current = current.next();
    }
    Ok(periods)
}
