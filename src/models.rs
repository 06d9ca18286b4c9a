use crate::errors::{AppError, AppResult};
use secrecy::{ExposeSecret, SecretString};
use std::fmt;

/// Login credentials for the Flow web service.
///
/// Used once to authenticate and never persisted. The secret is kept in a
/// [`SecretString`] so it cannot end up in logs through `Debug`.
#[derive(Clone, Debug)]
pub struct Credentials {
    pub username: String,
    password: SecretString,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: SecretString) -> Self {
        Self {
            username: username.into(),
            password,
        }
    }

    pub fn password(&self) -> &str {
        self.password.expose_secret()
    }
}

/// A (year, month) page of the training diary.
///
/// Field order matters: the derived ordering sorts by year, then month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period {
    year: i32,
    month: u32,
}

impl Period {
    pub fn new(year: i32, month: u32) -> AppResult<Self> {
        if !(1..=12).contains(&month) {
            return Err(AppError::InvalidInput(format!(
                "Month must be between 1 and 12, got: {month}"
            )));
        }
        Ok(Self { year, month })
    }

    /// All twelve periods of `year`, January first.
    pub fn months_of(year: i32) -> Vec<Period> {
        (1..=12).map(|month| Period { year, month }).collect()
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// The following calendar month.
    pub fn next(&self) -> Period {
        if self.month == 12 {
            Period {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Period {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// Path of the diary month view, e.g. `/diary/2022/month/9`.
    pub fn calendar_path(&self) -> String {
        format!("/diary/{}/month/{}", self.year, self.month)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Opaque token naming one exportable training session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceIdentifier(String);

impl ResourceIdentifier {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceIdentifier {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Outcome of one export attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportStatus {
    Succeeded,
    Failed(String),
    /// Not attempted because the batch was halted.
    Skipped(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportResult {
    pub identifier: ResourceIdentifier,
    pub filename: Option<String>,
    pub status: ExportStatus,
}

impl ExportResult {
    pub fn succeeded(identifier: ResourceIdentifier, filename: String) -> Self {
        Self {
            identifier,
            filename: Some(filename),
            status: ExportStatus::Succeeded,
        }
    }

    pub fn failed(identifier: ResourceIdentifier, reason: impl Into<String>) -> Self {
        Self {
            identifier,
            filename: None,
            status: ExportStatus::Failed(reason.into()),
        }
    }

    pub fn skipped(identifier: ResourceIdentifier, reason: impl Into<String>) -> Self {
        Self {
            identifier,
            filename: None,
            status: ExportStatus::Skipped(reason.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ExportStatus::Succeeded
    }
}

/// Per-identifier results of one export batch, in identifier order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportReport {
    pub results: Vec<ExportResult>,
}

impl ExportReport {
    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    /// `(identifier, reason)` for every result that did not succeed.
    pub fn failures(&self) -> Vec<(&ResourceIdentifier, &str)> {
        self.results
            .iter()
            .filter_map(|r| match &r.status {
                ExportStatus::Succeeded => None,
                ExportStatus::Failed(reason) | ExportStatus::Skipped(reason) => {
                    Some((&r.identifier, reason.as_str()))
                }
            })
            .collect()
    }
}

/// What a full run produced: discovery totals plus the export report.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub discovered: usize,
    pub discovery_failures: Vec<(Period, String)>,
    pub report: ExportReport,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_rejects_invalid_month() {
        assert!(Period::new(2022, 0).is_err());
        assert!(Period::new(2022, 13).is_err());
        assert!(Period::new(2022, 12).is_ok());
    }

    #[test]
    fn test_months_of_spans_twelve_ordered_periods() {
        let months = Period::months_of(2022);
        assert_eq!(months.len(), 12);
        assert_eq!(months[0], Period::new(2022, 1).unwrap());
        assert_eq!(months[11], Period::new(2022, 12).unwrap());
        assert!(months.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_period_ordering_is_year_then_month() {
        let dec = Period::new(2021, 12).unwrap();
        let jan = Period::new(2022, 1).unwrap();
        assert!(dec < jan);
        assert_eq!(dec.next(), jan);
    }

    #[test]
    fn test_calendar_path_uses_unpadded_month() {
        let period = Period::new(2022, 9).unwrap();
        assert_eq!(period.calendar_path(), "/diary/2022/month/9");
        assert_eq!(period.to_string(), "2022-09");
    }

    #[test]
    fn test_credentials_debug_hides_password() {
        let creds = Credentials::new("runner@example.com", SecretString::new("hunter2".into()));
        assert_eq!(creds.password(), "hunter2");
        assert!(!format!("{creds:?}").contains("hunter2"));
    }

    #[test]
    fn test_report_counts_and_failures() {
        let report = ExportReport {
            results: vec![
                ExportResult::succeeded("1".into(), "a.CSV".into()),
                ExportResult::failed("2".into(), "no header"),
                ExportResult::skipped("3".into(), "halted"),
            ],
        };
        assert_eq!(report.len(), 3);
        assert_eq!(report.succeeded(), 1);
        let failures = report.failures();
        assert_eq!(failures.len(), 2);
        assert_eq!(failures[0].0.as_str(), "2");
        assert_eq!(failures[0].1, "no header");
    }
}
