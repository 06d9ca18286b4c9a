// Service
pub const FLOW_URL: &str = "https://flow.polar.com";
pub const LOGIN_PATH: &str = "/login";
pub const DETAIL_PATH: &str = "/training/analysis2/";
pub const EXPORT_PATH: &str = "/api/export/training/csv/";

// WebDriver
pub const WEBDRIVER_URL: &str = "http://localhost:9515";

// Login form locators
pub const USERNAME_FIELD: &str = r#"[name="username"]"#;
pub const PASSWORD_FIELD: &str = r#"[name="password"]"#;
pub const LOGIN_BUTTON: &str = r#"[data-testid="login-button"]"#;
pub const LOGIN_ERROR_INDICATORS: &[&str] = &[r#"[data-testid="login-error"]"#, ".alert-danger"];

// Diary page
pub const EXERCISE_LINK_SELECTOR: &str = r#"div[class="event event-month exercise"] > a"#;

// Export response
pub const FILENAME_PATTERN: &str = r#"filename="([\w._-]+)""#;

// Period help text
pub const PERIOD_HELP_TEXT: &str = "Period (YYYY or YYYYMM format, e.g., 202209)";
