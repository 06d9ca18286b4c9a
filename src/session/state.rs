use super::{Browser, BrowserCookie};
use crate::config::ResolvedConfig;
use crate::constants::{
    LOGIN_BUTTON, LOGIN_ERROR_INDICATORS, LOGIN_PATH, PASSWORD_FIELD, USERNAME_FIELD,
};
use crate::errors::{AppError, AppResult};
use crate::models::{Credentials, Period};
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use url::Url;

/// How often the login page is checked for a redirect after submission.
const LOGIN_POLL_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    New,
    Authenticating,
    Authenticated,
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::New => "NEW",
            SessionState::Authenticating => "AUTHENTICATING",
            SessionState::Authenticated => "AUTHENTICATED",
            SessionState::Closed => "CLOSED",
        };
        f.write_str(name)
    }
}

/// One owned, stateful login context.
///
/// Only one navigation can be in flight at a time: every operation takes
/// `&mut self`. Callers must call [`Session::close`] on every exit path;
/// dropping an open session only logs a warning because closing is async.
pub struct Session<B: Browser> {
    browser: B,
    state: SessionState,
    base_url: Url,
    element_wait: Duration,
    settle_delay: Duration,
}

impl<B: Browser> Session<B> {
    /// Wraps `browser` in a fresh `NEW` session for the service at `base_url`.
    pub fn new(browser: B, base_url: Url, config: &ResolvedConfig) -> Self {
        Self {
            browser,
            state: SessionState::New,
            base_url,
            element_wait: config.element_wait(),
            settle_delay: config.settle_delay(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Fills and submits the login form, then waits for the page to leave it.
    ///
    /// # Errors
    ///
    /// `SessionState` unless the session is `NEW`. `Authentication` if a form
    /// control does not appear in time, the service shows a login error, or
    /// the page is still on the login form when the wait budget runs out.
    /// A failed login leaves the session in `AUTHENTICATING`.
    pub async fn login(&mut self, credentials: &Credentials) -> AppResult<()> {
        self.require(SessionState::New, "log in")?;
        self.state = SessionState::Authenticating;

        let login_url = self.base_url.join(LOGIN_PATH)?;
        info!(url = %login_url, "Navigating to login page");
        self.browser
            .goto(login_url.as_str())
            .await
            .map_err(|e| AppError::Authentication(format!("Failed to open login page: {e}")))?;

        let wait = self.element_wait;
        debug!("Waiting for username field");
        self.browser
            .fill(USERNAME_FIELD, &credentials.username, wait)
            .await
            .map_err(|e| AppError::Authentication(format!("Username field unavailable: {e}")))?;

        debug!("Waiting for password field");
        self.browser
            .fill(PASSWORD_FIELD, credentials.password(), wait)
            .await
            .map_err(|e| AppError::Authentication(format!("Password field unavailable: {e}")))?;

        debug!("Waiting for login button");
        self.browser
            .click(LOGIN_BUTTON, wait)
            .await
            .map_err(|e| AppError::Authentication(format!("Login button unavailable: {e}")))?;
        info!("Login form submitted");

        self.await_login_redirect().await?;
        self.state = SessionState::Authenticated;
        info!(username = %credentials.username, "Login succeeded");
        Ok(())
    }

    async fn await_login_redirect(&mut self) -> AppResult<()> {
        let deadline = Instant::now() + self.element_wait;
        loop {
            let current = self
                .browser
                .current_url()
                .await
                .map_err(|e| AppError::Authentication(format!("Failed to read page URL: {e}")))?;
            if !is_login_page(&current) {
                debug!(url = %current, "Left login page");
                return Ok(());
            }

            for indicator in LOGIN_ERROR_INDICATORS {
                let present = self.browser.is_present(indicator).await.map_err(|e| {
                    AppError::Authentication(format!("Failed to inspect login page: {e}"))
                })?;
                if present {
                    return Err(AppError::Authentication(
                        "Credentials rejected by the service".into(),
                    ));
                }
            }

            if Instant::now() >= deadline {
                return Err(AppError::Authentication(format!(
                    "Login did not complete within {}s",
                    self.element_wait.as_secs()
                )));
            }
            tokio::time::sleep(LOGIN_POLL_INTERVAL).await;
        }
    }

    /// Loads the diary month view for `period` and lets it settle.
    pub async fn navigate_to_period(&mut self, period: Period) -> AppResult<()> {
        self.require(SessionState::Authenticated, "navigate")?;

        let url = self.base_url.join(&period.calendar_path())?;
        debug!(period = %period, url = %url, "Loading diary page");
        self.browser
            .goto(url.as_str())
            .await
            .map_err(|e| AppError::Navigation {
                period: period.to_string(),
                message: e.to_string(),
            })?;

        // The diary renders its entries client-side after the load event.
        tokio::time::sleep(self.settle_delay).await;
        Ok(())
    }

    /// Raw markup of the page currently loaded in the browser.
    pub async fn extract_current_markup(&mut self) -> AppResult<String> {
        if self.state == SessionState::Closed {
            return Err(self.state_error("read markup"));
        }
        self.browser
            .page_source()
            .await
            .map_err(|e| AppError::Network(format!("Failed to read page source: {e}")))
    }

    /// Reads the browser's current cookies. Callers check the state.
    pub(crate) async fn read_cookies(&mut self) -> AppResult<Vec<BrowserCookie>> {
        self.browser
            .cookies()
            .await
            .map_err(|e| AppError::Bridge(format!("Failed to read browser cookies: {e}")))
    }

    /// Releases the browser. Safe to call any number of times.
    pub async fn close(&mut self) -> AppResult<()> {
        if self.state == SessionState::Closed {
            return Ok(());
        }
        self.state = SessionState::Closed;
        info!("Closing browser session");
        self.browser
            .quit()
            .await
            .map_err(|e| AppError::Io(format!("Failed to close browser: {e}")))
    }

    fn require(&self, expected: SessionState, operation: &'static str) -> AppResult<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(self.state_error(operation))
        }
    }

    fn state_error(&self, operation: &'static str) -> AppError {
        AppError::SessionState {
            operation,
            state: self.state.to_string(),
        }
    }
}

impl<B: Browser> Drop for Session<B> {
    fn drop(&mut self) {
        if self.state != SessionState::Closed {
            warn!(state = %self.state, "Session dropped without being closed");
        }
    }
}

/// True while the browser is still showing the login form.
fn is_login_page(current: &str) -> bool {
    match Url::parse(current) {
        Ok(url) => url.path().trim_end_matches('/') == LOGIN_PATH,
        Err(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::{is_login_page, SessionState};

    #[test]
    fn test_login_page_detection() {
        assert!(is_login_page("https://flow.polar.com/login"));
        assert!(is_login_page("https://flow.polar.com/login/"));
        assert!(is_login_page("https://flow.polar.com/login?next=%2Fdiary"));
        assert!(!is_login_page("https://flow.polar.com/diary"));
        assert!(!is_login_page("https://flow.polar.com/"));
    }

    #[test]
    fn test_unparseable_url_counts_as_login_page() {
        assert!(is_login_page("not a url"));
    }

    #[test]
    fn test_state_display() {
        assert_eq!(SessionState::New.to_string(), "NEW");
        assert_eq!(SessionState::Closed.to_string(), "CLOSED");
    }
}
