//! Interactive login session and the browser capability it drives.
//!
//! [`Session`] owns one [`Browser`] and enforces the login lifecycle
//! (`NEW → AUTHENTICATING → AUTHENTICATED`, any state `→ CLOSED`). The
//! browser itself is abstract; [`WebDriverBrowser`] is the production
//! implementation backed by a WebDriver server.

mod state;
mod webdriver;

pub use state::{Session, SessionState};
pub use webdriver::WebDriverBrowser;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Failure reported by a [`Browser`] primitive.
///
/// The session maps these onto the application taxonomy depending on which
/// operation was running (login vs. calendar navigation).
#[derive(Debug, Error)]
#[error("{0}")]
pub struct BrowserError(pub String);

/// Name/value pair read from the browser's cookie store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserCookie {
    pub name: String,
    pub value: String,
}

impl BrowserCookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Navigation primitives the session needs from a browser.
///
/// Elements are addressed with CSS selectors. Waiting variants poll until the
/// element is usable or `timeout` elapses.
#[async_trait]
pub trait Browser: Send {
    async fn goto(&mut self, url: &str) -> Result<(), BrowserError>;

    async fn current_url(&mut self) -> Result<String, BrowserError>;

    /// Waits for the element to appear, then types `text` into it.
    async fn fill(&mut self, css: &str, text: &str, timeout: Duration)
        -> Result<(), BrowserError>;

    /// Waits for the element to become clickable, then clicks it.
    async fn click(&mut self, css: &str, timeout: Duration) -> Result<(), BrowserError>;

    /// Non-waiting presence check.
    async fn is_present(&mut self, css: &str) -> Result<bool, BrowserError>;

    async fn page_source(&mut self) -> Result<String, BrowserError>;

    async fn cookies(&mut self) -> Result<Vec<BrowserCookie>, BrowserError>;

    /// Ends the browser session and releases the underlying process.
    async fn quit(&mut self) -> Result<(), BrowserError>;
}
