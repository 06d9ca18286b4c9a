//! Common test utilities for integration tests

use async_trait::async_trait;
use polar_flow_cli::config::ResolvedConfig;
use polar_flow_cli::constants::LOGIN_BUTTON;
use polar_flow_cli::session::{Browser, BrowserCookie, BrowserError};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// What a [`ScriptedBrowser`] was asked to do, shared so tests can inspect it
/// after the browser has been moved into a session.
#[derive(Debug, Default)]
#[allow(dead_code)]
pub struct BrowserLog {
    pub visited: Vec<String>,
    pub filled: Vec<(String, String)>,
    pub quit_calls: usize,
}

/// In-memory [`Browser`] that serves canned pages.
#[allow(dead_code)]
pub struct ScriptedBrowser {
    pub pages: HashMap<String, String>,
    pub failing_urls: HashSet<String>,
    pub missing_elements: HashSet<String>,
    pub present_elements: HashSet<String>,
    pub post_login_url: String,
    pub cookies: Vec<BrowserCookie>,
    pub log: Arc<Mutex<BrowserLog>>,
    current: String,
}

#[allow(dead_code)]
impl ScriptedBrowser {
    /// A browser whose login succeeds and lands on `{base}/diary`.
    pub fn new(base: &str) -> Self {
        Self {
            pages: HashMap::new(),
            failing_urls: HashSet::new(),
            missing_elements: HashSet::new(),
            present_elements: HashSet::new(),
            post_login_url: format!("{base}/diary"),
            cookies: vec![BrowserCookie::new("SESSION", "abc")],
            log: Arc::new(Mutex::new(BrowserLog::default())),
            current: "about:blank".to_string(),
        }
    }

    pub fn with_page(mut self, url: impl Into<String>, markup: impl Into<String>) -> Self {
        self.pages.insert(url.into(), markup.into());
        self
    }

    pub fn with_failing_url(mut self, url: impl Into<String>) -> Self {
        self.failing_urls.insert(url.into());
        self
    }

    pub fn without_element(mut self, css: &str) -> Self {
        self.missing_elements.insert(css.to_string());
        self
    }

    pub fn with_element(mut self, css: &str) -> Self {
        self.present_elements.insert(css.to_string());
        self
    }

    /// Submitting the form keeps the browser on this URL.
    pub fn login_lands_on(mut self, url: impl Into<String>) -> Self {
        self.post_login_url = url.into();
        self
    }

    pub fn log(&self) -> Arc<Mutex<BrowserLog>> {
        self.log.clone()
    }
}

#[async_trait]
impl Browser for ScriptedBrowser {
    async fn goto(&mut self, url: &str) -> Result<(), BrowserError> {
        self.log.lock().unwrap().visited.push(url.to_string());
        if self.failing_urls.contains(url) {
            return Err(BrowserError(format!("connection reset loading {url}")));
        }
        self.current = url.to_string();
        Ok(())
    }

    async fn current_url(&mut self) -> Result<String, BrowserError> {
        Ok(self.current.clone())
    }

    async fn fill(&mut self, css: &str, text: &str, _timeout: Duration) -> Result<(), BrowserError> {
        if self.missing_elements.contains(css) {
            return Err(BrowserError(format!("timed out waiting for {css}")));
        }
        self.log
            .lock()
            .unwrap()
            .filled
            .push((css.to_string(), text.to_string()));
        Ok(())
    }

    async fn click(&mut self, css: &str, _timeout: Duration) -> Result<(), BrowserError> {
        if self.missing_elements.contains(css) {
            return Err(BrowserError(format!("timed out waiting for {css}")));
        }
        if css == LOGIN_BUTTON {
            self.current = self.post_login_url.clone();
        }
        Ok(())
    }

    async fn is_present(&mut self, css: &str) -> Result<bool, BrowserError> {
        Ok(self.present_elements.contains(css))
    }

    async fn page_source(&mut self) -> Result<String, BrowserError> {
        Ok(self
            .pages
            .get(&self.current)
            .cloned()
            .unwrap_or_else(|| "<html><body></body></html>".to_string()))
    }

    async fn cookies(&mut self) -> Result<Vec<BrowserCookie>, BrowserError> {
        Ok(self.cookies.clone())
    }

    async fn quit(&mut self) -> Result<(), BrowserError> {
        self.log.lock().unwrap().quit_calls += 1;
        Ok(())
    }
}

/// Pipeline configuration with no settle delay and a short login wait.
#[allow(dead_code)]
pub fn test_config(base_url: &str) -> ResolvedConfig {
    ResolvedConfig {
        base_url: base_url.to_string(),
        element_wait_secs: 1,
        settle_delay_ms: 0,
        concurrent_exports: 2,
        request_timeout_secs: 5,
        ..ResolvedConfig::default()
    }
}

/// Diary month markup with one exercise entry per href.
#[allow(dead_code)]
pub fn diary_page(hrefs: &[&str]) -> String {
    let entries: String = hrefs
        .iter()
        .map(|href| {
            format!(
                r#"<div class="event event-month exercise"><a href="{href}">Training</a></div>"#
            )
        })
        .collect();
    format!(r#"<html><body><div class="calendar">{entries}</div></body></html>"#)
}

/// Sample diary page from the service: two sessions and an unrelated link.
#[allow(dead_code)]
pub const SEPTEMBER_2022_PAGE: &str = r#"<html>
<body>
  <div class="calendar">
    <div class="event event-month exercise"><a href="https://flow.polar.com/training/analysis2/1001">Running</a></div>
    <div class="event event-month exercise"><a href="https://flow.polar.com/training/analysis2/1002">Cycling</a></div>
    <div class="event event-month exercise"><a href="https://flow.polar.com/other/999">Other</a></div>
  </div>
</body>
</html>"#;
