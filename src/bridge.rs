//! Turns the browser's login state into a standalone HTTP client.
//!
//! The bridge runs once per authenticated session: [`snapshot_cookies`]
//! captures an immutable [`CookieSet`], and [`build_client`] loads it into a
//! `reqwest` cookie jar scoped to the service URL. The resulting
//! [`FlowClient`] keeps working after the browser session is closed.

use crate::constants::EXPORT_PATH;
use crate::errors::{AppError, AppResult};
use crate::models::ResourceIdentifier;
use crate::session::{Browser, BrowserCookie, Session, SessionState};
use reqwest::cookie::Jar;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Immutable snapshot of the authentication cookies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieSet {
    cookies: Arc<[BrowserCookie]>,
}

impl CookieSet {
    pub fn new(cookies: Vec<BrowserCookie>) -> Self {
        Self {
            cookies: cookies.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BrowserCookie> {
        self.cookies.iter()
    }
}

/// Captures the session's cookies.
///
/// # Errors
///
/// `Bridge` if the session is not `AUTHENTICATED`; cookies read before login
/// would make every export unauthorized.
pub async fn snapshot_cookies<B: Browser>(session: &mut Session<B>) -> AppResult<CookieSet> {
    if session.state() != SessionState::Authenticated {
        return Err(AppError::Bridge(format!(
            "cannot snapshot cookies from a session in state {}",
            session.state()
        )));
    }

    let cookies = session.read_cookies().await?;
    info!(cookies = cookies.len(), "Captured session cookies");
    Ok(CookieSet::new(cookies))
}

/// HTTP client carrying the bridged cookies for one service origin.
#[derive(Debug, Clone)]
pub struct FlowClient {
    http: reqwest::Client,
    base_url: Url,
}

impl FlowClient {
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Export endpoint for one training session.
    pub fn export_url(&self, identifier: &ResourceIdentifier) -> AppResult<Url> {
        let path = format!("{EXPORT_PATH}{}", identifier.as_str());
        Ok(self.base_url.join(&path)?)
    }
}

/// Builds a client whose cookie jar holds `cookies` for `base_url`'s host.
pub fn build_client(
    cookies: &CookieSet,
    base_url: &Url,
    request_timeout: Duration,
) -> AppResult<FlowClient> {
    let jar = Jar::default();
    for cookie in cookies.iter() {
        debug!(name = %cookie.name, "Loading cookie into jar");
        jar.add_cookie_str(&format!("{}={}; Path=/", cookie.name, cookie.value), base_url);
    }

    let http = reqwest::Client::builder()
        .cookie_provider(Arc::new(jar))
        .timeout(request_timeout)
        .build()?;

    Ok(FlowClient {
        http,
        base_url: base_url.clone(),
    })
}
