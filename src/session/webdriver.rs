use super::{Browser, BrowserCookie, BrowserError};
use crate::config::ResolvedConfig;
use crate::errors::{AppError, AppResult};
use async_trait::async_trait;
use fantoccini::{Client, ClientBuilder, Locator};
use serde_json::json;
use std::time::Duration;
use tokio::time::Instant;
use tracing::info;

const CLICKABLE_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// [`Browser`] backed by a W3C WebDriver server such as chromedriver.
///
/// The client is taken out on [`Browser::quit`]; every later call fails.
pub struct WebDriverBrowser {
    client: Option<Client>,
}

impl WebDriverBrowser {
    /// Starts a new Chrome session on the configured WebDriver endpoint.
    pub async fn connect(config: &ResolvedConfig) -> AppResult<Self> {
        let mut args = vec!["--window-size=1280,1024"];
        if config.headless {
            args.push("--headless=new");
        }

        let mut capabilities = serde_json::Map::new();
        capabilities.insert("browserName".to_string(), json!("chrome"));
        capabilities.insert("goog:chromeOptions".to_string(), json!({ "args": args }));

        info!(webdriver_url = %config.webdriver_url, headless = config.headless, "Starting browser session");
        let mut builder = ClientBuilder::rustls();
        builder.capabilities(capabilities);
        let client = builder
            .connect(&config.webdriver_url)
            .await
            .map_err(|e| {
                AppError::Authentication(format!(
                    "Failed to start browser session at {}: {e}",
                    config.webdriver_url
                ))
            })?;

        Ok(Self {
            client: Some(client),
        })
    }

    fn client(&self) -> Result<&Client, BrowserError> {
        self.client
            .as_ref()
            .ok_or_else(|| BrowserError("browser session already closed".into()))
    }
}

fn cmd_error(err: fantoccini::error::CmdError) -> BrowserError {
    BrowserError(err.to_string())
}

#[async_trait]
impl Browser for WebDriverBrowser {
    async fn goto(&mut self, url: &str) -> Result<(), BrowserError> {
        self.client()?.goto(url).await.map_err(cmd_error)
    }

    async fn current_url(&mut self) -> Result<String, BrowserError> {
        let url = self.client()?.current_url().await.map_err(cmd_error)?;
        Ok(url.to_string())
    }

    async fn fill(
        &mut self,
        css: &str,
        text: &str,
        timeout: Duration,
    ) -> Result<(), BrowserError> {
        let element = self
            .client()?
            .wait()
            .at_most(timeout)
            .for_element(Locator::Css(css))
            .await
            .map_err(cmd_error)?;
        element.send_keys(text).await.map_err(cmd_error)
    }

    async fn click(&mut self, css: &str, timeout: Duration) -> Result<(), BrowserError> {
        let deadline = Instant::now() + timeout;
        let client = self.client()?;
        let element = client
            .wait()
            .at_most(timeout)
            .for_element(Locator::Css(css))
            .await
            .map_err(cmd_error)?;

        // Present is not enough: the button stays disabled until the form validates.
        loop {
            let displayed = element.is_displayed().await.map_err(cmd_error)?;
            let enabled = element.is_enabled().await.map_err(cmd_error)?;
            if displayed && enabled {
                break;
            }
            if Instant::now() >= deadline {
                return Err(BrowserError(format!(
                    "element {css} did not become clickable within {}s",
                    timeout.as_secs()
                )));
            }
            tokio::time::sleep(CLICKABLE_POLL_INTERVAL).await;
        }

        element.click().await.map_err(cmd_error)
    }

    async fn is_present(&mut self, css: &str) -> Result<bool, BrowserError> {
        let found = self
            .client()?
            .find_all(Locator::Css(css))
            .await
            .map_err(cmd_error)?;
        Ok(!found.is_empty())
    }

    async fn page_source(&mut self) -> Result<String, BrowserError> {
        self.client()?.source().await.map_err(cmd_error)
    }

    async fn cookies(&mut self) -> Result<Vec<BrowserCookie>, BrowserError> {
        let cookies = self.client()?.get_all_cookies().await.map_err(cmd_error)?;
        Ok(cookies
            .iter()
            .map(|c| BrowserCookie::new(c.name(), c.value()))
            .collect())
    }

    async fn quit(&mut self) -> Result<(), BrowserError> {
        match self.client.take() {
            Some(client) => client.close().await.map_err(cmd_error),
            None => Ok(()),
        }
    }
}
