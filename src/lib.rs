//! polar-flow-cli library
//!
//! This crate provides the core functionality for the `polar-flow-cli` binary.
//! Keep the crate root minimal; implementation and tests live in their modules.
//!
//! ## Overview
//!
//! Polar Flow has no public export API, so a run goes through the web UI:
//!
//! - [`session`] - Drives the interactive login in a browser and navigates the training diary
//! - [`bridge`] - Turns the logged-in browser's cookies into a standalone HTTP client
//! - [`discovery`] - Extracts training session identifiers from diary month pages
//! - [`export`] - Downloads each session's CSV export, continuing past per-item failures
//! - [`pipeline`] - Orchestrates one complete run and guarantees the browser is released
//! - [`organizer`] - Files exported CSVs into year/month folders
//! - [`cli`] - Command-line interface for the workflow
//! - [`config`] - Pipeline defaults and TOML configuration
//! - [`models`] - Periods, identifiers, credentials and export reports
//! - [`errors`] - Error types used throughout the application
//!
//! ## Example Usage
//!
//! ```no_run
//! use polar_flow_cli::{config::ResolvedConfig, discovery, errors::AppResult, models::Credentials};
//! use polar_flow_cli::{pipeline, session::WebDriverBrowser};
//! use secrecy::SecretString;
//! use std::path::Path;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> AppResult<()> {
//! let config = ResolvedConfig::default();
//! let credentials = Credentials::new("me@example.com", SecretString::new("secret".into()));
//! let periods = discovery::periods_between(Some("2022"), Some("2022"))?;
//!
//! let browser = WebDriverBrowser::connect(&config).await?;
//! let summary = pipeline::run_export(
//!     browser,
//!     &credentials,
//!     &periods,
//!     Path::new("exports"),
//!     &config,
//!     &CancellationToken::new(),
//! )
//! .await?;
//! println!("{} of {} exported", summary.report.succeeded(), summary.discovered);
//! # Ok(())
//! # }
//! ```

pub mod bridge;
pub mod cli;
pub mod config;
pub mod constants;
pub mod discovery;
pub mod errors;
pub mod export;
pub mod models;
pub mod organizer;
pub mod pipeline;
pub mod session;
pub mod ui;
