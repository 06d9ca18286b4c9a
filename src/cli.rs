use crate::config::{ResolvedConfig, ResolvedConfigFile};
use crate::constants::PERIOD_HELP_TEXT;
use crate::discovery::periods_between;
use crate::errors::{AppError, AppResult};
use crate::models::{Credentials, Period};
use crate::organizer::organize_by_date;
use crate::pipeline::run_export;
use crate::session::WebDriverBrowser;
use clap::{Arg, ArgAction, ArgMatches, Command};
use secrecy::SecretString;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

// CLI metadata constants
const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
const APP_AUTHOR: &str = env!("CARGO_PKG_AUTHORS");
const APP_ABOUT: &str = env!("CARGO_PKG_DESCRIPTION");

/// Environment variable consulted when no password is given explicitly.
const PASSWORD_ENV: &str = "POLAR_PASSWORD";

/// Everything one run needs, whichever subcommand supplied it.
#[derive(Debug, Clone)]
pub struct RunArgs {
    pub output_dir: PathBuf,
    pub download: bool,
    pub organize: bool,
    pub username: Option<String>,
    pub password: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub config: ResolvedConfig,
}

fn build_command() -> Command<'static> {
    Command::new("polar-flow-cli")
        .version(APP_VERSION)
        .author(APP_AUTHOR)
        .about(APP_ABOUT)
        .subcommand(
            Command::new("cli")
                .about("Export training sessions and/or organize exported files")
                .after_help("Example:\n  polar-flow-cli cli exports --download -u me@example.com -y 2022 --organize")
                .arg(
                    Arg::new("output_dir")
                        .help("Directory to save exported files")
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("download")
                        .short('d')
                        .long("download")
                        .help("Log in and export training sessions")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("organize")
                        .short('o')
                        .long("organize")
                        .alias("organizer")
                        .help("Move exported files into YYYY/MM folders")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("username")
                        .short('u')
                        .long("username")
                        .help("Polar Flow account e-mail")
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("password")
                        .short('p')
                        .long("password")
                        .help("Polar Flow password (defaults to $POLAR_PASSWORD)")
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("year")
                        .short('y')
                        .long("year")
                        .help("Year to export (YYYY)")
                        .conflicts_with_all(&["start", "end"])
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("start")
                        .short('s')
                        .long("start")
                        .help(PERIOD_HELP_TEXT)
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("end")
                        .short('e')
                        .long("end")
                        .help(PERIOD_HELP_TEXT)
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("webdriver_url")
                        .long("webdriver-url")
                        .help("WebDriver endpoint (chromedriver)")
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("concurrency")
                        .short('c')
                        .long("concurrency")
                        .help("Exports run in parallel")
                        .value_parser(clap::value_parser!(usize))
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("show_browser")
                        .long("show-browser")
                        .help("Run the browser with a visible window")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("toml")
                .about("Run using a TOML configuration file")
                .arg(
                    Arg::new("config")
                        .help("Path to the TOML config file")
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf)),
                ),
        )
}

/// Parses command-line arguments and executes the requested run.
///
/// This function handles two subcommands:
/// - `cli`: flags on the command line, pipeline defaults otherwise
/// - `toml`: everything read from a TOML configuration file
///
/// Both feed the same workflow: export (log in, discover the diary months,
/// export every session) and/or organize the output directory.
pub async fn cli() -> AppResult<()> {
    let cmd = build_command();
    let mut cmd_for_help = cmd.clone();
    let matches = cmd.get_matches();

    match matches.subcommand() {
        Some(("cli", sub)) => run_workflow(args_from_matches(sub)).await?,
        Some(("toml", sub)) => {
            let config_path = sub
                .get_one::<PathBuf>("config")
                .ok_or_else(|| AppError::InvalidInput("config path is required".into()))?;
            let file_config = ResolvedConfigFile::from_toml_file(config_path)?;
            run_workflow(args_from_file(file_config)).await?;
        }
        _ => {
            cmd_for_help
                .print_help()
                .map_err(|e| AppError::Io(format!("Failed to print help: {e}")))?;
        }
    }

    Ok(())
}

fn args_from_matches(sub: &ArgMatches) -> RunArgs {
    let mut config = ResolvedConfig::default();
    if let Some(url) = sub.get_one::<String>("webdriver_url") {
        config.webdriver_url = url.clone();
    }
    if let Some(&concurrency) = sub.get_one::<usize>("concurrency") {
        config.concurrent_exports = concurrency;
    }
    if sub.get_flag("show_browser") {
        config.headless = false;
    }

    let year = sub.get_one::<String>("year").cloned();
    let (start, end) = match year {
        Some(year) => (Some(year.clone()), Some(year)),
        None => (
            sub.get_one::<String>("start").cloned(),
            sub.get_one::<String>("end").cloned(),
        ),
    };

    RunArgs {
        output_dir: sub
            .get_one::<PathBuf>("output_dir")
            .cloned()
            .unwrap_or_default(),
        download: sub.get_flag("download"),
        organize: sub.get_flag("organize"),
        username: sub.get_one::<String>("username").cloned(),
        password: sub.get_one::<String>("password").cloned(),
        start,
        end,
        config,
    }
}

fn args_from_file(file: ResolvedConfigFile) -> RunArgs {
    let (start, end) = file.period_bounds();
    let (start, end) = (start.map(str::to_string), end.map(str::to_string));
    RunArgs {
        output_dir: file.output_dir,
        download: file.download,
        organize: file.organize,
        username: file.username,
        password: file.password,
        start,
        end,
        config: file.resolved,
    }
}

/// Builds credentials, taking the password from the environment when absent.
fn resolve_credentials(
    username: Option<String>,
    password: Option<String>,
    env_password: Option<String>,
) -> AppResult<Credentials> {
    let username = username.filter(|u| !u.trim().is_empty()).ok_or_else(|| {
        AppError::InvalidInput("--download requires --username".into())
    })?;
    let password = password.or(env_password).filter(|p| !p.is_empty()).ok_or_else(|| {
        AppError::InvalidInput(format!("--download requires --password or ${PASSWORD_ENV}"))
    })?;
    Ok(Credentials::new(username, SecretString::new(password.into())))
}

async fn run_workflow(args: RunArgs) -> AppResult<()> {
    args.config.validate()?;

    if args.download {
        let credentials = resolve_credentials(
            args.username.clone(),
            args.password.clone(),
            std::env::var(PASSWORD_ENV).ok(),
        )?;
        let periods = periods_between(args.start.as_deref(), args.end.as_deref())?;
        print_download_info(&periods, &args.output_dir);
        download(&credentials, &periods, &args.output_dir, &args.config).await?;
    }

    if args.organize {
        info!(output_dir = %args.output_dir.display(), "Organizing files");
        let dir = args.output_dir.clone();
        tokio::task::spawn_blocking(move || organize_by_date(&dir))
            .await
            .map_err(|e| AppError::Io(format!("Organizer task failed: {e}")))??;
    }

    if !args.download && !args.organize {
        warn!("Nothing to do: pass --download and/or --organize");
    }

    Ok(())
}

async fn download(
    credentials: &Credentials,
    periods: &[Period],
    output_dir: &Path,
    config: &ResolvedConfig,
) -> AppResult<()> {
    let cancel = CancellationToken::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received, cancelling outstanding exports");
                cancel.cancel();
            }
        })
    };

    let result = match WebDriverBrowser::connect(config).await {
        Ok(browser) => {
            run_export(browser, credentials, periods, output_dir, config, &cancel).await
        }
        Err(e) => Err(e),
    };
    interrupt.abort();

    let summary = result?;
    if summary.report.len() > summary.report.succeeded() || !summary.discovery_failures.is_empty()
    {
        warn!(
            failed_exports = summary.report.len() - summary.report.succeeded(),
            failed_periods = summary.discovery_failures.len(),
            "Some items could not be exported, see the log above"
        );
    }
    Ok(())
}

fn print_download_info(periods: &[Period], output_dir: &Path) {
    let first = periods.first().map(ToString::to_string).unwrap_or_default();
    let last = periods.last().map(ToString::to_string).unwrap_or_default();
    info!(
        periods = periods.len(),
        start_period = %first,
        end_period = %last,
        output_dir = %output_dir.display(),
        "Starting export"
    );
}
