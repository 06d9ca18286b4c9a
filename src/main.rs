use polar_flow_cli::{cli, errors};
use tracing_subscriber::EnvFilter;

fn main() -> errors::AppResult<()> {
    init_logging();

    let rt = tokio::runtime::Runtime::new().map_err(|e| errors::AppError::Io(e.to_string()))?;
    rt.block_on(cli::cli())
}

/// Logs to stderr; `RUST_LOG` overrides the default `info` level.
fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
