//! Allergy Detector command-line shell.
//!
//! Argument parsing, configuration loading and rendering live here; the
//! scan workflow and the admin console come from the workspace crates.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod cli;
pub mod commands;
pub mod error;
pub mod output;
pub mod state;

pub use cli::{Cli, Commands, OutputFormat};
pub use error::CliError;
pub use output::{OutputWriter, Render};
pub use state::AppState;

use tracing::info;

/// Default log filter when neither `--log-level` nor `RUST_LOG` is set.
const DEFAULT_FILTER: &str = "info,allergen=debug";

/// Initialize tracing. Logs go to stderr so stdout stays parseable.
///
/// `override_filter` (from `--log-level`) wins over `RUST_LOG`.
pub fn init_tracing(override_filter: Option<&str>) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = override_filter
        .and_then(|f| EnvFilter::try_new(f).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Run a parsed command line.
pub async fn run(cli: Cli) -> Result<(), CliError> {
    info!("Starting allergen v{}", env!("CARGO_PKG_VERSION"));

    let state = AppState::load(cli.config.as_deref())?;
    let output = OutputWriter::new(cli.output);

    match &cli.command {
        Commands::Allergens => commands::allergens::execute(&state, &output).await,
        Commands::Scan(args) => commands::scan::execute(&state, args, &output).await,
        Commands::Admin(args) => commands::admin::execute(&state, &args.action, &output).await,
    }
}
