use allergen_cli::{Cli, CliError, OutputFormat};
use clap::Parser;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    allergen_cli::init_tracing(cli.log_level.as_deref());
    let format = cli.output;

    match allergen_cli::run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(&err, format);
            ExitCode::from(err.exit_code())
        }
    }
}

fn report(err: &CliError, format: OutputFormat) {
    // The report itself was already printed; only the exit code is left
    if matches!(err, CliError::AllergensDetected(_)) {
        return;
    }

    match format {
        OutputFormat::Json => match serde_json::to_string_pretty(&err.report()) {
            Ok(json) => println!("{json}"),
            Err(_) => eprintln!("Error: {err}"),
        },
        OutputFormat::Text => eprintln!("Error: {err}"),
    }
}
