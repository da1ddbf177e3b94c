//! specmock CLI
//!
//! Command-line interface for checking Pact mocks against Swagger/OpenAPI
//! specs.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use specmock::{load_document_auto, validate, ValidateOptions, ValidationOutcome};

#[derive(Parser)]
#[command(name = "specmock")]
#[command(about = "Check Pact mock interactions against a Swagger/OpenAPI spec")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a Pact mock file against a spec file
    Validate {
        /// Mock source: file path or URL (http:// or https://)
        mock: String,

        /// Spec source: file path or URL (http:// or https://)
        spec: String,

        /// Allow undeclared properties in response bodies
        #[arg(long)]
        additional_properties_in_response: bool,

        /// Enforce required properties in response bodies
        #[arg(long)]
        required_properties_in_response: bool,

        /// Output the full outcome as JSON (for automation)
        #[arg(long)]
        json: bool,

        /// Pretty-print JSON output
        #[arg(long, requires = "json")]
        pretty: bool,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Validate {
            mock,
            spec,
            additional_properties_in_response,
            required_properties_in_response,
            json,
            pretty,
        } => run_validate(
            &mock,
            &spec,
            ValidateOptions {
                additional_properties_in_response,
                required_properties_in_response,
            },
            json,
            pretty,
        ),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

fn run_validate(
    mock_source: &str,
    spec_source: &str,
    options: ValidateOptions,
    json: bool,
    pretty: bool,
) -> Result<(), u8> {
    let mock_document = load_document_auto(mock_source).map_err(|e| {
        eprintln!("Error: {e}");
        e.exit_code() as u8
    })?;
    let spec_document = load_document_auto(spec_source).map_err(|e| {
        eprintln!("Error: {e}");
        e.exit_code() as u8
    })?;

    let outcome = validate(
        &spec_document,
        spec_source,
        &mock_document,
        mock_source,
        &options,
    )
    .map_err(|e| {
        eprintln!("Error: {e}");
        e.exit_code() as u8
    })?;

    if json {
        print_json(&outcome, pretty)?;
    } else {
        print_text(&outcome);
    }

    if outcome.success {
        Ok(())
    } else {
        Err(1)
    }
}

fn print_json(outcome: &ValidationOutcome, pretty: bool) -> Result<(), u8> {
    let rendered = if pretty {
        serde_json::to_string_pretty(outcome)
    } else {
        serde_json::to_string(outcome)
    }
    .map_err(|e| {
        eprintln!("Error serializing output: {e}");
        2u8
    })?;
    println!("{rendered}");
    Ok(())
}

fn print_text(outcome: &ValidationOutcome) {
    for error in &outcome.errors {
        println!("error: {} - {}", error.code, error.message);
        println!("    mock: {}", error.mock_details.location);
        println!("    spec: {}", error.spec_details.location);
    }
    for warning in &outcome.warnings {
        println!("warning: {} - {}", warning.code, warning.message);
        println!("    mock: {}", warning.mock_details.location);
        println!("    spec: {}", warning.spec_details.location);
    }

    if outcome.success {
        println!(
            "{} error(s), {} warning(s): mock is compatible with spec",
            outcome.errors.len(),
            outcome.warnings.len()
        );
    } else if let Some(reason) = &outcome.failure_reason {
        println!(
            "{} error(s), {} warning(s): {reason}",
            outcome.errors.len(),
            outcome.warnings.len()
        );
    }
}
