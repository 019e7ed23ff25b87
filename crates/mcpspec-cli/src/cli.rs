use std::ffi::OsString;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Arg, ArgAction, Command, value_parser};
use tracing_subscriber::EnvFilter;

use crate::commands::sync::{self, SyncRequest};
use crate::error::CliError;
use crate::formatter::{OutputFormat, emit_result};
use crate::util::Verbosity;

const NAME: &str = "mcpspec";
const DEFAULT_DOCUMENT: &str = "openapi.yaml";

pub fn run() -> ExitCode {
    match run_cli(std::env::args()) {
        Ok(code) => code,
        Err(err) => {
            err.print();
            err.exit_code()
        }
    }
}

/// Parses CLI arguments, runs one fetch-and-reconcile pass, and reports the outcome.
/// Returns a POSIX `sysexits`-compatible `ExitCode` so automation can react deterministically.
pub fn run_cli<I, S>(args: I) -> Result<ExitCode, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<OsString> + Clone,
{
    let command = build_cli();
    let matches = command.try_get_matches_from(args)?;

    let verbosity = Verbosity {
        json: matches.get_flag("json"),
        verbose: matches.get_flag("verbose"),
    };
    init_tracing(verbosity.verbose);
    let output = if verbosity.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    let request = SyncRequest::from_matches(&matches)?;
    if verbosity.verbose {
        tracing::info!(
            document = %request.document_path.display(),
            endpoint = %request.endpoint,
            headers = request.headers.len(),
            settle_ms = request.settle_delay.as_millis() as u64,
            dry_run = request.dry_run,
            "resolved sync request"
        );
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(sync::run(&request))?;
    emit_result(result, output)
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Defines the root `clap::Command`. The tool has a single operation, so every
/// flag lives on the root command.
fn build_cli() -> Command {
    Command::new(NAME)
        .about("Sync the tool listing of an MCP server into an OpenAPI document")
        .version(env!("CARGO_PKG_VERSION"))
        .arg(
            Arg::new("openapi-file")
                .short('f')
                .long("openapi-file")
                .value_name("PATH")
                .value_parser(value_parser!(PathBuf))
                .default_value(DEFAULT_DOCUMENT)
                .help("Document to create or update."),
        )
        .arg(
            Arg::new("server-url")
                .short('s')
                .long("server-url")
                .value_name("URL")
                .required(true)
                .help("Absolute URL of the MCP server's streamable HTTP endpoint."),
        )
        .arg(
            Arg::new("header")
                .short('H')
                .long("header")
                .value_name("KEY: VALUE")
                .action(ArgAction::Append)
                .help("Extra request header, e.g. \"Authorization: Bearer <token>\". Repeatable."),
        )
        .arg(
            Arg::new("settle-ms")
                .long("settle-ms")
                .value_name("MS")
                .value_parser(value_parser!(u64))
                .default_value("0")
                .help("Milliseconds to wait after the handshake before reading from the server."),
        )
        .arg(
            Arg::new("dry-run")
                .long("dry-run")
                .action(ArgAction::SetTrue)
                .help("Print the merged document instead of writing it."),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .action(ArgAction::SetTrue)
                .help("Emit the result as a JSON object instead of human-readable text."),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .action(ArgAction::SetTrue)
                .help("Log the resolved request and merge details to stderr."),
        )
}
