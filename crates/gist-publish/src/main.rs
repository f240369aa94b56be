//! gist-publish
//!
//! Publishes a markdown file as a GitHub gist. Local images referenced by
//! the document are pushed into the gist's git repository and the
//! references rewritten to their hosted URLs.

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use gist_publish::cli::Cli;
use gist_publish::config::PublishConfig;
use gist_publish::output::{ExitCode, JsonError, OutputContext};
use gist_publish::publisher::{PublishRequest, PublishResult, PublishSettings, Publisher};
use gist_publish::remote::{Browser, GhCli, SystemBrowser};
use gist_publish::report::{report_result, COMMAND};
use gist_publish::PublishError;
use std::fmt;
use tracing_subscriber::EnvFilter;

/// Environment variable holding a tracing filter directive
const LOG_ENV: &str = "GIST_PUBLISH_LOG";

/// Context attached to every config loading failure
#[derive(Debug)]
struct InvalidConfig;

impl fmt::Display for InvalidConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid configuration")
    }
}

/// Helper to determine exit code for errors that are not `PublishError`
fn error_to_exit_code(error: &anyhow::Error) -> ExitCode {
    if error.downcast_ref::<InvalidConfig>().is_some() {
        return ExitCode::InvalidArgument;
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        return match io_error.kind() {
            std::io::ErrorKind::NotFound => ExitCode::NotFound,
            std::io::ErrorKind::PermissionDenied => ExitCode::PermissionDenied,
            _ => ExitCode::ExternalError,
        };
    }

    let error_msg = format!("{:#}", error).to_lowercase();
    if error_msg.contains("not found") || error_msg.contains("no such file") {
        ExitCode::NotFound
    } else if error_msg.contains("invalid") {
        ExitCode::InvalidArgument
    } else {
        ExitCode::GenericError
    }
}

/// Print an error in the requested format and pick the exit code.
fn report_error(error: &anyhow::Error, output: &OutputContext) -> ExitCode {
    if let Some(publish_error) = error.downcast_ref::<PublishError>() {
        if output.is_json() {
            let json_error = JsonError::from_publish_error(publish_error, COMMAND);
            print_json_error(&json_error, output);
            return json_error.exit_code();
        }
        let message = publish_error.actionable().to_error_message();
        let _ = output.print_error(message.trim_end());
        return publish_error.exit_code();
    }

    let exit_code = error_to_exit_code(error);
    if output.is_json() {
        let json_error = JsonError::new("GENERIC_ERROR", format!("{:#}", error), COMMAND)
            .with_exit_code(exit_code);
        print_json_error(&json_error, output);
    } else {
        let _ = output.print_error(format!("Error: {:#}", error));
    }
    exit_code
}

fn print_json_error(json_error: &JsonError, output: &OutputContext) {
    match json_error.to_json_string() {
        Ok(json) => println!("{}", json),
        Err(e) => {
            let _ = output.print_error(format!("Error: {}", e));
        }
    }
}

/// Install the stderr log subscriber.
///
/// `GIST_PUBLISH_LOG` wins; otherwise `-v` selects info and `-vv` debug.
fn init_tracing(verbose: u8) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
        let level = match verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        };
        EnvFilter::new(format!("gist_publish={level}"))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let output = OutputContext::new(cli.quiet, cli.json);

    let exit_code = match run(&cli, &output) {
        Ok(()) => ExitCode::Success,
        Err(e) => report_error(&e, &output),
    };

    if exit_code != ExitCode::Success {
        std::process::exit(exit_code.code());
    }
}

fn run(cli: &Cli, output: &OutputContext) -> Result<()> {
    // Handle --schema flag first
    if cli.schema {
        let schema = schemars::schema_for!(PublishResult);
        println!("{}", serde_json::to_string_pretty(&schema)?);
        return Ok(());
    }

    let markdown_file = cli
        .markdown_file
        .clone()
        .ok_or_else(|| anyhow!("No markdown file provided. Use --help for usage."))?;

    let config = PublishConfig::discover(cli.config.as_deref()).context(InvalidConfig)?;
    let host = GhCli::from_config(&config);
    let publisher = Publisher::new(&host, PublishSettings::from_config(&config));
    let request = PublishRequest {
        markdown_file,
        name: cli.name.clone(),
        public: cli.public || config.public(),
        description: cli.desc.clone(),
    };

    output.print_info(format!("Processing: {}", request.markdown_file.display()))?;
    let prepared = publisher.prepare(&request)?;
    output.print_info(format!(
        "Found {} local image reference(s)",
        prepared.local_reference_count()
    ))?;
    for asset in &prepared.resolution.assets {
        output.print_info(format!("  {} -> {}", asset.reference, asset.stored_name))?;
    }
    output.print_info("\nCreating gist...")?;

    let result = publisher.publish_prepared(&prepared, |hosted| {
        let _ = output.print_info(format!("Gist created: {}", hosted.url));
    })?;

    let browser = SystemBrowser;
    report_result(&result, output, cli.web.then_some(&browser as &dyn Browser))?;

    Ok(())
}
