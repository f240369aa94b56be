//! Command-line interface definitions using clap.

use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// Publish a markdown file as a GitHub gist, images included
///
/// Local images referenced by the document are uploaded into the gist's
/// git repository and their references rewritten to the hosted URLs.
/// Missing images are reported as warnings and left as they are.
///
/// Requires the GitHub CLI (gh) authenticated via 'gh auth login', and git.
///
/// Exit Codes:
///   0  - Published (possibly with warnings about missing images)
///   1  - Generic error occurred
///   2  - Invalid arguments, usage or config file error
///   3  - Markdown file not found
///   5  - Authentication or permission failure
///  10  - External tool failed (gh, git, network, gist left unfinished)
#[derive(Parser, Debug)]
#[command(name = "gist-publish")]
#[command(version, about = "Publish markdown with local images as a GitHub gist")]
pub struct Cli {
    /// Markdown file to publish
    #[arg(required_unless_present = "schema")]
    pub markdown_file: Option<PathBuf>,

    /// Filename for the markdown inside the gist (".md" appended if missing)
    #[arg(long)]
    pub name: Option<String>,

    /// Create a public gist (default is secret)
    #[arg(long)]
    pub public: bool,

    /// Gist description
    #[arg(long)]
    pub desc: Option<String>,

    /// Open the gist in a browser when done
    #[arg(long)]
    pub web: bool,

    /// Config file (default: $GIST_PUBLISH_CONFIG or <config dir>/gist-publish/config.toml)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Suppress non-essential output (for scripting)
    #[arg(short, long)]
    pub quiet: bool,

    /// Output the result as JSON
    #[arg(long)]
    pub json: bool,

    /// Increase log verbosity (-v info, -vv debug); GIST_PUBLISH_LOG overrides
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Print the JSON schema of the --json result and exit
    #[arg(long)]
    pub schema: bool,
}
