//! Presenting a finished publish run.
//!
//! Missing images and browser failures are warnings: they never turn a
//! published gist into a failed run.

use crate::output::{JsonOutput, OutputContext};
use crate::publisher::PublishResult;
use crate::remote::Browser;
use anyhow::Result;

/// Command name recorded in JSON metadata
pub const COMMAND: &str = "publish";

/// Print the result of a successful run, then open it in `browser` if given.
///
/// Returns every warning issued, including those the output context
/// suppresses under `--quiet` or `--json`.
pub fn report_result(
    result: &PublishResult,
    output: &OutputContext,
    browser: Option<&dyn Browser>,
) -> Result<Vec<String>> {
    let mut warnings: Vec<String> = result.missing.iter().map(ToString::to_string).collect();
    for warning in &warnings {
        output.print_warning(warning)?;
    }

    if output.is_json() {
        println!("{}", JsonOutput::success(result, COMMAND).to_json_string()?);
    } else {
        if !result.assets.is_empty() {
            output.print_info(format!("Uploaded {} image(s)", result.assets.len()))?;
        }
        output.print_data(format!("Done! Gist URL: {}", result.url))?;
    }

    if let Some(browser) = browser {
        if let Err(e) = browser.open(&result.url) {
            let warning = format!("Could not open browser: {}", e);
            output.print_warning(&warning)?;
            warnings.push(warning);
        }
    }

    Ok(warnings)
}
