// SPDX-License-Identifier: Apache-2.0

//! Fatal error reporting for the driver.
//!
//! Errors from the library carry structured context (which chip, which
//! lengths, where in the stream); it is printed as indented `key: value`
//! lines under the one-line message.

use colored::Colorize;
use rtmin::{MinimisationFailed, TableFormatError};

pub fn report_cli_error_and_exit(
    message: &str,
    subcommand: Option<&str>,
    details: Vec<(&str, String)>,
) -> ! {
    let subcommand_str = subcommand.map_or(String::new(), |s| format!("{}: ", s));
    eprintln!("rtmin-driver: {}{}", subcommand_str, message.red().bold());
    for (key, value) in details {
        eprintln!("  {}: {}", key, value);
    }
    std::process::exit(1);
}

fn chip_str(chip: (u8, u8)) -> String {
    format!("({}, {})", chip.0, chip.1)
}

/// Key/value lines describing `error`: the structured fields of any library
/// error in its chain, then each underlying cause.
pub fn error_details(error: &anyhow::Error) -> Vec<(&'static str, String)> {
    let mut details = Vec::new();
    for cause in error.chain() {
        if let Some(failed) = cause.downcast_ref::<MinimisationFailed>() {
            if let Some(chip) = failed.chip {
                details.push(("chip", chip_str(chip)));
            }
            details.push(("target length", failed.target_length.to_string()));
            details.push(("best length", failed.final_length.to_string()));
        } else if let Some(format_error) = cause.downcast_ref::<TableFormatError>() {
            match format_error {
                TableFormatError::TruncatedHeader { offset } => {
                    details.push(("byte offset", offset.to_string()));
                }
                TableFormatError::TruncatedEntry {
                    chip,
                    index,
                    offset,
                } => {
                    details.push(("chip", chip_str(*chip)));
                    details.push(("entry", index.to_string()));
                    details.push(("byte offset", offset.to_string()));
                }
                TableFormatError::TableTooLong { chip, len } => {
                    details.push(("chip", chip_str(*chip)));
                    details.push(("entries", len.to_string()));
                }
                TableFormatError::Io(_) => {}
            }
        }
    }
    for cause in error.chain().skip(1) {
        details.push(("caused by", cause.to_string()));
    }
    details
}

/// Reports a failed subcommand and exits.
pub fn report_subcommand_error_and_exit(subcommand: &str, error: &anyhow::Error) -> ! {
    report_cli_error_and_exit(&error.to_string(), Some(subcommand), error_details(error))
}
