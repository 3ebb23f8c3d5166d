//! Command-line definition

use clap::{value_parser, Arg, ArgAction, Command};
use std::path::PathBuf;

/// Command-line definition
#[must_use]
pub fn cli() -> Command {
    Command::new("admission-cli")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Admission wizard draft sync")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("base-url")
                .long("base-url")
                .global(true)
                .help("Admissions API root, e.g. https://host/api"),
        )
        .arg(
            Arg::new("token")
                .long("token")
                .global(true)
                .help("Bearer token of the signed-in applicant"),
        )
        .arg(
            Arg::new("data-dir")
                .long("data-dir")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Directory for the device copy of the draft"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON"),
        )
        .subcommand(
            Command::new("status")
                .about("Show draft or submission state")
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
        .subcommand(
            Command::new("set")
                .about("Set one field and save")
                .arg(Arg::new("field").required(true).help("camelCase field name"))
                .arg(Arg::new("value").required(true).help("New value; empty clears")),
        )
        .subcommand(
            Command::new("step")
                .about("Move to a wizard step and save")
                .arg(
                    Arg::new("n")
                        .required(true)
                        .value_parser(value_parser!(u8))
                        .help("Step number"),
                ),
        )
        .subcommand(Command::new("submit").about("Submit the application"))
        .subcommand(Command::new("reset").about("Delete the device copy and submission state"))
}
