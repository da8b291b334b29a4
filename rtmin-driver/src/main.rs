// SPDX-License-Identifier: Apache-2.0

//! Command line driver for router table minimisation.
//!
//! Tables are read from and written to the binary per-chip format understood
//! by `rtmin::table_serdes`. For example:
//!
//! ```shell
//! $ rtmin-driver ordered-covering routes.bin routes.min.bin --target-length=1023
//! (  0,   0)	1612	 801
//! ```
//!
//! Defaults for the minimising subcommands can be given in an `rtmin.toml`,
//! either named with `--config` or found in the current directory:
//!
//! ```toml
//! [minimise]
//! target_length = 1023
//! methods = ["remove-default-routes", "ordered-covering"]
//! max_key_distance = 4
//! check_equivalence = false
//! ```
//!
//! Command line flags take precedence over the config.

mod common;
mod dump;
mod minimise;
mod minimise_config;
mod mtrie;
mod ordered_covering;
mod remove_default_routes;
mod report_cli_error;

use clap::{Arg, ArgAction};
use report_cli_error::{report_cli_error_and_exit, report_subcommand_error_and_exit};
use rtmin::Strategy;

use crate::minimise_config::RtminConfig;

const CONFIG_FILE_NAME: &str = "rtmin.toml";

trait AppExt {
    fn add_in_out_args(self) -> Self;
    fn add_target_length_arg(self) -> Self;
    fn add_max_key_distance_arg(self) -> Self;
    fn add_bool_arg(self, id: &'static str, long: &'static str, help: &'static str) -> Self;
}

impl AppExt for clap::Command {
    fn add_in_out_args(self) -> Self {
        (self as clap::Command)
            .arg(
                Arg::new("in_file")
                    .help("Routing tables to minimise")
                    .required(true)
                    .index(1),
            )
            .arg(
                Arg::new("out_file")
                    .help("Where to write the minimised tables")
                    .required(true)
                    .index(2),
            )
    }

    fn add_target_length_arg(self) -> Self {
        (self as clap::Command).arg(
            Arg::new("target_length")
                .long("target-length")
                .value_name("ENTRIES")
                .help("Stop minimising a chip once its table has at most this many entries")
                .value_parser(clap::value_parser!(u32))
                .action(ArgAction::Set),
        )
    }

    fn add_max_key_distance_arg(self) -> Self {
        (self as clap::Command).arg(
            Arg::new("max_key_distance")
                .long("max-key-distance")
                .value_name("BITS")
                .help("Largest number of key bits two entries may differ on and still be merged")
                .value_parser(clap::value_parser!(u32))
                .action(ArgAction::Set),
        )
    }

    /// Boolean flags take an explicit `true`/`false` so that they can
    /// override the config in either direction.
    fn add_bool_arg(self, id: &'static str, long: &'static str, help: &'static str) -> Self {
        (self as clap::Command).arg(
            Arg::new(id)
                .long(long)
                .value_name("BOOL")
                .action(ArgAction::Set)
                .value_parser(["true", "false"])
                .num_args(1)
                .help(help),
        )
    }
}

fn load_config(matches: &clap::ArgMatches) -> Option<RtminConfig> {
    let mut toml_path: Option<String> = matches.get_one::<String>("config").map(|s| s.to_string());

    // If there is no config flag specified, but there is an rtmin.toml in the
    // current directory, use that.
    if toml_path.is_none() {
        let cwd_toml_path = std::path::Path::new(CONFIG_FILE_NAME);
        if cwd_toml_path.exists() {
            log::info!("Using {} in current directory", CONFIG_FILE_NAME);
            toml_path = Some(CONFIG_FILE_NAME.to_string());
        }
    }

    toml_path.map(|path| {
        let toml_str = match std::fs::read_to_string(&path) {
            Ok(s) => s,
            Err(e) => report_cli_error_and_exit(
                "could not read config file",
                None,
                vec![("path", path.clone()), ("error", e.to_string())],
            ),
        };
        match minimise_config::parse_config(&toml_str) {
            Ok(config) => config,
            Err(e) => report_cli_error_and_exit(
                "could not parse config file",
                None,
                vec![("path", path.clone()), ("error", format!("{:#}", e))],
            ),
        }
    })
}

fn main() {
    let _ = env_logger::try_init();

    log::info!(
        "rtmin-driver starting; version: {}",
        env!("CARGO_PKG_VERSION")
    );

    let matches = clap::Command::new("rtmin-driver")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Minimises multicast router tables")
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("CONFIG")
                .help("Path to an rtmin.toml file")
                .global(true)
                .action(ArgAction::Set),
        )
        .subcommand(clap::Command::new("version").about("Prints the version of the driver"))
        .subcommand(
            clap::Command::new("mtrie")
                .about("Minimises orthogonal tables with the m-Trie")
                .add_in_out_args()
                .add_target_length_arg()
                .add_bool_arg(
                    "check_equivalence",
                    "check-equivalence",
                    "Verify each minimised table forwards exactly like its input",
                ),
        )
        .subcommand(
            clap::Command::new("ordered-covering")
                .about("Minimises tables with Ordered Covering")
                .add_in_out_args()
                .add_target_length_arg()
                .add_max_key_distance_arg()
                .add_bool_arg(
                    "check_equivalence",
                    "check-equivalence",
                    "Verify each minimised table forwards exactly like its input",
                ),
        )
        .subcommand(
            clap::Command::new("remove-default-routes")
                .about("Drops entries that the router's default routing reproduces")
                .add_in_out_args()
                .add_target_length_arg(),
        )
        .subcommand(
            clap::Command::new("minimise")
                .about("Tries several strategies per chip and fails if a table cannot be made to fit")
                .add_in_out_args()
                .add_target_length_arg()
                .add_max_key_distance_arg()
                .arg(
                    Arg::new("methods")
                        .long("methods")
                        .value_name("METHODS")
                        .help("Comma-separated strategies to try in order: identity, remove-default-routes, mtrie, ordered-covering")
                        .value_delimiter(',')
                        .value_parser(|s: &str| s.parse::<Strategy>())
                        .action(ArgAction::Set),
                ),
        )
        .subcommand(
            clap::Command::new("dump")
                .about("Prints the tables in a file")
                .arg(
                    Arg::new("in_file")
                        .help("Routing tables to print")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("Print as JSON")
                        .action(ArgAction::SetTrue),
                ),
        )
        .get_matches();

    let config = load_config(&matches);

    let (subcommand, result) = if let Some(matches) = matches.subcommand_matches("mtrie") {
        ("mtrie", mtrie::handle_mtrie(matches, &config))
    } else if let Some(matches) = matches.subcommand_matches("ordered-covering") {
        (
            "ordered-covering",
            ordered_covering::handle_ordered_covering(matches, &config),
        )
    } else if let Some(matches) = matches.subcommand_matches("remove-default-routes") {
        (
            "remove-default-routes",
            remove_default_routes::handle_remove_default_routes(matches, &config),
        )
    } else if let Some(matches) = matches.subcommand_matches("minimise") {
        ("minimise", minimise::handle_minimise(matches, &config))
    } else if let Some(matches) = matches.subcommand_matches("dump") {
        ("dump", dump::handle_dump(matches))
    } else if let Some(_matches) = matches.subcommand_matches("version") {
        println!("{}", env!("CARGO_PKG_VERSION"));
        return;
    } else {
        report_cli_error_and_exit("No valid subcommand provided.", None, vec![]);
    };

    if let Err(e) = result {
        report_subcommand_error_and_exit(subcommand, &e);
    }
}
