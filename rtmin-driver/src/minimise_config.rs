// SPDX-License-Identifier: Apache-2.0

use clap::ArgMatches;
use rtmin::{OrderedCoveringOptions, Strategy};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MinimiseConfig {
    /// Maximum number of entries a chip's table may have after minimisation.
    pub target_length: Option<u32>,

    /// Strategies tried, in order, by the `minimise` subcommand.
    pub methods: Option<Vec<Strategy>>,

    /// Largest key distance Ordered Covering considers for a merge.
    pub max_key_distance: Option<u32>,

    /// Verify that each minimised table forwards exactly like its input.
    pub check_equivalence: Option<bool>,
}

/// Top level of an `rtmin.toml` file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RtminConfig {
    #[serde(default)]
    pub minimise: MinimiseConfig,
}

pub fn parse_config(toml_str: &str) -> anyhow::Result<RtminConfig> {
    Ok(toml::from_str(toml_str)?)
}

fn config_section(config: &Option<RtminConfig>) -> Option<&MinimiseConfig> {
    config.as_ref().map(|c| &c.minimise)
}

/// Target length from the command line flag, if given, or else the config.
pub fn get_target_length(matches: &ArgMatches, config: &Option<RtminConfig>) -> Option<u32> {
    if let Some(target) = matches.get_one::<u32>("target_length") {
        Some(*target)
    } else {
        config_section(config).and_then(|c| c.target_length)
    }
}

pub fn get_methods(matches: &ArgMatches, config: &Option<RtminConfig>) -> Vec<Strategy> {
    if let Some(methods) = matches.get_many::<Strategy>("methods") {
        methods.copied().collect()
    } else if let Some(methods) = config_section(config).and_then(|c| c.methods.clone()) {
        methods
    } else {
        Strategy::default_methods()
    }
}

pub fn get_ordered_covering_options(
    matches: &ArgMatches,
    config: &Option<RtminConfig>,
) -> OrderedCoveringOptions {
    let mut options = OrderedCoveringOptions::default();
    if let Some(distance) = matches.get_one::<u32>("max_key_distance") {
        options.max_key_distance = *distance;
    } else if let Some(distance) = config_section(config).and_then(|c| c.max_key_distance) {
        options.max_key_distance = distance;
    }
    options
}

pub fn get_check_equivalence(matches: &ArgMatches, config: &Option<RtminConfig>) -> bool {
    if let Some(check) = matches.get_one::<String>("check_equivalence") {
        check == "true"
    } else {
        config_section(config)
            .and_then(|c| c.check_equivalence)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::{Arg, ArgAction, Command};
    use pretty_assertions::assert_eq;

    fn command() -> Command {
        Command::new("test")
            .arg(
                Arg::new("target_length")
                    .long("target-length")
                    .value_parser(clap::value_parser!(u32)),
            )
            .arg(
                Arg::new("methods")
                    .long("methods")
                    .value_delimiter(',')
                    .value_parser(|s: &str| s.parse::<Strategy>()),
            )
            .arg(
                Arg::new("max_key_distance")
                    .long("max-key-distance")
                    .value_parser(clap::value_parser!(u32)),
            )
            .arg(
                Arg::new("check_equivalence")
                    .long("check-equivalence")
                    .action(ArgAction::Set)
                    .value_parser(["true", "false"]),
            )
    }

    fn sample_config() -> Option<RtminConfig> {
        Some(
            parse_config(
                r#"
[minimise]
target_length = 1023
methods = ["mtrie", "ordered-covering"]
max_key_distance = 6
check_equivalence = true
"#,
            )
            .unwrap(),
        )
    }

    #[test]
    fn test_defaults_without_config() {
        let matches = command().get_matches_from(["test"]);
        assert_eq!(get_target_length(&matches, &None), None);
        assert_eq!(get_methods(&matches, &None), Strategy::default_methods());
        assert_eq!(
            get_ordered_covering_options(&matches, &None),
            OrderedCoveringOptions::default()
        );
        assert!(!get_check_equivalence(&matches, &None));
    }

    #[test]
    fn test_config_supplies_values() {
        let matches = command().get_matches_from(["test"]);
        let config = sample_config();
        assert_eq!(get_target_length(&matches, &config), Some(1023));
        assert_eq!(
            get_methods(&matches, &config),
            vec![Strategy::MTrie, Strategy::OrderedCovering]
        );
        assert_eq!(
            get_ordered_covering_options(&matches, &config).max_key_distance,
            6
        );
        assert!(get_check_equivalence(&matches, &config));
    }

    #[test]
    fn test_flags_override_config() {
        let matches = command().get_matches_from([
            "test",
            "--target-length=10",
            "--methods=identity,remove-default-routes",
            "--max-key-distance=2",
            "--check-equivalence=false",
        ]);
        let config = sample_config();
        assert_eq!(get_target_length(&matches, &config), Some(10));
        assert_eq!(
            get_methods(&matches, &config),
            vec![Strategy::Identity, Strategy::RemoveDefaultRoutes]
        );
        assert_eq!(
            get_ordered_covering_options(&matches, &config).max_key_distance,
            2
        );
        assert!(!get_check_equivalence(&matches, &config));
    }

    #[test]
    fn test_empty_config_is_accepted() {
        let config = parse_config("").unwrap();
        assert_eq!(config.minimise.target_length, None);
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        assert!(parse_config("[minimise]\ntarget_lenght = 3\n").is_err());
        assert!(parse_config("[minimise]\nmethods = [\"espresso\"]\n").is_err());
    }
}
