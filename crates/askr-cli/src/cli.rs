//! Argument definitions

use askr_core::Role;
use clap::{value_parser, Arg, ArgAction, Command};
use std::path::PathBuf;

/// Parse a role name as given on the command line
///
/// # Errors
/// Names that are not canonical role names
pub fn parse_role(value: &str) -> Result<Role, String> {
    value.parse::<Role>().map_err(|_| {
        format!(
            "invalid role '{value}', expected one of: {}",
            Role::names().join(", ")
        )
    })
}

/// The `askr` command
#[must_use]
pub fn command() -> Command {
    Command::new("askr")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Role-gated answers from structured knowledge and document search")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON on stderr"),
        )
        .subcommand(
            Command::new("ask")
                .about("Answer a question on behalf of a requester")
                .arg(
                    Arg::new("role")
                        .long("role")
                        .short('r')
                        .required(true)
                        .value_parser(parse_role)
                        .help("Requester role: Admin, HR, IT or User"),
                )
                .arg(
                    Arg::new("user")
                        .long("user")
                        .short('u')
                        .default_value("cli")
                        .help("Requester id, recorded in logs"),
                )
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .value_parser(value_parser!(PathBuf))
                        .help("JSON file with entries and documents for the in-memory backends"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Print the answer as JSON"),
                )
                .arg(
                    Arg::new("question")
                        .required(true)
                        .num_args(1..)
                        .help("Question text"),
                ),
        )
        .subcommand(
            Command::new("check-config")
                .about("Validate the configuration and print the effective values"),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_is_well_formed() {
        command().debug_assert();
    }

    #[test]
    fn ask_collects_role_user_and_question() {
        let matches = command()
            .try_get_matches_from(["askr", "ask", "--role", "IT", "--user", "u1", "Leave", "Policy"])
            .unwrap();
        let (name, args) = matches.subcommand().unwrap();

        assert_eq!(name, "ask");
        assert_eq!(args.get_one::<Role>("role"), Some(&Role::It));
        assert_eq!(args.get_one::<String>("user").map(String::as_str), Some("u1"));
        let words: Vec<&String> = args.get_many::<String>("question").unwrap().collect();
        assert_eq!(words, ["Leave", "Policy"]);
    }

    #[test]
    fn unknown_role_is_rejected() {
        let err = command()
            .try_get_matches_from(["askr", "ask", "--role", "Root", "anything"])
            .unwrap_err();

        assert!(err.to_string().contains("invalid role 'Root'"));
        assert_ne!(err.exit_code(), 0);
    }

    #[test]
    fn role_names_are_case_sensitive() {
        assert!(parse_role("it").is_err());
        assert_eq!(parse_role("HR"), Ok(Role::Hr));
    }

    #[test]
    fn config_flag_is_global() {
        let matches = command()
            .try_get_matches_from(["askr", "check-config", "--config", "askr.toml"])
            .unwrap();

        assert_eq!(
            matches.get_one::<PathBuf>("config"),
            Some(&PathBuf::from("askr.toml"))
        );
    }
}
