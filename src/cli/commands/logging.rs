use clap::{builder::ValueParser, Arg, ArgAction, Command};

pub const ARG_VERBOSITY: &str = "verbosity";

/// Level names in verbosity order. The index is the `-v` count.
const LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

fn parse_level(level: &str) -> Result<u8, String> {
    let level = level.trim();
    let index = match level.parse::<usize>() {
        Ok(count) => Some(count).filter(|count| *count < LEVELS.len()),
        Err(_) => LEVELS.iter().position(|name| name.eq_ignore_ascii_case(level)),
    };

    index
        .and_then(|index| u8::try_from(index).ok())
        .ok_or_else(|| {
            format!(
                "invalid log level '{level}', expected 0-4 or one of: {}",
                LEVELS.join(", ")
            )
        })
}

/// `STOREFRONT_LOG_LEVEL` accepts a level name or its `-v` count.
#[must_use]
pub fn validator_log_level() -> ValueParser {
    ValueParser::from(parse_level)
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command.arg(
        Arg::new(ARG_VERBOSITY)
            .short('v')
            .long("verbose")
            .help("Log verbosity: -v WARN, -vv INFO, -vvv DEBUG, -vvvv TRACE (default: ERROR)")
            .env("STOREFRONT_LOG_LEVEL")
            .global(true)
            .action(ArgAction::Count)
            .value_parser(validator_log_level()),
    )
}
