//! Command line parsing for the `throughput` and `pairs` binaries.
//!
//! Flags take one or two leading dashes, with the value either in the next argument or after
//! an `=`.

use crate::harness::{Config, Exit, SEND_COUNT};
use std::{fmt, str::FromStr};

pub const THROUGHPUT_USAGE: &str = "\
Usage: throughput [--count <int>] [--send_count <int>]

  --count <int>       number of senders/receivers (default 2)
  --send_count <int>  number of messages sent by each sender (default 100000000)";

pub const PAIRS_USAGE: &str = "\
Usage: pairs [--await-all]

  --await-all  wait for every receiver to finish before exiting";

/// What the command line asks for.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Command<T> {
    Run(T),
    Help,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum CliError {
    /// The flag is not recognized.
    Unknown(String),

    /// The flag requires a value but none was given.
    MissingValue(String),

    /// The value could not be parsed as a non-negative integer.
    InvalidValue { flag: String, value: String },

    /// The flag is a switch but a value was given.
    UnexpectedValue(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use CliError::*;
        match self {
            Unknown(flag) => write!(f, "flag provided but not defined: -{}", flag),
            MissingValue(flag) => write!(f, "flag needs an argument: -{}", flag),
            InvalidValue { flag, value } => {
                write!(f, "invalid value {:?} for flag -{}", value, flag)
            }
            UnexpectedValue(flag) => write!(f, "flag does not take a value: -{}", flag),
        }
    }
}

impl std::error::Error for CliError {}

/// Splits `--name=value`, `-name value` and friends into a name and an inline value.
fn split(arg: &str) -> Option<(&str, Option<&str>)> {
    let flag = arg.strip_prefix("--").or_else(|| arg.strip_prefix('-'))?;

    if flag.is_empty() {
        return None;
    }

    Some(match flag.find('=') {
        Some(i) => (&flag[..i], Some(&flag[i + 1..])),
        None => (flag, None),
    })
}

fn value<T, I>(name: &str, inline: Option<&str>, args: &mut I) -> Result<T, CliError>
where
    T: FromStr,
    I: Iterator<Item = String>,
{
    let value = match inline {
        Some(v) => v.to_owned(),
        None => args
            .next()
            .ok_or_else(|| CliError::MissingValue(name.to_owned()))?,
    };

    value.parse().map_err(|_| CliError::InvalidValue {
        flag: name.to_owned(),
        value,
    })
}

/// Parses the arguments of the `throughput` binary, program name excluded.
pub fn throughput<I>(args: I) -> Result<Command<Config>, CliError>
where
    I: IntoIterator<Item = String>,
{
    let mut config = Config::default();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        let (name, inline) = split(&arg).ok_or_else(|| CliError::Unknown(arg.clone()))?;

        match name {
            "h" | "help" => return Ok(Command::Help),
            "count" => config.task_count = value(name, inline, &mut args)?,
            "send_count" => config.send_count = value(name, inline, &mut args)?,
            _ => return Err(CliError::Unknown(name.to_owned())),
        }
    }

    Ok(Command::Run(config))
}

/// Parses the arguments of the `pairs` binary, program name excluded.
///
/// The returned config always describes two pairs of the default message count.
pub fn pairs<I>(args: I) -> Result<Command<(Config, Exit)>, CliError>
where
    I: IntoIterator<Item = String>,
{
    let config = Config {
        task_count: 2,
        send_count: SEND_COUNT,
        ..Config::default()
    };

    let mut exit = Exit::Detached;

    for arg in args {
        let (name, inline) = split(&arg).ok_or_else(|| CliError::Unknown(arg.clone()))?;

        match (name, inline) {
            ("h", _) | ("help", _) => return Ok(Command::Help),
            ("await-all", None) => exit = Exit::AwaitAll,
            ("await-all", Some(_)) => return Err(CliError::UnexpectedValue(name.to_owned())),
            _ => return Err(CliError::Unknown(name.to_owned())),
        }
    }

    Ok(Command::Run((config, exit)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_strategy::proptest;

    fn args(line: &str) -> Vec<String> {
        line.split_whitespace().map(String::from).collect()
    }

    #[test]
    fn throughput_defaults_to_two_tasks_of_a_hundred_million_messages() {
        assert_eq!(
            throughput(args("")),
            Ok(Command::Run(Config {
                task_count: 2,
                send_count: 100_000_000,
                ..Config::default()
            }))
        );
    }

    #[proptest]
    fn throughput_accepts_every_flag_form(count: usize, send_count: u64) {
        let expected = Ok(Command::Run(Config {
            task_count: count,
            send_count,
            ..Config::default()
        }));

        let forms = [
            format!("--count {} --send_count {}", count, send_count),
            format!("-count {} -send_count {}", count, send_count),
            format!("--count={} -send_count={}", count, send_count),
            format!("-send_count={} --count {}", send_count, count),
        ];

        for form in &forms {
            assert_eq!(throughput(args(form)), expected);
        }
    }

    #[test]
    fn throughput_accepts_zero_tasks() {
        match throughput(args("--count 0")) {
            Ok(Command::Run(config)) => assert_eq!(config.task_count, 0),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn throughput_asks_for_help() {
        assert_eq!(throughput(args("-h")), Ok(Command::Help));
        assert_eq!(throughput(args("--count 3 --help")), Ok(Command::Help));
    }

    #[test]
    fn throughput_rejects_bad_input() {
        assert_eq!(
            throughput(args("--threads 4")),
            Err(CliError::Unknown("threads".into()))
        );

        assert_eq!(
            throughput(args("stray")),
            Err(CliError::Unknown("stray".into()))
        );

        assert_eq!(
            throughput(args("--count")),
            Err(CliError::MissingValue("count".into()))
        );

        assert_eq!(
            throughput(args("--send_count -5")),
            Err(CliError::InvalidValue {
                flag: "send_count".into(),
                value: "-5".into(),
            })
        );
    }

    #[test]
    fn pairs_detach_by_default() {
        match pairs(args("")) {
            Ok(Command::Run((config, exit))) => {
                assert_eq!(config.task_count, 2);
                assert_eq!(config.send_count, 100_000_000);
                assert_eq!(exit, Exit::Detached);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn pairs_await_all_on_request() {
        match pairs(args("--await-all")) {
            Ok(Command::Run((_, exit))) => assert_eq!(exit, Exit::AwaitAll),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn pairs_reject_bad_input() {
        assert_eq!(
            pairs(args("--await-all=yes")),
            Err(CliError::UnexpectedValue("await-all".into()))
        );

        assert_eq!(
            pairs(args("--count 3")),
            Err(CliError::Unknown("count".into()))
        );
    }

    #[test]
    fn errors_name_the_offending_flag() {
        assert_eq!(
            CliError::Unknown("threads".into()).to_string(),
            "flag provided but not defined: -threads"
        );

        assert_eq!(
            CliError::MissingValue("count".into()).to_string(),
            "flag needs an argument: -count"
        );
    }
}
