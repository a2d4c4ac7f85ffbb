use std::env;

use anyhow::{Context, Result};
use argh::FromArgs;
use log::LevelFilter;

use crate::tokenizer::DEFAULT_MAX_TOKENS;

pub const DEFAULT_PROMPT: &str = "shell> ";
pub const DEFAULT_MAX_NESTING: usize = 8;
pub const DEFAULT_NESTED_COMMAND: &str = "./shell";
pub const LOG_ENV: &str = "VTSH_LOG";

/// A minimal interactive command interpreter.
#[derive(FromArgs, Debug)]
pub struct Args {
    /// prompt shown when standard input is a terminal
    #[argh(option, default = "String::from(DEFAULT_PROMPT)")]
    pub prompt: String,

    /// maximum number of tokens accepted on one line
    #[argh(option, default = "DEFAULT_MAX_TOKENS")]
    pub max_tokens: usize,

    /// how deep nested interpreter loops may go
    #[argh(option, default = "DEFAULT_MAX_NESTING")]
    pub max_nesting: usize,

    /// command word that starts a nested interpreter loop
    #[argh(option, default = "String::from(DEFAULT_NESTED_COMMAND)")]
    pub nested_command: String,

    /// do not print exit status and elapsed time after each command
    #[argh(switch)]
    pub no_timing: bool,

    /// run a single line and exit with its status
    #[argh(option, short = 'c')]
    pub command: Option<String>,

    /// log level: off, error, warn, info, debug or trace (overrides VTSH_LOG)
    #[argh(option)]
    pub log_level: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub prompt: String,
    pub max_tokens: usize,
    pub max_nesting: usize,
    pub nested_command: String,
    pub report_timing: bool,
    pub log_level: LevelFilter,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prompt: DEFAULT_PROMPT.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            max_nesting: DEFAULT_MAX_NESTING,
            nested_command: DEFAULT_NESTED_COMMAND.to_string(),
            report_timing: true,
            log_level: LevelFilter::Warn,
        }
    }
}

impl Config {
    pub fn from_args(args: &Args) -> Result<Self> {
        let level = match &args.log_level {
            Some(level) => Some(level.clone()),
            None => env::var(LOG_ENV).ok(),
        };
        let log_level = match level {
            Some(level) => parse_level(&level)?,
            None => LevelFilter::Warn,
        };

        Ok(Self {
            prompt: args.prompt.clone(),
            max_tokens: args.max_tokens,
            max_nesting: args.max_nesting,
            nested_command: args.nested_command.clone(),
            report_timing: !args.no_timing,
            log_level,
        })
    }
}

fn parse_level(level: &str) -> Result<LevelFilter> {
    level
        .trim()
        .parse()
        .with_context(|| format!("invalid log level `{}`", level))
}
