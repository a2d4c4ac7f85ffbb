//! vtsh: a small interactive command interpreter.
//!
//! A line goes through the tokenizer, the parser (trailing `&`, `&&`, `|`
//! and per-command redirections), variable expansion and finally the
//! sequencer, which runs builtins in-process and everything else through
//! fork/exec.

pub mod ast;
pub mod builtins;
pub mod completion;
pub mod config;
pub mod executor;
pub mod expand;
pub mod job;
pub mod logging;
pub mod parser;
pub mod redirect;
pub mod sequencer;
pub mod shell;
pub mod supervisor;
pub mod tokenizer;
pub mod types;

pub use config::Config;
pub use shell::{Input, Shell};
pub use types::{Flow, ShellError, ShellResult};

#[cfg(test)]
mod tests;
