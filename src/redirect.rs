use std::fs::{File, OpenOptions};
use std::os::fd::{AsRawFd, OwnedFd};
use std::os::unix::fs::OpenOptionsExt;

use nix::unistd::dup2;

use crate::ast::{Command, Redirect, RedirectMode, RedirectionSet};
use crate::tokenizer::Token;
use crate::types::{ShellError, ShellResult};

const CREATE_MODE: u32 = 0o644;

/// Splits the tokens of one command into argv and its redirections.
///
/// Nothing is opened here; see [`OpenedRedirections::open`].
pub fn resolve(tokens: &[Token]) -> ShellResult<Command> {
    let mut argv = Vec::new();
    let mut redirections = RedirectionSet::default();
    let mut iter = tokens.iter();

    while let Some(token) = iter.next() {
        match token {
            Token::Word(word) if word.starts_with(">>") => {
                return Err(ShellError::syntax(format!("unexpected `{}`", word)));
            }
            Token::Word(word) => argv.push(word.clone()),
            Token::DupStderrToStdout => redirections.push(Redirect::DupStderrToStdout),
            Token::RedirectIn | Token::RedirectOut | Token::RedirectAppend => {
                let path = match iter.next() {
                    Some(Token::Word(word)) if !word.starts_with(">>") => word.clone(),
                    Some(other) => {
                        return Err(ShellError::syntax(format!(
                            "unexpected `{}` after `{}`",
                            other, token
                        )));
                    }
                    None => {
                        return Err(ShellError::syntax(format!(
                            "missing file name after `{}`",
                            token
                        )));
                    }
                };
                let redirect = match token {
                    Token::RedirectIn => Redirect::Input(path),
                    Token::RedirectOut => Redirect::Output { path, mode: RedirectMode::Truncate },
                    _ => Redirect::Output { path, mode: RedirectMode::Append },
                };
                check_duplicate(&redirections, &redirect)?;
                redirections.push(redirect);
            }
            other => {
                return Err(ShellError::syntax(format!("unexpected `{}`", other)));
            }
        }
    }

    if argv.is_empty() {
        return Err(ShellError::syntax("missing command"));
    }
    Ok(Command { argv, redirections })
}

fn check_duplicate(set: &RedirectionSet, redirect: &Redirect) -> ShellResult<()> {
    match redirect {
        Redirect::Input(_) if set.stdin_source().is_some() => {
            Err(ShellError::syntax("duplicate input redirection"))
        }
        Redirect::Output { .. } if set.stdout_target().is_some() => {
            Err(ShellError::syntax("duplicate output redirection"))
        }
        _ => Ok(()),
    }
}

#[derive(Debug)]
enum OpenedRedirect {
    Stdin(OwnedFd),
    Stdout(OwnedFd),
    DupStderrToStdout,
}

/// Descriptors opened for one command, in application order.
///
/// Owned by the parent until the child applies them; dropping the value
/// closes every descriptor, so an abandoned command leaks nothing.
#[derive(Debug, Default)]
pub struct OpenedRedirections {
    redirects: Vec<OpenedRedirect>,
}

impl OpenedRedirections {
    pub fn open(set: &RedirectionSet) -> ShellResult<Self> {
        let mut redirects = Vec::new();
        for redirect in set.iter() {
            let opened = match redirect {
                Redirect::Input(path) => {
                    OpenedRedirect::Stdin(open_target(path, OpenOptions::new().read(true))?)
                }
                Redirect::Output { path, mode } => {
                    let mut options = OpenOptions::new();
                    options.write(true).create(true).mode(CREATE_MODE);
                    match mode {
                        RedirectMode::Truncate => options.truncate(true),
                        RedirectMode::Append => options.append(true),
                    };
                    OpenedRedirect::Stdout(open_target(path, &options)?)
                }
                Redirect::DupStderrToStdout => OpenedRedirect::DupStderrToStdout,
            };
            redirects.push(opened);
        }
        Ok(Self { redirects })
    }

    /// Rebinds the standard streams of the calling process, left to right.
    ///
    /// Meant for a freshly forked child: each opened file is closed once it
    /// has been duplicated onto its stream.
    pub fn apply(self) -> nix::Result<()> {
        for redirect in self.redirects {
            match redirect {
                OpenedRedirect::Stdin(fd) => {
                    dup2(fd.as_raw_fd(), libc::STDIN_FILENO)?;
                }
                OpenedRedirect::Stdout(fd) => {
                    dup2(fd.as_raw_fd(), libc::STDOUT_FILENO)?;
                }
                OpenedRedirect::DupStderrToStdout => {
                    dup2(libc::STDOUT_FILENO, libc::STDERR_FILENO)?;
                }
            }
        }
        Ok(())
    }
}

fn open_target(path: &str, options: &OpenOptions) -> ShellResult<OwnedFd> {
    options
        .open(path)
        .map(|file: File| OwnedFd::from(file))
        .map_err(|source| ShellError::Io {
            path: path.to_string(),
            source,
        })
}
