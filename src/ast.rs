use crate::expand::{expand_word, expand_words, Environment};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectMode {
    Truncate, // >
    Append,   // >>
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Redirect {
    Input(String),
    Output { path: String, mode: RedirectMode },
    DupStderrToStdout,
}

/// The redirections of one command, in the order they were written.
///
/// Holds at most one stdin source and one stdout target; the resolver
/// rejects a second one instead of letting it override the first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RedirectionSet {
    redirects: Vec<Redirect>,
}

impl RedirectionSet {
    pub(crate) fn push(&mut self, redirect: Redirect) {
        self.redirects.push(redirect);
    }

    pub fn is_empty(&self) -> bool {
        self.redirects.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Redirect> {
        self.redirects.iter()
    }

    pub fn stdin_source(&self) -> Option<&str> {
        self.redirects.iter().find_map(|r| match r {
            Redirect::Input(path) => Some(path.as_str()),
            _ => None,
        })
    }

    pub fn stdout_target(&self) -> Option<(&str, RedirectMode)> {
        self.redirects.iter().find_map(|r| match r {
            Redirect::Output { path, mode } => Some((path.as_str(), *mode)),
            _ => None,
        })
    }

    pub fn stderr_to_stdout(&self) -> bool {
        self.redirects
            .iter()
            .any(|r| matches!(r, Redirect::DupStderrToStdout))
    }

    fn expanded(&self, env: &dyn Environment) -> Self {
        let redirects = self
            .redirects
            .iter()
            .map(|r| match r {
                Redirect::Input(path) => Redirect::Input(expand_word(path, env)),
                Redirect::Output { path, mode } => Redirect::Output {
                    path: expand_word(path, env),
                    mode: *mode,
                },
                Redirect::DupStderrToStdout => Redirect::DupStderrToStdout,
            })
            .collect();
        Self { redirects }
    }
}

/// A program invocation: owned argv (argv[0] is the program) plus its redirections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub argv: Vec<String>,
    pub redirections: RedirectionSet,
}

impl Command {
    pub fn name(&self) -> &str {
        &self.argv[0]
    }

    pub fn args(&self) -> &[String] {
        &self.argv[1..]
    }

    /// Copy of this command with `$NAME` references substituted.
    pub fn expanded(&self, env: &dyn Environment) -> Self {
        Self {
            argv: expand_words(&self.argv, env),
            redirections: self.redirections.expanded(env),
        }
    }
}

/// Commands joined by `|`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    pub commands: Vec<Command>,
}

impl Pipeline {
    /// The lone command of a pipeline without any `|`.
    pub fn single(&self) -> Option<&Command> {
        match self.commands.as_slice() {
            [command] => Some(command),
            _ => None,
        }
    }

    pub fn expanded(&self, env: &dyn Environment) -> Self {
        Self {
            commands: self.commands.iter().map(|c| c.expanded(env)).collect(),
        }
    }
}

/// A full input line: pipelines joined by `&&`, the last one optionally
/// sent to the background.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub pipelines: Vec<Pipeline>,
    pub background: bool,
}
