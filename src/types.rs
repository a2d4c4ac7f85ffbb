use nix::errno::Errno;
use thiserror::Error;

/// Status reported for any failure raised inside the interpreter itself.
pub const FAILURE_STATUS: i32 = 1;
/// Status a child exits with when its program cannot be executed.
pub const NOT_FOUND_STATUS: i32 = 127;

#[derive(Debug, Error)]
pub enum ShellError {
    #[error("syntax error: {0}")]
    Syntax(String),
    #[error("{path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("fork failed: {0}")]
    Fork(Errno),
    #[error("pipe failed: {0}")]
    Pipe(Errno),
    #[error("wait failed: {0}")]
    Wait(Errno),
    #[error("line has more than {0} tokens")]
    TooManyTokens(usize),
    #[error("nesting limit of {0} interpreters reached")]
    NestingLimit(usize),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl ShellError {
    pub fn syntax(msg: impl Into<String>) -> Self {
        ShellError::Syntax(msg.into())
    }

    /// Status the failed line leaves behind. Every interpreter-side failure
    /// aborts the current line only, so they all collapse to one code.
    pub fn status(&self) -> i32 {
        FAILURE_STATUS
    }
}

pub type ShellResult<T> = Result<T, ShellError>;

/// What the loop does after a line has been handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue(i32),
    Exit(i32),
}

impl Flow {
    pub fn status(self) -> i32 {
        match self {
            Flow::Continue(code) | Flow::Exit(code) => code,
        }
    }
}
