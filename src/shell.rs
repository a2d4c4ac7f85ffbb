use std::io::{self, BufRead, IsTerminal, Write};

use nix::unistd::Pid;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::Editor;

use crate::completion::Completer;
use crate::config::Config;
use crate::expand::{Environment, ProcessEnv};
use crate::job::Job;
use crate::sequencer;
use crate::supervisor;
use crate::types::{Flow, ShellError, FAILURE_STATUS};

/// Where input lines come from.
pub enum Input {
    /// A terminal: line editing, history and completion, prompt shown.
    Terminal(Box<Editor<Completer, DefaultHistory>>),
    /// Anything else (a pipe, a file, a test buffer): no prompt.
    Stream(Box<dyn BufRead>),
}

impl Input {
    /// Picks a line editor when stdin is a terminal and plain buffered
    /// reads otherwise.
    pub fn detect(config: &Config) -> Result<Self, ReadlineError> {
        if io::stdin().is_terminal() {
            let mut editor = Editor::new()?;
            editor.set_helper(Some(Completer::new(&config.nested_command)));
            Ok(Input::Terminal(Box::new(editor)))
        } else {
            Ok(Input::Stream(Box::new(io::stdin().lock())))
        }
    }

    pub fn is_interactive(&self) -> bool {
        matches!(self, Input::Terminal(_))
    }

    /// Next line without its newline, or `None` at end of input.
    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        match self {
            Input::Terminal(editor) => match editor.readline(prompt) {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        let _ = editor.add_history_entry(line.as_str());
                    }
                    Ok(Some(line))
                }
                // ^C at the prompt abandons the line being typed.
                Err(ReadlineError::Interrupted) => Ok(Some(String::new())),
                Err(ReadlineError::Eof) => Ok(None),
                Err(ReadlineError::Io(err)) => Err(err),
                Err(err) => Err(io::Error::other(err.to_string())),
            },
            Input::Stream(reader) => {
                let mut line = String::new();
                if reader.read_line(&mut line)? == 0 {
                    return Ok(None);
                }
                if line.ends_with('\n') {
                    line.pop();
                }
                Ok(Some(line))
            }
        }
    }

    /// Copies the rest of the input to `out` line by line.
    fn passthrough(&mut self, out: &mut dyn Write) -> io::Result<()> {
        match self {
            Input::Terminal(_) => echo_lines(&mut io::stdin().lock(), out),
            Input::Stream(reader) => echo_lines(reader, out),
        }
    }
}

fn echo_lines(reader: &mut dyn BufRead, out: &mut dyn Write) -> io::Result<()> {
    let mut buf = Vec::new();
    while reader.read_until(b'\n', &mut buf)? > 0 {
        out.write_all(&buf)?;
        out.flush()?;
        buf.clear();
    }
    Ok(())
}

/// Interpreter state shared by every line: configuration, the variable
/// environment, the input source and the background jobs still running.
pub struct Shell {
    config: Config,
    env: Box<dyn Environment>,
    input: Input,
    out: Box<dyn Write>,
    err: Box<dyn Write>,
    depth: usize,
    background: Vec<Pid>,
}

impl Shell {
    /// An interpreter on the real stdin, stdout, stderr and environment.
    pub fn new(config: Config) -> Result<Self, ReadlineError> {
        let input = Input::detect(&config)?;
        Ok(Self::with_io(
            config,
            Box::new(ProcessEnv),
            input,
            Box::new(io::stdout()),
            Box::new(io::stderr()),
        ))
    }

    pub fn with_io(
        config: Config,
        env: Box<dyn Environment>,
        input: Input,
        out: Box<dyn Write>,
        err: Box<dyn Write>,
    ) -> Self {
        Self {
            config,
            env,
            input,
            out,
            err,
            depth: 0,
            background: Vec::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn env(&self) -> &dyn Environment {
        self.env.as_ref()
    }

    /// Reads and runs lines until end of input or `exit`. Returns the
    /// process exit code.
    pub fn run(&mut self) -> i32 {
        match self.repl() {
            Flow::Exit(code) => code,
            Flow::Continue(_) => 0,
        }
    }

    pub fn execute_line(&mut self, line: &str) -> Flow {
        sequencer::execute(self, line)
    }

    fn repl(&mut self) -> Flow {
        loop {
            self.reap_background();
            let line = match self.input.read_line(&self.config.prompt) {
                Ok(Some(line)) => line,
                Ok(None) => {
                    if self.input.is_interactive() {
                        let _ = writeln!(self.out);
                    }
                    return Flow::Continue(0);
                }
                Err(err) => {
                    self.report(&format!("vtsh: read error: {}", err));
                    return Flow::Continue(FAILURE_STATUS);
                }
            };

            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if let Flow::Exit(code) = self.execute_line(line) {
                return Flow::Exit(code);
            }
        }
    }

    /// Runs a nested interpreter loop on the same input. It returns to the
    /// caller's loop at end of input; `exit` ends every level at once.
    pub(crate) fn nested(&mut self) -> Flow {
        if self.depth >= self.config.max_nesting {
            let err = ShellError::NestingLimit(self.config.max_nesting);
            self.report_error(&err);
            return Flow::Continue(err.status());
        }

        self.depth += 1;
        log::debug!("entering nested interpreter at depth {}", self.depth);
        let flow = self.repl();
        self.depth -= 1;
        match flow {
            Flow::Exit(code) => Flow::Exit(code),
            Flow::Continue(_) => Flow::Continue(0),
        }
    }

    pub(crate) fn passthrough(&mut self) -> io::Result<()> {
        self.input.passthrough(&mut *self.out)
    }

    /// Remembers the processes of a background job so they can be reaped
    /// later without blocking.
    pub(crate) fn track(&mut self, job: Job) {
        debug_assert!(job.is_background());
        self.background.extend_from_slice(job.pids());
    }

    fn reap_background(&mut self) {
        self.background.retain(|&pid| match supervisor::try_wait(pid) {
            Ok(None) => true,
            Ok(Some(termination)) => {
                log::debug!("background pid {} finished: {:?}", pid, termination);
                false
            }
            Err(err) => {
                log::warn!("dropping background pid {}: {}", pid, err);
                false
            }
        });
    }

    pub fn background_pids(&self) -> &[Pid] {
        &self.background
    }

    /// Writes one diagnostic line to the interpreter's stderr.
    pub fn report(&mut self, message: &str) {
        let _ = writeln!(self.err, "{}", message);
        let _ = self.err.flush();
    }

    pub fn report_error(&mut self, err: &ShellError) {
        self.report(&format!("vtsh: {}", err));
    }
}
