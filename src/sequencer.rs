use std::time::Instant;

use crate::ast::{CommandLine, Pipeline};
use crate::builtins;
use crate::executor;
use crate::job::Job;
use crate::parser::parse;
use crate::shell::Shell;
use crate::tokenizer::tokenize;
use crate::types::{Flow, ShellResult, FAILURE_STATUS};

/// Runs one input line.
///
/// `&&` segments run left to right and stop at the first non-zero status.
/// A trailing `&` puts the last segment in the background: its pid is
/// printed as `[pid]` and the line returns without waiting for it.
pub fn execute(shell: &mut Shell, line: &str) -> Flow {
    match run_line(shell, line) {
        Ok(flow) => flow,
        Err(err) => {
            shell.report_error(&err);
            Flow::Continue(err.status())
        }
    }
}

fn run_line(shell: &mut Shell, line: &str) -> ShellResult<Flow> {
    let tokens = tokenize(line, shell.config().max_tokens)?;
    log::debug!("tokens: {:?}", tokens);
    let Some(command_line) = parse(&tokens)? else {
        return Ok(Flow::Continue(0));
    };
    if is_passthrough(&command_line) {
        return Ok(passthrough(shell));
    }

    let last = command_line.pipelines.len() - 1;
    for (i, pipeline) in command_line.pipelines.iter().enumerate() {
        let pipeline = pipeline.expanded(shell.env());
        if i == last && command_line.background {
            return run_background(shell, &pipeline).map(|()| Flow::Continue(0));
        }
        match run_foreground(shell, &pipeline)? {
            Flow::Continue(0) => {}
            flow => return Ok(flow),
        }
    }
    Ok(Flow::Continue(0))
}

/// True for a line that is exactly `cat`: one foreground pipeline of one
/// command with no arguments and no redirections.
pub(crate) fn is_passthrough(line: &CommandLine) -> bool {
    if line.background {
        return false;
    }
    match line.pipelines.as_slice() {
        [pipeline] => pipeline.single().map_or(false, |command| {
            command.argv == ["cat"] && command.redirections.is_empty()
        }),
        _ => false,
    }
}

/// Echoes the interpreter's own input instead of forking `cat`.
fn passthrough(shell: &mut Shell) -> Flow {
    match shell.passthrough() {
        Ok(()) => Flow::Continue(0),
        Err(err) => {
            shell.report(&format!("cat: {}", err));
            Flow::Continue(FAILURE_STATUS)
        }
    }
}

fn run_foreground(shell: &mut Shell, pipeline: &Pipeline) -> ShellResult<Flow> {
    if let Some(command) = pipeline.single() {
        if let Some(flow) = builtins::dispatch(shell, command) {
            return Ok(flow);
        }
    }

    let started = Instant::now();
    let mut job = Job::new(false);
    let spawned = executor::spawn(pipeline, &mut job);
    let waited = job.wait();
    let elapsed = started.elapsed();
    spawned?;
    let termination = waited?;

    if shell.config().report_timing {
        shell.report(&termination.report(elapsed));
    }
    Ok(Flow::Continue(termination.code()))
}

fn run_background(shell: &mut Shell, pipeline: &Pipeline) -> ShellResult<()> {
    let mut job = Job::new(true);
    let spawned = executor::spawn(pipeline, &mut job);
    if let Some(pid) = job.last_pid() {
        if spawned.is_ok() {
            shell.report(&format!("[{}]", pid));
        }
    }
    shell.track(job);
    spawned
}
