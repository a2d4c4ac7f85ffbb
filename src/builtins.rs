use std::env;

use crate::ast::Command;
use crate::shell::Shell;
use crate::types::{Flow, FAILURE_STATUS};

pub const BUILTINS: [&str; 2] = ["exit", "cd"];

/// Runs `command` inside the interpreter if it names a builtin.
///
/// Only called for a lone foreground command; returns `None` when the
/// command has to be forked like any other program. Redirections written
/// on a builtin are not applied.
pub fn dispatch(shell: &mut Shell, command: &Command) -> Option<Flow> {
    let flow = match command.name() {
        "exit" => exit(shell, command.args()),
        "cd" => cd(shell, command.args()),
        name if name == shell.config().nested_command => shell.nested(),
        _ => return None,
    };
    Some(flow)
}

fn exit(shell: &mut Shell, args: &[String]) -> Flow {
    match args.first() {
        None => Flow::Exit(0),
        Some(arg) => match arg.parse::<i32>() {
            Ok(code) => Flow::Exit(code & 0xff),
            Err(_) => {
                shell.report(&format!("exit: {}: numeric argument required", arg));
                Flow::Exit(FAILURE_STATUS)
            }
        },
    }
}

/// Changes the interpreter's working directory. Never fails the line: a
/// bad target is reported and the status stays 0.
fn cd(shell: &mut Shell, args: &[String]) -> Flow {
    let target = match args.first() {
        Some(dir) => dir.clone(),
        None => match shell.env().var("HOME") {
            Some(home) => home,
            None => {
                shell.report("cd: HOME not set");
                return Flow::Continue(0);
            }
        },
    };

    if let Err(err) = env::set_current_dir(&target) {
        shell.report(&format!("cd: {}: {}", target, err));
    } else {
        log::debug!("cwd is now {}", target);
    }
    Flow::Continue(0)
}
