use std::fs;
use std::os::fd::AsRawFd;

use nix::fcntl::{fcntl, FcntlArg, FdFlag};
use tempfile::{tempdir, NamedTempFile};

use crate::executor;
use crate::job::Job;
use crate::parser::parse;
use crate::redirect::resolve;
use crate::supervisor::{self, Launch, PipeEnds, Termination};
use crate::tests::test_shell;
use crate::tokenizer::{tokenize, DEFAULT_MAX_TOKENS};
use crate::types::{Flow, FAILURE_STATUS};

#[test]
fn test_pipeline_sorts() -> Result<(), String> {
    let mut t = test_shell();
    let temp_file = NamedTempFile::new().unwrap();
    let path = temp_file.path().to_str().unwrap();

    // No quoting: printf itself turns the `\n` sequences into newlines.
    let cmd = format!("printf 3\\n1\\n2\\n | sort > {}", path);
    assert_eq!(t.shell.execute_line(&cmd), Flow::Continue(0));
    assert_eq!(fs::read_to_string(path).unwrap(), "1\n2\n3\n");
    Ok(())
}

#[test]
fn test_multiple_pipes() -> Result<(), String> {
    let mut t = test_shell();
    let temp_file = NamedTempFile::new().unwrap();
    let path = temp_file.path().to_str().unwrap();

    let cmd = format!("echo hello | tr a-z A-Z | cat > {}", path);
    assert_eq!(t.shell.execute_line(&cmd), Flow::Continue(0));
    assert_eq!(fs::read_to_string(path).unwrap(), "HELLO\n");

    let cmd = format!("echo hello|grep o|wc -l>{}", path);
    assert_eq!(t.shell.execute_line(&cmd), Flow::Continue(0));
    assert_eq!(fs::read_to_string(path).unwrap().trim(), "1");
    Ok(())
}

#[test]
fn test_status_is_last_stage() {
    let mut t = test_shell();
    assert_eq!(t.shell.execute_line("false | true"), Flow::Continue(0));
    assert_eq!(t.shell.execute_line("true | false"), Flow::Continue(1));
    assert_eq!(
        t.shell.execute_line("echo hi | no_such_command_vtsh"),
        Flow::Continue(127)
    );
}

#[test]
fn test_explicit_redirect_beats_pipe() -> Result<(), String> {
    let mut t = test_shell();
    let dir = tempdir().unwrap();
    let first = dir.path().join("first.txt");
    let second = dir.path().join("second.txt");
    let input = dir.path().join("input.txt");
    fs::write(&input, "from file\n").unwrap();

    let cmd = format!("echo hi > {} | cat > {}", first.display(), second.display());
    assert_eq!(t.shell.execute_line(&cmd), Flow::Continue(0));
    assert_eq!(fs::read_to_string(&first).unwrap(), "hi\n");
    assert_eq!(fs::read_to_string(&second).unwrap(), "");

    let cmd = format!("echo ignored | cat < {} > {}", input.display(), second.display());
    assert_eq!(t.shell.execute_line(&cmd), Flow::Continue(0));
    assert_eq!(fs::read_to_string(&second).unwrap(), "from file\n");
    Ok(())
}

#[test]
fn test_large_output_does_not_block() -> Result<(), String> {
    let mut t = test_shell();
    let temp_file = NamedTempFile::new().unwrap();
    let path = temp_file.path().to_str().unwrap();

    // Far more than a pipe buffer holds.
    let cmd = format!("seq 1 200000 | tail -n 1 > {}", path);
    assert_eq!(t.shell.execute_line(&cmd), Flow::Continue(0));
    assert_eq!(fs::read_to_string(path).unwrap(), "200000\n");
    Ok(())
}

#[test]
fn test_early_reader_exit() -> Result<(), String> {
    let mut t = test_shell();
    let temp_file = NamedTempFile::new().unwrap();
    let path = temp_file.path().to_str().unwrap();

    // `head` quits early; `yes` must die of SIGPIPE instead of hanging.
    let cmd = format!("yes | head -n 2 > {}", path);
    assert_eq!(t.shell.execute_line(&cmd), Flow::Continue(0));
    assert_eq!(fs::read_to_string(path).unwrap(), "y\ny\n");
    Ok(())
}

#[test]
fn test_empty_stage_is_syntax_error() {
    let mut t = test_shell();
    for line in ["echo hello |", "| echo hello", "echo a || echo b", "echo a | | cat"] {
        assert_eq!(t.shell.execute_line(line), Flow::Continue(1), "{}", line);
    }
    assert!(t.err.text().contains("syntax error"));
    assert!(!t.err.text().contains("exit status"));
}

#[test]
fn test_spawn_collects_every_pid() -> Result<(), String> {
    let tokens = tokenize("true | true | true", DEFAULT_MAX_TOKENS).map_err(|e| e.to_string())?;
    let line = parse(&tokens).map_err(|e| e.to_string())?.ok_or("empty line")?;

    let mut job = Job::new(false);
    executor::spawn(&line.pipelines[0], &mut job).map_err(|e| e.to_string())?;
    assert_eq!(job.pids().len(), 3);
    let termination = job.wait().map_err(|e| e.to_string())?;
    assert!(termination.success());
    Ok(())
}

#[test]
fn test_failed_open_in_later_stage_spawns_nothing() -> Result<(), String> {
    let dir = tempdir().unwrap();
    let line = format!("echo hi | cat < {}/missing", dir.path().display());
    let tokens = tokenize(&line, DEFAULT_MAX_TOKENS).map_err(|e| e.to_string())?;
    let line = parse(&tokens).map_err(|e| e.to_string())?.ok_or("empty line")?;

    let mut job = Job::new(false);
    assert!(executor::spawn(&line.pipelines[0], &mut job).is_err());
    assert!(job.pids().is_empty());
    Ok(())
}

#[test]
fn test_pipe_ends_close_on_exec() -> Result<(), String> {
    let (read, write) = executor::cloexec_pipe().map_err(|e| e.to_string())?;
    for fd in [read.as_raw_fd(), write.as_raw_fd()] {
        let flags = fcntl(fd, FcntlArg::F_GETFD).map_err(|e| e.to_string())?;
        assert!(FdFlag::from_bits_truncate(flags).contains(FdFlag::FD_CLOEXEC));
    }
    Ok(())
}

#[test]
fn test_child_setup_failure_exits_before_exec() -> Result<(), String> {
    let dir = tempdir().unwrap();
    let marker = dir.path().join("marker");
    let tokens = tokenize(&format!("touch {}", marker.display()), DEFAULT_MAX_TOKENS)
        .map_err(|e| e.to_string())?;
    let command = resolve(&tokens).map_err(|e| e.to_string())?;
    let launch = Launch::prepare(&command).map_err(|e| e.to_string())?;

    // Nothing is open on this descriptor, so wiring it to stdin fails.
    let pipes = PipeEnds {
        stdin: Some(1000),
        stdout: None,
        inherited: &[],
    };
    let pid = supervisor::spawn(launch, pipes).map_err(|e| e.to_string())?;
    let termination = supervisor::wait(pid).map_err(|e| e.to_string())?;

    assert_eq!(termination, Termination::Exited(FAILURE_STATUS));
    assert!(!marker.exists());
    Ok(())
}

#[test]
fn test_exec_passes_every_argument() -> Result<(), String> {
    let dir = tempdir().unwrap();
    let out = dir.path().join("out.txt");
    let mut t = test_shell();

    let cmd = format!("printf %s-%s-%s a b c > {}", out.display());
    assert_eq!(t.shell.execute_line(&cmd), Flow::Continue(0));
    assert_eq!(fs::read_to_string(&out).unwrap(), "a-b-c");
    Ok(())
}
