use std::ffi::{c_char, CString};
use std::os::fd::RawFd;
use std::ptr;
use std::time::Duration;

use nix::errno::Errno;
use nix::sys::signal::{signal, SigHandler, Signal};
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::{close, dup2, fork, ForkResult, Pid};

use crate::ast::Command;
use crate::redirect::OpenedRedirections;
use crate::types::{ShellError, ShellResult, FAILURE_STATUS, NOT_FOUND_STATUS};

/// How a child process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    Exited(i32),
    Signaled(i32),
}

impl Termination {
    fn from_wait_status(status: WaitStatus) -> Option<Self> {
        match status {
            WaitStatus::Exited(_, code) => Some(Termination::Exited(code)),
            WaitStatus::Signaled(_, sig, _) => Some(Termination::Signaled(sig as i32)),
            _ => None,
        }
    }

    /// Shell-style status: the exit code, or 128 plus the signal number.
    pub fn code(self) -> i32 {
        match self {
            Termination::Exited(code) => code,
            Termination::Signaled(sig) => 128 + sig,
        }
    }

    pub fn success(self) -> bool {
        self == Termination::Exited(0)
    }

    /// The line written to stderr after a foreground command.
    pub fn report(self, elapsed: Duration) -> String {
        let secs = elapsed.as_secs_f64();
        match self {
            Termination::Exited(code) => {
                format!("exit status: {}; elapsed: {:.6} s", code, secs)
            }
            Termination::Signaled(sig) => {
                format!("terminated by signal: {}; elapsed: {:.6} s", sig, secs)
            }
        }
    }
}

/// A command that is ready to be forked.
///
/// Everything that allocates is done here, before the fork, including the
/// null-terminated pointer array exec takes, so the child only duplicates
/// descriptors, writes and calls exec.
#[derive(Debug)]
pub struct Launch {
    argv: Vec<CString>,
    // Points into the heap buffers of `argv`, which never move.
    argv_ptrs: Vec<*const c_char>,
    diag_prefix: Vec<u8>,
    redirections: OpenedRedirections,
}

impl Launch {
    pub fn prepare(command: &Command) -> ShellResult<Self> {
        let argv = command
            .argv
            .iter()
            .map(|arg| {
                CString::new(arg.as_bytes()).map_err(|_| {
                    ShellError::InvalidArgument(format!("{:?} contains a NUL byte", arg))
                })
            })
            .collect::<ShellResult<Vec<_>>>()?;
        let argv_ptrs = argv
            .iter()
            .map(|arg| arg.as_ptr())
            .chain(std::iter::once(ptr::null()))
            .collect();
        let redirections = OpenedRedirections::open(&command.redirections)?;
        Ok(Self {
            argv,
            argv_ptrs,
            diag_prefix: format!("{}: ", command.name()).into_bytes(),
            redirections,
        })
    }

    pub fn program(&self) -> &[u8] {
        self.argv[0].as_bytes()
    }
}

/// Pipe descriptors a child is wired to. `inherited` lists every pipe end
/// open in the parent at fork time; the child closes all of them once the
/// ones it needs are on fds 0 and 1.
#[derive(Debug, Default, Clone, Copy)]
pub struct PipeEnds<'a> {
    pub stdin: Option<RawFd>,
    pub stdout: Option<RawFd>,
    pub inherited: &'a [RawFd],
}

/// Forks and execs `launch`. Returns the child's pid without waiting.
///
/// Pipe wiring is applied first and the command's own redirections after
/// it, so an explicit `<` or `>` wins over the pipe for that stream.
pub fn spawn(launch: Launch, pipes: PipeEnds<'_>) -> ShellResult<Pid> {
    // SAFETY: the child only calls signal, dup2, close, execvp, write and
    // _exit, none of which allocate.
    match unsafe { fork() }.map_err(ShellError::Fork)? {
        ForkResult::Parent { child } => {
            log::debug!(
                "spawned {} as pid {}",
                String::from_utf8_lossy(launch.program()),
                child
            );
            // The parent's copies of the redirection files close here.
            drop(launch);
            Ok(child)
        }
        ForkResult::Child => exec_child(launch, pipes),
    }
}

fn exec_child(launch: Launch, pipes: PipeEnds<'_>) -> ! {
    // The Rust runtime ignores SIGPIPE and exec would keep that; a pipeline
    // stage whose reader has gone must die of it instead.
    // SAFETY: resetting a disposition to the default installs no handler.
    let _ = unsafe { signal(Signal::SIGPIPE, SigHandler::SigDfl) };

    if let Err(errno) = wire_pipes(&pipes) {
        die(&launch.diag_prefix, errno.desc(), FAILURE_STATUS);
    }
    if let Err(errno) = launch.redirections.apply() {
        die(&launch.diag_prefix, errno.desc(), FAILURE_STATUS);
    }

    // SAFETY: `argv_ptrs` is null-terminated and points into `argv`, which
    // is alive for the whole call.
    unsafe { libc::execvp(launch.argv_ptrs[0], launch.argv_ptrs.as_ptr()) };
    let errno = Errno::last();
    let reason = if errno == Errno::ENOENT {
        "command not found"
    } else {
        errno.desc()
    };
    die(&launch.diag_prefix, reason, NOT_FOUND_STATUS)
}

/// Writes `<prog>: <reason>` and ends the child without running any
/// destructors or atexit handlers inherited from the parent.
fn die(prefix: &[u8], reason: &str, status: i32) -> ! {
    write_stderr(prefix);
    write_stderr(reason.as_bytes());
    write_stderr(b"\n");
    // SAFETY: _exit only terminates the calling process.
    unsafe { libc::_exit(status) }
}

fn wire_pipes(pipes: &PipeEnds<'_>) -> nix::Result<()> {
    if let Some(fd) = pipes.stdin {
        dup2(fd, libc::STDIN_FILENO)?;
    }
    if let Some(fd) = pipes.stdout {
        dup2(fd, libc::STDOUT_FILENO)?;
    }
    for &fd in pipes.inherited {
        if fd > libc::STDERR_FILENO {
            close(fd)?;
        }
    }
    Ok(())
}

fn write_stderr(bytes: &[u8]) {
    // SAFETY: plain write(2) of a live buffer; errors are ignored because the
    // child is about to exit anyway.
    unsafe {
        libc::write(libc::STDERR_FILENO, bytes.as_ptr().cast(), bytes.len());
    }
}

/// Blocks until `pid` terminates. Stop/continue notifications are skipped.
pub fn wait(pid: Pid) -> ShellResult<Termination> {
    loop {
        match waitpid(pid, None) {
            Ok(status) => {
                if let Some(termination) = Termination::from_wait_status(status) {
                    return Ok(termination);
                }
            }
            Err(Errno::EINTR) => continue,
            Err(errno) => return Err(ShellError::Wait(errno)),
        }
    }
}

/// Collects `pid` if it has already terminated.
pub fn try_wait(pid: Pid) -> ShellResult<Option<Termination>> {
    match waitpid(pid, Some(WaitPidFlag::WNOHANG)) {
        Ok(status) => Ok(Termination::from_wait_status(status)),
        Err(Errno::EINTR) => Ok(None),
        Err(errno) => Err(ShellError::Wait(errno)),
    }
}
