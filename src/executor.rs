use std::os::fd::{AsRawFd, FromRawFd, OwnedFd, RawFd};

use nix::fcntl::OFlag;
use nix::unistd::pipe2;

use crate::ast::Pipeline;
use crate::job::Job;
use crate::supervisor::{self, Launch, PipeEnds};
use crate::types::{ShellError, ShellResult};

/// Starts every stage of `pipeline`, recording the pids in `job`.
///
/// All redirection files are opened before the first fork, so a missing
/// input file aborts the pipeline with nothing running. If a later pipe or
/// fork fails, the stages already started stay in `job` for the caller to
/// wait on or track; every pipe end held here is closed on return.
pub fn spawn(pipeline: &Pipeline, job: &mut Job) -> ShellResult<()> {
    let launches = pipeline
        .commands
        .iter()
        .map(Launch::prepare)
        .collect::<ShellResult<Vec<_>>>()?;
    let last = launches.len().saturating_sub(1);

    let mut prev_read: Option<OwnedFd> = None;
    for (i, launch) in launches.into_iter().enumerate() {
        let next = if i < last { Some(cloexec_pipe()?) } else { None };

        let mut inherited: Vec<RawFd> = Vec::with_capacity(3);
        inherited.extend(prev_read.as_ref().map(|fd| fd.as_raw_fd()));
        if let Some((read, write)) = &next {
            inherited.push(read.as_raw_fd());
            inherited.push(write.as_raw_fd());
        }
        let pipes = PipeEnds {
            stdin: prev_read.as_ref().map(|fd| fd.as_raw_fd()),
            stdout: next.as_ref().map(|(_, write)| write.as_raw_fd()),
            inherited: &inherited,
        };
        log::debug!("stage {}: stdin {:?}, stdout {:?}", i, pipes.stdin, pipes.stdout);

        let pid = supervisor::spawn(launch, pipes)?;
        job.push(pid);

        // The child holds its own copies now. Drop the read end it consumed
        // and the write end it feeds, keeping only the next stage's input.
        prev_read = next.map(|(read, write)| {
            drop(write);
            read
        });
    }
    Ok(())
}

/// An anonymous pipe whose ends are not inherited across exec. The child
/// stage gets working copies through dup2, which clears the flag.
pub(crate) fn cloexec_pipe() -> ShellResult<(OwnedFd, OwnedFd)> {
    let (read, write) = pipe2(OFlag::O_CLOEXEC).map_err(ShellError::Pipe)?;
    // SAFETY: both descriptors were just created by pipe2 and are owned by
    // nobody else.
    Ok(unsafe { (OwnedFd::from_raw_fd(read), OwnedFd::from_raw_fd(write)) })
}
