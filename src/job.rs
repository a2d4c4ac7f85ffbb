use nix::unistd::Pid;

use crate::supervisor::{self, Termination};
use crate::types::ShellResult;

/// The processes started for one pipeline, first stage first.
#[derive(Debug)]
pub struct Job {
    pids: Vec<Pid>,
    background: bool,
}

impl Job {
    pub fn new(background: bool) -> Self {
        Self {
            pids: Vec::new(),
            background,
        }
    }

    pub fn push(&mut self, pid: Pid) {
        self.pids.push(pid);
    }

    pub fn pids(&self) -> &[Pid] {
        &self.pids
    }

    pub fn last_pid(&self) -> Option<Pid> {
        self.pids.last().copied()
    }

    pub fn is_background(&self) -> bool {
        self.background
    }

    /// Waits for every stage. The job's status is the last stage's.
    pub fn wait(self) -> ShellResult<Termination> {
        let mut last = None;
        let mut failure = None;
        for pid in self.pids {
            match supervisor::wait(pid) {
                Ok(termination) => last = Some(termination),
                Err(err) => {
                    log::warn!("lost track of pid {}: {}", pid, err);
                    failure.get_or_insert(err);
                }
            }
        }
        match (failure, last) {
            (Some(err), _) => Err(err),
            (None, Some(termination)) => Ok(termination),
            (None, None) => Ok(Termination::Exited(0)),
        }
    }
}
