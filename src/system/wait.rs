//! Collecting the exit status of the processes a run forks.
use std::io;

use libc::{c_int, WEXITSTATUS, WIFEXITED, WIFSIGNALED, WNOHANG, WTERMSIG};

use crate::cutils::cerr;
use crate::system::signal::signal_name;
use crate::{system::interface::ProcessId, system::signal::SignalNumber};

mod sealed {
    pub(crate) trait Sealed {}

    impl Sealed for crate::system::interface::ProcessId {}
}

pub(crate) trait Wait: sealed::Sealed {
    /// Wait for the child with this process ID to terminate.
    ///
    /// A blocking wait that is interrupted by a signal is restarted. With
    /// [`WaitOptions::no_hang`] a child that is still running yields [`WaitError::NotReady`].
    fn wait(self, options: WaitOptions) -> Result<(ProcessId, WaitStatus), WaitError>;
}

impl Wait for ProcessId {
    fn wait(self, options: WaitOptions) -> Result<(ProcessId, WaitStatus), WaitError> {
        let mut status: c_int = 0;

        let pid = loop {
            match cerr(unsafe { libc::waitpid(self.get(), &mut status, options.flags) }) {
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                result => break result.map_err(WaitError::Io)?,
            }
        };

        if pid == 0 && options.flags & WNOHANG != 0 {
            return Err(WaitError::NotReady);
        }

        Ok((ProcessId::new(pid), WaitStatus { status }))
    }
}

#[derive(Debug)]
pub enum WaitError {
    // The child is still running; only with `WaitOptions::no_hang`.
    NotReady,
    Io(io::Error),
}

pub struct WaitOptions {
    flags: c_int,
}

impl WaitOptions {
    pub const fn new() -> Self {
        Self { flags: 0 }
    }

    /// Return immediately if the child has not terminated yet.
    pub const fn no_hang(mut self) -> Self {
        self.flags |= WNOHANG;
        self
    }
}

/// How a waited-for child terminated.
pub struct WaitStatus {
    status: c_int,
}

impl std::fmt::Debug for WaitStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(exit_status) = self.exit_status() {
            write!(f, "ExitStatus({exit_status})")
        } else if let Some(signal) = self.term_signal() {
            write!(f, "TermSignal({})", signal_name(signal).unwrap_or("?"))
        } else {
            write!(f, "Unknown")
        }
    }
}

impl WaitStatus {
    #[cfg(test)]
    pub(crate) const fn from_raw(status: c_int) -> Self {
        Self { status }
    }

    /// The code the child passed to `exit`, if it exited normally.
    pub const fn exit_status(&self) -> Option<c_int> {
        if WIFEXITED(self.status) {
            Some(WEXITSTATUS(self.status))
        } else {
            None
        }
    }

    pub const fn was_signaled(&self) -> bool {
        WIFSIGNALED(self.status)
    }

    /// The signal that killed the child, if it was killed by one.
    pub const fn term_signal(&self) -> Option<SignalNumber> {
        if self.was_signaled() {
            Some(WTERMSIG(self.status))
        } else {
            None
        }
    }
}
