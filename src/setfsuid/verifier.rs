//! The privilege-transition protocol run inside the probe process.
use std::path::Path;

use crate::common::Error;
use crate::harness::{Reporter, Verdict, EXIT_BROKEN, EXIT_FAIL, EXIT_PASS};
use crate::log::dev_debug;
use crate::system::{
    _exit, fork,
    fsuid::{current_fsuid, set_fsuid},
    interface::{ProcessId, UserId},
    wait::{Wait, WaitError, WaitOptions, WaitStatus},
    ForkResult, User,
};

use super::probe::{run_probe, Probe};

/// The fsuid phase the probe process is in. Phases are only ever entered in declaration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum State {
    Privileged,
    UnprivilegedDirect,
    UnprivilegedChild,
    RevertedPrivileged,
}

impl State {
    pub(crate) fn name(self) -> &'static str {
        match self {
            State::Privileged => "privileged",
            State::UnprivilegedDirect => "unprivileged-direct",
            State::UnprivilegedChild => "unprivileged-child",
            State::RevertedPrivileged => "reverted-privileged",
        }
    }

    fn next(self) -> Option<State> {
        match self {
            State::Privileged => Some(State::UnprivilegedDirect),
            State::UnprivilegedDirect => Some(State::UnprivilegedChild),
            State::UnprivilegedChild => Some(State::RevertedPrivileged),
            State::RevertedPrivileged => None,
        }
    }
}

pub(crate) struct Verifier<'a> {
    artifact: &'a Path,
    privileged: UserId,
    unprivileged: &'a User,
    state: State,
    reporter: &'a mut Reporter,
}

impl<'a> Verifier<'a> {
    pub(crate) fn new(
        artifact: &'a Path,
        privileged: UserId,
        unprivileged: &'a User,
        reporter: &'a mut Reporter,
    ) -> Self {
        Self {
            artifact,
            privileged,
            unprivileged,
            state: State::Privileged,
            reporter,
        }
    }

    fn advance(&mut self, to: State) -> Result<(), Error> {
        if self.state.next() != Some(to) {
            return Err(Error::InvalidTransition {
                from: self.state.name(),
                to: to.name(),
            });
        }

        dev_debug!("{} -> {}", self.state.name(), to.name());
        self.state = to;
        Ok(())
    }

    /// Switch to the unprivileged fsuid, then probe directly, from a forked child and after
    /// switching back.
    ///
    /// The first probe that does not match its expectation ends the run. Environment faults
    /// are returned as errors; probe mismatches only show up in the verdict.
    pub(crate) fn run(mut self) -> Result<Verdict, Error> {
        self.drop_privilege()?;
        self.ensure_reachable()?;
        if !run_probe(Probe::Direct, self.artifact, self.reporter).matched() {
            return Ok(Verdict::SomeProbeFailed);
        }

        self.advance(State::UnprivilegedChild)?;
        if !self.probe_in_child()?.passed() {
            return Ok(Verdict::SomeProbeFailed);
        }

        self.revert()?;
        Ok(run_probe(Probe::Reverted, self.artifact, self.reporter).verdict())
    }

    fn drop_privilege(&mut self) -> Result<(), Error> {
        self.advance(State::UnprivilegedDirect)?;
        let uid = self.unprivileged.uid;
        set_fsuid(uid)?;
        self.reporter
            .info(format_args!("switched fsuid to {uid} ({})", self.unprivileged.name));
        Ok(())
    }

    /// Path lookup of the artifact has to work with the unprivileged fsuid, otherwise a denied
    /// open says nothing about the artifact's mode bits.
    fn ensure_reachable(&self) -> Result<(), Error> {
        std::fs::symlink_metadata(self.artifact)
            .map(drop)
            .map_err(|error| Error::Unreachable {
                path: self.artifact.to_owned(),
                uid: self.unprivileged.uid,
                error,
            })
    }

    fn revert(&mut self) -> Result<(), Error> {
        self.advance(State::RevertedPrivileged)?;
        set_fsuid(self.privileged)?;
        self.reporter
            .info(format_args!("switched fsuid back to {}", self.privileged));
        Ok(())
    }

    fn probe_in_child(&mut self) -> Result<Verdict, Error> {
        log::logger().flush();

        match fork().map_err(Error::Fork)? {
            ForkResult::Child => {
                let code = self.probe_child();
                log::logger().flush();
                _exit(code)
            }
            ForkResult::Parent(pid) => {
                let status = wait_for(pid)?;
                self.child_verdict(pid, &status)
            }
        }
    }

    fn child_verdict(&mut self, pid: ProcessId, status: &WaitStatus) -> Result<Verdict, Error> {
        dev_debug!("child {pid} finished: {status:?}");
        match status.exit_status() {
            Some(EXIT_PASS | EXIT_FAIL) => self.reporter.counted_elsewhere(1),
            Some(_) => {}
            None => self
                .reporter
                .fail(format_args!("child {pid} terminated abnormally ({status:?})")),
        }
        Verdict::from_wait_status(pid, status)
    }

    fn probe_child(&mut self) -> i32 {
        let inherited = current_fsuid();
        if inherited != self.unprivileged.uid {
            self.reporter.fail(format_args!(
                "child runs with fsuid {inherited} instead of the inherited {}",
                self.unprivileged.uid
            ));
            return EXIT_FAIL;
        }

        run_probe(Probe::Child, self.artifact, self.reporter)
            .verdict()
            .exit_code()
    }
}

fn wait_for(pid: ProcessId) -> Result<WaitStatus, Error> {
    match pid.wait(WaitOptions::new()) {
        Ok((_, status)) => Ok(status),
        Err(WaitError::Io(err)) => Err(Error::Wait(err)),
        Err(WaitError::NotReady) => unreachable!("blocking waits always report a status"),
    }
}

/// Body of the probe process: run the verifier and turn its outcome into an exit code.
pub(crate) fn verify(
    artifact: &Path,
    privileged: UserId,
    unprivileged: &User,
    reporter: &mut Reporter,
) -> i32 {
    match Verifier::new(artifact, privileged, unprivileged, reporter).run() {
        Ok(verdict) => verdict.exit_code(),
        Err(err) => {
            reporter.broken(&err);
            EXIT_BROKEN
        }
    }
}
