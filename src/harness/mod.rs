//! The bookkeeping side of a conformance run: result reporting, errno registration and the
//! exit-status contract between the processes taking part in a run.
use crate::common::Error;
use crate::system::{
    interface::{ProcessId, UserId},
    wait::WaitStatus,
};

mod errno;
mod report;

pub(crate) use errno::{errno_name, ExpectedErrnos};
pub(crate) use report::Reporter;

/// Every check matched its expectation.
pub(crate) const EXIT_PASS: i32 = 0;
/// At least one check did not match its expectation.
pub(crate) const EXIT_FAIL: i32 = 1;
/// The environment did not allow the checks to run.
pub(crate) const EXIT_BROKEN: i32 = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Verdict {
    AllProbesMatchedExpectation,
    SomeProbeFailed,
}

impl Verdict {
    pub(crate) fn from_match(matched: bool) -> Self {
        if matched {
            Verdict::AllProbesMatchedExpectation
        } else {
            Verdict::SomeProbeFailed
        }
    }

    pub(crate) fn and(self, other: Verdict) -> Verdict {
        Verdict::from_match(self.passed() && other.passed())
    }

    pub(crate) fn passed(self) -> bool {
        self == Verdict::AllProbesMatchedExpectation
    }

    pub(crate) fn exit_code(self) -> i32 {
        match self {
            Verdict::AllProbesMatchedExpectation => EXIT_PASS,
            Verdict::SomeProbeFailed => EXIT_FAIL,
        }
    }

    /// Interpret the status of a process that reports its verdict through its exit code.
    ///
    /// A process killed by a signal did not get to report anything and counts as failed; one
    /// that exited with [`EXIT_BROKEN`] could not run its checks at all.
    pub(crate) fn from_wait_status(pid: ProcessId, status: &WaitStatus) -> Result<Verdict, Error> {
        match status.exit_status() {
            Some(EXIT_PASS) => Ok(Verdict::AllProbesMatchedExpectation),
            Some(EXIT_BROKEN) => Err(Error::ProbeProcessBroken(pid)),
            Some(_) | None => Ok(Verdict::SomeProbeFailed),
        }
    }
}

/// Root-privilege assertion: the probes are meaningless unless the caller is the superuser.
pub(crate) fn require_root(euid: UserId) -> Result<(), Error> {
    if euid == UserId::ROOT {
        Ok(())
    } else {
        Err(Error::NotPrivileged(euid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // raw `waitpid` statuses as encoded by Linux
    fn exited(code: i32) -> WaitStatus {
        WaitStatus::from_raw((code & 0xff) << 8)
    }

    fn killed(signal: i32) -> WaitStatus {
        WaitStatus::from_raw(signal & 0x7f)
    }

    #[test]
    fn verdicts_combine_pessimistically() {
        use Verdict::*;
        assert_eq!(
            AllProbesMatchedExpectation.and(AllProbesMatchedExpectation),
            AllProbesMatchedExpectation
        );
        assert_eq!(AllProbesMatchedExpectation.and(SomeProbeFailed), SomeProbeFailed);
        assert_eq!(SomeProbeFailed.and(AllProbesMatchedExpectation), SomeProbeFailed);
        assert_eq!(AllProbesMatchedExpectation.exit_code(), EXIT_PASS);
        assert_eq!(SomeProbeFailed.exit_code(), EXIT_FAIL);
    }

    #[test]
    fn exit_statuses_map_to_verdicts() {
        let pid = ProcessId::new(1234);
        assert_eq!(
            Verdict::from_wait_status(pid, &exited(0)).unwrap(),
            Verdict::AllProbesMatchedExpectation
        );
        assert_eq!(
            Verdict::from_wait_status(pid, &exited(1)).unwrap(),
            Verdict::SomeProbeFailed
        );
        assert_eq!(
            Verdict::from_wait_status(pid, &exited(42)).unwrap(),
            Verdict::SomeProbeFailed
        );
        assert_eq!(
            Verdict::from_wait_status(pid, &killed(libc::SIGSEGV)).unwrap(),
            Verdict::SomeProbeFailed
        );
        assert!(matches!(
            Verdict::from_wait_status(pid, &exited(2)),
            Err(Error::ProbeProcessBroken(broken)) if broken == pid
        ));
    }

    #[test]
    fn only_root_passes_the_privilege_check() {
        assert!(require_root(UserId::ROOT).is_ok());
        assert!(matches!(
            require_root(UserId::new(65534)),
            Err(Error::NotPrivileged(uid)) if uid == UserId::new(65534)
        ));
    }
}
