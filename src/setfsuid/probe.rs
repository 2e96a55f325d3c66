//! A single access attempt against the artifact and its classification.
use std::{fmt, io, path::Path};

use libc::c_int;

use crate::harness::{errno_name, Reporter, Verdict};
use crate::log::dev_debug;
use crate::system::file::open_read_write;

/// What an `O_RDWR` open of the artifact is supposed to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Expectation {
    DeniedWith(c_int),
    Permitted,
}

/// What an `O_RDWR` open of the artifact actually did.
#[derive(Debug)]
pub(crate) enum Access {
    Permitted,
    Denied(io::Error),
}

/// Open `path` for reading and writing; the descriptor is closed again right away.
pub(crate) fn attempt(path: &Path) -> Access {
    match open_read_write(path) {
        Ok(file) => {
            drop(file);
            Access::Permitted
        }
        Err(err) => Access::Denied(err),
    }
}

#[derive(Debug)]
pub(crate) enum ProbeResult {
    Permitted,
    DeniedAsExpected,
    DeniedWithUnexpectedReason(io::Error),
    UnexpectedlyPermitted,
}

impl ProbeResult {
    pub(crate) fn classify(access: Access, expectation: Expectation) -> ProbeResult {
        match (expectation, access) {
            (Expectation::Permitted, Access::Permitted) => ProbeResult::Permitted,
            (Expectation::Permitted, Access::Denied(err)) => {
                ProbeResult::DeniedWithUnexpectedReason(err)
            }
            (Expectation::DeniedWith(_), Access::Permitted) => ProbeResult::UnexpectedlyPermitted,
            (Expectation::DeniedWith(errno), Access::Denied(err)) => {
                if err.raw_os_error() == Some(errno) {
                    ProbeResult::DeniedAsExpected
                } else {
                    ProbeResult::DeniedWithUnexpectedReason(err)
                }
            }
        }
    }

    pub(crate) fn matched(&self) -> bool {
        matches!(self, ProbeResult::Permitted | ProbeResult::DeniedAsExpected)
    }

    pub(crate) fn verdict(&self) -> Verdict {
        Verdict::from_match(self.matched())
    }
}

/// The three places the artifact is probed from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Probe {
    /// The probe process, right after switching to the unprivileged fsuid.
    Direct,
    /// A child forked after the switch.
    Child,
    /// The probe process, after switching the fsuid back.
    Reverted,
}

impl Probe {
    pub(crate) const ALL: [Probe; 3] = [Probe::Direct, Probe::Child, Probe::Reverted];

    pub(crate) fn name(self) -> &'static str {
        match self {
            Probe::Direct => "direct",
            Probe::Child => "child",
            Probe::Reverted => "reverted",
        }
    }

    pub(crate) fn expectation(self) -> Expectation {
        match self {
            Probe::Direct | Probe::Child => Expectation::DeniedWith(libc::EACCES),
            Probe::Reverted => Expectation::Permitted,
        }
    }
}

impl fmt::Display for Probe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn describe_errno(err: &io::Error) -> String {
    match err.raw_os_error() {
        Some(errno) => errno_label(errno).to_string(),
        None => err.to_string(),
    }
}

fn errno_label(errno: c_int) -> &'static str {
    errno_name(errno).unwrap_or("E?")
}

/// Attempt the open for `probe`, report whether it matched and return the classification.
pub(crate) fn run_probe(probe: Probe, path: &Path, reporter: &mut Reporter) -> ProbeResult {
    let access = attempt(path);
    if let Access::Denied(err) = &access {
        reporter.errno(err);
    }

    let result = ProbeResult::classify(access, probe.expectation());
    dev_debug!("{probe} probe of {}: {result:?}", path.display());

    match (&result, probe.expectation()) {
        (ProbeResult::Permitted, _) => reporter.pass("open succeeded as expected"),
        (ProbeResult::DeniedAsExpected, Expectation::DeniedWith(errno)) => {
            reporter.pass(format!("open failed with {} as expected", errno_label(errno)))
        }
        (ProbeResult::DeniedWithUnexpectedReason(err), Expectation::DeniedWith(errno)) => {
            reporter.fail(format!(
                "open failed with {} but {} was expected",
                describe_errno(err),
                errno_label(errno)
            ))
        }
        (ProbeResult::DeniedWithUnexpectedReason(err), Expectation::Permitted) => {
            reporter.fail(format!("open failed unexpectedly: {err}"))
        }
        (ProbeResult::UnexpectedlyPermitted, _) => reporter.fail("open succeeded unexpectedly"),
        (ProbeResult::DeniedAsExpected, Expectation::Permitted) => {
            unreachable!("a permitted open cannot be denied as expected")
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::ExpectedErrnos;
    use crate::system::file::{create_exclusive, TempDir};

    fn denied(errno: c_int) -> Access {
        Access::Denied(io::Error::from_raw_os_error(errno))
    }

    #[test]
    fn classification() {
        let eacces = Expectation::DeniedWith(libc::EACCES);

        assert!(matches!(
            ProbeResult::classify(denied(libc::EACCES), eacces),
            ProbeResult::DeniedAsExpected
        ));
        assert!(matches!(
            ProbeResult::classify(denied(libc::EPERM), eacces),
            ProbeResult::DeniedWithUnexpectedReason(err) if err.raw_os_error() == Some(libc::EPERM)
        ));
        assert!(matches!(
            ProbeResult::classify(Access::Permitted, eacces),
            ProbeResult::UnexpectedlyPermitted
        ));
        assert!(matches!(
            ProbeResult::classify(Access::Permitted, Expectation::Permitted),
            ProbeResult::Permitted
        ));
        assert!(matches!(
            ProbeResult::classify(denied(libc::EACCES), Expectation::Permitted),
            ProbeResult::DeniedWithUnexpectedReason(_)
        ));
    }

    #[test]
    fn only_matching_results_pass() {
        assert!(ProbeResult::Permitted.matched());
        assert!(ProbeResult::DeniedAsExpected.matched());
        assert!(!ProbeResult::UnexpectedlyPermitted.matched());
        assert_eq!(
            ProbeResult::DeniedWithUnexpectedReason(io::Error::from_raw_os_error(libc::EIO))
                .verdict(),
            Verdict::SomeProbeFailed
        );
        assert_eq!(
            ProbeResult::DeniedAsExpected.verdict(),
            Verdict::AllProbesMatchedExpectation
        );
    }

    #[test]
    fn probes_expect_denial_until_reverted() {
        assert_eq!(
            Probe::Direct.expectation(),
            Expectation::DeniedWith(libc::EACCES)
        );
        assert_eq!(
            Probe::Child.expectation(),
            Expectation::DeniedWith(libc::EACCES)
        );
        assert_eq!(Probe::Reverted.expectation(), Expectation::Permitted);
        assert_eq!(Probe::ALL.len(), 3);
        assert_eq!(Probe::Child.to_string(), "child");
    }

    #[test]
    fn reverted_probe_on_own_file() {
        let dir = TempDir::create(Path::new("/tmp"), "setfsuid-probe-test").unwrap();
        let path = dir.path().join("artifact");
        drop(create_exclusive(&path, 0o644).unwrap());

        let mut reporter = Reporter::new("setfsuid04", true, ExpectedErrnos::new(&[libc::EACCES]));
        assert!(run_probe(Probe::Reverted, &path, &mut reporter).matched());

        // the owner is never denied by the mode bits, so a denial probe fails
        assert!(matches!(
            run_probe(Probe::Direct, &path, &mut reporter),
            ProbeResult::UnexpectedlyPermitted
        ));

        let missing = dir.path().join("missing");
        assert!(matches!(
            run_probe(Probe::Direct, &missing, &mut reporter),
            ProbeResult::DeniedWithUnexpectedReason(err) if err.raw_os_error() == Some(libc::ENOENT)
        ));
    }
}
