use std::fmt;
use std::io;

use crate::log::{report_error, report_info};

use super::ExpectedErrnos;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ResultKind {
    Pass,
    Fail,
    Broken,
    Info,
}

impl fmt::Display for ResultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ResultKind::Pass => "TPASS",
            ResultKind::Fail => "TFAIL",
            ResultKind::Broken => "TBROK",
            ResultKind::Info => "TINFO",
        })
    }
}

/// Records check results as `<tcid> <n> <KIND> : <message>` lines on the report log.
///
/// `n` counts the checks that produced a verdict so far in this process; info lines repeat
/// the current count. A forked process continues from the count its parent had.
#[derive(Debug, Clone)]
pub(crate) struct Reporter {
    tcid: &'static str,
    count: u32,
    errno_logging: bool,
    expected: ExpectedErrnos,
}

impl Reporter {
    pub(crate) fn new(tcid: &'static str, errno_logging: bool, expected: ExpectedErrnos) -> Self {
        Self {
            tcid,
            count: 0,
            errno_logging,
            expected,
        }
    }

    pub(crate) fn pass(&mut self, message: impl fmt::Display) {
        self.record(ResultKind::Pass, message)
    }

    pub(crate) fn fail(&mut self, message: impl fmt::Display) {
        self.record(ResultKind::Fail, message)
    }

    pub(crate) fn broken(&mut self, message: impl fmt::Display) {
        self.record(ResultKind::Broken, message)
    }

    pub(crate) fn info(&mut self, message: impl fmt::Display) {
        self.record(ResultKind::Info, message)
    }

    /// Account for `checks` whose result lines were written by a forked process.
    pub(crate) fn counted_elsewhere(&mut self, checks: u32) {
        self.count += checks;
    }

    /// Log the reason of a failed call when errno logging is enabled.
    pub(crate) fn errno(&mut self, err: &io::Error) {
        if self.errno_logging {
            let line = self.expected.describe(err);
            self.info(line);
        }
    }

    fn record(&mut self, kind: ResultKind, message: impl fmt::Display) {
        if matches!(kind, ResultKind::Pass | ResultKind::Fail) {
            self.count += 1;
        }

        let line = self.line(kind, &message);
        match kind {
            ResultKind::Pass | ResultKind::Info => report_info!("{line}"),
            ResultKind::Fail | ResultKind::Broken => report_error!("{line}"),
        }
    }

    fn line(&self, kind: ResultKind, message: &dyn fmt::Display) -> String {
        format!("{:<12} {:>4}  {kind}  :  {message}", self.tcid, self.count)
    }
}
