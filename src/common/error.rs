use crate::system::{
    interface::{ProcessId, UserId},
    signal::{signal_name, SignalNumber},
};
use std::{fmt, path::PathBuf};

#[derive(Debug)]
pub enum Error {
    UserNotFound(String),
    NotPrivileged(UserId),
    Options(String),
    StringValidation(String),
    Workspace(PathBuf, std::io::Error),
    Artifact(PathBuf, std::io::Error),
    Unreachable {
        path: PathBuf,
        uid: UserId,
        error: std::io::Error,
    },
    FsuidTransition {
        requested: UserId,
        active: UserId,
    },
    InvalidTransition {
        from: &'static str,
        to: &'static str,
    },
    Fork(std::io::Error),
    Wait(std::io::Error),
    ProbeProcessBroken(ProcessId),
    Interrupted(SignalNumber),
    Io(Option<PathBuf>, std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UserNotFound(u) => write!(f, "user '{u}' not found"),
            Error::NotPrivileged(uid) => {
                write!(f, "must be run as root (effective uid is {uid})")
            }
            Error::Options(e) => write!(f, "{e}"),
            Error::StringValidation(string) => write!(f, "invalid string: {string:?}"),
            Error::Workspace(path, e) => write!(
                f,
                "cannot create temporary directory in '{}': {e}",
                path.display()
            ),
            Error::Artifact(path, e) => {
                write!(f, "cannot create test file '{}': {e}", path.display())
            }
            Error::Unreachable { path, uid, error } => write!(
                f,
                "'{}' cannot be looked up with fsuid {uid}: {error}",
                path.display()
            ),
            Error::FsuidTransition { requested, active } => write!(
                f,
                "setfsuid({requested}) failed: active fsuid is still {active}"
            ),
            Error::InvalidTransition { from, to } => {
                write!(f, "invalid verifier transition from {from} to {to}")
            }
            Error::Fork(e) => write!(f, "fork failed: {e}"),
            Error::Wait(e) => write!(f, "waitpid failed: {e}"),
            Error::ProbeProcessBroken(pid) => {
                write!(f, "probe process {pid} was unable to run")
            }
            Error::Interrupted(signal) => match signal_name(*signal) {
                Some(name) => write!(f, "interrupted by {name}"),
                None => write!(f, "interrupted by signal {signal}"),
            },
            Error::Io(location, e) => {
                if let Some(path) = location {
                    write!(f, "'{}': {e}", path.display())
                } else {
                    write!(f, "IO error: {e}")
                }
            }
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(None, err)
    }
}
