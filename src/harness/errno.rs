use std::io;

macro_rules! define_errnos {
    ($($errno:ident,)*) => {
        /// Symbolic name of an `errno` value, as used in diagnostics.
        pub(crate) fn errno_name(errno: libc::c_int) -> Option<&'static str> {
            match errno {
                $(libc::$errno => Some(stringify!($errno)),)*
                _ => None,
            }
        }
    };
}

define_errnos! {
    EPERM,
    ENOENT,
    EIO,
    EBADF,
    EAGAIN,
    ENOMEM,
    EACCES,
    EFAULT,
    EBUSY,
    EEXIST,
    ENOTDIR,
    EISDIR,
    EINVAL,
    ENFILE,
    EMFILE,
    ETXTBSY,
    EFBIG,
    ENOSPC,
    EROFS,
    ENAMETOOLONG,
    ELOOP,
    EOVERFLOW,
}

/// The failure reasons a run expects to observe.
///
/// Registering a reason lets errno logging tell expected denials apart from surprising ones.
#[derive(Debug, Clone, Default)]
pub(crate) struct ExpectedErrnos(Vec<libc::c_int>);

impl ExpectedErrnos {
    pub(crate) fn new(errnos: &[libc::c_int]) -> Self {
        Self(errnos.to_vec())
    }

    pub(crate) fn contains(&self, errno: libc::c_int) -> bool {
        self.0.contains(&errno)
    }

    /// Describe `err` for the errno log: its symbolic name, its message and whether it was
    /// registered as expected.
    pub(crate) fn describe(&self, err: &io::Error) -> String {
        let Some(errno) = err.raw_os_error() else {
            return format!("{err} (no errno, unexpected)");
        };

        let name = errno_name(errno).unwrap_or("E?");
        let expected = if self.contains(errno) {
            "expected"
        } else {
            "unexpected"
        };

        format!("errno={name}({errno}): {} ({expected})", strerror(errno))
    }
}

/// The message of an `errno` value, without the ` (os error N)` suffix `io::Error` appends.
pub(crate) fn strerror(errno: libc::c_int) -> String {
    let message = io::Error::from_raw_os_error(errno).to_string();
    match message.rsplit_once(" (os error ") {
        Some((text, _)) => text.to_string(),
        None => message,
    }
}
