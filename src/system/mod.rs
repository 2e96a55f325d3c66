use std::{ffi::CStr, io, mem::MaybeUninit};

use crate::cutils::{cerr, string_from_ptr, sysconf};
use interface::{GroupId, ProcessId, UserId};

use self::signal::SignalNumber;

// strongly typed process and user identifiers
pub mod interface;

pub mod file;

pub mod fsuid;

pub mod signal;

pub mod wait;

pub(crate) fn _exit(status: libc::c_int) -> ! {
    unsafe { libc::_exit(status) }
}

pub(crate) enum ForkResult {
    // Parent process branch with the child process' PID.
    Parent(ProcessId),
    // Child process branch.
    Child,
}

/// Create a new process.
///
/// The child gets a copy of every process credential of the caller, the filesystem user ID
/// included.
pub(crate) fn fork() -> io::Result<ForkResult> {
    // SAFETY: `fork` is implemented using `clone` in linux so we don't need to worry about signal
    // safety.
    let pid = cerr(unsafe { libc::fork() })?;
    if pid == 0 {
        Ok(ForkResult::Child)
    } else {
        Ok(ForkResult::Parent(ProcessId::new(pid)))
    }
}

/// Send a signal to a process with the specified ID.
pub fn kill(pid: ProcessId, signal: SignalNumber) -> io::Result<()> {
    // SAFETY: This function cannot cause UB even if `pid` is not a valid process ID or if
    // `signal` is not a valid signal code.
    cerr(unsafe { libc::kill(pid.get(), signal) }).map(|_| ())
}

/// Send a signal to a process group with the specified ID.
pub fn killpg(pgid: ProcessId, signal: SignalNumber) -> io::Result<()> {
    // SAFETY: This function cannot cause UB even if `pgid` is not a valid process ID or if
    // `signal` is not a valid signal code.
    cerr(unsafe { libc::killpg(pgid.get(), signal) }).map(|_| ())
}

/// Get a process group ID.
pub fn getpgid(pid: ProcessId) -> io::Result<ProcessId> {
    // SAFETY: This function cannot cause UB even if `pid` is not a valid process ID
    cerr(unsafe { libc::getpgid(pid.get()) }).map(ProcessId::new)
}

/// Set a process group ID.
pub fn setpgid(pid: ProcessId, pgid: ProcessId) -> io::Result<()> {
    cerr(unsafe { libc::setpgid(pid.get(), pgid.get()) }).map(|_| ())
}

/// An entry of the password database.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub uid: UserId,
    pub gid: GroupId,
    pub name: String,
}

/// Run one of the reentrant `getpw*_r` lookups with a buffer of the recommended size.
fn lookup_passwd(
    lookup: impl FnOnce(
        *mut libc::passwd,
        *mut libc::c_char,
        libc::size_t,
        *mut *mut libc::passwd,
    ) -> libc::c_int,
) -> io::Result<Option<User>> {
    let max_pw_size = sysconf(libc::_SC_GETPW_R_SIZE_MAX).unwrap_or(16_384);
    let mut buf = vec![0; max_pw_size as usize];
    let mut pwd = MaybeUninit::<libc::passwd>::uninit();
    let mut pwd_ptr = std::ptr::null_mut();

    // the getpw*_r functions return the error number instead of setting errno
    match lookup(pwd.as_mut_ptr(), buf.as_mut_ptr(), buf.len(), &mut pwd_ptr) {
        0 => {}
        errno => return Err(io::Error::from_raw_os_error(errno)),
    }

    if pwd_ptr.is_null() {
        return Ok(None);
    }

    // SAFETY: a non-null result means `pwd` was filled in, with its strings pointing into `buf`
    let pwd = unsafe { pwd.assume_init() };
    Ok(Some(User {
        uid: UserId::new(pwd.pw_uid),
        gid: GroupId::new(pwd.pw_gid),
        name: unsafe { string_from_ptr(pwd.pw_name) },
    }))
}

impl User {
    pub fn from_uid(uid: UserId) -> io::Result<Option<User>> {
        lookup_passwd(|pwd, buf, len, result| unsafe {
            libc::getpwuid_r(uid.get(), pwd, buf, len, result)
        })
    }

    pub fn from_name(name_c: &CStr) -> io::Result<Option<User>> {
        lookup_passwd(|pwd, buf, len, result| unsafe {
            libc::getpwnam_r(name_c.as_ptr(), pwd, buf, len, result)
        })
    }

    pub fn effective_uid() -> UserId {
        UserId::new(unsafe { libc::geteuid() })
    }

    pub fn real_uid() -> UserId {
        UserId::new(unsafe { libc::getuid() })
    }
}

pub struct Process;

impl Process {
    /// Return the process identifier for the current process
    pub fn process_id() -> ProcessId {
        // NOTE libstd casts the `i32` that `libc::getpid` returns into `u32`
        // here we cast it back into `i32` (`ProcessId`)
        ProcessId::new(std::process::id() as libc::pid_t)
    }
}
