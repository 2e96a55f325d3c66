use crate::cutils::cerr;

use super::{handler::SignalHandlerBehavior, info::SignalInfo, SignalNumber};

use std::{io, mem::MaybeUninit};

type SignalHandlerFn = unsafe extern "C" fn(SignalNumber, *const SignalInfo, *const libc::c_void);

/// A `sigaction` value, either one to install or one that was replaced.
#[repr(transparent)]
pub(super) struct SignalAction {
    raw: libc::sigaction,
}

impl SignalAction {
    pub(super) fn new(behavior: SignalHandlerBehavior) -> io::Result<Self> {
        // SAFETY: `sigaction` is a plain C struct for which all-zeroes is a valid value
        let mut raw: libc::sigaction = unsafe { std::mem::zeroed() };

        // the orchestrator blocks in `recv` and `waitpid`; neither may fail with EINTR
        raw.sa_flags = libc::SA_RESTART;

        match behavior {
            SignalHandlerBehavior::Default => {
                raw.sa_sigaction = libc::SIG_DFL;
                raw.sa_mask = empty_set()?;
            }
            SignalHandlerBehavior::Stream => {
                raw.sa_flags |= libc::SA_SIGINFO;
                let handler: SignalHandlerFn = super::stream::send_siginfo;
                raw.sa_sigaction = handler as libc::sighandler_t;
                // nothing may interrupt the handler while it writes to the stream
                raw.sa_mask = full_set()?;
            }
        }

        Ok(Self { raw })
    }

    /// Install this action for `signal`, returning the one it replaces.
    pub(super) fn register(&self, signal: SignalNumber) -> io::Result<Self> {
        let mut original_action = MaybeUninit::<Self>::zeroed();

        cerr(unsafe { libc::sigaction(signal, &self.raw, original_action.as_mut_ptr().cast()) })?;

        Ok(unsafe { original_action.assume_init() })
    }
}

fn empty_set() -> io::Result<libc::sigset_t> {
    let mut set = MaybeUninit::<libc::sigset_t>::zeroed();
    cerr(unsafe { libc::sigemptyset(set.as_mut_ptr()) })?;
    Ok(unsafe { set.assume_init() })
}

fn full_set() -> io::Result<libc::sigset_t> {
    let mut set = MaybeUninit::<libc::sigset_t>::zeroed();
    cerr(unsafe { libc::sigfillset(set.as_mut_ptr()) })?;
    Ok(unsafe { set.assume_init() })
}
