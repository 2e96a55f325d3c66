use crate::system::interface::ProcessId;

use super::SignalNumber;

/// The `siginfo_t` of a streamed signal.
#[repr(transparent)]
pub(crate) struct SignalInfo {
    info: libc::siginfo_t,
}

impl SignalInfo {
    pub(super) const SIZE: usize = std::mem::size_of::<Self>();

    /// The process that sent the signal. For `SIGCHLD` this is the child that changed state.
    pub(crate) fn pid(&self) -> ProcessId {
        ProcessId::new(unsafe { self.info.si_pid() })
    }

    pub(crate) fn signal(&self) -> SignalNumber {
        self.info.si_signo
    }
}
