use std::{
    io,
    mem::MaybeUninit,
    os::{fd::AsRawFd, unix::net::UnixStream},
    sync::OnceLock,
};

use crate::{cutils::cerr, log::dev_error};

use super::{
    handler::{SignalHandler, SignalHandlerBehavior},
    info::SignalInfo,
    signal_name, SignalNumber,
};

static STREAM: OnceLock<SignalStream> = OnceLock::new();

pub(super) unsafe extern "C" fn send_siginfo(
    _signal: SignalNumber,
    info: *const SignalInfo,
    _context: *const libc::c_void,
) {
    if let Some(tx) = STREAM.get().map(|stream| stream.tx.as_raw_fd()) {
        unsafe { libc::send(tx, info.cast(), SignalInfo::SIZE, libc::MSG_DONTWAIT) };
    }
}

/// A type able to receive signal information from any [`SignalHandler`] with the
/// [`SignalHandlerBehavior::Stream`] behavior.
///
/// This is a singleton type. Meaning that there will be only one value of this type during the
/// execution of a program.
pub(crate) struct SignalStream {
    rx: UnixStream,
    tx: UnixStream,
}

impl SignalStream {
    /// Create a new [`SignalStream`], or return the one created by an earlier call.
    #[track_caller]
    pub(crate) fn init() -> io::Result<&'static Self> {
        if let Some(stream) = STREAM.get() {
            return Ok(stream);
        }

        let (rx, tx) = UnixStream::pair().map_err(|err| {
            dev_error!("cannot create socket pair for `SignalStream`: {err}");
            err
        })?;

        Ok(STREAM.get_or_init(|| Self { rx, tx }))
    }

    /// Receives the information related to the arrival of a signal.
    ///
    /// Calling this function will block until a signal whose action is set to
    /// [`SignalHandlerBehavior::Stream`] arrives.
    pub(crate) fn recv(&self) -> io::Result<SignalInfo> {
        let mut info = MaybeUninit::<SignalInfo>::uninit();
        let fd = self.rx.as_raw_fd();
        let bytes = cerr(unsafe { libc::recv(fd, info.as_mut_ptr().cast(), SignalInfo::SIZE, 0) })?;

        if bytes as usize != SignalInfo::SIZE {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "Not enough bytes when receiving `siginfo_t`",
            ));
        }
        // SAFETY: we can assume `info` is initialized because `recv` wrote enough bytes to fill
        // the value and `siginfo_t` is POD.
        Ok(unsafe { info.assume_init() })
    }
}

#[track_caller]
pub(crate) fn register_handlers<const N: usize>(
    signals: [SignalNumber; N],
) -> io::Result<[SignalHandler; N]> {
    let mut handlers = signals.map(|signal| (signal, MaybeUninit::uninit()));

    for (signal, handler) in &mut handlers {
        *handler = SignalHandler::register(*signal, SignalHandlerBehavior::Stream)
            .map(MaybeUninit::new)
            .map_err(|err| {
                let name = signal_name(*signal).unwrap_or("?");
                dev_error!("cannot setup handler for {name}: {err}");
                err
            })?;
    }

    Ok(handlers.map(|(_, handler)| unsafe { handler.assume_init() }))
}

#[cfg(test)]
mod tests {
    use super::{register_handlers, SignalStream};
    use crate::system::{
        _exit, fork, kill, signal::consts::SIGHUP, wait::Wait, wait::WaitOptions, ForkResult,
        Process,
    };

    #[test]
    fn streams_a_signal_sent_to_self() {
        // run in a separate process so the handler does not leak into the test harness
        let ForkResult::Parent(child) = fork().unwrap() else {
            let received = (|| -> std::io::Result<bool> {
                let stream = SignalStream::init()?;
                let _handlers = register_handlers([SIGHUP])?;
                kill(Process::process_id(), SIGHUP)?;
                let info = stream.recv()?;
                Ok(info.signal() == SIGHUP && info.pid() == Process::process_id())
            })();
            _exit(match received {
                Ok(true) => 0,
                Ok(false) => 1,
                Err(_) => 2,
            });
        };

        let (pid, status) = child.wait(WaitOptions::new()).unwrap();
        assert_eq!(pid, child);
        assert_eq!(status.exit_status(), Some(0));
    }
}
