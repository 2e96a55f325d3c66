use std::io;

use crate::log::dev_warn;

use super::{consts::*, set::SignalAction, signal_name, SignalNumber};

/// An installed signal action.
///
/// Dropping the value puts back the action that was in place before [`SignalHandler::register`].
pub(crate) struct SignalHandler {
    signal: SignalNumber,
    original_action: SignalAction,
}

impl SignalHandler {
    const FORBIDDEN: &'static [SignalNumber] = &[SIGKILL, SIGSTOP];

    /// # Panics
    ///
    /// If `signal` is one whose action cannot be changed.
    pub(crate) fn register(
        signal: SignalNumber,
        behavior: SignalHandlerBehavior,
    ) -> io::Result<Self> {
        if Self::FORBIDDEN.contains(&signal) {
            panic!(
                "the {} signal action cannot be overriden",
                signal_name(signal).unwrap_or("?")
            );
        }

        let original_action = SignalAction::new(behavior)?.register(signal)?;

        Ok(Self {
            signal,
            original_action,
        })
    }

    /// Keep the installed action in place for good.
    pub(crate) fn forget(self) {
        std::mem::forget(self)
    }
}

impl Drop for SignalHandler {
    #[track_caller]
    fn drop(&mut self) {
        if let Err(err) = self.original_action.register(self.signal) {
            dev_warn!(
                "cannot restore original action for {}: {err}",
                signal_name(self.signal).unwrap_or("?"),
            )
        }
    }
}

pub(crate) enum SignalHandlerBehavior {
    /// The default action of the signal.
    Default,
    /// Forward the signal information to the [`super::SignalStream`].
    Stream,
}

/// Give `signals` their default action permanently, as needed after forking from a process
/// that streams them.
pub(crate) fn reset_to_default(signals: &[SignalNumber]) -> io::Result<()> {
    for &signal in signals {
        SignalHandler::register(signal, SignalHandlerBehavior::Default)?.forget();
    }
    Ok(())
}
