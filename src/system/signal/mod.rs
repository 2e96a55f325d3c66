//! Utilities to handle signals.
#![warn(unused)]
use libc::c_int;

mod handler;
mod info;
mod set;
mod stream;

pub(crate) use handler::reset_to_default;
pub(crate) use stream::{register_handlers, SignalStream};

pub(crate) type SignalNumber = c_int;

macro_rules! define_consts {
    ($($signal:ident,)*) => {
        pub(crate) mod consts {
            pub(crate) use libc::{$($signal,)*};
        }

        pub(crate) fn signal_name(signal: SignalNumber) -> Option<&'static str> {
            match signal {
                $(consts::$signal => Some(stringify!($signal)),)*
                _ => None,
            }
        }
    };
}

define_consts! {
    SIGINT,
    SIGQUIT,
    SIGTERM,
    SIGHUP,
    SIGCHLD,
    SIGKILL,
    SIGSTOP,
    SIGSEGV,
    SIGABRT,
    SIGUSR1,
}
