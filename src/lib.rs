#[macro_use]
mod macros;
pub(crate) mod common;
pub(crate) mod cutils;
pub(crate) mod harness;
pub(crate) mod log;
pub(crate) mod system;

mod setfsuid;

pub use setfsuid::main as setfsuid04_main;

#[cfg(not(target_os = "linux"))]
compile_error!("the filesystem user ID only exists on Linux");
