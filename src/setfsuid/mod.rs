use std::process;

use crate::common::Error;
use crate::harness::{ExpectedErrnos, Reporter, Verdict, EXIT_BROKEN, EXIT_PASS};
use crate::log::{dev_debug, dev_info, user_error, user_warn};
use crate::system::{
    _exit, fork,
    interface::ProcessId,
    getpgid, kill, killpg, setpgid,
    signal::{
        consts::*, register_handlers, reset_to_default, signal_name, SignalNumber,
        SignalStream,
    },
    wait::{Wait, WaitError, WaitOptions},
    ForkResult, Process,
};

use cli::{SetfsuidAction, SetfsuidRunOptions};
use context::SetfsuidContext;
use fixture::Fixture;
use help::{long_help_message, USAGE_MSG};
use probe::Probe;

mod cli;
mod context;
mod fixture;
mod help;
mod probe;
mod verifier;

const TCID: &str = "setfsuid04";
const DEFAULT_USER: &str = "nobody";
const VERSION: &str = env!("CARGO_PKG_VERSION");

const STREAMED_SIGNALS: [SignalNumber; 5] = [SIGCHLD, SIGINT, SIGTERM, SIGHUP, SIGQUIT];

/// Probe process body: undo the orchestrator's signal setup, then run the verifier.
fn probe_process(fixture: &Fixture, mut reporter: Reporter) -> i32 {
    if let Err(err) = reset_to_default(&STREAMED_SIGNALS) {
        reporter.broken(format_args!("cannot reset signal handlers: {err}"));
        return EXIT_BROKEN;
    }

    if let Err(err) = setpgid(ProcessId::new(0), ProcessId::new(0)) {
        reporter.broken(format_args!("cannot create process group: {err}"));
        return EXIT_BROKEN;
    }

    verifier::verify(
        fixture.artifact.path(),
        fixture.privileged,
        &fixture.unprivileged,
        &mut reporter,
    )
}

/// Run one verification in a forked probe process so that its fsuid changes never reach the
/// orchestrator.
fn run_isolated(
    stream: &SignalStream,
    fixture: &Fixture,
    reporter: &mut Reporter,
) -> Result<Verdict, Error> {
    log::logger().flush();

    match fork().map_err(Error::Fork)? {
        ForkResult::Child => {
            let code = probe_process(fixture, reporter.clone());
            log::logger().flush();
            _exit(code)
        }
        ForkResult::Parent(pid) => {
            // both sides set the group, whichever runs first wins
            let _ = setpgid(pid, pid);
            dev_debug!("probe process {pid} in group {:?}", getpgid(pid).ok());
            supervise(stream, pid, reporter)
        }
    }
}

/// Wait for the probe process while watching for termination signals.
fn supervise(
    stream: &SignalStream,
    probe_pid: ProcessId,
    reporter: &mut Reporter,
) -> Result<Verdict, Error> {
    loop {
        let info = stream.recv()?;
        let signal = info.signal();
        dev_debug!(
            "received {} from {}",
            signal_name(signal).unwrap_or("?"),
            info.pid()
        );

        if signal != SIGCHLD {
            dev_info!("terminating probe process group {probe_pid}");
            if killpg(probe_pid, SIGKILL).is_err() {
                let _ = kill(probe_pid, SIGKILL);
            }
            let _ = probe_pid.wait(WaitOptions::new());
            return Err(Error::Interrupted(signal));
        }

        match probe_pid.wait(WaitOptions::new().no_hang()) {
            Ok((_, status)) => {
                dev_debug!("probe process {probe_pid} finished: {status:?}");
                if status.was_signaled() {
                    reporter.fail(format_args!(
                        "probe process {probe_pid} terminated abnormally ({status:?})"
                    ));
                }
                return Verdict::from_wait_status(probe_pid, &status);
            }
            Err(WaitError::NotReady) => continue,
            Err(WaitError::Io(err)) => return Err(Error::Wait(err)),
        }
    }
}

fn run(options: SetfsuidRunOptions) -> Result<Verdict, Error> {
    let context = SetfsuidContext::from_env(options);
    dev_debug!("{context:?}");

    let fixture = Fixture::setup(&context)?;
    let mut reporter = Reporter::new(
        context.tcid,
        context.errno_logging,
        ExpectedErrnos::new(&[libc::EACCES]),
    );

    let stream = SignalStream::init()?;
    let handlers = register_handlers(STREAMED_SIGNALS)?;

    let mut verdict = Verdict::AllProbesMatchedExpectation;
    for iteration in 1..=context.iterations {
        if context.iterations > 1 {
            reporter.info(format_args!("iteration {iteration} of {}", context.iterations));
        }

        verdict = verdict.and(run_isolated(stream, &fixture, &mut reporter)?);
        // every iteration owns one check number per probe, used or not
        reporter.counted_elsewhere(Probe::ALL.len() as u32);

        if let Some(current) = fixture.artifact_changes()? {
            reporter.fail(format_args!(
                "artifact changed from {:?} to {current:?}",
                fixture.artifact.attributes()
            ));
            verdict = Verdict::SomeProbeFailed;
        }
    }

    drop(handlers);
    fixture.teardown()?;

    Ok(verdict)
}

pub fn main() {
    crate::log::ConformanceLogger::new("setfsuid04: ").into_global_logger();

    let action = match SetfsuidAction::from_env() {
        Ok(action) => action,
        Err(error) => {
            user_error!("{error}");
            eprintln_ignore_io_error!("{USAGE_MSG}");
            process::exit(EXIT_BROKEN);
        }
    };

    match action {
        SetfsuidAction::Help(_) => {
            println_ignore_io_error!("{}", long_help_message());
            process::exit(EXIT_PASS);
        }
        SetfsuidAction::Version(_) => {
            println_ignore_io_error!("setfsuid04 {VERSION}");
            process::exit(EXIT_PASS);
        }
        SetfsuidAction::Run(options) => {
            let code = match run(options) {
                Ok(verdict) => verdict.exit_code(),
                Err(Error::Interrupted(signal)) => {
                    user_warn!("{}", Error::Interrupted(signal));
                    log::logger().flush();
                    // the default action is back in place, so this ends the process the way
                    // the signal would have
                    let _ = kill(Process::process_id(), signal);
                    EXIT_BROKEN
                }
                Err(error) => {
                    Reporter::new(TCID, false, ExpectedErrnos::default()).broken(&error);
                    EXIT_BROKEN
                }
            };

            log::logger().flush();
            process::exit(code);
        }
    }
}
