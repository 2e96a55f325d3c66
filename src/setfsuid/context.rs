use std::{env, ffi::OsString, path::PathBuf};

use crate::system::{interface::ProcessId, Process};

use super::{cli::SetfsuidRunOptions, TCID};

const PATH_TMPDIR_DEFAULT: &str = env!("PATH_TMPDIR_DEFAULT");

/// Everything a run needs to know about its invocation.
#[derive(Debug)]
pub(crate) struct SetfsuidContext {
    pub(crate) tcid: &'static str,
    pub(crate) user: String,
    pub(crate) iterations: u32,
    pub(crate) errno_logging: bool,
    pub(crate) tmp_root: PathBuf,
    pub(crate) pid: ProcessId,
}

impl SetfsuidContext {
    pub(crate) fn from_env(options: SetfsuidRunOptions) -> SetfsuidContext {
        SetfsuidContext {
            tcid: TCID,
            user: options.user,
            iterations: options.iterations,
            errno_logging: options.errno_logging,
            tmp_root: tmp_root_from(env::var_os("TMPDIR")),
            pid: Process::process_id(),
        }
    }
}

/// The directory private workspaces are created in: `$TMPDIR` when it names an absolute path,
/// the build-time default otherwise.
fn tmp_root_from(tmpdir: Option<OsString>) -> PathBuf {
    match tmpdir.map(PathBuf::from) {
        Some(path) if path.is_absolute() => path,
        _ => PathBuf::from(PATH_TMPDIR_DEFAULT),
    }
}

#[cfg(test)]
mod tests {
    use super::{tmp_root_from, SetfsuidContext, PATH_TMPDIR_DEFAULT};
    use crate::setfsuid::cli::SetfsuidRunOptions;
    use crate::system::Process;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    #[test]
    fn tmpdir_overrides_only_with_absolute_paths() {
        assert_eq!(
            tmp_root_from(Some("/var/scratch".into())),
            PathBuf::from("/var/scratch")
        );
        assert_eq!(
            tmp_root_from(Some("scratch".into())),
            PathBuf::from(PATH_TMPDIR_DEFAULT)
        );
        assert_eq!(tmp_root_from(Some("".into())), PathBuf::from(PATH_TMPDIR_DEFAULT));
        assert_eq!(tmp_root_from(None), PathBuf::from(PATH_TMPDIR_DEFAULT));
    }

    #[test]
    fn context_carries_the_options() {
        let context = SetfsuidContext::from_env(SetfsuidRunOptions {
            user: "daemon".into(),
            iterations: 4,
            errno_logging: true,
        });

        assert_eq!(context.tcid, "setfsuid04");
        assert_eq!(context.user, "daemon");
        assert_eq!(context.iterations, 4);
        assert!(context.errno_logging);
        assert!(context.tmp_root.is_absolute());
        assert_eq!(context.pid, Process::process_id());
    }
}
