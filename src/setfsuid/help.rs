pub const USAGE_MSG: &str = "Usage: setfsuid04 [options]";

const DESCRIPTOR: &str = "Check that the filesystem user ID gates file permission checks.
A root-owned 0644 file must refuse O_RDWR once the fsuid is switched to <user>,
in the process itself and in a child forked afterwards, and accept it again
once the fsuid is switched back to root.  Must be run as root.";

const HELP_MSG: &str = "Options:
-u, --user <user>           unprivileged account to switch to, by name or as #<uid>
                            (default: nobody)
-i, --iterations <count>    repeat the verification <count> times
-e, --errno-logging         log the errno of every denied access

-h, --help                  display this help
-V, --version               display version

Exit status: 0 on pass, 1 if a probe failed, 2 if the test could not run.
";

pub fn long_help_message() -> String {
    format!("{USAGE_MSG}\n\n{DESCRIPTOR}\n\n{HELP_MSG}")
}
