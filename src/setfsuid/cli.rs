use std::mem;

use super::DEFAULT_USER;

#[cfg_attr(test, derive(Debug, PartialEq))]
pub enum SetfsuidAction {
    Help(SetfsuidHelpOptions),
    Version(SetfsuidVersionOptions),
    Run(SetfsuidRunOptions),
}

impl SetfsuidAction {
    pub fn from_env() -> Result<Self, String> {
        SetfsuidOptions::parse_arguments(std::env::args())?.validate()
    }
}

#[cfg_attr(test, derive(Debug, PartialEq))]
pub struct SetfsuidHelpOptions {}

impl TryFrom<SetfsuidOptions> for SetfsuidHelpOptions {
    type Error = String;

    fn try_from(mut opts: SetfsuidOptions) -> Result<Self, Self::Error> {
        let help = mem::take(&mut opts.help);
        debug_assert!(help);
        reject_all("--help", opts)?;
        Ok(Self {})
    }
}

#[cfg_attr(test, derive(Debug, PartialEq))]
pub struct SetfsuidVersionOptions {}

impl TryFrom<SetfsuidOptions> for SetfsuidVersionOptions {
    type Error = String;

    fn try_from(mut opts: SetfsuidOptions) -> Result<Self, Self::Error> {
        let version = mem::take(&mut opts.version);
        debug_assert!(version);
        reject_all("--version", opts)?;
        Ok(Self {})
    }
}

#[derive(Debug)]
#[cfg_attr(test, derive(PartialEq))]
pub struct SetfsuidRunOptions {
    // -u
    pub user: String,
    // -i
    pub iterations: u32,
    // -e
    pub errno_logging: bool,
}

impl Default for SetfsuidRunOptions {
    fn default() -> Self {
        Self {
            user: DEFAULT_USER.into(),
            iterations: 1,
            errno_logging: false,
        }
    }
}

impl TryFrom<SetfsuidOptions> for SetfsuidRunOptions {
    type Error = String;

    fn try_from(mut opts: SetfsuidOptions) -> Result<Self, Self::Error> {
        let user = mem::take(&mut opts.user);
        let iterations = mem::take(&mut opts.iterations);
        let errno_logging = mem::take(&mut opts.errno_logging);

        reject_all("run mode", opts)?;

        let defaults = Self::default();

        Ok(Self {
            user: user.unwrap_or(defaults.user),
            iterations: iterations.unwrap_or(defaults.iterations),
            errno_logging,
        })
    }
}

fn reject_all(context: &str, opts: SetfsuidOptions) -> Result<(), String> {
    macro_rules! ensure_options_absent {
        ($($opt:ident,)* ; $positional:ident) => {
            let SetfsuidOptions {
                $($opt,)* $positional
            } = opts;

            $(if !$opt.is_absent() {
                let name = concat!("--", stringify!($opt)).replace('_', "-");
                return Err(format!("{context} conflicts with {name}"));
            })*

            if !$positional.is_absent() {
                return Err(format!("{context} conflicts with positional argument"));
            }
        };
    }

    ensure_options_absent! {
        errno_logging,
        help,
        iterations,
        user,
        version,
        ; positional_args
    };

    Ok(())
}

trait IsAbsent {
    fn is_absent(&self) -> bool;
}

impl IsAbsent for bool {
    fn is_absent(&self) -> bool {
        !*self
    }
}

impl<T> IsAbsent for Option<T> {
    fn is_absent(&self) -> bool {
        self.is_none()
    }
}

impl<T> IsAbsent for Vec<T> {
    fn is_absent(&self) -> bool {
        self.is_empty()
    }
}

#[derive(Debug, Default, PartialEq)]
pub(super) struct SetfsuidOptions {
    // -e
    errno_logging: bool,
    // -h
    help: bool,
    // -i
    iterations: Option<u32>,
    // -u
    user: Option<String>,
    // -V
    version: bool,

    positional_args: Vec<String>,
}

type OptionSetter = fn(&mut SetfsuidOptions, Option<String>) -> Result<(), String>;

struct SetfsuidOption {
    short: char,
    long: &'static str,
    takes_argument: bool,
    set: OptionSetter,
}

impl SetfsuidOptions {
    const SETFSUID_OPTIONS: &'static [SetfsuidOption] = &[
        SetfsuidOption {
            short: 'e',
            long: "errno-logging",
            takes_argument: false,
            set: |options, _| {
                if options.errno_logging {
                    Err(more_than_once("--errno-logging"))
                } else {
                    options.errno_logging = true;
                    Ok(())
                }
            },
        },
        SetfsuidOption {
            short: 'i',
            long: "iterations",
            takes_argument: true,
            set: |options, argument| {
                let Some(value) = argument else {
                    return Err("no iteration count provided".into());
                };
                if options.iterations.is_some() {
                    return Err(more_than_once("--iterations"));
                }
                match value.parse::<u32>() {
                    Ok(0) => Err("iteration count must be at least 1".into()),
                    Ok(count) => {
                        options.iterations = Some(count);
                        Ok(())
                    }
                    Err(_) => Err(format!("invalid iteration count '{value}'")),
                }
            },
        },
        SetfsuidOption {
            short: 'u',
            long: "user",
            takes_argument: true,
            set: |options, argument| {
                let Some(value) = argument else {
                    return Err("no user provided".into());
                };
                if options.user.is_some() {
                    Err(more_than_once("--user"))
                } else if value.is_empty() {
                    Err("user name cannot be empty".into())
                } else {
                    options.user = Some(value);
                    Ok(())
                }
            },
        },
        SetfsuidOption {
            short: 'V',
            long: "version",
            takes_argument: false,
            set: |options, _| {
                if options.version {
                    Err(more_than_once("--version"))
                } else {
                    options.version = true;
                    Ok(())
                }
            },
        },
        SetfsuidOption {
            short: 'h',
            long: "help",
            takes_argument: false,
            set: |options, _| {
                if options.help {
                    Err(more_than_once("--help"))
                } else {
                    options.help = true;
                    Ok(())
                }
            },
        },
    ];

    /// parse setfsuid04 arguments into SetfsuidOptions struct
    pub(super) fn parse_arguments(
        arguments: impl IntoIterator<Item = String>,
    ) -> Result<SetfsuidOptions, String> {
        let mut options: SetfsuidOptions = SetfsuidOptions::default();
        let mut arg_iter = arguments.into_iter().skip(1);

        while let Some(arg) = arg_iter.next() {
            if arg == "--" {
                // only positional arguments after this point
                options.positional_args.extend(arg_iter);

                break;

                // if the argument starts with -- it must be a full length option name
            } else if let Some(unprefixed) = arg.strip_prefix("--") {
                // parse assignments like '--user=nobody'
                if let Some((key, value)) = unprefixed.split_once('=') {
                    // lookup the option by name
                    if let Some(option) = Self::SETFSUID_OPTIONS.iter().find(|o| o.long == key) {
                        // the value is already present, when the option does not take any arguments this results in an error
                        if option.takes_argument {
                            (option.set)(&mut options, Some(value.to_string()))?;
                        } else {
                            Err(format!("'--{}' does not take any arguments", option.long))?;
                        }
                    } else {
                        Err(format!("unrecognized option '{arg}'"))?;
                    }
                // lookup the option
                } else if let Some(option) =
                    Self::SETFSUID_OPTIONS.iter().find(|o| o.long == unprefixed)
                {
                    // try to parse an argument when the option needs an argument
                    if option.takes_argument {
                        let next_arg = arg_iter.next();
                        (option.set)(&mut options, next_arg)?;
                    } else {
                        (option.set)(&mut options, None)?;
                    }
                } else {
                    Err(format!("unrecognized option '{arg}'"))?;
                }
            } else if let Some(unprefixed) = arg.strip_prefix('-').filter(|rest| !rest.is_empty()) {
                // flags can be grouped, so we loop over the the characters
                let mut chars = unprefixed.chars();
                while let Some(curr) = chars.next() {
                    // lookup the option
                    if let Some(option) = Self::SETFSUID_OPTIONS.iter().find(|o| o.short == curr) {
                        // try to parse an argument when one is necessary, either the rest of the current flag group or the next argument
                        let rest = chars.as_str();

                        if option.takes_argument {
                            let next_arg = if rest.is_empty() {
                                arg_iter.next()
                            } else {
                                Some(rest.to_string())
                            };
                            (option.set)(&mut options, next_arg)?;
                            // stop looping over flags if the current flag takes an argument
                            break;
                        } else {
                            // parse flag without argument
                            (option.set)(&mut options, None)?;
                        }
                    } else {
                        Err(format!("unrecognized option '{curr}'"))?;
                    }
                }
            } else {
                options.positional_args.push(arg);
            }
        }

        Ok(options)
    }

    pub(super) fn validate(self) -> Result<SetfsuidAction, String> {
        let action = if self.help {
            SetfsuidAction::Help(self.try_into()?)
        } else if self.version {
            SetfsuidAction::Version(self.try_into()?)
        } else {
            SetfsuidAction::Run(self.try_into()?)
        };
        Ok(action)
    }
}

fn more_than_once(flag: &str) -> String {
    format!("argument '{flag}' was provided more than once, but cannot be used multiple times")
}

#[cfg(test)]
mod tests {
    use super::{
        SetfsuidAction, SetfsuidHelpOptions, SetfsuidOptions, SetfsuidRunOptions,
        SetfsuidVersionOptions,
    };
    use pretty_assertions::assert_eq;

    fn try_parse(args: &[&str]) -> Result<SetfsuidAction, String> {
        let mut args = args.iter().map(|s| s.to_string()).collect::<Vec<String>>();
        args.insert(0, "/usr/bin/setfsuid04".to_string());
        SetfsuidOptions::parse_arguments(args)?.validate()
    }

    fn parse(args: &[&str]) -> SetfsuidAction {
        try_parse(args).unwrap()
    }

    #[test]
    fn it_defaults_to_a_single_run_as_nobody() {
        assert_eq!(
            parse(&[]),
            SetfsuidAction::Run(SetfsuidRunOptions {
                user: "nobody".into(),
                iterations: 1,
                errno_logging: false,
            })
        );
    }

    #[test]
    fn it_parses_user() {
        let expected = SetfsuidAction::Run(SetfsuidRunOptions {
            user: "ferris".into(),
            ..<_>::default()
        });
        assert_eq!(expected, parse(&["-u", "ferris"]));
        assert_eq!(expected, parse(&["-uferris"]));
        assert_eq!(expected, parse(&["--user", "ferris"]));
        assert_eq!(expected, parse(&["--user=ferris"]));
    }

    #[test]
    fn it_parses_iterations() {
        let expected = SetfsuidAction::Run(SetfsuidRunOptions {
            iterations: 3,
            ..<_>::default()
        });
        assert_eq!(expected, parse(&["-i", "3"]));
        assert_eq!(expected, parse(&["-i3"]));
        assert_eq!(expected, parse(&["--iterations=3"]));
    }

    #[test]
    fn it_parses_combined_options_and_arguments() {
        let expected = SetfsuidAction::Run(SetfsuidRunOptions {
            user: "daemon".into(),
            iterations: 5,
            errno_logging: true,
        });

        assert_eq!(expected, parse(&["-ei5", "-u", "daemon"]));
        assert_eq!(expected, parse(&["-eudaemon", "--iterations", "5"]));
        assert_eq!(expected, parse(&["--errno-logging", "-i", "5", "-udaemon"]));
    }

    #[test]
    fn it_rejects_bad_iteration_counts() {
        assert_eq!(
            try_parse(&["-i", "0"]),
            Err("iteration count must be at least 1".into())
        );
        assert_eq!(
            try_parse(&["-i", "many"]),
            Err("invalid iteration count 'many'".into())
        );
        assert_eq!(try_parse(&["-i"]), Err("no iteration count provided".into()));
    }

    #[test]
    fn it_rejects_repeated_and_unknown_flags() {
        assert!(try_parse(&["-e", "-e"])
            .unwrap_err()
            .contains("provided more than once"));
        assert_eq!(
            try_parse(&["-x"]),
            Err("unrecognized option 'x'".into())
        );
        assert_eq!(
            try_parse(&["--timing"]),
            Err("unrecognized option '--timing'".into())
        );
        assert_eq!(
            try_parse(&["--errno-logging=yes"]),
            Err("'--errno-logging' does not take any arguments".into())
        );
        assert_eq!(
            try_parse(&["-u", ""]),
            Err("user name cannot be empty".into())
        );
    }

    #[test]
    fn it_rejects_positional_arguments() {
        assert_eq!(
            try_parse(&["nobody"]),
            Err("run mode conflicts with positional argument".into())
        );
        assert_eq!(
            try_parse(&["--", "-u"]),
            Err("run mode conflicts with positional argument".into())
        );
        assert_eq!(
            try_parse(&["-"]),
            Err("run mode conflicts with positional argument".into())
        );
    }

    #[test]
    fn help_and_version_stand_alone() {
        assert_eq!(parse(&["-h"]), SetfsuidAction::Help(SetfsuidHelpOptions {}));
        assert_eq!(
            parse(&["--version"]),
            SetfsuidAction::Version(SetfsuidVersionOptions {})
        );
        assert_eq!(
            try_parse(&["--help", "-u", "nobody"]),
            Err("--help conflicts with --user".into())
        );
        assert_eq!(
            try_parse(&["-V", "-e"]),
            Err("--version conflicts with --errno-logging".into())
        );
    }
}
