//! Locating and running helper tools.

use std::env;
use std::ffi::{OsStr, OsString};
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

use crate::error::ProcessError;
use crate::quoting::quoted_if_necessary;

/// Launcher used when a tool is not found on `PATH`
pub const ENV_LAUNCHER: &str = "/usr/bin/env";

/// Helper binaries the CLI can drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    Git,
}

impl Tool {
    pub fn name(self) -> &'static str {
        match self {
            Tool::Git => "git",
        }
    }

    /// Full path of the tool on `PATH`, if any.
    pub fn locate(self) -> Option<PathBuf> {
        find_executable(self.name(), env::var_os("PATH").as_deref())
    }

    /// Invocation of this tool with `args`.
    pub fn invocation<I, S>(self, args: I) -> Invocation
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        Invocation::resolve(self, self.locate(), args)
    }
}

/// Search each directory of `path_var` for a file called `name`.
pub fn find_executable(name: &str, path_var: Option<&OsStr>) -> Option<PathBuf> {
    let path_var = path_var?;
    env::split_paths(path_var)
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
}

/// A program and its arguments, ready to spawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<OsString>,
}

impl Invocation {
    /// Run `located` directly, or go through `/usr/bin/env` with the tool
    /// name prepended when it was not found.
    pub fn resolve<I, S>(tool: Tool, located: Option<PathBuf>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        let args = args.into_iter().map(Into::into);
        match located {
            Some(program) => Self {
                program,
                args: args.collect(),
            },
            None => {
                log::debug!("{} not found on PATH, using {}", tool.name(), ENV_LAUNCHER);
                Self {
                    program: PathBuf::from(ENV_LAUNCHER),
                    args: std::iter::once(OsString::from(tool.name()))
                        .chain(args)
                        .collect(),
                }
            }
        }
    }

    /// Shell-like rendering for diagnostics.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_os_str())
            .chain(self.args.iter().map(OsString::as_os_str))
            .map(|part| quoted_if_necessary(&part.to_string_lossy()))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn command(&self, dir: Option<&Path>) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        if let Some(dir) = dir {
            command.current_dir(dir);
        }
        command
    }

    /// Run with inherited stdio and wait for it to exit.
    pub fn run(&self, dir: Option<&Path>) -> Result<(), ProcessError> {
        log::debug!("Running {}", self.command_line());
        let status = self
            .command(dir)
            .status()
            .map_err(|e| self.spawn_error(e))?;
        check_status(status)
    }

    /// Run and return stdout, which must be UTF-8.
    pub fn capture(&self, dir: Option<&Path>) -> Result<String, ProcessError> {
        log::debug!("Capturing {}", self.command_line());
        let output = self
            .command(dir)
            .stdin(Stdio::null())
            .stderr(Stdio::inherit())
            .output()
            .map_err(|e| self.spawn_error(e))?;
        check_status(output.status)?;
        String::from_utf8(output.stdout).map_err(|_| ProcessError::InvalidUtf8Output)
    }

    fn spawn_error(&self, error: io::Error) -> ProcessError {
        if error.kind() == io::ErrorKind::NotFound {
            ProcessError::NotFound(self.program.display().to_string())
        } else {
            ProcessError::FailedToRun(error)
        }
    }
}

/// Map an exit status to success or the way the process ended.
pub fn check_status(status: ExitStatus) -> Result<(), ProcessError> {
    if status.success() {
        return Ok(());
    }
    if let Some(code) = status.code() {
        return Err(ProcessError::NonZeroExitStatus(code));
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return Err(ProcessError::Terminated(signal));
        }
    }

    Err(ProcessError::NonZeroExitStatus(-1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture_dir(name: &str) -> PathBuf {
        let dir = env::temp_dir().join(format!("openusd_runner_{}_{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn os_args(args: &[&str]) -> Vec<OsString> {
        args.iter().map(OsString::from).collect()
    }

    #[test]
    fn test_find_executable_on_path() {
        let first = fixture_dir("first");
        let second = fixture_dir("second");
        std::fs::write(second.join("tool"), "").unwrap();

        let path_var = env::join_paths([&first, &second]).unwrap();
        assert_eq!(
            find_executable("tool", Some(path_var.as_os_str())),
            Some(second.join("tool"))
        );
        assert_eq!(find_executable("missing", Some(path_var.as_os_str())), None);
        assert_eq!(find_executable("tool", None), None);

        std::fs::remove_dir_all(first).unwrap();
        std::fs::remove_dir_all(second).unwrap();
    }

    #[test]
    fn test_env_fallback_prepends_tool_name() {
        let invocation = Invocation::resolve(Tool::Git, None, ["pull", "--ff-only"]);
        assert_eq!(invocation.program, PathBuf::from(ENV_LAUNCHER));
        assert_eq!(invocation.args, os_args(&["git", "pull", "--ff-only"]));
    }

    #[test]
    fn test_located_tool_runs_directly() {
        let invocation =
            Invocation::resolve(Tool::Git, Some(PathBuf::from("/opt/bin/git")), ["fetch", "--tags"]);
        assert_eq!(invocation.program, PathBuf::from("/opt/bin/git"));
        assert_eq!(invocation.args, os_args(&["fetch", "--tags"]));
    }

    #[test]
    fn test_command_line_quotes_arguments() {
        let invocation = Invocation::resolve(
            Tool::Git,
            Some(PathBuf::from("/usr/bin/git")),
            ["commit", "-m", "bump usd"],
        );
        assert_eq!(invocation.command_line(), "/usr/bin/git commit -m 'bump usd'");
    }

    #[test]
    fn test_missing_program_is_not_found() {
        let invocation = Invocation {
            program: PathBuf::from("/nonexistent/openusd-helper"),
            args: Vec::new(),
        };
        assert!(matches!(invocation.run(None), Err(ProcessError::NotFound(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_exit_status_mapping() {
        let exit = |script: &str| Invocation {
            program: PathBuf::from("/bin/sh"),
            args: vec!["-c".into(), script.into()],
        };

        assert!(exit("exit 0").run(None).is_ok());
        assert!(matches!(
            exit("exit 3").run(None),
            Err(ProcessError::NonZeroExitStatus(3))
        ));
        assert!(matches!(
            exit("kill -9 $$").run(None),
            Err(ProcessError::Terminated(9))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_capture_checks_utf8() {
        let ok = Invocation {
            program: PathBuf::from("/bin/sh"),
            args: vec!["-c".into(), "printf 'v25.05'".into()],
        };
        assert_eq!(ok.capture(None).unwrap(), "v25.05");

        let bad = Invocation {
            program: PathBuf::from("/bin/sh"),
            args: vec!["-c".into(), r"printf '\377\376'".into()],
        };
        assert!(matches!(bad.capture(None), Err(ProcessError::InvalidUtf8Output)));
    }

    #[cfg(unix)]
    #[test]
    fn test_runs_in_directory() {
        let dir = fixture_dir("cwd");
        let pwd = Invocation {
            program: PathBuf::from("/bin/sh"),
            args: vec!["-c".into(), "pwd -P".into()],
        };
        let output = pwd.capture(Some(&dir)).unwrap();
        assert_eq!(
            PathBuf::from(output.trim()),
            dir.canonicalize().unwrap()
        );
        std::fs::remove_dir_all(dir).unwrap();
    }
}
