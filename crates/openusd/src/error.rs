use std::io;

use thiserror::Error;

/// Why a helper process did not complete successfully.
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Executable not found: {0}")]
    NotFound(String),

    #[error("The process failed to run: {0}")]
    FailedToRun(#[source] io::Error),

    #[error("The process returned a non-zero exit status ({0})")]
    NonZeroExitStatus(i32),

    #[error("The process was terminated by signal {0}")]
    Terminated(i32),

    #[error("Command output was not valid utf-8 data")]
    InvalidUtf8Output,
}

impl ProcessError {
    /// How the process ended and its status, for processes that ran.
    pub fn termination(&self) -> Option<(&'static str, i32)> {
        match self {
            ProcessError::NonZeroExitStatus(code) => Some(("exit", *code)),
            ProcessError::Terminated(signal) => Some(("signal", *signal)),
            _ => None,
        }
    }

    /// Status to exit with: the child's own exit code, `128 + signal` for a
    /// signalled child, 1 otherwise.
    pub fn exit_code(&self) -> u8 {
        let code = match self {
            ProcessError::NonZeroExitStatus(code) => *code,
            ProcessError::Terminated(signal) => 128 + signal,
            _ => 1,
        };
        u8::try_from(code).ok().filter(|c| *c != 0).unwrap_or(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_termination() {
        assert_eq!(ProcessError::NonZeroExitStatus(3).termination(), Some(("exit", 3)));
        assert_eq!(ProcessError::Terminated(9).termination(), Some(("signal", 9)));
        assert_eq!(ProcessError::InvalidUtf8Output.termination(), None);
    }

    #[test]
    fn test_exit_code_follows_child() {
        assert_eq!(ProcessError::NonZeroExitStatus(3).exit_code(), 3);
        assert_eq!(ProcessError::NonZeroExitStatus(255).exit_code(), 255);
        assert_eq!(ProcessError::Terminated(9).exit_code(), 137);
        assert_eq!(ProcessError::NonZeroExitStatus(-1).exit_code(), 1);
        assert_eq!(ProcessError::NonZeroExitStatus(256).exit_code(), 1);
        assert_eq!(ProcessError::NotFound("git".into()).exit_code(), 1);
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            ProcessError::NonZeroExitStatus(128).to_string(),
            "The process returned a non-zero exit status (128)"
        );
        assert_eq!(
            ProcessError::NotFound("git".into()).to_string(),
            "Executable not found: git"
        );
    }
}
