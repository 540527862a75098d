//! `openusd update`: move a checkout of OpenUSD to another version.

use std::path::PathBuf;

use crate::error::ProcessError;
use crate::runner::{Invocation, Tool};

/// Where to update and to which version.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateRequest {
    /// Tag or branch to check out; `None` fast-forwards the current branch
    pub usd_version: Option<String>,
    /// Package directory, the working directory when `None`
    pub directory: Option<PathBuf>,
}

impl UpdateRequest {
    /// Git arguments for each step, in order.
    pub fn steps(&self) -> Vec<Vec<String>> {
        match &self.usd_version {
            Some(version) => vec![
                vec!["fetch".to_string(), "--tags".to_string()],
                vec!["checkout".to_string(), version.clone()],
            ],
            None => vec![vec!["pull".to_string(), "--ff-only".to_string()]],
        }
    }

    /// Run every step, stopping at the first failure.
    pub fn run(&self) -> Result<(), ProcessError> {
        let git = Tool::Git.locate();
        for args in self.steps() {
            let invocation = Invocation::resolve(Tool::Git, git.clone(), args);
            invocation.run(self.directory.as_deref())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_steps_with_version() {
        let request = UpdateRequest {
            usd_version: Some("v25.05".to_string()),
            directory: None,
        };
        assert_eq!(
            request.steps(),
            vec![vec!["fetch", "--tags"], vec!["checkout", "v25.05"]]
        );
    }

    #[test]
    fn test_steps_without_version() {
        assert_eq!(UpdateRequest::default().steps(), vec![vec!["pull", "--ff-only"]]);
    }
}
