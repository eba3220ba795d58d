use crate::git;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AmendError {
    #[error("number of commits to amend must be at least 1 (got {0})")]
    InvalidCount(i64),

    #[error("failed to run git rebase: {0}")]
    Spawn(#[source] std::io::Error),

    #[error(
        "interactive rebase exited with {0}; the repository may be left mid-rewrite, \
         run `git rebase --continue` or `git rebase --abort` to resolve"
    )]
    Interrupted(std::process::ExitStatus),
}

/// rewrite the last `num_commits` commits via an interactive rebase
///
/// a failed or interrupted rebase is surfaced to the operator, never
/// recovered automatically
pub fn amend_history(repo_path: &Path, num_commits: i64) -> Result<(), AmendError> {
    if num_commits < 1 {
        return Err(AmendError::InvalidCount(num_commits));
    }

    let status = git::rebase_interactive(repo_path, num_commits).map_err(AmendError::Spawn)?;
    if !status.success() {
        return Err(AmendError::Interrupted(status));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn zero_commits_fails_validation() {
        // validation runs before any rebase is attempted, so a bare temp
        // directory (not even a repository) must be left untouched
        let temp_dir = TempDir::new().unwrap();
        let result = amend_history(temp_dir.path(), 0);
        assert!(matches!(result, Err(AmendError::InvalidCount(0))));
    }

    #[test]
    fn negative_commits_fails_validation() {
        let temp_dir = TempDir::new().unwrap();
        let result = amend_history(temp_dir.path(), -3);
        assert!(matches!(result, Err(AmendError::InvalidCount(-3))));
    }
}
