use crate::changeset::CommitRecord;
use crate::config::GitIdentity;
use crate::git;
use git2::Repository;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecuteError {
    #[error("git identity is not configured: user_name and user_email are required")]
    MissingIdentity,

    #[error("failed to open git repository: {0}")]
    Open(#[source] git2::Error),

    #[error("failed to stage {path}: {source}")]
    Stage {
        path: String,
        #[source]
        source: git2::Error,
    },

    #[error("failed to write git index: {0}")]
    Index(#[source] git2::Error),

    #[error("failed to create commit: {0}")]
    Commit(#[source] git2::Error),
}

/// what the executor managed to do before finishing or failing
///
/// commits already created are never rolled back; a failure stops the run
/// and the report says which records made it
#[derive(Debug, Default)]
pub struct ExecutionReport {
    /// summary line of each commit created, in order
    pub committed: Vec<String>,
    pub failure: Option<ExecuteError>,
}

/// apply the finalized records, strictly in list order: stage exactly each
/// record's files, then create one commit under the configured identity
pub fn execute(
    repo_path: &Path,
    identity: &GitIdentity,
    records: &[CommitRecord],
) -> ExecutionReport {
    let mut report = ExecutionReport::default();

    // identity problems must surface before any staging happens
    if identity.user_name.trim().is_empty() || identity.user_email.trim().is_empty() {
        report.failure = Some(ExecuteError::MissingIdentity);
        return report;
    }

    let repo = match Repository::open(repo_path) {
        Ok(repo) => repo,
        Err(e) => {
            report.failure = Some(ExecuteError::Open(e));
            return report;
        }
    };

    for record in records {
        match apply_record(&repo, identity, record) {
            Ok(()) => report.committed.push(record.summary().to_string()),
            Err(e) => {
                report.failure = Some(e);
                break;
            }
        }
    }

    report
}

fn apply_record(
    repo: &Repository,
    identity: &GitIdentity,
    record: &CommitRecord,
) -> Result<(), ExecuteError> {
    let mut index = repo.index().map_err(ExecuteError::Index)?;
    for change in &record.files {
        git::stage_change(&mut index, change).map_err(|source| ExecuteError::Stage {
            path: change.path.clone(),
            source,
        })?;
    }
    index.write().map_err(ExecuteError::Index)?;

    git::commit_staged(repo, &record.message, identity).map_err(ExecuteError::Commit)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::changeset::{Change, ChangeKind};
    use std::fs;
    use tempfile::TempDir;

    fn setup_test_repo() -> (TempDir, Repository) {
        let temp_dir = TempDir::new().unwrap();
        let repo = Repository::init(temp_dir.path()).unwrap();
        let mut config = repo.config().unwrap();
        config.set_str("user.name", "Test User").unwrap();
        config.set_str("user.email", "test@example.com").unwrap();
        (temp_dir, repo)
    }

    fn identity() -> GitIdentity {
        GitIdentity {
            user_name: "Test User".to_string(),
            user_email: "test@example.com".to_string(),
        }
    }

    fn record(message: &str, paths: &[&str]) -> CommitRecord {
        CommitRecord {
            message: message.to_string(),
            files: paths
                .iter()
                .map(|path| Change::for_tests(path, ChangeKind::Added))
                .collect(),
        }
    }

    #[test]
    fn records_become_commits_in_order_each_staging_its_own_files() {
        let (temp_dir, repo) = setup_test_repo();
        fs::write(temp_dir.path().join("a.py"), "a").unwrap();
        fs::write(temp_dir.path().join("b.py"), "b").unwrap();

        let records = [
            record("feat: add x", &["a.py"]),
            record("fix: y", &["b.py"]),
        ];
        let report = execute(temp_dir.path(), &identity(), &records);

        assert!(report.failure.is_none());
        assert_eq!(report.committed, ["feat: add x", "fix: y"]);

        // HEAD is the second commit, its parent the first
        let head = repo.head().unwrap().peel_to_commit().unwrap();
        assert_eq!(head.message().unwrap(), "fix: y");
        let first = head.parent(0).unwrap();
        assert_eq!(first.message().unwrap(), "feat: add x");
        assert_eq!(first.parent_count(), 0);

        // the first commit staged only its own file
        let first_tree = first.tree().unwrap();
        assert!(first_tree.get_name("a.py").is_some());
        assert!(first_tree.get_name("b.py").is_none());
    }

    #[test]
    fn missing_identity_fails_before_any_staging() {
        let (temp_dir, repo) = setup_test_repo();
        fs::write(temp_dir.path().join("a.py"), "a").unwrap();

        let no_identity = GitIdentity {
            user_name: String::new(),
            user_email: String::new(),
        };
        let records = [record("feat: add x", &["a.py"])];
        let report = execute(temp_dir.path(), &no_identity, &records);

        assert!(matches!(report.failure, Some(ExecuteError::MissingIdentity)));
        assert!(report.committed.is_empty());
        assert!(repo.head().is_err(), "no commit should have been created");
    }

    #[test]
    fn partial_completion_is_reported_and_earlier_commits_survive() {
        let (temp_dir, repo) = setup_test_repo();
        fs::write(temp_dir.path().join("a.py"), "a").unwrap();
        // second record names a file that does not exist, staging will fail

        let records = [
            record("feat: add x", &["a.py"]),
            record("fix: y", &["missing.py"]),
        ];
        let report = execute(temp_dir.path(), &identity(), &records);

        assert_eq!(report.committed, ["feat: add x"]);
        assert!(
            matches!(report.failure, Some(ExecuteError::Stage { ref path, .. }) if path == "missing.py")
        );

        // the first commit is intact
        let head = repo.head().unwrap().peel_to_commit().unwrap();
        assert_eq!(head.message().unwrap(), "feat: add x");
    }

    #[test]
    fn empty_record_list_is_a_no_op() {
        let (temp_dir, repo) = setup_test_repo();
        let report = execute(temp_dir.path(), &identity(), &[]);

        assert!(report.failure.is_none());
        assert!(report.committed.is_empty());
        assert!(repo.head().is_err());
    }
}
