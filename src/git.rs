use crate::changeset::{Change, ChangeKind, ChangeSet};
use crate::config::GitIdentity;
use anyhow::{Context, Result, anyhow, bail};
use git2::{Delta, DiffFindOptions, DiffOptions, Repository, RepositoryState, Signature};
use std::path::Path;

/// sanity check that we're in a git repository and in a good state
pub fn sanity_check(repo_path: &Path) -> Result<()> {
    let repo =
        Repository::discover(repo_path).map_err(|e| anyhow!("not in a git repository: {e}"))?;

    if repo.state() != RepositoryState::Clean {
        bail!("repository is in the middle of an operation (merge, rebase, etc)");
    }
    if repo.head_detached().unwrap_or(false) {
        bail!("repository is in detached HEAD state");
    }
    Ok(())
}

/// snapshot the unstaged changes (including untracked files)
/// returns None if the working tree is clean
pub fn collect_unstaged(repo_path: &Path) -> Result<Option<ChangeSet>> {
    let repo = Repository::open(repo_path).context("failed to open git repository")?;

    let mut opts = DiffOptions::new();
    opts.include_untracked(true);
    opts.recurse_untracked_dirs(true);
    opts.show_untracked_content(true);
    let mut diff = repo
        .diff_index_to_workdir(None, Some(&mut opts))
        .context("failed to diff the working tree")?;

    // enable rename and copy detection, including against untracked files
    let mut find_opts = DiffFindOptions::new();
    find_opts.renames(true);
    find_opts.copies(true);
    find_opts.for_untracked(true);
    find_opts.rename_threshold(50); // 50% similarity (git default)
    find_opts.copy_threshold(50);
    diff.find_similar(Some(&mut find_opts))
        .context("failed to detect renames")?;

    let changes = changes_from_diff(&diff);
    if changes.is_empty() {
        return Ok(None);
    }
    Ok(Some(ChangeSet { changes }))
}

fn changes_from_diff(diff: &git2::Diff) -> Vec<Change> {
    let mut changes = Vec::new();

    for (idx, delta) in diff.deltas().enumerate() {
        let kind = match delta.status() {
            Delta::Added | Delta::Untracked => ChangeKind::Added,
            Delta::Modified | Delta::Typechange => ChangeKind::Modified,
            Delta::Deleted => ChangeKind::Deleted,
            Delta::Renamed => ChangeKind::Renamed,
            Delta::Copied => ChangeKind::Copied,
            _ => continue, // skip ignored, unmodified, etc.
        };

        let (path, old_path) = match kind {
            ChangeKind::Deleted => (delta.old_file().path(), None),
            ChangeKind::Renamed | ChangeKind::Copied => (
                delta.new_file().path(),
                delta
                    .old_file()
                    .path()
                    .map(|p| p.to_string_lossy().into_owned()),
            ),
            _ => (delta.new_file().path(), None),
        };
        let Some(path) = path else { continue };
        let path = path.to_string_lossy().into_owned();

        let is_binary = delta.new_file().is_binary() || delta.old_file().is_binary();
        let diff_text = if is_binary || should_ignore_diff(&path) {
            None
        } else {
            patch_text(diff, idx)
        };

        changes.push(Change {
            path,
            kind,
            old_path,
            diff: diff_text,
        });
    }

    changes
}

fn patch_text(diff: &git2::Diff, idx: usize) -> Option<String> {
    let mut patch = git2::Patch::from_diff(diff, idx).ok()??;
    if patch.delta().new_file().is_binary() || patch.delta().old_file().is_binary() {
        return None;
    }
    let buf = patch.to_buf().ok()?;
    buf.as_str().map(str::to_owned)
}

/// check if the file's diff text should be left out (lock files, minified
/// files, etc. add noise without signal)
fn should_ignore_diff(path: &str) -> bool {
    let path_lower = path.to_lowercase();

    if path_lower.ends_with("-lock.json") || path_lower.ends_with("-lock.yaml") {
        return true;
    }
    if let Some(ext) = Path::new(path).extension()
        && ext.to_string_lossy().to_lowercase() == "lock"
    {
        return true;
    }
    if path_lower.ends_with(".min.js")
        || path_lower.ends_with(".min.css")
        || path_lower.ends_with("-min.js")
        || path_lower.ends_with("-min.css")
    {
        return true;
    }

    false
}

/// stage one change into the index according to its kind
///
/// the caller writes the index once all of a record's changes are staged
pub fn stage_change(index: &mut git2::Index, change: &Change) -> Result<(), git2::Error> {
    match change.kind {
        ChangeKind::Deleted => index.remove_path(Path::new(&change.path)),
        ChangeKind::Renamed => {
            if let Some(old_path) = &change.old_path {
                index.remove_path(Path::new(old_path))?;
            }
            index.add_path(Path::new(&change.path))
        }
        ChangeKind::Added | ChangeKind::Modified | ChangeKind::Copied => {
            index.add_path(Path::new(&change.path))
        }
    }
}

/// commit whatever is currently staged, under the given identity
pub fn commit_staged(
    repo: &Repository,
    message: &str,
    identity: &GitIdentity,
) -> Result<git2::Oid, git2::Error> {
    let signature = Signature::now(&identity.user_name, &identity.user_email)?;
    let mut index = repo.index()?;
    let tree_id = index.write_tree()?;
    let tree = repo.find_tree(tree_id)?;

    // handle unborn branch (no commits yet)
    let parent = repo.head().ok().and_then(|head| head.peel_to_commit().ok());
    let parents: Vec<&git2::Commit> = parent.iter().collect();

    repo.commit(
        Some("HEAD"),
        &signature,
        &signature,
        message,
        &tree,
        &parents,
    )
}

/// run an interactive rebase over the last `num_commits` commits
///
/// uses the git binary with inherited stdio: the rebase is an interactive,
/// potentially multi-step session in the operator's editor
pub fn rebase_interactive(
    repo_path: &Path,
    num_commits: i64,
) -> std::io::Result<std::process::ExitStatus> {
    std::process::Command::new("git")
        .arg("rebase")
        .arg("-i")
        .arg(format!("HEAD~{num_commits}"))
        .current_dir(repo_path)
        .status()
}
