use anyhow::{Result, bail};

/// kind of a single file-level modification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Modified,
    Deleted,
    Renamed,
    Copied,
}

impl ChangeKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Added => "Added",
            Self::Modified => "Modified",
            Self::Deleted => "Deleted",
            Self::Renamed => "Renamed",
            Self::Copied => "Copied",
        }
    }

    pub fn letter(self) -> char {
        match self {
            Self::Added => 'A',
            Self::Modified => 'M',
            Self::Deleted => 'D',
            Self::Renamed => 'R',
            Self::Copied => 'C',
        }
    }
}

/// one file change captured from the working tree
///
/// immutable once collected; groups reference these by value
#[derive(Debug, Clone)]
pub struct Change {
    pub path: String,
    pub kind: ChangeKind,
    pub old_path: Option<String>, // set for renames and copies
    pub diff: Option<String>,     // omitted for binary, lock and minified files
}

#[cfg(test)]
impl Change {
    pub(crate) fn for_tests(path: &str, kind: ChangeKind) -> Self {
        Self {
            path: path.to_string(),
            kind,
            old_path: None,
            diff: None,
        }
    }
}

/// the snapshot of unstaged changes for one run
#[derive(Debug)]
pub struct ChangeSet {
    pub changes: Vec<Change>,
}

impl ChangeSet {
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.changes.iter().any(|change| change.path == path)
    }
}

/// an ordered set of changes proposed for one commit
#[derive(Debug, Clone)]
pub struct Group {
    pub changes: Vec<Change>,
    pub message: Option<String>,
}

impl Group {
    pub fn new(changes: Vec<Change>) -> Self {
        Self {
            changes,
            message: None,
        }
    }

    /// flatten a reviewed group into a record ready for execution
    ///
    /// a group must have a non-empty message and at least one file by the
    /// time it reaches the executor
    pub fn into_record(self) -> Result<CommitRecord> {
        let message = match self.message {
            Some(message) if !message.trim().is_empty() => message,
            _ => bail!("commit group has no message"),
        };
        if self.changes.is_empty() {
            bail!("commit group has no files");
        }
        Ok(CommitRecord {
            message,
            files: self.changes,
        })
    }
}

/// finalized message and files ready to be committed
#[derive(Debug, Clone)]
pub struct CommitRecord {
    pub message: String,
    pub files: Vec<Change>,
}

impl CommitRecord {
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn into_record_requires_a_message() {
        let group = Group::new(vec![Change::for_tests("a.rs", ChangeKind::Modified)]);
        assert!(group.into_record().is_err());

        let mut group = Group::new(vec![Change::for_tests("a.rs", ChangeKind::Modified)]);
        group.message = Some("   ".to_string());
        assert!(group.into_record().is_err());
    }

    #[test]
    fn into_record_requires_files() {
        let mut group = Group::new(Vec::new());
        group.message = Some("fix: something".to_string());
        assert!(group.into_record().is_err());
    }

    #[test]
    fn record_summary_is_the_first_line() {
        let mut group = Group::new(vec![Change::for_tests("a.rs", ChangeKind::Added)]);
        group.message = Some("feat: add a\n\nlonger body".to_string());
        let record = group.into_record().unwrap();
        assert_eq!(record.summary(), "feat: add a");
    }
}
