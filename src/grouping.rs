use crate::changeset::{Change, ChangeSet, Group};
use crate::config::Config;
use crate::provider::{ChatMessage, Provider, ProviderError};
use crate::warning;
use std::collections::HashSet;
use std::fmt::Write;

/// partition the change snapshot into commit groups using one provider call
///
/// any response that is not a strict partition of the snapshot degrades to a
/// single group holding every change in snapshot order; provider errors
/// propagate
pub fn group_changes(
    provider: &dyn Provider,
    changeset: &ChangeSet,
    config: &Config,
) -> Result<Vec<Group>, ProviderError> {
    let messages = [
        ChatMessage::system("You are an assistant that organises git changes into commits."),
        ChatMessage::user(grouping_prompt(changeset, config)),
    ];
    let response = provider.send(&messages, config.commit_style.temperature)?;

    let mut groups = match parse_groups(&response, changeset) {
        Some(groups) => groups,
        None => {
            warning!("could not parse the grouping response, falling back to a single commit");
            vec![Group::new(changeset.changes.clone())]
        }
    };

    split_oversized(&mut groups, config.grouping.max_files_per_commit);
    Ok(groups)
}

fn grouping_prompt(changeset: &ChangeSet, config: &Config) -> String {
    let mut prompt =
        String::from("Group the following git changes into logically coherent commits.\n\nChanges:\n");
    for change in &changeset.changes {
        let _ = writeln!(prompt, "{}: {}", change.kind.label(), change.path);
    }

    prompt.push_str("\nRules:\n");
    let _ = writeln!(
        prompt,
        "- at most {} files per commit",
        config.grouping.max_files_per_commit
    );
    if config.grouping.combine_similar_changes {
        prompt.push_str("- combine changes of a similar kind into the same commit where sensible\n");
    }
    if !config.custom_instructions.grouping.is_empty() {
        let _ = writeln!(prompt, "- {}", config.custom_instructions.grouping);
    }

    prompt.push_str(
        "\nRespond with a JSON array of arrays, where each inner array lists the file paths \
         for one commit. Every path must appear in exactly one group. Output the JSON only, \
         with no commentary.",
    );
    prompt
}

/// strict structural parse of the provider response
///
/// returns None unless the response is a JSON array of arrays of paths that
/// forms an exact partition of the snapshot; provider text is never evaluated,
/// only parsed
fn parse_groups(response: &str, changeset: &ChangeSet) -> Option<Vec<Group>> {
    let parsed: Vec<Vec<String>> = serde_json::from_str(strip_code_fence(response)).ok()?;

    let mut seen = HashSet::new();
    for path in parsed.iter().flatten() {
        if !changeset.contains(path) || !seen.insert(path.as_str()) {
            return None;
        }
    }
    if seen.len() != changeset.len() {
        return None;
    }

    let groups: Vec<Group> = parsed
        .iter()
        .map(|paths| {
            let members: Vec<Change> = changeset
                .changes
                .iter()
                .filter(|change| paths.iter().any(|path| *path == change.path))
                .cloned()
                .collect();
            Group::new(members)
        })
        .filter(|group| !group.changes.is_empty())
        .collect();

    Some(groups)
}

/// drop a surrounding markdown code fence, which some models add despite
/// being told not to
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    if let Some(start) = trimmed.find("```")
        && let Some(end) = trimmed[start + 3..].rfind("```")
    {
        let inner = &trimmed[start + 3..start + 3 + end];
        return inner.strip_prefix("json").unwrap_or(inner).trim();
    }
    trimmed
}

/// split groups that exceed the configured size into consecutive chunks,
/// preserving order, rather than trusting the provider to honor the limit
fn split_oversized(groups: &mut Vec<Group>, max_files: usize) {
    if groups.iter().all(|group| group.changes.len() <= max_files) {
        return;
    }
    let mut split = Vec::with_capacity(groups.len());
    for group in groups.drain(..) {
        if group.changes.len() <= max_files {
            split.push(group);
        } else {
            for chunk in group.changes.chunks(max_files) {
                split.push(Group::new(chunk.to_vec()));
            }
        }
    }
    *groups = split;
}
