use crate::changeset::{CommitRecord, Group};
use crate::ui;
use crate::{info, status, warning};
use anyhow::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Accept,
    Edit,
    Skip,
}

#[derive(Debug)]
pub enum ReviewOutcome {
    Confirmed(Vec<CommitRecord>),
    Aborted,
}

/// decision source for the review walk, separated from the terminal so the
/// state machine is testable
pub trait ReviewPrompt {
    fn decide(&mut self, index: usize, total: usize, group: &Group) -> Result<Decision>;
    fn edit_message(&mut self, current: &str) -> Result<String>;
    fn confirm(&mut self, groups: &[Group]) -> Result<bool>;
}

/// walk proposed groups in presentation order, applying operator decisions,
/// then gate the whole finalized list behind one confirmation
///
/// review never reorders groups; `skip` removes a group entirely, and a `no`
/// at the confirmation aborts the run with zero side effects
pub fn review(groups: Vec<Group>, prompt: &mut dyn ReviewPrompt) -> Result<ReviewOutcome> {
    let total = groups.len();
    let mut reviewed: Vec<Group> = Vec::with_capacity(total);

    for (position, mut group) in groups.into_iter().enumerate() {
        let decision = loop {
            match prompt.decide(position + 1, total, &group)? {
                Decision::Edit => {
                    let replacement = prompt.edit_message(group.message.as_deref().unwrap_or(""))?;
                    let replacement = replacement.trim();
                    if replacement.is_empty() {
                        warning!("replacement message is empty, not applied");
                        continue;
                    }
                    group.message = Some(replacement.to_string());
                    break Decision::Edit;
                }
                decision => break decision,
            }
        };
        if decision != Decision::Skip {
            reviewed.push(group);
        }
    }

    if reviewed.is_empty() {
        return Ok(ReviewOutcome::Aborted);
    }
    if !prompt.confirm(&reviewed)? {
        return Ok(ReviewOutcome::Aborted);
    }

    let records = reviewed
        .into_iter()
        .map(Group::into_record)
        .collect::<Result<Vec<_>>>()?;
    Ok(ReviewOutcome::Confirmed(records))
}

/// terminal-backed review prompt
pub struct TerminalReview;

impl ReviewPrompt for TerminalReview {
    fn decide(&mut self, index: usize, total: usize, group: &Group) -> Result<Decision> {
        info!();
        status!("commit {}/{}", index, total);
        ui::display_group(group);
        let choice = ui::prompt(&["Accept", "edit", "skip"])?;
        Ok(match choice.as_str() {
            "e" => Decision::Edit,
            "s" => Decision::Skip,
            _ => Decision::Accept,
        })
    }

    fn edit_message(&mut self, current: &str) -> Result<String> {
        if current.contains('\n') {
            ui::edit_multi_line(current)
        } else {
            ui::edit_one_line(current)
        }
    }

    fn confirm(&mut self, groups: &[Group]) -> Result<bool> {
        info!();
        status!("final commits:");
        ui::display_groups(groups);
        info!();
        status!("proceed with these commits?");
        Ok(ui::prompt(&["Yes", "no"])? == "y")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::changeset::{Change, ChangeKind};
    use std::collections::VecDeque;

    struct Scripted {
        decisions: VecDeque<Decision>,
        edits: VecDeque<&'static str>,
        confirm_answer: bool,
        confirmed_with: Option<usize>,
    }

    impl Scripted {
        fn new(decisions: &[Decision], edits: &[&'static str], confirm_answer: bool) -> Self {
            Self {
                decisions: decisions.iter().copied().collect(),
                edits: edits.iter().copied().collect(),
                confirm_answer,
                confirmed_with: None,
            }
        }
    }

    impl ReviewPrompt for Scripted {
        fn decide(&mut self, _index: usize, _total: usize, _group: &Group) -> Result<Decision> {
            Ok(self.decisions.pop_front().expect("unexpected decide call"))
        }

        fn edit_message(&mut self, _current: &str) -> Result<String> {
            Ok(self.edits.pop_front().expect("unexpected edit call").to_string())
        }

        fn confirm(&mut self, groups: &[Group]) -> Result<bool> {
            self.confirmed_with = Some(groups.len());
            Ok(self.confirm_answer)
        }
    }

    fn group(paths: &[&str], message: &str) -> Group {
        let mut group = Group::new(
            paths
                .iter()
                .map(|path| Change::for_tests(path, ChangeKind::Modified))
                .collect(),
        );
        group.message = Some(message.to_string());
        group
    }

    #[test]
    fn accept_finalizes_groups_unchanged() {
        let groups = vec![group(&["a.rs"], "feat: a"), group(&["b.rs"], "fix: b")];
        let mut prompt = Scripted::new(&[Decision::Accept, Decision::Accept], &[], true);

        let ReviewOutcome::Confirmed(records) = review(groups, &mut prompt).unwrap() else {
            panic!("expected confirmation");
        };

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].message, "feat: a");
        assert_eq!(records[1].message, "fix: b");
    }

    #[test]
    fn skip_removes_only_the_skipped_group() {
        let groups = vec![
            group(&["a.rs"], "feat: a"),
            group(&["b.rs"], "fix: b"),
            group(&["c.rs"], "docs: c"),
        ];
        let mut prompt = Scripted::new(
            &[Decision::Accept, Decision::Skip, Decision::Accept],
            &[],
            true,
        );

        let ReviewOutcome::Confirmed(records) = review(groups, &mut prompt).unwrap() else {
            panic!("expected confirmation");
        };

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].message, "feat: a");
        assert_eq!(records[0].files[0].path, "a.rs");
        assert_eq!(records[1].message, "docs: c");
        assert_eq!(records[1].files[0].path, "c.rs");
    }

    #[test]
    fn edit_replaces_the_message() {
        let groups = vec![group(&["a.rs"], "feat: a")];
        let mut prompt = Scripted::new(&[Decision::Edit], &["feat: a better message"], true);

        let ReviewOutcome::Confirmed(records) = review(groups, &mut prompt).unwrap() else {
            panic!("expected confirmation");
        };

        assert_eq!(records[0].message, "feat: a better message");
        assert_eq!(records[0].files[0].path, "a.rs");
    }

    #[test]
    fn empty_replacement_reprompts_the_same_group() {
        let groups = vec![group(&["a.rs"], "feat: a")];
        let mut prompt = Scripted::new(&[Decision::Edit, Decision::Accept], &["   "], true);

        let ReviewOutcome::Confirmed(records) = review(groups, &mut prompt).unwrap() else {
            panic!("expected confirmation");
        };

        // the empty edit was discarded and the original message kept
        assert_eq!(records[0].message, "feat: a");
        assert!(prompt.decisions.is_empty());
    }

    #[test]
    fn declined_confirmation_aborts() {
        let groups = vec![group(&["a.rs"], "feat: a")];
        let mut prompt = Scripted::new(&[Decision::Accept], &[], false);

        assert!(matches!(
            review(groups, &mut prompt).unwrap(),
            ReviewOutcome::Aborted
        ));
        assert_eq!(prompt.confirmed_with, Some(1));
    }

    #[test]
    fn skipping_everything_aborts_without_confirmation() {
        let groups = vec![group(&["a.rs"], "feat: a")];
        let mut prompt = Scripted::new(&[Decision::Skip], &[], true);

        assert!(matches!(
            review(groups, &mut prompt).unwrap(),
            ReviewOutcome::Aborted
        ));
        assert_eq!(prompt.confirmed_with, None);
    }
}
