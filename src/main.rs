mod amend;
mod changeset;
mod cli;
mod config;
mod constants;
mod executor;
mod git;
mod grouping;
mod message;
mod provider;
mod review;
mod ui;

use crate::changeset::{ChangeSet, Group};
use crate::cli::{Cli, Command};
use crate::config::Config;
use crate::provider::OpenAiClient;
use crate::review::{ReviewOutcome, TerminalReview};
use anyhow::{Result, bail};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;
use std::path::Path;

fn main() {
    if let Err(e) = run() {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse_args();
    match cli.command {
        Command::Commit { dry_run, config } => run_commit(config.as_deref(), dry_run),
        Command::Analyze { config } => run_analyze(config.as_deref()),
    }
}

fn run_commit(config_path: Option<&Path>, dry_run: bool) -> Result<()> {
    // sanity checks
    if !std::io::stdin().is_terminal()
        || !std::io::stdout().is_terminal()
        || !std::io::stderr().is_terminal()
    {
        bail!("interactive terminal required");
    }
    let config = config::load(config_path)?;
    git::sanity_check(Path::new("."))?;

    // collect the snapshot
    let changeset = match git::collect_unstaged(Path::new("."))? {
        Some(changeset) => changeset,
        None => bail!("no unstaged changes found"),
    };
    ui::display_changes(&changeset.changes);

    // grouping and message generation
    let groups = propose_groups(&config, &changeset)?;

    status!("proposed commits:");
    ui::display_groups(&groups);

    // interactive review and confirmation
    let records = match review::review(groups, &mut TerminalReview)? {
        ReviewOutcome::Confirmed(records) => records,
        ReviewOutcome::Aborted => {
            status!("commit process aborted");
            return Ok(());
        }
    };

    if dry_run {
        status!("dry run: no commits were created");
        return Ok(());
    }

    // apply commits in review order
    let total = records.len();
    let report = executor::execute(Path::new("."), &config.git, &records);
    for summary in &report.committed {
        status!("committed: {}", summary);
    }
    if report.failure.is_some() {
        warning!(
            "{} of {} commits were created before the failure",
            report.committed.len(),
            total
        );
    } else {
        status!("created {} commit(s)", report.committed.len());
    }

    // offer the history rewrite whenever something landed, even partially
    if !report.committed.is_empty() {
        maybe_amend(Path::new("."))?;
    }

    if let Some(failure) = report.failure {
        return Err(failure.into());
    }
    Ok(())
}

fn run_analyze(config_path: Option<&Path>) -> Result<()> {
    let config = config::load(config_path)?;
    git::sanity_check(Path::new("."))?;

    let changeset = match git::collect_unstaged(Path::new("."))? {
        Some(changeset) => changeset,
        None => bail!("no unstaged changes to analyze"),
    };
    ui::display_changes(&changeset.changes);

    let groups = propose_groups(&config, &changeset)?;

    status!("proposed commits:");
    ui::display_groups(&groups);
    Ok(())
}

/// run the provider-backed phases with a spinner, in deterministic order:
/// one grouping call, then one message call per group
fn propose_groups(config: &Config, changeset: &ChangeSet) -> Result<Vec<Group>> {
    let provider = OpenAiClient::new(&config.ai_provider)?;

    let progress = spinner("analyzing and grouping changes...");
    let result = grouping::group_changes(&provider, changeset, config);
    progress.finish_and_clear();
    let mut groups = result?;

    let progress = spinner("generating commit messages...");
    let result = message::generate_messages(&provider, &mut groups, config);
    progress.finish_and_clear();
    result?;

    Ok(groups)
}

fn spinner(label: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner} {msg}")
            .expect("invalid spinner template"),
    );
    spinner.set_message(label.to_owned());
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));
    spinner
}

/// ask whether to rewrite the commits just created, and how far back
fn maybe_amend(repo_path: &Path) -> Result<()> {
    info!();
    status!("amend the commit history?");
    if ui::prompt(&["No", "yes"])? != "y" {
        return Ok(());
    }

    loop {
        status!("how many commits back?");
        let input = ui::edit_one_line("1")?;
        if input.is_empty() {
            status!("skipping amend");
            return Ok(());
        }
        match input.parse::<i64>() {
            Ok(num_commits) => {
                amend::amend_history(repo_path, num_commits)?;
                status!("amended the last {} commit(s)", num_commits);
                return Ok(());
            }
            Err(_) => warning!("please enter a valid number"),
        }
    }
}
