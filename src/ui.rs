use crate::changeset::{Change, ChangeKind, Group};
use crate::constants::MAX_FILES_TO_SHOW;
use anyhow::{Context, Result};
use colored::ColoredString;
use num_format::{Locale, ToFormattedString};

#[macro_export]
macro_rules! warning {
    // format string literal (with or without inline formatting)
    ($fmt:literal $(, $($arg:tt)*)?) => {{
        use colored::Colorize;
        use std::io::{self, Write};
        let _ = writeln!(io::stderr(), "{}", format!($fmt $(, $($arg)*)?).yellow());
    }};
    // arbitrary expression (non-literal)
    ($expr:expr) => {{
        use colored::Colorize;
        use std::io::{self, Write};
        let _ = writeln!(io::stderr(), "{}", format!("{}", $expr).yellow());
    }};
}

#[macro_export]
macro_rules! error {
    ($fmt:literal $(, $($arg:tt)*)?) => {{
        use colored::Colorize;
        use std::io::{self, Write};
        let _ = writeln!(io::stderr(), "{}", format!($fmt $(, $($arg)*)?).red());
    }};
    ($expr:expr) => {{
        use colored::Colorize;
        use std::io::{self, Write};
        let _ = writeln!(io::stderr(), "{}", format!("{}", $expr).red());
    }};
}

#[macro_export]
macro_rules! status {
    ($fmt:literal $(, $($arg:tt)*)?) => {{
        use colored::Colorize;
        use std::io::{self, Write};
        let _ = writeln!(io::stdout(), "{}", format!($fmt $(, $($arg)*)?).green());
    }};
    ($expr:expr) => {{
        use colored::Colorize;
        use std::io::{self, Write};
        let _ = writeln!(io::stdout(), "{}", format!("{}", $expr).green());
    }};
}

#[macro_export]
macro_rules! info {
    () => {{
        use std::io::{self, Write};
        let _ = writeln!(io::stdout());
    }};
    ($fmt:literal $(, $($arg:tt)*)?) => {{
        use std::io::{self, Write};
        let _ = writeln!(io::stdout(), $fmt $(, $($arg)*)?);
    }};
    ($expr:expr) => {{
        use std::io::{self, Write};
        let _ = writeln!(io::stdout(), "{}", $expr);
    }};
}

/// single-key prompt like "[A]ccept/[e]dit/[s]kip ?"; enter picks the first
/// option, esc and ctrl-c exit
pub fn prompt(options: &[&str]) -> Result<String> {
    use crossterm::{
        event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
        terminal::{disable_raw_mode, enable_raw_mode},
    };
    use std::io::{self, Write};

    debug_assert!(!options.is_empty(), "prompt requires at least one option");

    let prompt_parts: Vec<String> = options
        .iter()
        .map(|opt| {
            let first = opt
                .chars()
                .next()
                .expect("option should have at least one character");
            let rest = &opt[first.len_utf8()..];
            format!("[{first}]{rest}")
        })
        .collect();

    let valid_chars: Vec<char> = options
        .iter()
        .map(|opt| {
            opt.chars()
                .next()
                .expect("option should have at least one character")
                .to_lowercase()
                .next()
                .expect("lowercase should produce at least one character")
        })
        .collect();

    print!("{} ? ", prompt_parts.join("/"));
    let _ = io::stdout().flush();

    enable_raw_mode().context("this command requires an interactive terminal")?;

    loop {
        if let Ok(Event::Key(KeyEvent {
            code, modifiers, ..
        })) = event::read()
        {
            match code {
                KeyCode::Esc => {
                    disable_raw_mode().ok();
                    info!("^C");
                    std::process::exit(1);
                }
                KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                    disable_raw_mode().ok();
                    info!("^C");
                    std::process::exit(1);
                }
                KeyCode::Enter => {
                    let ch = valid_chars[0];
                    disable_raw_mode().ok();
                    info!(options[0]);
                    break Ok(ch.to_string());
                }
                KeyCode::Char(c) => {
                    let lower = c
                        .to_lowercase()
                        .next()
                        .expect("lowercase should produce at least one character");
                    if let Some(idx) = valid_chars.iter().position(|&ch| ch == lower) {
                        disable_raw_mode().ok();
                        info!(options[idx]);
                        break Ok(lower.to_string());
                    }
                }
                _ => {}
            }
        }
    }
}

/// edit a single line in place, pre-filled with the current text
pub fn edit_one_line(line: &str) -> Result<String> {
    use rustyline::DefaultEditor;

    let mut editor = DefaultEditor::new().context("failed to initialise line editor")?;

    if let Ok(edited) = editor.readline_with_initial("? ", (line, "")) {
        Ok(edited.trim().to_string())
    } else {
        info!("^C");
        std::process::exit(1);
    }
}

/// edit multi-line text via $EDITOR, returning the trimmed result
pub fn edit_multi_line(text: &str) -> Result<String> {
    use std::env;
    use std::fs;
    use std::io::Write;
    use std::process::Command;
    use tempfile::Builder;

    let editor = env::var("EDITOR").context("EDITOR not set")?;

    let mut temp_file = Builder::new()
        .suffix(".tmp")
        .tempfile()
        .context("failed to create temporary file")?;
    temp_file
        .write_all(text.as_bytes())
        .context("failed to write to temporary file")?;
    temp_file.flush().context("failed to flush temporary file")?;
    let temp_path = temp_file.path().to_owned();

    // run the editor via shell to properly handle arguments in EDITOR
    let editor_command = format!(
        "{} {}",
        editor,
        shlex::try_quote(&temp_path.to_string_lossy()).expect("path quoting should not fail")
    );
    let command_status = Command::new("sh")
        .arg("-c")
        .arg(&editor_command)
        .status()
        .with_context(|| format!("failed to run editor: {editor}"))?;
    if !command_status.success() {
        anyhow::bail!("editor exited with {command_status}");
    }

    let edited = fs::read_to_string(&temp_path)
        .unwrap_or_default()
        .trim()
        .to_string();
    Ok(edited)
}

fn kind_tag(kind: ChangeKind) -> ColoredString {
    use colored::Colorize;
    match kind {
        ChangeKind::Added => "A".green(),
        ChangeKind::Modified => "M".yellow(),
        ChangeKind::Deleted => "D".red(),
        ChangeKind::Renamed => "R".cyan(),
        ChangeKind::Copied => "C".cyan(),
    }
}

fn display_change(change: &Change, indent: &str) {
    if let Some(old_path) = &change.old_path {
        info!(
            "{}{} {} → {}",
            indent,
            kind_tag(change.kind),
            old_path,
            change.path
        );
    } else {
        info!("{}{} {}", indent, kind_tag(change.kind), change.path);
    }
}

/// list the snapshot, capped at a display limit
pub fn display_changes(changes: &[Change]) {
    let file_word = if changes.len() == 1 { "file" } else { "files" };
    status!("unstaged changes ({} {}):", changes.len(), file_word);

    for change in changes.iter().take(MAX_FILES_TO_SHOW) {
        display_change(change, "");
    }
    if changes.len() > MAX_FILES_TO_SHOW {
        info!("(+{} more)", changes.len() - MAX_FILES_TO_SHOW);
    }
    info!();
}

/// show one proposed commit: its message followed by its files
pub fn display_group(group: &Group) {
    info!();
    match &group.message {
        Some(message) => {
            for line in message.lines() {
                info!(line);
            }
        }
        None => warning!("(no message generated)"),
    }
    info!();
    for change in &group.changes {
        display_change(change, "  ");
    }
}

/// count of added/removed lines across a group's captured diff text
fn changed_line_count(group: &Group) -> usize {
    group
        .changes
        .iter()
        .filter_map(|change| change.diff.as_deref())
        .map(|diff| {
            diff.lines()
                .filter(|line| {
                    (line.starts_with('+') && !line.starts_with("+++"))
                        || (line.starts_with('-') && !line.starts_with("---"))
                })
                .count()
        })
        .sum()
}

/// summarise the proposed commits, one numbered entry per group
pub fn display_groups(groups: &[Group]) {
    for (idx, group) in groups.iter().enumerate() {
        let files = group.changes.len();
        let file_word = if files == 1 { "file" } else { "files" };
        let changed = changed_line_count(group).to_formatted_string(&Locale::en);
        info!(
            "{}. {} ({} {}, {} changed lines)",
            idx + 1,
            group
                .message
                .as_deref()
                .and_then(|m| m.lines().next())
                .unwrap_or("(no message)"),
            files,
            file_word,
            changed
        );
        for change in &group.changes {
            display_change(change, "   ");
        }
    }
}
