use crate::changeset::Group;
use crate::config::Config;
use crate::provider::{ChatMessage, Provider};
use anyhow::{Result, bail};
use std::fmt::Write;

/// draft one commit message per group, in order
///
/// the provider is asked for the final message text in the configured format
/// directly; nothing is substituted into a template afterwards
pub fn generate_messages(
    provider: &dyn Provider,
    groups: &mut [Group],
    config: &Config,
) -> Result<()> {
    let temperature = config.commit_style.temperature;
    for group in groups.iter_mut() {
        let messages = [
            ChatMessage::system("You are an assistant that writes git commit messages."),
            ChatMessage::user(message_prompt(group, config)),
        ];
        let response = provider.send(&messages, temperature)?;
        let text = response.trim();
        if text.is_empty() {
            bail!(
                "provider returned an empty commit message for a group of {} file(s)",
                group.changes.len()
            );
        }
        group.message = Some(text.to_string());
    }
    Ok(())
}

fn message_prompt(group: &Group, config: &Config) -> String {
    let style = &config.commit_style;
    let mut prompt =
        String::from("Write a commit message for the following git changes.\n\nChanges:\n");
    for change in &group.changes {
        let _ = writeln!(prompt, "{}: {}", change.kind.label(), change.path);
    }

    prompt.push('\n');
    if style.format.eq_ignore_ascii_case("conventional") {
        prompt.push_str(
            "Format: conventional commit, `<prefix>: <summary>` with a lowercase summary.\n",
        );
        if !style.conventional_prefixes.is_empty() {
            prompt.push_str("Choose the most fitting prefix:\n");
            for (prefix, description) in &style.conventional_prefixes {
                let _ = writeln!(prompt, "- {prefix}: {description}");
            }
        }
    } else {
        let _ = writeln!(prompt, "Format: {}.", style.format);
    }

    if !config.custom_instructions.user_feedback.is_empty() {
        let _ = writeln!(
            prompt,
            "\nAdditional instructions: {}",
            config.custom_instructions.user_feedback
        );
    }

    prompt.push_str("\nRespond with the commit message text only, no surrounding quotes or code fences.");
    prompt
}
