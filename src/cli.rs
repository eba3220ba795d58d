use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// ai-git-commit: split working tree changes into AI-drafted, reviewed commits
#[derive(Parser, Debug)]
#[command(
    name = "ai-git-commit",
    about,
    long_about = None,
    disable_version_flag = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// split unstaged changes into commits with AI-generated messages
    Commit {
        /// preview the proposed commits without applying them
        #[arg(long)]
        dry_run: bool,

        /// path to the configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// analyze unstaged changes and display the proposed commits
    Analyze {
        /// path to the configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
