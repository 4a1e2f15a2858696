//! CLI definitions using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod commands;

/// ncli - export personal data services to Markdown
#[derive(Parser, Debug)]
#[command(name = "ncli", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file path (default: ~/.ncli/config.toml)
    #[arg(long, global = true, env = "NCLI_CONFIG")]
    pub config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Audible library annotations
    Audible {
        #[command(subcommand)]
        command: AudibleCommands,
    },

    /// Kindle notebook highlights and notes
    Kindle {
        #[command(subcommand)]
        command: KindleCommands,
    },

    /// Notion workspace export archives
    Notion {
        #[command(subcommand)]
        command: NotionCommands,
    },

    /// YouTube video transcripts
    Youtube {
        #[command(subcommand)]
        command: YoutubeCommands,
    },

    /// Print version information
    Version,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum AudibleCommands {
    /// Export library books with annotations to Markdown
    Export {
        /// Target directory for the exported files
        #[arg(long)]
        target: PathBuf,

        /// Re-export every book even if unchanged
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum KindleCommands {
    /// Export notebook books with annotations to Markdown
    Export {
        /// Target directory for the exported files
        #[arg(long)]
        target: PathBuf,

        /// Re-export every book even if unchanged
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum NotionCommands {
    /// Restructure a workspace export zip into readable Markdown
    Export {
        /// Source export zip downloaded from Notion
        #[arg(long)]
        source: PathBuf,

        /// Target directory for the restructured export
        #[arg(long)]
        target: PathBuf,

        /// Replace the target directory if it already exists
        #[arg(long)]
        force: bool,

        /// Remove the source zip after a successful export
        #[arg(long)]
        clean: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum YoutubeCommands {
    /// Export one video's metadata and transcript to Markdown
    Export {
        /// Video URL (watch, share, or embed form)
        url: String,

        /// Target directory (defaults to current directory)
        #[arg(long)]
        target: Option<PathBuf>,

        /// Include the full timed transcript
        #[arg(long)]
        transcript: bool,

        /// Include a windowed transcript summary
        #[arg(long)]
        summarize: bool,
    },
}

/// Supported shells for completions.
#[derive(clap::ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}
