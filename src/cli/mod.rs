//! CLI interface using clap.
//!
//! Provides command-line arguments and subcommands for the tool.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::application::OutputFormat;
use crate::domain::DropIntent;

/// SyncGrid - organize bookmarks into a tab/folder grid.
///
/// Groups live under the `__SyncGrid__` folder of the bookmark store.
/// Backups are checksummed JSON documents; a connected folder receives a
/// mirrored copy on every change.
#[derive(Parser, Debug)]
#[command(name = "syncgrid")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging (use multiple times for more verbosity).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output format: tree, table, or json.
    #[arg(short, long, default_value = "tree", global = true)]
    pub format: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show all groups and bookmarks.
    List,

    /// Show groups only, one per line with item counts.
    Groups,

    /// Find links and groups by title or URL.
    Search { text: String },

    /// Create a group.
    AddGroup {
        title: String,

        /// Parent group id (top level if not specified).
        #[arg(short, long)]
        parent: Option<String>,
    },

    /// Add a bookmark to a group.
    Add {
        /// Group id (`__ungrouped__` for the root).
        group: String,
        title: String,
        url: String,
    },

    /// Rename a group.
    Rename { id: String, title: String },

    /// Change a bookmark's title or URL.
    Edit {
        id: String,

        #[arg(short, long)]
        title: Option<String>,

        #[arg(short, long)]
        url: Option<String>,
    },

    /// Remove a bookmark, or a group with everything in it.
    Remove { id: String },

    /// Drag a node onto a sibling.
    Move {
        /// Node being dragged.
        source: String,

        /// Sibling it is dropped on.
        target: String,

        /// Drop intent: before, after, or into (folders only).
        #[arg(short, long, conflicts_with = "at")]
        intent: Option<DropIntent>,

        /// Pointer position across the target, 0.0 (left edge) to 1.0.
        #[arg(long)]
        at: Option<f64>,
    },

    /// Move a link or group into another group.
    MoveTo {
        id: String,

        /// Destination group id (`__ungrouped__` for the root).
        group: String,

        /// Position among the group's children (appended if not specified).
        #[arg(short, long)]
        index: Option<usize>,
    },

    /// Write a checksummed backup document.
    Export {
        /// Output file or directory (exports directory if not specified).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate a backup and replace all groups with its contents.
    Import {
        file: PathBuf,

        /// Validate only; do not touch the bookmark store.
        #[arg(long)]
        dry_run: bool,
    },

    /// Folder sync.
    Sync {
        #[command(subcommand)]
        action: SyncAction,
    },

    /// Show data and configuration paths.
    Paths,
}

#[derive(Subcommand, Debug)]
pub enum SyncAction {
    /// Write the sync file now.
    Now,

    /// Use a directory as the sync folder.
    Connect { dir: PathBuf },

    /// Forget the sync folder.
    Disconnect,

    /// Show the sync folder and last sync time.
    Status,

    /// Keep syncing on changes and on the interval until interrupted.
    Watch,
}

impl Cli {
    /// Parse the output format argument.
    ///
    /// # Errors
    /// Returns the parse message for an unknown format.
    pub fn output_format(&self) -> Result<OutputFormat, String> {
        self.format.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_move_intent_parses() {
        let cli = Cli::parse_from(["syncgrid", "move", "5", "7", "--intent", "into"]);
        assert!(matches!(
            cli.command,
            Commands::Move {
                intent: Some(DropIntent::Into),
                at: None,
                ..
            }
        ));

        let conflict = Cli::try_parse_from(["syncgrid", "move", "5", "7", "-i", "after", "--at", "0.5"]);
        assert!(conflict.is_err());
    }

    #[test]
    fn test_move_to_index_is_optional() {
        let cli = Cli::parse_from(["syncgrid", "move-to", "5", "__ungrouped__"]);
        assert!(matches!(cli.command, Commands::MoveTo { index: None, .. }));

        let cli = Cli::parse_from(["syncgrid", "move-to", "5", "9", "--index", "2"]);
        assert!(matches!(cli.command, Commands::MoveTo { index: Some(2), .. }));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["syncgrid", "list", "-vv", "-f", "json"]);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.output_format(), Ok(OutputFormat::Json));
    }
}
