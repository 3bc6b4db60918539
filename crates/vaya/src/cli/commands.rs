//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::tree::RelationshipKind;

/// Family member commands.
#[derive(Debug, Subcommand)]
pub enum MemberCommand {
    /// Add a member to the tree
    Add {
        /// The member's name
        name: String,

        /// The member's role in the family (e.g. "Grandmother")
        role: String,

        /// Birth date (free-form, e.g. "1945-03-12")
        #[arg(long)]
        birth_date: Option<String>,

        /// Death date
        #[arg(long)]
        death_date: Option<String>,

        /// Short biography
        #[arg(long)]
        biography: Option<String>,

        /// Avatar image URL
        #[arg(long)]
        avatar_url: Option<String>,
    },

    /// Remove a member and all their relationships
    Remove {
        /// ID of the member to remove
        id: String,
    },

    /// List all members
    List {
        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Show a single member
    Show {
        /// ID of the member to show
        id: String,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Update a member's story counters
    Annotate {
        /// ID of the member to annotate
        id: String,

        /// Number of stories recorded for this member
        #[arg(long)]
        stories: u32,

        /// Mark the member as having unseen stories
        #[arg(long)]
        new_stories: bool,
    },
}

/// Connect command arguments.
#[derive(Debug, Args)]
pub struct ConnectCommand {
    /// ID of the source member
    pub source: String,

    /// ID of the target member
    pub target: String,

    /// The kind of relationship
    #[arg(short, long, value_enum, default_value = "parent")]
    pub kind: KindArg,
}

/// Disconnect command arguments.
#[derive(Debug, Args)]
pub struct DisconnectCommand {
    /// ID of the relationship to remove
    pub id: String,
}

/// Import command arguments.
#[derive(Debug, Args)]
pub struct ImportCommand {
    /// Path to the spreadsheet file (.xlsx or .xls)
    pub path: PathBuf,

    /// Replace the existing tree instead of appending
    #[arg(long)]
    pub replace: bool,
}

/// Export command arguments.
#[derive(Debug, Args)]
pub struct ExportCommand {
    /// Destination path (.xlsx)
    pub path: PathBuf,
}

/// Transcribe command arguments.
#[derive(Debug, Args)]
pub struct TranscribeCommand {
    /// Path to an encoded audio file
    pub audio: PathBuf,

    /// BCP-47 language hint (e.g. "es")
    #[arg(short, long)]
    pub language: Option<String>,

    /// Recording ID to attach the transcript to
    #[arg(long)]
    pub recording: Option<i64>,
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Relationship kind argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    /// Source is a parent of target
    Parent,
    /// Source is a child of target
    Child,
    /// Members are spouses
    Spouse,
    /// Members are siblings
    Sibling,
}

impl From<KindArg> for RelationshipKind {
    fn from(arg: KindArg) -> Self {
        match arg {
            KindArg::Parent => Self::Parent,
            KindArg::Child => Self::Child,
            KindArg::Spouse => Self::Spouse,
            KindArg::Sibling => Self::Sibling,
        }
    }
}

/// Output format for commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    #[default]
    Plain,
    /// Formatted table
    Table,
    /// JSON output
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_arg_conversion() {
        assert_eq!(
            RelationshipKind::from(KindArg::Parent),
            RelationshipKind::Parent
        );
        assert_eq!(
            RelationshipKind::from(KindArg::Child),
            RelationshipKind::Child
        );
        assert_eq!(
            RelationshipKind::from(KindArg::Spouse),
            RelationshipKind::Spouse
        );
        assert_eq!(
            RelationshipKind::from(KindArg::Sibling),
            RelationshipKind::Sibling
        );
    }

    #[test]
    fn test_output_format_default() {
        assert_eq!(OutputFormat::default(), OutputFormat::Plain);
    }

    #[test]
    fn test_member_command_debug() {
        let cmd = MemberCommand::Add {
            name: "Alice".to_string(),
            role: "Mother".to_string(),
            birth_date: None,
            death_date: None,
            biography: None,
            avatar_url: None,
        };
        let debug_str = format!("{cmd:?}");
        assert!(debug_str.contains("Add"));
        assert!(debug_str.contains("Alice"));
    }

    #[test]
    fn test_connect_command_debug() {
        let cmd = ConnectCommand {
            source: "a".to_string(),
            target: "b".to_string(),
            kind: KindArg::Spouse,
        };
        let debug_str = format!("{cmd:?}");
        assert!(debug_str.contains("source"));
        assert!(debug_str.contains("Spouse"));
    }

    #[test]
    fn test_import_command_debug() {
        let cmd = ImportCommand {
            path: PathBuf::from("family.xlsx"),
            replace: true,
        };
        let debug_str = format!("{cmd:?}");
        assert!(debug_str.contains("family.xlsx"));
    }

    #[test]
    fn test_config_command_debug() {
        let cmd = ConfigCommand::Show { json: false };
        let debug_str = format!("{cmd:?}");
        assert!(debug_str.contains("Show"));
    }

    #[test]
    fn test_kind_arg_clone() {
        let arg = KindArg::Sibling;
        let cloned = arg;
        assert_eq!(arg, cloned);
    }

    #[test]
    fn test_output_format_debug() {
        let format = OutputFormat::Json;
        let debug_str = format!("{format:?}");
        assert_eq!(debug_str, "Json");
    }
}
