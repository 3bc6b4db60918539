//! Command-line interface for vaya.
//!
//! This module provides the CLI structure and command handlers for the
//! `vaya` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    ConfigCommand, ConnectCommand, DisconnectCommand, ExportCommand, ImportCommand, KindArg,
    MemberCommand, OutputFormat, StatusCommand, TranscribeCommand,
};

/// vaya - Preserve your family's voice
///
/// A family memory keeper: build a tree of your relatives, connect them,
/// move stories in and out of spreadsheets, and transcribe recorded
/// memories.
#[derive(Debug, Parser)]
#[command(name = "vaya")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage family members
    #[command(subcommand)]
    Member(MemberCommand),

    /// Connect two members with a relationship
    Connect(ConnectCommand),

    /// Remove a relationship
    Disconnect(DisconnectCommand),

    /// Import members from a spreadsheet
    Import(ImportCommand),

    /// Export the tree to a spreadsheet
    Export(ExportCommand),

    /// Transcribe a recorded memory
    Transcribe(TranscribeCommand),

    /// Show tree and recording statistics
    Status(StatusCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}
