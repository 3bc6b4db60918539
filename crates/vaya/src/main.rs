//! `vaya` - CLI for the vaya family memory keeper
//!
//! This binary provides the command-line interface for editing the family
//! tree, moving it in and out of spreadsheets, and transcribing recorded
//! memories.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::path::Path;

use clap::Parser;

use vaya::capture::transcribe::{
    FallbackTranscriber, HttpTranscriber, Transcriber, TranscriptionRequest,
};
use vaya::capture::{AudioFormat, Recording};
use vaya::cli::{
    Cli, Command, ConfigCommand, ConnectCommand, DisconnectCommand, ExportCommand, ImportCommand,
    MemberCommand, OutputFormat, StatusCommand, TranscribeCommand,
};
use vaya::storage::Store;
use vaya::tree::{MemberId, MemberSpec, RelationshipId};
use vaya::workbook;
use vaya::{init_logging, Config, FamilyTree};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let config = Config::load_from(cli.config.clone())?;

    // Execute the command
    match cli.command {
        Command::Member(member_cmd) => handle_member(&config, member_cmd),
        Command::Connect(connect_cmd) => handle_connect(&config, &connect_cmd),
        Command::Disconnect(disconnect_cmd) => handle_disconnect(&config, &disconnect_cmd),
        Command::Import(import_cmd) => handle_import(&config, &import_cmd),
        Command::Export(export_cmd) => handle_export(&config, &export_cmd),
        Command::Transcribe(transcribe_cmd) => handle_transcribe(&config, transcribe_cmd).await,
        Command::Status(status_cmd) => handle_status(&config, &status_cmd),
        Command::Config(config_cmd) => handle_config(&config, config_cmd),
    }
}

fn open_store(config: &Config) -> anyhow::Result<Store> {
    Ok(Store::open(config.database_path())?)
}

fn handle_member(config: &Config, cmd: MemberCommand) -> anyhow::Result<()> {
    let mut store = open_store(config)?;
    let mut tree = store.load_tree()?;

    match cmd {
        MemberCommand::Add {
            name,
            role,
            birth_date,
            death_date,
            biography,
            avatar_url,
        } => {
            let mut spec = MemberSpec::new(name, role);
            spec.birth_date = birth_date;
            spec.death_date = death_date;
            spec.biography = biography;
            spec.avatar_url = avatar_url;

            let id = tree.add_member(spec)?;
            store.save_tree(&tree)?;

            let member = tree.member(&id).ok_or_else(|| {
                anyhow::anyhow!("member vanished after insertion")
            })?;
            println!("Added {} ({}) with id {}", member.name, member.role, id);
        }
        MemberCommand::Remove { id } => {
            let id = MemberId::from(id);
            let member = tree
                .member(&id)
                .map(|m| m.name.clone())
                .unwrap_or_default();
            tree.remove_member(&id)?;
            store.save_tree(&tree)?;
            println!("Removed {member} and their relationships");
        }
        MemberCommand::List { format } => print_members(&tree, format)?,
        MemberCommand::Show { id, json } => {
            let id = MemberId::from(id);
            let member = tree
                .member(&id)
                .ok_or_else(|| vaya::Error::member_not_found(id.as_str()))?;

            if json {
                println!("{}", serde_json::to_string_pretty(member)?);
            } else {
                println!("{} ({})", member.name, member.role);
                println!("  ID:          {}", member.id);
                if let Some(birth) = &member.birth_date {
                    println!("  Born:        {birth}");
                }
                if let Some(death) = &member.death_date {
                    println!("  Died:        {death}");
                }
                if let Some(bio) = &member.biography {
                    println!("  Biography:   {bio}");
                }
                println!("  Stories:     {}", member.story_count);
                let connections = tree.relationships_of(&id);
                println!("  Connections: {}", connections.len());
                for rel in connections {
                    let other = rel.other_end(&id).unwrap_or(&rel.target);
                    let name = tree
                        .member(other)
                        .map_or_else(|| other.to_string(), |m| m.name.clone());
                    println!("    {} -> {name}", rel.kind);
                }
            }
        }
        MemberCommand::Annotate {
            id,
            stories,
            new_stories,
        } => {
            let id = MemberId::from(id);
            tree.update_member_stories(&id, stories, new_stories)?;
            store.save_tree(&tree)?;
            println!("Updated story counters for {id}");
        }
    }
    Ok(())
}

fn print_members(tree: &FamilyTree, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(tree.members())?);
        }
        OutputFormat::Plain => {
            for member in tree.members() {
                println!("{}\t{}\t{}", member.id, member.name, member.role);
            }
        }
        OutputFormat::Table => {
            if tree.is_empty() {
                println!("The tree is empty.");
                return Ok(());
            }
            println!("{:<38} {:<24} {:<16} {:>7}", "ID", "NAME", "ROLE", "STORIES");
            for member in tree.members() {
                println!(
                    "{:<38} {:<24} {:<16} {:>7}",
                    member.id, member.name, member.role, member.story_count
                );
            }
        }
    }
    Ok(())
}

fn handle_connect(config: &Config, cmd: &ConnectCommand) -> anyhow::Result<()> {
    let mut store = open_store(config)?;
    let mut tree = store.load_tree()?;

    let source = MemberId::from(cmd.source.as_str());
    let target = MemberId::from(cmd.target.as_str());
    let id = tree.connect(&source, &target, cmd.kind.into())?;
    store.save_tree(&tree)?;

    println!("Connected: {id}");
    Ok(())
}

fn handle_disconnect(config: &Config, cmd: &DisconnectCommand) -> anyhow::Result<()> {
    let mut store = open_store(config)?;
    let mut tree = store.load_tree()?;

    tree.remove_connection(&RelationshipId::from(cmd.id.as_str()))?;
    store.save_tree(&tree)?;

    println!("Removed relationship {}", cmd.id);
    Ok(())
}

fn handle_import(config: &Config, cmd: &ImportCommand) -> anyhow::Result<()> {
    let mut store = open_store(config)?;
    let rows = workbook::read_rows(&cmd.path)?;

    let mut tree = if cmd.replace {
        FamilyTree::new()
    } else {
        store.load_tree()?
    };

    let specs: Vec<MemberSpec> = rows.into_iter().map(workbook::MemberRow::into_spec).collect();
    let count = specs.len();
    tree.add_members(specs)?;
    store.save_tree(&tree)?;

    println!(
        "Imported {count} member(s) from {} ({} total)",
        cmd.path.display(),
        tree.member_count()
    );
    Ok(())
}

fn handle_export(config: &Config, cmd: &ExportCommand) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let tree = store.load_tree()?;

    workbook::write_members(&tree, &cmd.path, &config.export.sheet_name)?;
    println!(
        "Exported {} member(s) to {}",
        tree.member_count(),
        cmd.path.display()
    );
    Ok(())
}

async fn handle_transcribe(config: &Config, cmd: TranscribeCommand) -> anyhow::Result<()> {
    let store = open_store(config)?;

    let data = std::fs::read(&cmd.audio)?;
    let format = format_from_path(&cmd.audio).unwrap_or_else(|| config.audio_format());
    let recording = Recording::new(data, format, 0);
    if recording.is_empty() {
        return Err(vaya::Error::RecordingEmpty.into());
    }

    // Remember the recording before calling out, so a failed transcription
    // never loses the audio metadata.
    let inserted = store.insert_recording(&recording)?;
    if inserted.is_none() {
        println!("Recording already known (identical content hash).");
    }
    if config.storage.max_recordings > 0 {
        store.prune_keep_recent(config.storage.max_recordings)?;
    }

    let language = cmd
        .language
        .clone()
        .or_else(|| config.transcription.language.clone());
    let request = TranscriptionRequest::from_recording(&recording, language);

    let http = HttpTranscriber::with_timeout(
        config.transcription.endpoint.clone(),
        config.transcription_timeout(),
    )?;
    let transcript = if config.transcription.fallback_enabled {
        FallbackTranscriber::new(http).transcribe(&request).await?
    } else {
        http.transcribe(&request).await?
    };

    let target_id = cmd.recording.or(inserted);
    if let Some(id) = target_id {
        store.set_transcript(id, &transcript.text)?;
    }

    if transcript.is_fallback {
        println!("(transcription service unavailable)");
    }
    println!("{}", transcript.text);
    Ok(())
}

/// Guess the audio format from the file extension.
fn format_from_path(path: &Path) -> Option<AudioFormat> {
    match path.extension()?.to_str()? {
        "webm" => Some(AudioFormat::Webm),
        "ogg" | "oga" => Some(AudioFormat::Ogg),
        "wav" => Some(AudioFormat::Wav),
        _ => None,
    }
}

fn handle_status(config: &Config, cmd: &StatusCommand) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let stats = store.stats()?;

    if cmd.json {
        let status = serde_json::json!({
            "members": stats.member_count,
            "relationships": stats.relationship_count,
            "recordings": stats.recording_count,
            "database_path": config.database_path(),
            "database_size_bytes": stats.db_size_bytes,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("vaya stats");
        println!("----------");
        println!("Members:       {}", stats.member_count);
        println!("Relationships: {}", stats.relationship_count);
        println!("Recordings:    {}", stats.recording_count);
        println!("Database:      {}", config.database_path().display());
        println!("Size:          {} byte(s)", stats.db_size_bytes);
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:   {}", config.database_path().display());
                println!("  Max recordings:  {}", config.storage.max_recordings);
                println!();
                println!("[Capture]");
                println!("  Format:          {}", config.capture.mime_type);
                println!("  Chunk buffer:    {}", config.capture.chunk_buffer);
                println!();
                println!("[Transcription]");
                println!("  Endpoint:        {}", config.transcription.endpoint);
                println!(
                    "  Language:        {}",
                    config.transcription.language.as_deref().unwrap_or("auto")
                );
                println!("  Timeout (secs):  {}", config.transcription.timeout_secs);
                println!(
                    "  Fallback:        {}",
                    config.transcription.fallback_enabled
                );
                println!();
                println!("[Export]");
                println!("  Sheet name:      {}", config.export.sheet_name);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
