//! Storage layer for vaya.
//!
//! This module provides `SQLite`-based persistent storage for the family
//! tree and recording metadata, including tree snapshots, recording
//! deduplication, and pruning. Audio blobs themselves are not stored here;
//! they belong to object storage.

pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info, warn};

use crate::capture::{AudioFormat, Recording};
use crate::error::{Error, Result};
use crate::tree::{
    FamilyTree, Member, MemberId, Position, Relationship, RelationshipCounters, RelationshipId,
    RelationshipKind,
};

/// Storage engine for the family tree and recording metadata.
#[derive(Debug)]
pub struct Store {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

/// Stored metadata about a recording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRecording {
    /// Identifier assigned on insertion.
    pub id: i64,
    /// When the recording was finished.
    pub created_at: DateTime<Utc>,
    /// Container format.
    pub format: AudioFormat,
    /// Duration in milliseconds.
    pub duration_ms: u64,
    /// Size of the audio blob in bytes.
    pub byte_len: u64,
    /// BLAKE3 hash of the audio blob.
    pub content_hash: String,
    /// Transcript text, once transcription has run.
    pub transcript: Option<String>,
}

/// Statistics about the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreStats {
    /// Number of members in the saved tree.
    pub member_count: i64,
    /// Number of relationships in the saved tree.
    pub relationship_count: i64,
    /// Number of recordings.
    pub recording_count: i64,
    /// Size of the database file in bytes.
    pub db_size_bytes: u64,
}

impl Store {
    /// Open or create a store database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    /// Initializes the schema if this is a new database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema
    /// initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        // Enable WAL mode for better concurrent read performance
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        migrations::initialize_schema(&conn)?;

        info!("Database opened successfully at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory store for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    // === Tree snapshots ===

    /// Save a snapshot of the tree, replacing any previously saved tree.
    ///
    /// The replacement is transactional: either the whole snapshot lands or
    /// the previous one stays intact.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn save_tree(&mut self, tree: &FamilyTree) -> Result<()> {
        let tx = self.conn.transaction()?;

        tx.execute("DELETE FROM relationships", [])?;
        tx.execute("DELETE FROM members", [])?;

        for member in tree.members() {
            tx.execute(
                r"
                INSERT INTO members
                    (id, name, role, birth_date, death_date, biography, avatar_url,
                     story_count, has_new_stories, pos_x, pos_y)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                ",
                params![
                    member.id.as_str(),
                    member.name,
                    member.role,
                    member.birth_date,
                    member.death_date,
                    member.biography,
                    member.avatar_url,
                    i64::from(member.story_count),
                    member.has_new_stories,
                    member.position.x,
                    member.position.y,
                ],
            )?;
        }

        for rel in tree.relationships() {
            tx.execute(
                r"
                INSERT INTO relationships (id, source, target, kind, shared_stories)
                VALUES (?1, ?2, ?3, ?4, ?5)
                ",
                params![
                    rel.id.as_str(),
                    rel.source.as_str(),
                    rel.target.as_str(),
                    rel.kind.to_string(),
                    i64::from(rel.counters.shared_stories),
                ],
            )?;
        }

        tx.commit()?;
        info!(
            "Saved tree snapshot: {} member(s), {} relationship(s)",
            tree.member_count(),
            tree.relationship_count()
        );
        Ok(())
    }

    /// Load the saved tree snapshot.
    ///
    /// Returns an empty tree if nothing has been saved yet. Insertion order
    /// is preserved.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails or the saved rows
    /// violate tree invariants.
    pub fn load_tree(&self) -> Result<FamilyTree> {
        let mut stmt = self.conn.prepare(
            r"
            SELECT id, name, role, birth_date, death_date, biography, avatar_url,
                   story_count, has_new_stories, pos_x, pos_y
            FROM members ORDER BY rowid
            ",
        )?;
        let members = stmt
            .query_map([], Self::row_to_member)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut stmt = self.conn.prepare(
            r"
            SELECT id, source, target, kind, shared_stories
            FROM relationships ORDER BY rowid
            ",
        )?;
        let relationships = stmt
            .query_map([], Self::row_to_relationship)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        FamilyTree::from_parts(members, relationships)
    }

    // === Recordings ===

    /// Insert recording metadata.
    ///
    /// Returns the assigned ID, or `None` if the recording was deduplicated
    /// (i.e., a recording with an identical content hash already exists).
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn insert_recording(&self, recording: &Recording) -> Result<Option<i64>> {
        if self.recording_exists_by_hash(&recording.content_hash)? {
            debug!(
                "Skipping duplicate recording with hash {}",
                &recording.content_hash[..16]
            );
            return Ok(None);
        }

        self.conn.execute(
            r"
            INSERT INTO recordings (created_at, mime_type, duration_ms, byte_len, content_hash)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ",
            params![
                recording.created_at.to_rfc3339(),
                recording.format.mime_type(),
                i64::try_from(recording.duration_ms).unwrap_or(i64::MAX),
                i64::try_from(recording.byte_len()).unwrap_or(i64::MAX),
                recording.content_hash,
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        debug!("Inserted recording with id {}", id);
        Ok(Some(id))
    }

    /// Check if a recording with the given hash already exists.
    fn recording_exists_by_hash(&self, hash: &str) -> Result<bool> {
        let count: i32 = self.conn.query_row(
            "SELECT COUNT(*) FROM recordings WHERE content_hash = ?1",
            [hash],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Attach a transcript to a stored recording.
    ///
    /// Returns `true` if a recording was updated, `false` if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn set_transcript(&self, id: i64, transcript: &str) -> Result<bool> {
        let affected = self.conn.execute(
            "UPDATE recordings SET transcript = ?1 WHERE id = ?2",
            params![transcript, id],
        )?;
        Ok(affected > 0)
    }

    /// Get recording metadata by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_recording(&self, id: i64) -> Result<Option<StoredRecording>> {
        let result = self
            .conn
            .query_row(
                r"
                SELECT id, created_at, mime_type, duration_ms, byte_len, content_hash, transcript
                FROM recordings WHERE id = ?1
                ",
                [id],
                Self::row_to_recording,
            )
            .optional()?;
        Ok(result)
    }

    /// Get the most recent recordings.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn recent_recordings(&self, limit: usize) -> Result<Vec<StoredRecording>> {
        let mut stmt = self.conn.prepare(
            r"
            SELECT id, created_at, mime_type, duration_ms, byte_len, content_hash, transcript
            FROM recordings ORDER BY created_at DESC LIMIT ?1
            ",
        )?;

        let limit_i64 = i64::try_from(limit).unwrap_or(i64::MAX);
        let recordings = stmt
            .query_map([limit_i64], Self::row_to_recording)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(recordings)
    }

    /// Prune recordings to keep only the most recent N entries.
    ///
    /// Returns the number of recordings deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn prune_keep_recent(&self, keep_count: usize) -> Result<usize> {
        let keep_i64 = i64::try_from(keep_count).unwrap_or(i64::MAX);
        let affected = self.conn.execute(
            r"
            DELETE FROM recordings WHERE id NOT IN (
                SELECT id FROM recordings ORDER BY created_at DESC LIMIT ?1
            )
            ",
            [keep_i64],
        )?;

        if affected > 0 {
            info!("Pruned {} recording(s) to keep {} recent", affected, keep_count);
        }
        Ok(affected)
    }

    /// Count stored recordings.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn recording_count(&self) -> Result<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM recordings", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Get database statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<StoreStats> {
        let member_count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM members", [], |row| row.get(0))?;
        let relationship_count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM relationships", [], |row| row.get(0))?;
        let recording_count = self.recording_count()?;

        let db_size_bytes = if self.path.to_string_lossy() == ":memory:" {
            0
        } else {
            std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
        };

        Ok(StoreStats {
            member_count,
            relationship_count,
            recording_count,
            db_size_bytes,
        })
    }

    /// Convert a database row to a Member.
    fn row_to_member(row: &rusqlite::Row) -> rusqlite::Result<Member> {
        let id: String = row.get(0)?;
        let story_count: i64 = row.get(7)?;
        Ok(Member {
            id: MemberId::from(id),
            name: row.get(1)?,
            role: row.get(2)?,
            birth_date: row.get(3)?,
            death_date: row.get(4)?,
            biography: row.get(5)?,
            avatar_url: row.get(6)?,
            story_count: u32::try_from(story_count).unwrap_or(0),
            has_new_stories: row.get(8)?,
            position: Position::new(row.get(9)?, row.get(10)?),
        })
    }

    /// Convert a database row to a Relationship.
    fn row_to_relationship(row: &rusqlite::Row) -> rusqlite::Result<Relationship> {
        let id: String = row.get(0)?;
        let source: String = row.get(1)?;
        let target: String = row.get(2)?;
        let kind_str: String = row.get(3)?;
        let shared_stories: i64 = row.get(4)?;

        let kind = match kind_str.as_str() {
            "parent" => RelationshipKind::Parent,
            "spouse" => RelationshipKind::Spouse,
            "sibling" => RelationshipKind::Sibling,
            _ => {
                warn!("Unknown relationship kind: {}, defaulting to sibling", kind_str);
                RelationshipKind::Sibling
            }
        };

        Ok(Relationship {
            id: RelationshipId::from(id),
            source: MemberId::from(source),
            target: MemberId::from(target),
            kind,
            counters: RelationshipCounters {
                shared_stories: u32::try_from(shared_stories).unwrap_or(0),
            },
        })
    }

    /// Convert a database row to a `StoredRecording`.
    fn row_to_recording(row: &rusqlite::Row) -> rusqlite::Result<StoredRecording> {
        let created_at_str: String = row.get(1)?;
        let mime: String = row.get(2)?;
        let duration_ms: i64 = row.get(3)?;
        let byte_len: i64 = row.get(4)?;

        let created_at = DateTime::parse_from_rfc3339(&created_at_str)
            .map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc));

        let format = AudioFormat::from_mime(&mime).unwrap_or_else(|| {
            warn!("Unknown recording mime type: {}, defaulting to webm", mime);
            AudioFormat::Webm
        });

        Ok(StoredRecording {
            id: row.get(0)?,
            created_at,
            format,
            duration_ms: u64::try_from(duration_ms).unwrap_or(0),
            byte_len: u64::try_from(byte_len).unwrap_or(0),
            content_hash: row.get(5)?,
            transcript: row.get(6)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::MemberSpec;

    fn create_test_store() -> Store {
        Store::open_in_memory().expect("failed to create test store")
    }

    fn sample_tree() -> FamilyTree {
        let mut tree = FamilyTree::new();
        let alice = tree.add_member(MemberSpec::new("Alice", "Mother")).unwrap();
        let bob = tree.add_member(MemberSpec::new("Bob", "Father")).unwrap();
        let carol = tree
            .add_member(MemberSpec::new("Carol", "Daughter"))
            .unwrap();
        tree.connect(&alice, &bob, RelationshipKind::Spouse).unwrap();
        tree.connect(&alice, &carol, RelationshipKind::Parent)
            .unwrap();
        tree.update_shared_stories(&alice, &bob, 3).unwrap();
        tree.update_member_stories(&alice, 5, true).unwrap();
        tree
    }

    fn sample_recording(data: &[u8]) -> Recording {
        Recording::new(data.to_vec(), AudioFormat::Webm, 1200)
    }

    #[test]
    fn test_open_in_memory() {
        let store = Store::open_in_memory();
        assert!(store.is_ok());
    }

    #[test]
    fn test_save_and_load_tree_roundtrip() {
        let mut store = create_test_store();
        let tree = sample_tree();

        store.save_tree(&tree).unwrap();
        let loaded = store.load_tree().unwrap();

        assert_eq!(loaded, tree);
    }

    #[test]
    fn test_load_tree_empty_store() {
        let store = create_test_store();
        let tree = store.load_tree().unwrap();
        assert!(tree.is_empty());
        assert_eq!(tree.relationship_count(), 0);
    }

    #[test]
    fn test_save_tree_replaces_previous_snapshot() {
        let mut store = create_test_store();
        store.save_tree(&sample_tree()).unwrap();

        let mut smaller = FamilyTree::new();
        smaller
            .add_member(MemberSpec::new("Dora", "Grandmother"))
            .unwrap();
        store.save_tree(&smaller).unwrap();

        let loaded = store.load_tree().unwrap();
        assert_eq!(loaded.member_count(), 1);
        assert_eq!(loaded.members()[0].name, "Dora");
        assert_eq!(loaded.relationship_count(), 0);
    }

    #[test]
    fn test_loaded_tree_preserves_counters_and_positions() {
        let mut store = create_test_store();
        let tree = sample_tree();
        store.save_tree(&tree).unwrap();

        let loaded = store.load_tree().unwrap();
        let alice = loaded
            .members()
            .iter()
            .find(|m| m.name == "Alice")
            .unwrap();
        assert_eq!(alice.story_count, 5);
        assert!(alice.has_new_stories);
        assert_eq!(
            alice.position,
            tree.members().iter().find(|m| m.name == "Alice").unwrap().position
        );

        let bob = loaded.members().iter().find(|m| m.name == "Bob").unwrap();
        let spouse = loaded.connection_between(&alice.id, &bob.id).unwrap();
        assert_eq!(spouse.counters.shared_stories, 3);
        assert!(spouse.is_dashed());
    }

    #[test]
    fn test_insert_and_get_recording() {
        let store = create_test_store();
        let recording = sample_recording(b"audio bytes");

        let id = store.insert_recording(&recording).unwrap();
        assert!(id.is_some());

        let stored = store.get_recording(id.unwrap()).unwrap().unwrap();
        assert_eq!(stored.content_hash, recording.content_hash);
        assert_eq!(stored.format, AudioFormat::Webm);
        assert_eq!(stored.duration_ms, 1200);
        assert_eq!(stored.byte_len, 11);
        assert!(stored.transcript.is_none());
    }

    #[test]
    fn test_insert_recording_deduplication() {
        let store = create_test_store();
        let recording = sample_recording(b"duplicate audio");

        let id1 = store.insert_recording(&recording).unwrap();
        let id2 = store.insert_recording(&recording).unwrap();

        assert!(id1.is_some());
        assert!(id2.is_none()); // Deduplicated
        assert_eq!(store.recording_count().unwrap(), 1);
    }

    #[test]
    fn test_get_recording_nonexistent() {
        let store = create_test_store();
        let result = store.get_recording(99999).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_set_transcript() {
        let store = create_test_store();
        let id = store
            .insert_recording(&sample_recording(b"to transcribe"))
            .unwrap()
            .unwrap();

        assert!(store.set_transcript(id, "Once upon a time").unwrap());
        let stored = store.get_recording(id).unwrap().unwrap();
        assert_eq!(stored.transcript, Some("Once upon a time".to_string()));
    }

    #[test]
    fn test_set_transcript_nonexistent() {
        let store = create_test_store();
        assert!(!store.set_transcript(99999, "text").unwrap());
    }

    #[test]
    fn test_recent_recordings() {
        let store = create_test_store();
        for i in 0..5 {
            store
                .insert_recording(&sample_recording(format!("audio {i}").as_bytes()))
                .unwrap();
        }

        let recent = store.recent_recordings(3).unwrap();
        assert_eq!(recent.len(), 3);
    }

    #[test]
    fn test_prune_keep_recent() {
        let store = create_test_store();
        for i in 0..10 {
            store
                .insert_recording(&sample_recording(format!("audio {i}").as_bytes()))
                .unwrap();
        }

        let pruned = store.prune_keep_recent(4).unwrap();
        assert_eq!(pruned, 6);
        assert_eq!(store.recording_count().unwrap(), 4);
    }

    #[test]
    fn test_prune_keep_recent_no_pruning_needed() {
        let store = create_test_store();
        store
            .insert_recording(&sample_recording(b"only one"))
            .unwrap();

        let pruned = store.prune_keep_recent(10).unwrap();
        assert_eq!(pruned, 0);
        assert_eq!(store.recording_count().unwrap(), 1);
    }

    #[test]
    fn test_stats_empty() {
        let store = create_test_store();
        let stats = store.stats().unwrap();

        assert_eq!(stats.member_count, 0);
        assert_eq!(stats.relationship_count, 0);
        assert_eq!(stats.recording_count, 0);
        assert_eq!(stats.db_size_bytes, 0);
    }

    #[test]
    fn test_stats_with_data() {
        let mut store = create_test_store();
        store.save_tree(&sample_tree()).unwrap();
        store
            .insert_recording(&sample_recording(b"story"))
            .unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.member_count, 3);
        assert_eq!(stats.relationship_count, 2);
        assert_eq!(stats.recording_count, 1);
    }

    #[test]
    fn test_path() {
        let store = create_test_store();
        assert_eq!(store.path().to_string_lossy(), ":memory:");
    }

    #[test]
    fn test_open_file_based() {
        let temp_dir = std::env::temp_dir();
        let db_path = temp_dir.join(format!("vaya_test_{}.db", std::process::id()));

        let mut store = Store::open(&db_path).unwrap();
        store.save_tree(&sample_tree()).unwrap();
        assert_eq!(store.load_tree().unwrap().member_count(), 3);
        assert_eq!(store.path(), db_path);

        drop(store);
        let _ = std::fs::remove_file(&db_path);
        let _ = std::fs::remove_file(db_path.with_extension("db-wal"));
        let _ = std::fs::remove_file(db_path.with_extension("db-shm"));
    }

    #[test]
    fn test_open_creates_parent_dirs() {
        let temp_dir = std::env::temp_dir();
        let nested_path =
            temp_dir.join(format!("vaya_test_{}/nested/db.sqlite", std::process::id()));

        if let Some(parent) = nested_path.parent() {
            let _ = std::fs::remove_dir_all(parent);
        }

        let store = Store::open(&nested_path).unwrap();
        assert!(nested_path.exists());

        drop(store);
        if let Some(parent) = nested_path.parent() {
            let _ = std::fs::remove_dir_all(parent.parent().unwrap());
        }
    }

    #[test]
    fn test_stats_db_size_file_based() {
        let temp_dir = std::env::temp_dir();
        let db_path = temp_dir.join(format!("vaya_size_test_{}.db", std::process::id()));

        let store = Store::open(&db_path).unwrap();
        store
            .insert_recording(&sample_recording(b"bytes"))
            .unwrap();

        let stats = store.stats().unwrap();
        assert!(stats.db_size_bytes > 0);

        drop(store);
        let _ = std::fs::remove_file(&db_path);
        let _ = std::fs::remove_file(db_path.with_extension("db-wal"));
        let _ = std::fs::remove_file(db_path.with_extension("db-shm"));
    }

    #[test]
    fn test_unknown_relationship_kind_defaults_to_sibling() {
        let mut store = create_test_store();
        let mut tree = FamilyTree::new();
        let a = tree.add_member(MemberSpec::new("A", "Aunt")).unwrap();
        let b = tree.add_member(MemberSpec::new("B", "Uncle")).unwrap();
        tree.connect(&a, &b, RelationshipKind::Spouse).unwrap();
        store.save_tree(&tree).unwrap();

        // Corrupt the kind column directly
        store
            .conn
            .execute("UPDATE relationships SET kind = 'cousin'", [])
            .unwrap();

        let loaded = store.load_tree().unwrap();
        assert_eq!(loaded.relationships()[0].kind, RelationshipKind::Sibling);
    }

    #[test]
    fn test_stored_recording_clone_eq() {
        let store = create_test_store();
        let id = store
            .insert_recording(&sample_recording(b"x"))
            .unwrap()
            .unwrap();
        let stored = store.get_recording(id).unwrap().unwrap();
        assert_eq!(stored.clone(), stored);
    }
}
