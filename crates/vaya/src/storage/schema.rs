//! `SQLite` schema definitions for vaya.
//!
//! This module contains the SQL statements for creating and managing
//! the database schema.

/// SQL statement to create the members table.
pub const CREATE_MEMBERS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS members (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    role TEXT NOT NULL,
    birth_date TEXT,
    death_date TEXT,
    biography TEXT,
    avatar_url TEXT,
    story_count INTEGER NOT NULL DEFAULT 0,
    has_new_stories INTEGER NOT NULL DEFAULT 0,
    pos_x REAL NOT NULL DEFAULT 0,
    pos_y REAL NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
)
";

/// SQL statement to create the relationships table.
pub const CREATE_RELATIONSHIPS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS relationships (
    id TEXT PRIMARY KEY,
    source TEXT NOT NULL,
    target TEXT NOT NULL,
    kind TEXT NOT NULL,
    shared_stories INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
)
";

/// SQL statement to create the recordings table.
///
/// Only recording metadata lives here; the audio blob itself is destined
/// for object storage.
pub const CREATE_RECORDINGS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS recordings (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    created_at TEXT NOT NULL,
    mime_type TEXT NOT NULL,
    duration_ms INTEGER NOT NULL,
    byte_len INTEGER NOT NULL,
    content_hash TEXT NOT NULL,
    transcript TEXT
)
";

/// SQL statement to create an index on relationship sources.
pub const CREATE_REL_SOURCE_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_relationships_source ON relationships(source)
";

/// SQL statement to create an index on relationship targets.
pub const CREATE_REL_TARGET_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_relationships_target ON relationships(target)
";

/// SQL statement to create an index on `content_hash` for deduplication.
pub const CREATE_RECORDING_HASH_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_recordings_hash ON recordings(content_hash)
";

/// SQL statement to create an index on recording timestamps.
pub const CREATE_RECORDING_CREATED_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_recordings_created ON recordings(created_at DESC)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_MEMBERS_TABLE,
    CREATE_RELATIONSHIPS_TABLE,
    CREATE_RECORDINGS_TABLE,
    CREATE_REL_SOURCE_INDEX,
    CREATE_REL_TARGET_INDEX,
    CREATE_RECORDING_HASH_INDEX,
    CREATE_RECORDING_CREATED_INDEX,
    CREATE_METADATA_TABLE,
];
