//! Member types for the family tree.
//!
//! This module defines the fundamental data structures for representing
//! a person in the family tree, including identity, profile fields, and
//! layout position.

use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Width of the layout canvas used for randomized initial positions.
const CANVAS_WIDTH: f64 = 800.0;

/// Height of the layout canvas used for randomized initial positions.
const CANVAS_HEIGHT: f64 = 600.0;

/// Unique identifier for a family member.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberId(String);

impl MemberId {
    /// Generate a fresh random member id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Get the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for MemberId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MemberId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for MemberId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for MemberId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A 2D layout position on the family-tree canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl Position {
    /// Create a position at the given coordinates.
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Pick a random position on the canvas for a newly added member.
    #[must_use]
    pub fn random() -> Self {
        let mut rng = rand::thread_rng();
        Self {
            x: rng.gen_range(0.0..CANVAS_WIDTH),
            y: rng.gen_range(0.0..CANVAS_HEIGHT),
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self { x: 0.0, y: 0.0 }
    }
}

/// A member of the family tree.
///
/// Represents a single person with profile fields, derived story counters,
/// and a persisted layout position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    /// Unique identifier for this member.
    pub id: MemberId,

    /// Display name.
    pub name: String,

    /// Role or relationship label (e.g. "Grandmother").
    pub role: String,

    /// Birth date, as entered by the user.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,

    /// Death date, as entered by the user.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub death_date: Option<String>,

    /// Free-form biography text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub biography: Option<String>,

    /// Avatar image reference.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,

    /// Number of stories recorded for this member (derived).
    pub story_count: u32,

    /// Whether this member has stories the user hasn't seen yet.
    pub has_new_stories: bool,

    /// Layout position on the canvas.
    pub position: Position,
}

/// Input data for creating a member.
///
/// Only `name` and `role` are required; everything else defaults to empty.
/// When `id` or `position` are absent they are generated on insertion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemberSpec {
    /// Display name (required).
    pub name: String,
    /// Role or relationship label (required).
    pub role: String,
    /// Birth date.
    pub birth_date: Option<String>,
    /// Death date.
    pub death_date: Option<String>,
    /// Biography text.
    pub biography: Option<String>,
    /// Avatar image reference.
    pub avatar_url: Option<String>,
    /// Explicit id, used when importing rows that already carry one.
    pub id: Option<MemberId>,
    /// Explicit position, used when restoring a saved layout.
    pub position: Option<Position>,
}

impl MemberSpec {
    /// Create a spec with just the required fields.
    #[must_use]
    pub fn new(name: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: role.into(),
            ..Self::default()
        }
    }

    /// Validate required fields and build a `Member`.
    ///
    /// Missing `id`/`position` are filled with a fresh UUID and a random
    /// canvas position.
    ///
    /// # Errors
    ///
    /// Returns an error if `name` or `role` is blank.
    pub fn build(self) -> Result<Member> {
        if self.name.trim().is_empty() {
            return Err(Error::EmptyField { field: "name" });
        }
        if self.role.trim().is_empty() {
            return Err(Error::EmptyField { field: "role" });
        }

        Ok(Member {
            id: self.id.unwrap_or_default(),
            name: self.name,
            role: self.role,
            birth_date: self.birth_date,
            death_date: self.death_date,
            biography: self.biography,
            avatar_url: self.avatar_url,
            story_count: 0,
            has_new_stories: false,
            position: self.position.unwrap_or_else(Position::random),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_id_unique() {
        let a = MemberId::new();
        let b = MemberId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn test_member_id_display_roundtrip() {
        let id = MemberId::from("alice");
        assert_eq!(id.to_string(), "alice");
        assert_eq!(id.as_str(), "alice");
    }

    #[test]
    fn test_position_random_on_canvas() {
        for _ in 0..50 {
            let pos = Position::random();
            assert!(pos.x >= 0.0 && pos.x < CANVAS_WIDTH);
            assert!(pos.y >= 0.0 && pos.y < CANVAS_HEIGHT);
        }
    }

    #[test]
    fn test_position_default_origin() {
        assert_eq!(Position::default(), Position::new(0.0, 0.0));
    }

    #[test]
    fn test_spec_build_minimal() {
        let member = MemberSpec::new("Alice", "Mother").build().unwrap();
        assert_eq!(member.name, "Alice");
        assert_eq!(member.role, "Mother");
        assert_eq!(member.story_count, 0);
        assert!(!member.has_new_stories);
        assert!(member.birth_date.is_none());
    }

    #[test]
    fn test_spec_build_rejects_blank_name() {
        let result = MemberSpec::new("  ", "Mother").build();
        assert!(matches!(result, Err(Error::EmptyField { field: "name" })));
    }

    #[test]
    fn test_spec_build_rejects_blank_role() {
        let result = MemberSpec::new("Alice", "").build();
        assert!(matches!(result, Err(Error::EmptyField { field: "role" })));
    }

    #[test]
    fn test_spec_build_keeps_explicit_id_and_position() {
        let spec = MemberSpec {
            id: Some(MemberId::from("m-1")),
            position: Some(Position::new(10.0, 20.0)),
            ..MemberSpec::new("Alice", "Mother")
        };
        let member = spec.build().unwrap();
        assert_eq!(member.id, MemberId::from("m-1"));
        assert_eq!(member.position, Position::new(10.0, 20.0));
    }

    #[test]
    fn test_member_serialization() {
        let member = MemberSpec::new("Alice", "Mother").build().unwrap();
        let json = serde_json::to_string(&member).unwrap();
        let back: Member = serde_json::from_str(&json).unwrap();
        assert_eq!(member, back);
    }

    #[test]
    fn test_member_serialization_skips_empty_optionals() {
        let member = MemberSpec::new("Alice", "Mother").build().unwrap();
        let json = serde_json::to_string(&member).unwrap();
        assert!(!json.contains("birth_date"));
        assert!(!json.contains("biography"));
    }
}
