//! Relationship types for the family tree.
//!
//! A relationship is an edge between two members. The kind a caller asks for
//! is normalized on creation: "child" edges are stored with the endpoints
//! swapped so stored parent edges always point parent→child.

use serde::{Deserialize, Serialize};

use super::member::MemberId;

/// Base glow intensity for an edge with no shared stories.
const GLOW_BASE: f32 = 0.25;

/// Additional glow per shared story.
const GLOW_PER_STORY: f32 = 0.08;

/// The kind of relationship between two members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipKind {
    /// Source is a parent of target.
    Parent,
    /// Source is a child of target. Input-only: normalized to `Parent`
    /// with the endpoints swapped before storage.
    Child,
    /// The pair are spouses (undirected, rendered dashed).
    Spouse,
    /// The pair are siblings (undirected).
    Sibling,
}

impl RelationshipKind {
    /// Whether edges of this kind are stored without a direction.
    #[must_use]
    pub fn is_undirected(&self) -> bool {
        matches!(self, Self::Spouse | Self::Sibling)
    }
}

impl std::fmt::Display for RelationshipKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parent => write!(f, "parent"),
            Self::Child => write!(f, "child"),
            Self::Spouse => write!(f, "spouse"),
            Self::Sibling => write!(f, "sibling"),
        }
    }
}

/// Unique identifier for a relationship, derived from its endpoints and kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RelationshipId(String);

impl RelationshipId {
    /// Derive the composite id for a normalized (source, target, kind) triple.
    #[must_use]
    pub fn derive(source: &MemberId, target: &MemberId, kind: RelationshipKind) -> Self {
        Self(format!("{source}:{kind}:{target}"))
    }

    /// Get the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RelationshipId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RelationshipId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for RelationshipId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Derived counters carried by a relationship.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipCounters {
    /// Number of stories shared between the two members.
    pub shared_stories: u32,
}

/// A relationship edge between two members.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    /// Composite identifier derived from (source, target, kind).
    pub id: RelationshipId,

    /// Source endpoint. For parent edges this is always the parent.
    pub source: MemberId,

    /// Target endpoint. For parent edges this is always the child.
    pub target: MemberId,

    /// Normalized relationship kind (never `Child`).
    pub kind: RelationshipKind,

    /// Derived counters.
    pub counters: RelationshipCounters,
}

impl Relationship {
    /// Create a relationship from a caller-supplied (source, target, kind).
    ///
    /// A `Child` kind swaps the endpoints and stores a `Parent` edge, so the
    /// stored direction is always parent→child.
    #[must_use]
    pub fn new(source: MemberId, target: MemberId, kind: RelationshipKind) -> Self {
        let (source, target, kind) = match kind {
            RelationshipKind::Child => (target, source, RelationshipKind::Parent),
            other => (source, target, other),
        };
        let id = RelationshipId::derive(&source, &target, kind);
        Self {
            id,
            source,
            target,
            kind,
            counters: RelationshipCounters::default(),
        }
    }

    /// Whether this edge touches the given member.
    #[must_use]
    pub fn touches(&self, id: &MemberId) -> bool {
        &self.source == id || &self.target == id
    }

    /// Whether this edge connects the given unordered pair.
    #[must_use]
    pub fn connects(&self, a: &MemberId, b: &MemberId) -> bool {
        (&self.source == a && &self.target == b) || (&self.source == b && &self.target == a)
    }

    /// Given one endpoint, return the other. `None` if the edge doesn't
    /// touch the given member.
    #[must_use]
    pub fn other_end(&self, id: &MemberId) -> Option<&MemberId> {
        if &self.source == id {
            Some(&self.target)
        } else if &self.target == id {
            Some(&self.source)
        } else {
            None
        }
    }

    /// Whether this edge has no direction (spouse/sibling).
    #[must_use]
    pub fn is_undirected(&self) -> bool {
        self.kind.is_undirected()
    }

    /// Whether this edge is rendered dashed (spouse only).
    #[must_use]
    pub fn is_dashed(&self) -> bool {
        self.kind == RelationshipKind::Spouse
    }

    /// Whether this edge is part of direct lineage (parent→child).
    #[must_use]
    pub fn is_direct_lineage(&self) -> bool {
        self.kind == RelationshipKind::Parent
    }

    /// Visual glow intensity for this edge.
    ///
    /// Grows with the shared-story count, capped at full intensity.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn glow(&self) -> f32 {
        (GLOW_BASE + GLOW_PER_STORY * self.counters.shared_stories as f32).min(1.0)
    }
}
