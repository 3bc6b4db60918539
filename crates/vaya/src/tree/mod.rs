//! The family-tree graph editor.
//!
//! This module owns the in-memory node/edge collections behind an explicit
//! interface: add/remove members, connect/disconnect relationships, annotate
//! story counters, and query structure. All mutation goes through methods
//! that uphold two invariants:
//!
//! - every relationship endpoint references an existing member, and
//! - at most one relationship exists per unordered member pair.
//!
//! Validation failures abort the operation with no partial state change.

pub mod member;
pub mod relationship;

use tracing::{debug, info};

use crate::error::{Error, Result};

pub use member::{Member, MemberId, MemberSpec, Position};
pub use relationship::{Relationship, RelationshipCounters, RelationshipId, RelationshipKind};

/// An in-memory family tree: members plus the relationships between them.
///
/// Insertion order is preserved for both collections; the deprecated
/// latest-removal methods rely on it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FamilyTree {
    members: Vec<Member>,
    relationships: Vec<Relationship>,
}

impl FamilyTree {
    /// Create an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a tree from previously stored parts.
    ///
    /// # Errors
    ///
    /// Returns an error if any relationship references a member that is not
    /// in `members`, or if two relationships cover the same unordered pair.
    pub fn from_parts(members: Vec<Member>, relationships: Vec<Relationship>) -> Result<Self> {
        let tree = Self {
            members,
            relationships,
        };
        for (i, rel) in tree.relationships.iter().enumerate() {
            if tree.member(&rel.source).is_none() {
                return Err(Error::member_not_found(rel.source.as_str()));
            }
            if tree.member(&rel.target).is_none() {
                return Err(Error::member_not_found(rel.target.as_str()));
            }
            if tree.relationships[..i]
                .iter()
                .any(|other| other.connects(&rel.source, &rel.target))
            {
                return Err(Error::duplicate_connection(
                    rel.source.as_str(),
                    rel.target.as_str(),
                ));
            }
        }
        Ok(tree)
    }

    // === Member operations ===

    /// Add a member to the tree.
    ///
    /// Returns the id of the new member.
    ///
    /// # Errors
    ///
    /// Returns an error if the spec's name or role is blank.
    pub fn add_member(&mut self, spec: MemberSpec) -> Result<MemberId> {
        let member = spec.build()?;
        let id = member.id.clone();
        info!("Added member '{}' ({})", member.name, id);
        self.members.push(member);
        Ok(id)
    }

    /// Add several members at once, as after a spreadsheet import.
    ///
    /// All specs are validated before any member is inserted, so a bad row
    /// leaves the tree unchanged. Duplicate names are not checked.
    ///
    /// # Errors
    ///
    /// Returns an error if any spec's name or role is blank.
    pub fn add_members(&mut self, specs: Vec<MemberSpec>) -> Result<Vec<MemberId>> {
        let members = specs
            .into_iter()
            .map(MemberSpec::build)
            .collect::<Result<Vec<_>>>()?;
        let ids = members.iter().map(|m| m.id.clone()).collect();
        info!("Added {} members", members.len());
        self.members.extend(members);
        Ok(ids)
    }

    /// Remove a member and every relationship that touches it.
    ///
    /// Returns the removed member.
    ///
    /// # Errors
    ///
    /// Returns an error if the id is unknown.
    pub fn remove_member(&mut self, id: &MemberId) -> Result<Member> {
        let index = self
            .members
            .iter()
            .position(|m| &m.id == id)
            .ok_or_else(|| Error::member_not_found(id.as_str()))?;

        let member = self.members.remove(index);
        let before = self.relationships.len();
        self.relationships.retain(|rel| !rel.touches(id));
        debug!(
            "Removed member '{}' and {} incident connection(s)",
            member.name,
            before - self.relationships.len()
        );
        Ok(member)
    }

    /// Remove whichever member was added last.
    ///
    /// Kept for compatibility with the legacy no-id removal path; it targets
    /// the most recently added member, which is rarely what the user meant.
    ///
    /// # Errors
    ///
    /// Returns a "nothing to remove" error on an empty tree.
    #[deprecated(note = "pass an explicit member id to remove_member instead")]
    pub fn remove_latest_member(&mut self) -> Result<Member> {
        let id = self
            .members
            .last()
            .map(|m| m.id.clone())
            .ok_or(Error::NothingToRemove { what: "members" })?;
        self.remove_member(&id)
    }

    // === Relationship operations ===

    /// Connect two members with a relationship of the given kind.
    ///
    /// The pair may hold at most one relationship, checked in both
    /// directions regardless of kind. A `Child` kind swaps the endpoints so
    /// the stored edge always points parent→child. Returns the id of the
    /// new relationship.
    ///
    /// # Errors
    ///
    /// Returns an error if either member is unknown, if the endpoints are
    /// the same member, or if the pair is already connected.
    pub fn connect(
        &mut self,
        source: &MemberId,
        target: &MemberId,
        kind: RelationshipKind,
    ) -> Result<RelationshipId> {
        if self.member(source).is_none() {
            return Err(Error::member_not_found(source.as_str()));
        }
        if self.member(target).is_none() {
            return Err(Error::member_not_found(target.as_str()));
        }
        if source == target {
            return Err(Error::SelfConnection {
                id: source.to_string(),
            });
        }
        if self.connection_between(source, target).is_some() {
            return Err(Error::duplicate_connection(
                source.as_str(),
                target.as_str(),
            ));
        }

        let rel = Relationship::new(source.clone(), target.clone(), kind);
        let id = rel.id.clone();
        info!("Connected {} -> {} as {}", rel.source, rel.target, rel.kind);
        self.relationships.push(rel);
        Ok(id)
    }

    /// Remove a relationship by id.
    ///
    /// Returns the removed relationship.
    ///
    /// # Errors
    ///
    /// Returns an error if the id is unknown.
    pub fn remove_connection(&mut self, id: &RelationshipId) -> Result<Relationship> {
        let index = self
            .relationships
            .iter()
            .position(|rel| &rel.id == id)
            .ok_or_else(|| Error::connection_not_found(id.as_str()))?;
        let rel = self.relationships.remove(index);
        debug!("Removed connection {}", rel.id);
        Ok(rel)
    }

    /// Remove whichever relationship was added last.
    ///
    /// Same legacy pattern as [`FamilyTree::remove_latest_member`].
    ///
    /// # Errors
    ///
    /// Returns a "nothing to remove" error when there are no relationships.
    #[deprecated(note = "pass an explicit relationship id to remove_connection instead")]
    pub fn remove_latest_connection(&mut self) -> Result<Relationship> {
        let id = self
            .relationships
            .last()
            .map(|rel| rel.id.clone())
            .ok_or(Error::NothingToRemove {
                what: "connections",
            })?;
        self.remove_connection(&id)
    }

    // === Story-count annotation ===

    /// Merge story counters into a member without touching position or
    /// identity.
    ///
    /// # Errors
    ///
    /// Returns an error if the id is unknown.
    pub fn update_member_stories(
        &mut self,
        id: &MemberId,
        count: u32,
        has_new: bool,
    ) -> Result<()> {
        let member = self
            .members
            .iter_mut()
            .find(|m| &m.id == id)
            .ok_or_else(|| Error::member_not_found(id.as_str()))?;
        member.story_count = count;
        member.has_new_stories = has_new;
        Ok(())
    }

    /// Merge the shared-story counter into the relationship connecting the
    /// unordered pair (a, b).
    ///
    /// # Errors
    ///
    /// Returns an error if no relationship connects the pair.
    pub fn update_shared_stories(&mut self, a: &MemberId, b: &MemberId, count: u32) -> Result<()> {
        let rel = self
            .relationships
            .iter_mut()
            .find(|rel| rel.connects(a, b))
            .ok_or_else(|| Error::connection_not_found(format!("{a}<->{b}")))?;
        rel.counters.shared_stories = count;
        Ok(())
    }

    /// Move a member to a new canvas position, as after a drag.
    ///
    /// # Errors
    ///
    /// Returns an error if the id is unknown.
    pub fn set_position(&mut self, id: &MemberId, position: Position) -> Result<()> {
        let member = self
            .members
            .iter_mut()
            .find(|m| &m.id == id)
            .ok_or_else(|| Error::member_not_found(id.as_str()))?;
        member.position = position;
        Ok(())
    }

    // === Queries ===

    /// Look up a member by id.
    #[must_use]
    pub fn member(&self, id: &MemberId) -> Option<&Member> {
        self.members.iter().find(|m| &m.id == id)
    }

    /// All members, in insertion order.
    #[must_use]
    pub fn members(&self) -> &[Member] {
        &self.members
    }

    /// All relationships, in insertion order.
    #[must_use]
    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    /// Look up a relationship by id.
    #[must_use]
    pub fn relationship(&self, id: &RelationshipId) -> Option<&Relationship> {
        self.relationships.iter().find(|rel| &rel.id == id)
    }

    /// The relationship connecting the unordered pair (a, b), if any.
    #[must_use]
    pub fn connection_between(&self, a: &MemberId, b: &MemberId) -> Option<&Relationship> {
        self.relationships.iter().find(|rel| rel.connects(a, b))
    }

    /// Every relationship touching the given member.
    #[must_use]
    pub fn relationships_of(&self, id: &MemberId) -> Vec<&Relationship> {
        self.relationships
            .iter()
            .filter(|rel| rel.touches(id))
            .collect()
    }

    /// The first-found parent of a member: the source of the first parent
    /// edge whose target is the member. Additional parents are ignored.
    #[must_use]
    pub fn parent_of(&self, id: &MemberId) -> Option<&MemberId> {
        self.relationships
            .iter()
            .find(|rel| rel.is_direct_lineage() && &rel.target == id)
            .map(|rel| &rel.source)
    }

    /// The first-found spouse of a member. Additional spouses are ignored.
    #[must_use]
    pub fn spouse_of(&self, id: &MemberId) -> Option<&MemberId> {
        self.relationships
            .iter()
            .find(|rel| rel.is_dashed() && rel.touches(id))
            .and_then(|rel| rel.other_end(id))
    }

    /// Number of members in the tree.
    #[must_use]
    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Number of relationships in the tree.
    #[must_use]
    pub fn relationship_count(&self) -> usize {
        self.relationships.len()
    }

    /// Whether the tree has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}
