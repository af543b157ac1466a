//! Community hierarchy
//!
//! Communities form a parent-linked hierarchy (city → municipality →
//! local). Acyclicity is the only hard-enforced structural invariant; tier
//! ordering is a provisioning convention, not a store-level rule.

use agora_core::errors::{AgoraError, AgoraResult};
use agora_core::identifiers::{CommunityId, UserId};
use agora_core::time::PhysicalTime;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

use crate::state::{SocialState, SocialStore};

/// Tier of a community in the hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommunityType {
    /// Top-level city community
    City,
    /// Mid-tier municipality
    Municipality,
    /// Local community, the narrowest tier
    Local,
}

impl std::fmt::Display for CommunityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::City => write!(f, "city"),
            Self::Municipality => write!(f, "municipality"),
            Self::Local => write!(f, "local"),
        }
    }
}

/// A community record.
///
/// `member_count` is a cached derived value, always recomputable from the
/// membership edge set (see [`crate::CounterMaintainer`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Community {
    /// Unique identifier
    pub id: CommunityId,
    /// Human-readable name
    pub name: String,
    /// Hierarchy tier
    pub community_type: CommunityType,
    /// Immediate parent, if any
    pub parent: Option<CommunityId>,
    /// Cover image URL handed over by blob storage; opaque here
    pub cover_url: Option<String>,
    /// Cached count of active membership edges targeting this community
    pub member_count: u64,
    /// Creation time
    pub created_at: PhysicalTime,
}

/// Metadata fields a moderator may update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommunityUpdate {
    /// New display name
    pub name: Option<String>,
    /// New cover image URL
    pub cover_url: Option<String>,
}

/// Hierarchy operations over community records.
///
/// All reads are side-effect free and cost at most one walk up the parent
/// chain.
#[derive(Debug, Clone)]
pub struct CommunityGraph {
    store: SocialStore,
}

impl CommunityGraph {
    pub(crate) fn new(store: SocialStore) -> Self {
        Self { store }
    }

    /// Create a community, optionally under `parent`.
    ///
    /// Fails with `NotFound` for a dangling parent. The cycle guard is
    /// unreachable for a freshly minted id (re-parenting is unsupported)
    /// but kept so the invariant holds if that ever changes.
    pub fn create(
        &self,
        name: impl Into<String>,
        community_type: CommunityType,
        parent: Option<CommunityId>,
        at: PhysicalTime,
    ) -> AgoraResult<Community> {
        let id = CommunityId::generate();
        let mut state = self.store.state.write();

        if let Some(parent_id) = parent {
            if !state.communities.contains_key(&parent_id) {
                return Err(AgoraError::not_found(format!(
                    "parent community {parent_id}"
                )));
            }
            if ancestor_chain(&state, parent_id)?.contains(&id) {
                return Err(AgoraError::CycleDetected { community: id });
            }
        }

        let community = Community {
            id,
            name: name.into(),
            community_type,
            parent,
            cover_url: None,
            member_count: 0,
            created_at: at,
        };
        state.communities.insert(id, community.clone());
        debug!(%id, tier = %community_type, "community created");
        Ok(community)
    }

    /// Fetch a community record by id.
    pub fn get(&self, id: CommunityId) -> AgoraResult<Community> {
        let state = self.store.state.read();
        state
            .communities
            .get(&id)
            .cloned()
            .ok_or_else(|| AgoraError::not_found(format!("community {id}")))
    }

    /// Ancestors of `id`, ordered from immediate parent to root.
    pub fn ancestors_of(&self, id: CommunityId) -> AgoraResult<Vec<Community>> {
        let state = self.store.state.read();
        if !state.communities.contains_key(&id) {
            return Err(AgoraError::not_found(format!("community {id}")));
        }
        let chain = ancestor_chain(&state, id)?;
        Ok(chain
            .into_iter()
            .filter_map(|ancestor| state.communities.get(&ancestor).cloned())
            .collect())
    }

    /// Whether `a` is a descendant of `b` (strictly: `a != b`).
    pub fn is_descendant(&self, a: CommunityId, b: CommunityId) -> AgoraResult<bool> {
        let state = self.store.state.read();
        if !state.communities.contains_key(&a) {
            return Err(AgoraError::not_found(format!("community {a}")));
        }
        Ok(ancestor_chain(&state, a)?.contains(&b))
    }

    /// Update community metadata. Moderators only.
    pub fn update_metadata(
        &self,
        principal: UserId,
        id: CommunityId,
        update: CommunityUpdate,
    ) -> AgoraResult<Community> {
        let mut state = self.store.state.write();
        if !state.communities.contains_key(&id) {
            return Err(AgoraError::not_found(format!("community {id}")));
        }
        let is_moderator = state
            .moderators
            .get(&id)
            .is_some_and(|set| set.contains(&principal));
        if !is_moderator {
            return Err(AgoraError::not_authorized(format!(
                "{principal} is not a moderator of {id}"
            )));
        }
        let community = state
            .communities
            .get_mut(&id)
            .ok_or_else(|| AgoraError::not_found(format!("community {id}")))?;
        if let Some(name) = update.name {
            community.name = name;
        }
        if let Some(cover_url) = update.cover_url {
            community.cover_url = Some(cover_url);
        }
        Ok(community.clone())
    }
}

/// Walk the parent chain of `id`, excluding `id` itself.
///
/// A revisited node means the stored hierarchy is corrupt, which normal use
/// cannot produce; surfaced as a `ConsistencyFault`.
pub(crate) fn ancestor_chain(
    state: &SocialState,
    id: CommunityId,
) -> AgoraResult<Vec<CommunityId>> {
    let mut chain = Vec::new();
    let mut seen: HashSet<CommunityId> = HashSet::from([id]);
    let mut cursor = state.communities.get(&id).and_then(|c| c.parent);

    while let Some(current) = cursor {
        if !seen.insert(current) {
            return Err(AgoraError::consistency_fault(format!(
                "cycle in community hierarchy at {current}"
            )));
        }
        chain.push(current);
        cursor = state.communities.get(&current).and_then(|c| c.parent);
    }
    Ok(chain)
}
