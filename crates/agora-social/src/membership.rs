//! Membership and follow edges
//!
//! Source of truth for "who follows what": user→community membership edges
//! and user→user follow edges. Uniqueness is enforced by conditional insert
//! inside the write lock, never read-then-write across lock boundaries, so
//! concurrent duplicate attempts cannot race past each other.
//!
//! Community follows drive `member_count` through
//! [`CounterMaintainer`](crate::CounterMaintainer) within the same critical
//! section; user follows have no counter side effects.

use agora_core::errors::{AgoraError, AgoraResult};
use agora_core::events::DomainEvent;
use agora_core::identifiers::{CommunityId, UserId};
use agora_core::time::PhysicalTime;
use tracing::debug;

use crate::counters::CounterMaintainer;
use crate::state::SocialStore;

/// Membership edge operations.
#[derive(Debug, Clone)]
pub struct MembershipStore {
    store: SocialStore,
}

impl MembershipStore {
    pub(crate) fn new(store: SocialStore) -> Self {
        Self { store }
    }

    /// Insert a membership edge from `user` to `community`.
    ///
    /// Duplicate edges are a hard `AlreadyExists` error, mirroring a
    /// uniqueness-constraint conflict; idempotent retry is the caller's
    /// choice. Emits `MembershipAdded` on success.
    pub fn follow_community(
        &self,
        user: UserId,
        community: CommunityId,
        at: PhysicalTime,
    ) -> AgoraResult<()> {
        {
            let mut state = self.store.state.write();
            if !state.communities.contains_key(&community) {
                return Err(AgoraError::not_found(format!("community {community}")));
            }
            let edges = state.members.entry(community).or_default();
            if edges.contains_key(&user) {
                return Err(AgoraError::already_exists(format!(
                    "membership edge {user} -> {community}"
                )));
            }
            edges.insert(user, at);
            let record = state
                .communities
                .get_mut(&community)
                .ok_or_else(|| AgoraError::not_found(format!("community {community}")))?;
            CounterMaintainer::on_membership_added(record);
            debug!(%user, %community, member_count = record.member_count, "membership added");
        }
        self.store.emit(DomainEvent::MembershipAdded {
            user,
            community,
            at,
        });
        Ok(())
    }

    /// Remove the membership edge from `user` to `community`.
    ///
    /// Missing edge is `NotFound`. Emits `MembershipRemoved` on success.
    pub fn unfollow_community(&self, user: UserId, community: CommunityId) -> AgoraResult<()> {
        {
            let mut state = self.store.state.write();
            if !state.communities.contains_key(&community) {
                return Err(AgoraError::not_found(format!("community {community}")));
            }
            let removed = state
                .members
                .get_mut(&community)
                .and_then(|edges| edges.remove(&user));
            if removed.is_none() {
                return Err(AgoraError::not_found(format!(
                    "membership edge {user} -> {community}"
                )));
            }
            let record = state
                .communities
                .get_mut(&community)
                .ok_or_else(|| AgoraError::not_found(format!("community {community}")))?;
            CounterMaintainer::on_membership_removed(record)?;
            debug!(%user, %community, member_count = record.member_count, "membership removed");
        }
        self.store
            .emit(DomainEvent::MembershipRemoved { user, community });
        Ok(())
    }

    /// Insert a follow edge from `follower` to `followee`.
    ///
    /// Self-follow is permitted; policing it is a caller-level concern.
    pub fn follow_user(
        &self,
        follower: UserId,
        followee: UserId,
        at: PhysicalTime,
    ) -> AgoraResult<()> {
        let mut state = self.store.state.write();
        let edges = state.user_follows.entry(follower).or_default();
        if edges.contains_key(&followee) {
            return Err(AgoraError::already_exists(format!(
                "follow edge {follower} -> {followee}"
            )));
        }
        edges.insert(followee, at);
        debug!(%follower, %followee, "user follow added");
        Ok(())
    }

    /// Remove the follow edge from `follower` to `followee`.
    pub fn unfollow_user(&self, follower: UserId, followee: UserId) -> AgoraResult<()> {
        let mut state = self.store.state.write();
        let removed = state
            .user_follows
            .get_mut(&follower)
            .and_then(|edges| edges.remove(&followee));
        if removed.is_none() {
            return Err(AgoraError::not_found(format!(
                "follow edge {follower} -> {followee}"
            )));
        }
        debug!(%follower, %followee, "user follow removed");
        Ok(())
    }

    /// Whether `user` holds a membership edge to `community`.
    pub fn is_member(&self, user: UserId, community: CommunityId) -> bool {
        self.store.state.read().is_member(user, community)
    }

    /// Whether `follower` follows `followee` (directed).
    pub fn follows(&self, follower: UserId, followee: UserId) -> bool {
        self.store.state.read().follows(follower, followee)
    }

    /// Whether both directed follow edges exist between `a` and `b`.
    pub fn is_mutual_follow(&self, a: UserId, b: UserId) -> bool {
        let state = self.store.state.read();
        state.follows(a, b) && state.follows(b, a)
    }

    /// Cached member count for `community`.
    pub fn member_count(&self, community: CommunityId) -> AgoraResult<u64> {
        let state = self.store.state.read();
        state
            .communities
            .get(&community)
            .map(|c| c.member_count)
            .ok_or_else(|| AgoraError::not_found(format!("community {community}")))
    }
}
