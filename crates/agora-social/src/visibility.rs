//! Visibility evaluation
//!
//! Per-read authorization decisions over content. Decisions are never
//! cached: membership can change at any time and a stale grant would leak
//! content. Every check is O(1) over the membership tables.
//!
//! The `city` tier checks membership of the exact owning community, not the
//! ancestor chain — the narrower rule captured from the source policy.

use agora_core::errors::{AgoraError, AgoraResult};
use agora_core::identifiers::{CommentId, CommunityId, PostId, UserId};

use crate::content::{Post, Visibility};
use crate::state::{SocialState, SocialStore};

/// Read/write/moderate authorization decisions.
#[derive(Debug, Clone)]
pub struct VisibilityEvaluator {
    store: SocialStore,
}

impl VisibilityEvaluator {
    pub(crate) fn new(store: SocialStore) -> Self {
        Self { store }
    }

    /// Whether `principal` may read the post.
    pub fn can_read_post(&self, principal: UserId, post: PostId) -> AgoraResult<bool> {
        let state = self.store.state.read();
        let record = state
            .posts
            .get(&post)
            .ok_or_else(|| AgoraError::not_found(format!("post {post}")))?;
        Ok(evaluate_read(&state, principal, record))
    }

    /// Whether `principal` may read the comment (the parent post's rule).
    pub fn can_read_comment(&self, principal: UserId, comment: CommentId) -> AgoraResult<bool> {
        let state = self.store.state.read();
        let record = state
            .comments
            .get(&comment)
            .ok_or_else(|| AgoraError::not_found(format!("comment {comment}")))?;
        let parent = state.posts.get(&record.post).ok_or_else(|| {
            AgoraError::consistency_fault(format!(
                "comment {comment} referenced missing post {}",
                record.post
            ))
        })?;
        Ok(evaluate_read(&state, principal, parent))
    }

    /// Whether `principal` may update or delete the post. Author only;
    /// creation is open to any authenticated principal.
    pub fn can_write_post(&self, principal: UserId, post: PostId) -> AgoraResult<bool> {
        let state = self.store.state.read();
        let record = state
            .posts
            .get(&post)
            .ok_or_else(|| AgoraError::not_found(format!("post {post}")))?;
        Ok(record.author == principal)
    }

    /// Whether `principal` is a moderator of `community`. Gates community
    /// metadata updates and election initiation.
    pub fn can_moderate_community(
        &self,
        principal: UserId,
        community: CommunityId,
    ) -> AgoraResult<bool> {
        let state = self.store.state.read();
        if !state.communities.contains_key(&community) {
            return Err(AgoraError::not_found(format!("community {community}")));
        }
        Ok(state
            .moderators
            .get(&community)
            .is_some_and(|set| set.contains(&principal)))
    }
}

/// The visibility rule, in precedence order. Exhaustive over the tier enum
/// so a new tier is a compile-time-checked change at this decision point.
pub(crate) fn evaluate_read(state: &SocialState, principal: UserId, post: &Post) -> bool {
    match post.visibility {
        Visibility::Public => true,
        // Exact owning community, not the ancestor chain.
        Visibility::City => state.is_member(principal, post.community),
        Visibility::Local => state.is_member(principal, post.community),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::community::CommunityType;
    use agora_core::time::PhysicalTime;

    fn at(ms: u64) -> PhysicalTime {
        PhysicalTime::from_ms(ms)
    }

    fn user(seed: u8) -> UserId {
        UserId::new_from_entropy([seed; 32])
    }

    #[test]
    fn public_posts_need_no_membership() {
        let store = SocialStore::new();
        let community = store
            .graph()
            .create("C", CommunityType::City, None, at(1))
            .unwrap();
        let post = store
            .content()
            .create_post(user(1), community.id, Visibility::Public, "p", at(2))
            .unwrap();

        // A principal with no memberships anywhere.
        assert!(store
            .visibility()
            .can_read_post(user(9), post.id)
            .unwrap());
    }

    #[test]
    fn city_visibility_is_exact_owning_community() {
        let store = SocialStore::new();
        let graph = store.graph();
        let city = graph
            .create("Springfield", CommunityType::City, None, at(1))
            .unwrap();
        let other = graph
            .create("Shelbyville", CommunityType::City, None, at(1))
            .unwrap();
        let local = graph
            .create("Elm Street", CommunityType::Local, Some(city.id), at(2))
            .unwrap();

        let post = store
            .content()
            .create_post(user(1), city.id, Visibility::City, "p", at(3))
            .unwrap();

        let member = user(2);
        let unrelated = user(3);
        let descendant_member = user(4);
        store
            .membership()
            .follow_community(member, city.id, at(4))
            .unwrap();
        store
            .membership()
            .follow_community(unrelated, other.id, at(4))
            .unwrap();
        store
            .membership()
            .follow_community(descendant_member, local.id, at(4))
            .unwrap();

        let visibility = store.visibility();
        assert!(visibility.can_read_post(member, post.id).unwrap());
        assert!(!visibility.can_read_post(unrelated, post.id).unwrap());
        // Exact-match rule: membership of a descendant community does not
        // grant access to the owning community's city-scoped posts.
        assert!(!visibility.can_read_post(descendant_member, post.id).unwrap());
    }

    #[test]
    fn local_visibility_is_exact_match() {
        let store = SocialStore::new();
        let community = store
            .graph()
            .create("L", CommunityType::Local, None, at(1))
            .unwrap();
        let post = store
            .content()
            .create_post(user(1), community.id, Visibility::Local, "p", at(2))
            .unwrap();

        let visibility = store.visibility();
        assert!(!visibility.can_read_post(user(2), post.id).unwrap());
        store
            .membership()
            .follow_community(user(2), community.id, at(3))
            .unwrap();
        assert!(visibility.can_read_post(user(2), post.id).unwrap());
    }

    #[test]
    fn revoked_membership_revokes_access_immediately() {
        let store = SocialStore::new();
        let community = store
            .graph()
            .create("L", CommunityType::Local, None, at(1))
            .unwrap();
        let post = store
            .content()
            .create_post(user(1), community.id, Visibility::Local, "p", at(2))
            .unwrap();
        store
            .membership()
            .follow_community(user(2), community.id, at(3))
            .unwrap();
        assert!(store.visibility().can_read_post(user(2), post.id).unwrap());

        store
            .membership()
            .unfollow_community(user(2), community.id)
            .unwrap();
        assert!(!store.visibility().can_read_post(user(2), post.id).unwrap());
    }

    #[test]
    fn comments_inherit_parent_post_visibility() {
        let store = SocialStore::new();
        let community = store
            .graph()
            .create("L", CommunityType::Local, None, at(1))
            .unwrap();
        let author = user(1);
        store
            .membership()
            .follow_community(author, community.id, at(2))
            .unwrap();
        let post = store
            .content()
            .create_post(author, community.id, Visibility::Local, "p", at(3))
            .unwrap();
        let comment = store
            .content()
            .create_comment(author, post.id, "c", at(4))
            .unwrap();

        let visibility = store.visibility();
        assert!(visibility.can_read_comment(author, comment.id).unwrap());
        assert!(!visibility.can_read_comment(user(2), comment.id).unwrap());
    }

    #[test]
    fn write_is_author_only() {
        let store = SocialStore::new();
        let community = store
            .graph()
            .create("C", CommunityType::City, None, at(1))
            .unwrap();
        let post = store
            .content()
            .create_post(user(1), community.id, Visibility::Public, "p", at(2))
            .unwrap();

        let visibility = store.visibility();
        assert!(visibility.can_write_post(user(1), post.id).unwrap());
        assert!(!visibility.can_write_post(user(2), post.id).unwrap());
    }
}
