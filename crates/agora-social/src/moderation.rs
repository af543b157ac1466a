//! Moderator set
//!
//! One entry per (community, user). Entries are produced by election
//! resolution or administrative action through the privileged
//! [`ModeratorDirectory`] paths; there is no caller-scoped route to a
//! grant. Callers query moderator status through
//! [`VisibilityEvaluator::can_moderate_community`](crate::VisibilityEvaluator::can_moderate_community).

use agora_core::directory::ModeratorDirectory;
use agora_core::errors::{AgoraError, AgoraResult};
use agora_core::identifiers::{CommunityId, UserId};
use tracing::info;

use crate::state::SocialStore;

impl SocialStore {
    /// Current moderators of `community`, in stable order.
    pub fn moderators_of(&self, community: CommunityId) -> AgoraResult<Vec<UserId>> {
        let state = self.state.read();
        if !state.communities.contains_key(&community) {
            return Err(AgoraError::not_found(format!("community {community}")));
        }
        Ok(state
            .moderators
            .get(&community)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default())
    }

    /// Remove `user` from the moderator set. Privileged administrative
    /// path, same contract as [`ModeratorDirectory::grant_moderator`]:
    /// never routed through caller-supplied authorization.
    pub fn revoke_moderator(&self, community: CommunityId, user: UserId) -> AgoraResult<()> {
        let mut state = self.state.write();
        if !state.communities.contains_key(&community) {
            return Err(AgoraError::not_found(format!("community {community}")));
        }
        let removed = state
            .moderators
            .get_mut(&community)
            .is_some_and(|set| set.remove(&user));
        if !removed {
            return Err(AgoraError::not_found(format!(
                "moderator entry {user} in {community}"
            )));
        }
        info!(%user, %community, "moderator revoked");
        Ok(())
    }
}

impl ModeratorDirectory for SocialStore {
    fn is_moderator(&self, user: UserId, community: CommunityId) -> bool {
        self.state
            .read()
            .moderators
            .get(&community)
            .is_some_and(|set| set.contains(&user))
    }

    fn grant_moderator(&self, community: CommunityId, user: UserId) -> AgoraResult<()> {
        let mut state = self.state.write();
        if !state.communities.contains_key(&community) {
            return Err(AgoraError::not_found(format!("community {community}")));
        }
        let inserted = state.moderators.entry(community).or_default().insert(user);
        if inserted {
            info!(%user, %community, "moderator granted");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::community::CommunityType;
    use agora_core::errors::ErrorKind;
    use agora_core::time::PhysicalTime;

    fn user(seed: u8) -> UserId {
        UserId::new_from_entropy([seed; 32])
    }

    #[test]
    fn grant_is_idempotent_set_insert() {
        let store = SocialStore::new();
        let community = store
            .graph()
            .create("C", CommunityType::City, None, PhysicalTime::from_ms(1))
            .unwrap();

        store.grant_moderator(community.id, user(1)).unwrap();
        store.grant_moderator(community.id, user(1)).unwrap();
        assert_eq!(store.moderators_of(community.id).unwrap(), vec![user(1)]);
        assert!(store.is_moderator(user(1), community.id));
        assert!(!store.is_moderator(user(2), community.id));
    }

    #[test]
    fn grant_to_missing_community_fails() {
        let store = SocialStore::new();
        let err = store
            .grant_moderator(CommunityId::generate(), user(1))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn revoke_removes_the_entry() {
        let store = SocialStore::new();
        let community = store
            .graph()
            .create("C", CommunityType::City, None, PhysicalTime::from_ms(1))
            .unwrap();
        store.grant_moderator(community.id, user(1)).unwrap();

        store.revoke_moderator(community.id, user(1)).unwrap();
        assert!(!store.is_moderator(user(1), community.id));
        let err = store.revoke_moderator(community.id, user(1)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
