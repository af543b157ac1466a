//! Directory traits
//!
//! Seams between feature crates. The election engine validates initiators
//! and installs winners through [`ModeratorDirectory`] without depending on
//! the social store crate.

use crate::errors::AgoraResult;
use crate::identifiers::{CommunityId, UserId};

/// Moderator membership queries and grants.
///
/// Implemented by the social store. `grant_moderator` is the privileged
/// internal path: it performs no caller-scoped permission check and must
/// only be reached from system-initiated actions (election resolution,
/// administrative bootstrap), never from a caller-supplied identifier.
pub trait ModeratorDirectory: Send + Sync {
    /// Whether `user` is currently a moderator of `community`.
    fn is_moderator(&self, user: UserId, community: CommunityId) -> bool;

    /// Install `user` as a moderator of `community`.
    ///
    /// Idempotent: granting an existing moderator is a no-op. Fails with
    /// `NotFound` if the community does not exist.
    fn grant_moderator(&self, community: CommunityId, user: UserId) -> AgoraResult<()>;
}
