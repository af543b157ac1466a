//! Derived counter maintenance
//!
//! The source of truth for every count is an edge set (membership edges,
//! like edges, comment rows). The counters cached on [`Community`] and
//! [`Post`] records are adjusted here, synchronously, inside the same
//! write-lock critical section as the edge mutation that triggered them.
//!
//! A decrement that would underflow is a [`ConsistencyFault`]: normal use
//! cannot produce it, so it is logged at `error!` and surfaced to the
//! caller rather than clamped silently.
//!
//! [`ConsistencyFault`]: agora_core::ErrorKind::ConsistencyFault

use agora_core::errors::{AgoraError, AgoraResult};
use agora_core::identifiers::{CommunityId, PostId};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::community::Community;
use crate::content::Post;
use crate::state::SocialState;

/// Synchronous handlers adjusting cached counters.
///
/// These are the explicit form of what a relational schema would do with
/// row triggers: each handler runs inside the triggering mutation's
/// transactional unit.
pub struct CounterMaintainer;

impl CounterMaintainer {
    /// A membership edge targeting `community` was inserted.
    pub(crate) fn on_membership_added(community: &mut Community) {
        community.member_count += 1;
    }

    /// A membership edge targeting `community` was removed.
    pub(crate) fn on_membership_removed(community: &mut Community) -> AgoraResult<()> {
        community.member_count = checked_decrement(community.member_count, || {
            format!("member_count underflow on community {}", community.id)
        })?;
        Ok(())
    }

    /// A like edge targeting `post` was inserted.
    pub(crate) fn on_like_added(post: &mut Post) {
        post.likes_count += 1;
    }

    /// A like edge targeting `post` was removed.
    pub(crate) fn on_like_removed(post: &mut Post) -> AgoraResult<()> {
        post.likes_count = checked_decrement(post.likes_count, || {
            format!("likes_count underflow on post {}", post.id)
        })?;
        Ok(())
    }

    /// A comment was created under `post`.
    pub(crate) fn on_comment_created(post: &mut Post) {
        post.comments_count += 1;
    }

    /// A comment under `post` was deleted.
    pub(crate) fn on_comment_deleted(post: &mut Post) -> AgoraResult<()> {
        post.comments_count = checked_decrement(post.comments_count, || {
            format!("comments_count underflow on post {}", post.id)
        })?;
        Ok(())
    }

    /// Recompute every cached counter from its backing edge set, repairing
    /// and reporting divergences.
    pub(crate) fn reconcile(state: &mut SocialState) -> Vec<CounterDivergence> {
        let mut report = Vec::new();

        let member_counts: Vec<(CommunityId, u64)> = state
            .communities
            .keys()
            .map(|&id| {
                let actual = state.members.get(&id).map_or(0, |edges| edges.len() as u64);
                (id, actual)
            })
            .collect();
        for (id, actual) in member_counts {
            let Some(community) = state.communities.get_mut(&id) else {
                continue;
            };
            if community.member_count != actual {
                error!(
                    community = %id,
                    cached = community.member_count,
                    actual,
                    "member_count diverged from membership edge set"
                );
                report.push(CounterDivergence {
                    counter: DivergedCounter::MemberCount(id),
                    cached: community.member_count,
                    actual,
                });
                community.member_count = actual;
            }
        }

        let post_counts: Vec<(PostId, u64, u64)> = state
            .posts
            .keys()
            .map(|&id| {
                let likes = state.likes.get(&id).map_or(0, |edges| edges.len() as u64);
                let comments = state.comments.values().filter(|c| c.post == id).count() as u64;
                (id, likes, comments)
            })
            .collect();
        for (id, likes, comments) in post_counts {
            let Some(post) = state.posts.get_mut(&id) else {
                continue;
            };
            if post.likes_count != likes {
                error!(
                    post = %id,
                    cached = post.likes_count,
                    actual = likes,
                    "likes_count diverged from like edge set"
                );
                report.push(CounterDivergence {
                    counter: DivergedCounter::LikesCount(id),
                    cached: post.likes_count,
                    actual: likes,
                });
                post.likes_count = likes;
            }
            if post.comments_count != comments {
                error!(
                    post = %id,
                    cached = post.comments_count,
                    actual = comments,
                    "comments_count diverged from comment rows"
                );
                report.push(CounterDivergence {
                    counter: DivergedCounter::CommentsCount(id),
                    cached: post.comments_count,
                    actual: comments,
                });
                post.comments_count = comments;
            }
        }

        report
    }
}

fn checked_decrement(value: u64, describe: impl Fn() -> String) -> AgoraResult<u64> {
    match value.checked_sub(1) {
        Some(next) => Ok(next),
        None => {
            let message = describe();
            error!(%message, "counter underflow");
            Err(AgoraError::consistency_fault(message))
        }
    }
}

/// Which cached counter diverged during reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DivergedCounter {
    /// `Community.member_count`
    MemberCount(CommunityId),
    /// `Post.likes_count`
    LikesCount(PostId),
    /// `Post.comments_count`
    CommentsCount(PostId),
}

/// One repaired counter divergence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterDivergence {
    /// The counter that diverged
    pub counter: DivergedCounter,
    /// Value found in the cache
    pub cached: u64,
    /// Value recomputed from the edge set
    pub actual: u64,
}
