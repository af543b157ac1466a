//! Domain events
//!
//! Every acknowledged mutation in the core emits a [`DomainEvent`]. The
//! external notification layer subscribes through [`EventSink`]; delivery,
//! batching, and read/unread tracking are out of scope here. Events are
//! emitted after the mutating critical section commits, so a received event
//! always describes persisted state.

use crate::identifiers::{CommentId, CommunityId, MessageId, PostId, RoundId, UserId};
use crate::time::PhysicalTime;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Domain events emitted by the core stores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DomainEvent {
    /// A user followed a community.
    MembershipAdded {
        /// Follower
        user: UserId,
        /// Community followed
        community: CommunityId,
        /// Edge creation time
        at: PhysicalTime,
    },
    /// A user unfollowed a community.
    MembershipRemoved {
        /// Former follower
        user: UserId,
        /// Community unfollowed
        community: CommunityId,
    },
    /// A post was created.
    PostCreated {
        /// The new post
        post: PostId,
        /// Post author
        author: UserId,
        /// Owning community
        community: CommunityId,
    },
    /// A post was deleted by its author.
    PostDeleted {
        /// The deleted post
        post: PostId,
    },
    /// A comment was created under a post.
    CommentCreated {
        /// The new comment
        comment: CommentId,
        /// Parent post
        post: PostId,
        /// Comment author
        author: UserId,
    },
    /// A comment was deleted.
    CommentDeleted {
        /// The deleted comment
        comment: CommentId,
        /// Parent post
        post: PostId,
    },
    /// A user liked a post.
    LikeAdded {
        /// Liked post
        post: PostId,
        /// Liking user
        user: UserId,
    },
    /// A user removed their like from a post.
    LikeRemoved {
        /// Unliked post
        post: PostId,
        /// User removing the like
        user: UserId,
    },
    /// A direct message passed the gate and was accepted.
    MessageSent {
        /// The accepted message
        message: MessageId,
        /// Sending principal
        sender: UserId,
        /// Receiving principal
        receiver: UserId,
    },
    /// An election round was closed and resolved.
    RoundClosed {
        /// The closed round
        round: RoundId,
        /// Community the round belongs to
        community: CommunityId,
        /// Winning candidate, if any votes were cast
        winner: Option<UserId>,
    },
}

/// Sink for domain events.
///
/// Implementations must be cheap and non-blocking; stores emit synchronously
/// after their critical section commits.
pub trait EventSink: Send + Sync {
    /// Deliver one event.
    fn emit(&self, event: DomainEvent);
}

/// Sink that discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: DomainEvent) {}
}

/// Sink that records events in memory, in emission order.
///
/// Used by tests and by notification-layer adapters that drain in batches.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<DomainEvent>>,
}

impl MemorySink {
    /// Create an empty recording sink.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Snapshot the recorded events.
    pub fn events(&self) -> Vec<DomainEvent> {
        self.events.lock().clone()
    }

    /// Drain and return the recorded events.
    pub fn take(&self) -> Vec<DomainEvent> {
        std::mem::take(&mut self.events.lock())
    }
}

impl EventSink for MemorySink {
    fn emit(&self, event: DomainEvent) {
        self.events.lock().push(event);
    }
}
