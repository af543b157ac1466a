//! Shared store state
//!
//! All tables live behind a single `parking_lot::RwLock`. A write-lock
//! critical section is the transactional unit of the core: conditional
//! inserts and their counter adjustments happen inside one section, so no
//! reader can observe an acknowledged edge without its counter contribution.
//!
//! Component views ([`CommunityGraph`](crate::CommunityGraph),
//! [`MembershipStore`](crate::MembershipStore), ...) are cheap handles that
//! share the same state and event sink.

use agora_core::events::{DomainEvent, EventSink, NullSink};
use agora_core::identifiers::{CommentId, CommunityId, PostId, UserId};
use agora_core::time::PhysicalTime;
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use crate::community::{Community, CommunityGraph};
use crate::content::{Comment, ContentStore, Post};
use crate::counters::{CounterDivergence, CounterMaintainer};
use crate::membership::MembershipStore;
use crate::messaging::{Message, MessagingGate};
use crate::visibility::VisibilityEvaluator;

/// Ground-truth tables for the social core.
///
/// Edge sets are authoritative; the counters cached on [`Community`] and
/// [`Post`] records are re-derivable from them at any time.
#[derive(Debug, Default)]
pub(crate) struct SocialState {
    /// Community records, keyed by id
    pub(crate) communities: HashMap<CommunityId, Community>,
    /// Membership edges: community -> follower -> created_at
    pub(crate) members: HashMap<CommunityId, BTreeMap<UserId, PhysicalTime>>,
    /// User follow edges: follower -> followee -> created_at
    pub(crate) user_follows: HashMap<UserId, BTreeMap<UserId, PhysicalTime>>,
    /// Post records, keyed by id
    pub(crate) posts: HashMap<PostId, Post>,
    /// Comment records, keyed by id
    pub(crate) comments: HashMap<CommentId, Comment>,
    /// Like edges: post -> user -> created_at
    pub(crate) likes: HashMap<PostId, BTreeMap<UserId, PhysicalTime>>,
    /// Accepted direct messages, in acceptance order
    pub(crate) messages: Vec<Message>,
    /// Moderator sets per community
    pub(crate) moderators: HashMap<CommunityId, BTreeSet<UserId>>,
}

impl SocialState {
    /// Whether `user` holds a membership edge to `community`.
    pub(crate) fn is_member(&self, user: UserId, community: CommunityId) -> bool {
        self.members
            .get(&community)
            .is_some_and(|edges| edges.contains_key(&user))
    }

    /// Whether `follower` holds a follow edge to `followee`.
    pub(crate) fn follows(&self, follower: UserId, followee: UserId) -> bool {
        self.user_follows
            .get(&follower)
            .is_some_and(|edges| edges.contains_key(&followee))
    }
}

/// Handle to the social core.
///
/// Cloning is cheap; all clones share the same state and sink.
#[derive(Clone)]
pub struct SocialStore {
    pub(crate) state: Arc<RwLock<SocialState>>,
    pub(crate) sink: Arc<dyn EventSink>,
}

impl SocialStore {
    /// Create an empty store that discards events.
    pub fn new() -> Self {
        Self::with_sink(Arc::new(NullSink))
    }

    /// Create an empty store emitting events to `sink`.
    pub fn with_sink(sink: Arc<dyn EventSink>) -> Self {
        Self {
            state: Arc::new(RwLock::new(SocialState::default())),
            sink,
        }
    }

    /// Community hierarchy operations.
    pub fn graph(&self) -> CommunityGraph {
        CommunityGraph::new(self.clone())
    }

    /// Membership edge operations.
    pub fn membership(&self) -> MembershipStore {
        MembershipStore::new(self.clone())
    }

    /// Post, comment, and like operations.
    pub fn content(&self) -> ContentStore {
        ContentStore::new(self.clone())
    }

    /// Read/write/moderate authorization decisions.
    pub fn visibility(&self) -> VisibilityEvaluator {
        VisibilityEvaluator::new(self.clone())
    }

    /// Direct-message gating.
    pub fn messaging(&self) -> MessagingGate {
        MessagingGate::new(self.clone())
    }

    /// Recount every cached counter from its backing edge set and repair any
    /// divergence, returning a report of what was repaired.
    ///
    /// Restart/recovery entry point: the edge sets are ground truth, the
    /// counters are caches. A non-empty report indicates a bug and is
    /// logged at `error!` by the maintainer.
    pub fn reconcile_counters(&self) -> Vec<CounterDivergence> {
        let mut state = self.state.write();
        CounterMaintainer::reconcile(&mut state)
    }

    pub(crate) fn emit(&self, event: DomainEvent) {
        self.sink.emit(event);
    }
}

impl Default for SocialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SocialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("SocialStore")
            .field("communities", &state.communities.len())
            .field("posts", &state.posts.len())
            .field("messages", &state.messages.len())
            .finish()
    }
}
