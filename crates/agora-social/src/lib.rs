//! Agora Social - Community Graph and Content Authorization
//!
//! Authorization and consistency core for a community-structured social
//! network. This crate owns:
//!
//! - [`CommunityGraph`]: hierarchical communities (city → municipality →
//!   local) with ancestry queries and acyclicity enforcement
//! - [`MembershipStore`]: user→community and user→user follow edges, the
//!   ground truth for every visibility grant
//! - [`CounterMaintainer`]: cached `member_count` / `likes_count` /
//!   `comments_count` kept consistent inside the mutating critical section
//! - [`ContentStore`]: post, comment, and like lifecycle
//! - [`VisibilityEvaluator`]: per-read access decisions over visibility
//!   tiers, never cached
//! - [`MessagingGate`]: asymmetric reciprocal-consent direct messaging
//! - The moderator set, including the privileged
//!   [`ModeratorDirectory`](agora_core::ModeratorDirectory) implementation
//!   used by `agora-elections`
//!
//! # Consistency model
//!
//! All tables sit behind one `RwLock`; a write-lock critical section is the
//! transactional unit. Uniqueness invariants (one membership edge per pair,
//! one like per pair) are enforced by conditional insert inside that
//! section, and every counter adjustment lands in the same section as its
//! triggering edge mutation. Counters are caches: `reconcile_counters`
//! recomputes them from the edge sets after a restart.
//!
//! # Example
//!
//! ```
//! use agora_core::{PhysicalTime, UserId};
//! use agora_social::{CommunityType, SocialStore, Visibility};
//!
//! let store = SocialStore::new();
//! let at = PhysicalTime::from_ms(1_700_000_000_000);
//!
//! let city = store.graph().create("Springfield", CommunityType::City, None, at)?;
//! let author = UserId::new_from_entropy([1u8; 32]);
//! let reader = UserId::new_from_entropy([2u8; 32]);
//!
//! let post = store
//!     .content()
//!     .create_post(author, city.id, Visibility::Local, "hello", at)?;
//! assert!(!store.visibility().can_read_post(reader, post.id)?);
//!
//! store.membership().follow_community(reader, city.id, at)?;
//! assert!(store.visibility().can_read_post(reader, post.id)?);
//! # Ok::<(), agora_core::AgoraError>(())
//! ```

#![forbid(unsafe_code)]

pub mod community;
pub mod content;
pub mod counters;
pub mod membership;
pub mod messaging;
pub mod moderation;
pub mod state;
pub mod visibility;

pub use community::{Community, CommunityGraph, CommunityType, CommunityUpdate};
pub use content::{Comment, ContentStore, Post, Visibility};
pub use counters::{CounterDivergence, CounterMaintainer, DivergedCounter};
pub use membership::MembershipStore;
pub use messaging::{Message, MessagingGate};
pub use state::SocialStore;
pub use visibility::VisibilityEvaluator;
