//! Agora Core - Foundation Types
//!
//! This crate provides the shared foundation for the Agora community network
//! core: identifier newtypes, physical time, the unified error type, domain
//! events, and the directory traits that feature crates implement.
//!
//! # Architecture
//!
//! `agora-core` is the leaf crate of the workspace. It has no
//! intra-workspace dependencies and contains no business logic:
//!
//! - `agora-social` implements the community graph, membership store,
//!   counter maintenance, visibility evaluation, and messaging gate on top
//!   of these types.
//! - `agora-elections` implements moderator election rounds against the
//!   [`ModeratorDirectory`] trait defined here.
//!
//! # Time discipline
//!
//! There is no ambient clock in this crate or its consumers. Every
//! time-dependent operation takes an explicit [`PhysicalTime`], which keeps
//! the core deterministic and directly testable.

#![forbid(unsafe_code)]

pub mod directory;
pub mod errors;
pub mod events;
pub mod identifiers;
pub mod time;

pub use directory::ModeratorDirectory;
pub use errors::{AgoraError, AgoraResult, ErrorKind};
pub use events::{DomainEvent, EventSink, MemorySink, NullSink};
pub use identifiers::{CommentId, CommunityId, MessageId, PostId, RoundId, UserId};
pub use time::PhysicalTime;
