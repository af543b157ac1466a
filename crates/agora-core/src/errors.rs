//! Unified error type for the Agora core
//!
//! Every caller-facing operation returns [`AgoraResult`]; nothing in the
//! core panics or throws past the API boundary. Variants carry the
//! identifiers needed to act on the failure. [`ErrorKind`] classifies each
//! variant into the coarse classes callers branch on.
//!
//! [`ErrorKind::ConsistencyFault`] is the one class that indicates a broken
//! internal invariant rather than a rejected request; it is logged at
//! `error!` level at the detection site and should page an operator, never
//! be silently corrected.

use crate::identifiers::{CommunityId, RoundId, UserId};
use serde::{Deserialize, Serialize};

/// Result alias for all Agora core operations.
pub type AgoraResult<T> = Result<T, AgoraError>;

/// Coarse error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Visibility, ownership, or moderator check failed
    NotAuthorized,
    /// Referenced entity does not exist
    NotFound,
    /// Uniqueness constraint rejected a conditional insert
    AlreadyExists,
    /// Voter already has a vote in the round
    DuplicateVote,
    /// Operation attempted against an entity in the wrong lifecycle state
    InvalidState,
    /// Broken internal invariant; alerts operators
    ConsistencyFault,
}

/// Unified error type for Agora operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum AgoraError {
    /// Principal is not permitted to perform the operation.
    #[error("not authorized: {message}")]
    NotAuthorized {
        /// What was denied and why
        message: String,
    },

    /// Referenced entity does not exist.
    #[error("not found: {message}")]
    NotFound {
        /// What was looked up
        message: String,
    },

    /// A conditional insert hit an existing row.
    #[error("already exists: {message}")]
    AlreadyExists {
        /// The edge or record that already exists
        message: String,
    },

    /// Voter already voted in this round.
    #[error("voter {voter} already voted in {round}")]
    DuplicateVote {
        /// The round in question
        round: RoundId,
        /// The voter with an existing vote
        voter: UserId,
    },

    /// Round is closed or past its deadline.
    #[error("round {round} is not active")]
    RoundNotActive {
        /// The round in question
        round: RoundId,
    },

    /// A live election round already exists for the community.
    #[error("community {community} already has an active election round")]
    RoundAlreadyActive {
        /// The community in question
        community: CommunityId,
    },

    /// Attaching the parent would create a cycle in the community hierarchy.
    #[error("parent assignment would create a cycle at community {community}")]
    CycleDetected {
        /// The community whose parent chain would loop
        community: CommunityId,
    },

    /// Entity is in the wrong lifecycle state for the operation.
    #[error("invalid state: {message}")]
    InvalidState {
        /// What state was expected versus found
        message: String,
    },

    /// A derived counter and its backing edge set diverged.
    #[error("consistency fault: {message}")]
    ConsistencyFault {
        /// Description of the broken invariant
        message: String,
    },
}

impl AgoraError {
    /// Create a not-authorized error.
    pub fn not_authorized(message: impl Into<String>) -> Self {
        Self::NotAuthorized {
            message: message.into(),
        }
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create an already-exists error.
    pub fn already_exists(message: impl Into<String>) -> Self {
        Self::AlreadyExists {
            message: message.into(),
        }
    }

    /// Create an invalid-state error.
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    /// Create a consistency-fault error.
    pub fn consistency_fault(message: impl Into<String>) -> Self {
        Self::ConsistencyFault {
            message: message.into(),
        }
    }

    /// Classify this error into its coarse kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotAuthorized { .. } => ErrorKind::NotAuthorized,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            Self::DuplicateVote { .. } => ErrorKind::DuplicateVote,
            Self::RoundNotActive { .. }
            | Self::RoundAlreadyActive { .. }
            | Self::CycleDetected { .. }
            | Self::InvalidState { .. } => ErrorKind::InvalidState,
            Self::ConsistencyFault { .. } => ErrorKind::ConsistencyFault,
        }
    }

    /// Whether this error represents a broken internal invariant.
    pub fn is_consistency_fault(&self) -> bool {
        self.kind() == ErrorKind::ConsistencyFault
    }
}
