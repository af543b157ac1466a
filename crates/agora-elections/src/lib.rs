//! Agora Elections - Moderator Voting Rounds
//!
//! State machine per community: `NoActiveRound → RoundOpen → RoundClosed`.
//! Rounds are opened by a current moderator, accept at most one vote per
//! voter, and resolve deterministically on close: most votes wins, ties
//! break to the candidate whose first vote arrived earliest. The winner is
//! installed as a moderator through the
//! [`ModeratorDirectory`](agora_core::ModeratorDirectory) seam, so this
//! crate never touches the social store directly.
//!
//! Deadlines are self-enforced: `cast_vote` checks `now < end_time` itself
//! rather than relying on an out-of-band closer, so an unclosed round past
//! its deadline rejects votes exactly like a closed one.

#![forbid(unsafe_code)]

pub mod engine;

pub use engine::{ElectionEngine, ElectionRound, RoundOutcome, Vote};
