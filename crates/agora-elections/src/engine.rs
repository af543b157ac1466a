//! Election engine
//!
//! Vote uniqueness per (round, voter) is enforced by conditional insert
//! inside the engine's write lock; a second attempt fails with
//! `DuplicateVote` and never overwrites the first choice.

use agora_core::directory::ModeratorDirectory;
use agora_core::errors::{AgoraError, AgoraResult};
use agora_core::events::{DomainEvent, EventSink, NullSink};
use agora_core::identifiers::{CommunityId, RoundId, UserId};
use agora_core::time::PhysicalTime;
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// An election round for one community.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionRound {
    /// Unique identifier
    pub id: RoundId,
    /// Community electing a moderator
    pub community: CommunityId,
    /// When the round opened
    pub start_time: PhysicalTime,
    /// Voting deadline; votes at or past this instant are rejected
    pub end_time: PhysicalTime,
    /// False once `close_round` has resolved the round
    pub is_active: bool,
}

impl ElectionRound {
    /// Whether the round accepts votes at `now`.
    pub fn accepts_votes_at(&self, now: PhysicalTime) -> bool {
        self.is_active && now < self.end_time
    }
}

/// One cast vote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    /// Round the vote belongs to
    pub round: RoundId,
    /// Voting principal
    pub voter: UserId,
    /// Chosen candidate
    pub candidate: UserId,
    /// When the vote was accepted
    pub created_at: PhysicalTime,
}

/// Resolution of a closed round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundOutcome {
    /// The resolved round
    pub round: RoundId,
    /// Community the round belongs to
    pub community: CommunityId,
    /// Winning candidate; `None` for a round with no votes
    pub winner: Option<UserId>,
    /// Vote totals per candidate, in first-vote order
    pub tally: Vec<(UserId, u64)>,
}

#[derive(Debug, Default)]
struct ElectionState {
    rounds: HashMap<RoundId, ElectionRound>,
    // Per round: voter -> vote, in acceptance order.
    votes: HashMap<RoundId, IndexMap<UserId, Vote>>,
    open_rounds: HashMap<CommunityId, RoundId>,
}

/// Moderator election rounds over a [`ModeratorDirectory`].
pub struct ElectionEngine<D: ModeratorDirectory> {
    state: RwLock<ElectionState>,
    directory: Arc<D>,
    sink: Arc<dyn EventSink>,
}

impl<D: ModeratorDirectory> ElectionEngine<D> {
    /// Create an engine over `directory`, discarding events.
    pub fn new(directory: Arc<D>) -> Self {
        Self::with_sink(directory, Arc::new(NullSink))
    }

    /// Create an engine emitting `RoundClosed` events to `sink`.
    pub fn with_sink(directory: Arc<D>, sink: Arc<dyn EventSink>) -> Self {
        Self {
            state: RwLock::new(ElectionState::default()),
            directory,
            sink,
        }
    }

    /// Open a voting round for `community`, closing `duration_ms` after
    /// `now`. Moderators of the community only; at most one live round per
    /// community.
    ///
    /// A previous round past its deadline no longer blocks a new one even
    /// if it has not been explicitly resolved yet.
    pub fn open_round(
        &self,
        initiator: UserId,
        community: CommunityId,
        now: PhysicalTime,
        duration_ms: u64,
    ) -> AgoraResult<ElectionRound> {
        if !self.directory.is_moderator(initiator, community) {
            return Err(AgoraError::not_authorized(format!(
                "{initiator} is not a moderator of {community}"
            )));
        }

        let mut state = self.state.write();
        if let Some(&existing) = state.open_rounds.get(&community) {
            let live = state
                .rounds
                .get(&existing)
                .is_some_and(|r| r.accepts_votes_at(now));
            if live {
                return Err(AgoraError::RoundAlreadyActive { community });
            }
        }

        let round = ElectionRound {
            id: RoundId::generate(),
            community,
            start_time: now,
            end_time: now.saturating_add_ms(duration_ms),
            is_active: true,
        };
        state.rounds.insert(round.id, round.clone());
        state.open_rounds.insert(community, round.id);
        info!(round = %round.id, %community, end = %round.end_time, "election round opened");
        Ok(round)
    }

    /// Fetch a round by id.
    pub fn round(&self, id: RoundId) -> AgoraResult<ElectionRound> {
        self.state
            .read()
            .rounds
            .get(&id)
            .cloned()
            .ok_or_else(|| AgoraError::not_found(format!("round {id}")))
    }

    /// Cast `voter`'s vote for `candidate` in `round`.
    ///
    /// The deadline check happens here, against the caller-supplied `now`;
    /// one vote per voter per round. Candidate eligibility is not
    /// validated.
    pub fn cast_vote(
        &self,
        round: RoundId,
        voter: UserId,
        candidate: UserId,
        now: PhysicalTime,
    ) -> AgoraResult<Vote> {
        let mut state = self.state.write();
        let record = state
            .rounds
            .get(&round)
            .ok_or_else(|| AgoraError::not_found(format!("round {round}")))?;
        if !record.accepts_votes_at(now) {
            return Err(AgoraError::RoundNotActive { round });
        }

        let votes = state.votes.entry(round).or_default();
        if votes.contains_key(&voter) {
            return Err(AgoraError::DuplicateVote { round, voter });
        }
        let vote = Vote {
            round,
            voter,
            candidate,
            created_at: now,
        };
        votes.insert(voter, vote.clone());
        debug!(%round, %voter, %candidate, "vote accepted");
        Ok(vote)
    }

    /// Close and resolve `round`.
    ///
    /// Winner is the candidate with the most votes; ties break to the
    /// candidate whose first vote has the earliest `created_at` (and, for
    /// identical timestamps, whose first vote was accepted first). The
    /// winner is installed as a moderator through the directory. Closing an
    /// already-closed round fails with `RoundNotActive`.
    pub fn close_round(&self, round: RoundId) -> AgoraResult<RoundOutcome> {
        let outcome = {
            let mut state = self.state.write();
            let record = state
                .rounds
                .get_mut(&round)
                .ok_or_else(|| AgoraError::not_found(format!("round {round}")))?;
            if !record.is_active {
                return Err(AgoraError::RoundNotActive { round });
            }
            record.is_active = false;
            let community = record.community;
            if state.open_rounds.get(&community) == Some(&round) {
                state.open_rounds.remove(&community);
            }

            let outcome = resolve(
                round,
                community,
                state.votes.get(&round).into_iter().flat_map(|votes| votes.values()),
            );
            info!(
                %round,
                %community,
                winner = ?outcome.winner,
                votes = outcome.tally.iter().map(|(_, n)| n).sum::<u64>(),
                "election round closed"
            );
            outcome
        };

        if let Some(winner) = outcome.winner {
            self.directory.grant_moderator(outcome.community, winner)?;
        }
        self.sink.emit(DomainEvent::RoundClosed {
            round: outcome.round,
            community: outcome.community,
            winner: outcome.winner,
        });
        Ok(outcome)
    }

    /// Votes recorded for `round`, in acceptance order.
    pub fn votes(&self, round: RoundId) -> AgoraResult<Vec<Vote>> {
        let state = self.state.read();
        if !state.rounds.contains_key(&round) {
            return Err(AgoraError::not_found(format!("round {round}")));
        }
        Ok(state
            .votes
            .get(&round)
            .map(|votes| votes.values().cloned().collect())
            .unwrap_or_default())
    }
}

/// Tally votes and pick the winner deterministically.
fn resolve<'a>(
    round: RoundId,
    community: CommunityId,
    votes: impl Iterator<Item = &'a Vote>,
) -> RoundOutcome {
    // Candidate -> (count, first vote time), keyed in first-vote order.
    let mut tally: IndexMap<UserId, (u64, PhysicalTime)> = IndexMap::new();
    for vote in votes {
        tally
            .entry(vote.candidate)
            .and_modify(|(count, _)| *count += 1)
            .or_insert((1, vote.created_at));
    }

    let winner = tally
        .iter()
        .enumerate()
        .max_by(|(idx_a, (_, (count_a, first_a))), (idx_b, (_, (count_b, first_b)))| {
            count_a
                .cmp(count_b)
                // Earlier first vote wins a count tie.
                .then_with(|| first_b.cmp(first_a))
                // Identical timestamps: earlier-tallied candidate wins.
                .then_with(|| idx_b.cmp(idx_a))
        })
        .map(|(_, (&candidate, _))| candidate);

    RoundOutcome {
        round,
        community,
        winner,
        tally: tally
            .into_iter()
            .map(|(candidate, (count, _))| (candidate, count))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_core::errors::ErrorKind;
    use assert_matches::assert_matches;
    use parking_lot::Mutex;
    use std::collections::HashSet;

    /// Stand-in directory with a mutable moderator set.
    #[derive(Default)]
    struct StubDirectory {
        moderators: Mutex<HashSet<(CommunityId, UserId)>>,
    }

    impl StubDirectory {
        fn with_moderator(community: CommunityId, user: UserId) -> Arc<Self> {
            let stub = Self::default();
            stub.moderators.lock().insert((community, user));
            Arc::new(stub)
        }
    }

    impl ModeratorDirectory for StubDirectory {
        fn is_moderator(&self, user: UserId, community: CommunityId) -> bool {
            self.moderators.lock().contains(&(community, user))
        }

        fn grant_moderator(&self, community: CommunityId, user: UserId) -> AgoraResult<()> {
            self.moderators.lock().insert((community, user));
            Ok(())
        }
    }

    fn at(ms: u64) -> PhysicalTime {
        PhysicalTime::from_ms(ms)
    }

    fn user(seed: u8) -> UserId {
        UserId::new_from_entropy([seed; 32])
    }

    fn engine_with_open_round() -> (ElectionEngine<StubDirectory>, Arc<StubDirectory>, ElectionRound)
    {
        let community = CommunityId::generate();
        let moderator = user(1);
        let directory = StubDirectory::with_moderator(community, moderator);
        let engine = ElectionEngine::new(Arc::clone(&directory));
        let round = engine
            .open_round(moderator, community, at(1_000), 60_000)
            .unwrap();
        (engine, directory, round)
    }

    #[test]
    fn only_moderators_open_rounds() {
        let community = CommunityId::generate();
        let directory = StubDirectory::with_moderator(community, user(1));
        let engine = ElectionEngine::new(directory);

        let err = engine
            .open_round(user(2), community, at(1), 1_000)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotAuthorized);
        engine.open_round(user(1), community, at(1), 1_000).unwrap();
    }

    #[test]
    fn one_live_round_per_community() {
        let (engine, _, round) = engine_with_open_round();
        let moderator = user(1);

        let err = engine
            .open_round(moderator, round.community, at(2_000), 60_000)
            .unwrap_err();
        assert_matches!(err, AgoraError::RoundAlreadyActive { .. });

        // Past the deadline the stale round no longer blocks.
        engine
            .open_round(moderator, round.community, at(100_000), 60_000)
            .unwrap();
    }

    #[test]
    fn duplicate_vote_rejected_without_overwrite() {
        let (engine, _, round) = engine_with_open_round();

        engine.cast_vote(round.id, user(2), user(5), at(2_000)).unwrap();
        let err = engine
            .cast_vote(round.id, user(2), user(6), at(3_000))
            .unwrap_err();
        assert_matches!(err, AgoraError::DuplicateVote { .. });

        let votes = engine.votes(round.id).unwrap();
        assert_eq!(votes.len(), 1);
        assert_eq!(votes[0].candidate, user(5));
    }

    #[test]
    fn deadline_is_self_enforced() {
        let (engine, _, round) = engine_with_open_round();

        // At exactly end_time the round is closed for votes.
        let err = engine
            .cast_vote(round.id, user(2), user(5), round.end_time)
            .unwrap_err();
        assert_matches!(err, AgoraError::RoundNotActive { .. });
        assert_eq!(err.kind(), ErrorKind::InvalidState);

        engine
            .cast_vote(round.id, user(2), user(5), at(2_000))
            .unwrap();
    }

    #[test]
    fn close_resolves_most_votes() {
        let (engine, directory, round) = engine_with_open_round();
        let (x, y) = (user(10), user(11));

        engine.cast_vote(round.id, user(2), x, at(2_000)).unwrap();
        engine.cast_vote(round.id, user(3), y, at(3_000)).unwrap();
        engine.cast_vote(round.id, user(4), x, at(4_000)).unwrap();

        let outcome = engine.close_round(round.id).unwrap();
        assert_eq!(outcome.winner, Some(x));
        assert_eq!(outcome.tally, vec![(x, 2), (y, 1)]);
        assert!(directory.is_moderator(x, round.community));

        // Votes after close are rejected, as is a second close.
        let err = engine
            .cast_vote(round.id, user(5), x, at(5_000))
            .unwrap_err();
        assert_matches!(err, AgoraError::RoundNotActive { .. });
        let err = engine.close_round(round.id).unwrap_err();
        assert_matches!(err, AgoraError::RoundNotActive { .. });
    }

    #[test]
    fn tie_breaks_to_earliest_first_vote() {
        let (engine, _, round) = engine_with_open_round();
        let (x, y) = (user(10), user(11));

        // Y reaches 2 votes first by total order, but X's first vote is
        // earliest, so a 2-2 tie resolves to X.
        engine.cast_vote(round.id, user(2), x, at(2_000)).unwrap();
        engine.cast_vote(round.id, user(3), y, at(3_000)).unwrap();
        engine.cast_vote(round.id, user(4), y, at(4_000)).unwrap();
        engine.cast_vote(round.id, user(5), x, at(5_000)).unwrap();

        let outcome = engine.close_round(round.id).unwrap();
        assert_eq!(outcome.winner, Some(x));
    }

    #[test]
    fn empty_round_closes_with_no_winner() {
        let (engine, directory, round) = engine_with_open_round();
        let before = directory.moderators.lock().len();

        let outcome = engine.close_round(round.id).unwrap();
        assert_eq!(outcome.winner, None);
        assert!(outcome.tally.is_empty());
        assert_eq!(directory.moderators.lock().len(), before);
    }

    #[test]
    fn vote_on_unknown_round_is_not_found() {
        let (engine, _, _) = engine_with_open_round();
        let err = engine
            .cast_vote(RoundId::generate(), user(2), user(5), at(2_000))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
