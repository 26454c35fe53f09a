//! The vote-casting service: the single entry point that writes ballots.

use chrono::Utc;
use log::{debug, error, info};
use thiserror::Error;

use crate::error::Error;
use crate::model::{api::vote::VoteRequest, db::ballot::Ballot};

use super::{
    eligibility::EligibilityIndex,
    store::{BallotStore, CastBallotError, Roster},
    token::VoterToken,
};

/// Why a vote was refused.
#[derive(Debug, Error)]
pub enum VoteError {
    #[error("You may only cast your own vote.")]
    SessionMismatch,
    #[error("Election not found.")]
    ElectionNotFound,
    #[error("This election is not open for voting.")]
    ElectionNotOpen,
    #[error("You are not eligible to vote in this election.")]
    NotEligible,
    #[error("Candidate not found in this election.")]
    CandidateNotFound,
    #[error("You have already voted in this election.")]
    AlreadyVoted,
    #[error(transparent)]
    Storage(#[from] Error),
}

impl From<CastBallotError> for VoteError {
    fn from(err: CastBallotError) -> Self {
        match err {
            CastBallotError::Duplicate => Self::AlreadyVoted,
            CastBallotError::Storage(err) => Self::Storage(err),
        }
    }
}

impl From<VoteError> for Error {
    fn from(err: VoteError) -> Self {
        let message = err.to_string();
        match err {
            VoteError::SessionMismatch | VoteError::ElectionNotOpen | VoteError::NotEligible => {
                Error::Forbidden(message)
            }
            VoteError::ElectionNotFound => Error::NotFound(message),
            VoteError::CandidateNotFound => Error::BadRequest(message),
            VoteError::AlreadyVoted => Error::Conflict(message),
            VoteError::Storage(err) => err,
        }
    }
}

/// Casts ballots against a ballot store and a roster.
pub struct VoteCaster<'a, B, R> {
    ballots: &'a B,
    roster: &'a R,
    token_secret: &'a [u8],
}

impl<'a, B, R> VoteCaster<'a, B, R>
where
    B: BallotStore,
    R: Roster,
{
    pub fn new(ballots: &'a B, roster: &'a R, token_secret: &'a [u8]) -> Self {
        Self {
            ballots,
            roster,
            token_secret,
        }
    }

    /// Cast a vote on behalf of the voter authenticated as `session_voter_id`.
    ///
    /// Every precondition is checked here, so this is safe to call with an
    /// arbitrary request. Nothing is written unless all checks pass, and at
    /// most one ballot per voter and election is ever written, however many
    /// calls race.
    ///
    /// `req_id` only correlates log lines.
    pub async fn cast_vote(
        &self,
        session_voter_id: &str,
        request: &VoteRequest,
        req_id: usize,
    ) -> Result<(), VoteError> {
        if session_voter_id != request.voter_id {
            info!("req{req_id} session voter does not match the claimed voter");
            return Err(VoteError::SessionMismatch);
        }

        let election = self
            .roster
            .election(request.election_id)
            .await?
            .ok_or(VoteError::ElectionNotFound)?;
        if !election.accepts_ballots_at(Utc::now()) {
            return Err(VoteError::ElectionNotOpen);
        }

        // The session names a voter who no longer exists.
        let voter = self
            .roster
            .voter(&request.voter_id)
            .await?
            .ok_or(VoteError::SessionMismatch)?;

        let category = match voter.category_id {
            Some(category_id) => self.roster.category(category_id).await?,
            None => None,
        };
        if !EligibilityIndex::new(category).allows(&voter, election.id) {
            return Err(VoteError::NotEligible);
        }

        self.roster
            .candidate(election.id, request.candidate_id)
            .await?
            .ok_or(VoteError::CandidateNotFound)?;

        let token = VoterToken::derive(self.token_secret, &voter.id);

        // Saves a failed insert in the common case; the unique index is what
        // actually guarantees one ballot per voter.
        if self.ballots.has_ballot(election.id, &token).await? {
            return Err(VoteError::AlreadyVoted);
        }

        let ballot = Ballot::new(election.id, request.candidate_id, token, Utc::now());
        self.ballots.cast_ballot(&ballot).await?;
        debug!("req{req_id} ballot {} recorded in election {}", ballot.id, election.id);

        // The ballot is the source of truth; a lost flag update is repaired
        // by reconciliation rather than failing a vote that was counted.
        if let Err(err) = self.roster.set_voted(&voter.id, election.id, true).await {
            error!(
                "req{req_id} ballot recorded but the voted flag for election {} was not set, reconciliation needed: {err}",
                election.id
            );
        }

        Ok(())
    }
}
