//! Read-only aggregations over ballots and voter flags.
//!
//! Tallies are only eventually consistent with in-flight votes, and never
//! fail just because nothing has been cast yet.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::model::{
    api::{
        election::{CandidateDescription, ElectionDescription},
        results::{Breakdown, CandidateResult, ParticipationStats, RealCount, Recapitulation},
    },
    db::{candidate::Candidate, election::Election, voter::Voter},
    mongodb::Id,
};

use super::{
    eligibility::EligibilityIndex,
    store::{BallotStore, Roster},
};

/// Attach counts to a candidate roster, in roster order. Candidates without
/// ballots get zero.
pub fn zero_filled(candidates: Vec<Candidate>, counts: &HashMap<Id, u64>) -> Vec<CandidateResult> {
    candidates
        .into_iter()
        .map(|candidate| CandidateResult {
            votes: counts.get(&candidate.id).copied().unwrap_or(0),
            candidate: CandidateDescription::from(candidate),
        })
        .collect()
}

/// Cross-tabulate turnout for an election among the given eligible voters.
pub fn tabulate<'v>(
    eligible_voters: impl IntoIterator<Item = &'v Voter>,
    election_id: Id,
) -> ParticipationStats {
    let mut eligible = Breakdown::default();
    let mut voted = Breakdown::default();
    for voter in eligible_voters {
        eligible.add(voter.gender);
        if voter.has_voted_in(election_id) {
            voted.add(voter.gender);
        }
    }
    ParticipationStats {
        eligible,
        voted,
        not_voted: eligible - voted,
    }
}

/// Computes results and turnout.
pub struct Tally<'a, B, R> {
    ballots: &'a B,
    roster: &'a R,
}

impl<'a, B, R> Tally<'a, B, R>
where
    B: BallotStore,
    R: Roster,
{
    pub fn new(ballots: &'a B, roster: &'a R) -> Self {
        Self { ballots, roster }
    }

    /// Ballot counts per candidate, straight from the ballot store.
    /// Candidates without ballots are absent.
    pub async fn results_for(&self, election_id: Id) -> Result<HashMap<Id, u64>> {
        self.ballots.count_by_candidate(election_id).await
    }

    /// Ballot counts for every candidate on the roster, in ballot order,
    /// and the total number of ballots.
    pub async fn results_with_roster(&self, election_id: Id) -> Result<(Vec<CandidateResult>, u64)> {
        let counts = self.results_for(election_id).await?;
        let candidates = self.roster.candidates(election_id).await?;
        let total = counts.values().sum();
        Ok((zero_filled(candidates, &counts), total))
    }

    /// Turnout among the voters eligible for the election, according to
    /// their voted flags.
    pub async fn participation_stats(&self, election_id: Id) -> Result<ParticipationStats> {
        let index = EligibilityIndex::new(self.roster.categories().await?);
        let categories = index.categories_allowing(election_id);
        let voters = self.roster.voters_in(&categories).await?;
        Ok(tabulate(&voters, election_id))
    }

    /// The full report for one election.
    pub async fn recapitulation(&self, election_id: Id) -> Result<Recapitulation> {
        let election = self
            .roster
            .election(election_id)
            .await?
            .ok_or_else(|| Error::not_found(format!("Election with ID '{election_id}'")))?;
        let (results, total_ballots) = self.results_with_roster(election_id).await?;
        let participation = self.participation_stats(election_id).await?;
        let signatories = self
            .roster
            .committees_for(election_id)
            .await?
            .into_iter()
            .flat_map(|committee| committee.members)
            .collect();
        let witness_slots = if election.use_witnesses {
            results.iter().map(|result| result.candidate.clone()).collect()
        } else {
            Vec::new()
        };
        Ok(Recapitulation {
            election: ElectionDescription::from(election),
            results,
            total_ballots,
            participation,
            signatories,
            witness_slots,
        })
    }

    /// Results for one election on the public real-count display.
    pub async fn real_count(&self, election: Election) -> Result<RealCount> {
        let (results, total_ballots) = self.results_with_roster(election.id).await?;
        Ok(RealCount {
            election_id: election.id,
            name: election.name,
            is_main_in_real_count: election.is_main_in_real_count,
            results,
            total_ballots,
        })
    }
}
