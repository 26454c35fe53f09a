//! An in-memory [`BallotStore`] and [`Roster`] for exercising the voting core
//! without a database.
//!
//! Every operation yields to the scheduler before touching state, so
//! concurrent tests genuinely interleave.

use std::collections::{HashMap, HashSet};
use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Mutex,
};

use rocket::tokio::task::yield_now;

use crate::error::{Error, Result};
use crate::model::{
    db::{
        ballot::Ballot, candidate::Candidate, category::Category, committee::Committee,
        election::Election, voter::Voter,
    },
    mongodb::Id,
};

use super::store::{BallotStore, CastBallotError, Roster};
use super::token::VoterToken;

#[derive(Default)]
struct State {
    elections: HashMap<Id, Election>,
    candidates: Vec<Candidate>,
    categories: HashMap<Id, Category>,
    committees: Vec<Committee>,
    voters: HashMap<String, Voter>,
    ballots: Vec<Ballot>,
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    /// Make every flag update fail, as if the voter write were lost.
    pub fail_flag_updates: AtomicBool,
    /// Make every ballot operation fail, as if the database were down.
    pub fail_ballots: AtomicBool,
    /// Make the existence pre-check miss every ballot, as if it raced
    /// with another insert.
    pub stale_reads: AtomicBool,
    /// Number of ballot insertions attempted.
    pub insert_attempts: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_election(self, election: Election) -> Self {
        self.lock().elections.insert(election.id, election);
        self
    }

    pub fn with_candidate(self, candidate: Candidate) -> Self {
        self.lock().candidates.push(candidate);
        self
    }

    pub fn with_category(self, category: Category) -> Self {
        self.lock().categories.insert(category.id, category);
        self
    }

    pub fn with_committee(self, committee: Committee) -> Self {
        self.lock().committees.push(committee);
        self
    }

    pub fn with_voter(self, voter: Voter) -> Self {
        self.lock().voters.insert(voter.id.clone(), voter);
        self
    }

    /// Insert a ballot directly, bypassing every check.
    pub fn with_ballot(self, ballot: Ballot) -> Self {
        self.lock().ballots.push(ballot);
        self
    }

    pub fn ballots(&self) -> Vec<Ballot> {
        self.lock().ballots.clone()
    }

    pub fn stored_voter(&self, voter_id: &str) -> Option<Voter> {
        self.lock().voters.get(voter_id).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    fn check_ballots_up(&self) -> Result<()> {
        if self.fail_ballots.load(Ordering::SeqCst) {
            return Err(Error::Internal("ballot store unavailable".to_string()));
        }
        Ok(())
    }
}

#[rocket::async_trait]
impl BallotStore for MemoryStore {
    async fn cast_ballot(&self, ballot: &Ballot) -> std::result::Result<(), CastBallotError> {
        yield_now().await;
        self.insert_attempts.fetch_add(1, Ordering::SeqCst);
        self.check_ballots_up()?;

        // Check and insert under one lock, like a unique index.
        let mut state = self.lock();
        let duplicate = state.ballots.iter().any(|existing| {
            existing.election_id == ballot.election_id && existing.voter_token == ballot.voter_token
        });
        if duplicate {
            return Err(CastBallotError::Duplicate);
        }
        state.ballots.push(ballot.clone());
        Ok(())
    }

    async fn has_ballot(&self, election_id: Id, token: &VoterToken) -> Result<bool> {
        yield_now().await;
        self.check_ballots_up()?;
        if self.stale_reads.load(Ordering::SeqCst) {
            return Ok(false);
        }
        Ok(self
            .lock()
            .ballots
            .iter()
            .any(|b| b.election_id == election_id && &b.voter_token == token))
    }

    async fn count_by_candidate(&self, election_id: Id) -> Result<HashMap<Id, u64>> {
        yield_now().await;
        self.check_ballots_up()?;
        let mut counts = HashMap::new();
        for ballot in self.lock().ballots.iter().filter(|b| b.election_id == election_id) {
            *counts.entry(ballot.candidate_id).or_default() += 1;
        }
        Ok(counts)
    }

    async fn tokens_for(&self, election_id: Id) -> Result<HashSet<VoterToken>> {
        yield_now().await;
        self.check_ballots_up()?;
        Ok(self
            .lock()
            .ballots
            .iter()
            .filter(|b| b.election_id == election_id)
            .map(|b| b.voter_token.clone())
            .collect())
    }

    async fn delete_all(&self) -> Result<u64> {
        yield_now().await;
        self.check_ballots_up()?;
        let mut state = self.lock();
        let deleted = state.ballots.len() as u64;
        state.ballots.clear();
        Ok(deleted)
    }
}

#[rocket::async_trait]
impl Roster for MemoryStore {
    async fn election(&self, election_id: Id) -> Result<Option<Election>> {
        yield_now().await;
        Ok(self.lock().elections.get(&election_id).cloned())
    }

    async fn candidate(&self, election_id: Id, candidate_id: Id) -> Result<Option<Candidate>> {
        yield_now().await;
        Ok(self
            .lock()
            .candidates
            .iter()
            .find(|c| c.id == candidate_id && c.election_id == election_id)
            .cloned())
    }

    async fn candidates(&self, election_id: Id) -> Result<Vec<Candidate>> {
        yield_now().await;
        let mut candidates = self
            .lock()
            .candidates
            .iter()
            .filter(|c| c.election_id == election_id)
            .cloned()
            .collect::<Vec<_>>();
        candidates.sort_by_key(|c| c.order_number);
        Ok(candidates)
    }

    async fn category(&self, category_id: Id) -> Result<Option<Category>> {
        yield_now().await;
        Ok(self.lock().categories.get(&category_id).cloned())
    }

    async fn categories(&self) -> Result<Vec<Category>> {
        yield_now().await;
        Ok(self.lock().categories.values().cloned().collect())
    }

    async fn committees_for(&self, election_id: Id) -> Result<Vec<Committee>> {
        yield_now().await;
        let mut committees = self
            .lock()
            .committees
            .iter()
            .filter(|c| c.election_ids.contains(&election_id))
            .cloned()
            .collect::<Vec<_>>();
        committees.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(committees)
    }

    async fn voter(&self, voter_id: &str) -> Result<Option<Voter>> {
        yield_now().await;
        Ok(self.lock().voters.get(voter_id).cloned())
    }

    async fn voters_in(&self, category_ids: &HashSet<Id>) -> Result<Vec<Voter>> {
        yield_now().await;
        Ok(self
            .lock()
            .voters
            .values()
            .filter(|v| v.category_id.map_or(false, |id| category_ids.contains(&id)))
            .cloned()
            .collect())
    }

    async fn voters(&self) -> Result<Vec<Voter>> {
        yield_now().await;
        Ok(self.lock().voters.values().cloned().collect())
    }

    async fn set_voted(&self, voter_id: &str, election_id: Id, voted: bool) -> Result<()> {
        yield_now().await;
        if self.fail_flag_updates.load(Ordering::SeqCst) {
            return Err(Error::Internal("voter store unavailable".to_string()));
        }
        let mut state = self.lock();
        let voter = state
            .voters
            .get_mut(voter_id)
            .ok_or_else(|| Error::not_found(format!("Voter with ID '{voter_id}'")))?;
        voter.has_voted.insert(election_id, voted);
        Ok(())
    }

    async fn clear_voted_flags(&self) -> Result<()> {
        yield_now().await;
        for voter in self.lock().voters.values_mut() {
            voter.has_voted.clear();
        }
        Ok(())
    }
}
