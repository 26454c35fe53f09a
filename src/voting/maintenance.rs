//! Administrative repairs to the ballot ledger and the voted flags.

use log::{info, warn};

use crate::error::Result;
use crate::model::{api::results::ReconcileReport, mongodb::Id};

use super::{
    store::{BallotStore, Roster},
    token::VoterToken,
};

/// Recompute every voter's flag for one election from ballot existence.
///
/// Repairs flags left behind by a vote whose flag update failed. Ballots are
/// never touched.
pub async fn reconcile_flags<B, R>(
    ballots: &B,
    roster: &R,
    token_secret: &[u8],
    election_id: Id,
) -> Result<ReconcileReport>
where
    B: BallotStore,
    R: Roster,
{
    // Voters before ballots. A flag is only ever set after its ballot is
    // inserted, so a vote landing between the two reads is seen as a ballot
    // with a missing flag, never as a flag with no ballot.
    let voters = roster.voters().await?;
    let tokens = ballots.tokens_for(election_id).await?;
    let mut report = ReconcileReport::default();

    for voter in voters {
        report.checked += 1;
        let has_ballot = tokens.contains(&VoterToken::derive(token_secret, &voter.id));
        if has_ballot == voter.has_voted_in(election_id) {
            continue;
        }
        roster.set_voted(&voter.id, election_id, has_ballot).await?;
        if has_ballot {
            report.set += 1;
        } else {
            report.cleared += 1;
        }
    }

    if report.set + report.cleared > 0 {
        warn!(
            "Reconciled election {election_id}: {} flags set, {} cleared",
            report.set, report.cleared
        );
    }
    Ok(report)
}

/// Delete every ballot, then clear every voter's flags.
///
/// In that order, so a flag never claims a ballot that no longer exists for
/// longer than the reset takes. Returns the number of ballots deleted.
pub async fn reset_votes<B, R>(ballots: &B, roster: &R) -> Result<u64>
where
    B: BallotStore,
    R: Roster,
{
    let deleted = ballots.delete_all().await?;
    roster.clear_voted_flags().await?;
    info!("Votes reset: {deleted} ballots deleted");
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::{AtomicBool, Ordering};

    use crate::config::Config;
    use crate::model::{
        api::vote::VoteRequest,
        db::{
            ballot::Ballot, candidate::Candidate, category::Category, committee::Committee,
            election::Election, voter::Voter,
        },
    };
    use crate::voting::{casting::VoteCaster, memory::MemoryStore, store::CastBallotError};

    use super::*;

    /// Wraps a [`MemoryStore`] so that one vote is cast right after the
    /// first snapshot reconciliation takes, whichever that is.
    struct VoteMidway<'a> {
        inner: &'a MemoryStore,
        secret: &'a [u8],
        request: VoteRequest,
        cast: AtomicBool,
    }

    impl VoteMidway<'_> {
        async fn cast_once(&self) {
            if !self.cast.swap(true, Ordering::SeqCst) {
                VoteCaster::new(self.inner, self.inner, self.secret)
                    .cast_vote(&self.request.voter_id, &self.request, 0)
                    .await
                    .unwrap();
            }
        }
    }

    #[rocket::async_trait]
    impl<'a> BallotStore for VoteMidway<'a> {
        async fn cast_ballot(&self, ballot: &Ballot) -> std::result::Result<(), CastBallotError> {
            self.inner.cast_ballot(ballot).await
        }

        async fn has_ballot(&self, election_id: Id, token: &VoterToken) -> Result<bool> {
            self.inner.has_ballot(election_id, token).await
        }

        async fn count_by_candidate(&self, election_id: Id) -> Result<HashMap<Id, u64>> {
            self.inner.count_by_candidate(election_id).await
        }

        async fn tokens_for(&self, election_id: Id) -> Result<HashSet<VoterToken>> {
            let tokens = self.inner.tokens_for(election_id).await?;
            self.cast_once().await;
            Ok(tokens)
        }

        async fn delete_all(&self) -> Result<u64> {
            self.inner.delete_all().await
        }
    }

    #[rocket::async_trait]
    impl<'a> Roster for VoteMidway<'a> {
        async fn election(&self, election_id: Id) -> Result<Option<Election>> {
            self.inner.election(election_id).await
        }

        async fn candidate(&self, election_id: Id, candidate_id: Id) -> Result<Option<Candidate>> {
            self.inner.candidate(election_id, candidate_id).await
        }

        async fn candidates(&self, election_id: Id) -> Result<Vec<Candidate>> {
            self.inner.candidates(election_id).await
        }

        async fn category(&self, category_id: Id) -> Result<Option<Category>> {
            self.inner.category(category_id).await
        }

        async fn categories(&self) -> Result<Vec<Category>> {
            self.inner.categories().await
        }

        async fn committees_for(&self, election_id: Id) -> Result<Vec<Committee>> {
            self.inner.committees_for(election_id).await
        }

        async fn voter(&self, voter_id: &str) -> Result<Option<Voter>> {
            self.inner.voter(voter_id).await
        }

        async fn voters_in(&self, category_ids: &HashSet<Id>) -> Result<Vec<Voter>> {
            self.inner.voters_in(category_ids).await
        }

        async fn voters(&self) -> Result<Vec<Voter>> {
            let voters = self.inner.voters().await?;
            self.cast_once().await;
            Ok(voters)
        }

        async fn set_voted(&self, voter_id: &str, election_id: Id, voted: bool) -> Result<()> {
            self.inner.set_voted(voter_id, election_id, voted).await
        }

        async fn clear_voted_flags(&self) -> Result<()> {
            self.inner.clear_voted_flags().await
        }
    }

    #[rocket::async_test]
    async fn reconciliation_repairs_lost_and_stale_flags() {
        let secret = Config::example().token_secret().to_vec();
        let election = Election::open_example();
        let candidate = Candidate::example(election.id, "Ada", 1);
        let category = Category::new("Students".to_string(), [election.id].into());
        let mut stale = Voter::example("CD-999999", Some(category.id), None);
        stale.has_voted.insert(election.id, true);
        let store = MemoryStore::new()
            .with_voter(Voter::example("AB-123456", Some(category.id), None))
            .with_voter(stale)
            .with_voter(Voter::example("EF-000001", Some(category.id), None))
            .with_category(category)
            .with_candidate(candidate.clone())
            .with_election(election.clone());

        // A vote whose flag update is lost.
        store.fail_flag_updates.store(true, Ordering::SeqCst);
        let request = VoteRequest {
            election_id: election.id,
            candidate_id: candidate.id,
            voter_id: "AB-123456".to_string(),
        };
        VoteCaster::new(&store, &store, &secret)
            .cast_vote("AB-123456", &request, 0)
            .await
            .unwrap();
        store.fail_flag_updates.store(false, Ordering::SeqCst);
        assert!(!store.stored_voter("AB-123456").unwrap().has_voted_in(election.id));

        let report = reconcile_flags(&store, &store, &secret, election.id)
            .await
            .unwrap();
        assert_eq!(
            ReconcileReport {
                checked: 3,
                set: 1,
                cleared: 1
            },
            report
        );
        assert!(store.stored_voter("AB-123456").unwrap().has_voted_in(election.id));
        assert!(!store.stored_voter("CD-999999").unwrap().has_voted_in(election.id));
        assert_eq!(1, store.ballots().len());

        // Nothing left to fix.
        let again = reconcile_flags(&store, &store, &secret, election.id)
            .await
            .unwrap();
        assert_eq!(0, again.set + again.cleared);
    }

    #[rocket::async_test]
    async fn reset_clears_ballots_and_flags() {
        let secret = Config::example().token_secret().to_vec();
        let election = Election::open_example();
        let candidate = Candidate::example(election.id, "Ada", 1);
        let category = Category::new("Students".to_string(), [election.id].into());
        let store = MemoryStore::new()
            .with_voter(Voter::example("AB-123456", Some(category.id), None))
            .with_category(category)
            .with_candidate(candidate.clone())
            .with_election(election.clone());
        let request = VoteRequest {
            election_id: election.id,
            candidate_id: candidate.id,
            voter_id: "AB-123456".to_string(),
        };
        let caster = VoteCaster::new(&store, &store, &secret);
        caster.cast_vote("AB-123456", &request, 0).await.unwrap();

        assert_eq!(1, reset_votes(&store, &store).await.unwrap());
        assert!(store.ballots().is_empty());
        assert!(store.stored_voter("AB-123456").unwrap().has_voted.is_empty());

        // Voters may vote again after a reset.
        caster.cast_vote("AB-123456", &request, 1).await.unwrap();
        assert_eq!(1, store.ballots().len());
    }

    #[rocket::async_test]
    async fn reconciliation_keeps_the_flag_of_a_concurrent_vote() {
        let secret = Config::example().token_secret().to_vec();
        let election = Election::open_example();
        let candidate = Candidate::example(election.id, "Ada", 1);
        let category = Category::new("Students".to_string(), [election.id].into());
        let store = MemoryStore::new()
            .with_voter(Voter::example("AB-123456", Some(category.id), None))
            .with_category(category)
            .with_candidate(candidate.clone())
            .with_election(election.clone());
        let midway = VoteMidway {
            inner: &store,
            secret: &secret,
            request: VoteRequest {
                election_id: election.id,
                candidate_id: candidate.id,
                voter_id: "AB-123456".to_string(),
            },
            cast: AtomicBool::new(false),
        };

        let report = reconcile_flags(&midway, &midway, &secret, election.id)
            .await
            .unwrap();

        assert!(midway.cast.load(Ordering::SeqCst));
        assert_eq!(1, store.ballots().len());
        assert!(store.stored_voter("AB-123456").unwrap().has_voted_in(election.id));
        assert_eq!(0, report.cleared);
    }
}
