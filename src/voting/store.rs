//! Storage seams for the voting core, and their MongoDB implementation.
//!
//! The casting and tally logic only sees these traits, so it runs the same
//! against MongoDB in production and against an in-memory store in tests.

use std::collections::{HashMap, HashSet};

use mongodb::{
    bson::{doc, Bson, Document},
    options::FindOptions,
    Database,
};
use rocket::{
    futures::TryStreamExt,
    request::{self, FromRequest, Request},
    State,
};
use thiserror::Error;

use crate::error::{Error, Result};
use crate::model::{
    db::{
        ballot::Ballot, candidate::Candidate, category::Category, committee::Committee,
        election::Election, voter::Voter,
    },
    mongodb::{is_duplicate_key_error, Coll, Id},
};

use super::token::VoterToken;

/// Why a ballot could not be inserted.
#[derive(Debug, Error)]
pub enum CastBallotError {
    /// A ballot with the same election and voter token already exists.
    #[error("a ballot already exists for this voter token and election")]
    Duplicate,
    #[error(transparent)]
    Storage(#[from] Error),
}

/// The ballot table. The only writer of ballots in the system.
#[rocket::async_trait]
pub trait BallotStore: Send + Sync {
    /// Insert a ballot, atomically failing with [`CastBallotError::Duplicate`]
    /// if one already exists for its election and voter token.
    ///
    /// Of any number of concurrent calls for the same pair, exactly one
    /// succeeds.
    async fn cast_ballot(&self, ballot: &Ballot) -> std::result::Result<(), CastBallotError>;

    /// Does a ballot exist for this election and voter token?
    async fn has_ballot(&self, election_id: Id, token: &VoterToken) -> Result<bool>;

    /// Ballot counts per candidate. Candidates without ballots are absent.
    async fn count_by_candidate(&self, election_id: Id) -> Result<HashMap<Id, u64>>;

    /// Every voter token with a ballot in the election.
    async fn tokens_for(&self, election_id: Id) -> Result<HashSet<VoterToken>>;

    /// Delete every ballot in every election, returning how many went.
    async fn delete_all(&self) -> Result<u64>;
}

/// The roster: elections, candidates, categories and voters.
#[rocket::async_trait]
pub trait Roster: Send + Sync {
    async fn election(&self, election_id: Id) -> Result<Option<Election>>;

    /// Find a candidate, but only if it stands in the given election.
    async fn candidate(&self, election_id: Id, candidate_id: Id) -> Result<Option<Candidate>>;

    /// Candidates of an election, in ballot order.
    async fn candidates(&self, election_id: Id) -> Result<Vec<Candidate>>;

    async fn category(&self, category_id: Id) -> Result<Option<Category>>;

    async fn categories(&self) -> Result<Vec<Category>>;

    /// Committees linked to the election, in name order.
    async fn committees_for(&self, election_id: Id) -> Result<Vec<Committee>>;

    async fn voter(&self, voter_id: &str) -> Result<Option<Voter>>;

    /// Every voter belonging to one of the given categories.
    async fn voters_in(&self, category_ids: &HashSet<Id>) -> Result<Vec<Voter>>;

    async fn voters(&self) -> Result<Vec<Voter>>;

    /// Set or clear a single voter's flag for a single election, leaving
    /// their flags for other elections untouched.
    async fn set_voted(&self, voter_id: &str, election_id: Id, voted: bool) -> Result<()>;

    /// Clear every voter's flags for every election.
    async fn clear_voted_flags(&self) -> Result<()>;
}

/// [`BallotStore`] and [`Roster`] backed by MongoDB collections.
#[derive(Clone)]
pub struct MongoStore {
    elections: Coll<Election>,
    candidates: Coll<Candidate>,
    categories: Coll<Category>,
    committees: Coll<Committee>,
    voters: Coll<Voter>,
    ballots: Coll<Ballot>,
}

impl MongoStore {
    pub fn from_db(db: &Database) -> Self {
        Self {
            elections: Coll::from_db(db),
            candidates: Coll::from_db(db),
            categories: Coll::from_db(db),
            committees: Coll::from_db(db),
            voters: Coll::from_db(db),
            ballots: Coll::from_db(db),
        }
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for MongoStore {
    type Error = ();

    /// Panics iff the [`Database`] is not managed by [`rocket::Rocket`].
    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let db = req.guard::<&State<Database>>().await.unwrap();
        request::Outcome::Success(MongoStore::from_db(db))
    }
}

#[rocket::async_trait]
impl BallotStore for MongoStore {
    async fn cast_ballot(&self, ballot: &Ballot) -> std::result::Result<(), CastBallotError> {
        match self.ballots.insert_one(ballot, None).await {
            Ok(_) => Ok(()),
            Err(err) if is_duplicate_key_error(&err) => Err(CastBallotError::Duplicate),
            Err(err) => Err(CastBallotError::Storage(err.into())),
        }
    }

    async fn has_ballot(&self, election_id: Id, token: &VoterToken) -> Result<bool> {
        let filter = doc! {
            "election_id": election_id,
            "voter_token": token,
        };
        Ok(self.ballots.count_documents(filter, None).await? > 0)
    }

    async fn count_by_candidate(&self, election_id: Id) -> Result<HashMap<Id, u64>> {
        let pipeline = [
            doc! { "$match": { "election_id": election_id } },
            doc! { "$group": { "_id": "$candidate_id", "count": { "$sum": 1 } } },
        ];
        let groups: Vec<Document> = self
            .ballots
            .aggregate(pipeline, None)
            .await?
            .try_collect()
            .await?;

        groups
            .iter()
            .map(|group| {
                let candidate_id = group
                    .get_str("_id")
                    .ok()
                    .and_then(|id| id.parse::<Id>().ok())
                    .ok_or_else(|| Error::Internal(format!("Malformed ballot group {group}")))?;
                let count = match group.get("count") {
                    Some(Bson::Int32(n)) => u64::try_from(*n).ok(),
                    Some(Bson::Int64(n)) => u64::try_from(*n).ok(),
                    _ => None,
                }
                .ok_or_else(|| Error::Internal(format!("Malformed ballot count {group}")))?;
                Ok((candidate_id, count))
            })
            .collect()
    }

    async fn tokens_for(&self, election_id: Id) -> Result<HashSet<VoterToken>> {
        let tokens = self
            .ballots
            .distinct("voter_token", doc! { "election_id": election_id }, None)
            .await?;
        tokens
            .into_iter()
            .map(|token| {
                mongodb::bson::from_bson(token)
                    .map_err(|e| Error::Internal(format!("Malformed voter token: {e}")))
            })
            .collect()
    }

    async fn delete_all(&self) -> Result<u64> {
        Ok(self.ballots.delete_many(doc! {}, None).await?.deleted_count)
    }
}

#[rocket::async_trait]
impl Roster for MongoStore {
    async fn election(&self, election_id: Id) -> Result<Option<Election>> {
        Ok(self.elections.find_one(election_id.as_doc(), None).await?)
    }

    async fn candidate(&self, election_id: Id, candidate_id: Id) -> Result<Option<Candidate>> {
        let filter = doc! {
            "_id": candidate_id,
            "election_id": election_id,
        };
        Ok(self.candidates.find_one(filter, None).await?)
    }

    async fn candidates(&self, election_id: Id) -> Result<Vec<Candidate>> {
        let in_ballot_order = FindOptions::builder()
            .sort(doc! { "order_number": 1 })
            .build();
        Ok(self
            .candidates
            .find(doc! { "election_id": election_id }, in_ballot_order)
            .await?
            .try_collect()
            .await?)
    }

    async fn category(&self, category_id: Id) -> Result<Option<Category>> {
        Ok(self.categories.find_one(category_id.as_doc(), None).await?)
    }

    async fn categories(&self) -> Result<Vec<Category>> {
        Ok(self.categories.find(None, None).await?.try_collect().await?)
    }

    async fn committees_for(&self, election_id: Id) -> Result<Vec<Committee>> {
        let by_name = FindOptions::builder().sort(doc! { "name": 1 }).build();
        Ok(self
            .committees
            .find(doc! { "election_ids": election_id }, by_name)
            .await?
            .try_collect()
            .await?)
    }

    async fn voter(&self, voter_id: &str) -> Result<Option<Voter>> {
        Ok(self.voters.find_one(doc! { "_id": voter_id }, None).await?)
    }

    async fn voters_in(&self, category_ids: &HashSet<Id>) -> Result<Vec<Voter>> {
        if category_ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids = category_ids.iter().copied().collect::<Vec<_>>();
        let filter = doc! { "category_id": { "$in": ids } };
        Ok(self.voters.find(filter, None).await?.try_collect().await?)
    }

    async fn voters(&self) -> Result<Vec<Voter>> {
        Ok(self.voters.find(None, None).await?.try_collect().await?)
    }

    async fn set_voted(&self, voter_id: &str, election_id: Id, voted: bool) -> Result<()> {
        // Field-level update, so flags for other elections are never clobbered
        // by a concurrent vote elsewhere.
        let field = format!("has_voted.{election_id}");
        let update = doc! { "$set": { field: voted } };
        let result = self
            .voters
            .update_one(doc! { "_id": voter_id }, update, None)
            .await?;
        if result.matched_count == 0 {
            return Err(Error::not_found(format!("Voter with ID '{voter_id}'")));
        }
        Ok(())
    }

    async fn clear_voted_flags(&self) -> Result<()> {
        let update = doc! { "$set": { "has_voted": {} } };
        self.voters.update_many(doc! {}, update, None).await?;
        Ok(())
    }
}
