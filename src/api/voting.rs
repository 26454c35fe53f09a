use chrono::Utc;
use log::info;
use rocket::{serde::json::Json, Route, State};

use crate::{
    error::{Error, Result},
    logging::RequestId,
    model::{
        api::{
            election::{CandidateDescription, ElectionDescription, VoterElection},
            vote::VoteRequest,
            Message,
        },
        auth::AuthToken,
        db::voter::Voter,
    },
    voting::{
        casting::VoteCaster,
        eligibility::EligibilityIndex,
        store::{MongoStore, Roster},
    },
    Config,
};

pub fn routes() -> Vec<Route> {
    routes![cast_vote, cast_vote_unauthenticated, voter_elections, voter_elections_unauthenticated]
}

#[post("/vote", data = "<vote>")]
pub async fn cast_vote(
    token: AuthToken<Voter>,
    vote: Json<VoteRequest>,
    store: MongoStore,
    config: &State<Config>,
    req_id: &RequestId,
) -> Result<Json<Message>> {
    info!("req{req_id} vote submitted for election {}", vote.election_id);
    VoteCaster::new(&store, &store, config.token_secret())
        .cast_vote(&token.id, &vote, req_id.0)
        .await?;
    Ok(Json(Message::new("Your vote has been recorded. Thank you for voting.")))
}

#[post("/vote", rank = 2)]
fn cast_vote_unauthenticated() -> Error {
    Error::Forbidden("You must be logged in as a voter to vote.".to_string())
}

/// Elections the logged-in voter is eligible for, with their candidates.
#[get("/voter/elections")]
pub async fn voter_elections(
    token: AuthToken<Voter>,
    store: MongoStore,
) -> Result<Json<Vec<VoterElection>>> {
    let voter = store
        .voter(&token.id)
        .await?
        .ok_or_else(|| Error::not_found(format!("Voter with ID '{}'", token.id)))?;

    let category = match voter.category_id {
        Some(category_id) => store.category(category_id).await?,
        None => None,
    };
    let mut election_ids = EligibilityIndex::new(category)
        .elections_for(&voter)
        .into_iter()
        .collect::<Vec<_>>();
    election_ids.sort();

    let now = Utc::now();
    let mut elections = Vec::with_capacity(election_ids.len());
    for election_id in election_ids {
        // Categories may still list elections that have since been removed.
        let Some(election) = store.election(election_id).await? else {
            continue;
        };
        let candidates = store
            .candidates(election_id)
            .await?
            .into_iter()
            .map(CandidateDescription::from)
            .collect();
        elections.push(VoterElection {
            has_voted: voter.has_voted_in(election_id),
            is_open: election.accepts_ballots_at(now),
            election: ElectionDescription::from(election),
            candidates,
        });
    }

    Ok(Json(elections))
}

#[get("/voter/elections", rank = 2)]
fn voter_elections_unauthenticated() -> Error {
    Error::Unauthorized("You must be logged in as a voter.".to_string())
}
