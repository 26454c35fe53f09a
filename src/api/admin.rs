use std::collections::HashSet;

use log::{info, warn};
use mongodb::{bson::doc, options::FindOneOptions};
use rocket::{serde::json::Json, Route, State};

use crate::{
    error::{Error, Result},
    model::{
        api::{
            committee::{CommitteeDescription, CommitteeSpec},
            election::{
                check_election, CandidateDescription, CandidateSpec, CategoryDescription,
                CategorySpec, ElectionDescription, ElectionSpec, ElectionUpdate,
            },
            results::{ReconcileReport, ResetAction, ResetReport, ResetRequest},
            voter::{generate_password, generate_voter_id, VoterCard, VoterSpec},
        },
        auth::AuthToken,
        db::{
            admin::Admin, candidate::Candidate, category::Category, committee::Committee,
            election::Election, voter::Voter,
        },
        mongodb::{is_duplicate_key_error, Coll, Id},
    },
    voting::{maintenance, store::MongoStore},
    Config,
};

/// Attempts at generating a voter ID that is not already taken.
const VOTER_ID_ATTEMPTS: usize = 10;

pub fn routes() -> Vec<Route> {
    routes![
        create_election,
        modify_election,
        create_candidate,
        create_category,
        create_committee,
        create_voter,
        reset,
        reconcile,
    ]
}

#[post("/admin/elections", data = "<spec>", format = "json")]
async fn create_election(
    _token: AuthToken<Admin>,
    spec: Json<ElectionSpec>,
    elections: Coll<Election>,
) -> Result<Json<ElectionDescription>> {
    let election = Election::from_spec(spec.0);
    check_election(&election).map_err(Error::BadRequest)?;

    elections.insert_one(&election, None).await?;
    if election.is_main_in_real_count {
        demote_other_main_elections(&elections, election.id).await?;
    }

    Ok(Json(election.into()))
}

#[put("/admin/elections/<election_id>", data = "<update>", format = "json")]
async fn modify_election(
    _token: AuthToken<Admin>,
    election_id: Id,
    update: Json<ElectionUpdate>,
    elections: Coll<Election>,
) -> Result<Json<ElectionDescription>> {
    let mut election = elections
        .find_one(election_id.as_doc(), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Election with ID '{election_id}'")))?;

    update.0.apply_to(&mut election);
    check_election(&election).map_err(Error::BadRequest)?;

    elections
        .replace_one(election_id.as_doc(), &election, None)
        .await?;
    if election.is_main_in_real_count {
        demote_other_main_elections(&elections, election_id).await?;
    }

    Ok(Json(election.into()))
}

/// Ensure `main_id` is the only main election on the real-count display.
async fn demote_other_main_elections(elections: &Coll<Election>, main_id: Id) -> Result<()> {
    let filter = doc! {
        "_id": { "$ne": main_id },
        "is_main_in_real_count": true,
    };
    let update = doc! {
        "$set": { "is_main_in_real_count": false }
    };
    elections.update_many(filter, update, None).await?;
    Ok(())
}

#[post("/admin/elections/<election_id>/candidates", data = "<spec>", format = "json")]
async fn create_candidate(
    _token: AuthToken<Admin>,
    election_id: Id,
    spec: Json<CandidateSpec>,
    elections: Coll<Election>,
    candidates: Coll<Candidate>,
) -> Result<Json<CandidateDescription>> {
    if spec.name.trim().is_empty() {
        return Err(Error::BadRequest("Candidate name must not be empty".to_string()));
    }
    if matches!(spec.order_number, Some(n) if n < 1) {
        return Err(Error::BadRequest("Order numbers start at 1".to_string()));
    }
    if elections.find_one(election_id.as_doc(), None).await?.is_none() {
        return Err(Error::not_found(format!("Election with ID '{election_id}'")));
    }

    let highest_first = FindOneOptions::builder()
        .sort(doc! { "order_number": -1 })
        .build();
    let next_order_number = candidates
        .find_one(doc! { "election_id": election_id }, highest_first)
        .await?
        .map_or(1, |last| last.order_number + 1);

    let candidate = spec.0.into_candidate(election_id, next_order_number);
    match candidates.insert_one(&candidate, None).await {
        Ok(_) => Ok(Json(candidate.into())),
        Err(err) if is_duplicate_key_error(&err) => Err(Error::Conflict(format!(
            "Order number {} is already taken in election {election_id}",
            candidate.order_number
        ))),
        Err(err) => Err(err.into()),
    }
}

#[post("/admin/categories", data = "<spec>", format = "json")]
async fn create_category(
    _token: AuthToken<Admin>,
    spec: Json<CategorySpec>,
    elections: Coll<Election>,
    categories: Coll<Category>,
) -> Result<Json<CategoryDescription>> {
    if spec.name.trim().is_empty() {
        return Err(Error::BadRequest("Category name must not be empty".to_string()));
    }
    if !all_exist(&elections, &spec.allowed_elections).await? {
        return Err(Error::BadRequest(
            "Allowed elections must all exist".to_string(),
        ));
    }

    let category = Category::from(spec.0);
    match categories.insert_one(&category, None).await {
        Ok(_) => Ok(Json(category.into())),
        Err(err) if is_duplicate_key_error(&err) => Err(Error::Conflict(format!(
            "Category name already in use: {}",
            category.name
        ))),
        Err(err) => Err(err.into()),
    }
}

/// Link a committee to the elections whose recapitulations it signs.
#[post("/admin/committees", data = "<spec>", format = "json")]
async fn create_committee(
    _token: AuthToken<Admin>,
    spec: Json<CommitteeSpec>,
    elections: Coll<Election>,
    committees: Coll<Committee>,
) -> Result<Json<CommitteeDescription>> {
    spec.check().map_err(Error::BadRequest)?;
    if !all_exist(&elections, &spec.election_ids).await? {
        return Err(Error::BadRequest(
            "Committee elections must all exist".to_string(),
        ));
    }

    let committee = Committee::from(spec.0);
    committees.insert_one(&committee, None).await?;
    info!(
        "Committee {} created with {} members",
        committee.id,
        committee.members.len()
    );
    Ok(Json(committee.into()))
}

async fn all_exist(elections: &Coll<Election>, ids: &HashSet<Id>) -> Result<bool> {
    let expected = ids.len() as u64;
    let ids = ids.iter().copied().collect::<Vec<_>>();
    let known = elections
        .count_documents(doc! { "_id": { "$in": ids } }, None)
        .await?;
    Ok(known == expected)
}

/// Register a voter and hand back their only copy of the password.
#[post("/admin/voters", data = "<spec>", format = "json")]
async fn create_voter(
    _token: AuthToken<Admin>,
    spec: Json<VoterSpec>,
    categories: Coll<Category>,
    voters: Coll<Voter>,
) -> Result<Json<VoterCard>> {
    let spec = spec.0;
    if spec.name.trim().is_empty() {
        return Err(Error::BadRequest("Voter name must not be empty".to_string()));
    }
    if matches!(&spec.id, Some(id) if id.trim().is_empty()) {
        return Err(Error::BadRequest("Voter ID must not be empty".to_string()));
    }
    if let Some(category_id) = spec.category_id {
        if categories.find_one(category_id.as_doc(), None).await?.is_none() {
            return Err(Error::BadRequest(format!(
                "Category with ID '{category_id}' does not exist"
            )));
        }
    }

    // Generate everything up front; `ThreadRng` must not be held across awaits.
    let (password, candidate_ids) = {
        let mut rng = rand::thread_rng();
        let password = spec
            .password
            .clone()
            .unwrap_or_else(|| generate_password(&mut rng));
        let ids = (0..VOTER_ID_ATTEMPTS)
            .map(|_| generate_voter_id(&mut rng))
            .collect::<Vec<_>>();
        (password, ids)
    };
    let assigned_id = spec.id.is_some();

    for generated_id in candidate_ids {
        let voter = spec.clone().into_voter(generated_id, &password)?;
        match voters.insert_one(&voter, None).await {
            Ok(_) => {
                info!("Registered voter {}", voter.id);
                return Ok(Json(VoterCard {
                    voter_id: voter.id,
                    name: voter.name,
                    password,
                }));
            }
            Err(err) if is_duplicate_key_error(&err) => {
                if assigned_id {
                    return Err(Error::Conflict(format!(
                        "Voter ID already in use: {}",
                        voter.id
                    )));
                }
                warn!("Generated voter ID {} collided, retrying", voter.id);
            }
            Err(err) => return Err(err.into()),
        }
    }

    Err(Error::Internal(format!(
        "No free voter ID after {VOTER_ID_ATTEMPTS} attempts"
    )))
}

#[post("/admin/reset", data = "<request>", format = "json")]
async fn reset(
    _token: AuthToken<Admin>,
    request: Json<ResetRequest>,
    store: MongoStore,
) -> Result<Json<ResetReport>> {
    match request.action {
        ResetAction::ResetVotes => {
            let deleted_ballots = maintenance::reset_votes(&store, &store).await?;
            Ok(Json(ResetReport { deleted_ballots }))
        }
    }
}

#[post("/admin/elections/<election_id>/reconcile")]
async fn reconcile(
    _token: AuthToken<Admin>,
    election_id: Id,
    elections: Coll<Election>,
    store: MongoStore,
    config: &State<Config>,
) -> Result<Json<ReconcileReport>> {
    if elections.find_one(election_id.as_doc(), None).await?.is_none() {
        return Err(Error::not_found(format!("Election with ID '{election_id}'")));
    }
    let report =
        maintenance::reconcile_flags(&store, &store, config.token_secret(), election_id).await?;
    Ok(Json(report))
}
