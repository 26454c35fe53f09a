use mongodb::{bson::doc, options::FindOptions};
use rocket::{futures::TryStreamExt, serde::json::Json, Route};

use crate::{
    error::Result,
    model::{
        api::results::{RealCount, Recapitulation},
        auth::AuthToken,
        db::{admin::Admin, election::Election},
        mongodb::{Coll, Id},
    },
    voting::{store::MongoStore, tally::Tally},
};

pub fn routes() -> Vec<Route> {
    routes![real_count, recapitulation]
}

/// Live results for every election on the public display, main election first.
#[get("/real-count")]
async fn real_count(
    elections: Coll<Election>,
    store: MongoStore,
) -> Result<Json<Vec<RealCount>>> {
    let main_first = FindOptions::builder()
        .sort(doc! { "is_main_in_real_count": -1, "name": 1 })
        .build();
    let shown: Vec<Election> = elections
        .find(doc! { "show_in_real_count": true }, main_first)
        .await?
        .try_collect()
        .await?;

    let tally = Tally::new(&store, &store);
    let mut counts = Vec::with_capacity(shown.len());
    for election in shown {
        counts.push(tally.real_count(election).await?);
    }
    Ok(Json(counts))
}

#[get("/admin/elections/<election_id>/recapitulation")]
async fn recapitulation(
    _token: AuthToken<Admin>,
    election_id: Id,
    store: MongoStore,
) -> Result<Json<Recapitulation>> {
    let recap = Tally::new(&store, &store).recapitulation(election_id).await?;
    Ok(Json(recap))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use mongodb::Database;
    use rocket::{http::Status, local::asynchronous::Client};

    use crate::model::{
        common::{committee::CommitteeRole, voter::Gender},
        db::{
            ballot::Ballot, candidate::Candidate, category::Category, committee::Committee,
            voter::Voter,
        },
    };
    use crate::voting::token::VoterToken;

    use super::*;

    /// An election with two candidates, three eligible voters, and one
    /// ballot for the second candidate.
    async fn insert_election(db: &Database, election: Election) -> (Election, [Candidate; 2]) {
        let candidates = [
            Candidate::example(election.id, "Ada", 1),
            Candidate::example(election.id, "Grace", 2),
        ];
        let category = Category::new(format!("Voters of {}", election.id), [election.id].into());
        let voter = |n: u32, gender| {
            Voter::example(&format!("V-{}-{n}", election.id), Some(category.id), gender)
        };
        let mut voted = voter(1, Some(Gender::Female));
        voted.has_voted.insert(election.id, true);
        let voters = [voted, voter(2, Some(Gender::Male)), voter(3, None)];
        let ballot = Ballot::new(
            election.id,
            candidates[1].id,
            VoterToken::derive(b"any", &voters[0].id),
            Utc::now(),
        );

        Coll::<Election>::from_db(db)
            .insert_one(&election, None)
            .await
            .unwrap();
        Coll::<Candidate>::from_db(db)
            .insert_many(&candidates, None)
            .await
            .unwrap();
        Coll::<Category>::from_db(db)
            .insert_one(&category, None)
            .await
            .unwrap();
        Coll::<Voter>::from_db(db)
            .insert_many(&voters, None)
            .await
            .unwrap();
        Coll::<Ballot>::from_db(db)
            .insert_one(&ballot, None)
            .await
            .unwrap();

        (election, candidates)
    }

    #[backend_test]
    async fn real_count_lists_shown_elections(client: Client, db: Database) {
        let (main, _) = insert_election(&db, Election::open_example()).await;
        let (side, _) = insert_election(
            &db,
            Election {
                is_main_in_real_count: false,
                name: "A side election".to_string(),
                ..Election::open_example()
            },
        )
        .await;
        insert_election(
            &db,
            Election {
                show_in_real_count: false,
                is_main_in_real_count: false,
                ..Election::open_example()
            },
        )
        .await;

        let response = client.get(uri!(real_count)).dispatch().await;
        assert_eq!(Status::Ok, response.status());
        let counts = response.into_json::<Vec<RealCount>>().await.unwrap();

        let ids = counts.iter().map(|c| c.election_id).collect::<Vec<_>>();
        assert_eq!(vec![main.id, side.id], ids);
        let votes = counts[0].results.iter().map(|r| r.votes).collect::<Vec<_>>();
        assert_eq!(vec![0, 1], votes);
        assert_eq!(1, counts[0].total_ballots);
    }

    #[backend_test]
    async fn real_count_with_nothing_shown(client: Client) {
        let response = client.get(uri!(real_count)).dispatch().await;
        assert_eq!(Status::Ok, response.status());
        assert!(response.into_json::<Vec<RealCount>>().await.unwrap().is_empty());
    }

    #[backend_test(admin)]
    async fn recapitulation_report(client: Client, db: Database, committees: Coll<Committee>) {
        let election = Election {
            use_witnesses: true,
            ..Election::open_example()
        };
        let (election, [ada, grace]) = insert_election(&db, election).await;
        committees
            .insert_one(Committee::example("Polling", [election.id].into()), None)
            .await
            .unwrap();

        let response = client
            .get(uri!(recapitulation(election.id)))
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let recap = response.into_json::<Recapitulation>().await.unwrap();

        assert_eq!(election.id, recap.election.id);
        assert_eq!(ada.id, recap.results[0].candidate.id);
        assert_eq!(0, recap.results[0].votes);
        assert_eq!(grace.id, recap.results[1].candidate.id);
        assert_eq!(1, recap.results[1].votes);
        assert_eq!(1, recap.total_ballots);
        assert_eq!(3, recap.participation.eligible.total);
        assert_eq!(1, recap.participation.voted.female);
        assert_eq!(2, recap.participation.not_voted.total);
        assert_eq!(1, recap.participation.not_voted.male);

        let roles = recap.signatories.iter().map(|m| m.role).collect::<Vec<_>>();
        assert_eq!(vec![CommitteeRole::Chair, CommitteeRole::Member], roles);
        let witnessed = recap.witness_slots.iter().map(|c| c.id).collect::<Vec<_>>();
        assert_eq!(vec![ada.id, grace.id], witnessed);
    }

    #[backend_test(admin)]
    async fn recapitulation_of_missing_election(client: Client) {
        let response = client
            .get(uri!(recapitulation(Id::new())))
            .dispatch()
            .await;
        assert_eq!(Status::NotFound, response.status());
    }

    #[backend_test]
    async fn recapitulation_needs_admin(client: Client, db: Database) {
        let (election, _) = insert_election(&db, Election::open_example()).await;

        let response = client
            .get(uri!(recapitulation(election.id)))
            .dispatch()
            .await;
        assert_eq!(Status::NotFound, response.status());
    }
}
