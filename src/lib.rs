#[macro_use]
extern crate rocket;

#[cfg(test)]
#[macro_use]
extern crate backend_test;

use rocket::{Build, Rocket};

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod voting;

pub use config::Config;

use config::{ConfigFairing, DatabaseFairing};
use logging::LoggerFairing;

/// Assemble the server: fairings for logging, configuration and the
/// database, plus every route and catcher.
pub fn build() -> Rocket<Build> {
    rocket::build()
        .attach(LoggerFairing)
        .attach(ConfigFairing)
        .attach(DatabaseFairing)
        .mount("/", api::routes())
        .register("/", api::catchers())
}

/// Connect to the database named by `db_uri` in the active Rocket profile.
#[cfg(test)]
async fn db_client() -> mongodb::Client {
    let db_uri: String = rocket::Config::figment()
        .extract_inner("db_uri")
        .expect("`db_uri` not set");
    mongodb::Client::with_uri_str(&db_uri)
        .await
        .unwrap_or_else(|_| panic!("Could not connect to database with `db_uri` \"{db_uri}\""))
}

/// A fresh database name, so concurrently running tests never collide.
#[cfg(test)]
fn database() -> String {
    let random: u32 = rand::random();
    format!("test{random}")
}

/// Build a server that uses the given database instead of connecting itself.
#[cfg(test)]
async fn rocket_for_db(db_client: mongodb::Client, db_name: &str) -> Rocket<Build> {
    let db = db_client.database(db_name);
    model::mongodb::ensure_indexes_exist(&db)
        .await
        .expect("Failed to create test indexes");

    rocket::build()
        .attach(LoggerFairing)
        .attach(ConfigFairing)
        .manage(db_client)
        .manage(db)
        .mount("/", api::routes())
        .register("/", api::catchers())
}
