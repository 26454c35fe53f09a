use mongodb::bson::doc;
use rocket::{
    http::{Cookie, CookieJar, Status},
    serde::json::Json,
    Route, State,
};

use crate::{
    error::{Error, Result},
    model::{
        api::auth::{AdminCredentials, VoterCredentials},
        auth::{AuthToken, AUTH_TOKEN_COOKIE},
        db::{admin::Admin, voter::Voter},
        mongodb::Coll,
    },
    Config,
};

pub fn routes() -> Vec<Route> {
    routes![authenticate_admin, authenticate_voter, logout]
}

#[post("/auth/admin", data = "<credentials>", format = "json")]
pub async fn authenticate_admin(
    cookies: &CookieJar<'_>,
    credentials: Json<AdminCredentials>,
    admins: Coll<Admin>,
    config: &State<Config>,
) -> Result<()> {
    let with_username = doc! {
        "username": &credentials.username
    };

    let admin = admins
        .find_one(with_username, None)
        .await?
        .filter(|admin| admin.verify_password(&credentials.password))
        .ok_or_else(|| {
            Error::Unauthorized(
                "No admin found with the provided username and password combination.".to_string(),
            )
        })?;

    let token = AuthToken::new(&admin);
    cookies.add(token.into_cookie(config));

    Ok(())
}

#[post("/auth/voter", data = "<credentials>", format = "json")]
pub async fn authenticate_voter(
    cookies: &CookieJar<'_>,
    credentials: Json<VoterCredentials>,
    voters: Coll<Voter>,
    config: &State<Config>,
) -> Result<()> {
    // Unknown IDs and wrong passwords look the same to the caller.
    let voter = voters
        .find_one(doc! { "_id": &credentials.voter_id }, None)
        .await?
        .filter(|voter| voter.verify_password(&credentials.password))
        .ok_or_else(|| {
            Error::Unauthorized(
                "No voter found with the provided ID and password combination.".to_string(),
            )
        })?;

    let token = AuthToken::new(&voter);
    cookies.add(token.into_cookie(config));

    Ok(())
}

#[delete("/auth")]
pub fn logout(cookies: &CookieJar) -> Status {
    cookies.remove(Cookie::named(AUTH_TOKEN_COOKIE));
    Status::Ok
}
