use rocket::{http::Status, serde::json::Json, Catcher, Request, Route};

use crate::model::api::Message;

pub mod admin;
pub mod auth;
pub mod results;
pub mod voting;

pub fn routes() -> Vec<Route> {
    let mut routes = Vec::new();
    routes.extend(admin::routes());
    routes.extend(auth::routes());
    routes.extend(results::routes());
    routes.extend(voting::routes());
    routes
}

/// JSON bodies for failures Rocket produces before any handler runs.
pub fn catchers() -> Vec<Catcher> {
    catchers![bad_request, unauthorized, forbidden, not_found, unprocessable, internal]
}

#[catch(400)]
fn bad_request() -> Json<Message> {
    Json(Message::new("Malformed request."))
}

#[catch(401)]
fn unauthorized() -> Json<Message> {
    Json(Message::new("Please log in."))
}

#[catch(403)]
fn forbidden() -> Json<Message> {
    Json(Message::new("Access denied."))
}

#[catch(404)]
fn not_found(req: &Request<'_>) -> Json<Message> {
    Json(Message::new(format!("Nothing found at {}", req.uri().path())))
}

/// Well-formed JSON that does not fit the expected shape is still a bad
/// request as far as clients are concerned.
#[catch(422)]
fn unprocessable() -> (Status, Json<Message>) {
    (Status::BadRequest, Json(Message::new("Malformed request.")))
}

#[catch(500)]
fn internal() -> Json<Message> {
    Json(Message::new(
        "Something went wrong on the server. Please try again later.",
    ))
}
