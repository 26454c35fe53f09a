//! Data model: what is stored, what travels over the API, and the glue
//! between them and MongoDB.

pub mod api;
pub mod auth;
pub mod common;
pub mod db;
pub mod mongodb;
