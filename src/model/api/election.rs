use std::collections::HashSet;

use chrono::{DateTime, Utc};
use mongodb::bson::DateTime as BsonDateTime;
use serde::{Deserialize, Serialize};

use crate::model::{
    common::election::ElectionStatus,
    db::{candidate::Candidate, category::Category, election::Election},
    mongodb::Id,
};

/// A new election, as specified by an admin.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElectionSpec {
    pub name: String,
    pub description: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    /// Defaults to pending.
    pub status: Option<ElectionStatus>,
    pub show_in_real_count: Option<bool>,
    pub is_main_in_real_count: Option<bool>,
    pub use_witnesses: Option<bool>,
}

/// Changes to an existing election. Absent fields are left alone.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElectionUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub status: Option<ElectionStatus>,
    pub show_in_real_count: Option<bool>,
    pub is_main_in_real_count: Option<bool>,
    pub use_witnesses: Option<bool>,
}

impl ElectionUpdate {
    /// Apply these changes to the given election.
    pub fn apply_to(self, election: &mut Election) {
        if let Some(name) = self.name {
            election.name = name;
        }
        if let Some(description) = self.description {
            election.description = description;
        }
        if let Some(start_time) = self.start_time {
            election.start_time = Some(BsonDateTime::from_chrono(start_time));
        }
        if let Some(end_time) = self.end_time {
            election.end_time = Some(BsonDateTime::from_chrono(end_time));
        }
        if let Some(status) = self.status {
            election.status = status;
        }
        if let Some(show) = self.show_in_real_count {
            election.show_in_real_count = show;
        }
        if let Some(main) = self.is_main_in_real_count {
            election.is_main_in_real_count = main;
        }
        if let Some(witnesses) = self.use_witnesses {
            election.use_witnesses = witnesses;
        }
    }
}

/// Check an election is well-formed: named, and with a window that ends
/// after it starts.
pub fn check_election(election: &Election) -> Result<(), String> {
    if election.name.trim().is_empty() {
        return Err("Election name must not be empty".to_string());
    }
    if let (Some(start), Some(end)) = (election.start_time, election.end_time) {
        if start >= end {
            return Err("Election must end after it starts".to_string());
        }
    }
    Ok(())
}

/// An API-friendly election description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElectionDescription {
    pub id: Id,
    pub name: String,
    pub description: String,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub status: ElectionStatus,
    pub show_in_real_count: bool,
    pub is_main_in_real_count: bool,
    pub use_witnesses: bool,
}

impl From<Election> for ElectionDescription {
    fn from(election: Election) -> Self {
        Self {
            id: election.id,
            start_time: election.start_time(),
            end_time: election.end_time(),
            name: election.name,
            description: election.description,
            status: election.status,
            show_in_real_count: election.show_in_real_count,
            is_main_in_real_count: election.is_main_in_real_count,
            use_witnesses: election.use_witnesses,
        }
    }
}

/// A new candidate, as specified by an admin.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateSpec {
    pub name: String,
    pub running_mate: Option<String>,
    /// Defaults to one past the election's highest order number.
    pub order_number: Option<i32>,
    pub vision: Option<String>,
    pub mission: Option<String>,
    pub photo_url: Option<String>,
}

impl CandidateSpec {
    /// Create the candidate, with the given order number unless one was specified.
    pub fn into_candidate(self, election_id: Id, next_order_number: i32) -> Candidate {
        Candidate {
            id: Id::new(),
            election_id,
            name: self.name,
            running_mate: self.running_mate,
            order_number: self.order_number.unwrap_or(next_order_number),
            vision: self.vision,
            mission: self.mission,
            photo_url: self.photo_url,
        }
    }
}

/// An API-friendly candidate description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateDescription {
    pub id: Id,
    pub election_id: Id,
    pub name: String,
    pub running_mate: Option<String>,
    pub order_number: i32,
    pub vision: Option<String>,
    pub mission: Option<String>,
    pub photo_url: Option<String>,
}

impl From<Candidate> for CandidateDescription {
    fn from(candidate: Candidate) -> Self {
        Self {
            id: candidate.id,
            election_id: candidate.election_id,
            name: candidate.name,
            running_mate: candidate.running_mate,
            order_number: candidate.order_number,
            vision: candidate.vision,
            mission: candidate.mission,
            photo_url: candidate.photo_url,
        }
    }
}

/// A new voter category.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySpec {
    pub name: String,
    #[serde(default)]
    pub allowed_elections: HashSet<Id>,
}

impl From<CategorySpec> for Category {
    fn from(spec: CategorySpec) -> Self {
        Category::new(spec.name, spec.allowed_elections)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDescription {
    pub id: Id,
    pub name: String,
    pub allowed_elections: HashSet<Id>,
}

impl From<Category> for CategoryDescription {
    fn from(category: Category) -> Self {
        Self {
            id: category.id,
            name: category.name,
            allowed_elections: category.allowed_elections,
        }
    }
}

/// An election as seen by one eligible voter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoterElection {
    #[serde(flatten)]
    pub election: ElectionDescription,
    /// Candidates in ballot order.
    pub candidates: Vec<CandidateDescription>,
    /// Whether this voter has voted in the election.
    pub has_voted: bool,
    /// Whether the election accepts ballots right now.
    pub is_open: bool,
}
