use chrono::{DateTime, Utc};
use mongodb::bson::DateTime as BsonDateTime;
use serde::{Deserialize, Serialize};

use crate::model::{api::election::ElectionSpec, common::election::ElectionStatus, mongodb::Id};

/// An election, as stored in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Election {
    #[serde(rename = "_id")]
    pub id: Id,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Ballots are rejected before this instant, if set.
    pub start_time: Option<BsonDateTime>,
    /// Ballots are rejected from this instant onwards, if set.
    pub end_time: Option<BsonDateTime>,
    pub status: ElectionStatus,
    /// Listed on the public real-count display.
    #[serde(default)]
    pub show_in_real_count: bool,
    /// Highlighted as the main election on the real-count display. At most one.
    #[serde(default)]
    pub is_main_in_real_count: bool,
    /// Whether witnesses sign the recapitulation report.
    #[serde(default)]
    pub use_witnesses: bool,
}

impl Election {
    /// Create a new election from an admin's specification.
    pub fn from_spec(spec: ElectionSpec) -> Self {
        Self {
            id: Id::new(),
            name: spec.name,
            description: spec.description.unwrap_or_default(),
            start_time: spec.start_time.map(BsonDateTime::from_chrono),
            end_time: spec.end_time.map(BsonDateTime::from_chrono),
            status: spec.status.unwrap_or_default(),
            show_in_real_count: spec.show_in_real_count.unwrap_or(false),
            is_main_in_real_count: spec.is_main_in_real_count.unwrap_or(false),
            use_witnesses: spec.use_witnesses.unwrap_or(false),
        }
    }

    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.start_time.map(BsonDateTime::to_chrono)
    }

    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.end_time.map(BsonDateTime::to_chrono)
    }

    /// Does this election accept ballots at the given instant?
    ///
    /// Requires an active status, `now` at or after the start time (if any),
    /// and `now` strictly before the end time (if any).
    pub fn accepts_ballots_at(&self, now: DateTime<Utc>) -> bool {
        self.status == ElectionStatus::Active
            && self.start_time().map_or(true, |start| now >= start)
            && self.end_time().map_or(true, |end| now < end)
    }
}

/// Example data for tests.
#[cfg(test)]
pub(crate) mod examples {
    use chrono::Duration;

    use super::*;

    impl Election {
        /// An active election with no schedule restrictions.
        pub fn open_example() -> Self {
            Self {
                id: Id::new(),
                name: "Student Council 2026".to_string(),
                description: "Chair and vice chair".to_string(),
                start_time: None,
                end_time: None,
                status: ElectionStatus::Active,
                show_in_real_count: true,
                is_main_in_real_count: true,
                use_witnesses: false,
            }
        }

        /// An election that has not been activated yet.
        pub fn pending_example() -> Self {
            Self {
                status: ElectionStatus::Pending,
                name: "Treasurer 2026".to_string(),
                is_main_in_real_count: false,
                ..Self::open_example()
            }
        }

        /// An active election whose window opens in an hour.
        pub fn future_example() -> Self {
            Self {
                start_time: Some(BsonDateTime::from_chrono(Utc::now() + Duration::hours(1))),
                name: "Sports Captain 2026".to_string(),
                is_main_in_real_count: false,
                ..Self::open_example()
            }
        }

        /// An active election whose window closed an hour ago.
        pub fn finished_example() -> Self {
            Self {
                start_time: Some(BsonDateTime::from_chrono(Utc::now() - Duration::days(1))),
                end_time: Some(BsonDateTime::from_chrono(Utc::now() - Duration::hours(1))),
                name: "Class Rep 2025".to_string(),
                is_main_in_real_count: false,
                ..Self::open_example()
            }
        }
    }
}
