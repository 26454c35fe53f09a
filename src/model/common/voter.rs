use serde::{Deserialize, Serialize};

/// A voter's recorded gender, used to cross-tabulate participation.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}
