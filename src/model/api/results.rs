use std::ops::Sub;

use serde::{Deserialize, Serialize};

use crate::model::{
    common::{committee::CommitteeMember, voter::Gender},
    mongodb::Id,
};

use super::election::{CandidateDescription, ElectionDescription};

/// One candidate's ballot count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateResult {
    #[serde(flatten)]
    pub candidate: CandidateDescription,
    pub votes: u64,
}

/// A head count, split by gender. Voters without a recorded gender appear
/// only in the total.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breakdown {
    pub total: u64,
    pub male: u64,
    pub female: u64,
}

impl Breakdown {
    /// Count one person.
    pub fn add(&mut self, gender: Option<Gender>) {
        self.total += 1;
        match gender {
            Some(Gender::Male) => self.male += 1,
            Some(Gender::Female) => self.female += 1,
            None => {}
        }
    }
}

impl Sub for Breakdown {
    type Output = Self;

    /// Panics if any count of `rhs` exceeds `self`, i.e. if `rhs` is not a
    /// subset of `self`.
    fn sub(self, rhs: Self) -> Self {
        Self {
            total: self.total - rhs.total,
            male: self.male - rhs.male,
            female: self.female - rhs.female,
        }
    }
}

/// Turnout for one election.
///
/// `not_voted` is always `eligible - voted`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipationStats {
    pub eligible: Breakdown,
    pub voted: Breakdown,
    pub not_voted: Breakdown,
}

/// Per-candidate results for one election on the public real-count display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RealCount {
    pub election_id: Id,
    pub name: String,
    pub is_main_in_real_count: bool,
    /// In ballot order, including candidates with no votes.
    pub results: Vec<CandidateResult>,
    pub total_ballots: u64,
}

/// The full post-election report for one election.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recapitulation {
    pub election: ElectionDescription,
    /// In ballot order, including candidates with no votes.
    pub results: Vec<CandidateResult>,
    pub total_ballots: u64,
    pub participation: ParticipationStats,
    /// Members of every committee linked to the election, committee by
    /// committee in name order.
    pub signatories: Vec<CommitteeMember>,
    /// One witness signature line per candidate, in ballot order. Empty
    /// unless the election uses witnesses.
    pub witness_slots: Vec<CandidateDescription>,
}

/// Outcome of recomputing voters' flags from ballots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileReport {
    /// Voters checked.
    pub checked: u64,
    /// Flags that were missing for a cast ballot.
    pub set: u64,
    /// Flags that claimed a ballot that does not exist.
    pub cleared: u64,
}

/// A bulk administrative action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResetAction {
    /// Delete every ballot and clear every voter's flags.
    ResetVotes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetRequest {
    pub action: ResetAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetReport {
    pub deleted_ballots: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn breakdowns_count_unknown_gender_in_total_only() {
        let mut breakdown = Breakdown::default();
        breakdown.add(Some(Gender::Male));
        breakdown.add(Some(Gender::Female));
        breakdown.add(Some(Gender::Female));
        breakdown.add(None);
        assert_eq!(
            Breakdown {
                total: 4,
                male: 1,
                female: 2
            },
            breakdown
        );
    }

    #[test]
    fn participation_nests_a_breakdown_per_group() {
        let stats = ParticipationStats {
            eligible: Breakdown { total: 3, male: 1, female: 1 },
            voted: Breakdown { total: 1, male: 0, female: 1 },
            not_voted: Breakdown { total: 2, male: 1, female: 0 },
        };
        let json = rocket::serde::json::to_value(stats).unwrap();
        assert_eq!(
            rocket::serde::json::serde_json::json!({
                "eligible": { "total": 3, "male": 1, "female": 1 },
                "voted": { "total": 1, "male": 0, "female": 1 },
                "notVoted": { "total": 2, "male": 1, "female": 0 },
            }),
            json
        );
    }

    #[test]
    fn reset_action_uses_its_wire_name() {
        let request: ResetRequest =
            rocket::serde::json::from_str(r#"{"action":"resetVotes"}"#).unwrap();
        assert_eq!(ResetAction::ResetVotes, request.action);
        assert!(rocket::serde::json::from_str::<ResetRequest>(r#"{"action":"nuke"}"#).is_err());
    }
}
