//! Which voters may vote in which elections.
//!
//! Eligibility flows through categories only: a voter belongs to at most one
//! category, and a category lists the elections its members may vote in.
//! Anything missing along that path means "not eligible".

use std::collections::{HashMap, HashSet};

use crate::model::{
    db::{category::Category, voter::Voter},
    mongodb::Id,
};

/// A snapshot of the category table, answering eligibility questions in
/// both directions.
///
/// May hold every category or only the ones relevant to a query; a category
/// absent from the snapshot allows nothing.
#[derive(Debug, Clone, Default)]
pub struct EligibilityIndex {
    categories: HashMap<Id, Category>,
}

impl EligibilityIndex {
    pub fn new(categories: impl IntoIterator<Item = Category>) -> Self {
        Self {
            categories: categories.into_iter().map(|c| (c.id, c)).collect(),
        }
    }

    /// Elections open to members of the given category.
    ///
    /// Empty if the voter has no category or the category is unknown.
    pub fn elections_for_category(&self, category_id: Option<Id>) -> HashSet<Id> {
        category_id
            .and_then(|id| self.categories.get(&id))
            .map(|category| category.allowed_elections.clone())
            .unwrap_or_default()
    }

    /// Elections the voter is eligible to vote in.
    pub fn elections_for(&self, voter: &Voter) -> HashSet<Id> {
        self.elections_for_category(voter.category_id)
    }

    /// Is the voter eligible to vote in the given election?
    pub fn allows(&self, voter: &Voter, election_id: Id) -> bool {
        voter
            .category_id
            .and_then(|id| self.categories.get(&id))
            .map_or(false, |category| category.allows(election_id))
    }

    /// Categories whose members may vote in the given election.
    pub fn categories_allowing(&self, election_id: Id) -> HashSet<Id> {
        self.categories
            .values()
            .filter(|category| category.allows(election_id))
            .map(|category| category.id)
            .collect()
    }
}
