//! Result tree assembled by the traversal, mirrored 1:1 by the output JSON.
//!
//! Nodes are built bottom-up during a single descent and never mutated
//! afterwards. Child sequences keep source enumeration order.

use serde::{Deserialize, Serialize};

/// Votes for a single party on one ballot table. Leaf of the tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartyResult {
    pub party: String,
    pub votes: u64,
    pub percentage: f64,
}

/// One ballot table inside a polling school.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub number: String,
    pub scrutinized: f64,
    pub url: String,
    pub results: Vec<PartyResult>,
}

/// One polling school inside a city.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct School {
    pub name: String,
    pub scrutinized: f64,
    pub url: String,
    pub tables: Vec<Table>,
}

/// One city inside the municipality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    pub name: String,
    pub scrutinized: f64,
    pub url: String,
    pub schools: Vec<School>,
}

/// Root of the assembled tree: one municipality and everything below it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Municipality {
    pub name: String,
    pub voters: u64,
    pub total_voters: u64,
    pub scrutinized: f64,
    pub cities: Vec<City>,
}

impl Municipality {
    /// Total number of party-result leaves across the whole tree.
    pub fn leaf_count(&self) -> usize {
        self.cities
            .iter()
            .flat_map(|c| &c.schools)
            .flat_map(|s| &s.tables)
            .map(|t| t.results.len())
            .sum()
    }
}
