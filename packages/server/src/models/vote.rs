use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub const SKIP: &str = "skip";

/// A ballot target: another player's id or the `"skip"` sentinel.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Candidate {
    Skip,
    Player(String),
}

impl Candidate {
    pub fn player_id(&self) -> Option<&str> {
        match self {
            Candidate::Skip => None,
            Candidate::Player(id) => Some(id),
        }
    }
}

impl From<String> for Candidate {
    fn from(value: String) -> Self {
        if value == SKIP {
            Candidate::Skip
        } else {
            Candidate::Player(value)
        }
    }
}

impl From<&str> for Candidate {
    fn from(value: &str) -> Self {
        Candidate::from(value.to_string())
    }
}

impl From<Candidate> for String {
    fn from(value: Candidate) -> Self {
        match value {
            Candidate::Skip => SKIP.to_string(),
            Candidate::Player(id) => id,
        }
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Candidate::Skip => write!(f, "{}", SKIP),
            Candidate::Player(id) => write!(f, "{}", id),
        }
    }
}

/// voterId -> candidate. One entry per voter, later writes overwrite.
pub type Votes = BTreeMap<String, Candidate>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TallyOutcome {
    Eject,
    Tie,
    SkipMajority,
    NoVotes,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteTally {
    pub winner: Option<String>,
    pub is_tie: bool,
    pub counts: BTreeMap<Candidate, u32>,
    pub outcome: TallyOutcome,
}
