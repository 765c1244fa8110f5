use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Hero,
    Imposter,
    // 捕まった後も残るインポスター
    Reformed,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Hero => write!(f, "hero"),
            Role::Imposter => write!(f, "imposter"),
            Role::Reformed => write!(f, "reformed"),
        }
    }
}
