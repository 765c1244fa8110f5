use serde::{Deserialize, Serialize};

use super::vote::{VoteTally, Votes};

pub const RESULT_SKIPPED: &str = "Skipped";
pub const RESULT_IMPOSTER_CAUGHT: &str = "IMPOSTER CAUGHT";
pub const RESULT_INNOCENT_EJECTED: &str = "INNOCENT EJECTED";

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MeetingStatus {
    #[default]
    Idle,
    Discussion,
    Results,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HighlightedLine {
    pub file_id: String,
    pub line: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Meeting {
    pub status: MeetingStatus,
    pub round: u64,
    pub caller_id: Option<String>,
    pub presenter_id: Option<String>,
    pub meeting_end_time: Option<i64>,
    pub results_end_time: Option<i64>,
    pub highlighted_line: Option<HighlightedLine>,
    pub votes: Votes,
    pub result: Option<String>,
    pub ejected_id: Option<String>,
    pub tally: Option<VoteTally>,
}

impl Meeting {
    pub fn remaining_ms(&self, now: i64) -> i64 {
        let deadline = match self.status {
            MeetingStatus::Idle => None,
            MeetingStatus::Discussion => self.meeting_end_time,
            MeetingStatus::Results => self.results_end_time,
        };
        deadline.map(|end| (end - now).max(0)).unwrap_or(0)
    }
}

/// What clients poll: the record plus a server-derived countdown.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingView {
    #[serde(flatten)]
    pub meeting: Meeting,
    pub remaining_ms: i64,
    pub server_time: i64,
}
