use serde::{Deserialize, Serialize};

use super::sabotage::SabotageType;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TestStatus {
    #[default]
    Pending,
    Pass,
    Fail,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastSabotage {
    #[serde(rename = "type")]
    pub kind: SabotageType,
    pub timestamp: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
pub struct ExecutionOutput {
    pub stdout: String,
    pub stderr: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeFile {
    pub id: String,
    pub name: String,
    pub language: String,
    pub content: String,
    pub expected_output: String,
    pub test_status: TestStatus,
    pub is_corrupted: bool,
    pub last_sabotage: Option<LastSabotage>,
    pub last_output: Option<ExecutionOutput>,
}

impl CodeFile {
    pub fn line_count(&self) -> usize {
        self.content.split('\n').count()
    }
}

/// PASS only on an exact, case-sensitive match once both ends are trimmed.
pub fn judge(stdout: &str, expected_output: &str) -> TestStatus {
    if stdout.trim() == expected_output.trim() {
        TestStatus::Pass
    } else {
        TestStatus::Fail
    }
}
