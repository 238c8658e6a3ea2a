use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::ToolApiResult;

/// What the clinician entered for one subtest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct SubtestInput {
    #[serde(rename = "rawScore")]
    pub raw_score: Option<u32>,
    /// Item numbers answered correctly, e.g. "1, 2, 3-6".
    #[serde(rename = "correctItems", default)]
    pub correct_items: String,
    #[serde(rename = "wrongItems", default)]
    pub wrong_items: String,
    /// Instruction item numbers (language problem solving only).
    #[serde(rename = "exampleItems", default, skip_serializing_if = "Option::is_none")]
    pub example_items: Option<String>,
}

impl SubtestInput {
    pub fn is_empty(&self) -> bool {
        self.raw_score.is_none()
            && self.correct_items.is_empty()
            && self.wrong_items.is_empty()
            && self.example_items.as_deref().map(str::is_empty).unwrap_or(true)
    }
}

/// Partial update for a `SubtestInput`. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubtestInputPatch {
    pub raw_score: Option<Option<u32>>,
    pub correct_items: Option<String>,
    pub wrong_items: Option<String>,
    pub example_items: Option<String>,
}

impl SubtestInputPatch {
    pub fn correct_items(items: impl Into<String>) -> Self {
        Self {
            correct_items: Some(items.into()),
            ..Default::default()
        }
    }

    pub fn wrong_items(items: impl Into<String>) -> Self {
        Self {
            wrong_items: Some(items.into()),
            ..Default::default()
        }
    }

    pub fn example_items(items: impl Into<String>) -> Self {
        Self {
            example_items: Some(items.into()),
            ..Default::default()
        }
    }

    pub fn apply(self, input: &mut SubtestInput) {
        if let Some(score) = self.raw_score {
            input.raw_score = score;
        }
        if let Some(items) = self.correct_items {
            input.correct_items = items;
        }
        if let Some(items) = self.wrong_items {
            input.wrong_items = items;
        }
        if let Some(items) = self.example_items {
            input.example_items = Some(items);
        }
    }
}

/// Inputs and, once converted, the result for one selected tool.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolScoreData {
    pub inputs: BTreeMap<String, SubtestInput>,
    #[serde(rename = "apiResult", default)]
    pub api_result: Option<ToolApiResult>,
}

impl ToolScoreData {
    pub fn with_subtests<S: AsRef<str>>(subtests: &[S]) -> Self {
        Self {
            inputs: subtests
                .iter()
                .map(|s| (s.as_ref().to_string(), SubtestInput::default()))
                .collect(),
            api_result: None,
        }
    }
}
