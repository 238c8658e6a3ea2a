//! Score input aggregation.
//!
//! `ScoreEntryState` holds every selected tool's subtest inputs and its
//! conversion result. All transitions are plain methods on the state; the
//! caller owns it and decides when to persist.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ValidationError;
use crate::models::{SubtestInput, SubtestInputPatch, ToolApiResult, ToolId, ToolScoreData};
use crate::utils::items_within;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreEntryState {
    pub tools: BTreeMap<ToolId, ToolScoreData>,
    #[serde(rename = "integratedSummary", default)]
    pub integrated_summary: Option<String>,
}

impl ScoreEntryState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create empty inputs for `tool`. Does nothing if the tool already has
    /// state, so re-selecting a tool keeps what was entered.
    pub fn init_tool<S: AsRef<str>>(&mut self, tool: ToolId, subtests: &[S]) {
        self.tools.entry(tool).or_insert_with(|| {
            debug!(tool = %tool, count = subtests.len(), "Initialized tool inputs");
            ToolScoreData::with_subtests(subtests)
        });
    }

    /// `init_tool` with the registry's input subtests.
    pub fn init_default(&mut self, tool: ToolId) {
        self.init_tool(tool, &tool.input_subtests());
    }

    /// Replace the raw score of one cell. No range check.
    pub fn set_score(&mut self, tool: ToolId, subtest: &str, score: Option<u32>) {
        self.cell_mut(tool, subtest).raw_score = score;
    }

    /// Merge item lists (and optionally the score) into one cell.
    pub fn set_input(&mut self, tool: ToolId, subtest: &str, patch: SubtestInputPatch) {
        patch.apply(self.cell_mut(tool, subtest));
    }

    /// Form-level score entry: checks the tool's published bounds. An
    /// out-of-range value is not kept; the cell is cleared and the error
    /// returned for display.
    pub fn enter_score(
        &mut self,
        tool: ToolId,
        subtest: &str,
        value: Option<i64>,
    ) -> Result<(), ValidationError> {
        let bounds = tool
            .score_bounds(subtest)
            .ok_or_else(|| ValidationError::UnknownSubtest {
                tool,
                subtest: subtest.to_string(),
            })?;

        let Some(value) = value else {
            self.set_score(tool, subtest, None);
            return Ok(());
        };

        if !bounds.contains(value) {
            self.set_score(tool, subtest, None);
            return Err(ValidationError::ScoreOutOfRange {
                tool,
                subtest: subtest.to_string(),
                value,
                min: bounds.min,
                max: bounds.max,
            });
        }

        self.set_score(tool, subtest, Some(value as u32));
        Ok(())
    }

    /// Check a subtest's item lists against the tool's item numbering.
    pub fn validate_items(&self, tool: ToolId, subtest: &str) -> Result<(), ValidationError> {
        let (Some((min, max)), Some(input)) = (tool.item_range(subtest), self.input(tool, subtest))
        else {
            return Ok(());
        };
        for list in [&input.correct_items, &input.wrong_items] {
            items_within(list, min, max).map_err(|item| ValidationError::ItemOutOfRange {
                tool,
                subtest: subtest.to_string(),
                item,
                min,
                max,
            })?;
        }
        Ok(())
    }

    pub fn input(&self, tool: ToolId, subtest: &str) -> Option<&SubtestInput> {
        self.tools.get(&tool).and_then(|data| data.inputs.get(subtest))
    }

    /// True iff every required subtest of `tool` has a raw score. Tools with
    /// no declared requirement are never complete.
    pub fn is_tool_complete(&self, tool: ToolId) -> bool {
        let Some(data) = self.tools.get(&tool) else {
            return false;
        };
        let required = tool.required_subtests();
        if required.is_empty() {
            return false;
        }
        required.iter().all(|subtest| {
            data.inputs
                .get(*subtest)
                .map(|input| input.raw_score.is_some())
                .unwrap_or(false)
        })
    }

    /// Sum of all input subtests, once every one has a score.
    pub fn total_score(&self, tool: ToolId) -> Option<u32> {
        let data = self.tools.get(&tool)?;
        if data.inputs.is_empty() {
            return None;
        }
        data.inputs
            .values()
            .map(|input| input.raw_score)
            .sum::<Option<u32>>()
    }

    pub fn set_api_result(&mut self, tool: ToolId, result: ToolApiResult) {
        if let Some(data) = self.tools.get_mut(&tool) {
            data.api_result = Some(result);
        }
    }

    pub fn set_integrated_summary(&mut self, summary: Option<String>) {
        self.integrated_summary = summary;
    }

    pub fn result(&self, tool: ToolId) -> Option<&ToolApiResult> {
        self.tools.get(&tool).and_then(|data| data.api_result.as_ref())
    }

    pub fn has_results(&self) -> bool {
        self.tools.values().any(|data| data.api_result.is_some())
    }

    /// Reset every cell of `tool` and drop its result, keeping the subtest keys.
    pub fn clear_tool(&mut self, tool: ToolId) {
        if let Some(data) = self.tools.get_mut(&tool) {
            for input in data.inputs.values_mut() {
                *input = SubtestInput::default();
            }
            data.api_result = None;
        }
    }

    /// Drop every stored result and the integrated summary; inputs stay.
    pub fn clear_results(&mut self) {
        for data in self.tools.values_mut() {
            data.api_result = None;
        }
        self.integrated_summary = None;
    }

    /// Drop all state, e.g. when the tool selection changes.
    pub fn clear_all(&mut self) {
        self.tools.clear();
        self.integrated_summary = None;
    }

    /// Drop state of tools no longer selected.
    pub fn retain_tools(&mut self, selected: &[ToolId]) {
        self.tools.retain(|tool, _| selected.contains(tool));
    }

    fn cell_mut(&mut self, tool: ToolId, subtest: &str) -> &mut SubtestInput {
        self.tools
            .entry(tool)
            .or_default()
            .inputs
            .entry(subtest.to_string())
            .or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ToolResultData;

    fn result(text: &str) -> ToolApiResult {
        ToolApiResult {
            text: text.to_string(),
            data: ToolResultData::Unstructured(serde_json::json!({})),
        }
    }

    #[test]
    fn test_init_tool_creates_default_cells() {
        let mut state = ScoreEntryState::new();
        state.init_default(ToolId::Selsi);
        let data = &state.tools[&ToolId::Selsi];
        assert_eq!(data.inputs.len(), 2);
        assert_eq!(data.inputs["receptive"], SubtestInput::default());
        assert!(data.api_result.is_none());
    }

    #[test]
    fn test_init_tool_does_not_wipe_existing_data() {
        let mut state = ScoreEntryState::new();
        state.init_default(ToolId::Selsi);
        state.set_score(ToolId::Selsi, "receptive", Some(30));
        state.init_default(ToolId::Selsi);
        assert_eq!(state.input(ToolId::Selsi, "receptive").unwrap().raw_score, Some(30));
    }

    #[test]
    fn test_set_score_touches_one_cell() {
        let mut state = ScoreEntryState::new();
        state.init_default(ToolId::Selsi);
        state.set_input(ToolId::Selsi, "receptive", SubtestInputPatch::correct_items("1-3"));
        state.set_score(ToolId::Selsi, "receptive", Some(99));
        let cell = state.input(ToolId::Selsi, "receptive").unwrap();
        assert_eq!(cell.raw_score, Some(99));
        assert_eq!(cell.correct_items, "1-3");
        assert_eq!(state.input(ToolId::Selsi, "expressive").unwrap().raw_score, None);
    }

    #[test]
    fn test_set_input_keeps_score() {
        let mut state = ScoreEntryState::new();
        state.init_default(ToolId::ProblemSolving);
        state.set_score(ToolId::ProblemSolving, "cause_reason", Some(7));
        state.set_input(
            ToolId::ProblemSolving,
            "cause_reason",
            SubtestInputPatch::example_items("1, 2"),
        );
        let cell = state.input(ToolId::ProblemSolving, "cause_reason").unwrap();
        assert_eq!(cell.raw_score, Some(7));
        assert_eq!(cell.example_items.as_deref(), Some("1, 2"));
    }

    #[test]
    fn test_enter_score_rejects_out_of_range() {
        let mut state = ScoreEntryState::new();
        state.init_default(ToolId::Selsi);
        state.enter_score(ToolId::Selsi, "receptive", Some(30)).unwrap();

        let err = state.enter_score(ToolId::Selsi, "receptive", Some(55)).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::ScoreOutOfRange { value: 55, min: 0, max: Some(54), .. }
        ));
        assert_eq!(state.input(ToolId::Selsi, "receptive").unwrap().raw_score, None);

        assert!(state.enter_score(ToolId::Pres, "receptive", Some(0)).is_err());
        assert!(state.enter_score(ToolId::Selsi, "receptive", Some(-1)).is_err());
        assert!(state.enter_score(ToolId::Selsi, "combined", Some(3)).is_err());

        let err = state.enter_score(ToolId::Revt, "receptive", Some(-2)).unwrap_err();
        assert!(matches!(err, ValidationError::ScoreOutOfRange { min: 0, max: None, .. }));

        state.enter_score(ToolId::Selsi, "receptive", Some(54)).unwrap();
        state.enter_score(ToolId::Selsi, "receptive", None).unwrap();
        assert_eq!(state.input(ToolId::Selsi, "receptive").unwrap().raw_score, None);
    }

    #[test]
    fn test_is_tool_complete_all_combinations() {
        for receptive in [None, Some(10)] {
            for expressive in [None, Some(12)] {
                let mut state = ScoreEntryState::new();
                state.init_default(ToolId::Selsi);
                state.set_score(ToolId::Selsi, "receptive", receptive);
                state.set_score(ToolId::Selsi, "expressive", expressive);
                assert_eq!(
                    state.is_tool_complete(ToolId::Selsi),
                    receptive.is_some() && expressive.is_some()
                );
            }
        }
    }

    #[test]
    fn test_is_tool_complete_false_without_state_or_requirements() {
        let mut state = ScoreEntryState::new();
        assert!(!state.is_tool_complete(ToolId::Selsi));

        state.init_default(ToolId::Syntax);
        state.set_score(ToolId::Syntax, "total", Some(40));
        assert!(!state.is_tool_complete(ToolId::Syntax));
    }

    #[test]
    fn test_zero_counts_as_entered() {
        let mut state = ScoreEntryState::new();
        state.init_default(ToolId::Selsi);
        state.set_score(ToolId::Selsi, "receptive", Some(0));
        state.set_score(ToolId::Selsi, "expressive", Some(0));
        assert!(state.is_tool_complete(ToolId::Selsi));
    }

    #[test]
    fn test_total_score() {
        let mut state = ScoreEntryState::new();
        state.init_default(ToolId::ProblemSolving);
        state.set_score(ToolId::ProblemSolving, "cause_reason", Some(5));
        state.set_score(ToolId::ProblemSolving, "clue_guessing", Some(6));
        assert_eq!(state.total_score(ToolId::ProblemSolving), None);
        state.set_score(ToolId::ProblemSolving, "solution_inference", Some(7));
        assert_eq!(state.total_score(ToolId::ProblemSolving), Some(18));
        assert_eq!(state.total_score(ToolId::Cplc), None);
    }

    #[test]
    fn test_validate_items() {
        let mut state = ScoreEntryState::new();
        state.init_default(ToolId::Cplc);
        state.set_input(
            ToolId::Cplc,
            "contextual_variation",
            SubtestInputPatch::correct_items("12-15, 24"),
        );
        assert!(state.validate_items(ToolId::Cplc, "contextual_variation").is_ok());

        state.set_input(ToolId::Cplc, "contextual_variation", SubtestInputPatch::wrong_items("11"));
        assert!(matches!(
            state.validate_items(ToolId::Cplc, "contextual_variation"),
            Err(ValidationError::ItemOutOfRange { item: 11, min: 12, max: 24, .. })
        ));

        state.set_input(
            ToolId::Cplc,
            "contextual_variation",
            SubtestInputPatch::wrong_items("12-4294967295"),
        );
        assert!(matches!(
            state.validate_items(ToolId::Cplc, "contextual_variation"),
            Err(ValidationError::ItemOutOfRange { item: 4294967295, .. })
        ));

        // Tools without item numbering accept anything.
        assert!(state.validate_items(ToolId::Selsi, "receptive").is_ok());
    }

    #[test]
    fn test_clear_tool_keeps_keys() {
        let mut state = ScoreEntryState::new();
        state.init_default(ToolId::Selsi);
        state.set_score(ToolId::Selsi, "receptive", Some(10));
        state.set_api_result(ToolId::Selsi, result("ok"));
        state.clear_tool(ToolId::Selsi);

        let data = &state.tools[&ToolId::Selsi];
        assert_eq!(data.inputs.len(), 2);
        assert!(data.inputs.values().all(SubtestInput::is_empty));
        assert!(data.api_result.is_none());
    }

    #[test]
    fn test_clear_results_and_clear_all() {
        let mut state = ScoreEntryState::new();
        state.init_default(ToolId::Selsi);
        state.set_score(ToolId::Selsi, "receptive", Some(10));
        state.set_api_result(ToolId::Selsi, result("ok"));
        state.set_integrated_summary(Some("summary".to_string()));
        assert!(state.has_results());

        state.clear_results();
        assert!(!state.has_results());
        assert!(state.integrated_summary.is_none());
        assert_eq!(state.input(ToolId::Selsi, "receptive").unwrap().raw_score, Some(10));

        state.clear_all();
        assert!(state.tools.is_empty());
    }

    #[test]
    fn test_set_api_result_ignores_unknown_tool() {
        let mut state = ScoreEntryState::new();
        state.set_api_result(ToolId::Pres, result("ok"));
        assert!(state.result(ToolId::Pres).is_none());
    }

    #[test]
    fn test_retain_tools() {
        let mut state = ScoreEntryState::new();
        state.init_default(ToolId::Selsi);
        state.init_default(ToolId::Pres);
        state.retain_tools(&[ToolId::Pres]);
        assert_eq!(state.tools.keys().copied().collect::<Vec<_>>(), vec![ToolId::Pres]);
    }
}
