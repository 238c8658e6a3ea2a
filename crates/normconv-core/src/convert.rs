//! Unified conversion: one request for every selected tool.
//!
//! `build_request` turns the child's info and the entered scores into the
//! service's request shape, `apply_response` writes the results back, and
//! `submit` does both around the network call. A failed submission leaves
//! previously stored results untouched.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::age::AgeResult;
use crate::api::{ApiClient, ApiError};
use crate::models::{ChildInfo, Gender, ToolApiResult, ToolId, ToolResultData};
use crate::scores::ScoreEntryState;
use crate::selection::SelectionState;

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct ChildDescriptor {
    pub name: String,
    pub gender: Gender,
    #[serde(rename = "ageYears")]
    pub age_years: u32,
    /// Total age in whole months (rounded), the value norms are looked up by.
    #[serde(rename = "ageMonths")]
    pub age_months: u32,
    /// Months past the last full year.
    #[serde(rename = "ageRemainingMonths")]
    pub age_remaining_months: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct SubtestPayload {
    #[serde(rename = "rawScore")]
    pub raw_score: Option<u32>,
    #[serde(rename = "correctItems")]
    pub correct_items: String,
    #[serde(rename = "wrongItems")]
    pub wrong_items: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct UnifiedConvertRequest {
    #[serde(rename = "childInfo")]
    pub child_info: ChildDescriptor,
    pub tools: BTreeMap<ToolId, BTreeMap<String, SubtestPayload>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResultWire {
    pub text: String,
    #[serde(default)]
    pub data: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnifiedConvertResponse {
    /// Keyed by wire tool id. Kept as strings so an id this client does not
    /// know about does not fail the whole response.
    #[serde(default)]
    pub results: BTreeMap<String, Option<ToolResultWire>>,
    #[serde(rename = "integratedSummary", default)]
    pub integrated_summary: Option<String>,
}

/// Single-subtest conversion request (`/api/norm/{tool}/convert`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct SingleConvertRequest {
    pub tool: ToolId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtest: Option<String>,
    #[serde(rename = "rawScore")]
    pub raw_score: u32,
    #[serde(rename = "ageMonths")]
    pub age_months: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct SingleConvertResponse {
    #[serde(rename = "standardScore", default)]
    pub standard_score: Option<f64>,
    #[serde(default)]
    pub percentile: Option<f64>,
    #[serde(default)]
    pub grade: Option<String>,
    #[serde(rename = "equivalentAge", default)]
    pub equivalent_age: Option<u32>,
    #[serde(rename = "sdRange", default)]
    pub sd_range: Option<String>,
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Error, Debug)]
pub enum SubmitError {
    #[error("child information is missing or invalid")]
    MissingChildInfo,

    #[error("no supported assessment tool is selected")]
    NothingToSubmit,

    #[error("scores are incomplete for: {}", tool_names(.0))]
    Incomplete(Vec<ToolId>),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("invalid {tool} result: {message}")]
    InvalidResponse { tool: ToolId, message: String },
}

impl SubmitError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, SubmitError::Api(e) if e.is_unauthorized())
    }
}

fn tool_names(tools: &[ToolId]) -> String {
    tools.iter().map(|t| t.name()).collect::<Vec<_>>().join(", ")
}

// ============================================================================
// Building and applying
// ============================================================================

/// Tools that would be sent: selected and supported by the service.
pub fn submittable_tools(selection: &SelectionState) -> Vec<ToolId> {
    selection.active()
}

/// Selected, supported tools whose required scores are missing.
pub fn incomplete_tools(selection: &SelectionState, scores: &ScoreEntryState) -> Vec<ToolId> {
    submittable_tools(selection)
        .into_iter()
        .filter(|tool| !scores.is_tool_complete(*tool))
        .collect()
}

/// Assemble the unified request. Fails without building anything when any
/// submittable tool is incomplete.
pub fn build_request(
    child: &ChildInfo,
    age: &AgeResult,
    selection: &SelectionState,
    scores: &ScoreEntryState,
) -> Result<UnifiedConvertRequest, SubmitError> {
    let tools = submittable_tools(selection);
    if tools.is_empty() {
        return Err(SubmitError::NothingToSubmit);
    }

    let incomplete = incomplete_tools(selection, scores);
    if !incomplete.is_empty() {
        return Err(SubmitError::Incomplete(incomplete));
    }

    let mut payload = BTreeMap::new();
    for tool in tools {
        let Some(data) = scores.tools.get(&tool) else {
            continue;
        };
        let subtests = data
            .inputs
            .iter()
            .map(|(subtest, input)| {
                (
                    subtest.clone(),
                    SubtestPayload {
                        raw_score: input.raw_score,
                        correct_items: input.correct_items.clone(),
                        wrong_items: input.wrong_items.clone(),
                    },
                )
            })
            .collect();
        payload.insert(tool, subtests);
    }

    Ok(UnifiedConvertRequest {
        child_info: ChildDescriptor {
            name: child.name.clone(),
            gender: child.gender,
            age_years: age.years,
            age_months: age.total_months,
            age_remaining_months: age.months,
        },
        tools: payload,
    })
}

/// Write a response into `scores`, replacing all earlier results. Every
/// tool's data is decoded before anything is written, so a malformed
/// response changes nothing.
pub fn apply_response(
    scores: &mut ScoreEntryState,
    response: UnifiedConvertResponse,
) -> Result<(), SubmitError> {
    let mut decoded = Vec::new();
    for (id, result) in response.results {
        let Some(result) = result else {
            continue;
        };
        let tool = match id.parse::<ToolId>() {
            Ok(tool) => tool,
            Err(_) => {
                warn!(tool = %id, "Ignoring result for unknown tool");
                continue;
            }
        };
        let data = ToolResultData::decode(tool, result.data).map_err(|e| {
            SubmitError::InvalidResponse {
                tool,
                message: e.to_string(),
            }
        })?;
        decoded.push((
            tool,
            ToolApiResult {
                text: result.text,
                data,
            },
        ));
    }

    // Results are replaced wholesale; a tool missing from this response
    // must not keep the previous one.
    scores.clear_results();
    for (tool, result) in decoded {
        scores.set_api_result(tool, result);
    }
    scores.set_integrated_summary(response.integrated_summary.filter(|s| !s.is_empty()));
    Ok(())
}

/// Validate, send and apply one unified conversion.
///
/// The completeness check runs here, immediately before sending, even if the
/// caller already checked. On error `scores` is unchanged.
pub async fn submit(
    client: &ApiClient,
    child: Option<&ChildInfo>,
    selection: &SelectionState,
    scores: &mut ScoreEntryState,
) -> Result<(), SubmitError> {
    let child = child.ok_or(SubmitError::MissingChildInfo)?;
    let age = child.age().map_err(|_| SubmitError::MissingChildInfo)?;
    let request = build_request(child, &age, selection, scores)?;

    info!(
        tools = request.tools.len(),
        age_months = age.total_months,
        "Requesting unified conversion"
    );
    let response = client.convert_unified(&request).await?;

    apply_response(scores, response)?;
    info!("Conversion results stored");
    Ok(())
}
