use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ToolId;

/// Norm-conversion outcome for one subtest. The service omits fields it
/// cannot compute (e.g. a percentile outside the norm table).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct SubtestOutcome {
    #[serde(rename = "rawScore", default)]
    pub raw_score: Option<u32>,
    #[serde(rename = "equivalentAge", alias = "equivalentAgeMonths", default)]
    pub equivalent_age_months: Option<u32>,
    #[serde(default)]
    pub percentile: Option<f64>,
    #[serde(rename = "standardScore", default)]
    pub standard_score: Option<f64>,
    #[serde(alias = "grade", default)]
    pub classification: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct SelsiData {
    pub receptive: SubtestOutcome,
    pub expressive: SubtestOutcome,
    #[serde(default)]
    pub combined: SubtestOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct PresData {
    pub receptive: SubtestOutcome,
    pub expressive: SubtestOutcome,
    #[serde(default)]
    pub combined: SubtestOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct RevtData {
    pub receptive: SubtestOutcome,
    pub expressive: SubtestOutcome,
}

/// Structured part of a tool's conversion result.
///
/// Tools with a published response shape get their own variant; the rest
/// keep the service's JSON as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ToolResultData {
    Selsi(SelsiData),
    Pres(PresData),
    Revt(RevtData),
    Unstructured(Value),
}

impl ToolResultData {
    /// Decode the `data` object the service returned for `tool`.
    pub fn decode(tool: ToolId, data: Value) -> Result<Self, serde_json::Error> {
        Ok(match tool {
            ToolId::Selsi => ToolResultData::Selsi(serde_json::from_value(data)?),
            ToolId::Pres => ToolResultData::Pres(serde_json::from_value(data)?),
            ToolId::Revt => ToolResultData::Revt(serde_json::from_value(data)?),
            ToolId::Syntax | ToolId::ProblemSolving | ToolId::Apac | ToolId::Cplc => {
                ToolResultData::Unstructured(data)
            }
        })
    }

    /// Labelled subtest rows for tabular display, in report order.
    /// Empty for unstructured data.
    pub fn rows(&self) -> Vec<(&'static str, &SubtestOutcome)> {
        match self {
            ToolResultData::Selsi(d) => vec![
                ("receptive", &d.receptive),
                ("expressive", &d.expressive),
                ("combined", &d.combined),
            ],
            ToolResultData::Pres(d) => vec![
                ("receptive", &d.receptive),
                ("expressive", &d.expressive),
                ("combined", &d.combined),
            ],
            ToolResultData::Revt(d) => vec![
                ("receptive", &d.receptive),
                ("expressive", &d.expressive),
            ],
            ToolResultData::Unstructured(_) => Vec::new(),
        }
    }
}

/// Result stored for a tool after a successful conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolApiResult {
    pub text: String,
    pub data: ToolResultData,
}
