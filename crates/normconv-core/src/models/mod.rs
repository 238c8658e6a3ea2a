//! Data models for the norm conversion workflow.
//!
//! - `ChildInfo`, `Gender`: the child being assessed
//! - `ToolId`, `ToolMetadata`: the static assessment tool registry and its
//!   eligibility rules
//! - `SubtestInput`, `ToolScoreData`: clinician input per tool and subtest
//! - `ToolApiResult`, `ToolResultData`: conversion results per tool

pub mod child;
pub mod result;
pub mod score;
pub mod tool;

pub use child::{ChildInfo, Gender, MAX_NAME_LENGTH};
pub use result::{PresData, RevtData, SelsiData, SubtestOutcome, ToolApiResult, ToolResultData};
pub use score::{SubtestInput, SubtestInputPatch, ToolScoreData};
pub use tool::{
    disabled_reason, eligible_tools, is_age_in_range, is_tool_active, Category, DisabledReason,
    ScoreBounds, ToolId, ToolMetadata, ACTIVE_TOOLS, COMBINED_SUBTEST, TOOL_METADATA,
    TOTAL_SUBTEST,
};
