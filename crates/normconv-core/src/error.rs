use thiserror::Error;

use crate::models::{ScoreBounds, ToolId};

/// Input that fails a domain rule. Always recoverable: the caller shows the
/// message next to the offending field and keeps going.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("birth date must precede or equal test date")]
    InvalidDateRange,

    #[error("name is required")]
    EmptyName,

    #[error("name must be at most {max} characters (got {len})")]
    NameTooLong { len: usize, max: usize },

    #[error("{tool} {subtest}: score {value} outside {}", score_range(.min, .max))]
    ScoreOutOfRange {
        tool: ToolId,
        subtest: String,
        value: i64,
        min: u32,
        max: Option<u32>,
    },

    #[error("{tool} {subtest}: item {item} outside {min}-{max}")]
    ItemOutOfRange {
        tool: ToolId,
        subtest: String,
        item: u32,
        min: u32,
        max: u32,
    },

    #[error("unknown assessment tool: {0}")]
    UnknownTool(String),

    #[error("{tool} has no subtest named {subtest}")]
    UnknownSubtest { tool: ToolId, subtest: String },

    #[error("unknown gender: {0}")]
    UnknownGender(String),
}

fn score_range(min: &u32, max: &Option<u32>) -> ScoreBounds {
    ScoreBounds { min: *min, max: *max }
}
