use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Subtest key used when a tool declares no subtests of its own.
pub const TOTAL_SUBTEST: &str = "total";

/// Subtest computed by the scoring service from the others; never entered.
pub const COMBINED_SUBTEST: &str = "combined";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum ToolId {
    Selsi,
    Pres,
    Revt,
    Syntax,
    ProblemSolving,
    Apac,
    Cplc,
}

impl ToolId {
    /// All tools, in display order.
    pub const ALL: [ToolId; 7] = [
        ToolId::Selsi,
        ToolId::Pres,
        ToolId::Revt,
        ToolId::Syntax,
        ToolId::ProblemSolving,
        ToolId::Apac,
        ToolId::Cplc,
    ];

    /// Wire identifier, as used in URLs and request bodies.
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolId::Selsi => "selsi",
            ToolId::Pres => "pres",
            ToolId::Revt => "revt",
            ToolId::Syntax => "syntax",
            ToolId::ProblemSolving => "problem_solving",
            ToolId::Apac => "apac",
            ToolId::Cplc => "cplc",
        }
    }

    pub fn metadata(&self) -> &'static ToolMetadata {
        // TOOL_METADATA is in ALL order
        &TOOL_METADATA[*self as usize]
    }

    pub fn name(&self) -> &'static str {
        self.metadata().name
    }

    /// Subtests that take clinician input. `combined` is excluded, and a tool
    /// without subtests gets the single implicit `total`.
    pub fn input_subtests(&self) -> Vec<&'static str> {
        let subtests: Vec<&'static str> = self
            .metadata()
            .subtests
            .iter()
            .copied()
            .filter(|s| *s != COMBINED_SUBTEST)
            .collect();
        if subtests.is_empty() {
            vec![TOTAL_SUBTEST]
        } else {
            subtests
        }
    }

    /// Subtests that must have a raw score before a tool can be submitted.
    /// Empty means the tool has no declared requirement.
    pub fn required_subtests(&self) -> &'static [&'static str] {
        match self {
            ToolId::Selsi | ToolId::Pres => &["receptive", "expressive"],
            _ => &[],
        }
    }

    /// Accepted raw-score range for a subtest, or `None` for an unknown subtest.
    pub fn score_bounds(&self, subtest: &str) -> Option<ScoreBounds> {
        if !self.input_subtests().contains(&subtest) {
            return None;
        }
        let bounds = match (self, subtest) {
            (ToolId::Selsi, _) => ScoreBounds::new(0, 54),
            (ToolId::Pres, _) => ScoreBounds::new(1, 60),
            (ToolId::Syntax, _) => ScoreBounds::new(0, 63),
            (ToolId::Apac, _) => ScoreBounds::new(0, 70),
            (ToolId::Cplc, "discourse_management") => ScoreBounds::new(0, 33),
            (ToolId::Cplc, "contextual_variation") => ScoreBounds::new(0, 39),
            (ToolId::Cplc, "communication_intent") => ScoreBounds::new(0, 45),
            (ToolId::Cplc, "nonverbal_communication") => ScoreBounds::new(0, 24),
            _ => ScoreBounds::at_least(0),
        };
        Some(bounds)
    }

    /// Item numbers that belong to a subtest, for tools whose checklist items
    /// are numbered across subtests.
    pub fn item_range(&self, subtest: &str) -> Option<(u32, u32)> {
        match (self, subtest) {
            (ToolId::Cplc, "discourse_management") => Some((1, 11)),
            (ToolId::Cplc, "contextual_variation") => Some((12, 24)),
            (ToolId::Cplc, "communication_intent") => Some((25, 39)),
            (ToolId::Cplc, "nonverbal_communication") => Some((40, 47)),
            _ => None,
        }
    }

    /// Korean label for a subtest key.
    pub fn subtest_label(subtest: &str) -> &str {
        match subtest {
            "receptive" => "수용",
            "expressive" => "표현",
            "combined" => "통합",
            "total" => "총점",
            "cause_reason" => "원인이유",
            "clue_guessing" => "단서추측",
            "solution_inference" => "해결추론",
            "discourse_management" => "담화관리",
            "contextual_variation" => "상황에 따른 조절 및 적응",
            "communication_intent" => "의사소통 의도 사용",
            "nonverbal_communication" => "비언어적 의사소통",
            other => other,
        }
    }
}

impl std::fmt::Display for ToolId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ToolId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        ToolId::ALL
            .into_iter()
            .find(|id| id.as_str() == wanted || id.name().to_lowercase() == wanted)
            .ok_or_else(|| ValidationError::UnknownTool(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum Category {
    #[serde(rename = "영유아")]
    Infant,
    #[serde(rename = "학령전기")]
    Preschool,
}

impl Category {
    pub fn label(&self) -> &'static str {
        match self {
            Category::Infant => "영유아",
            Category::Preschool => "학령전기",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreBounds {
    pub min: u32,
    pub max: Option<u32>,
}

impl ScoreBounds {
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max: Some(max) }
    }

    pub const fn at_least(min: u32) -> Self {
        Self { min, max: None }
    }

    pub fn contains(&self, value: i64) -> bool {
        value >= self.min as i64 && self.max.map(|max| value <= max as i64).unwrap_or(true)
    }
}

impl std::fmt::Display for ScoreBounds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.max {
            Some(max) => write!(f, "{}-{}", self.min, max),
            None => write!(f, "{} 이상", self.min),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolMetadata {
    pub id: ToolId,
    pub name: &'static str,
    pub category: Category,
    pub min_age_months: u32,
    pub max_age_months: u32,
    pub subtests: &'static [&'static str],
    pub description: &'static str,
}

pub static TOOL_METADATA: [ToolMetadata; 7] = [
    ToolMetadata {
        id: ToolId::Selsi,
        name: "SELSI",
        category: Category::Infant,
        min_age_months: 4,
        max_age_months: 35,
        subtests: &["receptive", "expressive", "combined"],
        description: "영유아 언어발달 검사 (4-35개월)",
    },
    ToolMetadata {
        id: ToolId::Pres,
        name: "PRES",
        category: Category::Preschool,
        min_age_months: 24,
        max_age_months: 71,
        subtests: &["receptive", "expressive"],
        description: "취학전 아동 수용·표현 언어척도 (2-5세)",
    },
    ToolMetadata {
        id: ToolId::Revt,
        name: "REVT",
        category: Category::Preschool,
        min_age_months: 24,
        max_age_months: 215,
        subtests: &["receptive", "expressive"],
        description: "수용·표현 어휘력 검사 (2-16세)",
    },
    ToolMetadata {
        id: ToolId::Syntax,
        name: "구문의미이해력",
        category: Category::Preschool,
        min_age_months: 48,
        max_age_months: 107,
        subtests: &[],
        description: "구문의미이해력 검사 (4-8세)",
    },
    ToolMetadata {
        id: ToolId::ProblemSolving,
        name: "언어문제해결력",
        category: Category::Preschool,
        min_age_months: 60,
        max_age_months: 143,
        subtests: &["cause_reason", "clue_guessing", "solution_inference"],
        description: "언어문제해결력 검사 (5-11세)",
    },
    ToolMetadata {
        id: ToolId::Apac,
        name: "APAC",
        category: Category::Preschool,
        min_age_months: 36,
        max_age_months: 215,
        subtests: &[],
        description: "아동용 발음 검사 (3-16세)",
    },
    ToolMetadata {
        id: ToolId::Cplc,
        name: "CPLC",
        category: Category::Preschool,
        min_age_months: 60,
        max_age_months: 143,
        subtests: &[
            "discourse_management",
            "contextual_variation",
            "communication_intent",
            "nonverbal_communication",
        ],
        description: "아동 화용언어 체크리스트 (5-11세)",
    },
];

/// Tools the scoring service currently supports.
pub const ACTIVE_TOOLS: &[ToolId] = &[ToolId::Selsi];

pub fn is_tool_active(tool: ToolId) -> bool {
    ACTIVE_TOOLS.contains(&tool)
}

pub fn is_age_in_range(tool: ToolId, age_months: u32) -> bool {
    let meta = tool.metadata();
    age_months >= meta.min_age_months && age_months <= meta.max_age_months
}

/// Why a tool cannot be selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisabledReason {
    BelowMinimum { min: u32 },
    AboveMaximum { max: u32 },
    NotYetAvailable,
}

impl std::fmt::Display for DisabledReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DisabledReason::BelowMinimum { min } => write!(f, "{}개월 이상 적용 가능", min),
            DisabledReason::AboveMaximum { max } => write!(f, "{}개월 이하 적용 가능", max),
            DisabledReason::NotYetAvailable => write!(f, "준비 중"),
        }
    }
}

/// Age checks come first; a tool that is both out of range and inactive
/// reports the age problem. With no known age only activity is checked.
pub fn disabled_reason(tool: ToolId, age_months: Option<u32>) -> Option<DisabledReason> {
    let meta = tool.metadata();

    if let Some(age) = age_months {
        if age < meta.min_age_months {
            return Some(DisabledReason::BelowMinimum { min: meta.min_age_months });
        }
        if age > meta.max_age_months {
            return Some(DisabledReason::AboveMaximum { max: meta.max_age_months });
        }
    }

    if !is_tool_active(tool) {
        return Some(DisabledReason::NotYetAvailable);
    }

    None
}

/// Tools a child of `age_months` can be assessed with right now.
pub fn eligible_tools(age_months: u32) -> Vec<ToolId> {
    ToolId::ALL
        .into_iter()
        .filter(|tool| disabled_reason(*tool, Some(age_months)).is_none())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_table_matches_ids() {
        assert_eq!(TOOL_METADATA.len(), 7);
        for tool in ToolId::ALL {
            assert_eq!(tool.metadata().id, tool);
        }
    }

    #[test]
    fn test_only_selsi_active() {
        for tool in ToolId::ALL {
            assert_eq!(is_tool_active(tool), tool == ToolId::Selsi);
        }
    }

    #[test]
    fn test_age_range_inclusive() {
        for tool in ToolId::ALL {
            let meta = tool.metadata();
            for age in 0..=240 {
                let expected = age >= meta.min_age_months && age <= meta.max_age_months;
                assert_eq!(is_age_in_range(tool, age), expected, "{} at {}", tool, age);
            }
            assert!(is_age_in_range(tool, meta.min_age_months));
            assert!(is_age_in_range(tool, meta.max_age_months));
            assert!(!is_age_in_range(tool, meta.max_age_months + 1));
        }
    }

    #[test]
    fn test_disabled_reason_priority() {
        // PRES is inactive, but age problems win.
        assert_eq!(
            disabled_reason(ToolId::Pres, Some(23)),
            Some(DisabledReason::BelowMinimum { min: 24 })
        );
        assert_eq!(
            disabled_reason(ToolId::Pres, Some(72)),
            Some(DisabledReason::AboveMaximum { max: 71 })
        );
        assert_eq!(disabled_reason(ToolId::Pres, Some(30)), Some(DisabledReason::NotYetAvailable));
        assert_eq!(disabled_reason(ToolId::Selsi, Some(4)), None);
        assert_eq!(disabled_reason(ToolId::Selsi, Some(35)), None);
        assert_eq!(
            disabled_reason(ToolId::Selsi, Some(36)),
            Some(DisabledReason::AboveMaximum { max: 35 })
        );
        assert_eq!(disabled_reason(ToolId::Selsi, None), None);
        assert_eq!(disabled_reason(ToolId::Apac, None), Some(DisabledReason::NotYetAvailable));
    }

    #[test]
    fn test_disabled_reason_none_only_when_in_range_and_active() {
        for tool in ToolId::ALL {
            for age in 0..=240 {
                let enabled = disabled_reason(tool, Some(age)).is_none();
                assert_eq!(enabled, is_age_in_range(tool, age) && is_tool_active(tool));
            }
        }
    }

    #[test]
    fn test_disabled_reason_messages() {
        assert_eq!(DisabledReason::BelowMinimum { min: 24 }.to_string(), "24개월 이상 적용 가능");
        assert_eq!(DisabledReason::AboveMaximum { max: 35 }.to_string(), "35개월 이하 적용 가능");
        assert_eq!(DisabledReason::NotYetAvailable.to_string(), "준비 중");
    }

    #[test]
    fn test_input_subtests() {
        assert_eq!(ToolId::Selsi.input_subtests(), vec!["receptive", "expressive"]);
        assert_eq!(ToolId::Syntax.input_subtests(), vec!["total"]);
        assert_eq!(ToolId::Apac.input_subtests(), vec!["total"]);
        assert_eq!(ToolId::Cplc.input_subtests().len(), 4);
    }

    #[test]
    fn test_score_bounds() {
        assert_eq!(ToolId::Selsi.score_bounds("receptive"), Some(ScoreBounds::new(0, 54)));
        assert_eq!(ToolId::Pres.score_bounds("expressive"), Some(ScoreBounds::new(1, 60)));
        assert_eq!(ToolId::Apac.score_bounds("total"), Some(ScoreBounds::new(0, 70)));
        assert_eq!(
            ToolId::Cplc.score_bounds("nonverbal_communication"),
            Some(ScoreBounds::new(0, 24))
        );
        assert_eq!(
            ToolId::ProblemSolving.score_bounds("cause_reason"),
            Some(ScoreBounds::at_least(0))
        );
        assert_eq!(ToolId::Selsi.score_bounds("combined"), None);
        assert_eq!(ToolId::Selsi.score_bounds("bogus"), None);

        let pres = ScoreBounds::new(1, 60);
        assert!(!pres.contains(0));
        assert!(pres.contains(1));
        assert!(pres.contains(60));
        assert!(!pres.contains(61));
        assert!(ScoreBounds::at_least(0).contains(1000));
        assert!(!ScoreBounds::at_least(0).contains(-1));
    }

    #[test]
    fn test_tool_id_parse() {
        assert_eq!("selsi".parse::<ToolId>().unwrap(), ToolId::Selsi);
        assert_eq!("PROBLEM_SOLVING".parse::<ToolId>().unwrap(), ToolId::ProblemSolving);
        assert_eq!("구문의미이해력".parse::<ToolId>().unwrap(), ToolId::Syntax);
        assert!("wisc".parse::<ToolId>().is_err());
        assert_eq!(ToolId::ProblemSolving.to_string(), "problem_solving");
    }

    #[test]
    fn test_tool_id_serde_uses_wire_ids() {
        let json = serde_json::to_string(&ToolId::ProblemSolving).unwrap();
        assert_eq!(json, "\"problem_solving\"");
    }

    #[test]
    fn test_eligible_tools() {
        assert_eq!(eligible_tools(20), vec![ToolId::Selsi]);
        assert!(eligible_tools(40).is_empty());
    }
}
