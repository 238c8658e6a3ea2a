//! Plain-text report for copying results into clinical notes.

use crate::age::{format_age_short, format_equivalent_age, AgeResult};
use crate::models::{ChildInfo, SubtestOutcome, ToolApiResult, ToolId};
use crate::scores::ScoreEntryState;
use crate::utils::{format_date, pad_to_width};

const MISSING: &str = "-";

/// Column widths in display columns. The last column is not padded.
const COLUMN_WIDTHS: [usize; 3] = [10, 8, 12];
const HEADERS: [&str; 4] = ["하위검사", "원점수", "등가연령", "백분위"];

/// Full report: child info, one section per tool result, then the
/// integrated summary when there is one.
pub fn format_report(
    child: &ChildInfo,
    age: &AgeResult,
    results: &[(ToolId, &ToolApiResult)],
    integrated_summary: Option<&str>,
) -> String {
    let mut lines = vec![
        "[검사 결과]".to_string(),
        String::new(),
        "■ 아동 정보".to_string(),
        format!("이름: {}", child.name),
        format!("성별: {}", child.gender.label()),
        format!("생년월일: {}", format_date(child.birth_date)),
        format!("검사일: {}", format_date(child.test_date)),
        format!("생활연령: {}", format_age_short(age)),
    ];

    for (tool, result) in results {
        lines.push(String::new());
        lines.push(format_tool_section(*tool, result));
    }

    if let Some(summary) = integrated_summary.filter(|s| !s.trim().is_empty()) {
        lines.push(String::new());
        lines.push("■ 통합 요약".to_string());
        lines.push(summary.to_string());
    }

    lines.join("\n")
}

/// [`format_report`] over every stored result, in registry order.
pub fn format_session_report(
    child: &ChildInfo,
    age: &AgeResult,
    scores: &ScoreEntryState,
) -> String {
    let results: Vec<(ToolId, &ToolApiResult)> = scores
        .tools
        .iter()
        .filter_map(|(tool, data)| data.api_result.as_ref().map(|r| (*tool, r)))
        .collect();
    format_report(child, age, &results, scores.integrated_summary.as_deref())
}

/// One tool's section: heading, the service's text, and a score table for
/// tools with structured results.
pub fn format_tool_section(tool: ToolId, result: &ToolApiResult) -> String {
    let mut lines = vec![format!("■ {} 결과", tool.name())];
    if !result.text.is_empty() {
        lines.push(result.text.clone());
    }

    let rows = result.data.rows();
    if !rows.is_empty() {
        lines.push(String::new());
        lines.push(table_line(&HEADERS));
        for (subtest, outcome) in rows {
            let cells = row_cells(subtest, outcome);
            let cells: Vec<&str> = cells.iter().map(String::as_str).collect();
            lines.push(table_line(&cells));
        }
    }

    lines.join("\n")
}

fn row_cells(subtest: &str, outcome: &SubtestOutcome) -> [String; 4] {
    [
        ToolId::subtest_label(subtest).to_string(),
        outcome
            .raw_score
            .map(|s| s.to_string())
            .unwrap_or_else(|| MISSING.to_string()),
        outcome
            .equivalent_age_months
            .map(format_equivalent_age)
            .unwrap_or_else(|| MISSING.to_string()),
        outcome
            .percentile
            .map(format_percentile)
            .unwrap_or_else(|| MISSING.to_string()),
    ]
}

fn table_line(cells: &[&str]) -> String {
    let mut line = String::new();
    for (i, cell) in cells.iter().enumerate() {
        match COLUMN_WIDTHS.get(i) {
            Some(width) => line.push_str(&pad_to_width(cell, *width)),
            None => line.push_str(cell),
        }
    }
    line.trim_end().to_string()
}

fn format_percentile(p: f64) -> String {
    if p.fract() == 0.0 {
        format!("{}", p as i64)
    } else {
        format!("{:.1}", p)
    }
}
