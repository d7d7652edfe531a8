//! Student Analyzer.
//!
//! The numbers are computed here from the submitted scores; the model only
//! writes the narrative (analysis, strengths, weaknesses, recommendations,
//! per-subject trends). Averages sent by the client are ignored.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::schema::{array, object, string, string_array, string_enum};
use super::{GradeLevel, Tool, ToolKind, ValidationError, bullets, parse_reply, require_text};
use crate::llm::OutputSchema;
use crate::prompt::{PromptLibrary, Template};

// ── Input ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectScore {
    pub subject: String,
    pub score: f64,
}

/// One month of scores. A client-sent `average` field is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct MonthData {
    pub month: String,
    pub scores: Vec<SubjectScore>,
}

impl MonthData {
    /// Mean score rounded to two decimals; 0 when there are no scores.
    pub fn average(&self) -> f64 {
        if self.scores.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.scores.iter().map(|s| s.score).sum();
        round2(sum / self.scores.len() as f64)
    }

    fn score_of(&self, subject: &str) -> Option<f64> {
        self.scores.iter().find(|s| s.subject == subject).map(|s| s.score)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzerInput {
    pub student_name: String,
    pub grade_level: GradeLevel,
    pub current_month: String,
    #[serde(default)]
    pub previous_months: Vec<String>,
    pub monthly_data: Vec<MonthData>,
}

impl AnalyzerInput {
    fn current_index(&self) -> Option<usize> {
        let wanted = self.current_month.trim();
        self.monthly_data.iter().position(|m| m.month.trim().eq_ignore_ascii_case(wanted))
    }
}

// ── Output ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Improving,
    Declining,
    Stable,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImprovementArea {
    pub subject: String,
    pub recommendation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectTrend {
    pub subject: String,
    pub trend: Trend,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompareRow {
    pub subject: String,
    pub current_score: f64,
    pub previous_score: f64,
    pub change: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub month: String,
    pub average: f64,
    pub subjects: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisualizationData {
    pub compare_data: Vec<CompareRow>,
    pub trend_data: Vec<TrendPoint>,
}

/// The part of the analysis written by the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Narrative {
    pub overall_analysis: String,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub improvement_areas: Vec<ImprovementArea>,
    pub trends: Vec<SubjectTrend>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PerformanceAnalysis {
    #[serde(flatten)]
    pub narrative: Narrative,
    pub visualization_data: VisualizationData,
}

// ── Local computation ─────────────────────────────────────────────────────────

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Chart data for `input`. `current_month` must already be known to exist.
pub fn visualization(input: &AnalyzerInput) -> VisualizationData {
    let trend_data = input
        .monthly_data
        .iter()
        .map(|m| TrendPoint {
            month: m.month.clone(),
            average: m.average(),
            subjects: m.scores.iter().map(|s| (s.subject.clone(), s.score)).collect(),
        })
        .collect();

    let compare_data = match input.current_index() {
        Some(idx) => {
            let current = &input.monthly_data[idx];
            let previous = idx.checked_sub(1).map(|p| &input.monthly_data[p]);
            current
                .scores
                .iter()
                .map(|s| {
                    let previous_score = previous.and_then(|p| p.score_of(&s.subject)).unwrap_or(0.0);
                    CompareRow {
                        subject: s.subject.clone(),
                        current_score: s.score,
                        previous_score,
                        change: round2(s.score - previous_score),
                    }
                })
                .collect()
        }
        None => Vec::new(),
    };

    VisualizationData { compare_data, trend_data }
}

fn render_monthly_data(data: &[MonthData]) -> String {
    data.iter()
        .map(|m| {
            let scores: Vec<String> = m.scores.iter().map(|s| format!("{} {}", s.subject, s.score)).collect();
            format!("- {}: {} (average {})", m.month, scores.join(", "), m.average())
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Tool ──────────────────────────────────────────────────────────────────────

pub struct AnalyzerTool;

impl Tool for AnalyzerTool {
    const KIND: ToolKind = ToolKind::Analyzer;
    type Input = AnalyzerInput;
    type Output = PerformanceAnalysis;

    fn validate(input: &AnalyzerInput) -> Result<(), ValidationError> {
        if input.student_name.trim().is_empty() {
            return Err(ValidationError::field("student_name", "Student name is required."));
        }
        input.grade_level.check("grade_level")?;
        if input.monthly_data.is_empty() {
            return Err(ValidationError::field("monthly_data", "At least one month of scores is required."));
        }
        for m in &input.monthly_data {
            if m.scores.is_empty() {
                return Err(ValidationError::field("monthly_data", format!("{} has no scores.", m.month.trim())));
            }
            for s in &m.scores {
                if s.subject.trim().is_empty() {
                    return Err(ValidationError::field("monthly_data", "Every score needs a subject name."));
                }
                if !(0.0..=100.0).contains(&s.score) {
                    return Err(ValidationError::field(
                        "monthly_data",
                        format!("Score for {} in {} must be between 0 and 100.", s.subject.trim(), m.month.trim()),
                    ));
                }
            }
        }
        if input.current_index().is_none() {
            return Err(ValidationError::field(
                "current_month",
                "Current month must be one of the months in the performance data.",
            ));
        }
        Ok(())
    }

    fn prompt(input: &AnalyzerInput, prompts: &PromptLibrary) -> String {
        let previous = if input.previous_months.is_empty() {
            "none".to_string()
        } else {
            input.previous_months.join(", ")
        };
        prompts
            .builder(Template::Analyzer)
            .var("student_name", input.student_name.trim())
            .var("grade_level", input.grade_level.to_string())
            .var("current_month", input.current_month.trim())
            .var("previous_months", previous)
            .var("monthly_data", render_monthly_data(&input.monthly_data))
            .build()
    }

    fn schema(_input: &AnalyzerInput) -> OutputSchema {
        let area = object(&[
            ("subject", string("Subject name.")),
            ("recommendation", string("Specific recommendation for improvement.")),
        ]);
        let trend = object(&[
            ("subject", string("Subject name.")),
            ("trend", string_enum(&["improving", "declining", "stable"], "Performance trend.")),
            ("description", string("Description of the trend.")),
        ]);
        OutputSchema::new(
            "performance_analysis",
            object(&[
                ("overall_analysis", string("Overall analysis of the student's performance.")),
                ("strengths", string_array(0, "Subjects where the student is performing well.")),
                ("weaknesses", string_array(0, "Subjects that need improvement.")),
                ("improvement_areas", array(area, 0, "Recommendations for weak areas.")),
                ("trends", array(trend, 0, "Per-subject trends across months.")),
            ]),
        )
    }

    fn finish(input: &AnalyzerInput, reply: Value) -> Result<PerformanceAnalysis, ValidationError> {
        let narrative: Narrative = parse_reply(reply)?;
        require_text("overall_analysis", &narrative.overall_analysis)?;
        Ok(PerformanceAnalysis { narrative, visualization_data: visualization(input) })
    }

    fn render(a: &PerformanceAnalysis) -> String {
        let n = &a.narrative;
        let mut md = format!("## Overall Analysis\n\n{}\n", n.overall_analysis.trim());
        if !n.strengths.is_empty() {
            md.push_str("\n## Strengths\n\n");
            md.push_str(&bullets(&n.strengths));
        }
        if !n.weaknesses.is_empty() {
            md.push_str("\n## Weaknesses\n\n");
            md.push_str(&bullets(&n.weaknesses));
        }
        if !n.improvement_areas.is_empty() {
            md.push_str("\n## Recommendations\n\n");
            let lines: Vec<String> = n
                .improvement_areas
                .iter()
                .map(|i| format!("**{}**: {}", i.subject.trim(), i.recommendation.trim()))
                .collect();
            md.push_str(&bullets(&lines));
        }
        if !a.visualization_data.compare_data.is_empty() {
            md.push_str("\n## This Month vs Last Month\n\n| Subject | Previous | Current | Change |\n|---|---|---|---|\n");
            for row in &a.visualization_data.compare_data {
                md.push_str(&format!(
                    "| {} | {} | {} | {:+} |\n",
                    row.subject, row.previous_score, row.current_score, row.change
                ));
            }
        }
        md
    }
}
