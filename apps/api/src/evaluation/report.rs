//! Final report schema, rendering, and deterministic degradation.
//!
//! The model is asked for `ReportSchema` JSON. A reply that does not match is
//! kept as free-form text with the score pattern-matched out of it. When the
//! call itself fails the fixed `FALLBACK_REPORT` is used; it does not reflect
//! the candidate's answers and carries no score.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::evaluation::perspective::Perspective;
use crate::llm_client::{parse_json, LlmError};

/// "7/10", "7 / 10". First match wins.
static SCORE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(10|[1-9])\s*/\s*10\b").expect("valid score regex"));

pub const FALLBACK_REPORT: &str = "\
Overall impression
The interview is complete, but the detailed analysis is unavailable right now.

Strengths
- You answered every question.

Growth areas
- Revisit the questions you found hardest and practise answering them out loud.

Recommendations
- Build a small project covering the topics of this interview.
- Take the interview again later for a detailed analysis.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportSource {
    /// Structured reply matching the schema.
    Model,
    /// Reply that did not match the schema, kept verbatim.
    Freeform,
    /// Built locally from perspective verdicts after the merge call failed.
    Assembled,
    /// Fixed template.
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinalReport {
    pub text: String,
    /// 1..=10 when known.
    pub score: Option<u8>,
    pub source: ReportSource,
}

impl FinalReport {
    /// Interprets a final-report completion.
    pub fn from_model_output(raw: &str) -> Self {
        match parse_report(raw) {
            Ok(schema) => Self {
                text: schema.render(),
                score: Some(schema.score),
                source: ReportSource::Model,
            },
            Err(e) => {
                warn!("Final report did not match schema ({e}); keeping free-form text");
                Self {
                    text: raw.trim().to_string(),
                    score: extract_score(raw),
                    source: ReportSource::Freeform,
                }
            }
        }
    }

    pub fn fallback() -> Self {
        Self {
            text: FALLBACK_REPORT.to_string(),
            score: None,
            source: ReportSource::Fallback,
        }
    }

    /// Report built from per-perspective verdicts, in the given order.
    /// Perspectives without a verdict contribute their canned line and no score.
    pub fn assemble(sections: &[(Perspective, PerspectiveSection)]) -> Self {
        let mut text = String::new();
        let mut scores = Vec::new();

        for (perspective, section) in sections {
            if !text.is_empty() {
                text.push_str("\n\n");
            }
            match section {
                PerspectiveSection::Verdict(verdict) => {
                    scores.push(verdict.score as u32);
                    text.push_str(&format!(
                        "{} ({}/10)\n{}",
                        perspective.display_name(),
                        verdict.score,
                        verdict.summary.trim()
                    ));
                }
                PerspectiveSection::Unavailable(phrase) => {
                    text.push_str(&format!("{}\n{}", perspective.display_name(), phrase));
                }
            }
        }

        let score = (!scores.is_empty()).then(|| {
            let sum: u32 = scores.iter().sum();
            let mean = (sum as f64 / scores.len() as f64).round() as u8;
            mean.clamp(1, 10)
        });

        if let Some(score) = score {
            text.push_str(&format!("\n\nOverall score: {score}/10"));
        }

        Self {
            text,
            score,
            source: ReportSource::Assembled,
        }
    }
}

/// Structured final report requested from the model.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportSchema {
    pub overall_impression: String,
    pub strengths: Vec<String>,
    pub growth_areas: Vec<String>,
    pub recommendations: Vec<String>,
    pub verdict: String,
    pub score: u8,
}

impl ReportSchema {
    fn validate(self) -> Result<Self, LlmError> {
        if !(1..=10).contains(&self.score) {
            return Err(LlmError::Malformed(format!(
                "score {} is outside 1..=10",
                self.score
            )));
        }
        if self.overall_impression.trim().is_empty() {
            return Err(LlmError::Malformed(
                "overall_impression is empty".to_string(),
            ));
        }
        Ok(self)
    }

    pub fn render(&self) -> String {
        let mut out = format!("Overall impression\n{}", self.overall_impression.trim());
        push_list(&mut out, "Strengths", &self.strengths);
        push_list(&mut out, "Growth areas", &self.growth_areas);
        push_list(&mut out, "Recommendations", &self.recommendations);
        if !self.verdict.trim().is_empty() {
            out.push_str(&format!("\n\nVerdict\n{}", self.verdict.trim()));
        }
        out.push_str(&format!("\n\nScore: {}/10", self.score));
        out
    }
}

fn push_list(out: &mut String, heading: &str, items: &[String]) {
    let items: Vec<&str> = items
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();
    if items.is_empty() {
        return;
    }
    out.push_str(&format!("\n\n{heading}"));
    for item in items {
        out.push_str(&format!("\n- {item}"));
    }
}

pub fn parse_report(raw: &str) -> Result<ReportSchema, LlmError> {
    parse_json::<ReportSchema>(raw)?.validate()
}

/// One perspective's verdict on the whole transcript.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PerspectiveVerdict {
    pub score: u8,
    pub summary: String,
}

impl PerspectiveVerdict {
    pub fn parse(raw: &str) -> Result<Self, LlmError> {
        let verdict: Self = parse_json(raw)?;
        if !(1..=10).contains(&verdict.score) {
            return Err(LlmError::Malformed(format!(
                "score {} is outside 1..=10",
                verdict.score
            )));
        }
        if verdict.summary.trim().is_empty() {
            return Err(LlmError::Malformed("summary is empty".to_string()));
        }
        Ok(verdict)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PerspectiveSection {
    Verdict(PerspectiveVerdict),
    Unavailable(&'static str),
}

/// Pulls an "N/10" score out of free-form text.
pub fn extract_score(text: &str) -> Option<u8> {
    SCORE_PATTERN
        .captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}
