//! Evaluation Pipeline — per-turn feedback and the final report.
//!
//! Nothing here fails: per-turn feedback degrades to `None`, the final report
//! degrades to free-form text or the fallback template. All completion calls
//! go through the `CompletionGateway`.

pub mod perspective;
pub mod prompts;
pub mod report;

use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::interview::catalog::{perspectives_for, QuestionCategory, Role};
use crate::interview::session::{QuestionDescriptor, Turn};
use crate::llm_client::prompts::{INTERVIEWER_PERSONA, JSON_ONLY_INSTRUCTION};
use crate::llm_client::{ChatMessage, CompletionGateway, LlmError};
use perspective::{FallbackPhraseTable, Perspective};
use prompts::{
    FEEDBACK_PROMPT_TEMPLATE, FEEDBACK_SYSTEM, FINAL_REPORT_PROMPT_TEMPLATE,
    MERGE_FEEDBACK_TEMPLATE, MERGE_REPORT_TEMPLATE, PERSPECTIVE_FEEDBACK_TEMPLATE,
    PERSPECTIVE_REPORT_TEMPLATE,
};
use report::{FinalReport, PerspectiveSection, PerspectiveVerdict};

const FEEDBACK_MAX_TOKENS: u32 = 150;
const PERSPECTIVE_MAX_TOKENS: u32 = 400;
const REPORT_MAX_TOKENS: u32 = 1000;
/// Answers longer than this are truncated in transcript prompts.
pub const ANSWER_PREVIEW_CHARS: usize = 600;

/// Shown to the candidate when per-turn feedback is unavailable.
pub const NEUTRAL_FEEDBACK: &str = "Thank you, your answer has been recorded.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationMode {
    /// One evaluator prompt per call.
    Single,
    /// One call per applicable perspective, merged by one extra call.
    MultiPerspective,
}

/// What a perspective is asked to judge.
#[derive(Debug, Clone, Copy)]
pub enum PerspectiveInput<'a> {
    Answer {
        role: Role,
        question: &'a QuestionDescriptor,
        answer: &'a str,
    },
    Transcript {
        role: Role,
        turns: &'a [Turn],
    },
}

pub struct EvaluationPipeline {
    gateway: Arc<dyn CompletionGateway>,
    mode: EvaluationMode,
    fallback_phrases: FallbackPhraseTable,
}

impl EvaluationPipeline {
    pub fn new(gateway: Arc<dyn CompletionGateway>, mode: EvaluationMode) -> Self {
        Self {
            gateway,
            mode,
            fallback_phrases: FallbackPhraseTable::new(),
        }
    }

    /// Deterministic fallback phrase selection, for tests.
    pub fn with_seed(gateway: Arc<dyn CompletionGateway>, mode: EvaluationMode, seed: u64) -> Self {
        Self {
            gateway,
            mode,
            fallback_phrases: FallbackPhraseTable::with_seed(seed),
        }
    }

    /// Short reaction to one answer. Advisory: `None` when unavailable.
    pub async fn per_turn_feedback(
        &self,
        role: Role,
        question: &QuestionDescriptor,
        answer: &str,
    ) -> Option<String> {
        match self.mode {
            EvaluationMode::Single => self.single_feedback(question, answer).await,
            EvaluationMode::MultiPerspective => {
                self.multi_perspective_feedback(role, question, answer).await
            }
        }
    }

    /// Final report over every recorded turn. Always returns a report.
    pub async fn final_report(&self, role: Role, turns: &[Turn]) -> FinalReport {
        let report = match self.mode {
            EvaluationMode::Single => self.single_report(role, turns).await,
            EvaluationMode::MultiPerspective => self.multi_perspective_report(role, turns).await,
        };
        info!(
            "Final report ready: source={:?}, score={:?}",
            report.source, report.score
        );
        report
    }

    /// One completion call through one evaluation lens.
    pub async fn run_perspective(
        &self,
        kind: Perspective,
        input: PerspectiveInput<'_>,
    ) -> Result<String, LlmError> {
        let (prompt, max_tokens) = match input {
            PerspectiveInput::Answer {
                role,
                question,
                answer,
            } => (
                PERSPECTIVE_FEEDBACK_TEMPLATE
                    .replace("{perspective}", kind.display_name())
                    .replace("{instruction}", kind.instruction())
                    .replace("{rubric}", kind.rubric())
                    .replace("{role}", role.display_name())
                    .replace("{question}", &question.text)
                    .replace("{answer}", answer),
                FEEDBACK_MAX_TOKENS,
            ),
            PerspectiveInput::Transcript { role, turns } => (
                PERSPECTIVE_REPORT_TEMPLATE
                    .replace("{perspective}", kind.display_name())
                    .replace("{instruction}", kind.instruction())
                    .replace("{rubric}", kind.rubric())
                    .replace("{role}", role.display_name())
                    .replace("{transcript}", &render_transcript(turns)),
                PERSPECTIVE_MAX_TOKENS,
            ),
        };

        let messages = [ChatMessage::system(INTERVIEWER_PERSONA), ChatMessage::user(prompt)];
        self.gateway.complete(&messages, max_tokens).await
    }

    async fn single_feedback(&self, question: &QuestionDescriptor, answer: &str) -> Option<String> {
        let prompt = FEEDBACK_PROMPT_TEMPLATE
            .replace("{question}", &question.text)
            .replace("{answer}", answer);
        let messages = [ChatMessage::system(FEEDBACK_SYSTEM), ChatMessage::user(prompt)];

        match self.gateway.complete(&messages, FEEDBACK_MAX_TOKENS).await {
            Ok(text) => Some(text),
            Err(e) => {
                warn!("Per-turn feedback unavailable: {e}");
                None
            }
        }
    }

    async fn multi_perspective_feedback(
        &self,
        role: Role,
        question: &QuestionDescriptor,
        answer: &str,
    ) -> Option<String> {
        let perspectives = question.category.perspectives();
        let input = PerspectiveInput::Answer {
            role,
            question,
            answer,
        };
        let results = join_all(perspectives.iter().map(|&p| self.run_perspective(p, input))).await;

        if results.iter().all(Result::is_err) {
            warn!("Every perspective failed for per-turn feedback; feedback skipped");
            return None;
        }

        let notes: Vec<(Perspective, String)> = perspectives
            .iter()
            .zip(results)
            .map(|(&p, result)| {
                let note = result.unwrap_or_else(|e| {
                    debug!("{:?} perspective unavailable ({e}); using canned reaction", p);
                    self.fallback_phrases.pick(p).to_string()
                });
                (p, note)
            })
            .collect();

        if let [(_, only)] = notes.as_slice() {
            return Some(only.clone());
        }

        let prompt = MERGE_FEEDBACK_TEMPLATE
            .replace("{question}", &question.text)
            .replace("{notes}", &render_notes(&notes));
        let messages = [ChatMessage::system(INTERVIEWER_PERSONA), ChatMessage::user(prompt)];

        match self.gateway.complete(&messages, FEEDBACK_MAX_TOKENS).await {
            Ok(text) => Some(text),
            Err(e) => {
                warn!("Feedback merge failed ({e}); showing perspective notes as-is");
                Some(render_notes(&notes))
            }
        }
    }

    async fn single_report(&self, role: Role, turns: &[Turn]) -> FinalReport {
        let prompt = FINAL_REPORT_PROMPT_TEMPLATE
            .replace("{role}", role.display_name())
            .replace("{transcript}", &render_transcript(turns));
        let messages = [
            ChatMessage::system(format!("{INTERVIEWER_PERSONA} {JSON_ONLY_INSTRUCTION}")),
            ChatMessage::user(prompt),
        ];

        match self.gateway.complete(&messages, REPORT_MAX_TOKENS).await {
            Ok(raw) => FinalReport::from_model_output(&raw),
            Err(e) => {
                warn!("Final report call failed ({e}); using fallback report");
                FinalReport::fallback()
            }
        }
    }

    async fn multi_perspective_report(&self, role: Role, turns: &[Turn]) -> FinalReport {
        let perspectives = perspectives_for(&categories_of(turns));
        let input = PerspectiveInput::Transcript { role, turns };
        let results = join_all(perspectives.iter().map(|&p| self.run_perspective(p, input))).await;

        let sections: Vec<(Perspective, PerspectiveSection)> = perspectives
            .iter()
            .zip(results)
            .map(|(&p, result)| {
                let section = match result.and_then(|raw| PerspectiveVerdict::parse(&raw)) {
                    Ok(verdict) => PerspectiveSection::Verdict(verdict),
                    Err(e) => {
                        warn!("{:?} perspective report unavailable: {e}", p);
                        PerspectiveSection::Unavailable(self.fallback_phrases.pick(p))
                    }
                };
                (p, section)
            })
            .collect();

        if !sections
            .iter()
            .any(|(_, s)| matches!(s, PerspectiveSection::Verdict(_)))
        {
            warn!("Every perspective report failed; using fallback report");
            return FinalReport::fallback();
        }

        let notes = sections
            .iter()
            .map(|(p, section)| match section {
                PerspectiveSection::Verdict(v) => {
                    format!("{} ({}/10): {}", p.display_name(), v.score, v.summary.trim())
                }
                PerspectiveSection::Unavailable(phrase) => {
                    format!("{}: {}", p.display_name(), phrase)
                }
            })
            .collect::<Vec<_>>()
            .join("\n");

        let prompt = MERGE_REPORT_TEMPLATE
            .replace("{role}", role.display_name())
            .replace("{notes}", &notes);
        let messages = [
            ChatMessage::system(format!("{INTERVIEWER_PERSONA} {JSON_ONLY_INSTRUCTION}")),
            ChatMessage::user(prompt),
        ];

        match self.gateway.complete(&messages, REPORT_MAX_TOKENS).await {
            Ok(raw) => FinalReport::from_model_output(&raw),
            Err(e) => {
                warn!("Report merge failed ({e}); assembling report from perspectives");
                FinalReport::assemble(&sections)
            }
        }
    }
}

/// Numbered Q/A listing with answers cut to `ANSWER_PREVIEW_CHARS`.
pub fn render_transcript(turns: &[Turn]) -> String {
    turns
        .iter()
        .enumerate()
        .map(|(i, turn)| {
            format!(
                "Question {} ({}): {}\nAnswer: {}",
                i + 1,
                turn.question.category.display_name(),
                turn.question.text,
                answer_preview(turn.answer.as_deref().unwrap_or("(no answer)"))
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn answer_preview(answer: &str) -> String {
    let answer = answer.trim();
    if answer.chars().count() <= ANSWER_PREVIEW_CHARS {
        return answer.to_string();
    }
    let mut preview: String = answer.chars().take(ANSWER_PREVIEW_CHARS).collect();
    preview.push('…');
    preview
}

fn render_notes(notes: &[(Perspective, String)]) -> String {
    notes
        .iter()
        .map(|(p, note)| format!("{}: {}", p.display_name(), note.trim()))
        .collect::<Vec<_>>()
        .join("\n")
}

fn categories_of(turns: &[Turn]) -> Vec<QuestionCategory> {
    let mut categories: Vec<QuestionCategory> = turns.iter().map(|t| t.question.category).collect();
    categories.sort();
    categories.dedup();
    categories
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::report::{ReportSource, FALLBACK_REPORT};
    use crate::llm_client::testing::{prompt_text, ScriptedGateway};

    const REPORT_JSON: &str = r#"{
        "overall_impression": "Good command of the basics.",
        "strengths": ["Clear answers"],
        "growth_areas": ["Async programming"],
        "recommendations": ["Build an asyncio crawler"],
        "verdict": "Suitable.",
        "score": 8
    }"#;

    fn question(category: QuestionCategory) -> QuestionDescriptor {
        QuestionDescriptor {
            text: "How do generators work?".to_string(),
            category,
        }
    }

    fn turn(category: QuestionCategory, answer: &str) -> Turn {
        Turn {
            question: question(category),
            answer: Some(answer.to_string()),
            feedback: None,
        }
    }

    fn pipeline(gateway: ScriptedGateway, mode: EvaluationMode) -> (EvaluationPipeline, Arc<ScriptedGateway>) {
        let gateway = Arc::new(gateway);
        (EvaluationPipeline::with_seed(gateway.clone(), mode, 11), gateway)
    }

    #[tokio::test]
    async fn test_single_feedback_returns_model_text() {
        let (pipeline, gateway) = pipeline(
            ScriptedGateway::always("Nice, you clearly know lazy evaluation."),
            EvaluationMode::Single,
        );

        let feedback = pipeline
            .per_turn_feedback(
                Role::MiddlePython,
                &question(QuestionCategory::Technical),
                "They yield values lazily",
            )
            .await;

        assert_eq!(feedback.as_deref(), Some("Nice, you clearly know lazy evaluation."));
        assert_eq!(gateway.call_count(), 1);
        let prompt = prompt_text(&gateway.calls()[0]);
        assert!(prompt.contains("How do generators work?"));
        assert!(prompt.contains("They yield values lazily"));
    }

    #[tokio::test]
    async fn test_single_feedback_failure_is_absent() {
        let (pipeline, _) = pipeline(
            ScriptedGateway::failing(LlmError::Timeout),
            EvaluationMode::Single,
        );
        let feedback = pipeline
            .per_turn_feedback(Role::JuniorPython, &question(QuestionCategory::Technical), "x")
            .await;
        assert!(feedback.is_none());
    }

    #[tokio::test]
    async fn test_single_report_parses_structured_reply() {
        let (pipeline, gateway) = pipeline(ScriptedGateway::always(REPORT_JSON), EvaluationMode::Single);
        let turns = vec![turn(QuestionCategory::Technical, "answer one")];

        let report = pipeline.final_report(Role::JuniorPython, &turns).await;

        assert_eq!(report.source, ReportSource::Model);
        assert_eq!(report.score, Some(8));
        assert!(report.text.contains("Good command of the basics."));
        assert_eq!(gateway.call_count(), 1);
        assert!(prompt_text(&gateway.calls()[0]).contains("Junior Python Developer"));
    }

    #[tokio::test]
    async fn test_single_report_failure_uses_fallback_template() {
        let (pipeline, _) = pipeline(
            ScriptedGateway::failing(LlmError::Http { status: 500 }),
            EvaluationMode::Single,
        );
        let turns = vec![turn(QuestionCategory::Technical, "answer")];

        let report = pipeline.final_report(Role::JuniorPython, &turns).await;

        assert_eq!(report.source, ReportSource::Fallback);
        assert_eq!(report.text, FALLBACK_REPORT);
    }

    #[tokio::test]
    async fn test_final_report_prompt_truncates_long_answers() {
        let (pipeline, gateway) = pipeline(ScriptedGateway::always(REPORT_JSON), EvaluationMode::Single);
        let long_answer = "x".repeat(ANSWER_PREVIEW_CHARS * 3);
        let turns = vec![
            turn(QuestionCategory::Technical, &long_answer),
            turn(QuestionCategory::Practical, "short answer"),
        ];

        pipeline.final_report(Role::SeniorPython, &turns).await;

        let prompt = prompt_text(&gateway.calls()[0]);
        let expected_preview = format!("{}…", "x".repeat(ANSWER_PREVIEW_CHARS));
        assert!(prompt.contains(&expected_preview));
        assert!(!prompt.contains(&"x".repeat(ANSWER_PREVIEW_CHARS + 1)));
        assert!(prompt.contains("Question 2 (Practical tasks)"));
        assert!(prompt.contains("Answer: short answer"));
    }

    #[tokio::test]
    async fn test_multi_feedback_merges_applicable_perspectives() {
        let (pipeline, gateway) = pipeline(
            ScriptedGateway::responding(|messages| {
                let prompt = prompt_text(messages);
                if prompt.contains("REVIEWER NOTES") {
                    Ok("Merged reaction.".to_string())
                } else {
                    Ok("Perspective note.".to_string())
                }
            }),
            EvaluationMode::MultiPerspective,
        );

        let feedback = pipeline
            .per_turn_feedback(Role::MiddlePython, &question(QuestionCategory::Technical), "answer")
            .await;

        assert_eq!(feedback.as_deref(), Some("Merged reaction."));
        // technical → technical + career perspectives, then one merge
        assert_eq!(gateway.call_count(), 3);
        let calls = gateway.calls();
        assert!(prompt_text(&calls[0]).contains("PERSPECTIVE: Technical expert"));
        assert!(prompt_text(&calls[1]).contains("PERSPECTIVE: Career coach"));
    }

    #[tokio::test]
    async fn test_multi_feedback_uses_canned_reaction_for_failed_perspective() {
        let (pipeline, gateway) = pipeline(
            ScriptedGateway::responding(|messages| {
                let prompt = prompt_text(messages);
                if prompt.contains("PERSPECTIVE: Career coach") {
                    Err(LlmError::Timeout)
                } else if prompt.contains("REVIEWER NOTES") {
                    Ok("Merged.".to_string())
                } else {
                    Ok("Technically sound.".to_string())
                }
            }),
            EvaluationMode::MultiPerspective,
        );

        pipeline
            .per_turn_feedback(Role::MiddlePython, &question(QuestionCategory::Technical), "answer")
            .await;

        let merge_prompt = prompt_text(&gateway.calls()[2]);
        assert!(merge_prompt.contains("Technical expert: Technically sound."));
        assert!(FallbackPhraseTable::phrases(Perspective::Career)
            .iter()
            .any(|phrase| merge_prompt.contains(&format!("Career coach: {phrase}"))));
    }

    #[tokio::test]
    async fn test_multi_feedback_all_perspectives_failing_is_absent() {
        let (pipeline, gateway) = pipeline(
            ScriptedGateway::failing(LlmError::Timeout),
            EvaluationMode::MultiPerspective,
        );
        let feedback = pipeline
            .per_turn_feedback(Role::TeamLead, &question(QuestionCategory::Situational), "answer")
            .await;
        assert!(feedback.is_none());
        assert_eq!(gateway.call_count(), 2, "no merge call when every perspective failed");
    }

    #[tokio::test]
    async fn test_multi_feedback_single_perspective_skips_merge() {
        let (pipeline, gateway) = pipeline(
            ScriptedGateway::always("Clean solution."),
            EvaluationMode::MultiPerspective,
        );
        let feedback = pipeline
            .per_turn_feedback(Role::JuniorPython, &question(QuestionCategory::Practical), "code")
            .await;
        assert_eq!(feedback.as_deref(), Some("Clean solution."));
        assert_eq!(gateway.call_count(), 1);
    }

    #[tokio::test]
    async fn test_multi_feedback_merge_failure_joins_notes() {
        let (pipeline, _) = pipeline(
            ScriptedGateway::responding(|messages| {
                if prompt_text(messages).contains("REVIEWER NOTES") {
                    Err(LlmError::Http { status: 502 })
                } else {
                    Ok("Fine.".to_string())
                }
            }),
            EvaluationMode::MultiPerspective,
        );
        let feedback = pipeline
            .per_turn_feedback(Role::TeamLead, &question(QuestionCategory::Situational), "answer")
            .await
            .unwrap();
        assert_eq!(feedback, "HR specialist: Fine.\nCareer coach: Fine.");
    }

    #[tokio::test]
    async fn test_multi_report_merges_perspective_verdicts() {
        let (pipeline, gateway) = pipeline(
            ScriptedGateway::responding(|messages| {
                let prompt = prompt_text(messages);
                if prompt.contains("REVIEWER NOTES") {
                    Ok(REPORT_JSON.to_string())
                } else {
                    Ok(r#"{"score": 6, "summary": "Reasonable."}"#.to_string())
                }
            }),
            EvaluationMode::MultiPerspective,
        );
        let turns = vec![turn(QuestionCategory::Practical, "code")];

        let report = pipeline.final_report(Role::JuniorPython, &turns).await;

        assert_eq!(report.source, ReportSource::Model);
        assert_eq!(report.score, Some(8));
        // practical → technical perspective only, then merge
        assert_eq!(gateway.call_count(), 2);
        assert!(prompt_text(&gateway.calls()[1]).contains("Technical expert (6/10): Reasonable."));
    }

    #[tokio::test]
    async fn test_multi_report_merge_failure_assembles_from_perspectives() {
        let (pipeline, _) = pipeline(
            ScriptedGateway::responding(|messages| {
                let prompt = prompt_text(messages);
                if prompt.contains("REVIEWER NOTES") {
                    Err(LlmError::Timeout)
                } else if prompt.contains("PERSPECTIVE: Technical expert") {
                    Ok(r#"{"score": 9, "summary": "Strong technically."}"#.to_string())
                } else {
                    Ok(r#"{"score": 6, "summary": "Needs more growth."}"#.to_string())
                }
            }),
            EvaluationMode::MultiPerspective,
        );
        let turns = vec![turn(QuestionCategory::Technical, "answer")];

        let report = pipeline.final_report(Role::MiddlePython, &turns).await;

        assert_eq!(report.source, ReportSource::Assembled);
        assert_eq!(report.score, Some(8));
        assert!(report.text.starts_with("Technical expert (9/10)\nStrong technically."));
        assert!(report.text.contains("Career coach (6/10)\nNeeds more growth."));
    }

    #[tokio::test]
    async fn test_multi_report_all_perspectives_failing_uses_fallback() {
        let (pipeline, gateway) = pipeline(
            ScriptedGateway::always("not json at all"),
            EvaluationMode::MultiPerspective,
        );
        let turns = vec![
            turn(QuestionCategory::Technical, "a"),
            turn(QuestionCategory::Situational, "b"),
        ];

        let report = pipeline.final_report(Role::TeamLead, &turns).await;

        assert_eq!(report.source, ReportSource::Fallback);
        // three perspectives, no merge
        assert_eq!(gateway.call_count(), 3);
    }
}
