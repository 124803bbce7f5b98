//! Question Bank — produces the next interview question for a session.
//!
//! Generated mode asks the completion gateway, retrying exactly once.
//! Static mode (degraded operation) serves a fixed per-role table and never fails.

use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};

use once_cell::sync::Lazy;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::interview::catalog::{QuestionCategory, Role};
use crate::interview::prompts::{static_questions, QUESTION_PROMPT_TEMPLATE, QUESTION_SYSTEM};
use crate::interview::session::QuestionDescriptor;
use crate::interview::InterviewError;
use crate::llm_client::{ChatMessage, CompletionGateway, LlmError};

const GENERATION_MAX_TOKENS: u32 = 500;
/// One call plus one retry.
const MAX_GENERATION_ATTEMPTS: u32 = 2;

/// Leading "1. ", "2) " or "Question 3:" labels the model sometimes adds.
static NUMBERING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:\d+\s*[.)]\s*|(?i:question)\s*\d*\s*[:.]\s*)").expect("valid numbering regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionSource {
    Generated,
    Static,
}

impl FromStr for QuestionSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "generated" => Ok(QuestionSource::Generated),
            "static" => Ok(QuestionSource::Static),
            other => Err(format!(
                "unknown question source '{other}' (expected 'generated' or 'static')"
            )),
        }
    }
}

pub struct QuestionBank {
    gateway: Arc<dyn CompletionGateway>,
    source: QuestionSource,
    rng: Mutex<StdRng>,
}

impl QuestionBank {
    pub fn new(gateway: Arc<dyn CompletionGateway>, source: QuestionSource) -> Self {
        Self::with_rng(gateway, source, StdRng::from_entropy())
    }

    /// Deterministic category selection, for tests.
    pub fn with_seed(gateway: Arc<dyn CompletionGateway>, source: QuestionSource, seed: u64) -> Self {
        Self::with_rng(gateway, source, StdRng::seed_from_u64(seed))
    }

    fn with_rng(gateway: Arc<dyn CompletionGateway>, source: QuestionSource, rng: StdRng) -> Self {
        Self {
            gateway,
            source,
            rng: Mutex::new(rng),
        }
    }

    /// Picks a category uniformly from `allowed` and produces a question for it.
    ///
    /// `asked` lists the questions already asked in the session; the generator
    /// is told to avoid them and the static table uses it for wraparound.
    pub async fn next_question(
        &self,
        role: Role,
        allowed: &[QuestionCategory],
        asked: &[QuestionDescriptor],
    ) -> Result<QuestionDescriptor, InterviewError> {
        let category = self.pick_category(allowed)?;

        match self.source {
            QuestionSource::Static => Ok(static_question(role, category, asked)),
            QuestionSource::Generated => self.generate(role, category, asked).await,
        }
    }

    fn pick_category(&self, allowed: &[QuestionCategory]) -> Result<QuestionCategory, InterviewError> {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        allowed.choose(&mut *rng).copied().ok_or_else(|| {
            InterviewError::ConfigurationInvalid("select at least one question category".to_string())
        })
    }

    async fn generate(
        &self,
        role: Role,
        category: QuestionCategory,
        asked: &[QuestionDescriptor],
    ) -> Result<QuestionDescriptor, InterviewError> {
        let messages = build_question_messages(role, category, asked);
        let mut last_error = LlmError::Malformed("no generation attempt was made".to_string());

        for attempt in 1..=MAX_GENERATION_ATTEMPTS {
            let result = self
                .gateway
                .complete(&messages, GENERATION_MAX_TOKENS)
                .await
                .and_then(|raw| {
                    clean_question(&raw).ok_or_else(|| {
                        LlmError::Malformed("completion contained no question".to_string())
                    })
                });

            match result {
                Ok(text) => {
                    debug!("Generated {:?} question for {:?}", category, role);
                    return Ok(QuestionDescriptor { text, category });
                }
                Err(e) => {
                    warn!(
                        "Question generation attempt {}/{} failed: {}",
                        attempt, MAX_GENERATION_ATTEMPTS, e
                    );
                    last_error = e;
                }
            }
        }

        Err(InterviewError::GenerationFailed {
            attempts: MAX_GENERATION_ATTEMPTS,
            source: last_error,
        })
    }
}

/// Wraparound selection: the n-th question of a category is entry n mod len.
fn static_question(
    role: Role,
    category: QuestionCategory,
    asked: &[QuestionDescriptor],
) -> QuestionDescriptor {
    let table = static_questions(role, category);
    let index = asked.iter().filter(|q| q.category == category).count() % table.len();
    QuestionDescriptor {
        text: table[index].to_string(),
        category,
    }
}

fn build_question_messages(
    role: Role,
    category: QuestionCategory,
    asked: &[QuestionDescriptor],
) -> Vec<ChatMessage> {
    let asked_questions = if asked.is_empty() {
        "(none yet)".to_string()
    } else {
        asked
            .iter()
            .map(|q| format!("- {}", q.text))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let prompt = QUESTION_PROMPT_TEMPLATE
        .replace("{category_prompt}", category.prompt_fragment())
        .replace("{role}", role.display_name())
        .replace("{focus_areas}", &role.focus_areas().join(", "))
        .replace("{asked_questions}", &asked_questions);

    vec![ChatMessage::system(QUESTION_SYSTEM), ChatMessage::user(prompt)]
}

/// Strips numbering and wrapping quotes. `None` if nothing usable remains.
fn clean_question(raw: &str) -> Option<String> {
    let text = raw.trim();
    let text = NUMBERING.replace(text, "");
    let text = text
        .trim()
        .trim_matches(|c| matches!(c, '"' | '\'' | '«' | '»' | '“' | '”'))
        .trim();

    (!text.is_empty()).then(|| text.to_string())
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::llm_client::testing::{prompt_text, ScriptedGateway};

    fn bank(gateway: ScriptedGateway, source: QuestionSource) -> (QuestionBank, Arc<ScriptedGateway>) {
        let gateway = Arc::new(gateway);
        (QuestionBank::with_seed(gateway.clone(), source, 7), gateway)
    }

    #[test]
    fn test_clean_question_strips_numbering_and_quotes() {
        assert_eq!(
            clean_question("1. What is a generator?").as_deref(),
            Some("What is a generator?")
        );
        assert_eq!(
            clean_question("  \"How does asyncio schedule tasks?\"  ").as_deref(),
            Some("How does asyncio schedule tasks?")
        );
        assert_eq!(
            clean_question("Question 2: Explain the GIL.").as_deref(),
            Some("Explain the GIL.")
        );
        assert_eq!(clean_question("  \"\"  "), None);
    }

    #[test]
    fn test_clean_question_keeps_multiline_tasks() {
        let task = "Write a function that merges two sorted lists.\nExample: [1, 3] and [2] give [1, 2, 3].";
        assert_eq!(clean_question(task).as_deref(), Some(task));
    }

    #[test]
    fn test_question_source_from_str() {
        assert_eq!("static".parse::<QuestionSource>().unwrap(), QuestionSource::Static);
        assert_eq!(" Generated ".parse::<QuestionSource>().unwrap(), QuestionSource::Generated);
        assert!("canned".parse::<QuestionSource>().is_err());
    }

    #[tokio::test]
    async fn test_generated_question_uses_single_call_and_allowed_category() {
        let (bank, gateway) = bank(
            ScriptedGateway::always("1. What does the `yield` keyword do?"),
            QuestionSource::Generated,
        );

        let q = bank
            .next_question(Role::MiddlePython, &[QuestionCategory::Technical], &[])
            .await
            .unwrap();

        assert_eq!(q.category, QuestionCategory::Technical);
        assert_eq!(q.text, "What does the `yield` keyword do?");
        assert_eq!(gateway.call_count(), 1);

        let prompt = prompt_text(&gateway.calls()[0]);
        assert!(prompt.contains("Middle Python Developer"));
        assert!(prompt.contains("(none yet)"));
    }

    #[tokio::test]
    async fn test_prompt_lists_already_asked_questions() {
        let (bank, gateway) = bank(ScriptedGateway::always("Next?"), QuestionSource::Generated);
        let asked = vec![QuestionDescriptor {
            text: "What is a decorator?".to_string(),
            category: QuestionCategory::Technical,
        }];

        bank.next_question(Role::MiddlePython, &[QuestionCategory::Technical], &asked)
            .await
            .unwrap();

        assert!(prompt_text(&gateway.calls()[0]).contains("- What is a decorator?"));
    }

    #[tokio::test]
    async fn test_generation_retries_once_then_succeeds() {
        let (bank, gateway) = bank(
            ScriptedGateway::always("How would you shard a database?")
                .then([Err(LlmError::Timeout)]),
            QuestionSource::Generated,
        );

        let q = bank
            .next_question(Role::SeniorPython, &[QuestionCategory::Technical], &[])
            .await
            .unwrap();

        assert_eq!(q.text, "How would you shard a database?");
        assert_eq!(gateway.call_count(), 2);
    }

    #[tokio::test]
    async fn test_generation_fails_after_second_failure() {
        let (bank, gateway) = bank(
            ScriptedGateway::failing(LlmError::Http { status: 503 }),
            QuestionSource::Generated,
        );

        let err = bank
            .next_question(Role::JuniorPython, &[QuestionCategory::Technical], &[])
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            InterviewError::GenerationFailed {
                attempts: 2,
                source: LlmError::Http { status: 503 }
            }
        ));
        assert_eq!(gateway.call_count(), 2);
    }

    #[tokio::test]
    async fn test_unusable_completion_counts_as_failed_attempt() {
        let (bank, gateway) = bank(
            ScriptedGateway::always("\"\"").then([Ok("   ".to_string())]),
            QuestionSource::Generated,
        );

        let err = bank
            .next_question(Role::JuniorPython, &[QuestionCategory::Practical], &[])
            .await
            .unwrap_err();

        assert!(matches!(err, InterviewError::GenerationFailed { .. }));
        assert_eq!(gateway.call_count(), 2);
    }

    #[tokio::test]
    async fn test_static_source_never_calls_gateway_and_wraps_around() {
        let (bank, gateway) = bank(
            ScriptedGateway::failing(LlmError::Timeout),
            QuestionSource::Static,
        );
        let table = static_questions(Role::DataScientist, QuestionCategory::Practical);

        let mut asked = Vec::new();
        for i in 0..table.len() + 1 {
            let q = bank
                .next_question(Role::DataScientist, &[QuestionCategory::Practical], &asked)
                .await
                .unwrap();
            assert_eq!(q.category, QuestionCategory::Practical);
            assert_eq!(q.text, table[i % table.len()]);
            asked.push(q);
        }

        assert_eq!(gateway.call_count(), 0);
    }

    #[tokio::test]
    async fn test_category_is_drawn_from_allowed_set_only() {
        let (bank, _) = bank(ScriptedGateway::always("Q?"), QuestionSource::Static);
        let allowed = [QuestionCategory::Situational, QuestionCategory::Practical];

        let mut seen = HashSet::new();
        for _ in 0..100 {
            let q = bank.next_question(Role::TeamLead, &allowed, &[]).await.unwrap();
            assert!(allowed.contains(&q.category));
            seen.insert(q.category);
        }
        assert_eq!(seen.len(), 2, "both allowed categories should appear over 100 draws");
    }

    #[tokio::test]
    async fn test_same_seed_gives_same_category_sequence() {
        let draw = |seed: u64| async move {
            let bank = QuestionBank::with_seed(
                Arc::new(ScriptedGateway::always("Q?")),
                QuestionSource::Static,
                seed,
            );
            let mut categories = Vec::new();
            for _ in 0..20 {
                let q = bank
                    .next_question(Role::JuniorPython, &QuestionCategory::ALL, &[])
                    .await
                    .unwrap();
                categories.push(q.category);
            }
            categories
        };

        assert_eq!(draw(42).await, draw(42).await);
    }

    #[tokio::test]
    async fn test_empty_allowed_categories_is_configuration_error() {
        let (bank, _) = bank(ScriptedGateway::always("Q?"), QuestionSource::Generated);
        let err = bank
            .next_question(Role::JuniorPython, &[], &[])
            .await
            .unwrap_err();
        assert!(matches!(err, InterviewError::ConfigurationInvalid(_)));
    }
}
