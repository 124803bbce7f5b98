//! Evaluation perspectives and their canned fallback reactions.

use std::sync::{Mutex, PoisonError};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// One evaluation lens applied to the same answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Perspective {
    Technical,
    Career,
    Interpersonal,
}

impl Perspective {
    /// Display order.
    pub const ALL: [Perspective; 3] = [
        Perspective::Technical,
        Perspective::Career,
        Perspective::Interpersonal,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            Perspective::Technical => "Technical expert",
            Perspective::Career => "Career coach",
            Perspective::Interpersonal => "HR specialist",
        }
    }

    pub fn instruction(&self) -> &'static str {
        match self {
            Perspective::Technical => {
                "You are a senior engineer on the hiring panel. Judge correctness, depth \
                 and precision of the technical content. Point out factual mistakes plainly."
            }
            Perspective::Career => {
                "You are a career coach on the hiring panel. Judge how well the answer \
                 demonstrates readiness for the target level and what the candidate should \
                 learn next."
            }
            Perspective::Interpersonal => {
                "You are an HR specialist on the hiring panel. Judge communication, \
                 structure of the answer, teamwork and attitude."
            }
        }
    }

    pub fn rubric(&self) -> &'static str {
        match self {
            Perspective::Technical => {
                "1-3: wrong or missing fundamentals; 4-6: correct but shallow; \
                 7-8: correct with trade-offs discussed; 9-10: expert-level depth with examples"
            }
            Perspective::Career => {
                "1-3: well below the target level; 4-6: approaching the level with clear gaps; \
                 7-8: at the target level; 9-10: ready for the next level"
            }
            Perspective::Interpersonal => {
                "1-3: unclear or dismissive; 4-6: understandable but unstructured; \
                 7-8: clear, structured and collaborative; 9-10: compelling and empathetic"
            }
        }
    }
}

/// Canned reactions used when a perspective's completion call fails.
/// Selection is uniform and seedable.
pub struct FallbackPhraseTable {
    rng: Mutex<StdRng>,
}

impl FallbackPhraseTable {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn phrases(perspective: Perspective) -> &'static [&'static str] {
        match perspective {
            Perspective::Technical => &[
                "The technical core is there; a concrete example would make it convincing.",
                "Reasonable approach. I would like to hear more about edge cases.",
                "Decent answer, but the trade-offs deserve a closer look.",
            ],
            Perspective::Career => &[
                "This shows steady progress toward the target level.",
                "A good base to grow from; depth will come with practice.",
                "Keep building on this with a hands-on project.",
            ],
            Perspective::Interpersonal => &[
                "Clearly expressed, thank you.",
                "Good structure; a little more context about the team would help.",
                "Confident delivery. Keep the answer focused on your own role.",
            ],
        }
    }

    pub fn pick(&self, perspective: Perspective) -> &'static str {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        Self::phrases(perspective)
            .choose(&mut *rng)
            .copied()
            .unwrap_or("Thank you for the answer.")
    }
}

impl Default for FallbackPhraseTable {
    fn default() -> Self {
        Self::new()
    }
}
