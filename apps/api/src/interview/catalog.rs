//! Fixed interview catalog: target roles, length presets, question categories.

use serde::{Deserialize, Serialize};

use crate::evaluation::perspective::Perspective;

/// Upper bound for an explicit question count.
pub const MAX_QUESTIONS: usize = 20;

/// Target track the candidate is interviewing for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    JuniorPython,
    MiddlePython,
    SeniorPython,
    DataScientist,
    TeamLead,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::JuniorPython,
        Role::MiddlePython,
        Role::SeniorPython,
        Role::DataScientist,
        Role::TeamLead,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            Role::JuniorPython => "Junior Python Developer",
            Role::MiddlePython => "Middle Python Developer",
            Role::SeniorPython => "Senior Python Developer",
            Role::DataScientist => "Data Scientist",
            Role::TeamLead => "Python Team Lead",
        }
    }

    /// Topics the generated questions should cover for this track.
    pub fn focus_areas(&self) -> &'static [&'static str] {
        match self {
            Role::JuniorPython => &[
                "core Python syntax",
                "built-in data structures",
                "simple algorithms",
                "object-oriented basics",
                "working with files",
            ],
            Role::MiddlePython => &[
                "advanced object-oriented design",
                "decorators, generators and context managers",
                "threading and asyncio",
                "design patterns",
                "profiling and optimisation",
            ],
            Role::SeniorPython => &[
                "architecture decisions",
                "scaling applications",
                "code review and mentoring",
                "system design",
                "technical debt and refactoring",
            ],
            Role::DataScientist => &[
                "pandas, NumPy and scikit-learn",
                "data visualisation",
                "statistical analysis",
                "machine learning",
                "data preprocessing",
            ],
            Role::TeamLead => &[
                "managing a team",
                "technical leadership",
                "development processes",
                "architectural decision making",
                "communicating with stakeholders",
            ],
        }
    }
}

/// Length presets offered to the candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterviewLength {
    Short,
    Medium,
    Long,
}

impl InterviewLength {
    pub const ALL: [InterviewLength; 3] = [
        InterviewLength::Short,
        InterviewLength::Medium,
        InterviewLength::Long,
    ];

    pub fn question_count(&self) -> usize {
        match self {
            InterviewLength::Short => 3,
            InterviewLength::Medium => 5,
            InterviewLength::Long => 10,
        }
    }
}

/// Requested session length: a preset name or an explicit question count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LengthSpec {
    Preset(InterviewLength),
    Count(usize),
}

impl LengthSpec {
    pub fn question_count(&self) -> usize {
        match self {
            LengthSpec::Preset(preset) => preset.question_count(),
            LengthSpec::Count(count) => *count,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionCategory {
    Technical,
    Situational,
    Practical,
}

impl QuestionCategory {
    pub const ALL: [QuestionCategory; 3] = [
        QuestionCategory::Technical,
        QuestionCategory::Situational,
        QuestionCategory::Practical,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            QuestionCategory::Technical => "Technical questions",
            QuestionCategory::Situational => "Situational questions",
            QuestionCategory::Practical => "Practical tasks",
        }
    }

    /// What the generator is asked to produce for this category.
    pub fn prompt_fragment(&self) -> &'static str {
        match self {
            QuestionCategory::Technical => "a technical question that checks the candidate's knowledge",
            QuestionCategory::Situational => {
                "a situational question about a realistic workplace situation or behaviour within a team"
            }
            QuestionCategory::Practical => {
                "a practical task or short coding challenge that checks hands-on programming skills"
            }
        }
    }

    /// Evaluation lenses that apply to answers in this category, in display order.
    pub fn perspectives(&self) -> &'static [Perspective] {
        match self {
            QuestionCategory::Technical => &[Perspective::Technical, Perspective::Career],
            QuestionCategory::Situational => &[Perspective::Interpersonal, Perspective::Career],
            QuestionCategory::Practical => &[Perspective::Technical],
        }
    }
}

/// Union of the perspectives of `categories`, in `Perspective::ALL` order.
pub fn perspectives_for(categories: &[QuestionCategory]) -> Vec<Perspective> {
    Perspective::ALL
        .into_iter()
        .filter(|p| categories.iter().any(|c| c.perspectives().contains(p)))
        .collect()
}
