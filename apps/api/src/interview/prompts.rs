// Question generation prompts and the static fallback question table.

use crate::interview::catalog::{QuestionCategory, Role};

/// System prompt for question generation.
pub const QUESTION_SYSTEM: &str = "You are an experienced HR specialist who writes \
    unique, specific questions for technical job interviews. \
    You write exactly one question at a time.";

/// Question generation prompt template.
/// Replace: {category_prompt}, {role}, {focus_areas}, {asked_questions}
pub const QUESTION_PROMPT_TEMPLATE: &str = r#"Write {category_prompt} for a job interview for the position of {role}.

Topics relevant to this position: {focus_areas}.

Questions already asked in this interview (do NOT repeat or rephrase them):
{asked_questions}

RULES:
1. The question must be concrete and relevant to the position
2. One question only — no numbering, no quotes, no commentary
3. Return ONLY the question text"#;

/// Questions served in degraded mode, indexed by role and category.
pub fn static_questions(role: Role, category: QuestionCategory) -> &'static [&'static str] {
    use QuestionCategory::*;
    use Role::*;

    match (role, category) {
        (JuniorPython, Technical) => &[
            "What is the difference between a list and a tuple in Python?",
            "How do `for` and `while` loops differ, and when would you use each?",
            "How do you handle exceptions in Python? Show a try/except/finally example.",
        ],
        (JuniorPython, Situational) => &[
            "You have been stuck on a task for a whole day. What do you do?",
            "A reviewer left twenty comments on your first pull request. How do you respond?",
            "You realise you will miss a deadline you committed to. What steps do you take?",
        ],
        (JuniorPython, Practical) => &[
            "Write a function that counts how many times each word occurs in a text file.",
            "Write a function that returns the second largest number in a list without sorting it.",
            "Write a function that checks whether a string is a palindrome, ignoring case and spaces.",
        ],
        (MiddlePython, Technical) => &[
            "Explain the difference between @classmethod, @staticmethod and regular methods.",
            "How do decorators work in Python? Give an example of a decorator that takes arguments.",
            "What is the GIL and how does it affect multithreaded code?",
        ],
        (MiddlePython, Situational) => &[
            "A colleague keeps merging code without tests. How do you address it?",
            "A production endpoint became ten times slower after a release. Walk me through your actions.",
            "Product asks for a feature you believe will hurt the architecture. What do you do?",
        ],
        (MiddlePython, Practical) => &[
            "Write a context manager that measures and logs the execution time of a block.",
            "Implement an LRU cache decorator without using functools.lru_cache.",
            "Write an async function that fetches a list of URLs with at most five requests in flight.",
        ],
        (SeniorPython, Technical) => &[
            "How would you design a service that must handle ten thousand requests per second?",
            "When would you split a monolith into services, and when would you not?",
            "How do you pay down technical debt in a codebase that is under active development?",
        ],
        (SeniorPython, Situational) => &[
            "Two senior engineers disagree strongly on an architectural approach. How do you resolve it?",
            "A junior developer's pull requests repeatedly need major rework. How do you mentor them?",
            "You inherit a critical legacy system with no tests and no documentation. What is your plan for the first month?",
        ],
        (SeniorPython, Practical) => &[
            "Design the data model and API for a rate limiter shared by several service instances.",
            "Sketch a retry strategy for calls to an unreliable third-party API and explain its failure modes.",
            "Outline how you would find and fix a memory leak in a long-running Python worker.",
        ],
        (DataScientist, Technical) => &[
            "How do you handle missing values in a dataset, and how does the choice affect the model?",
            "Explain the bias-variance trade-off with an example.",
            "What is the difference between precision and recall, and when do you optimise for each?",
        ],
        (DataScientist, Situational) => &[
            "A stakeholder insists on a metric you think is misleading. How do you handle it?",
            "Your model performs well offline but poorly in production. What do you investigate?",
            "You have two weeks to deliver a model and the data is messy. How do you plan the work?",
        ],
        (DataScientist, Practical) => &[
            "Using pandas, compute monthly user retention from a table of login events.",
            "Write code that splits a dataset into train and test sets while preserving class balance.",
            "Build a scikit-learn pipeline that scales numeric features, one-hot encodes categoricals and fits a classifier.",
        ],
        (TeamLead, Technical) => &[
            "How do you decide which technical standards your team must follow?",
            "How do you organise code review so that it is fast and still catches problems?",
            "What does a healthy release process look like for a team of eight developers?",
        ],
        (TeamLead, Situational) => &[
            "A strong engineer on your team has become disengaged. What do you do?",
            "A customer demands a feature by a date your team cannot meet. How do you respond?",
            "Two team members are in open conflict during planning meetings. How do you handle it?",
        ],
        (TeamLead, Practical) => &[
            "Plan the onboarding of two new developers for their first two weeks.",
            "Draft an agenda for a post-incident review after a production outage.",
            "Break the request 'make the system faster' down into a plan the team can execute.",
        ],
    }
}
