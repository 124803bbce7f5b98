// Evaluation prompt templates. Section headers in CAPS are stable markers.

/// System prompt for the short per-answer reaction.
pub const FEEDBACK_SYSTEM: &str = "You are an experienced HR specialist interviewing a candidate. \
    Give short feedback on the candidate's answer (1-2 sentences). \
    Speak to the candidate directly and react like a person would: \
    show satisfaction, doubt or confusion where it fits. \
    Be specific and constructive.";

/// Replace: {question}, {answer}
pub const FEEDBACK_PROMPT_TEMPLATE: &str = "QUESTION:\n{question}\n\nCANDIDATE ANSWER:\n{answer}";

/// Replace: {role}, {transcript}
pub const FINAL_REPORT_PROMPT_TEMPLATE: &str = r#"Analyse the candidate's answers for the position of {role} and give DETAILED feedback.

INTERVIEW TRANSCRIPT:
{transcript}

Return a JSON object with this EXACT schema:
{
  "overall_impression": "two or three sentences",
  "strengths": ["2-3 specific points that reference the answers"],
  "growth_areas": ["2-3 constructive points"],
  "recommendations": ["concrete learning steps: courses, books, practice projects"],
  "verdict": "suitable / not suitable for the position, and why",
  "score": 7
}

RULES:
1. "score" is an integer from 1 to 10
2. Be specific — refer to the candidate's actual answers
3. Return ONLY the JSON object"#;

/// Replace: {perspective}, {instruction}, {rubric}, {role}, {question}, {answer}
pub const PERSPECTIVE_FEEDBACK_TEMPLATE: &str = r#"PERSPECTIVE: {perspective}
{instruction}

SCORING RUBRIC (for your own calibration, do not quote it):
{rubric}

Position: {role}

QUESTION:
{question}

CANDIDATE ANSWER:
{answer}

Reply with one or two sentences addressed to the candidate."#;

/// Replace: {perspective}, {instruction}, {rubric}, {role}, {transcript}
pub const PERSPECTIVE_REPORT_TEMPLATE: &str = r#"PERSPECTIVE: {perspective}
{instruction}

SCORING RUBRIC:
{rubric}

Position: {role}

INTERVIEW TRANSCRIPT:
{transcript}

Return a JSON object with this EXACT schema:
{
  "score": 7,
  "summary": "three or four sentences from your perspective, referring to specific answers"
}"#;

/// Replace: {question}, {notes}
pub const MERGE_FEEDBACK_TEMPLATE: &str = r#"Several interviewers reacted to the same answer.

QUESTION:
{question}

REVIEWER NOTES:
{notes}

Combine the notes into one or two natural sentences addressed to the candidate. Do not mention that there were several reviewers."#;

/// Replace: {role}, {notes}
pub const MERGE_REPORT_TEMPLATE: &str = r#"The hiring panel for the position of {role} evaluated the interview from several perspectives.

REVIEWER NOTES:
{notes}

Merge the notes into a single final report. Return a JSON object with this EXACT schema:
{
  "overall_impression": "two or three sentences",
  "strengths": ["2-3 points"],
  "growth_areas": ["2-3 points"],
  "recommendations": ["concrete learning steps"],
  "verdict": "suitable / not suitable for the position, and why",
  "score": 7
}

"score" is an integer from 1 to 10. Return ONLY the JSON object."#;
