// Shared prompt fragments used by more than one caller of the gateway.
// Question and evaluation prompts live next to the code that sends them.

/// Persona shared by every interviewer-side prompt.
pub const INTERVIEWER_PERSONA: &str = "You are an experienced HR specialist \
    running a realistic technical job interview. \
    Address the candidate directly and stay professional.";

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_INSTRUCTION: &str = "You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";
