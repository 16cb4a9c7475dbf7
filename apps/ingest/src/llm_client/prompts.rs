// Shared prompt fragments used by every structuring instruction.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured data extractor. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Instruction appended to every schema: omit rather than invent.
pub const NO_FABRICATION_INSTRUCTION: &str = "\
    CRITICAL: Only extract information that is explicitly present in the input text. \
    If a section is not present, omit it (or use an empty array); never guess or fabricate. \
    Do NOT add fields that are not in the schema.";
