//! Heuristic deciding whether a question should be grounded with external context.

use once_cell::sync::Lazy;
use regex::Regex;

/// Words that point at the ministry's documents, services or contacts
pub const DOCUMENT_KEYWORDS: [&str; 14] = [
    "policy",
    "procedure",
    "guideline",
    "document",
    "report",
    "statistics",
    "regulation",
    "law",
    "program",
    "initiative",
    "contact",
    "office",
    "department",
    "service",
];

// No word boundaries: "somewhat" counts as a question.
static FACTS_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)what|when|where|who|how|why|which").expect("static pattern is valid")
});

/// Returns true when the query mentions a document keyword or reads like a factual question.
pub fn should_retrieve(query: &str) -> bool {
    let lowered = query.to_lowercase();
    let needs_documents = DOCUMENT_KEYWORDS.iter().any(|k| lowered.contains(k));
    needs_documents || FACTS_PATTERN.is_match(query)
}
