//! Deterministic stand-in for the language model.
//!
//! Used when an agent cannot reach a real model (usually: no API key). Answers
//! are picked by keyword on the task description so the pipeline still
//! produces recognisable output.

/// Keyword groups in priority order. The first group with a hit wins.
const RULES: &[(&[&str], &str)] = &[
    (
        &["architecture", "architect"],
        "Monolithic-like architecture inferred from repository layout.",
    ),
    (
        &["design patterns", "design pattern"],
        "Singleton\nFactory\nAdapter",
    ),
    (&["dockerfile"], "# Dockerfile\nFROM python:3.11-slim\n# ..."),
    (&["kubernetes", "k8s"], "apiVersion: v1\nkind: Service\n# ..."),
    (&["ci/cd", "ci cd", "pipeline"], "# CI/CD pipeline stub"),
    (
        &["environment variables", "env"],
        "DATABASE_URL, REDIS_URL",
    ),
];

/// Returned when no keyword matches.
pub const DEFAULT_RESPONSE: &str = "Stubbed result";

/// Canned responder keyed on task descriptions.
#[derive(Debug, Clone, Copy, Default)]
pub struct StubResponder;

impl StubResponder {
    /// Answer a task description. Total and deterministic.
    pub fn respond(&self, description: &str) -> String {
        let lowered = description.to_lowercase();
        RULES
            .iter()
            .find(|(keywords, _)| keywords.iter().any(|k| lowered.contains(k)))
            .map(|(_, answer)| *answer)
            .unwrap_or(DEFAULT_RESPONSE)
            .to_string()
    }
}
