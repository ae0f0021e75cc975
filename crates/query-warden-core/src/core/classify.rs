// crates/query-warden-core/src/core/classify.rs
// ============================================================================
// Module: Query Warden Operation Classifier
// Description: Keyword heuristics for intent and generated-query labeling.
// Purpose: Label free text and generated queries as read, write, or mutation.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! The classifier is a pair of pure string heuristics, not a parser: both
//! functions run case-insensitive substring searches against fixed keyword
//! lists. The heuristics carry two known, load-bearing imprecisions that must
//! be preserved as-is:
//!
//! - Interrogative override: "how do I update the price" classifies as a
//!   read because the question marker wins over the write keyword.
//! - Mutation conservatism: a read query whose filter value contains the
//!   substring `update` classifies as a mutation. The cost of the false
//!   positive is an extra refusal, never a silent write.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Classification Labels
// ============================================================================

/// Classified intent of a free-text request.
///
/// # Invariants
/// - Variants are stable for audit labeling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// Read-only lookup request.
    Read,
    /// Data-modifying request.
    Write,
}

impl Intent {
    /// Returns a stable label for the intent.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
        }
    }
}

/// Classified shape of a generated query string.
///
/// # Invariants
/// - Variants are stable for audit labeling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryClass {
    /// Read-only lookup query.
    Read,
    /// Data-modifying query.
    Mutation,
}

impl QueryClass {
    /// Returns a stable label for the query class.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Mutation => "mutation",
        }
    }
}

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Keyword lists driving the classifier heuristics.
///
/// # Invariants
/// - Keywords are matched as case-insensitive substrings; entries are stored
///   lowercase.
/// - Lists come from configuration so prompt or policy variants never fork
///   the classifier logic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Keywords indicating a write intent in free text.
    pub write_keywords: Vec<String>,
    /// Interrogative markers that force a read classification.
    pub read_markers: Vec<String>,
    /// Tokens marking a generated query as a mutation.
    pub mutation_tokens: Vec<String>,
    /// Keywords triggering a sensitive-operation warning.
    pub sensitive_keywords: Vec<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            write_keywords: vec![
                "update".to_string(),
                "delete".to_string(),
                "create".to_string(),
                "modify".to_string(),
                "set".to_string(),
                "remove".to_string(),
                "add new".to_string(),
            ],
            read_markers: vec![
                "what".to_string(),
                "show".to_string(),
                "tell".to_string(),
                "how".to_string(),
            ],
            mutation_tokens: vec![
                "mutation".to_string(),
                "update".to_string(),
                "delete".to_string(),
                "create".to_string(),
                "set".to_string(),
            ],
            sensitive_keywords: vec![
                "delete".to_string(),
                "bulk update".to_string(),
                "change price".to_string(),
            ],
        }
    }
}

// ============================================================================
// SECTION: Classifier
// ============================================================================

/// Pure keyword classifier for request intent and generated queries.
///
/// # Invariants
/// - Classification is deterministic for identical inputs.
/// - No function here blocks; all matching is in-memory substring search.
#[derive(Debug, Clone)]
pub struct OperationClassifier {
    /// Keyword lists, lowercased at construction.
    config: ClassifierConfig,
}

impl OperationClassifier {
    /// Creates a classifier, lowercasing every configured keyword once.
    #[must_use]
    pub fn new(config: ClassifierConfig) -> Self {
        Self {
            config: ClassifierConfig {
                write_keywords: lowercase_all(config.write_keywords),
                read_markers: lowercase_all(config.read_markers),
                mutation_tokens: lowercase_all(config.mutation_tokens),
                sensitive_keywords: lowercase_all(config.sensitive_keywords),
            },
        }
    }

    /// Classifies the intent of a free-text request.
    ///
    /// A message is a write iff it contains any write keyword AND no
    /// interrogative marker. The interrogative override takes precedence:
    /// a question marker short-circuits to read even when write keywords are
    /// present.
    #[must_use]
    pub fn classify_intent(&self, text: &str) -> Intent {
        let lowered = text.to_lowercase();
        if contains_any(&lowered, &self.config.read_markers) {
            return Intent::Read;
        }
        if contains_any(&lowered, &self.config.write_keywords) {
            return Intent::Write;
        }
        Intent::Read
    }

    /// Classifies a generated query string.
    ///
    /// The query is a mutation iff any mutation token appears as a substring.
    /// Deliberately over-broad; see the module overview.
    #[must_use]
    pub fn classify_query(&self, generated_query: &str) -> QueryClass {
        let lowered = generated_query.to_lowercase();
        if contains_any(&lowered, &self.config.mutation_tokens) {
            return QueryClass::Mutation;
        }
        QueryClass::Read
    }

    /// Returns whether the text contains a sensitive-operation keyword.
    ///
    /// Independent of the read/write classification; used only to trigger a
    /// warning, never to block.
    #[must_use]
    pub fn contains_sensitive_keyword(&self, text: &str) -> bool {
        let lowered = text.to_lowercase();
        contains_any(&lowered, &self.config.sensitive_keywords)
    }
}

impl Default for OperationClassifier {
    fn default() -> Self {
        Self::new(ClassifierConfig::default())
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns whether any keyword appears as a substring of the lowered text.
fn contains_any(lowered: &str, keywords: &[String]) -> bool {
    keywords.iter().any(|keyword| lowered.contains(keyword.as_str()))
}

/// Lowercases every keyword in a list.
fn lowercase_all(keywords: Vec<String>) -> Vec<String> {
    keywords.into_iter().map(|keyword| keyword.to_lowercase()).collect()
}
