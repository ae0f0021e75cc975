// crates/query-warden-core/tests/classifier.rs
// ============================================================================
// Module: Operation Classifier Tests
// Description: Validate intent, mutation, and sensitive-keyword heuristics.
// Purpose: Pin the interrogative override and substring conservatism.
// Dependencies: query-warden-core
// ============================================================================

//! Classifier behavior tests. The interrogative-override and
//! mutation-substring edge cases are pinned deliberately: they are
//! pre-existing policy choices, not bugs to fix.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use query_warden_core::ClassifierConfig;
use query_warden_core::Intent;
use query_warden_core::OperationClassifier;
use query_warden_core::QueryClass;

#[test]
fn plain_lookup_classifies_as_read() {
    let classifier = OperationClassifier::default();
    assert_eq!(classifier.classify_intent("list the five cheapest products"), Intent::Read);
}

#[test]
fn write_keyword_classifies_as_write() {
    let classifier = OperationClassifier::default();
    assert_eq!(classifier.classify_intent("update the price of SKU-1 to 9.99"), Intent::Write);
    assert_eq!(classifier.classify_intent("delete the old banner product"), Intent::Write);
    assert_eq!(classifier.classify_intent("add new variant in blue"), Intent::Write);
}

#[test]
fn interrogative_override_beats_write_keywords() {
    // Known heuristic limitation, preserved: a question about updating is a
    // read even though "update" is present.
    let classifier = OperationClassifier::default();
    assert_eq!(classifier.classify_intent("how do I update the price"), Intent::Read);
    assert_eq!(classifier.classify_intent("how do I update inventory"), Intent::Read);
    assert_eq!(classifier.classify_intent("show products I should delete"), Intent::Read);
    assert_eq!(classifier.classify_intent("what would a bulk update change"), Intent::Read);
}

#[test]
fn intent_matching_is_case_insensitive() {
    let classifier = OperationClassifier::default();
    assert_eq!(classifier.classify_intent("UPDATE the price"), Intent::Write);
    assert_eq!(classifier.classify_intent("SHOW me the UPDATE"), Intent::Read);
}

#[test]
fn read_query_without_tokens_classifies_as_read() {
    let classifier = OperationClassifier::default();
    assert_eq!(
        classifier.classify_query("query { products(first: 5) { title } }"),
        QueryClass::Read
    );
}

#[test]
fn mutation_keyword_classifies_as_mutation() {
    let classifier = OperationClassifier::default();
    assert_eq!(
        classifier.classify_query("mutation { productDelete(input: {id: \"1\"}) { id } }"),
        QueryClass::Mutation
    );
}

#[test]
fn mutation_substring_false_positive_is_accepted() {
    // Conservative by design: a read query whose filter value contains the
    // substring "update" is treated as a mutation. The cost of the false
    // positive is a refusal, never a silent write.
    let classifier = OperationClassifier::default();
    assert_eq!(
        classifier.classify_query("query { products(query:\"title:*update*\") }"),
        QueryClass::Mutation
    );
}

#[test]
fn sensitive_keywords_warn_independently_of_intent() {
    let classifier = OperationClassifier::default();
    assert!(classifier.contains_sensitive_keyword("please delete everything"));
    assert!(classifier.contains_sensitive_keyword("run a BULK UPDATE tonight"));
    assert!(classifier.contains_sensitive_keyword("change price of all hats"));
    assert!(!classifier.contains_sensitive_keyword("show me the best sellers"));
    // Sensitive detection fires even when the interrogative override makes
    // the intent a read.
    assert!(classifier.contains_sensitive_keyword("how do I change price labels"));
}

#[test]
fn configured_keywords_replace_defaults() {
    let classifier = OperationClassifier::new(ClassifierConfig {
        write_keywords: vec!["archive".to_string()],
        read_markers: vec!["why".to_string()],
        mutation_tokens: vec!["archiveproduct".to_string()],
        sensitive_keywords: vec!["purge".to_string()],
    });
    assert_eq!(classifier.classify_intent("archive the summer line"), Intent::Write);
    assert_eq!(classifier.classify_intent("why archive the summer line"), Intent::Read);
    // Default keywords no longer apply.
    assert_eq!(classifier.classify_intent("update the price"), Intent::Read);
    assert_eq!(classifier.classify_query("mutation { productSet }"), QueryClass::Read);
    assert_eq!(classifier.classify_query("{ archiveProduct }"), QueryClass::Mutation);
    assert!(classifier.contains_sensitive_keyword("purge stale drafts"));
}
