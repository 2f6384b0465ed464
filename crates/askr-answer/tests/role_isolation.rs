//! Role isolation across both tiers.
//!
//! A non-administrative role must never receive content from an entry or a
//! document whose allowed roles exclude it, whether the answer comes from
//! the structured store or from a completion grounded in search hits.
//! The administrative role sees everything.

use askr_answer::{AnswerOrchestrator, NO_ANSWER_MESSAGE};
use askr_core::{AskrConfig, Role};
use askr_test_utils::fixtures::{
    self, BOARD_MINUTES_CONTENT, EXPENSE_PASSAGE, LEAVE_POLICY_CONTENT, PAYROLL_CONTENT,
    PAYROLL_PASSAGE, VPN_PASSAGE,
};
use askr_test_utils::{RecordingIndex, ScriptedCompletion};
use pretty_assertions::assert_eq;
use std::sync::Arc;

struct Harness {
    orchestrator: AnswerOrchestrator,
    index: Arc<RecordingIndex>,
    llm: Arc<ScriptedCompletion>,
}

fn harness() -> Harness {
    let index = RecordingIndex::new(fixtures::seeded_index());
    let llm = ScriptedCompletion::answering("grounded reply");
    let orchestrator = AnswerOrchestrator::from_backends(
        fixtures::seeded_store(),
        index.clone(),
        llm.clone(),
        &AskrConfig::default(),
    );
    Harness {
        orchestrator,
        index,
        llm,
    }
}

/// Tenet: a structured entry restricted to IT is invisible to HR and User,
/// who fall through to the search tier instead.
#[tokio::test]
async fn structured_entries_respect_roles() {
    let h = harness();

    assert_eq!(
        h.orchestrator.answer("Leave Policy", Role::It, "it-1").await,
        LEAVE_POLICY_CONTENT
    );
    assert_ne!(
        h.orchestrator.answer("Leave Policy", Role::Hr, "hr-1").await,
        LEAVE_POLICY_CONTENT
    );
    assert_ne!(
        h.orchestrator.answer("Leave Policy", Role::User, "user-1").await,
        LEAVE_POLICY_CONTENT
    );
    assert_eq!(
        h.orchestrator.answer("Payroll Calendar", Role::Hr, "hr-1").await,
        PAYROLL_CONTENT
    );
}

/// Tenet: the administrative role bypasses every allowed-role set.
#[tokio::test]
async fn admin_sees_all_structured_entries() {
    let h = harness();

    for (question, content) in [
        ("Leave Policy", LEAVE_POLICY_CONTENT),
        ("Payroll Calendar", PAYROLL_CONTENT),
        ("Board Minutes", BOARD_MINUTES_CONTENT),
    ] {
        assert_eq!(h.orchestrator.answer(question, Role::Admin, "root").await, content);
    }
}

/// Tenet: a cached answer for one role is never served to another.
#[tokio::test]
async fn cache_is_partitioned_by_role() {
    let h = harness();

    assert_eq!(
        h.orchestrator.answer("Board Minutes", Role::Admin, "root").await,
        BOARD_MINUTES_CONTENT
    );
    assert_eq!(
        h.orchestrator.answer("Board Minutes", Role::It, "it-1").await,
        NO_ANSWER_MESSAGE
    );
}

/// Tenet: the role filter is sent inside the search request, and the
/// grounding block holds only passages the role may see.
#[tokio::test]
async fn grounding_contains_only_visible_passages() {
    let h = harness();

    h.orchestrator.answer("payroll month", Role::It, "it-1").await;

    let requests = h.index.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].filter.map(|f| f.role()), Some(Role::It));
    assert_eq!(requests[0].top, 5);

    let prompt = h.llm.last_prompt().unwrap_or_default();
    assert!(prompt.contains(EXPENSE_PASSAGE));
    assert!(!prompt.contains(PAYROLL_PASSAGE), "HR passage leaked to IT");
    assert!(!prompt.contains(VPN_PASSAGE), "irrelevant passage in grounding");
}

/// Tenet: administrative searches are unfiltered.
#[tokio::test]
async fn admin_grounding_is_unfiltered() {
    let h = harness();

    h.orchestrator.answer("payroll month", Role::Admin, "root").await;

    let requests = h.index.requests();
    assert!(requests[0].filter.is_none());

    let prompt = h.llm.last_prompt().unwrap_or_default();
    assert!(prompt.contains(PAYROLL_PASSAGE));
    assert!(prompt.contains(EXPENSE_PASSAGE));
}

/// Tenet: a role with no visible passages gets no completion at all.
#[tokio::test]
async fn role_without_visible_passages_gets_no_answer() {
    let h = harness();

    let reply = h.orchestrator.answer("VPN", Role::User, "guest").await;

    assert_eq!(reply, NO_ANSWER_MESSAGE);
    assert_eq!(h.llm.calls(), 0);
}
