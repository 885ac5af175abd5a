//! Key gate state-machine tests, with the selector capability mocked.

use std::sync::Arc;

use crate::core::keygate::{
    KeyGate, KeySelector, KeyStatus, MockKeySelector, SelectorError, MSG_KEY_REJECTED,
    MSG_SESSION_INVALID,
};

fn gate_with(mock: MockKeySelector) -> KeyGate {
    KeyGate::new(Some(Arc::new(mock) as Arc<dyn KeySelector>), true)
}

#[tokio::test]
async fn test_starts_unresolved() {
    let gate = KeyGate::new(None, true);
    assert_eq!(gate.status(), KeyStatus::Unresolved);
    assert!(!gate.is_ready());
}

#[tokio::test]
async fn test_missing_capability_folds_to_ready() {
    // Permissive policy: no selector wired means the environment is
    // assumed to carry an injected key.
    let mut gate = KeyGate::new(None, true);
    assert_eq!(gate.check_availability().await, KeyStatus::Ready);
    assert!(gate.last_error().is_none());
}

#[tokio::test]
async fn test_probe_reflects_selector_answer() {
    let mut mock = MockKeySelector::new();
    mock.expect_has_selected_key().returning(|| Ok(true));
    let mut gate = gate_with(mock);
    assert_eq!(gate.check_availability().await, KeyStatus::Ready);

    let mut mock = MockKeySelector::new();
    mock.expect_has_selected_key().returning(|| Ok(false));
    let mut gate = gate_with(mock);
    assert_eq!(gate.check_availability().await, KeyStatus::NotReady);
    // No key yet is not an error condition
    assert!(gate.last_error().is_none());
}

#[tokio::test]
async fn test_probe_failure_sets_error() {
    let mut mock = MockKeySelector::new();
    mock.expect_has_selected_key()
        .returning(|| Err(SelectorError::Storage("keychain locked".to_string())));
    let mut gate = gate_with(mock);
    assert_eq!(gate.check_availability().await, KeyStatus::NotReady);
    assert!(gate.last_error().is_some());
}

#[tokio::test]
async fn test_selection_success_clears_prior_error() {
    let mut mock = MockKeySelector::new();
    mock.expect_select_key()
        .withf(|key: &str| key == "AIzaNewKey")
        .returning(|_| Ok(()));
    let mut gate = gate_with(mock);

    gate.report_authorization_failure();
    assert_eq!(gate.status(), KeyStatus::NotReady);
    assert!(gate.forced_reselection());
    assert_eq!(gate.last_error(), Some(MSG_KEY_REJECTED));

    assert_eq!(gate.request_selection("AIzaNewKey").await, KeyStatus::Ready);
    assert!(!gate.forced_reselection());
    assert!(gate.last_error().is_none());
}

#[tokio::test]
async fn test_lost_entry_reports_session_invalidated() {
    let mut mock = MockKeySelector::new();
    mock.expect_select_key()
        .returning(|_| Err(SelectorError::NotFound("gemini_api_key".to_string())));
    let mut gate = gate_with(mock);

    assert_eq!(gate.request_selection("AIzaKey").await, KeyStatus::NotReady);
    assert_eq!(gate.last_error(), Some(MSG_SESSION_INVALID));
}

#[tokio::test]
async fn test_generic_selection_failure_keeps_generic_message() {
    let mut mock = MockKeySelector::new();
    mock.expect_select_key()
        .returning(|_| Err(SelectorError::Storage("no backend".to_string())));
    let mut gate = gate_with(mock);

    assert_eq!(gate.request_selection("AIzaKey").await, KeyStatus::NotReady);
    let error = gate.last_error().expect("error message");
    assert_ne!(error, MSG_SESSION_INVALID);
}

#[tokio::test]
async fn test_forced_reselection_skips_the_probe() {
    let mut mock = MockKeySelector::new();
    // The probe must not be consulted while reselection is forced; a cached
    // "selected" answer is exactly what got rejected upstream.
    mock.expect_has_selected_key().never();
    let mut gate = gate_with(mock);

    gate.report_authorization_failure();
    assert_eq!(gate.check_availability().await, KeyStatus::NotReady);
}

#[tokio::test]
async fn test_rejection_after_ready_forces_reselection() {
    let mut mock = MockKeySelector::new();
    mock.expect_has_selected_key().returning(|| Ok(true));
    mock.expect_select_key().returning(|_| Ok(()));
    let mut gate = gate_with(mock);

    assert_eq!(gate.check_availability().await, KeyStatus::Ready);
    gate.report_authorization_failure();
    assert_eq!(gate.status(), KeyStatus::NotReady);

    // A successful reselection restores readiness without a restart
    assert_eq!(gate.request_selection("AIzaAgain").await, KeyStatus::Ready);
    assert!(gate.is_ready());
}
