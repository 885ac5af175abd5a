//! Chat orchestrator tests.
//!
//! The transcript contract: append-only except the streaming placeholder,
//! which grows in place and is located by its monotonic id.

use crate::config::GeminiConfig;
use crate::core::chat::{ChatDesk, ChatEvent, ChatRole};

use proptest::prelude::*;
use rstest::rstest;

#[test]
fn test_desk_opens_with_greeting() {
    let desk = ChatDesk::new();
    assert_eq!(desk.transcript().len(), 1);
    assert_eq!(desk.transcript()[0].role, ChatRole::Model);
    assert!(!desk.transcript()[0].text.is_empty());
    assert!(!desk.busy());
}

#[test]
fn test_fragments_grow_single_placeholder() {
    let mut desk = ChatDesk::new();
    let entry_id = desk.begin_exchange("Hi");
    assert!(desk.busy());
    // Greeting + user entry + placeholder
    assert_eq!(desk.transcript().len(), 3);

    for fragment in ["Hel", "lo wor", "ld"] {
        desk.handle_event(ChatEvent::Fragment {
            entry_id,
            text: fragment.to_string(),
        });
    }
    desk.handle_event(ChatEvent::Done { entry_id });

    // Exactly one model entry was added, not one per fragment
    assert_eq!(desk.transcript().len(), 3);
    let entry = desk
        .transcript()
        .iter()
        .find(|e| e.id == entry_id)
        .expect("placeholder");
    assert_eq!(entry.text, "Hello world");
    assert_eq!(entry.role, ChatRole::Model);
    assert!(!desk.busy());
}

#[test]
fn test_user_entry_precedes_placeholder() {
    let mut desk = ChatDesk::new();
    let entry_id = desk.begin_exchange("What is a good CTA?");

    let transcript = desk.transcript();
    let user = &transcript[transcript.len() - 2];
    let placeholder = &transcript[transcript.len() - 1];
    assert_eq!(user.role, ChatRole::User);
    assert_eq!(user.text, "What is a good CTA?");
    assert_eq!(placeholder.role, ChatRole::Model);
    assert!(placeholder.text.is_empty());
    assert_eq!(placeholder.id, entry_id);
    assert!(user.id < placeholder.id);
}

#[rstest]
#[case(false)]
#[case(true)]
fn test_failure_appends_error_entry(#[case] credential: bool) {
    let mut desk = ChatDesk::new();
    let entry_id = desk.begin_exchange("Hi");

    let forced = desk.handle_event(ChatEvent::Failed {
        entry_id,
        message: "stream broke".to_string(),
        credential,
    });

    assert_eq!(forced, credential);
    assert!(!desk.busy());

    // The placeholder is left untouched; a distinct error entry is appended
    let transcript = desk.transcript();
    assert_eq!(transcript.len(), 4);
    let placeholder = transcript
        .iter()
        .find(|e| e.id == entry_id)
        .expect("placeholder");
    assert!(placeholder.text.is_empty());
    let last = transcript.last().expect("error entry");
    assert_eq!(last.role, ChatRole::Error);
}

#[tokio::test]
async fn test_send_is_gated_while_busy() {
    let mut desk = ChatDesk::new();
    desk.begin_exchange("first");
    assert!(desk.busy());

    // Busy gate rejects before any session or network work happens
    let started = desk.send("second", None, &GeminiConfig::default(), |_| {});
    assert!(!started);
    assert_eq!(desk.transcript().len(), 3);
}

#[tokio::test]
async fn test_send_rejects_empty_input() {
    let mut desk = ChatDesk::new();
    let started = desk.send("   ", None, &GeminiConfig::default(), |_| {});
    assert!(!started);
    assert_eq!(desk.transcript().len(), 1);
    assert!(!desk.busy());
}

#[test]
fn test_fragment_for_unknown_entry_is_ignored() {
    let mut desk = ChatDesk::new();
    desk.handle_event(ChatEvent::Fragment {
        entry_id: 999,
        text: "orphan".to_string(),
    });
    assert_eq!(desk.transcript().len(), 1);
    assert!(!desk.transcript()[0].text.contains("orphan"));
}

proptest! {
    /// The placeholder's text grows monotonically in arrival order, the
    /// rest of the transcript never changes, and ids strictly increase.
    #[test]
    fn prop_fragments_concatenate_in_order(
        fragments in proptest::collection::vec(".{0,20}", 0..12)
    ) {
        let mut desk = ChatDesk::new();
        let entry_id = desk.begin_exchange("question");
        let greeting_before = desk.transcript()[0].text.clone();

        let mut expected = String::new();
        for fragment in &fragments {
            expected.push_str(fragment);
            desk.handle_event(ChatEvent::Fragment {
                entry_id,
                text: fragment.clone(),
            });
            let entry = desk
                .transcript()
                .iter()
                .find(|e| e.id == entry_id)
                .expect("placeholder");
            prop_assert_eq!(&entry.text, &expected);
        }

        desk.handle_event(ChatEvent::Done { entry_id });
        prop_assert_eq!(desk.transcript().len(), 3);
        prop_assert_eq!(&desk.transcript()[0].text, &greeting_before);

        let ids: Vec<u64> = desk.transcript().iter().map(|e| e.id).collect();
        prop_assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));
    }
}
