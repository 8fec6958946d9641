use super::*;

#[test]
fn progress_title_adds_prefix_when_missing() {
    assert_eq!(prefixed_progress_title("Indexing"), "jai-analyzer: Indexing".to_string());
}

#[test]
fn progress_title_preserves_existing_prefix() {
    assert_eq!(prefixed_progress_title("jai-analyzer: Indexing"), "jai-analyzer: Indexing".to_string());
}

#[test]
fn progress_title_is_trimmed() {
    assert_eq!(prefixed_progress_title("  Definition "), "jai-analyzer: Definition".to_string());
}

#[test]
fn end_progress_carries_message() {
    match end_progress(Some("Indexed 3 definitions".to_string())) {
        WorkDoneProgress::End(end) => assert_eq!(end.message.as_deref(), Some("Indexed 3 definitions")),
        other => panic!("expected End, got {other:?}"),
    }
}
