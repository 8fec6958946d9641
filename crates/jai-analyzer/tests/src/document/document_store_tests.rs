use super::*;

fn uri() -> Url {
    Url::parse("file:///proj/main.jai").unwrap()
}

#[test]
fn open_get_close() {
    let store = DocumentStore::new();
    store.open(uri(), "main :: () {}".to_string(), 1);

    assert_eq!(store.get(&uri()).map(|doc| doc.text), Some("main :: () {}".to_string()));
    assert_eq!(store.len(), 1);

    store.close(&uri());
    assert!(store.get(&uri()).is_none());
    assert!(store.is_empty());
}

#[test]
fn update_replaces_or_opens() {
    let store = DocumentStore::new();
    store.update(uri(), "v1".to_string(), 1);
    store.update(uri(), "v2".to_string(), 2);

    let doc = store.get(&uri()).unwrap();
    assert_eq!(doc.text, "v2");
    assert_eq!(doc.version, 2);
}

#[test]
fn changes_to_unknown_documents_are_ignored() {
    let store = DocumentStore::new();
    store.apply_changes(
        &uri(),
        vec![TextDocumentContentChangeEvent {
            range: None,
            range_length: None,
            text: "ghost".to_string(),
        }],
        2,
    );
    assert!(store.get(&uri()).is_none());
}

#[test]
fn identifier_start_reads_the_open_text() {
    let store = DocumentStore::new();
    assert_eq!(store.identifier_start(&uri(), Position::new(0, 2)), None);

    assert!(!store.contains(&uri()));

    store.open(uri(), "call_me();".to_string(), 1);
    assert!(store.contains(&uri()));
    assert_eq!(store.identifier_start(&uri(), Position::new(0, 5)), Some(Position::new(0, 0)));
    assert_eq!(store.identifier_start(&uri(), Position::new(0, 9)), None);
}
