use super::*;

fn test_doc(text: &str) -> Document {
    Document::new(Url::parse("file:///src/main.jai").unwrap(), text.to_string(), 1)
}

#[test]
fn file_uri_yields_normalized_path() {
    let doc = test_doc("");
    assert_eq!(doc.path.as_ref().map(|p| p.as_str()), Some("/src/main.jai"));

    let untitled = Document::new(Url::parse("untitled:Untitled-1").unwrap(), String::new(), 1);
    assert!(untitled.path.is_none());
}

#[test]
fn line_offsets_basic() {
    let doc = test_doc("main :: () {\n}\n");
    assert_eq!(doc.line_count(), 3);
    assert_eq!(doc.line_text(0), Some("main :: () {"));
    assert_eq!(doc.line_text(1), Some("}"));
    assert_eq!(doc.line_text(2), Some(""));
    assert_eq!(doc.line_text(3), None);
}

#[test]
fn identifier_start_from_inside_the_word() {
    let doc = test_doc("    print_value(x);");
    assert_eq!(doc.identifier_start(Position::new(0, 9)), Some(Position::new(0, 4)));
    assert_eq!(doc.identifier_start(Position::new(0, 4)), Some(Position::new(0, 4)));
}

#[test]
fn identifier_start_from_just_after_the_word() {
    let doc = test_doc("    print_value(x);");
    assert_eq!(doc.identifier_start(Position::new(0, 15)), Some(Position::new(0, 4)));

    let doc = test_doc("foo");
    assert_eq!(doc.identifier_start(Position::new(0, 3)), Some(Position::new(0, 0)));
}

#[test]
fn identifier_start_outside_identifiers() {
    let doc = test_doc("a :: b;  ");
    assert_eq!(doc.identifier_start(Position::new(0, 3)), None);
    assert_eq!(doc.identifier_start(Position::new(0, 8)), None);
    assert_eq!(doc.identifier_start(Position::new(4, 0)), None);
}

#[test]
fn identifier_start_counts_utf16_columns() {
    // `é` is one UTF-16 unit, `𝔵` is two.
    let doc = test_doc("é 𝔵 name");
    assert_eq!(doc.identifier_start(Position::new(0, 7)), Some(Position::new(0, 5)));
}

#[test]
fn incremental_changes_apply_in_order() {
    let mut doc = test_doc("x := 1;\n");
    doc.apply_changes(
        vec![
            TextDocumentContentChangeEvent {
                range: Some(Range::new(Position::new(0, 0), Position::new(0, 1))),
                range_length: None,
                text: "value".to_string(),
            },
            TextDocumentContentChangeEvent {
                range: Some(Range::new(Position::new(1, 0), Position::new(1, 0))),
                range_length: None,
                text: "print(value);\n".to_string(),
            },
        ],
        2,
    );
    assert_eq!(doc.text, "value := 1;\nprint(value);\n");
    assert_eq!(doc.version, 2);
    assert_eq!(doc.identifier_start(Position::new(1, 8)), Some(Position::new(1, 6)));
}

#[test]
fn full_change_replaces_text() {
    let mut doc = test_doc("old");
    doc.apply_changes(
        vec![TextDocumentContentChangeEvent {
            range: None,
            range_length: None,
            text: "new\ntext".to_string(),
        }],
        3,
    );
    assert_eq!(doc.line_count(), 2);
    assert_eq!(doc.line_text(1), Some("text"));
}
