use super::*;
use crate::definition::{CompileError, SyncError};

#[test]
fn prefixes_client_messages() {
    assert_eq!(prefixed_client_message("Opened a.jai"), "jai-analyzer: Opened a.jai");
}

#[test]
fn short_name_is_last_segment() {
    let uri = Url::parse("file:///work/game/src/main.jai").expect("valid uri");
    assert_eq!(short_name(&uri), "main.jai");
    assert_eq!(short_path("/work/game/lib.jai"), "lib.jai");
}

#[test]
fn describes_sync_outcomes() {
    let updated = SyncOutcome::Updated {
        generation: 3,
        entries: 12,
    };
    assert_eq!(describe_outcome(&updated), "Indexed 12 definitions");

    let failed = SyncOutcome::Failed(SyncError::Compile(CompileError::CommandNotFound("jai".to_string())));
    assert!(describe_outcome(&failed).starts_with("Indexing failed:"));
}

#[cfg(unix)]
#[test]
fn workspace_folders_take_precedence_over_root_uri() {
    let params = InitializeParams {
        workspace_folders: Some(vec![WorkspaceFolder {
            uri: Url::parse("file:///work/a").expect("valid uri"),
            name: "a".to_string(),
        }]),
        ..Default::default()
    };
    assert_eq!(workspace_roots(&params), vec![PathBuf::from("/work/a")]);
}

#[cfg(unix)]
#[test]
#[allow(deprecated)]
fn falls_back_to_root_uri() {
    let params = InitializeParams {
        root_uri: Some(Url::parse("file:///work/b").expect("valid uri")),
        ..Default::default()
    };
    assert_eq!(workspace_roots(&params), vec![PathBuf::from("/work/b")]);
}

#[test]
fn non_file_uris_have_no_path() {
    let uri = Url::parse("untitled:Untitled-1").expect("valid uri");
    assert!(file_path(&uri).is_none());
}
