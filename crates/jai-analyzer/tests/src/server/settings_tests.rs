use serde_json::json;

use super::*;

#[test]
fn defaults_match_documented_values() {
    let settings = ServerSettings::default();
    assert_eq!(settings.compiler.path, "jai");
    assert_eq!(settings.compiler.build_file, None);
    assert!(settings.compiler.build_args.is_empty());
    assert_eq!(settings.compiler.timeout_ms, 30_000);
    assert!(settings.indexing.on_open);
    assert!(settings.indexing.on_save);
    assert_eq!(settings.indexing.snapshot_location, SnapshotLocation::InstallDir);
    assert_eq!(settings.logging.level, LogLevel::Info);
}

#[test]
fn parses_namespaced_payload() {
    let payload = json!({
        "jai-analyzer": {
            "compiler": {
                "path": "C:\\jai\\bin\\jai.exe",
                "buildFile": "first.jai",
                "buildArgs": ["-release", " -x64 "],
                "timeoutMs": 5000
            },
            "indexing": {
                "onOpen": false,
                "snapshotLocation": "workingDirectory"
            },
            "logging": {
                "level": "debug"
            }
        }
    });

    let settings = ServerSettings::from_lsp_payload(Some(&payload)).expect("valid payload");
    assert_eq!(settings.compiler.path, "C:/jai/bin/jai.exe");
    assert_eq!(settings.compiler.build_file.as_deref(), Some("first.jai"));
    assert_eq!(settings.compiler.build_args, vec!["-release", "-x64"]);
    assert_eq!(settings.compiler.timeout(), Duration::from_secs(5));
    assert!(!settings.indexing.on_open);
    assert!(settings.indexing.on_save);
    assert_eq!(settings.indexing.snapshot_location, SnapshotLocation::WorkingDirectory);
    assert_eq!(settings.logging.level, LogLevel::Debug);
}

#[test]
fn parses_direct_payload() {
    let payload = json!({
        "compiler": { "buildFile": "build.jai" },
        "indexing": { "onSave": false }
    });

    let settings = ServerSettings::from_lsp_payload(Some(&payload)).expect("valid payload");
    assert_eq!(settings.compiler.build_file.as_deref(), Some("build.jai"));
    assert!(!settings.indexing.on_save);
    assert_eq!(settings.compiler.path, "jai");
}

#[test]
fn missing_payload_yields_defaults() {
    let settings = ServerSettings::from_lsp_payload(None).expect("defaults");
    assert_eq!(settings, ServerSettings::default());
}

#[test]
fn merge_keeps_fields_absent_from_the_payload() {
    let base = ServerSettings::from_cli(Some("/opt/jai/bin/jai"), Some("build.jai"), &["-quiet".to_string()])
        .expect("cli settings");

    let merged = base.merged_with_payload(&json!({ "indexing": { "onOpen": false } })).expect("valid payload");
    assert_eq!(merged.compiler.path, "/opt/jai/bin/jai");
    assert_eq!(merged.compiler.build_file.as_deref(), Some("build.jai"));
    assert_eq!(merged.compiler.build_args, vec!["-quiet"]);
    assert!(!merged.indexing.on_open);
}

#[test]
fn null_build_file_clears_it() {
    let base = ServerSettings::from_cli(None, Some("build.jai"), &[]).expect("cli settings");
    let merged = base.merged_with_payload(&json!({ "compiler": { "buildFile": null } })).expect("valid payload");
    assert_eq!(merged.compiler.build_file, None);
}

#[test]
fn omitted_build_file_is_kept_when_other_compiler_fields_change() {
    let base = ServerSettings::from_cli(None, Some("build.jai"), &[]).expect("cli settings");
    let merged = base.merged_with_payload(&json!({ "compiler": { "timeoutMs": 5000 } })).expect("valid payload");
    assert_eq!(merged.compiler.build_file.as_deref(), Some("build.jai"));
    assert_eq!(merged.compiler.timeout_ms, 5_000);
}

#[test]
fn empty_build_file_is_rejected() {
    let payload = json!({ "compiler": { "buildFile": "   " } });
    let error = ServerSettings::from_lsp_payload(Some(&payload)).expect_err("empty build file");
    assert_eq!(error, ConfigError::EmptyBuildFile);
    assert!(error.to_string().contains("cannot be empty"));
}

#[test]
fn empty_build_file_from_cli_is_rejected() {
    let error = ServerSettings::from_cli(None, Some(""), &[]).expect_err("empty build file");
    assert_eq!(error, ConfigError::EmptyBuildFile);
}

#[test]
fn non_string_build_arg_is_rejected() {
    let payload = json!({ "compiler": { "buildArgs": ["-release", 7] } });
    let error = ServerSettings::from_lsp_payload(Some(&payload)).expect_err("numeric build arg");
    assert_eq!(
        error,
        ConfigError::InvalidBuildArg {
            index: 1,
            found: "7".to_string(),
        }
    );
    assert!(error.to_string().contains("buildArgs[1] must be a string"));
}

#[test]
fn non_string_build_file_is_rejected() {
    let payload = json!({ "compiler": { "buildFile": ["a.jai"] } });
    let error = ServerSettings::from_lsp_payload(Some(&payload)).expect_err("array build file");
    assert!(matches!(error, ConfigError::InvalidBuildFile { .. }));
}

#[test]
fn wrongly_typed_field_is_malformed() {
    let payload = json!({ "indexing": { "onOpen": "yes" } });
    let error = ServerSettings::from_lsp_payload(Some(&payload)).expect_err("string flag");
    assert!(matches!(error, ConfigError::MalformedSettings { .. }));
}

#[test]
fn unknown_keys_are_ignored() {
    let payload = json!({
        "editor": { "fontSize": 14 },
        "compiler": { "somethingNew": true }
    });
    let settings = ServerSettings::from_lsp_payload(Some(&payload)).expect("valid payload");
    assert_eq!(settings, ServerSettings::default());
}

#[test]
fn timeout_is_clamped() {
    let low = ServerSettings::from_lsp_payload(Some(&json!({ "compiler": { "timeoutMs": 10 } }))).expect("valid");
    assert_eq!(low.compiler.timeout_ms, 1_000);

    let high =
        ServerSettings::from_lsp_payload(Some(&json!({ "compiler": { "timeoutMs": 99_999_999 } }))).expect("valid");
    assert_eq!(high.compiler.timeout_ms, 600_000);
}

#[test]
fn blank_compiler_path_falls_back_to_default() {
    let settings = ServerSettings::from_lsp_payload(Some(&json!({ "compiler": { "path": "  " } }))).expect("valid");
    assert_eq!(settings.compiler.path, "jai");
}

#[test]
fn blank_build_args_are_dropped() {
    let settings = ServerSettings::from_cli(None, None, &["".to_string(), " -release ".to_string()]).expect("valid");
    assert_eq!(settings.compiler.build_args, vec!["-release"]);
}

#[test]
fn relative_build_file_resolves_against_workspace_root() {
    let settings = ServerSettings::from_cli(None, Some("src/build.jai"), &[]).expect("valid");
    let resolved = settings.compiler.resolved_build_file(Some(Path::new("/work/game"))).expect("configured");
    assert_eq!(resolved.as_str(), "/work/game/src/build.jai");
}

#[test]
fn absolute_build_file_ignores_workspace_root() {
    let settings = ServerSettings::from_cli(None, Some("/abs/build.jai"), &[]).expect("valid");
    let resolved = settings.compiler.resolved_build_file(Some(Path::new("/work/game"))).expect("configured");
    assert_eq!(resolved.as_str(), "/abs/build.jai");
}

#[test]
fn unset_build_file_resolves_to_none() {
    assert!(ServerSettings::default().compiler.resolved_build_file(None).is_none());
}

#[test]
fn log_level_gates_info() {
    assert!(LogLevel::Info.allows_info());
    assert!(LogLevel::Trace.allows_info());
    assert!(!LogLevel::Warn.allows_info());
    assert!(!LogLevel::Error.allows_info());
}
