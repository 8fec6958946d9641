use std::fs;

use super::*;

#[test]
fn finds_config_in_ancestor_directory() {
    let root = tempfile::tempdir().expect("tempdir");
    let nested = root.path().join("src").join("game");
    fs::create_dir_all(&nested).expect("create dirs");
    fs::write(root.path().join(PROJECT_CONFIG_FILENAME), "").expect("write config");

    let found = find_project_config(&nested).expect("config above nested dir");
    assert_eq!(found, root.path().join(PROJECT_CONFIG_FILENAME));
}

#[test]
fn nearest_config_wins() {
    let root = tempfile::tempdir().expect("tempdir");
    let nested = root.path().join("sub");
    fs::create_dir_all(&nested).expect("create dirs");
    fs::write(root.path().join(PROJECT_CONFIG_FILENAME), "").expect("write outer");
    fs::write(nested.join(PROJECT_CONFIG_FILENAME), "").expect("write inner");

    assert_eq!(find_project_config(&nested), Some(nested.join(PROJECT_CONFIG_FILENAME)));
}

#[test]
fn config_layers_over_base_settings() {
    let root = tempfile::tempdir().expect("tempdir");
    fs::write(
        root.path().join(PROJECT_CONFIG_FILENAME),
        r#"
[compiler]
buildFile = "build.jai"
buildArgs = ["-release"]
timeoutMs = 45000

[indexing]
onSave = false
"#,
    )
    .expect("write config");

    let base = ServerSettings::from_cli(Some("/opt/jai/bin/jai"), None, &[]).expect("cli settings");
    let settings = apply_project_config(&base, root.path()).expect("valid config");
    assert_eq!(settings.compiler.path, "/opt/jai/bin/jai");
    assert_eq!(settings.compiler.build_file.as_deref(), Some("build.jai"));
    assert_eq!(settings.compiler.build_args, vec!["-release"]);
    assert_eq!(settings.compiler.timeout_ms, 45_000);
    assert!(!settings.indexing.on_save);
}

#[test]
fn invalid_toml_reports_the_file() {
    let root = tempfile::tempdir().expect("tempdir");
    let path = root.path().join(PROJECT_CONFIG_FILENAME);
    fs::write(&path, "[compiler\nbuildFile = ").expect("write config");

    let error = apply_project_config(&ServerSettings::default(), root.path()).expect_err("broken toml");
    match error {
        ConfigError::ProjectFile {
            path: reported, ..
        } => assert_eq!(reported, path),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn empty_build_file_in_config_is_rejected() {
    let root = tempfile::tempdir().expect("tempdir");
    fs::write(root.path().join(PROJECT_CONFIG_FILENAME), "[compiler]\nbuildFile = \"\"\n").expect("write config");

    let error = apply_project_config(&ServerSettings::default(), root.path()).expect_err("empty build file");
    assert_eq!(error, ConfigError::EmptyBuildFile);
}
