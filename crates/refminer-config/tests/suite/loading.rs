use std::io::Write;

use pretty_assertions::assert_eq;
use refminer_config::{ConfigError, RefminerConfig};
use tempfile::{tempdir, NamedTempFile};

#[test]
fn loads_config_from_disk() {
    let mut file = NamedTempFile::new().expect("tempfile");
    writeln!(
        file,
        r#"
[detection]
attribute_merges_and_splits = false
timeout_ms = 100

[logging]
level = "refminer.diff=debug,warn"
stderr = false
"#
    )
    .expect("write config");

    let config = RefminerConfig::load_from_path(file.path()).expect("config should load");
    assert!(!config.detection.attribute_merges_and_splits);
    assert_eq!(config.detection.timeout_ms, Some(100));
    assert_eq!(config.logging.level, "refminer.diff=debug,warn");
    assert!(!config.logging.stderr);
}

#[test]
fn missing_file_reports_the_path() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("refminer.toml");

    let err = RefminerConfig::load_from_path(&path).expect_err("missing file");
    match err {
        ConfigError::Io { path: reported, .. } => assert_eq!(reported, path.display().to_string()),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn type_errors_surface_as_toml_errors() {
    let err = RefminerConfig::load_from_str("[logging]\njson = \"yes\"\n").expect_err("bad type");
    assert!(matches!(err, ConfigError::Toml(_)));
    assert!(err.to_string().starts_with("failed to parse toml config"));
}

#[test]
fn schema_rejects_additional_properties() {
    let schema = serde_json::to_value(refminer_config::json_schema()).expect("schema");
    let detection = &schema["definitions"]["DetectionConfig"];
    assert_eq!(detection["additionalProperties"], serde_json::json!(false));
}
