use repomap::config::{resolve_output_dir, RepomapConfig, Unclassified, DEFAULT_OUTPUT_DIR};
use repomap::RepomapError;
use std::fs;

#[test]
fn missing_config_file_yields_defaults() {
    let dir = tempfile::TempDir::new().unwrap();
    let config = RepomapConfig::load(dir.path()).unwrap();
    assert_eq!(config, RepomapConfig::default());
    assert_eq!(config.output_dir, DEFAULT_OUTPUT_DIR);
    assert!(!config.nested_gitignore);
}

#[test]
fn full_config_parses_and_claims_are_ignored() {
    let toml = r#"
output_dir = "build/repomap"
include = ["src/**"]
exclude = ["**/migrations/*"]
nested_gitignore = true

[integration_tags]
boto3 = "http"

[layers]
unclassified = "deny"

[[layers.layer]]
name = "interface"
globs = ["src/ui/**"]

[[layers.layer]]
name = "foundation"
globs = ["src/core/**"]

[[layers.rules]]
from = "interface"
to = ["foundation"]

[claims.owner]
team = "platform"
"#;
    let config = RepomapConfig::from_toml_str(toml).unwrap();
    assert_eq!(config.output_dir, "build/repomap");
    assert_eq!(config.include, vec!["src/**"]);
    assert!(config.nested_gitignore);
    assert_eq!(config.integration_tags["boto3"], "http");
    assert_eq!(config.layers.unclassified, Unclassified::Deny);
    assert_eq!(config.layers.layer.len(), 2);
    assert_eq!(config.layers.rules[0].from_layer, "interface");
    assert_eq!(config.layers.rules[0].to, vec!["foundation"]);
}

#[test]
fn unknown_and_retired_sections_are_rejected() {
    for toml in [
        "surprise = 1\n",
        "[semantic]\nenabled = true\n",
        "[analyzers]\npython = true\n",
        "[layers]\nstrict = true\n",
    ] {
        let err = RepomapConfig::from_toml_str(toml).unwrap_err();
        assert!(matches!(err, RepomapError::TomlDecode { .. }), "{}", toml);
    }
}

#[test]
fn invalid_values_fail_validation() {
    let bad_glob = RepomapConfig::from_toml_str("include = [\"src/[\"]\n").unwrap_err();
    assert!(matches!(bad_glob, RepomapError::InvalidGlob { .. }));

    let bad_tag = RepomapConfig::from_toml_str("[integration_tags]\nboto3 = \"cloud\"\n").unwrap_err();
    assert!(matches!(bad_tag, RepomapError::Config(_)));
    assert!(bad_tag.to_string().contains("cloud"));

    let empty_layer = RepomapConfig::from_toml_str(
        "[[layers.layer]]\nname = \" \"\nglobs = [\"**\"]\n",
    )
    .unwrap_err();
    assert!(matches!(empty_layer, RepomapError::Config(_)));

    let bad_layer_glob = RepomapConfig::from_toml_str(
        "[[layers.layer]]\nname = \"x\"\nglobs = [\"a/{b\"]\n",
    )
    .unwrap_err();
    assert!(matches!(bad_layer_glob, RepomapError::InvalidGlob { .. }));
}

#[test]
fn load_reports_the_config_path_on_decode_errors() {
    let dir = tempfile::TempDir::new().unwrap();
    fs::write(dir.path().join("repomap.toml"), "output_dir = [").unwrap();
    match RepomapConfig::load(dir.path()) {
        Err(RepomapError::TomlDecode { path, .. }) => {
            assert_eq!(path, dir.path().join("repomap.toml"))
        }
        other => panic!("expected a decode error, got {:?}", other),
    }
}

#[test]
fn output_dir_must_stay_inside_the_root() {
    let dir = tempfile::TempDir::new().unwrap();
    let root = dir.path().canonicalize().unwrap();

    assert_eq!(resolve_output_dir(&root, ".repomap").unwrap(), root.join(".repomap"));
    assert_eq!(
        resolve_output_dir(&root, "out/../artifacts").unwrap(),
        root.join("artifacts")
    );

    assert!(matches!(
        resolve_output_dir(&root, "../elsewhere"),
        Err(RepomapError::OutputDirEscapesRoot(_))
    ));
    assert!(matches!(
        resolve_output_dir(&root, "a/../../b"),
        Err(RepomapError::OutputDirEscapesRoot(_))
    ));
    for bad in ["", "~/artifacts", "/tmp/artifacts"] {
        assert!(matches!(
            resolve_output_dir(&root, bad),
            Err(RepomapError::Config(_))
        ));
    }
}
