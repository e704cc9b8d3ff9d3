use std::fs;
use serial_test::serial;
use tempfile::TempDir;

use unrpy::commands::decompile;

const DUMP: &str = r#"[
  {"class": "renpy.ast.Label", "loc": ["script.rpy", 1], "name": "start", "block": [
    {"class": "renpy.ast.Say", "loc": ["script.rpy", 2], "who": "e", "what": "Hello."},
    {"class": "renpy.ast.Menu", "loc": ["script.rpy", 3], "items": [
      ["Yes", "True", [{"class": "renpy.ast.Return", "loc": ["script.rpy", 5], "expression": null}]]
    ]}
  ]}
]"#;

fn write_dump(dir: &TempDir) -> String {
    let path = dir.path().join("script.json");
    fs::write(&path, DUMP).unwrap();
    path.to_str().unwrap().to_string()
}

#[test]
fn test_decompile_writes_output_file() {
    let temp_dir = TempDir::new().unwrap();
    let dump = write_dump(&temp_dir);
    let output = temp_dir.path().join("script.rpy");
    let config = temp_dir.path().join("unrpy.toml");
    fs::write(&config, "").unwrap();

    let result = decompile::execute(
        &dump,
        Some(config.to_str().unwrap()),
        Some(output.to_str().unwrap()),
        None,
    );
    assert!(result.is_ok(), "decompile should succeed: {:?}", result.err());

    let script = fs::read_to_string(&output).unwrap();
    assert_eq!(
        script,
        "label start:\n    e \"Hello.\"\n    menu:\n        \"Yes\":\n            return\n"
    );
}

#[test]
fn test_indent_flag_overrides_config() {
    let temp_dir = TempDir::new().unwrap();
    let dump = write_dump(&temp_dir);
    let output = temp_dir.path().join("script.rpy");
    let config = temp_dir.path().join("unrpy.toml");
    fs::write(&config, "[output]\nindent_width = 8\n").unwrap();

    decompile::execute(
        &dump,
        Some(config.to_str().unwrap()),
        Some(output.to_str().unwrap()),
        Some(2),
    )
    .unwrap();

    let script = fs::read_to_string(&output).unwrap();
    assert!(script.starts_with("label start:\n  e \"Hello.\"\n  menu:\n"));
}

#[test]
fn test_config_translation_is_applied() {
    let temp_dir = TempDir::new().unwrap();
    let dump = write_dump(&temp_dir);
    let output = temp_dir.path().join("script.rpy");
    let config = temp_dir.path().join("unrpy.toml");
    fs::write(
        &config,
        "[translation]\nlanguage = \"french\"\n\n[translation.strings]\n\"Yes\" = \"Oui\"\n",
    )
    .unwrap();

    decompile::execute(
        &dump,
        Some(config.to_str().unwrap()),
        Some(output.to_str().unwrap()),
        None,
    )
    .unwrap();

    let script = fs::read_to_string(&output).unwrap();
    assert!(script.contains("\"Oui\":"));
    assert!(!script.contains("\"Yes\""));
}

#[test]
#[serial]
fn test_default_config_is_picked_up_from_working_directory() {
    let temp_dir = TempDir::new().unwrap();
    let dump = write_dump(&temp_dir);
    let output = temp_dir.path().join("script.rpy");
    fs::write(temp_dir.path().join("unrpy.toml"), "[output]\nbase_indent = 1\n").unwrap();

    let original_dir = std::env::current_dir().unwrap();
    std::env::set_current_dir(temp_dir.path()).unwrap();
    let result = decompile::execute(&dump, None, Some(output.to_str().unwrap()), None);
    std::env::set_current_dir(original_dir).unwrap();

    assert!(result.is_ok(), "decompile should succeed: {:?}", result.err());
    let script = fs::read_to_string(&output).unwrap();
    assert!(script.starts_with("    label start:\n        e \"Hello.\"\n"));
}

#[test]
fn test_missing_dump_file() {
    let result = decompile::execute("/nonexistent/script.json", None, None, None);

    let err = result.unwrap_err().to_string();
    assert!(err.contains("File not found"));
}

#[test]
fn test_invalid_dump_names_the_file() {
    let temp_dir = TempDir::new().unwrap();
    let dump = temp_dir.path().join("broken.json");
    fs::write(&dump, "{\"not\": \"a dump\"}").unwrap();
    let config = temp_dir.path().join("unrpy.toml");
    fs::write(&config, "").unwrap();

    let err = decompile::execute(dump.to_str().unwrap(), Some(config.to_str().unwrap()), None, None)
        .unwrap_err()
        .to_string();
    assert!(err.contains("failed to parse AST dump"));
    assert!(err.contains("broken.json"));
}

#[test]
fn test_invalid_indent_flag() {
    let temp_dir = TempDir::new().unwrap();
    let dump = write_dump(&temp_dir);
    let config = temp_dir.path().join("unrpy.toml");
    fs::write(&config, "").unwrap();

    let result = decompile::execute(&dump, Some(config.to_str().unwrap()), None, Some(0));
    assert!(result.is_err());
}
