//! End-to-end tests for the `flowify` binary.

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;

fn write_font(path: &Path) {
    let font = serde_json::json!({
        "info": {
            "familyName": "Sample",
            "styleName": "Regular",
            "xHeight": 500,
            "capHeight": 700
        },
        "glyphs": [
            { "name": ".notdef", "width": 500 },
            { "name": "space", "width": 250, "unicodes": [32] },
            { "name": "a", "width": 300, "unicodes": [97] },
            { "name": "b", "width": 250, "unicodes": [98] }
        ],
        "kerning": [
            { "left": "a", "right": "b", "value": -20 }
        ]
    });
    std::fs::write(path, serde_json::to_string_pretty(&font).unwrap()).unwrap();
}

fn flowify() -> Command {
    let mut cmd = Command::cargo_bin("flowify").unwrap();
    cmd.env_remove("FLOWIFY_CONFIG").env_remove("RUST_LOG");
    cmd
}

#[test]
fn writes_flow_font_and_feature_code() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("sample.json");
    let output = dir.path().join("sample-flow.json");
    let fea = dir.path().join("flow.fea");
    write_font(&input);

    flowify()
        .arg(&input)
        .arg(&output)
        .arg("--fea")
        .arg(&fea)
        .assert()
        .success();

    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(written["info"]["styleName"], "Regular Flow");
    let names: Vec<&str> = written["glyphs"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|g| g["name"].as_str())
        .collect();
    assert!(names.contains(&"slug.left"));
    assert!(names.contains(&"slug.right"));
    assert!(names.contains(&"_start"));

    let text = std::fs::read_to_string(&fea).unwrap();
    assert!(text.contains("feature rlig"));
    assert!(text.contains("lookup encode"));
    assert!(written["features"].as_str().unwrap().contains("lookup encode"));
}

#[test]
fn verbose_prints_summary() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("sample.json");
    let output = dir.path().join("out.json");
    write_font(&input);

    flowify()
        .arg("--verbose")
        .arg("--feature")
        .arg("calt")
        .arg(&input)
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"feature\": \"calt\""))
        .stdout(predicate::str::contains("\"threshold\": 500"));
}

#[test]
fn missing_input_fails() {
    let dir = tempfile::tempdir().unwrap();
    flowify()
        .arg(dir.path().join("nope.json"))
        .arg(dir.path().join("out.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("reading font"));
    assert!(!dir.path().join("out.json").exists());
}

#[test]
fn bad_shape_is_a_usage_error() {
    flowify()
        .args(["--shape", "oval", "in.json", "out.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--shape"));
}

#[test]
fn out_of_range_slug_height_fails_without_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("sample.json");
    let output = dir.path().join("out.json");
    write_font(&input);

    flowify()
        .args(["--slug-height", "100000"])
        .arg(&input)
        .arg(&output)
        .assert()
        .failure();
    assert!(!output.exists());
}

#[test]
fn config_file_is_honoured() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("sample.json");
    let output = dir.path().join("out.json");
    let config = dir.path().join("flowify.toml");
    write_font(&input);
    std::fs::write(&config, "feature = \"ss01\"\nshape = \"rectangle\"\n").unwrap();

    flowify()
        .arg("--config")
        .arg(&config)
        .arg(&input)
        .arg(&output)
        .assert()
        .success();

    let written = std::fs::read_to_string(&output).unwrap();
    assert!(written.contains("feature ss01"));
}
