use assert_cmd::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

fn repo_root() -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .parent()
        .and_then(|p| p.parent())
        .expect("expected crates/<name> layout")
        .to_path_buf()
}

fn fixture() -> PathBuf {
    let path = repo_root().join("fixtures").join("income_statement.json");
    assert!(path.exists(), "fixture missing: {}", path.display());
    path
}

#[test]
fn cli_validates_balanced_rows() {
    let exe = assert_cmd::cargo_bin!("lumenflow-cli");
    let output = Command::new(exe)
        .args(["validate", fixture().to_string_lossy().as_ref()])
        .assert()
        .success();

    let stdout = String::from_utf8(output.get_output().stdout.clone()).expect("utf8");
    let report: serde_json::Value = serde_json::from_str(&stdout).expect("json report");
    assert_eq!(report["ok"], serde_json::json!(true));
    assert_eq!(report["not_balanced"], serde_json::json!([]));
}

#[test]
fn cli_flags_an_unbalanced_intermediate() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let rows = tmp.path().join("rows.json");
    fs::write(
        &rows,
        r#"[
            {"from": "A", "to": "B", "current": 10},
            {"from": "B", "to": "C", "current": 7}
        ]"#,
    )
    .expect("write rows");

    let exe = assert_cmd::cargo_bin!("lumenflow-cli");
    let output = Command::new(exe)
        .args(["validate", rows.to_string_lossy().as_ref()])
        .assert()
        .success();

    let stdout = String::from_utf8(output.get_output().stdout.clone()).expect("utf8");
    let report: serde_json::Value = serde_json::from_str(&stdout).expect("json report");
    assert_eq!(report["ok"], serde_json::json!(false));
    assert_eq!(report["not_balanced"], serde_json::json!(["B"]));
}

#[test]
fn cli_renders_standalone_svg_to_stdout() {
    let exe = assert_cmd::cargo_bin!("lumenflow-cli");
    let output = Command::new(exe)
        .args(["render", fixture().to_string_lossy().as_ref()])
        .assert()
        .success();

    let stdout = String::from_utf8(output.get_output().stdout.clone()).expect("utf8");
    assert!(stdout.starts_with("<?xml version=\"1.0\" standalone=\"no\"?>"));
    assert!(stdout.contains(r#"xmlns="http://www.w3.org/2000/svg""#));
    assert!(stdout.contains("Net profit"));
}

#[test]
fn cli_flow_animation_adds_shimmer_overlays() {
    let exe = assert_cmd::cargo_bin!("lumenflow-cli");
    let output = Command::new(exe)
        .args([
            "render",
            "--flow-animation",
            fixture().to_string_lossy().as_ref(),
        ])
        .assert()
        .success();

    let stdout = String::from_utf8(output.get_output().stdout.clone()).expect("utf8");
    assert!(stdout.contains("link-shimmer"));
    assert!(stdout.contains(r#"stroke-opacity="0.18""#));

    let exe = assert_cmd::cargo_bin!("lumenflow-cli");
    let output = Command::new(exe)
        .args(["render", fixture().to_string_lossy().as_ref()])
        .assert()
        .success();
    let stdout = String::from_utf8(output.get_output().stdout.clone()).expect("utf8");
    assert!(!stdout.contains("link-shimmer"));
}

#[test]
fn cli_renders_png_smoke() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let out = tmp.path().join("out.png");

    let exe = assert_cmd::cargo_bin!("lumenflow-cli");
    Command::new(exe)
        .args([
            "render",
            "--format",
            "png",
            "--background",
            "white",
            "--out",
            out.to_string_lossy().as_ref(),
            fixture().to_string_lossy().as_ref(),
        ])
        .assert()
        .success();

    let bytes = fs::read(&out).expect("read png");
    assert!(
        bytes.starts_with(b"\x89PNG\r\n\x1a\n"),
        "output is not a PNG"
    );
}

#[test]
fn cli_derives_png_filename_from_title() {
    let tmp = tempfile::tempdir().expect("tempdir");

    let exe = assert_cmd::cargo_bin!("lumenflow-cli");
    Command::new(exe)
        .current_dir(tmp.path())
        .args([
            "render",
            "--format",
            "png",
            "--title",
            "FY24 Income Statement",
            fixture().to_string_lossy().as_ref(),
        ])
        .assert()
        .success();

    let expected = tmp.path().join("FY24-Income-Statement.png");
    let bytes = fs::read(&expected).expect("read png at derived path");
    assert!(bytes.starts_with(b"\x89PNG\r\n\x1a\n"));
}

#[test]
fn cli_layout_emits_positions_within_the_canvas() {
    let exe = assert_cmd::cargo_bin!("lumenflow-cli");
    let output = Command::new(exe)
        .args(["layout", "--width", "900", fixture().to_string_lossy().as_ref()])
        .assert()
        .success();

    let stdout = String::from_utf8(output.get_output().stdout.clone()).expect("utf8");
    let layout: serde_json::Value = serde_json::from_str(&stdout).expect("json layout");
    let nodes = layout["nodes"].as_array().expect("nodes array");
    assert_eq!(nodes.len(), 10);
    for node in nodes {
        let x0 = node["x0"].as_f64().expect("x0");
        let x1 = node["x1"].as_f64().expect("x1");
        assert!(x0 >= 40.0 && x1 <= 860.0, "node outside extent: {node}");
    }
}

#[test]
fn cli_sample_round_trips_through_validate() {
    let exe = assert_cmd::cargo_bin!("lumenflow-cli");
    let output = Command::new(exe).arg("sample").assert().success();
    let rows = output.get_output().stdout.clone();

    let exe = assert_cmd::cargo_bin!("lumenflow-cli");
    let mut child = Command::new(exe)
        .arg("validate")
        .stdin(std::process::Stdio::piped())
        .stdout(std::process::Stdio::piped())
        .spawn()
        .expect("spawn validate");
    {
        use std::io::Write;
        child
            .stdin
            .as_mut()
            .expect("stdin")
            .write_all(&rows)
            .expect("pipe rows");
    }
    let output = child.wait_with_output().expect("wait");
    assert!(output.status.success());
    let report: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("json report");
    assert_eq!(report["ok"], serde_json::json!(true));
}

#[test]
fn cli_rejects_unknown_flags_with_usage() {
    let exe = assert_cmd::cargo_bin!("lumenflow-cli");
    Command::new(exe)
        .args(["render", "--bogus"])
        .assert()
        .failure()
        .code(2);
}
