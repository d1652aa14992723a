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

fn fixture(name: &str) -> PathBuf {
    let path = repo_root().join("fixtures").join(name);
    assert!(path.exists(), "fixture missing: {}", path.display());
    path
}

fn cli() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo_bin!("synthviz-cli"));
    cmd.current_dir(repo_root());
    cmd
}

#[test]
fn cli_renders_svg_to_stdout() {
    let out = cli()
        .args([
            "render",
            "--panels",
            "original,pointwise",
            "--id",
            "basque 1970",
            fixture("basque.json").to_string_lossy().as_ref(),
        ])
        .output()
        .expect("run cli");
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let svg = String::from_utf8(out.stdout).expect("utf8 svg");
    assert!(svg.starts_with(r#"<svg id="basque-1970""#));
    assert!(svg.contains("Pointwise Effects"));
    assert!(!svg.contains("Cumulative Effects"));
}

#[test]
fn cli_renders_png_smoke() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let out = tmp.path().join("figure.png");

    cli()
        .args([
            "render",
            "--format",
            "png",
            "--figsize",
            "6x5",
            "--dpi",
            "50",
            "--out",
            out.to_string_lossy().as_ref(),
            fixture("basque.json").to_string_lossy().as_ref(),
        ])
        .assert()
        .success();

    let bytes = fs::read(&out).expect("read png");
    assert!(
        bytes.starts_with(b"\x89PNG\r\n\x1a\n"),
        "output is not a PNG"
    );

    let decoder = png::Decoder::new(fs::File::open(&out).expect("open png"));
    let reader = decoder.read_info().expect("png header");
    assert_eq!(reader.info().width, 300);
    assert_eq!(reader.info().height, 250);
}

#[test]
fn cli_renders_png_with_default_out_path_for_file_input() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let tmp_fixture = tmp.path().join("study.json");
    fs::copy(fixture("basque.json"), &tmp_fixture).expect("copy fixture");
    let expected_out = tmp_fixture.with_extension("png");

    cli()
        .args([
            "render",
            "--format",
            "png",
            "--dpi",
            "20",
            tmp_fixture.to_string_lossy().as_ref(),
        ])
        .assert()
        .success();

    let bytes = fs::read(&expected_out).expect("read png");
    assert!(bytes.starts_with(b"\x89PNG\r\n\x1a\n"));
}

#[test]
fn cli_applies_config_file_and_overrides() {
    let out = cli()
        .args([
            "render",
            "--panel",
            "original",
            "--config",
            fixture("config.json").to_string_lossy().as_ref(),
            "--set",
            "colors.synthetic=#00aa00",
            fixture("basque.json").to_string_lossy().as_ref(),
        ])
        .output()
        .expect("run cli");
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let svg = String::from_utf8(out.stdout).expect("utf8 svg");
    assert!(svg.contains("Terrorism"));
    assert!(svg.contains(r##"stroke="#1f77b4""##));
    assert!(svg.contains(r##"stroke="#00aa00""##));
}

#[test]
fn cli_prints_effects_json() {
    let out = cli()
        .args(["effects", fixture("basque.json").to_string_lossy().as_ref()])
        .output()
        .expect("run cli");
    assert!(out.status.success());

    let value: serde_json::Value = serde_json::from_slice(&out.stdout).expect("json");
    let pointwise = value["pointwise"].as_array().expect("pointwise");
    let cumulative = value["cumulative"].as_array().expect("cumulative");
    assert_eq!(pointwise.len(), 43);
    assert_eq!(cumulative.len(), 43);
    // Cumulative effects are zero before treatment.
    assert!(cumulative[..15].iter().all(|v| v.as_f64() == Some(0.0)));
    assert_eq!(value["placebo_gaps"].as_array().map(Vec::len), Some(4));
}

#[test]
fn cli_reads_study_from_stdin_for_layout() {
    let study = fs::read_to_string(fixture("basque_no_placebo.json")).expect("fixture");
    let out = assert_cmd::Command::new(assert_cmd::cargo_bin!("synthviz-cli"))
        .current_dir(repo_root())
        .args(["layout", "--panels", "original,cumulative", "-"])
        .write_stdin(study)
        .output()
        .expect("run cli");
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let value: serde_json::Value = serde_json::from_slice(&out.stdout).expect("json");
    let panels = value["panels"].as_array().expect("panels");
    assert_eq!(panels.len(), 2);
    assert_eq!(panels[1]["panel"], "cumulative");
}

#[test]
fn cli_lists_panels() {
    let out = cli().arg("panels").output().expect("run cli");
    assert!(out.status.success());
    assert_eq!(
        String::from_utf8_lossy(&out.stdout),
        "original\npointwise\ncumulative\nin-space placebo\n"
    );
}

#[test]
fn cli_rejects_unknown_panel() {
    let out = cli()
        .args([
            "render",
            "--panel",
            "scatter",
            fixture("basque.json").to_string_lossy().as_ref(),
        ])
        .output()
        .expect("run cli");
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("\"scatter\" is not a valid panel"));
}

#[test]
fn cli_requires_placebos_for_placebo_panel() {
    let out = cli()
        .args([
            "render",
            "--panel",
            "in-space placebo",
            fixture("basque_no_placebo.json").to_string_lossy().as_ref(),
        ])
        .output()
        .expect("run cli");
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("in-space placebo"));
}

#[test]
fn cli_usage_errors_exit_with_code_two() {
    let out = cli().args(["render", "--format"]).output().expect("run cli");
    assert_eq!(out.status.code(), Some(2));
}
