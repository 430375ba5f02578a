use std::fs;
use std::path::PathBuf;
use std::process::Command;

use tempfile::tempdir;

fn fixture(name: &str) -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
        .to_str()
        .expect("fixture path str")
        .to_string()
}

#[test]
fn infer_cli_scores_tsv_with_fixture_artifacts() {
    let tmp = tempdir().expect("temporary directory");
    let input_path = tmp.path().join("patients.tsv");
    let output_path = tmp.path().join("scored.tsv");

    let data = "sample_id\tBRCA\tweight\theight\tAGE_GROUP\tPROVINCE_GROUP\tGENDER_N\n\
A1\tpositive\t70\t175\t45\tสงขลา\tFemale\n\
A2\tnegative\t70\t175\t45\tสงขลา\tFemale\n\
A3\tpositive\t80\t180\t25\tพังงา\tMale\n";
    fs::write(&input_path, data).expect("write patients");

    let exe = env!("CARGO_BIN_EXE_oncorisk");
    let status = Command::new(exe)
        .current_dir(tmp.path())
        .args([
            "infer",
            input_path.to_str().expect("path str"),
            "--model",
            &fixture("rf_model.toml"),
            "--scaler",
            &fixture("scaler.toml"),
            "--columns",
            &fixture("columns_to_use.toml"),
            "--output",
            output_path.to_str().expect("path str"),
        ])
        .status()
        .expect("run oncorisk cli");

    assert!(status.success(), "CLI exited with status {status:?}");
    let written = fs::read_to_string(&output_path).expect("predictions written");
    assert_eq!(
        written,
        "sample_id\tprediction\nA1\tAt risk of cancer\nA2\tHealthy\nA3\tHealthy\n"
    );
}

#[test]
fn serve_cli_refuses_to_start_without_artifacts() {
    let tmp = tempdir().expect("temporary directory");

    let exe = env!("CARGO_BIN_EXE_oncorisk");
    let output = Command::new(exe)
        .current_dir(tmp.path())
        .args(["serve", "--bind", "127.0.0.1:0"])
        .output()
        .expect("run oncorisk cli");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("rf_model.toml"), "stderr = {stderr}");
}

#[test]
fn serve_cli_rejects_mismatched_artifacts() {
    let tmp = tempdir().expect("temporary directory");
    let columns_path = tmp.path().join("columns.toml");
    fs::write(&columns_path, "columns = [\"BRCA_2:P\", \"GENDER_N\"]\n").expect("write columns");

    let exe = env!("CARGO_BIN_EXE_oncorisk");
    let output = Command::new(exe)
        .current_dir(tmp.path())
        .args([
            "serve",
            "--bind",
            "127.0.0.1:0",
            "--model",
            &fixture("rf_model.toml"),
            "--scaler",
            &fixture("scaler.toml"),
            "--columns",
            columns_path.to_str().expect("path str"),
        ])
        .output()
        .expect("run oncorisk cli");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("expects 12 features"), "stderr = {stderr}");
}
