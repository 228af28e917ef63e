use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

/// Helper function to run the fuelgraph binary against a dataset
fn run_fuelgraph(data: &str, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_fuelgraph"))
        .args(["--data", data])
        .args(args)
        .output()
        .expect("Failed to spawn fuelgraph")
}

/// Check if bytes are a valid PNG
fn is_valid_png(bytes: &[u8]) -> bool {
    bytes.len() > 8 && bytes[0..8] == [137, 80, 78, 71, 13, 10, 26, 10]
}

fn stdout_json(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("stdout is not JSON")
}

#[test]
fn test_end_to_end_options() {
    let output = run_fuelgraph("test/petrol.csv", &["options"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let json = stdout_json(&output);
    assert_eq!(
        json["areas"],
        serde_json::json!(["Banjara Hills", "Gachibowli", "Kukatpally", "Madhapur"])
    );
    assert_eq!(json["years"], serde_json::json!([2022, 2023]));
    assert_eq!(json["months"][0], "Jan");
    assert_eq!(json["months"][11], "Dec");
}

#[test]
fn test_end_to_end_dashboard() {
    let out = TempDir::new().unwrap();
    let output = run_fuelgraph(
        "test/petrol.csv",
        &[
            "dashboard",
            "--area",
            "Banjara Hills",
            "--year",
            "2023",
            "--month",
            "Mar",
            "--out",
            out.path().to_str().unwrap(),
        ],
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let report = stdout_json(&output);
    assert_eq!(report["area"], "Banjara Hills");
    assert_eq!(report["year"], 2023);
    assert_eq!(report["month"], "Mar");
    assert_eq!(report["rows"], 24);

    let artifacts = report["artifacts"].as_array().unwrap();
    let failures = report["failures"].as_array().unwrap();
    assert_eq!(artifacts.len() + failures.len(), 6);

    for artifact in artifacts {
        let path = Path::new(artifact["path"].as_str().unwrap());
        assert_eq!(path.parent().unwrap().parent().unwrap(), out.path());
        let dir_name = path.parent().unwrap().file_name().unwrap().to_str().unwrap();
        assert!(dir_name.starts_with("Banjara-Hills-") && dir_name.ends_with("-2023"));
        let bytes = std::fs::read(path).unwrap();
        assert!(is_valid_png(&bytes), "{} is not a PNG", path.display());
    }
}

#[test]
fn test_end_to_end_svg_config() {
    let out = TempDir::new().unwrap();
    let config = out.path().join("fuelgraph.json");
    std::fs::write(&config, r#"{"type": "svg", "width": 640, "height": 480}"#).unwrap();

    let output = run_fuelgraph(
        "test/petrol.csv",
        &[
            "--config",
            config.to_str().unwrap(),
            "dashboard",
            "--area",
            "Gachibowli",
            "--year",
            "2022",
            "--out",
            out.path().to_str().unwrap(),
        ],
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let report = stdout_json(&output);
    for artifact in report["artifacts"].as_array().unwrap() {
        let path = artifact["path"].as_str().unwrap();
        assert!(path.ends_with(".svg"));
        let text = std::fs::read_to_string(path).unwrap();
        assert!(text.contains("<svg"));
    }
}

#[test]
fn test_end_to_end_no_data() {
    let out = TempDir::new().unwrap();
    let output = run_fuelgraph(
        "test/petrol.csv",
        &[
            "dashboard",
            "--area",
            "Nonexistent",
            "--year",
            "1900",
            "--out",
            out.path().to_str().unwrap(),
        ],
    );
    assert_eq!(output.status.code(), Some(3));
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        "No data found for Nonexistent, 1900."
    );
}

#[test]
fn test_end_to_end_area_is_case_sensitive() {
    let out = TempDir::new().unwrap();
    let output = run_fuelgraph(
        "test/petrol.csv",
        &[
            "dashboard",
            "--area",
            "gachibowli",
            "--year",
            "2023",
            "--out",
            out.path().to_str().unwrap(),
        ],
    );
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn test_end_to_end_invalid_year() {
    let output = run_fuelgraph(
        "test/petrol.csv",
        &["dashboard", "--area", "Gachibowli", "--year", "last-year"],
    );
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("not an integer"));
}

#[test]
fn test_end_to_end_malformed_dataset() {
    let output = run_fuelgraph("test/malformed.csv", &["options"]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to load dataset"), "{}", stderr);
    assert!(output.stdout.is_empty());
}

#[test]
fn test_end_to_end_missing_column() {
    let output = run_fuelgraph("test/missing_column.csv", &["options"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("missing required column"));
}

#[test]
fn test_end_to_end_missing_file() {
    let output = run_fuelgraph("test/does_not_exist.csv", &["options"]);
    assert!(!output.status.success());
}
