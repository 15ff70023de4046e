use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::{tempdir, TempDir};

const STATEMENT: &str = "\
Customer Name  JOHN SMITH
Account Number 305608010559005
On The Period 01/01/2024 - 29/02/2024

Date Description Debit Credit Balance
05/01/2024 Salary ACME 0.00 5,000.00 7,250.00
20/01/2024 Rent 2,000.00 0.00 5,250.00
02/02/2024 SWIFT incoming 0.00 1,000.00 6,250.00
";

const EXTRACTOR_JSON: &str = r#"{
  "account_holder_name": "JANE DOE",
  "transactions": [
    {"date": "05/01/2024", "description": "Salary", "credit": "1,000.00", "balance": "1,000.00"},
    {"date": "20/01/2024", "description": "Rent", "debit": "400.00", "balance": "600.00"},
    {"date": "15/01/2023", "description": "Old refund", "credit": "50.00", "balance": "650.00"}
  ]
}"#;

fn ledgr(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("ledgr").unwrap();
    cmd.env("XDG_CONFIG_HOME", home.path());
    cmd
}

fn write(dir: &Path, name: &str, content: &str) -> String {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path.display().to_string()
}

#[test]
fn analyze_text_statement_as_json() {
    let dir = tempdir().unwrap();
    let input = write(dir.path(), "statement.txt", STATEMENT);

    let output = ledgr(&dir)
        .args(["analyze", &input])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let report: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(report["locale"], "en");
    assert_eq!(report["strategy"], "pattern_rows");
    assert_eq!(report["total_transactions"], 3);
    assert_eq!(report["account_info"]["customer_name"], "JOHN SMITH");
    assert_eq!(report["monthly_analysis"]["2024-02"]["opening_balance"], 5250.0);
    assert_eq!(report["analytics"]["total_foreign_transactions"], 1);
    assert_eq!(report["metadata"]["records_processed"], 3);
}

#[test]
fn analyze_json_month_only_merges_years() {
    let dir = tempdir().unwrap();
    let input = write(dir.path(), "page.json", EXTRACTOR_JSON);

    let output = ledgr(&dir)
        .args(["analyze", &input, "--month-only", "--pretty"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let report: serde_json::Value = serde_json::from_slice(&output).unwrap();
    let months = report["monthly_analysis"].as_object().unwrap();
    assert_eq!(months.len(), 1);
    assert_eq!(report["monthly_analysis"]["Jan"]["transaction_count"], 3);
    assert_eq!(report["monthly_analysis"]["Jan"]["total_credit"], 1050.0);
    assert_eq!(report["account_info"]["customer_name"], "JANE DOE");
}

#[test]
fn analyze_writes_csv_file() {
    let dir = tempdir().unwrap();
    let input = write(dir.path(), "statement.txt", STATEMENT);
    let out = dir.path().join("ledger.csv");

    ledgr(&dir)
        .args(["analyze", &input, "-f", "csv", "-o"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Output written to"));

    let csv = fs::read_to_string(&out).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("date,description,debit,credit,balance"));
    assert!(lines[1].starts_with("2024-01-05,Salary ACME,0.00,5000.00,7250.00,statement,6"));
}

#[test]
fn analyze_text_format_shows_analytics() {
    let dir = tempdir().unwrap();
    let input = write(dir.path(), "statement.txt", STATEMENT);

    ledgr(&dir)
        .args(["analyze", &input, "-f", "text"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Customer: JOHN SMITH"))
        .stdout(predicate::str::contains("2024-01"))
        .stdout(predicate::str::contains("Analytics:"));
}

#[test]
fn analyze_missing_file_fails() {
    let dir = tempdir().unwrap();

    ledgr(&dir)
        .args(["analyze", "does-not-exist.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input file not found"));
}

#[test]
fn batch_writes_outputs_and_summary() {
    let dir = tempdir().unwrap();
    let inputs = dir.path().join("in");
    fs::create_dir(&inputs).unwrap();
    write(&inputs, "a.txt", STATEMENT);
    write(&inputs, "b.json", EXTRACTOR_JSON);
    write(&inputs, "c.pdf", "not really a pdf");
    let out = dir.path().join("out");
    let pattern = format!("{}/*", inputs.display());

    ledgr(&dir)
        .args(["batch", &pattern, "--summary", "--continue-on-error", "-j", "2", "-o"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Found 3 files"));

    assert!(out.join("a.json").exists());
    assert!(out.join("b.json").exists());
    assert!(!out.join("c.json").exists());

    let summary = fs::read_to_string(out.join("summary.csv")).unwrap();
    let lines: Vec<&str> = summary.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[1].starts_with("a.txt,success,en,pattern_rows,3,2,"));
    assert!(lines[2].starts_with("b.json,success,en,,3,"));
    assert!(lines[3].starts_with("c.pdf,error,"));
}

#[test]
fn batch_keeps_same_stem_outputs_apart() {
    let dir = tempdir().unwrap();
    let inputs = dir.path().join("in");
    fs::create_dir(&inputs).unwrap();
    write(&inputs, "stmt.txt", STATEMENT);
    write(&inputs, "stmt.json", EXTRACTOR_JSON);
    let out = dir.path().join("out");
    let pattern = format!("{}/*", inputs.display());

    ledgr(&dir)
        .args(["batch", &pattern, "-o"])
        .arg(&out)
        .assert()
        .success();

    assert!(!out.join("stmt.json").exists());
    let from_text: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.join("stmt.txt.json")).unwrap()).unwrap();
    let from_json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.join("stmt.json.json")).unwrap()).unwrap();
    assert_eq!(from_text["account_info"]["customer_name"], "JOHN SMITH");
    assert_eq!(from_json["account_info"]["customer_name"], "JANE DOE");
}

#[test]
fn batch_stops_on_error_by_default() {
    let dir = tempdir().unwrap();
    write(dir.path(), "bad.pdf", "not really a pdf");
    let pattern = format!("{}/*.pdf", dir.path().display());

    ledgr(&dir)
        .args(["batch", &pattern])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Processing failed"));
}

#[test]
fn batch_without_matches_fails() {
    let dir = tempdir().unwrap();
    let pattern = format!("{}/*.pdf", dir.path().display());

    ledgr(&dir)
        .args(["batch", &pattern])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No matching files"));
}

#[test]
fn config_init_set_get() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("ledgr.json").display().to_string();

    ledgr(&dir)
        .args(["--config", &config, "config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created configuration file"));

    ledgr(&dir)
        .args(["--config", &config, "config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    ledgr(&dir)
        .args(["--config", &config, "config", "set", "extraction.debit_credit_policy", "larger_wins"])
        .assert()
        .success();

    ledgr(&dir)
        .args(["--config", &config, "config", "get", "extraction.debit_credit_policy"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"larger_wins\""));

    ledgr(&dir)
        .args(["--config", &config, "config", "set", "extraction.debit_credit_policy", "sometimes"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid value"));
}

#[test]
fn config_file_forces_locale() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("ledgr.json").display().to_string();
    let input = write(dir.path(), "statement.txt", STATEMENT);

    ledgr(&dir)
        .args(["--config", &config, "config", "set", "locale.force", "ar"])
        .assert()
        .success();

    ledgr(&dir)
        .args(["--config", &config, "analyze", &input])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"locale\":\"ar\""));
}

#[test]
fn config_path_uses_config_dir() {
    let dir = tempdir().unwrap();

    ledgr(&dir)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("not created"));
}
