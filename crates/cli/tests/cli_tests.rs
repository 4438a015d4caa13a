// End-to-end tests for the `ibrecon` binary.
// Run with: cargo test -p interbranch-cli --test cli_tests

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn ibrecon() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_ibrecon"));
    cmd.current_dir(env!("CARGO_MANIFEST_DIR"));
    cmd.env_remove("IBRECON_LOG");
    cmd
}

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../recon/tests/fixtures")
        .join(name)
}

fn code(out: &Output) -> i32 {
    out.status.code().unwrap_or(-1)
}

fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).into_owned()
}

const LEDGER_HEADER: &str =
    "branch_code,account_code,sub_ledger_code,sub_ledger_name,posting_date,debit,credit,voucher_no,description";

// -------------------------------------------------------------------------
// validate
// -------------------------------------------------------------------------

#[test]
fn validate_accepts_fixture_config() {
    let out = ibrecon().arg("validate").arg(fixture("recon.toml")).output().unwrap();
    assert_eq!(code(&out), 0, "stderr: {}", stderr(&out));
    assert!(stderr(&out).contains("valid: \"Kansai clearing\" (3 branches, 1 groups, 4 sub-ledger codes)"));
}

#[test]
fn validate_rejects_duplicate_sub_ledger() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    std::fs::write(
        &path,
        r#"
name = "bad"
clearing_account = "11652090"

[[sub_ledgers]]
code = "0001"
branch = "A"

[[sub_ledgers]]
code = "0001"
branch = "B"
"#,
    )
    .unwrap();

    let out = ibrecon().arg("validate").arg(&path).output().unwrap();
    assert_eq!(code(&out), 60);
    let err = stderr(&out);
    assert!(err.contains("error: config validation error"), "stderr: {err}");
    assert!(err.contains("hint:"));
}

#[test]
fn missing_config_is_runtime_error() {
    let out = ibrecon().args(["validate", "does-not-exist.toml"]).output().unwrap();
    assert_eq!(code(&out), 61);
    assert!(stderr(&out).contains("cannot read config"));
}

// -------------------------------------------------------------------------
// tb
// -------------------------------------------------------------------------

#[test]
fn tb_grouped_by_default() {
    let out = ibrecon()
        .arg("tb")
        .arg(fixture("tb.csv"))
        .arg("--config")
        .arg(fixture("recon.toml"))
        .output()
        .unwrap();
    assert_eq!(code(&out), 1, "stderr: {}", stderr(&out));

    let csv = stdout(&out);
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(
        lines[0],
        "leftBranch,leftBranchName,rightBranch,rightBranchName,leftAmount,rightAmount,diff"
    );
    assert_eq!(lines[1], "050000101,心斎橋店,KOBE,神戸グループ,800,-780,20");
    assert_eq!(lines.len(), 2);
    assert!(stderr(&out).contains("error: 1 branch pair(s) disagree"));
}

#[test]
fn tb_no_grouping_json() {
    let out = ibrecon()
        .arg("tb")
        .arg(fixture("tb.csv"))
        .arg("--config")
        .arg(fixture("recon.toml"))
        .args(["--no-grouping", "--json", "--period", "2025-03"])
        .output()
        .unwrap();
    assert_eq!(code(&out), 1);

    let json: serde_json::Value = serde_json::from_str(&stdout(&out)).unwrap();
    assert_eq!(json["period"], "2025-03");
    assert_eq!(json["meta"]["grouping"], false);
    assert_eq!(json["pairs"].as_array().unwrap().len(), 3);
    assert_eq!(json["summary"]["disagreeing"], 2);
    assert_eq!(json["skipped"]["unresolved"], 1);
    assert!(stderr(&out).contains("warning: 1 clearing rows have no resolvable counterparty"));
}

#[test]
fn tb_output_file_and_agreement() {
    let dir = tempfile::tempdir().unwrap();
    let tb = dir.path().join("tb.csv");
    std::fs::write(
        &tb,
        "branch_code,account_code,sub_ledger_code,sub_ledger_name,ending_balance\n\
         050000101,11652090,0006,神戸店,500\n\
         050000401,11652090,0001,心斎橋店,-500\n",
    )
    .unwrap();
    let output = dir.path().join("pairs.csv");

    let out = ibrecon()
        .arg("tb")
        .arg(&tb)
        .arg("--config")
        .arg(fixture("recon.toml"))
        .arg("--no-grouping")
        .arg("--output")
        .arg(&output)
        .output()
        .unwrap();
    assert_eq!(code(&out), 0, "stderr: {}", stderr(&out));
    assert!(stdout(&out).is_empty());

    let written = std::fs::read_to_string(&output).unwrap();
    assert!(written.contains("050000101,心斎橋店,050000401,神戸店,500,-500,0"));
}

#[test]
fn tb_bad_amount_is_input_error() {
    let dir = tempfile::tempdir().unwrap();
    let tb = dir.path().join("tb.csv");
    std::fs::write(
        &tb,
        "branch_code,account_code,sub_ledger_code,sub_ledger_name,ending_balance\n\
         050000101,11652090,0006,神戸店,12.5\n",
    )
    .unwrap();
    let out = ibrecon()
        .arg("tb")
        .arg(&tb)
        .arg("--config")
        .arg(fixture("recon.toml"))
        .output()
        .unwrap();
    assert_eq!(code(&out), 62);
    assert!(stderr(&out).contains("tb.csv, row 2: cannot parse amount '12.5'"));
}

#[test]
fn tb_missing_column_is_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let tb = dir.path().join("tb.csv");
    std::fs::write(&tb, "branch_code,account_code\n050000101,11652090\n").unwrap();
    let out = ibrecon()
        .arg("tb")
        .arg(&tb)
        .arg("--config")
        .arg(fixture("recon.toml"))
        .output()
        .unwrap();
    assert_eq!(code(&out), 60);
    let err = stderr(&out);
    assert!(err.contains("missing column 'sub_ledger_code'"));
    assert!(err.contains("[columns.trial_balance]"));
}

// -------------------------------------------------------------------------
// ledger
// -------------------------------------------------------------------------

fn ledger_cmd(out_dir: &Path) -> Command {
    let mut cmd = ibrecon();
    cmd.arg("ledger")
        .arg(fixture("ledger_a.csv"))
        .arg(fixture("ledger_b.csv"))
        .arg("--config")
        .arg(fixture("recon.toml"))
        .args(["--branch-a", "050000101", "--branch-b", "050000401"])
        .arg("--out-dir")
        .arg(out_dir);
    cmd
}

#[test]
fn ledger_writes_all_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let out = ledger_cmd(dir.path()).args(["--period", "2025-03"]).output().unwrap();
    assert_eq!(code(&out), 1, "stderr: {}", stderr(&out));

    let stem = "2025-03_050000101-050000401";
    let matched =
        std::fs::read_to_string(dir.path().join(format!("ledger-match_{stem}.csv"))).unwrap();
    let lines: Vec<&str> = matched.lines().collect();
    assert_eq!(lines.len(), 32);
    assert_eq!(lines[0], "date,Sub:A_0006,Sub:B_0001,sumA,sumB,diff");
    assert_eq!(lines[14], "2025-03-14,1500,-1480,1500,-1480,20");

    let info = std::fs::read_to_string(dir.path().join(format!("ledger-info_{stem}.csv"))).unwrap();
    assert!(info.starts_with("period,2025-03\nbranchA,心斎橋店,050000101\n"));

    let unmatched =
        std::fs::read_to_string(dir.path().join(format!("ledger-unmatch_{stem}.csv"))).unwrap();
    assert_eq!(unmatched.lines().count(), 3);
    assert!(unmatched.contains("X-003"));
    assert!(unmatched.contains("Y-003"));

    let analysis =
        std::fs::read_to_string(dir.path().join(format!("ledger-analysis_{stem}.json"))).unwrap();
    let json: serde_json::Value = serde_json::from_str(&analysis).unwrap();
    assert_eq!(json["branchB"], "050000401");
    assert_eq!(json["daySummary"][0]["date8"], "20250314");

    let err = stderr(&out);
    assert!(err.contains("1 disagreeing days, 1 + 1 unmatched entries"));
    assert!(err.contains("2025-03-14: 1500 + -1480 = 20"));
}

#[test]
fn ledger_in_agreement_writes_no_unmatched() {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.csv");
    let b = dir.path().join("b.csv");
    std::fs::write(
        &a,
        format!("{LEDGER_HEADER}\n050000101,11652090,0006,神戸店,2025-03-03,500,0,X-1,t\n"),
    )
    .unwrap();
    std::fs::write(
        &b,
        format!("{LEDGER_HEADER}\n050000401,11652090,0001,心斎橋店,2025-03-03,0,500,Y-1,t\n"),
    )
    .unwrap();

    let out = ibrecon()
        .arg("ledger")
        .arg(&a)
        .arg(&b)
        .arg("--config")
        .arg(fixture("recon.toml"))
        .args(["--period", "2025-03", "--branch-a", "050000101", "--branch-b", "050000401"])
        .arg("--out-dir")
        .arg(dir.path())
        .arg("--json")
        .output()
        .unwrap();
    assert_eq!(code(&out), 0, "stderr: {}", stderr(&out));

    let stem = "2025-03_050000101-050000401";
    assert!(dir.path().join(format!("ledger-match_{stem}.csv")).exists());
    assert!(!dir.path().join(format!("ledger-unmatch_{stem}.csv")).exists());
    assert!(!dir.path().join(format!("ledger-analysis_{stem}.json")).exists());

    let json: serde_json::Value = serde_json::from_str(&stdout(&out)).unwrap();
    assert_eq!(json["counts"]["hasUnmatch"], false);
    assert!(json.get("unmatched").is_none());
}

#[test]
fn ledger_bad_period_is_usage_error() {
    let dir = tempfile::tempdir().unwrap();
    let out = ledger_cmd(dir.path()).args(["--period", "2025/03"]).output().unwrap();
    assert_eq!(code(&out), 2);
    let err = stderr(&out);
    assert!(err.contains("invalid period '2025/03' (expected YYYY-MM)"));
    assert!(err.contains("hint:  use --period YYYY-MM"));
}

#[test]
fn ledger_same_group_is_usage_error() {
    let dir = tempfile::tempdir().unwrap();
    let out = ibrecon()
        .arg("ledger")
        .arg(fixture("ledger_a.csv"))
        .arg(fixture("ledger_b.csv"))
        .arg("--config")
        .arg(fixture("recon.toml"))
        .args(["--period", "2025-03", "--branch-a", "050000401", "--branch-b", "050000402"])
        .arg("--grouping")
        .arg("--out-dir")
        .arg(dir.path())
        .output()
        .unwrap();
    assert_eq!(code(&out), 2);
    assert!(stderr(&out).contains("same branch (KOBE)"));
}

#[test]
fn ledger_requires_period() {
    let dir = tempfile::tempdir().unwrap();
    let out = ledger_cmd(dir.path()).output().unwrap();
    assert_eq!(code(&out), 2);
}

#[test]
fn debug_logging_goes_to_stderr() {
    let dir = tempfile::tempdir().unwrap();
    let out = ledger_cmd(dir.path())
        .args(["--period", "2025-03"])
        .env("IBRECON_LOG", "debug")
        .output()
        .unwrap();
    assert_eq!(code(&out), 1);
    assert!(stdout(&out).is_empty());
    assert!(stderr(&out).contains("loaded 6 ledger row(s)"));
}
