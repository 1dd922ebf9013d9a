#![allow(deprecated)]
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const SAMPLE_CATALOG: &str = "\
version: sample-1
rules:
  - id: R1
    category: core
    weight: 3
    severity_tier: 1
    description: Seven-bag randomizer
  - id: R2
    category: core
    weight: 1
    severity_tier: 1
    description: SRS wall kicks
    remediation: Apply the SRS kick tables
  - id: R3
    category: controls
    weight: 2
    severity_tier: 2
    description: Hold once per piece
  - id: R4
    category: ui
    weight: 1
    severity_tier: 3
    description: Ghost piece
deferred:
  - id: MP-01
    description: Garbage rows in versus
    reason: multiplayer appendix
";

fn rubric(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("rubric").unwrap();
    cmd.current_dir(dir.path()).env("RUBRIC_ROOT", dir.path());
    cmd
}

fn init_sample(dir: &TempDir) {
    std::fs::write(dir.path().join("catalog.yaml"), SAMPLE_CATALOG).unwrap();
    rubric(dir)
        .args(["init", "--catalog", "catalog.yaml"])
        .assert()
        .success();
}

fn start(dir: &TempDir, id: &str, strictness: &str) {
    rubric(dir)
        .args(["run", "start", "--target", "tetris-ios", "--id", id, "--strictness", strictness])
        .assert()
        .success();
}

fn submit(dir: &TempDir, id: &str, rule: &str, status: &str) {
    rubric(dir)
        .args(["verdict", "submit", id, rule, status])
        .assert()
        .success();
}

fn submit_example(dir: &TempDir, id: &str) {
    submit(dir, id, "R1", "pass");
    rubric(dir)
        .args(["verdict", "submit", id, "R2", "fail", "--evidence", "rotate.rs:88 no kicks"])
        .assert()
        .success();
    submit(dir, id, "R3", "unknown");
    submit(dir, id, "R4", "pass");
}

fn json_output(cmd: &mut Command) -> serde_json::Value {
    let out = cmd.assert().success().get_output().stdout.clone();
    serde_json::from_slice(&out).unwrap()
}

// ---------------------------------------------------------------------------
// rubric init
// ---------------------------------------------------------------------------

#[test]
fn init_creates_config_and_runs_dir() {
    let dir = TempDir::new().unwrap();
    rubric(&dir).arg("init").assert().success();
    assert!(dir.path().join(".rubric/config.yaml").exists());
    assert!(dir.path().join(".rubric/runs").is_dir());
}

#[test]
fn init_is_idempotent() {
    let dir = TempDir::new().unwrap();
    rubric(&dir).arg("init").assert().success();
    rubric(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Already initialized"));
}

#[test]
fn init_reports_config_warnings() {
    let dir = TempDir::new().unwrap();
    rubric(&dir)
        .arg("init")
        .assert()
        .success()
        .stderr(predicate::str::contains("warning").not());

    let config = dir.path().join(".rubric/config.yaml");
    let yaml = std::fs::read_to_string(&config).unwrap();
    std::fs::write(&config, yaml.replace("version: 1", "version: 2")).unwrap();
    rubric(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Already initialized"))
        .stderr(predicate::str::contains("warning: unknown config version 2"));

    let v = json_output(rubric(&dir).args(["--json", "init", "--force"]));
    assert_eq!(v["written"], true);
    assert_eq!(v["warnings"].as_array().unwrap().len(), 0);
}

#[test]
fn init_rejects_invalid_catalog() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("bad.yaml"),
        SAMPLE_CATALOG.replace("severity_tier: 3", "severity_tier: 7"),
    )
    .unwrap();
    rubric(&dir)
        .args(["init", "--catalog", "bad.yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("severity tier 7"));
    assert!(!dir.path().join(".rubric/config.yaml").exists());
}

// ---------------------------------------------------------------------------
// rubric catalog
// ---------------------------------------------------------------------------

#[test]
fn catalog_show_builtin_without_init() {
    let dir = TempDir::new().unwrap();
    rubric(&dir)
        .args(["catalog", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("tetris-sp-1"))
        .stdout(predicate::str::contains("CORE-04"))
        .stdout(predicate::str::contains("MP-01"));
}

#[test]
fn catalog_show_json() {
    let dir = TempDir::new().unwrap();
    init_sample(&dir);
    let v = json_output(rubric(&dir).args(["--json", "catalog", "show"]));
    assert_eq!(v["version"], "sample-1");
    assert_eq!(v["rules"].as_array().unwrap().len(), 4);
    assert_eq!(v["rules"][1]["severity_tier"], 1);
}

#[test]
fn catalog_validate_reports_duplicates() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("dup.yaml");
    std::fs::write(&path, SAMPLE_CATALOG.replace("id: R4", "id: R1")).unwrap();
    rubric(&dir)
        .args(["catalog", "validate", path.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("duplicate rule id 'R1'"));
}

#[test]
fn catalog_export_then_validate() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("exported.yaml");
    rubric(&dir)
        .args(["catalog", "export", "--out", out.to_str().unwrap()])
        .assert()
        .success();
    rubric(&dir)
        .args(["catalog", "validate", out.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("19 rules, 2 deferred"));
}

// ---------------------------------------------------------------------------
// rubric run
// ---------------------------------------------------------------------------

#[test]
fn run_start_requires_init() {
    let dir = TempDir::new().unwrap();
    rubric(&dir)
        .args(["run", "start", "--target", "x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not initialized"));
}

#[test]
fn run_start_generates_id_and_lists() {
    let dir = TempDir::new().unwrap();
    init_sample(&dir);
    let v = json_output(rubric(&dir).args(["--json", "run", "start", "--target", "game"]));
    let id = v["id"].as_str().unwrap().to_string();
    assert!(id.starts_with("run-"));
    assert_eq!(v["phase"], "collecting");
    assert_eq!(v["strictness"], "balanced");
    assert_eq!(v["catalog_version"], "sample-1");

    rubric(&dir)
        .args(["run", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains(id.as_str()));
}

#[test]
fn run_start_rejects_bad_params() {
    let dir = TempDir::new().unwrap();
    init_sample(&dir);
    rubric(&dir)
        .args(["run", "start", "--target", "x", "--platform", "android"])
        .assert()
        .failure();
    rubric(&dir)
        .args(["run", "start", "--target", "x", "--id", "Not Valid"])
        .assert()
        .failure();
    start(&dir, "dup", "strict");
    rubric(&dir)
        .args(["run", "start", "--target", "x", "--id", "dup"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

// ---------------------------------------------------------------------------
// verdicts, scoring, reporting
// ---------------------------------------------------------------------------

#[test]
fn balanced_scores_match_worked_example() {
    let dir = TempDir::new().unwrap();
    init_sample(&dir);
    start(&dir, "a1", "balanced");
    submit_example(&dir, "a1");

    rubric(&dir)
        .args(["score", "a1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("core      75.0"))
        .stdout(predicate::str::contains("controls  50.0"))
        .stdout(predicate::str::contains("Overall: 71.4 / 100 (balanced)"));
}

#[test]
fn strict_scores_match_worked_example() {
    let dir = TempDir::new().unwrap();
    init_sample(&dir);
    start(&dir, "s1", "strict");
    submit_example(&dir, "s1");

    let v = json_output(rubric(&dir).args(["--json", "score", "s1"]));
    assert_eq!(v["scorecard"]["overall"], 57.1);
    assert_eq!(v["scorecard"]["categories"][1]["category"], "controls");
    assert_eq!(v["scorecard"]["categories"][1]["weighted_score"], 0.0);
}

#[test]
fn score_incomplete_run_lists_missing() {
    let dir = TempDir::new().unwrap();
    init_sample(&dir);
    start(&dir, "a1", "balanced");
    submit(&dir, "a1", "R1", "pass");

    rubric(&dir)
        .args(["score", "a1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("R2, R3, R4"));

    rubric(&dir)
        .args(["verdict", "missing", "a1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("R3"))
        .stdout(predicate::str::contains("Hold once per piece"));
}

#[test]
fn bad_submissions_rejected_and_run_continues() {
    let dir = TempDir::new().unwrap();
    init_sample(&dir);
    start(&dir, "a1", "balanced");
    submit(&dir, "a1", "R1", "pass");

    rubric(&dir)
        .args(["verdict", "submit", "a1", "R1", "fail"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("duplicate verdict"));
    rubric(&dir)
        .args(["verdict", "submit", "a1", "R99", "pass"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown rule"));
    rubric(&dir)
        .args(["verdict", "submit", "a1", "MP-01", "pass"])
        .assert()
        .failure();
    rubric(&dir)
        .args(["verdict", "submit", "a1", "R2", "maybe"])
        .assert()
        .failure();

    let v = json_output(rubric(&dir).args(["--json", "run", "show", "a1"]));
    assert_eq!(v["verdicts"].as_array().unwrap().len(), 1);
    assert_eq!(v["verdicts"][0]["status"], "pass");
}

#[test]
fn import_skips_bad_entries() {
    let dir = TempDir::new().unwrap();
    init_sample(&dir);
    start(&dir, "a1", "balanced");
    std::fs::write(
        dir.path().join("verdicts.json"),
        r#"{"verdicts": [
            {"rule_id": "R1", "status": "pass", "evidence": "bag.rs"},
            {"rule_id": "R1", "status": "fail"},
            {"rule_id": "ZZ", "status": "pass"},
            {"rule_id": "R2", "status": "fail"}
        ]}"#,
    )
    .unwrap();

    let v = json_output(rubric(&dir).args(["--json", "verdict", "import", "a1", "verdicts.json"]));
    assert_eq!(v["summary"]["accepted"], serde_json::json!(["R1", "R2"]));
    assert_eq!(v["summary"]["rejected"].as_array().unwrap().len(), 2);
    assert_eq!(v["remaining"], 2);
}

#[test]
fn fill_unknown_then_score() {
    let dir = TempDir::new().unwrap();
    init_sample(&dir);
    start(&dir, "a1", "strict");
    submit(&dir, "a1", "R1", "pass");
    rubric(&dir)
        .args(["verdict", "fill-unknown", "a1", "--note", "deadline"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Marked 3 rule(s) UNKNOWN"));

    // 3 of 7 weight under strict
    rubric(&dir)
        .args(["score", "a1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Overall: 42.9 / 100 (strict)"));
}

#[test]
fn report_requires_scoring_and_closes_run() {
    let dir = TempDir::new().unwrap();
    init_sample(&dir);
    start(&dir, "a1", "balanced");
    submit_example(&dir, "a1");

    rubric(&dir)
        .args(["report", "a1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("has not been scored"));

    rubric(&dir).args(["score", "a1"]).assert().success();
    rubric(&dir)
        .args(["report", "a1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("## Overall score: 71.4 / 100"))
        .stdout(predicate::str::contains("1. **R2**"))
        .stdout(predicate::str::contains("Remediation: Apply the SRS kick tables"))
        .stdout(predicate::str::contains("MP-01"));

    let v = json_output(rubric(&dir).args(["--json", "run", "show", "a1"]));
    assert_eq!(v["phase"], "reported");

    rubric(&dir)
        .args(["verdict", "submit", "a1", "R1", "fail"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("re-audit"));
}

#[test]
fn report_json_to_file() {
    let dir = TempDir::new().unwrap();
    init_sample(&dir);
    start(&dir, "a1", "balanced");
    submit_example(&dir, "a1");
    rubric(&dir).args(["score", "a1"]).assert().success();

    let out = dir.path().join("report.json");
    rubric(&dir)
        .args(["report", "a1", "--format", "json", "--out", out.to_str().unwrap()])
        .assert()
        .success();

    let v: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(v["overall"], 71.4);
    assert_eq!(v["catalog_version"], "sample-1");
    assert_eq!(v["findings"].as_array().unwrap().len(), 1);
    assert_eq!(v["findings"][0]["rule_id"], "R2");
    assert_eq!(v["findings"][0]["evidence"], "rotate.rs:88 no kicks");
    assert_eq!(v["rules"][2]["absence_note"], "no evidence recorded");
    assert_eq!(v["deferred"][0]["id"], "MP-01");

    // re-rendering a reported run yields the same report
    let again = json_output(rubric(&dir).args(["report", "a1", "--format", "json"]));
    assert_eq!(again, v);
}

#[test]
fn reaudit_supersedes_without_touching_old_run() {
    let dir = TempDir::new().unwrap();
    init_sample(&dir);
    start(&dir, "a1", "strict");
    submit_example(&dir, "a1");
    rubric(&dir).args(["score", "a1"]).assert().success();

    let v = json_output(rubric(&dir).args(["--json", "run", "reaudit", "a1", "--id", "a2"]));
    assert_eq!(v["id"], "a2");
    assert_eq!(v["supersedes"], "a1");
    assert_eq!(v["strictness"], "strict");
    assert_eq!(v["phase"], "collecting");

    let old = json_output(rubric(&dir).args(["--json", "run", "show", "a1"]));
    assert_eq!(old["phase"], "scored");
    assert_eq!(old["verdicts"].as_array().unwrap().len(), 4);
}
