use predicates::prelude::*;

#[test]
fn test_help_includes_required_options() {
    let mut cmd = assert_cmd::cargo_bin_cmd!("devicescope");
    cmd.arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("--entra"))
        .stdout(predicate::str::contains("--intune"))
        .stdout(predicate::str::contains("--ad"))
        .stdout(predicate::str::contains("--sophos"))
        .stdout(predicate::str::contains("--kace"))
        .stdout(predicate::str::contains("--input-dir"))
        .stdout(predicate::str::contains("--json"))
        .stdout(predicate::str::contains("--summary"))
        .stdout(predicate::str::contains("--version"));
}

#[test]
fn test_help_describes_filters() {
    let mut cmd = assert_cmd::cargo_bin_cmd!("devicescope");
    cmd.arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("--context"))
        .stdout(predicate::str::contains("--duplicates"))
        .stdout(predicate::str::contains("--device-type"))
        .stdout(predicate::str::contains("--os"))
        .stdout(predicate::str::contains("glob pattern"));
}

#[test]
fn test_version_prints_semantic_version() {
    let mut cmd = assert_cmd::cargo_bin_cmd!("devicescope");
    cmd.arg("--version");

    cmd.assert()
        .success()
        .stdout(predicate::str::is_match(r"devicescope \d+\.\d+\.\d+").unwrap());
}

#[test]
fn test_short_version_flag() {
    let mut cmd = assert_cmd::cargo_bin_cmd!("devicescope");
    cmd.arg("-V");

    cmd.assert()
        .success()
        .stdout(predicate::str::is_match(r"devicescope \d+\.\d+\.\d+").unwrap());
}

#[test]
fn test_invalid_duplicates_value() {
    let mut cmd = assert_cmd::cargo_bin_cmd!("devicescope");
    cmd.args(["--duplicates", "sometimes"]);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("unknown duplicate filter"));
}

#[test]
fn test_exclusive_requires_context() {
    let mut cmd = assert_cmd::cargo_bin_cmd!("devicescope");
    cmd.arg("--exclusive");

    cmd.assert().failure().stderr(predicate::str::contains("--context"));
}
