//! Tests for the `list` command.

mod common;

use common::landscape;
use predicates::prelude::*;

#[test]
fn test_list_environments() {
    let env = landscape();

    let stdout = env.run_ok(&["list"]);

    assert_eq!(stdout, "dev\nprod\n");
}

#[test]
fn test_list_environments_json() {
    let env = landscape();

    let stdout = env.run_ok(&["list", "--format", "json"]);

    let names: Vec<String> = serde_json::from_str(&stdout).expect("output is JSON");
    assert_eq!(names, ["dev", "prod"]);
}

#[test]
fn test_list_components_of_environment() {
    let env = landscape();

    env.command()
        .args(["list", "--env", "prod"])
        .assert()
        .success()
        .stdout(predicate::str::contains("GROUP\tORDER\tCOMPONENT\tTYPE\tIP"))
        .stdout(predicate::str::contains("core\t1\tgateway\tgateway\t10.0.0.5"))
        .stdout(predicate::str::contains("core\t3\tledger\taccounting\t10.0.0.5"))
        .stdout(predicate::str::contains("edge\t1\tweb\tweb\t10.0.0.1"));
}

#[test]
fn test_list_components_json() {
    let env = landscape();

    let stdout = env.run_ok(&["list", "-e", "dev", "--format", "json"]);

    let rows: serde_json::Value = serde_json::from_str(&stdout).expect("output is JSON");
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["name"], "billing");
    assert_eq!(rows[0]["order"], 1);
    assert_eq!(rows[0]["type"], "billing");
}

#[test]
fn test_list_quiet_omits_header() {
    let env = landscape();

    env.command()
        .args(["--quiet", "list", "--env", "dev"])
        .assert()
        .success()
        .stdout(predicate::str::contains("GROUP").not());
}

#[test]
fn test_list_unknown_environment() {
    let env = landscape();

    env.command()
        .args(["list", "--env", "staging2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("environment not found: staging2"));
}
