// The cargo_bin! macro requires build script setup that's overkill for simple tests.
#![allow(deprecated)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;

const SAVE: &str = "\
SAV0102
metadata={
\tversion=\"1.0\"
}
date=1500.3.1
countries={
\tdatabase={
\t\t3={
\t\t\tflag=CAS
\t\t\tgovernment={
\t\t\t\truler=12
\t\t\t}
\t\t}
\t\t4={
\t\t\tcountry_name=\"FRA\"
\t\t\tgold=10.5
\t\t}
\t}
}
character_db={
\tdatabase={
\t\t12={
\t\t\tfirst_name=\"Isabel\"
\t\t}
\t}
}
";

fn write_temp(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("TempFile");
    file.write_all(contents.as_bytes()).expect("Write");
    file
}

fn eu5scan(save: &NamedTempFile) -> Command {
    let mut cmd = Command::cargo_bin("eu5scan").expect("binary");
    cmd.env_remove("EU5_SAVE")
        .env_remove("EU5_PLAYERS")
        .env("RUST_LOG", "error")
        .arg("--save")
        .arg(save.path());
    cmd
}

#[test]
fn test_help_flag() {
    Command::cargo_bin("eu5scan")
        .expect("binary")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("roster"));
}

#[test]
fn test_date() {
    let save = write_temp(SAVE);
    eu5scan(&save)
        .arg("date")
        .assert()
        .success()
        .stdout("1500.3.1\n");
}

#[test]
fn test_section_raw() {
    let save = write_temp(SAVE);
    eu5scan(&save)
        .args(["section", "metadata"])
        .assert()
        .success()
        .stdout("metadata={\n\tversion=\"1.0\"\n}\n");
}

#[test]
fn test_record_by_marker_json() {
    let save = write_temp(SAVE);
    eu5scan(&save)
        .args(["record", "--marker", "country_name=\"FRA\"", "--within", "countries/database", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"record_id\": \"4\""))
        .stdout(predicate::str::contains("\"gold\": 10.5"));
}

#[test]
fn test_id_parsed() {
    let save = write_temp(SAVE);
    eu5scan(&save)
        .args(["id", "12", "--parsed"])
        .assert()
        .success()
        .stdout("12={\n\tfirst_name=\"Isabel\"\n}\n");
}

#[test]
fn test_record_not_found_exits_nonzero() {
    let save = write_temp(SAVE);
    eu5scan(&save)
        .args(["record", "--marker", "country_name=\"ENG\""])
        .assert()
        .failure();
}

#[test]
fn test_roster_continues_after_missing_tag() {
    let save = write_temp(SAVE);
    let players = write_temp("# players\nENG\nFRA=Alice\nCAS\n");
    eu5scan(&save)
        .arg("roster")
        .arg("--players")
        .arg(players.path())
        .args(["--follow", "government.ruler@character_db/database"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Total: 3 | Found: 2 | Not found: 1 | Failed: 0"))
        .stdout(predicate::str::contains("[NOT FOUND] ENG"))
        .stdout(predicate::str::contains("[OK] FRA (Alice): record 4"))
        .stdout(predicate::str::contains("-> first_name=Isabel"));
}

#[test]
fn test_roster_json() {
    let save = write_temp(SAVE);
    let players = write_temp("CAS\n");
    let output = eu5scan(&save)
        .arg("roster")
        .arg("--players")
        .arg(players.path())
        .arg("--json")
        .output()
        .expect("run");
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).expect("JSON");
    assert_eq!(json["outcomes"][0]["status"], "OK");
    assert_eq!(json["outcomes"][0]["record"]["flag"], "CAS");
}

#[test]
fn test_missing_save_fails() {
    Command::cargo_bin("eu5scan")
        .expect("binary")
        .env_remove("EU5_SAVE")
        .args(["--save", "no/such/save.eu5", "date"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to open save"));
}
