//! End-to-end runs of the `import_listado1` binary, checking what lands on
//! stdout and stderr.

use std::path::PathBuf;
use std::process::{Command, Output};

const COMPLETE_GAME: &str = "<game><id>1</id><title>Full</title><platform>PC</platform>\
    <genre>RPG</genre><developer>Dev</developer><publisher>Pub</publisher>\
    <release_date>2022-02-02</release_date><short_description>Short</short_description>\
    <thumbnail>https://img.example/1.png</thumbnail></game>";
const INCOMPLETE_GAME: &str = "<game><id>2</id><title>Half</title></game>";

fn scratch_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("gamerank-bin-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn run_import(dir: &PathBuf, file: &PathBuf) -> Output {
    Command::new(env!("CARGO_BIN_EXE_import_listado1"))
        .current_dir(dir)
        .arg("--file")
        .arg(file)
        .arg("--database-url")
        .arg(format!("sqlite://{}", dir.join("gamerank.db").display()))
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

#[test]
fn each_skipped_game_prints_exactly_one_stderr_line() {
    let dir = scratch_dir();
    let file = dir.join("listado1.xml");
    std::fs::write(&file, format!("<games>{COMPLETE_GAME}{INCOMPLETE_GAME}</games>")).unwrap();

    let out = run_import(&dir, &file);
    let stdout = String::from_utf8_lossy(&out.stdout);
    let stderr = String::from_utf8_lossy(&out.stderr);
    std::fs::remove_dir_all(&dir).ok();

    assert!(out.status.success(), "stderr: {stderr}");
    assert!(stdout.contains(
        "Successfully imported 1 new games, updated 0 existing games, and skipped 1 games."
    ));
    let lines: Vec<&str> = stderr.lines().filter(|l| !l.trim().is_empty()).collect();
    assert_eq!(lines.len(), 1, "stderr: {stderr}");
    assert!(lines[0].starts_with("Skipping game ID '2': Missing fields: "));
}

#[test]
fn missing_file_fails_with_one_error_line() {
    let dir = scratch_dir();
    let out = run_import(&dir, &dir.join("absent.xml"));
    let stderr = String::from_utf8_lossy(&out.stderr);
    std::fs::remove_dir_all(&dir).ok();

    assert!(!out.status.success());
    let lines: Vec<&str> = stderr.lines().filter(|l| !l.trim().is_empty()).collect();
    assert_eq!(lines.len(), 1, "stderr: {stderr}");
    assert!(lines[0].contains("File not found"));
}
