//! Integration tests for the cellar CLI

mod common;

use anyhow::Result;
use common::{CellarCommand, TestProject};
use std::fs;

fn cellar(project: &TestProject, args: &[&str]) -> CellarCommand {
    CellarCommand::new(project.root()).args(args)
}

fn packed() -> Result<TestProject> {
    let project = TestProject::new()?;
    project.write_private("notes.txt", "remember the milk\n")?;
    project.write_private("keys/a.pem", "key a\n")?;
    project.write_private("keys/b.pem", "key b\n")?;
    cellar(&project, &["pack"]).assert_success()?;
    Ok(project)
}

#[test]
fn test_ls_empty_project() -> Result<()> {
    let project = TestProject::new()?;

    let result = cellar(&project, &["ls"]).assert_success()?;
    assert!(result.stdout.contains("No archives yet"));

    let result = cellar(&project, &["ls", "--json"]).assert_success()?;
    let rows: serde_json::Value = serde_json::from_str(&result.stdout)?;
    assert_eq!(rows, serde_json::json!([]));
    Ok(())
}

#[test]
fn test_pack_then_list() -> Result<()> {
    let project = packed()?;
    let names = project.archive_names();
    assert_eq!(names.len(), 1);
    assert!(names[0].ends_with(".tar.gpg"));

    let result = cellar(&project, &["ls", "--json"]).assert_success()?;
    let rows: serde_json::Value = serde_json::from_str(&result.stdout)?;
    assert_eq!(rows[0]["index"], 0);
    assert_eq!(rows[0]["name"], names[0].as_str());
    assert!(rows[0]["created_at_ms"].is_u64());
    assert!(rows[0]["provenance"].is_null());

    let result = cellar(&project, &["ls"]).assert_success()?;
    assert!(result.stdout.contains(&names[0]));
    assert!(result.stdout.contains("untracked"));
    assert!(project.scratch_is_clean());
    Ok(())
}

#[test]
fn test_pack_without_changes_fails() -> Result<()> {
    let project = packed()?;

    let result = cellar(&project, &["pack"]).assert_failure()?;
    assert!(result.stderr.contains("no changes since"), "stderr: {}", result.stderr);
    assert_eq!(project.archive_names().len(), 1);

    cellar(&project, &["pack", "--force"]).assert_success()?;
    assert_eq!(project.archive_names().len(), 2);

    let result = cellar(&project, &["ls", "--json", "--limit", "1"]).assert_success()?;
    let rows: serde_json::Value = serde_json::from_str(&result.stdout)?;
    assert_eq!(rows.as_array().map(Vec::len), Some(1));
    Ok(())
}

#[test]
fn test_pack_empty_private_dir_fails() -> Result<()> {
    let project = TestProject::new()?;
    let result = cellar(&project, &["pack"]).assert_failure()?;
    assert!(result.stderr.contains("nothing to pack"));
    assert!(project.archive_names().is_empty());
    Ok(())
}

#[test]
fn test_cat_single_and_multiple() -> Result<()> {
    let project = packed()?;

    let result = cellar(&project, &["cat", "/latest/notes.txt"]).assert_success()?;
    assert_eq!(result.stdout, "remember the milk\n");

    let result = cellar(&project, &["cat", "latest/keys/*.pem"]).assert_success()?;
    assert_eq!(result.stdout, "==> keys/a.pem <==\nkey a\n\n==> keys/b.pem <==\nkey b\n");

    let result = cellar(&project, &["cat", "/0/missing.txt"]).assert_failure()?;
    assert!(result.stderr.contains("no files matching 'missing.txt'"));
    assert!(project.scratch_is_clean());
    Ok(())
}

#[test]
fn test_bad_references() -> Result<()> {
    let project = packed()?;

    let result = cellar(&project, &["cat", "/5/notes.txt"]).assert_failure()?;
    assert!(result.stderr.contains("out of range"));

    let result = cellar(&project, &["cat", "/deadbeef/notes.txt"]).assert_failure()?;
    assert!(result.stderr.contains("no archive with commit matching 'deadbeef'"));

    let result = cellar(&project, &["cat", "/latest/../cellar.toml"]).assert_failure()?;
    assert!(result.stderr.contains("invalid archive path"));
    Ok(())
}

#[test]
fn test_cp_out_of_archive() -> Result<()> {
    let project = packed()?;
    let dest = tempfile::TempDir::new()?;
    let dest_str = dest.path().to_string_lossy().into_owned();

    cellar(&project, &["cp", "/latest/keys/*", &dest_str]).assert_success()?;
    assert_eq!(fs::read_to_string(dest.path().join("keys/a.pem"))?, "key a\n");
    assert_eq!(fs::read_to_string(dest.path().join("keys/b.pem"))?, "key b\n");

    cellar(&project, &["cp", "/latest/notes.txt", &dest_str]).assert_success()?;
    assert_eq!(fs::read_to_string(dest.path().join("notes.txt"))?, "remember the milk\n");

    let fresh = format!("{}/fresh/", dest_str);
    cellar(&project, &["cp", "/latest/notes.txt", &fresh]).assert_success()?;
    assert_eq!(fs::read_to_string(dest.path().join("fresh/notes.txt"))?, "remember the milk\n");

    cellar(&project, &["cp", "/latest/nothing*", &dest_str]).assert_failure()?;
    Ok(())
}

#[test]
fn test_less_uses_configured_pager() -> Result<()> {
    let project = packed()?;
    let result = cellar(&project, &["less", "/latest/notes.txt"]).assert_success()?;
    assert_eq!(result.stdout, "remember the milk\n");
    Ok(())
}

#[test]
fn test_ls_inside_archive() -> Result<()> {
    let project = packed()?;

    let result = cellar(&project, &["ls", "/latest", "--json"]).assert_success()?;
    let files: serde_json::Value = serde_json::from_str(&result.stdout)?;
    let paths: Vec<&str> = files
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|f| f["path"].as_str())
        .collect();
    assert_eq!(paths, vec!["keys/a.pem", "keys/b.pem", "notes.txt"]);
    assert_eq!(files[2]["size_bytes"], 18);
    Ok(())
}

#[test]
fn test_verify_batch_reports_failures() -> Result<()> {
    let project = packed()?;
    project.write_private("notes.txt", "changed\n")?;
    cellar(&project, &["pack"]).assert_success()?;

    let result = cellar(&project, &["verify", "--json"]).assert_success()?;
    let report: serde_json::Value = serde_json::from_str(&result.stdout)?;
    assert_eq!(report["results"].as_array().map(Vec::len), Some(2));

    fs::write(
        project.archive_dir().join("00000000000000000000000000.tar.gpg"),
        "garbage",
    )?;

    let result = cellar(&project, &["verify", "--json"]).assert_failure()?;
    let report: serde_json::Value = serde_json::from_str(&result.stdout)?;
    let valid: Vec<bool> = report["results"]
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|r| r["valid"].as_bool())
        .collect();
    assert_eq!(valid, vec![true, true, false]);
    assert!(result.stderr.contains("1 of 3 archives failed verification"));

    cellar(&project, &["verify", "0"]).assert_success()?;
    cellar(&project, &["verify", "2"]).assert_failure()?;
    assert!(project.scratch_is_clean());
    Ok(())
}

#[test]
fn test_restore_with_confirmation() -> Result<()> {
    let project = packed()?;
    project.write_private("notes.txt", "unsaved\n")?;
    project.write_private("stray.txt", "stray\n")?;

    let result = CellarCommand::new(project.root())
        .args(&["restore", "latest"])
        .stdin("n\n")
        .assert_success()?;
    assert!(result.stderr.contains("Restore cancelled"));
    assert_eq!(project.read_private("notes.txt")?, "unsaved\n");

    let result = CellarCommand::new(project.root())
        .args(&["restore", "latest"])
        .stdin("y\n")
        .assert_success()?;
    assert!(result.stdout.contains("Restored"));
    assert_eq!(project.read_private("notes.txt")?, "remember the milk\n");
    assert!(!project.private_dir().join("stray.txt").exists());
    Ok(())
}

#[test]
fn test_restore_json_with_yes() -> Result<()> {
    let project = packed()?;
    fs::remove_dir_all(project.private_dir())?;

    let result = cellar(&project, &["restore", "0", "--yes", "--json"]).assert_success()?;
    let outcome: serde_json::Value = serde_json::from_str(&result.stdout)?;
    assert_eq!(outcome["files"], 3);
    assert_eq!(project.read_private("keys/a.pem")?, "key a\n");
    Ok(())
}

#[test]
fn test_restore_default_needs_commit() -> Result<()> {
    let project = packed()?;
    let result = cellar(&project, &["restore", "--yes"]).assert_failure()?;
    assert!(result.stderr.contains("no committed archives"));
    Ok(())
}

#[test]
fn test_config_shows_effective_values() -> Result<()> {
    let project = TestProject::new()?;
    let result = cellar(&project, &["config"]).assert_success()?;

    let parsed: toml::Value = toml::from_str(&result.stdout)?;
    assert_eq!(parsed["suffix"].as_str(), Some(".tar.gpg"));
    assert_eq!(parsed["tools"]["pager"].as_str(), Some("cat"));
    assert!(result.stdout.contains("archives"));
    Ok(())
}

#[test]
fn test_root_discovered_from_subdirectory() -> Result<()> {
    let project = packed()?;
    let nested = project.private_dir().join("keys");

    let result = CellarCommand::new(&nested)
        .args(&["cat", "/latest/notes.txt"])
        .assert_success()?;
    assert_eq!(result.stdout, "remember the milk\n");

    let elsewhere = tempfile::TempDir::new()?;
    let root = project.root().to_string_lossy().into_owned();
    let result = CellarCommand::new(elsewhere.path())
        .args(&["--root", &root, "cat", "/latest/notes.txt"])
        .assert_success()?;
    assert_eq!(result.stdout, "remember the milk\n");
    Ok(())
}

#[test]
fn test_clean_outside_git_refuses() -> Result<()> {
    let project = packed()?;
    let result = cellar(&project, &["clean"]).assert_failure()?;
    assert!(result.stderr.contains("not inside a git work tree"));
    assert_eq!(project.archive_names().len(), 1);
    Ok(())
}
