use std::error::Error;
use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

fn cli(project: &std::path::Path, global: &std::path::Path) -> Result<Command, Box<dyn Error>> {
    let mut cmd = Command::cargo_bin("rustfavorites-cli")?;
    cmd.arg("--project")
        .arg(project)
        .arg("--global-dir")
        .arg(global);
    Ok(cmd)
}

#[test]
fn create_group_add_file_and_list() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let global = dir.path().join("global");

    cli(dir.path(), &global)?
        .args(["group", "create", "Backend", "--description", "API work"])
        .assert()
        .success()
        .stdout(predicate::str::contains("created group 'Backend'"));

    cli(dir.path(), &global)?
        .args(["file", "add", "Backend", "src/api.rs", "--line", "42"])
        .assert()
        .success();

    cli(dir.path(), &global)?
        .args(["group", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Backend"))
        .stdout(predicate::str::contains("src/api.rs:42"));

    // The document landed in the project state directory.
    assert!(dir.path().join(".rustfavorites/favorites.json").exists());
    Ok(())
}

#[test]
fn duplicate_file_in_same_group_is_refused() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let global = dir.path().join("global");

    cli(dir.path(), &global)?
        .args(["group", "create", "Docs"])
        .assert()
        .success();
    cli(dir.path(), &global)?
        .args(["file", "add", "Docs", "README.md"])
        .assert()
        .success();

    cli(dir.path(), &global)?
        .args(["file", "add", "Docs", "README.md"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already in that group"));
    Ok(())
}

#[test]
fn line_zero_is_rejected() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let global = dir.path().join("global");

    cli(dir.path(), &global)?
        .args(["group", "create", "Docs"])
        .assert()
        .success();

    cli(dir.path(), &global)?
        .args(["file", "add", "Docs", "README.md", "--line", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value '0'"));

    // Nothing was stored for the rejected invocation.
    cli(dir.path(), &global)?
        .args(["file", "add", "Docs", "README.md", "--line", "1"])
        .assert()
        .success();
    Ok(())
}

#[test]
fn invalid_group_name_is_rejected() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let global = dir.path().join("global");

    cli(dir.path(), &global)?
        .args(["group", "create", "bad/name"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("letters, numbers, spaces"));
    Ok(())
}

#[test]
fn export_then_merge_import_into_fresh_project() -> Result<(), Box<dyn Error>> {
    let source = tempdir()?;
    let global = source.path().join("global");

    cli(source.path(), &global)?
        .args(["group", "create", "Shared"])
        .assert()
        .success();
    cli(source.path(), &global)?
        .args(["file", "add", "Shared", "lib.rs"])
        .assert()
        .success();

    let export_path = source.path().join("favorites-export.json");
    cli(source.path(), &global)?
        .args(["export", "--output"])
        .arg(&export_path)
        .assert()
        .success();

    let target = tempdir()?;
    let target_global = target.path().join("global");
    cli(target.path(), &target_global)?
        .args(["group", "create", "Local"])
        .assert()
        .success();

    cli(target.path(), &target_global)?
        .arg("import")
        .arg(&export_path)
        .args(["--policy", "merge"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 groups added"));

    cli(target.path(), &target_global)?
        .args(["group", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Local"))
        .stdout(predicate::str::contains("Shared"));
    Ok(())
}

#[test]
fn replace_import_rejects_documents_without_a_version() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let global = dir.path().join("global");
    let payload = dir.path().join("broken.json");
    fs::write(&payload, "{\"groups\": []}")?;

    cli(dir.path(), &global)?
        .arg("import")
        .arg(&payload)
        .args(["--policy", "replace"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("import rejected"));
    Ok(())
}

#[test]
fn config_set_switches_storage_backend() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let global = dir.path().join("global");

    cli(dir.path(), &global)?
        .args(["config", "set", "storage-location", "global"])
        .assert()
        .success();

    cli(dir.path(), &global)?
        .args(["group", "create", "Everywhere"])
        .assert()
        .success();

    // Written to the global state file, not the project directory.
    assert!(global.join("global-state.json").exists());
    assert!(!dir.path().join(".rustfavorites/favorites.json").exists());

    cli(dir.path(), &global)?
        .args(["config", "get"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"storage_location\": \"global\""));
    Ok(())
}

#[test]
fn move_between_groups_via_the_cli() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let global = dir.path().join("global");

    for name in ["A", "B"] {
        cli(dir.path(), &global)?
            .args(["group", "create", name])
            .assert()
            .success();
    }
    cli(dir.path(), &global)?
        .args(["file", "add", "A", "z.rs"])
        .assert()
        .success();

    cli(dir.path(), &global)?
        .args(["move", "A", "B", "z.rs", "--kind", "file"])
        .assert()
        .failure();

    // Items move by id, not path; grab it from the exported document.
    let exported = dir.path().join("dump.json");
    cli(dir.path(), &global)?
        .args(["export", "--output"])
        .arg(&exported)
        .assert()
        .success();
    let doc: serde_json::Value = serde_json::from_str(&fs::read_to_string(&exported)?)?;
    let file_id = doc["groups"][0]["files"][0]["id"]
        .as_str()
        .expect("file id")
        .to_string();

    cli(dir.path(), &global)?
        .args(["move", "A", "B", &file_id, "--kind", "file"])
        .assert()
        .success()
        .stdout(predicate::str::contains("moved"));
    Ok(())
}
