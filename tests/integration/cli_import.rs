use anyhow::Result;
use predicates::prelude::*;

use crate::common::{Route, TestProject, TestServer, tar_gz};

#[test]
fn test_import_declared_local_globs() -> Result<()> {
    let project = TestProject::new()?;
    project.write_rules("rules: []\nimport:\n  - patterns/*.yml\n")?;
    project.create_file("patterns/b.yml", "b: 1")?;
    project.create_file("patterns/a.yml", "a: 1")?;
    project.create_file("patterns/.hidden.yml", "h: 1")?;

    let output = project.rulepack().arg("import").assert().success().get_output().stdout.clone();
    let stdout = String::from_utf8(output)?;

    let hidden = stdout.find(".hidden.yml (4 bytes)").expect("dotfile delivered");
    let a = stdout.find("a.yml (4 bytes)").expect("a.yml delivered");
    let b = stdout.find("b.yml (4 bytes)").expect("b.yml delivered");
    assert!(hidden < a && a < b, "unsorted output:\n{stdout}");
    assert!(stdout.contains("Loaded 3 unit(s) from 1 reference(s)"));
    Ok(())
}

#[test]
fn test_import_explicit_reference_with_content() -> Result<()> {
    let project = TestProject::new()?;
    project.create_file("extra/rules.yaml", "- id: extra.rule")?;

    project
        .rulepack()
        .args(["import", "extra/{rules,other}.yaml", "--show-content"])
        .assert()
        .success()
        .stdout(predicate::str::contains("rules.yaml (16 bytes)"))
        .stdout(predicate::str::contains("- id: extra.rule"));
    Ok(())
}

#[test]
fn test_import_local_archive() -> Result<()> {
    let project = TestProject::new()?;
    project.write_rules("import:\n  - vendor/pack.tgz\n")?;
    project.create_file("vendor/pack.tgz", tar_gz(&[("x.yml", "x: 1"), ("notes.md", "skip")]))?;

    project
        .rulepack()
        .arg("import")
        .assert()
        .success()
        .stdout(predicate::str::contains("x.yml (4 bytes)"))
        .stdout(predicate::str::contains("notes.md").not());
    Ok(())
}

#[test]
fn test_import_with_custom_config_path() -> Result<()> {
    let project = TestProject::new()?;
    project.create_file("ci/rulepack.yml", "import:\n  - local.yml\n")?;
    project.create_file("ci/local.yml", "ci: true")?;

    project
        .rulepack()
        .args(["import", "--config", "ci/rulepack.yml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("local.yml (8 bytes)"));
    Ok(())
}

#[test]
fn test_import_without_imports() -> Result<()> {
    let project = TestProject::new()?;
    project.write_rules("rules: []\n")?;

    project
        .rulepack()
        .arg("import")
        .assert()
        .success()
        .stdout(predicate::str::contains("No imports declared"));
    Ok(())
}

#[test]
fn test_missing_config_file() -> Result<()> {
    let project = TestProject::new()?;

    project
        .rulepack()
        .arg("import")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Configuration file not found"))
        .stderr(predicate::str::contains("--config"));
    Ok(())
}

#[test]
fn test_no_match_names_pattern() -> Result<()> {
    let project = TestProject::new()?;

    project
        .rulepack()
        .args(["import", "nothing/*.yml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No such file: nothing/*.yml"));
    Ok(())
}

#[test]
fn test_unsupported_scheme() -> Result<()> {
    let project = TestProject::new()?;

    project
        .rulepack()
        .args(["import", "ftp://example.test/rules.yml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unexpected URI schema: ftp"))
        .stderr(predicate::str::contains("file:// URI or an http(s):// URI"));
    Ok(())
}

#[test]
fn test_invalid_global_config_rejected() -> Result<()> {
    let project = TestProject::new()?;
    project.write_global_config("[import]\nexpire_in_secs = 5\n")?;
    project.create_file("a.yml", "a: 1")?;

    project
        .rulepack()
        .args(["import", "a.yml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse global config"));
    Ok(())
}

#[test]
fn test_remote_import_uses_cache() -> Result<()> {
    let project = TestProject::new()?;
    let server = TestServer::start()?;
    server.route("/rules.yml", Route::ok("r: 1"));
    let url = server.url("/rules.yml");

    for _ in 0..2 {
        project
            .rulepack()
            .args(["import", &url])
            .assert()
            .success()
            .stdout(predicate::str::contains(format!("{url} (4 bytes)")));
    }
    assert_eq!(server.hits("/rules.yml"), 1);

    project.rulepack().args(["import", &url, "--force-download"]).assert().success();
    assert_eq!(server.hits("/rules.yml"), 2);
    Ok(())
}

#[test]
fn test_remote_import_cache_dir_flag() -> Result<()> {
    let project = TestProject::new()?;
    let server = TestServer::start()?;
    server.route("/rules.yml", Route::ok("r: 1"));
    let custom_cache = project.project_path().join("custom-cache");

    project
        .rulepack()
        .args(["import", &server.url("/rules.yml"), "--cache-dir"])
        .arg(&custom_cache)
        .assert()
        .success();

    assert_eq!(std::fs::read_dir(&custom_cache)?.count(), 1);
    assert_eq!(project.cached_files(), 0);
    Ok(())
}

#[test]
fn test_remote_failure_reports_status() -> Result<()> {
    let project = TestProject::new()?;
    let server = TestServer::start()?;
    project.write_global_config("[import]\nretry_delay_ms = 10\n")?;
    let url = server.url("/gone.yml");

    project
        .rulepack()
        .args(["import", &url])
        .assert()
        .failure()
        .stderr(predicate::str::contains(format!("HTTP GET {url} => 404 Not Found")));
    assert_eq!(server.hits("/gone.yml"), 3);
    Ok(())
}

#[test]
fn test_verbose_logs_download_steps() -> Result<()> {
    let project = TestProject::new()?;
    let server = TestServer::start()?;
    server.route("/rules.yml", Route::ok("r: 1"));

    project
        .rulepack()
        .args(["--verbose", "import", &server.url("/rules.yml")])
        .assert()
        .success()
        .stderr(predicate::str::contains("Calculated cache name"))
        .stderr(predicate::str::contains("Downloading: no cache found"))
        .stderr(predicate::str::contains("Downloading content..."));
    Ok(())
}

#[test]
fn test_cache_dir_env_overrides_global_config() -> Result<()> {
    let project = TestProject::new()?;
    let server = TestServer::start()?;
    server.route("/rules.yml", Route::ok("r: 1"));
    let configured = project.project_path().join("configured-cache");
    project.write_global_config(&format!(
        "[import]\ncache_dir = {:?}\n",
        configured.to_string_lossy()
    ))?;

    project.rulepack().args(["import", &server.url("/rules.yml")]).assert().success();

    assert_eq!(project.cached_files(), 1);
    assert!(!configured.exists());
    Ok(())
}
