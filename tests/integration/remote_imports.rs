use anyhow::Result;
use rulepack_cli::cache::CacheStore;
use rulepack_cli::config::ImportSettings;
use rulepack_cli::core::ImportError;
use rulepack_cli::import::ImportLoader;

use crate::common::{Route, TestProject, TestServer, tar_gz};

fn settings() -> ImportSettings {
    ImportSettings {
        retry_delay_ms: 10,
        ..ImportSettings::default()
    }
}

fn loader(project: &TestProject, force_download: bool) -> Result<ImportLoader> {
    Ok(ImportLoader::from_settings(
        project.rules_path(),
        &settings(),
        project.cache_path(),
        force_download,
    )?)
}

async fn load_all(loader: &ImportLoader, reference: &str) -> Result<Vec<(String, String)>> {
    let mut units = Vec::new();
    loader
        .load(reference, |content, source_name| {
            units.push((source_name.to_string(), content.to_string()));
            Ok(())
        })
        .await?;
    Ok(units)
}

#[tokio::test]
async fn test_remote_file_cached_between_calls() -> Result<()> {
    let project = TestProject::new()?;
    let server = TestServer::start()?;
    server.route("/rules.yml", Route::ok("- id: remote.rule\n"));
    let url = server.url("/rules.yml");
    let loader = loader(&project, false)?;

    let first = load_all(&loader, &url).await?;
    let second = load_all(&loader, &url).await?;

    assert_eq!(first, vec![(url.clone(), "- id: remote.rule\n".to_string())]);
    assert_eq!(first, second);
    assert_eq!(server.hits("/rules.yml"), 1);
    assert!(project.cache_path().join(CacheStore::cache_key(&url)).is_file());
    Ok(())
}

#[tokio::test]
async fn test_force_download_bypasses_cache() -> Result<()> {
    let project = TestProject::new()?;
    let server = TestServer::start()?;
    server.route_sequence("/rules.yml", vec![Route::ok("v: 1"), Route::ok("v: 2")]);
    let url = server.url("/rules.yml");

    load_all(&loader(&project, false)?, &url).await?;
    let refreshed = load_all(&loader(&project, true)?, &url).await?;
    let cached = load_all(&loader(&project, false)?, &url).await?;

    assert_eq!(refreshed[0].1, "v: 2");
    assert_eq!(cached[0].1, "v: 2");
    assert_eq!(server.hits("/rules.yml"), 2);
    Ok(())
}

#[tokio::test]
async fn test_remote_archive_pack() -> Result<()> {
    let project = TestProject::new()?;
    let server = TestServer::start()?;
    server.route(
        "/pack.tar.gz",
        Route::ok(tar_gz(&[
            ("pack/a.yaml", "a: 1"),
            ("pack/b.yml", "b: 1"),
            ("pack/readme.txt", "hello"),
            ("pack/rulepack.yml", "import: []"),
        ])),
    );
    let url = server.url("/pack.tar.gz");
    let loader = loader(&project, false)?;

    let first = load_all(&loader, &url).await?;
    assert_eq!(
        first,
        vec![
            ("pack/a.yaml".to_string(), "a: 1".to_string()),
            ("pack/b.yml".to_string(), "b: 1".to_string()),
        ]
    );
    for member in ["pack/a.yaml", "pack/b.yml"] {
        let key = CacheStore::cache_key(&format!("{url}/{member}"));
        assert!(project.cache_path().join(key).is_file(), "{member} not cached");
    }
    // Two members plus the raw archive
    assert_eq!(project.cached_files(), 3);

    let second = load_all(&loader, &url).await?;
    assert_eq!(second, first);
    assert_eq!(server.hits("/pack.tar.gz"), 1);
    Ok(())
}

#[tokio::test]
async fn test_redirected_download_cached_under_requested_uri() -> Result<()> {
    let project = TestProject::new()?;
    let server = TestServer::start()?;
    server.route("/latest.yml", Route::redirect("/v2/rules.yml"));
    server.route("/v2/rules.yml", Route::ok("v: 2"));
    let url = server.url("/latest.yml");

    let units = load_all(&loader(&project, false)?, &url).await?;

    assert_eq!(units, vec![(url.clone(), "v: 2".to_string())]);
    assert!(project.cache_path().join(CacheStore::cache_key(&url)).is_file());
    Ok(())
}

#[tokio::test]
async fn test_failed_download_surfaces_last_error() -> Result<()> {
    let project = TestProject::new()?;
    let server = TestServer::start()?;
    server.route("/down.yml", Route::new(503, "maintenance"));

    let err = load_all(&loader(&project, false)?, &server.url("/down.yml"))
        .await
        .unwrap_err();

    match err.downcast_ref::<ImportError>() {
        Some(ImportError::HttpGet { status, .. }) => assert_eq!(*status, 503),
        other => panic!("expected HttpGet, got {other:?}"),
    }
    assert_eq!(server.hits("/down.yml"), 3);
    assert_eq!(project.cached_files(), 0);
    Ok(())
}
