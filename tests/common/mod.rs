//! Common test utilities and fixtures for rulepack integration tests
//!
//! - [`TestProject`]: an isolated project directory, cache directory and global
//!   config path, plus a preconfigured `rulepack` command
//! - [`TestServer`]: a minimal HTTP/1.1 server on a loopback port that serves
//!   scripted responses and counts requests per path

// Allow dead code because these utilities are used across different test files
// and not all utilities are used in every test file
#![allow(dead_code)]

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

/// Test project builder for creating isolated environments
pub struct TestProject {
    _temp_dir: TempDir, // Keep alive for RAII cleanup
    project_dir: PathBuf,
    cache_dir: PathBuf,
    global_config: PathBuf,
}

impl TestProject {
    /// Create a new test project with empty project and cache directories
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let project_dir = temp_dir.path().join("project");
        let cache_dir = temp_dir.path().join(".rulepack").join("cache");
        let global_config = temp_dir.path().join(".rulepack").join("config.toml");

        fs::create_dir_all(&project_dir)?;
        fs::create_dir_all(&cache_dir)?;

        Ok(Self {
            _temp_dir: temp_dir,
            project_dir,
            cache_dir,
            global_config,
        })
    }

    /// Get the project directory path
    pub fn project_path(&self) -> &Path {
        &self.project_dir
    }

    /// Get the cache directory path
    pub fn cache_path(&self) -> &Path {
        &self.cache_dir
    }

    /// Path of the project's `rulepack.yml`
    pub fn rules_path(&self) -> PathBuf {
        self.project_dir.join("rulepack.yml")
    }

    /// Write `rulepack.yml` to the project directory
    pub fn write_rules(&self, content: &str) -> Result<()> {
        let path = self.rules_path();
        fs::write(&path, content).with_context(|| format!("Failed to write rules to {path:?}"))
    }

    /// Write the global config file used by the `rulepack` command
    pub fn write_global_config(&self, content: &str) -> Result<()> {
        if let Some(parent) = self.global_config.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.global_config, content)?;
        Ok(())
    }

    /// Create a file relative to the project directory
    pub fn create_file(&self, path: &str, content: impl AsRef<[u8]>) -> Result<PathBuf> {
        let file_path = self.project_dir.join(path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&file_path, content)?;
        Ok(file_path)
    }

    /// A `rulepack` command running in the project directory with isolated
    /// cache and global config
    pub fn rulepack(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::Command::cargo_bin("rulepack").expect("rulepack binary");
        cmd.current_dir(&self.project_dir)
            .env("RULEPACK_CACHE_DIR", &self.cache_dir)
            .env("RULEPACK_CONFIG_PATH", &self.global_config)
            .env("NO_COLOR", "1")
            .env_remove("RUST_LOG");
        cmd
    }

    /// Number of files in the cache directory
    pub fn cached_files(&self) -> usize {
        fs::read_dir(&self.cache_dir).map(|entries| entries.count()).unwrap_or(0)
    }
}

/// One scripted HTTP response
#[derive(Debug, Clone)]
pub struct Route {
    status: u16,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
    delay: Option<Duration>,
}

impl Route {
    /// A response with `status` and `body`
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
            delay: None,
        }
    }

    /// `200 OK` with `body`
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self::new(200, body)
    }

    /// `302 Found` pointing at `location`
    pub fn redirect(location: &str) -> Self {
        Self::new(302, Vec::new()).header("Location", location)
    }

    /// Add a response header
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Wait before answering
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[derive(Default)]
struct ServerState {
    routes: HashMap<String, Vec<Route>>,
    hits: HashMap<String, usize>,
}

impl ServerState {
    fn respond(&mut self, path: &str) -> Route {
        let served = {
            let count = self.hits.entry(path.to_string()).or_insert(0);
            *count += 1;
            *count
        };

        match self.routes.get(path) {
            Some(responses) if !responses.is_empty() => {
                responses[(served - 1).min(responses.len() - 1)].clone()
            }
            _ => Route::new(404, "not found"),
        }
    }
}

/// Minimal HTTP/1.1 server for exercising the real HTTP client.
///
/// Runs on its own thread with its own runtime, so it keeps serving while a
/// test blocks on a child process. Every response closes the connection.
pub struct TestServer {
    base_url: String,
    state: Arc<Mutex<ServerState>>,
}

impl TestServer {
    /// Bind a loopback port and start serving
    pub fn start() -> Result<Self> {
        let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
        listener.set_nonblocking(true)?;
        let base_url = format!("http://{}", listener.local_addr()?);
        let state = Arc::new(Mutex::new(ServerState::default()));

        let server_state = Arc::clone(&state);
        std::thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("test server runtime");
            runtime.block_on(async move {
                let listener =
                    tokio::net::TcpListener::from_std(listener).expect("test server listener");
                while let Ok((stream, _)) = listener.accept().await {
                    tokio::spawn(handle_connection(stream, Arc::clone(&server_state)));
                }
            });
        });

        Ok(Self { base_url, state })
    }

    /// Absolute URL for `path` (which starts with `/`)
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Answer every request for `path` with `route`
    pub fn route(&self, path: &str, route: Route) {
        self.route_sequence(path, vec![route]);
    }

    /// Answer successive requests for `path` with `routes`, repeating the last one
    pub fn route_sequence(&self, path: &str, routes: Vec<Route>) {
        self.state.lock().unwrap().routes.insert(path.to_string(), routes);
    }

    /// Requests received for `path`
    pub fn hits(&self, path: &str) -> usize {
        self.state.lock().unwrap().hits.get(path).copied().unwrap_or(0)
    }
}

async fn handle_connection(mut stream: TcpStream, state: Arc<Mutex<ServerState>>) {
    let mut request = Vec::new();
    let mut chunk = [0u8; 1024];
    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => request.extend_from_slice(&chunk[..n]),
        }
    }

    let request = String::from_utf8_lossy(&request);
    let path = request
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("/")
        .to_string();

    let route = state.lock().unwrap().respond(&path);
    if let Some(delay) = route.delay {
        tokio::time::sleep(delay).await;
    }

    let mut head = format!(
        "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nConnection: close\r\n",
        route.status,
        reason_phrase(route.status),
        route.body.len()
    );
    for (name, value) in &route.headers {
        head.push_str(&format!("{name}: {value}\r\n"));
    }
    head.push_str("\r\n");

    let _ = stream.write_all(head.as_bytes()).await;
    let _ = stream.write_all(&route.body).await;
    let _ = stream.shutdown().await;
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        301 => "Moved Permanently",
        302 => "Found",
        404 => "Not Found",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}

/// Build an in-memory `.tar.gz` from `(path, content)` pairs
pub fn tar_gz(files: &[(&str, &str)]) -> Vec<u8> {
    rulepack_cli::test_utils::build_tar_gz(files)
}
