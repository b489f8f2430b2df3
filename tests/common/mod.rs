#![allow(dead_code)]

use std::path::PathBuf;
use std::io::Read;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::{json, Value};
use tempfile::TempDir;

pub const TEST_SECRET: &str = "integration-test-secret";

/// A server process bound to a private port and users file; killed on drop.
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub users_file: PathBuf,
    child: Child,
    _dir: TempDir,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);
        let dir = TempDir::new().context("failed to create temp dir")?;
        let users_file = dir.path().join("users.json");

        let child = Command::new(env!("CARGO_BIN_EXE_recipe-auth"))
            .env("APP_ENV", "development")
            .env("AUTH_HOST", "127.0.0.1")
            .env("AUTH_PORT", port.to_string())
            .env("USERS_FILE", &users_file)
            .env("JWT_SECRET", TEST_SECRET)
            .env("BCRYPT_COST", "4")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit())
            .spawn()
            .context("failed to spawn server binary")?;

        Ok(Self {
            port,
            base_url,
            users_file,
            child,
            _dir: dir,
        })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == StatusCode::OK || resp.status() == StatusCode::SERVICE_UNAVAILABLE {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn register(&self, username: &str, password: &str) -> Result<reqwest::Response> {
        let res = reqwest::Client::new()
            .post(self.url("/auth/register"))
            .json(&json!({
                "username": username,
                "password": password,
                "email": format!("{}@example.com", username)
            }))
            .send()
            .await?;
        Ok(res)
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<reqwest::Response> {
        let res = reqwest::Client::new()
            .post(self.url("/auth/login"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await?;
        Ok(res)
    }

    /// Register then log in, returning the bearer token.
    pub async fn token_for(&self, username: &str, password: &str) -> Result<String> {
        let res = self.register(username, password).await?;
        anyhow::ensure!(res.status() == StatusCode::CREATED, "register failed: {}", res.status());

        let body = self.login(username, password).await?.json::<Value>().await?;
        body["data"]["token"]
            .as_str()
            .map(str::to_string)
            .with_context(|| format!("no token in login response: {}", body))
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

pub async fn start_server() -> Result<TestServer> {
    let server = TestServer::spawn()?;
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}

/// Settings the server reads that a test may want unset.
const SERVER_ENV_VARS: &[&str] = &[
    "APP_ENV",
    "JWT_SECRET",
    "JWT_EXPIRY_MINUTES",
    "BCRYPT_COST",
    "SECURITY_ENABLE_CORS",
    "SECURITY_CORS_ORIGINS",
];

/// Run the server with only `env` applied and wait for it to exit on its own.
///
/// Returns the exit status and captured stderr. Fails if the process is still
/// running after `timeout`.
pub async fn run_until_exit(env: &[(&str, &str)], timeout: Duration) -> Result<(ExitStatus, String)> {
    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let dir = TempDir::new().context("failed to create temp dir")?;

    let mut command = Command::new(env!("CARGO_BIN_EXE_recipe-auth"));
    for key in SERVER_ENV_VARS {
        command.env_remove(key);
    }
    command
        .env("AUTH_HOST", "127.0.0.1")
        .env("AUTH_PORT", port.to_string())
        .env("USERS_FILE", dir.path().join("users.json"))
        .envs(env.iter().copied())
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped());

    let mut child = command.spawn().context("failed to spawn server binary")?;

    let deadline = Instant::now() + timeout;
    let status = loop {
        if let Some(status) = child.try_wait()? {
            break status;
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            anyhow::bail!("server was still running after {:?}", timeout);
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    };

    let mut stderr = String::new();
    if let Some(mut pipe) = child.stderr.take() {
        pipe.read_to_string(&mut stderr)?;
    }

    Ok((status, stderr))
}
