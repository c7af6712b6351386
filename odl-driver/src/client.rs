//! Client for the controller's northbound REST API.
//!
//! Every request carries basic credentials; the controller answers the first
//! one with a `JSESSIONID` cookie that the cookie jar replays afterwards. A
//! session older than `session_timeout` is dropped so the next request logs
//! in again.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::cookie::Jar;
use serde_json::Value;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

use crate::config::OdlConfig;
use crate::error::{DriverError, Result};

/// HTTP methods used against the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        })
    }
}

/// Controller-facing transport.
#[async_trait]
pub trait Controller: Send + Sync {
    /// Send one request. Error statuses listed in `ignore` count as success;
    /// any other error status fails with [`DriverError::Transport`].
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        ignore: &[u16],
    ) -> Result<()>;
}

/// Map a response status to the outcome of [`Controller::send`].
pub fn check_status(method: Method, path: &str, status: u16, ignore: &[u16]) -> Result<()> {
    if ignore.contains(&status) {
        return Ok(());
    }
    if status >= 400 {
        return Err(DriverError::Transport {
            method,
            path: path.to_string(),
            status,
        });
    }
    Ok(())
}

struct Session {
    http: reqwest::Client,
    started: Instant,
}

impl Session {
    fn open(timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .cookie_provider(Arc::new(Jar::default()))
            .timeout(timeout)
            .build()?;
        Ok(Self {
            http,
            started: Instant::now(),
        })
    }
}

/// reqwest-backed [`Controller`].
pub struct RestClient {
    base_url: String,
    username: String,
    password: String,
    timeout: Duration,
    session_timeout: Duration,
    session: RwLock<Session>,
}

impl RestClient {
    /// Create a client. Fails if a required connection option is missing.
    pub fn new(config: &OdlConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            base_url: config.url.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
            timeout: config.timeout,
            session_timeout: config.session_timeout,
            session: RwLock::new(Session::open(config.timeout)?),
        })
    }

    /// Absolute URL for a controller path.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// HTTP client of the current session, opening a new one if it expired.
    async fn http(&self) -> Result<reqwest::Client> {
        {
            let session = self.session.read().await;
            if session.started.elapsed() < self.session_timeout {
                return Ok(session.http.clone());
            }
        }

        let mut session = self.session.write().await;
        if session.started.elapsed() >= self.session_timeout {
            debug!("Controller session expired, re-authenticating");
            *session = Session::open(self.timeout)?;
        }
        Ok(session.http.clone())
    }
}

#[async_trait]
impl Controller for RestClient {
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        ignore: &[u16],
    ) -> Result<()> {
        let url = self.url(path);
        debug!(%method, %url, "Sending request to controller");

        let http = self.http().await?;
        let mut request = http
            .request(method.into(), &url)
            .basic_auth(&self.username, Some(&self.password));
        if let Some(body) = body {
            debug!(body = %body, "Request body");
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        debug!(%method, %url, status, "Controller responded");

        check_status(method, path, status, ignore)
    }
}
