//! Connection configuration and driver options.

use std::fmt;
use std::time::Duration;

use crate::error::{DriverError, Result};
use crate::filter::FilterPolicy;

/// Default controller request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default lifetime of a controller session before re-authenticating.
pub const DEFAULT_SESSION_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Controller connection parameters.
#[derive(Clone)]
pub struct OdlConfig {
    /// Base URL of the controller's northbound API.
    pub url: String,
    pub username: String,
    pub password: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Session cookie lifetime.
    pub session_timeout: Duration,
}

impl OdlConfig {
    pub fn new(
        url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            username: username.into(),
            password: password.into(),
            timeout: DEFAULT_TIMEOUT,
            session_timeout: DEFAULT_SESSION_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_session_timeout(mut self, session_timeout: Duration) -> Self {
        self.session_timeout = session_timeout;
        self
    }

    /// Reject a configuration with an empty required option.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("url", &self.url),
            ("username", &self.username),
            ("password", &self.password),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(DriverError::Config(name));
            }
        }
        Ok(())
    }
}

impl fmt::Debug for OdlConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OdlConfig")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &"***")
            .field("timeout", &self.timeout)
            .field("session_timeout", &self.session_timeout)
            .finish()
    }
}

/// What a full resync does when an existence probe fails with something
/// other than 404.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProbeFailurePolicy {
    /// End the pass with the first failure.
    #[default]
    Abort,
    /// Skip the resource, finish the pass, then report the first failure.
    Continue,
}

/// Behaviour knobs of one driver instance.
#[derive(Debug, Clone, Default)]
pub struct DriverOptions {
    pub probe_failure: ProbeFailurePolicy,
    pub filter: FilterPolicy,
}
