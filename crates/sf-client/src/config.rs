//! Transport configuration.

use std::time::Duration;

use crate::error::{Error, ErrorKind, Result};

/// Settings for [`SfHttpClient`](crate::SfHttpClient).
///
/// `timeout` bounds each attempt at the reqwest level; a [`RequestContext`]
/// deadline, when set, bounds the whole exchange on top of it. Failed
/// requests are not retried.
///
/// [`RequestContext`]: crate::RequestContext
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub pool_idle_timeout: Duration,
    pub pool_max_idle_per_host: usize,
    /// Send `Accept-Encoding: gzip, deflate` and decode transparently.
    pub accept_compressed: bool,
    pub user_agent: String,
    /// Log every request and response at `debug`, non-success at `info`.
    pub enable_tracing: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            pool_idle_timeout: Duration::from_secs(90),
            pool_max_idle_per_host: 10,
            accept_compressed: true,
            user_agent: crate::USER_AGENT.to_string(),
            enable_tracing: true,
        }
    }
}

impl ClientConfig {
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Reject settings reqwest would accept but that make every call fail.
    pub fn validate(&self) -> Result<()> {
        if self.timeout.is_zero() {
            return Err(Error::new(ErrorKind::Config(
                "timeout must be greater than zero".to_string(),
            )));
        }
        if self.connect_timeout.is_zero() {
            return Err(Error::new(ErrorKind::Config(
                "connect_timeout must be greater than zero".to_string(),
            )));
        }
        if self.user_agent.trim().is_empty() || self.user_agent.chars().any(char::is_control) {
            return Err(Error::new(ErrorKind::Config(format!(
                "user_agent is not a valid header value: {:?}",
                self.user_agent
            ))));
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    pub fn with_pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.config.pool_idle_timeout = timeout;
        self
    }

    pub fn with_pool_max_idle(mut self, max: usize) -> Self {
        self.config.pool_max_idle_per_host = max;
        self
    }

    /// Disable to receive raw bodies, e.g. when debugging with a proxy.
    pub fn with_compression(mut self, enabled: bool) -> Self {
        self.config.accept_compressed = enabled;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.config.enable_tracing = enabled;
        self
    }

    pub fn build(self) -> ClientConfig {
        self.config
    }
}
