//! Access-token providers.
//!
//! The wizard never inspects tokens; it asks the provider for one right
//! before each submission and hands it to the connector API.

use anyhow::{Context, Result};
use async_trait::async_trait;

/// Supplies the bearer token used for connector API calls.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn token(&self) -> Result<String>;
}

/// Fixed token (tests, service accounts).
#[derive(Clone, Debug)]
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn token(&self) -> Result<String> {
        Ok(self.token.clone())
    }
}

/// Reads the token from an environment variable on every call, so a token
/// rotated by the embedding process is picked up by the next submission.
#[derive(Clone, Debug)]
pub struct EnvTokenProvider {
    var: String,
}

impl EnvTokenProvider {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

#[async_trait]
impl TokenProvider for EnvTokenProvider {
    async fn token(&self) -> Result<String> {
        std::env::var(&self.var).with_context(|| format!("{} not set", self.var))
    }
}
