use super::app_error::AppError;
use super::state::HttpServerState;
use crate::config::MetricHubConfig;
use crate::datamodel::UserId;
use anyhow::{Context, Result, bail};
use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;
use std::collections::HashMap;
use std::fmt::Debug;

/// Resolves a bearer token to the id of the user it belongs to.
pub trait Authenticator: Send + Sync + Debug {
    fn authenticate(&self, token: &str) -> Option<UserId>;
}

/// Fixed set of API tokens.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct StaticTokenAuthenticator {
    tokens: HashMap<String, UserId>,
}

impl StaticTokenAuthenticator {
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = (S, UserId)>,
        S: Into<String>,
    {
        Self {
            tokens: tokens
                .into_iter()
                .map(|(token, user_id)| (token.into(), user_id))
                .collect(),
        }
    }

    /// Parses comma separated `token=user_id` pairs. Blank entries are skipped.
    pub fn parse(raw: &str) -> Result<Self> {
        let mut tokens = HashMap::new();
        for entry in raw.split(',') {
            let entry = entry.trim();
            if entry.is_empty() {
                continue;
            }
            let Some((token, user_id)) = entry.split_once('=') else {
                bail!("Invalid API token entry, expected token=user_id");
            };
            let token = token.trim();
            if token.is_empty() {
                bail!("Invalid API token entry, the token is empty");
            }
            let user_id: UserId = user_id
                .trim()
                .parse()
                .context("Invalid user id in API token entry")?;
            tokens.insert(token.to_string(), user_id);
        }
        Ok(Self { tokens })
    }

    pub fn from_config(config: &MetricHubConfig) -> Result<Self> {
        match &config.api_tokens {
            Some(raw) => Self::parse(raw),
            None => Ok(Self::default()),
        }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl Debug for StaticTokenAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Tokens are secrets
        f.debug_struct("StaticTokenAuthenticator")
            .field("tokens", &self.tokens.len())
            .finish()
    }
}

impl Authenticator for StaticTokenAuthenticator {
    fn authenticate(&self, token: &str) -> Option<UserId> {
        self.tokens.get(token).copied()
    }
}

/// The caller, as identified by its bearer token.
///
/// Rejects the request with 401 before the handler runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser(pub UserId);

fn presented_bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}

impl FromRequestParts<HttpServerState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &HttpServerState,
    ) -> Result<Self, Self::Rejection> {
        let token = presented_bearer_token(parts).ok_or(AppError::Unauthorized)?;
        state
            .authenticator
            .authenticate(token)
            .map(AuthenticatedUser)
            .ok_or(AppError::Unauthorized)
    }
}
