//! Bearer token lifecycle
//!
//! Holds the current token and its estimated expiry behind a reader/writer
//! lock. Before each call the token is checked under the read lock; a stale
//! token escalates to the write lock, is re-checked, and only then refreshed
//! through the injected [`TokenRefresher`]. Concurrent callers racing on a
//! stale token therefore trigger exactly one refresh; everybody else observes
//! the freshly written token once the write lock is released.
//!
//! Expiry is not read from the token itself: a refreshed token is assumed to
//! live for the configured TTL (one hour by default).

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use berth_domain::{BerthError, Result};
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Source of fresh bearer tokens.
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    /// Obtain a new token.
    ///
    /// # Errors
    /// Any error is reported to callers as a connection-class failure.
    async fn refresh(&self) -> Result<String>;
}

#[derive(Default)]
struct TokenState {
    token: Option<String>,
    expires_at: Option<DateTime<Utc>>,
}

impl TokenState {
    fn is_stale(&self, threshold: chrono::Duration) -> bool {
        match (&self.token, self.expires_at) {
            (None, _) => true,
            (Some(_), Some(expires_at)) => Utc::now() + threshold >= expires_at,
            (Some(_), None) => false,
        }
    }
}

/// Token holder with lazy, deduplicated refresh.
pub struct TokenManager {
    state: RwLock<TokenState>,
    refresher: Option<Arc<dyn TokenRefresher>>,
    ttl: chrono::Duration,
    refresh_threshold: chrono::Duration,
}

impl TokenManager {
    /// A fixed token that never expires and is never refreshed.
    pub fn fixed(token: impl Into<String>) -> Self {
        Self {
            state: RwLock::new(TokenState { token: Some(token.into()), expires_at: None }),
            refresher: None,
            ttl: chrono::Duration::zero(),
            refresh_threshold: chrono::Duration::zero(),
        }
    }

    /// No token at all; requests are sent without an `Authorization` header.
    pub fn anonymous() -> Self {
        Self {
            state: RwLock::new(TokenState::default()),
            refresher: None,
            ttl: chrono::Duration::zero(),
            refresh_threshold: chrono::Duration::zero(),
        }
    }

    /// A refreshing manager.
    ///
    /// # Arguments
    /// * `initial` - Token to use until it goes stale; `None` refreshes on
    ///   first use
    /// * `refresher` - Callback producing fresh tokens
    /// * `ttl` - Assumed lifetime of each new token
    /// * `refresh_threshold` - Refresh this long before the assumed expiry
    pub fn refreshing(
        initial: Option<String>,
        refresher: Arc<dyn TokenRefresher>,
        ttl: Duration,
        refresh_threshold: Duration,
    ) -> Self {
        let ttl = to_chrono(ttl);
        let expires_at = initial.as_ref().map(|_| Utc::now() + ttl);
        Self {
            state: RwLock::new(TokenState { token: initial, expires_at }),
            refresher: Some(refresher),
            ttl,
            refresh_threshold: to_chrono(refresh_threshold),
        }
    }

    /// Current token, refreshing first when it is missing or about to expire.
    ///
    /// Returns `Ok(None)` for anonymous managers.
    ///
    /// # Errors
    /// Returns [`BerthError::Connection`] when the refresh callback fails.
    pub async fn access_token(&self) -> Result<Option<String>> {
        let Some(refresher) = &self.refresher else {
            return Ok(self.state.read().await.token.clone());
        };

        {
            let state = self.state.read().await;
            if !state.is_stale(self.refresh_threshold) {
                return Ok(state.token.clone());
            }
        }

        let mut state = self.state.write().await;
        // Another caller may have refreshed while we waited for the write lock.
        if !state.is_stale(self.refresh_threshold) {
            debug!("token refreshed by a concurrent caller");
            return Ok(state.token.clone());
        }

        let token = refresher.refresh().await.map_err(|err| {
            warn!(error = %err, "token refresh failed");
            match err {
                BerthError::Connection(_) | BerthError::Cancelled => err,
                other => BerthError::Connection(format!("token refresh failed: {other}")),
            }
        })?;

        state.token = Some(token.clone());
        state.expires_at = Some(Utc::now() + self.ttl);
        info!(ttl_secs = self.ttl.num_seconds(), "refreshed access token");

        Ok(Some(token))
    }

    /// Whether a refresh callback is attached.
    pub const fn can_refresh(&self) -> bool {
        self.refresher.is_some()
    }

    /// Estimated expiry of the current token, if known.
    pub async fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.state.read().await.expires_at
    }
}

impl fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenManager")
            .field("refreshing", &self.refresher.is_some())
            .field("ttl_secs", &self.ttl.num_seconds())
            .field("refresh_threshold_secs", &self.refresh_threshold.num_seconds())
            .finish_non_exhaustive()
    }
}

fn to_chrono(duration: Duration) -> chrono::Duration {
    chrono::Duration::from_std(duration).unwrap_or_else(|_| chrono::Duration::days(3650))
}
