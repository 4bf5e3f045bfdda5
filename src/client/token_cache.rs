use chrono::{DateTime, Duration, Utc};
use log::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedToken {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

impl CachedToken {
    pub fn new(value: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        CachedToken {
            value: value.into(),
            expires_at,
        }
    }

    /// Vendors commonly report expiry as epoch milliseconds.
    pub fn from_epoch_millis(value: impl Into<String>, expires_at_ms: i64) -> Option<Self> {
        DateTime::<Utc>::from_timestamp_millis(expires_at_ms).map(|expires_at| Self::new(value, expires_at))
    }
}

/// Time-bounded memo of one access token, owned by the client that uses it.
///
/// A token counts as expired `refresh_margin` before its real expiry so a
/// request started with it does not race the deadline.
#[derive(Debug, Clone)]
pub struct TokenCache {
    token: Option<CachedToken>,
    refresh_margin: Duration,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::with_margin(Duration::seconds(30))
    }

    pub fn with_margin(refresh_margin: Duration) -> Self {
        TokenCache {
            token: None,
            refresh_margin,
        }
    }

    pub fn get(&self, now: DateTime<Utc>) -> Option<&str> {
        self.token
            .as_ref()
            .filter(|token| now + self.refresh_margin < token.expires_at)
            .map(|token| token.value.as_str())
    }

    /// Returns the cached token, or calls `refresh` on a miss and caches
    /// its result. A failed refresh leaves the cache untouched.
    pub fn get_or_refresh<F, E>(&mut self, now: DateTime<Utc>, refresh: F) -> Result<String, E>
    where
        F: FnOnce() -> Result<CachedToken, E>,
    {
        if let Some(value) = self.get(now) {
            debug!("Using cached access token");
            return Ok(value.to_string());
        }

        info!("Fetching new access token");
        let token = refresh()?;
        let value = token.value.clone();
        debug!("Access token valid until {}", token.expires_at);
        self.token = Some(token);
        Ok(value)
    }

    pub fn invalidate(&mut self) {
        self.token = None;
    }
}

impl Default for TokenCache {
    fn default() -> Self {
        Self::new()
    }
}
