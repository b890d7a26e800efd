use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

use crate::runtime::error::ServiceError;

pub const USER_HAS_LOGOUT_KEY: &str = "UserHasLogout_{0}";
pub const REFRESH_TOKEN_KEY: &str = "JWTRefreshToken_{0}";
pub const REFRESH_TOKEN_EXPIRATION_KEY: &str = "JWTRefreshTokenExp_{0}";

pub fn cache_key(template: &str, email: &str) -> String {
    template.replace("{0}", email)
}

/// Shared key/value cache used for session bookkeeping.
pub trait DistributedCache {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str, ttl: Option<Duration>);
    fn remove(&self, key: &str);
}

#[derive(Debug, Default)]
pub struct InMemoryCache {
    entries: Mutex<HashMap<String, (String, Option<Instant>)>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DistributedCache for InMemoryCache {
    fn get(&self, key: &str) -> Option<String> {
        let mut entries = self.entries.lock().unwrap_or_else(|p| p.into_inner());
        match entries.get(key) {
            Some((_, Some(expires))) if *expires <= Instant::now() => {
                entries.remove(key);
                None
            }
            Some((value, _)) => Some(value.clone()),
            None => None,
        }
    }

    fn set(&self, key: &str, value: &str, ttl: Option<Duration>) {
        let expires = ttl.map(|t| Instant::now() + t);
        self.entries
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .insert(key.to_string(), (value.to_string(), expires));
    }

    fn remove(&self, key: &str) {
        self.entries
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .remove(key);
    }
}

/// Logout and refresh-token bookkeeping keyed by the user's email.
#[derive(Debug)]
pub struct LogoutHandler<C> {
    cache: C,
    logout_ttl: Option<Duration>,
}

impl<C: DistributedCache> LogoutHandler<C> {
    pub fn new(cache: C) -> Self {
        LogoutHandler {
            cache,
            logout_ttl: None,
        }
    }

    /// Keeps logout flags only for `ttl`, normally the access token lifetime.
    pub fn with_logout_ttl(mut self, ttl: Duration) -> Self {
        self.logout_ttl = Some(ttl);
        self
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    fn require_email(email: &str) -> Result<(), ServiceError> {
        if email.trim().is_empty() {
            return Err(ServiceError::security("user email is missing"));
        }
        Ok(())
    }

    /// Flags the user as logged out and drops their refresh token.
    pub fn logout(&self, email: &str) -> Result<(), ServiceError> {
        Self::require_email(email)?;
        self.cache
            .set(&cache_key(USER_HAS_LOGOUT_KEY, email), "true", self.logout_ttl);
        self.cache.remove(&cache_key(REFRESH_TOKEN_KEY, email));
        self.cache.remove(&cache_key(REFRESH_TOKEN_EXPIRATION_KEY, email));
        tracing::info!(email, "user logged out");
        Ok(())
    }

    pub fn check_user_is_not_logged_out(&self, email: &str) -> Result<(), ServiceError> {
        Self::require_email(email)?;
        if self.cache.get(&cache_key(USER_HAS_LOGOUT_KEY, email)).is_some() {
            return Err(ServiceError::security("user has logged out"));
        }
        Ok(())
    }

    /// Records a freshly issued refresh token and clears any logout flag.
    pub fn store_refresh_token(&self, email: &str, token: &str, expires_at: DateTime<Utc>) -> Result<(), ServiceError> {
        Self::require_email(email)?;
        self.cache.remove(&cache_key(USER_HAS_LOGOUT_KEY, email));
        self.cache.set(&cache_key(REFRESH_TOKEN_KEY, email), token, None);
        self.cache.set(
            &cache_key(REFRESH_TOKEN_EXPIRATION_KEY, email),
            &expires_at.to_rfc3339(),
            None,
        );
        Ok(())
    }

    /// Accepts `token` only if it is the stored, unexpired refresh token.
    pub fn validate_refresh_token(&self, email: &str, token: &str, now: DateTime<Utc>) -> Result<(), ServiceError> {
        self.check_user_is_not_logged_out(email)?;
        let stored = self.cache.get(&cache_key(REFRESH_TOKEN_KEY, email));
        if stored.as_deref() != Some(token) {
            return Err(ServiceError::security("refresh token does not match"));
        }
        let expires = self
            .cache
            .get(&cache_key(REFRESH_TOKEN_EXPIRATION_KEY, email))
            .and_then(|v| DateTime::parse_from_rfc3339(&v).ok())
            .map(|d| d.with_timezone(&Utc));
        match expires {
            Some(at) if at > now => Ok(()),
            _ => Err(ServiceError::security("refresh token has expired")),
        }
    }
}
