//! In-memory bearer-token sessions.
//!
//! Login hands out an opaque UUID token mapped to the [`Principal`]. Handlers
//! receive the principal through the [`FromRequestParts`] extractor below;
//! a missing, unknown or expired token is rejected with
//! [`Error::Unauthenticated`]. Sessions do not survive a restart.

use super::AppState;
use crate::{core::access::Principal, errors::Error};
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
};
use chrono::{DateTime, Duration, Utc};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Debug, Clone)]
struct Session {
    principal: Principal,
    expires_at: DateTime<Utc>,
}

/// Shared token → principal map.
#[derive(Debug, Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
    ttl: Duration,
}

impl SessionStore {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Issues a new token for `principal`.
    pub async fn create(&self, principal: Principal) -> String {
        let token = Uuid::new_v4().to_string();
        let session = Session {
            principal,
            expires_at: Utc::now() + self.ttl,
        };
        self.sessions.write().await.insert(token.clone(), session);
        token
    }

    /// Looks up a live session. Expired sessions are dropped on sight.
    pub async fn get(&self, token: &str) -> Option<Principal> {
        let now = Utc::now();
        {
            let sessions = self.sessions.read().await;
            match sessions.get(token) {
                Some(s) if s.expires_at > now => return Some(s.principal.clone()),
                None => return None,
                Some(_) => {}
            }
        }
        debug!("session expired");
        self.sessions.write().await.remove(token);
        None
    }

    /// Ends a session. Returns whether it existed.
    pub async fn remove(&self, token: &str) -> bool {
        self.sessions.write().await.remove(token).is_some()
    }

    /// Drops every expired session and returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| s.expires_at > now);
        let removed = before - sessions.len();
        if removed > 0 {
            info!(removed, "expired sessions purged");
        }
        removed
    }
}

/// Extracts the token from `Authorization: Bearer <token>`.
#[must_use]
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// The raw token of the current request, for logout.
#[derive(Debug, Clone)]
pub struct SessionToken(pub String);

#[async_trait]
impl FromRequestParts<AppState> for SessionToken {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &AppState) -> Result<Self, Self::Rejection> {
        bearer_token(&parts.headers)
            .map(|t| Self(t.to_string()))
            .ok_or(Error::Unauthenticated)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Principal {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or(Error::Unauthenticated)?;
        state.sessions.get(token).await.ok_or(Error::Unauthenticated)
    }
}
