// Bearer token lifecycle for the client-credentials flow

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use serde::Deserialize;
use tokio::{
    sync::{Mutex, RwLock},
    time::Instant,
};
use tracing::{debug, info, warn};

use crate::{
    error::ApiError,
    transport::{HttpRequest, Method, RequestBody, Transport},
};

pub const TOKEN_ENDPOINT: &str = "/v1/security/oauth2/token";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub value: String,
    pub expires_at: Instant,
}

impl AccessToken {
    pub fn is_valid_at(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug, Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

pub struct TokenManager {
    transport: Arc<dyn Transport>,
    credentials: Credentials,
    safety_margin: Duration,
    cached: RwLock<Option<AccessToken>>,
    // Held for the whole exchange so concurrent expirers wait for one renewal.
    renewal: Mutex<()>,
    exchanges: AtomicUsize,
}

impl TokenManager {
    pub fn new(
        transport: Arc<dyn Transport>,
        credentials: Credentials,
        safety_margin: Duration,
    ) -> Self {
        Self {
            transport,
            credentials,
            safety_margin,
            cached: RwLock::new(None),
            renewal: Mutex::new(()),
            exchanges: AtomicUsize::new(0),
        }
    }

    pub async fn acquire_token(&self) -> Result<AccessToken, ApiError> {
        if let Some(token) = self.current().await {
            return Ok(token);
        }

        let _guard = self.renewal.lock().await;
        // Someone else may have renewed while we were queued on the lock.
        if let Some(token) = self.current().await {
            return Ok(token);
        }

        let token = self.exchange().await?;
        *self.cached.write().await = Some(token.clone());
        Ok(token)
    }

    /// Forget the cached token unconditionally.
    pub async fn invalidate(&self) {
        if self.cached.write().await.take().is_some() {
            warn!("Cached access token invalidated");
        }
    }

    /// Forget the cached token only if it is still the one the upstream rejected.
    /// A rejection that arrives after a renewal leaves the fresh token alone.
    pub async fn invalidate_if(&self, rejected: &str) -> bool {
        let mut cached = self.cached.write().await;
        match cached.as_ref() {
            Some(token) if token.value == rejected => {
                *cached = None;
                warn!("Rejected access token invalidated");
                true
            }
            _ => {
                debug!("Rejected access token already replaced");
                false
            }
        }
    }

    pub fn exchange_count(&self) -> usize {
        self.exchanges.load(Ordering::SeqCst)
    }

    async fn current(&self) -> Option<AccessToken> {
        self.cached
            .read()
            .await
            .as_ref()
            .filter(|token| token.is_valid_at(Instant::now()))
            .cloned()
    }

    async fn exchange(&self) -> Result<AccessToken, ApiError> {
        self.exchanges.fetch_add(1, Ordering::SeqCst);
        debug!("Requesting new access token");

        let mut request = HttpRequest::new(Method::Post, TOKEN_ENDPOINT);
        request.body = RequestBody::Form(vec![
            ("grant_type".to_string(), "client_credentials".to_string()),
            ("client_id".to_string(), self.credentials.client_id.clone()),
            (
                "client_secret".to_string(),
                self.credentials.client_secret.clone(),
            ),
        ]);

        let issued_at = Instant::now();
        let response = self.transport.send(request).await?;
        if !response.is_success() {
            return match response.status {
                400 | 401 | 403 => Err(ApiError::AuthFailure(format!(
                    "credentials rejected ({}): {}",
                    response.status,
                    response.text()
                ))),
                status => Err(ApiError::from_status(status, response.text())),
            };
        }

        let parsed: TokenResponse = serde_json::from_slice(&response.body)
            .map_err(|e| ApiError::AuthFailure(format!("unreadable token response: {e}")))?;

        let lifetime = Duration::from_secs(parsed.expires_in);
        if lifetime <= self.safety_margin {
            return Err(ApiError::AuthFailure(format!(
                "token lifetime of {}s does not exceed the {}s safety margin",
                parsed.expires_in,
                self.safety_margin.as_secs()
            )));
        }

        info!(expires_in = parsed.expires_in, "Access token renewed");
        Ok(AccessToken {
            value: parsed.access_token,
            expires_at: issued_at + lifetime - self.safety_margin,
        })
    }
}
