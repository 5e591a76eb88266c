// Authenticated request gateway: every upstream data call passes through `execute`

use std::{sync::Arc, time::Duration};

use parking_lot::Mutex;
use serde_json::Value;
use tokio::time::Instant;
use tracing::{debug, instrument, warn};

use crate::{
    circuit_breaker::{BreakerState, CircuitBreaker},
    config::GatewayConfig,
    error::ApiError,
    token::TokenManager,
    transport::{HttpRequest, Method, RequestBody, Transport},
};

pub struct Gateway {
    transport: Arc<dyn Transport>,
    tokens: Arc<TokenManager>,
    breaker: Mutex<CircuitBreaker>,
    timeout: Duration,
}

impl Gateway {
    pub fn new(
        transport: Arc<dyn Transport>,
        tokens: Arc<TokenManager>,
        config: &GatewayConfig,
    ) -> Self {
        Self {
            transport,
            tokens,
            breaker: Mutex::new(CircuitBreaker::from_config(&config.circuit_breaker_config)),
            timeout: Duration::from_millis(config.timeout_ms),
        }
    }

    pub fn tokens(&self) -> &TokenManager {
        &self.tokens
    }

    pub fn breaker_state(&self) -> BreakerState {
        self.breaker.lock().state()
    }

    pub async fn get(&self, endpoint: &str, query: Vec<(String, String)>) -> Result<Value, ApiError> {
        self.execute(endpoint, Method::Get, query, None).await
    }

    pub async fn post_json(&self, endpoint: &str, body: Value) -> Result<Value, ApiError> {
        self.execute(endpoint, Method::Post, Vec::new(), Some(body)).await
    }

    /// Performs one authenticated call and returns the parsed JSON body verbatim.
    /// No retries happen here; callers decide what a failure means.
    #[instrument(skip(self, query, body))]
    pub async fn execute(
        &self,
        endpoint: &str,
        method: Method,
        query: Vec<(String, String)>,
        body: Option<Value>,
    ) -> Result<Value, ApiError> {
        let token = self.tokens.acquire_token().await?;

        let blocked = {
            let mut breaker = self.breaker.lock();
            if breaker.should_allow_call() {
                None
            } else {
                Some(breaker.retry_after().unwrap_or_default())
            }
        };
        if let Some(retry_after) = blocked {
            warn!(endpoint, retry_after_ms = retry_after.as_millis() as u64, "Circuit breaker open, failing fast");
            return Err(ApiError::CircuitBreakerOpen {
                service_name: endpoint.to_string(),
                retry_after_ms: retry_after.as_millis() as u64,
            });
        }

        let mut request = HttpRequest::new(method, endpoint);
        request.query = query;
        request
            .headers
            .push(("Authorization".to_string(), format!("Bearer {}", token.value)));
        request
            .headers
            .push(("Accept".to_string(), "application/json".to_string()));
        if let Some(body) = body {
            request
                .headers
                .push(("Content-Type".to_string(), "application/json".to_string()));
            request.body = RequestBody::Json(body);
        }

        let started = Instant::now();
        let outcome = match tokio::time::timeout(self.timeout, self.transport.send(request)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(ApiError::Timeout(self.timeout.as_millis() as u64)),
        };

        let result = match outcome {
            Ok(response) if response.is_success() => {
                debug!(
                    endpoint,
                    status = response.status,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Upstream call succeeded"
                );
                serde_json::from_slice::<Value>(&response.body)
                    .map_err(|e| ApiError::Decode(format!("{endpoint}: {e}")))
            }
            Ok(response) => {
                if response.status == 401 {
                    self.tokens.invalidate_if(&token.value).await;
                }
                Err(ApiError::from_status(response.status, response.text()))
            }
            Err(e) => Err(e),
        };

        self.record(&result);
        if let Err(e) = &result {
            warn!(
                endpoint,
                elapsed_ms = started.elapsed().as_millis() as u64,
                error = %e,
                "Upstream call failed"
            );
        }
        result
    }

    fn record(&self, result: &Result<Value, ApiError>) {
        let mut breaker = self.breaker.lock();
        match result {
            Err(e) if e.classification().map_or(false, |c| c.trips_breaker()) => breaker.fail(),
            _ => breaker.success(),
        }
    }
}
