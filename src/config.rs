// Gateway configuration, loaded once at process start

use std::env;

use crate::error::ClientError;

pub const DEFAULT_BASE_URL: &str = "https://test.api.amadeus.com";

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub base_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub timeout_ms: u64,
    pub token_safety_margin_secs: u64,
    /// Cap on hotel ids handed to the offers query.
    pub max_hotels: usize,
    pub max_listed_hotels: usize,
    pub search_radius: u32,
    pub search_radius_unit: String,
    pub circuit_breaker_config: CircuitBreakerConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            client_id: String::new(),
            client_secret: String::new(),
            timeout_ms: 10_000,
            token_safety_margin_secs: 60,
            max_hotels: 5,
            max_listed_hotels: 20,
            search_radius: 5,
            search_radius_unit: "KM".to_string(),
            circuit_breaker_config: CircuitBreakerConfig::default(),
        }
    }
}

// Circuit breaker configuration
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    pub success_threshold: u32,
    pub reset_timeout_ms: u64,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            success_threshold: 1,
            reset_timeout_ms: 30_000,
        }
    }
}

impl GatewayConfig {
    /// Reads the process environment. Missing credentials are a startup error.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ClientError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let client_id = required(&lookup, "AMADEUS_CLIENT_ID")?;
        let client_secret = required(&lookup, "AMADEUS_CLIENT_SECRET")?;
        let base_url = lookup("AMADEUS_BASE_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(defaults.base_url);

        let config = Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client_id,
            client_secret,
            timeout_ms: parsed(&lookup, "HOTEL_GATEWAY_TIMEOUT_MS", defaults.timeout_ms)?,
            max_hotels: parsed(&lookup, "HOTEL_GATEWAY_MAX_HOTELS", defaults.max_hotels)?,
            ..defaults
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ClientError> {
        if self.client_id.is_empty() || self.client_secret.is_empty() {
            return Err(ClientError::ConfigError(
                "client id and client secret are required".to_string(),
            ));
        }
        if self.max_hotels == 0 {
            return Err(ClientError::ConfigError(
                "max_hotels must be at least 1".to_string(),
            ));
        }
        if self.timeout_ms == 0 {
            return Err(ClientError::ConfigError(
                "timeout_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

fn required<F>(lookup: &F, key: &str) -> Result<String, ClientError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ClientError::ConfigError(format!("missing environment variable {key}")))
}

fn parsed<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ClientError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ClientError::ConfigError(format!("{key} has invalid value {raw:?}"))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_missing_credentials_is_fatal() {
        let err = GatewayConfig::from_lookup(lookup_from(&[("AMADEUS_CLIENT_ID", "id")]))
            .unwrap_err();
        assert!(err.to_string().contains("AMADEUS_CLIENT_SECRET"));
    }

    #[test]
    fn test_env_overrides() {
        let config = GatewayConfig::from_lookup(lookup_from(&[
            ("AMADEUS_CLIENT_ID", "id"),
            ("AMADEUS_CLIENT_SECRET", "secret"),
            ("AMADEUS_BASE_URL", "http://localhost:9000/"),
            ("HOTEL_GATEWAY_MAX_HOTELS", "3"),
        ]))
        .unwrap();

        assert_eq!(config.base_url, "http://localhost:9000");
        assert_eq!(config.max_hotels, 3);
        assert_eq!(config.timeout_ms, 10_000);
        assert_eq!(config.token_safety_margin_secs, 60);
    }

    #[test]
    fn test_rejects_garbage_numbers() {
        let err = GatewayConfig::from_lookup(lookup_from(&[
            ("AMADEUS_CLIENT_ID", "id"),
            ("AMADEUS_CLIENT_SECRET", "secret"),
            ("HOTEL_GATEWAY_TIMEOUT_MS", "soon"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ClientError::ConfigError(_)));
    }
}
