// In-process stand-in for the hotel inventory API, used by tests and benchmarks

use std::{
    sync::atomic::{AtomicBool, AtomicU64, AtomicU8, AtomicUsize, Ordering},
    time::Duration,
};

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::{DashMap, DashSet};
use parking_lot::Mutex;
use serde_json::{json, Value};

use crate::{
    error::ApiError,
    token::TOKEN_ENDPOINT,
    transport::{HttpRequest, HttpResponse, Method, Transport},
};

#[derive(Debug, Clone, Copy)]
pub enum ServerMode {
    Normal,
    CompleteOutage,
}

#[derive(Debug, Clone)]
struct MockRoute {
    status: u16,
    body: Bytes,
}

pub struct MockServer {
    mode: AtomicU8,
    routes: DashMap<(Method, String), MockRoute>,
    issued_tokens: DashSet<String>,
    token_requests: AtomicUsize,
    token_lifetime_secs: AtomicU64,
    reject_credentials: AtomicBool,
    fail_next_requests: AtomicUsize,
    delay_ms: AtomicU64,
    recent_requests: Mutex<Vec<HttpRequest>>,
}

impl Default for MockServer {
    fn default() -> Self {
        Self::new()
    }
}

impl MockServer {
    pub fn new() -> Self {
        Self {
            mode: AtomicU8::new(0),
            routes: DashMap::new(),
            issued_tokens: DashSet::new(),
            token_requests: AtomicUsize::new(0),
            token_lifetime_secs: AtomicU64::new(1799),
            reject_credentials: AtomicBool::new(false),
            fail_next_requests: AtomicUsize::new(0),
            delay_ms: AtomicU64::new(0),
            recent_requests: Mutex::new(Vec::new()),
        }
    }

    pub fn set_mode(&self, mode: ServerMode) {
        let mode_value = match mode {
            ServerMode::Normal => 0,
            ServerMode::CompleteOutage => 1,
        };
        self.mode.store(mode_value, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay_ms: u64) {
        self.delay_ms.store(delay_ms, Ordering::SeqCst);
    }

    pub fn set_token_lifetime(&self, secs: u64) {
        self.token_lifetime_secs.store(secs, Ordering::SeqCst);
    }

    pub fn reject_credentials(&self, reject: bool) {
        self.reject_credentials.store(reject, Ordering::SeqCst);
    }

    /// The next `count` requests, token exchanges included, answer 500.
    pub fn fail_next_requests(&self, count: usize) {
        self.fail_next_requests.store(count, Ordering::SeqCst);
    }

    /// Every token issued so far is answered with 401 from now on.
    pub fn revoke_tokens(&self) {
        self.issued_tokens.clear();
    }

    pub fn add_response(&self, method: Method, path: &str, status: u16, body: Value) {
        self.routes.insert(
            (method, path.to_string()),
            MockRoute {
                status,
                body: Bytes::from(body.to_string()),
            },
        );
    }

    pub fn add_raw_response(&self, method: Method, path: &str, status: u16, body: &str) {
        self.routes.insert(
            (method, path.to_string()),
            MockRoute {
                status,
                body: Bytes::from(body.to_string()),
            },
        );
    }

    pub fn token_requests(&self) -> usize {
        self.token_requests.load(Ordering::SeqCst)
    }

    /// Data requests received, token exchanges excluded.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.recent_requests.lock().clone()
    }

    pub fn request_count(&self, path: &str) -> usize {
        self.recent_requests
            .lock()
            .iter()
            .filter(|r| r.path == path)
            .count()
    }

    fn issue_token(&self) -> HttpResponse {
        if self.reject_credentials.load(Ordering::SeqCst) {
            return respond(
                401,
                json!({ "error": "invalid_client", "error_description": "Client credentials are invalid" }),
            );
        }
        let value = format!("mock-token-{}", self.token_requests());
        self.issued_tokens.insert(value.clone());
        respond(
            200,
            json!({
                "type": "amadeusOAuth2Token",
                "access_token": value,
                "token_type": "Bearer",
                "expires_in": self.token_lifetime_secs.load(Ordering::SeqCst),
            }),
        )
    }

    fn is_authorized(&self, request: &HttpRequest) -> bool {
        request
            .header("Authorization")
            .and_then(|h| h.strip_prefix("Bearer "))
            .map(|token| self.issued_tokens.contains(token))
            .unwrap_or(false)
    }
}

#[async_trait]
impl Transport for MockServer {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        if self.mode.load(Ordering::SeqCst) == 1 {
            return Err(ApiError::NetworkError("Service unavailable".to_string()));
        }

        let delay = self.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        let is_token_call = request.method == Method::Post && request.path == TOKEN_ENDPOINT;
        if is_token_call {
            self.token_requests.fetch_add(1, Ordering::SeqCst);
        } else {
            self.recent_requests.lock().push(request.clone());
        }

        let failing = self
            .fail_next_requests
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Ok(respond(
                500,
                json!({ "errors": [{ "status": 500, "title": "SYSTEM ERROR HAS OCCURRED" }] }),
            ));
        }

        if is_token_call {
            return Ok(self.issue_token());
        }

        if !self.is_authorized(&request) {
            return Ok(respond(
                401,
                json!({ "errors": [{ "status": 401, "title": "Invalid access token" }] }),
            ));
        }

        match self.routes.get(&(request.method, request.path.clone())) {
            Some(route) => Ok(HttpResponse {
                status: route.status,
                body: route.body.clone(),
            }),
            None => Ok(respond(
                404,
                json!({ "errors": [{ "status": 404, "title": "RESOURCE NOT FOUND" }] }),
            )),
        }
    }
}

fn respond(status: u16, body: Value) -> HttpResponse {
    HttpResponse {
        status,
        body: Bytes::from(body.to_string()),
    }
}

/// Hotel listing entry in the upstream shape.
pub fn hotel_json(hotel_id: &str, name: &str, rating: Option<u8>) -> Value {
    let mut hotel = json!({
        "chainCode": "MK",
        "iataCode": "PAR",
        "dupeId": 700000000,
        "name": name,
        "hotelId": hotel_id,
        "geoCode": { "latitude": 48.8566, "longitude": 2.3522 },
        "address": { "countryCode": "FR" },
        "amenities": ["WIFI"],
    });
    if let Some(rating) = rating {
        hotel["rating"] = json!(rating);
    }
    hotel
}

/// One hotel-offers document in the upstream shape, with a single offer.
pub fn hotel_offers_json(hotel_id: &str, offer_id: &str, total: &str) -> Value {
    json!({
        "type": "hotel-offers",
        "hotel": { "type": "hotel", "hotelId": hotel_id, "name": format!("Hotel {hotel_id}"), "cityCode": "PAR" },
        "available": true,
        "offers": [{
            "id": offer_id,
            "checkInDate": "2025-04-01",
            "checkOutDate": "2025-04-05",
            "room": {
                "type": "A1K",
                "typeEstimated": { "category": "SUPERIOR_ROOM", "beds": 1, "bedType": "KING" },
                "description": { "text": "Superior king room", "lang": "EN" }
            },
            "price": { "currency": "EUR", "base": "400.00", "total": total, "taxes": [] },
            "policies": { "paymentType": "guarantee", "cancellations": [] }
        }]
    })
}
