// Caller-facing operations: search, detail, booking and listing.
// Upstream failures on the first three are turned into synthetic substitutes.

use std::{sync::Arc, time::Duration};

use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{info, instrument, warn};

use crate::{
    config::GatewayConfig,
    degrade,
    discovery::{DiscoveryFilters, HotelDiscovery},
    error::{ApiError, ClientError},
    gateway::Gateway,
    models::{
        BookingConfirmation, BookingRequest, HotelListQuery, HotelOffers, HotelSummary,
        OfferDetail, OfferQuery,
    },
    token::{Credentials, TokenManager},
    transport::{ReqwestTransport, Transport},
};

pub const HOTEL_OFFERS_ENDPOINT: &str = "/v3/shopping/hotel-offers";
pub const BOOKING_ENDPOINT: &str = "/v1/booking/hotel-bookings";

/// Result of an operation that may have fallen back to synthetic data.
#[derive(Debug, Clone, PartialEq)]
pub enum Sourced<T> {
    Real(T),
    Degraded { data: T, reason: String },
}

impl<T> Sourced<T> {
    pub fn data(&self) -> &T {
        match self {
            Sourced::Real(data) | Sourced::Degraded { data, .. } => data,
        }
    }

    pub fn into_data(self) -> T {
        match self {
            Sourced::Real(data) | Sourced::Degraded { data, .. } => data,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Sourced::Degraded { .. })
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Sourced::Real(_) => None,
            Sourced::Degraded { reason, .. } => Some(reason),
        }
    }
}

pub struct HotelService {
    gateway: Arc<Gateway>,
    discovery: HotelDiscovery,
    max_listed_hotels: usize,
}

impl HotelService {
    pub fn new(transport: Arc<dyn Transport>, config: &GatewayConfig) -> Self {
        let tokens = Arc::new(TokenManager::new(
            transport.clone(),
            Credentials {
                client_id: config.client_id.clone(),
                client_secret: config.client_secret.clone(),
            },
            Duration::from_secs(config.token_safety_margin_secs),
        ));
        let gateway = Arc::new(Gateway::new(transport, tokens, config));
        let discovery = HotelDiscovery::new(gateway.clone(), config);

        Self {
            gateway,
            discovery,
            max_listed_hotels: config.max_listed_hotels.max(1),
        }
    }

    /// Wires the service to the real upstream over HTTP.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, ClientError> {
        config.validate()?;
        let transport = ReqwestTransport::new(
            config.base_url.clone(),
            Duration::from_millis(config.timeout_ms),
        )?;
        Ok(Self::new(Arc::new(transport), config))
    }

    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    #[instrument(skip(self, query), fields(city_code = %query.city_code))]
    pub async fn search_offers(
        &self,
        query: &OfferQuery,
    ) -> Result<Sourced<Vec<HotelOffers>>, ApiError> {
        query.validate()?;

        let mut resolved = Vec::new();
        match self.fetch_offers(query, &mut resolved).await {
            Ok(results) => {
                info!(hotels = results.len(), "Offer search served from upstream");
                Ok(Sourced::Real(results))
            }
            Err(e) if e.escapes_degradation() => Err(e),
            Err(e) => {
                warn!(error = %e, known_hotels = resolved.len(), "Offer search degraded");
                Ok(Sourced::Degraded {
                    data: degrade::synthesize_search(query, &resolved),
                    reason: e.to_string(),
                })
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn get_offer_detail(&self, offer_id: &str) -> Result<Sourced<OfferDetail>, ApiError> {
        validate_offer_id(offer_id)?;

        let endpoint = format!("{HOTEL_OFFERS_ENDPOINT}/{offer_id}");
        let outcome = match self.gateway.get(&endpoint, Vec::new()).await {
            Ok(body) => decode_data::<OfferDetail>(body),
            Err(e) => Err(e),
        };

        match outcome {
            Ok(detail) => Ok(Sourced::Real(detail)),
            Err(e) if e.escapes_degradation() => Err(e),
            Err(e) => {
                warn!(error = %e, "Offer detail degraded");
                Ok(Sourced::Degraded {
                    data: degrade::synthesize_detail(offer_id),
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Always yields a confirmation unless the request is invalid or credentials
    /// are rejected.
    #[instrument(skip(self, request), fields(offer_id = %request.offer_id))]
    pub async fn book(
        &self,
        request: &BookingRequest,
    ) -> Result<Sourced<BookingConfirmation>, ApiError> {
        request.validate()?;

        let outcome = match self
            .gateway
            .post_json(BOOKING_ENDPOINT, booking_payload(request))
            .await
        {
            Ok(body) => decode_booking(body),
            Err(e) => Err(e),
        };

        match outcome {
            Ok(mut confirmation) => {
                if confirmation.guests.is_empty() {
                    confirmation.guests = request.guests.clone();
                }
                info!(booking_id = %confirmation.id, "Booking confirmed upstream");
                Ok(Sourced::Real(confirmation))
            }
            Err(e) if e.escapes_degradation() => Err(e),
            Err(e) => {
                warn!(error = %e, "Booking degraded");
                Ok(Sourced::Degraded {
                    data: degrade::synthesize_booking(request),
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Plain hotel listing. Errors are returned as-is; there is no synthetic listing.
    #[instrument(skip(self, query), fields(city_code = %query.city_code))]
    pub async fn list_hotels(&self, query: &HotelListQuery) -> Result<Vec<HotelSummary>, ApiError> {
        query.validate()?;
        let filters = DiscoveryFilters {
            radius: query.radius,
            radius_unit: query.radius_unit.clone(),
            amenities: query.amenities.clone(),
            ratings: query.ratings.clone(),
        };
        self.discovery
            .discover_hotels(
                &query.city_code,
                query.hotel_name.as_deref(),
                &filters,
                self.max_listed_hotels,
            )
            .await
    }

    async fn fetch_offers(
        &self,
        query: &OfferQuery,
        resolved: &mut Vec<HotelSummary>,
    ) -> Result<Vec<HotelOffers>, ApiError> {
        *resolved = self
            .discovery
            .discover_hotels(
                &query.city_code,
                query.hotel_name.as_deref(),
                &DiscoveryFilters::default(),
                self.discovery.max_hotels(),
            )
            .await?;

        let hotel_ids: Vec<&str> = resolved.iter().map(|h| h.hotel_id.as_str()).collect();
        let mut params = vec![
            ("hotelIds".to_string(), hotel_ids.join(",")),
            ("checkInDate".to_string(), query.check_in_date.clone()),
            ("checkOutDate".to_string(), query.check_out_date.clone()),
            ("adults".to_string(), query.adults.to_string()),
            ("roomQuantity".to_string(), query.room_quantity.to_string()),
        ];
        let optional = [
            ("currency", &query.currency),
            ("priceRange", &query.price_range),
            ("boardType", &query.board_type),
            ("paymentPolicy", &query.payment_policy),
        ];
        for (name, value) in optional {
            if let Some(value) = value {
                params.push((name.to_string(), value.clone()));
            }
        }

        let body = self.gateway.get(HOTEL_OFFERS_ENDPOINT, params).await?;
        decode_data(body)
    }
}

fn validate_offer_id(offer_id: &str) -> Result<(), ApiError> {
    if offer_id.trim().is_empty() {
        return Err(ApiError::validation("offerId", "offer id is required"));
    }
    if !offer_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ApiError::validation(
            "offerId",
            "only letters, digits, '-' and '_' are allowed",
        ));
    }
    Ok(())
}

fn decode_data<T: DeserializeOwned>(mut body: Value) -> Result<T, ApiError> {
    let data = body
        .get_mut("data")
        .map(Value::take)
        .ok_or_else(|| ApiError::Decode("response has no data field".to_string()))?;
    serde_json::from_value(data).map_err(|e| ApiError::Decode(e.to_string()))
}

// The booking endpoint answers with either a single record or a one-element list.
fn decode_booking(body: Value) -> Result<BookingConfirmation, ApiError> {
    match decode_data::<Value>(body)? {
        Value::Array(mut records) if !records.is_empty() => {
            serde_json::from_value(records.swap_remove(0)).map_err(|e| ApiError::Decode(e.to_string()))
        }
        record @ Value::Object(_) => {
            serde_json::from_value(record).map_err(|e| ApiError::Decode(e.to_string()))
        }
        _ => Err(ApiError::Decode("booking response holds no record".to_string())),
    }
}

fn booking_payload(request: &BookingRequest) -> Value {
    let guests: Vec<Value> = request
        .guests
        .iter()
        .enumerate()
        .map(|(i, guest)| {
            json!({
                "id": i + 1,
                "name": {
                    "title": guest.title.clone().unwrap_or_default(),
                    "firstName": guest.first_name,
                    "lastName": guest.last_name,
                },
                "contact": {
                    "phone": guest.phone,
                    "email": guest.email,
                },
            })
        })
        .collect();

    let payments: Vec<Value> = request
        .payments
        .iter()
        .enumerate()
        .map(|(i, payment)| {
            let mut entry = json!({ "id": i + 1, "method": payment.method });
            if let Some(card) = &payment.card {
                entry["card"] = json!({
                    "vendorCode": card.vendor_code,
                    "cardNumber": card.card_number,
                    "expiryDate": card.expiry_date,
                });
            }
            entry
        })
        .collect();

    json!({
        "data": {
            "offerId": request.offer_id,
            "guests": guests,
            "payments": payments,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        discovery::HOTELS_BY_CITY_ENDPOINT,
        mock_server::{hotel_json, hotel_offers_json, MockServer},
        models::{Card, Guest, OfferId, Payment},
        transport::{Method, RequestBody},
    };
    use std::collections::BTreeSet;
    use tokio_test::{assert_err, assert_ok};

    fn service(server: Arc<MockServer>) -> HotelService {
        let config = GatewayConfig {
            client_id: "id".into(),
            client_secret: "secret".into(),
            ..GatewayConfig::default()
        };
        HotelService::new(server, &config)
    }

    fn paris_query() -> OfferQuery {
        OfferQuery::new("PAR", "2025-04-01", "2025-04-05", 2)
    }

    fn seed_hotels(server: &MockServer, hotels: Vec<Value>) {
        server.add_response(
            Method::Get,
            HOTELS_BY_CITY_ENDPOINT,
            200,
            json!({ "data": hotels }),
        );
    }

    fn booking_request() -> BookingRequest {
        BookingRequest {
            offer_id: "OFF-HTPAR001-ABC123".into(),
            guests: vec![Guest {
                title: Some("MS".into()),
                first_name: "Ada".into(),
                last_name: "Lovelace".into(),
                email: "ada@example.com".into(),
                phone: "+33100000000".into(),
            }],
            payments: vec![Payment {
                method: "creditCard".into(),
                card: Some(Card {
                    vendor_code: "VI".into(),
                    card_number: "4151289722471370".into(),
                    expiry_date: "2026-08".into(),
                }),
            }],
        }
    }

    fn object_keys(value: &Value) -> BTreeSet<String> {
        value
            .as_object()
            .map(|o| o.keys().cloned().collect())
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn test_five_star_paris_end_to_end() {
        let server = Arc::new(MockServer::new());
        seed_hotels(&server, vec![hotel_json("HTPAR001", "Le Grand", Some(5))]);
        let service = service(server);

        let result = assert_ok!(service.search_offers(&paris_query()).await);
        assert!(result.is_degraded());

        let results = result.data();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].hotel.hotel_id, "HTPAR001");
        let offer = &results[0].offers[0];
        assert_eq!(offer.room.kind.as_deref(), Some("SUITE"));
        assert_eq!(offer.price.base.as_deref(), Some("350"));
        assert!(offer.price.total.starts_with("385.00"));
    }

    #[tokio::test]
    async fn test_real_offers_are_returned_with_full_query() {
        let server = Arc::new(MockServer::new());
        seed_hotels(
            &server,
            vec![
                hotel_json("HTPAR001", "One", Some(4)),
                hotel_json("HTPAR002", "Two", Some(3)),
            ],
        );
        server.add_response(
            Method::Get,
            HOTEL_OFFERS_ENDPOINT,
            200,
            json!({ "data": [hotel_offers_json("HTPAR001", "TSXOJ6LFQ2", "512.40")] }),
        );
        let service = service(server.clone());
        let query = OfferQuery {
            currency: Some("EUR".into()),
            board_type: Some("BREAKFAST".into()),
            ..paris_query()
        };

        let result = assert_ok!(service.search_offers(&query).await);
        assert!(!result.is_degraded());
        assert_eq!(result.data()[0].offers[0].id, "TSXOJ6LFQ2");
        assert_eq!(result.data()[0].offers[0].price.total, "512.40");

        let offers_call = server
            .requests()
            .into_iter()
            .find(|r| r.path == HOTEL_OFFERS_ENDPOINT)
            .unwrap();
        assert_eq!(offers_call.query_param("hotelIds"), Some("HTPAR001,HTPAR002"));
        assert_eq!(offers_call.query_param("checkInDate"), Some("2025-04-01"));
        assert_eq!(offers_call.query_param("checkOutDate"), Some("2025-04-05"));
        assert_eq!(offers_call.query_param("adults"), Some("2"));
        assert_eq!(offers_call.query_param("roomQuantity"), Some("1"));
        assert_eq!(offers_call.query_param("currency"), Some("EUR"));
        assert_eq!(offers_call.query_param("boardType"), Some("BREAKFAST"));
        assert_eq!(offers_call.query_param("priceRange"), None);
        assert_eq!(offers_call.query_param("paymentPolicy"), None);
    }

    #[tokio::test]
    async fn test_offers_outage_degrades_with_real_shape() {
        let server = Arc::new(MockServer::new());
        seed_hotels(&server, vec![hotel_json("HTPAR001", "One", Some(4))]);
        server.add_response(
            Method::Get,
            HOTEL_OFFERS_ENDPOINT,
            500,
            json!({ "errors": [{ "status": 500 }] }),
        );
        let service = service(server);

        let result = assert_ok!(service.search_offers(&paris_query()).await);
        assert!(result.is_degraded());
        assert!(result.reason().unwrap().contains("500"));

        let real = serde_json::to_value(
            serde_json::from_value::<HotelOffers>(hotel_offers_json("HTPAR001", "X", "1.00")).unwrap(),
        )
        .unwrap();
        let synthetic = serde_json::to_value(&result.data()[0]).unwrap();
        assert_eq!(object_keys(&synthetic), object_keys(&real));
        assert_eq!(
            object_keys(&synthetic["offers"][0]),
            object_keys(&real["offers"][0])
        );
        assert_eq!(
            object_keys(&synthetic["offers"][0]["price"]),
            object_keys(&real["offers"][0]["price"])
        );
    }

    #[tokio::test]
    async fn test_degraded_search_is_bounded_and_consistent() {
        let server = Arc::new(MockServer::new());
        let hotels = (0..8)
            .map(|i| hotel_json(&format!("HTPAR00{i}"), &format!("Hotel {i}"), Some(1 + i % 5)))
            .collect();
        seed_hotels(&server, hotels);
        let service = service(server);

        let result = assert_ok!(service.search_offers(&paris_query()).await);
        let results = result.data();
        assert_eq!(results.len(), 5);

        let hotel_ids: BTreeSet<_> = results.iter().map(|r| r.hotel.hotel_id.clone()).collect();
        assert_eq!(hotel_ids.len(), 5);
        for entry in results {
            let price = &entry.offers[0].price;
            let base: f64 = price.base.as_deref().unwrap().parse().unwrap();
            let total: f64 = price.total.parse().unwrap();
            assert_eq!(price.taxes.len(), 1);
            assert_eq!(price.total, format!("{:.2}", base * 1.1));
            assert!((total - base * 1.1).abs() < 0.005);
        }
    }

    #[tokio::test]
    async fn test_no_inventory_degrades_to_synthetic_hotel() {
        let server = Arc::new(MockServer::new());
        seed_hotels(&server, vec![]);
        let service = service(server.clone());

        let result = assert_ok!(
            service
                .search_offers(&OfferQuery::new("NYC", "2025-04-01", "2025-04-05", 1))
                .await
        );
        assert!(result.is_degraded());
        assert_eq!(result.data().len(), 1);
        assert_eq!(result.data()[0].hotel.hotel_id, "SXNYC001");
        assert_eq!(server.request_count(HOTEL_OFFERS_ENDPOINT), 0);
    }

    #[tokio::test]
    async fn test_validation_failure_is_not_degraded() {
        let server = Arc::new(MockServer::new());
        let service = service(server.clone());
        let query = OfferQuery {
            check_out_date: String::new(),
            ..paris_query()
        };

        let err = assert_err!(service.search_offers(&query).await);
        assert!(matches!(err, ApiError::Validation { ref field, .. } if field == "checkOutDate"));
        assert_eq!(server.token_requests(), 0);
        assert!(server.requests().is_empty());
    }

    #[tokio::test]
    async fn test_rejected_credentials_escape_as_fatal() {
        let server = Arc::new(MockServer::new());
        server.reject_credentials(true);
        let service = service(server);

        let err = assert_err!(service.search_offers(&paris_query()).await);
        assert!(err.is_fatal());
        let err = assert_err!(service.book(&booking_request()).await);
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_identity_outage_still_degrades() {
        let server = Arc::new(MockServer::new());
        server.fail_next_requests(1);
        let service = service(server);

        let result = assert_ok!(service.search_offers(&paris_query()).await);
        assert!(result.is_degraded());
    }

    #[tokio::test]
    async fn test_search_offer_round_trips_into_detail() {
        let server = Arc::new(MockServer::new());
        seed_hotels(&server, vec![hotel_json("HTPAR007", "Seven", Some(4))]);
        let service = service(server);

        let search = assert_ok!(service.search_offers(&paris_query()).await);
        let offer_id = search.data()[0].offers[0].id.clone();
        assert_eq!(OfferId::parse(&offer_id).unwrap().hotel_id, "HTPAR007");

        let detail = assert_ok!(service.get_offer_detail(&offer_id).await);
        assert!(detail.is_degraded());
        assert_eq!(detail.data().hotel.hotel_id, "HTPAR007");
        assert_eq!(detail.data().offers[0].id, offer_id);
    }

    #[tokio::test]
    async fn test_real_detail_lookup() {
        let server = Arc::new(MockServer::new());
        server.add_response(
            Method::Get,
            &format!("{HOTEL_OFFERS_ENDPOINT}/TSXOJ6LFQ2"),
            200,
            json!({ "data": hotel_offers_json("HTPAR001", "TSXOJ6LFQ2", "512.40") }),
        );
        let service = service(server);

        let detail = assert_ok!(service.get_offer_detail("TSXOJ6LFQ2").await);
        assert!(!detail.is_degraded());
        assert_eq!(detail.data().offers[0].price.total, "512.40");

        let err = assert_err!(service.get_offer_detail("../bookings").await);
        assert!(matches!(err, ApiError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_failed_booking_still_confirms() {
        let server = Arc::new(MockServer::new());
        server.add_response(
            Method::Post,
            BOOKING_ENDPOINT,
            500,
            json!({ "errors": [{ "status": 500 }] }),
        );
        let service = service(server.clone());
        let request = booking_request();

        let result = assert_ok!(service.book(&request).await);
        assert!(result.is_degraded());
        let confirmation = result.data();
        assert!(!confirmation.id.is_empty());
        assert!(!confirmation.provider_confirmation_id.is_empty());
        assert_eq!(confirmation.guests, request.guests);

        let sent = server
            .requests()
            .into_iter()
            .find(|r| r.path == BOOKING_ENDPOINT)
            .unwrap();
        let RequestBody::Json(payload) = sent.body else {
            panic!("booking must be sent as JSON");
        };
        assert_eq!(payload["data"]["offerId"], "OFF-HTPAR001-ABC123");
        assert_eq!(payload["data"]["guests"][0]["name"]["firstName"], "Ada");
        assert_eq!(payload["data"]["guests"][0]["contact"]["email"], "ada@example.com");
        assert_eq!(payload["data"]["payments"][0]["card"]["vendorCode"], "VI");
    }

    #[tokio::test]
    async fn test_real_booking_confirmation() {
        let server = Arc::new(MockServer::new());
        server.add_response(
            Method::Post,
            BOOKING_ENDPOINT,
            201,
            json!({ "data": [{
                "type": "hotel-booking",
                "id": "XD_8138319951754",
                "providerConfirmationId": "8138319951754",
                "associatedRecords": [{ "reference": "QVH2BX", "originSystemCode": "GDS" }]
            }]}),
        );
        let service = service(server);

        let result = assert_ok!(service.book(&booking_request()).await);
        assert!(!result.is_degraded());
        let confirmation = result.into_data();
        assert_eq!(confirmation.id, "XD_8138319951754");
        assert_eq!(confirmation.associated_records[0].reference, "QVH2BX");
        assert_eq!(confirmation.guests.len(), 1);
    }

    #[tokio::test]
    async fn test_list_hotels_surfaces_errors() {
        let server = Arc::new(MockServer::new());
        seed_hotels(&server, vec![]);
        let service = service(server.clone());

        let query = HotelListQuery {
            city_code: "NYC".into(),
            ..Default::default()
        };
        let err = assert_err!(service.list_hotels(&query).await);
        assert!(matches!(err, ApiError::NoInventory(_)));

        let hotels = (0..30)
            .map(|i| hotel_json(&format!("HTNYC{i:03}"), "Hotel", Some(3)))
            .collect();
        seed_hotels(&server, hotels);
        let listed = assert_ok!(service.list_hotels(&query).await);
        assert_eq!(listed.len(), 20);
    }
}
