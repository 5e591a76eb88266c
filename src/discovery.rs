// Hotel discovery: city code -> bounded list of hotel identifiers

use std::{collections::HashSet, sync::Arc};

use serde_json::Value;
use tracing::{debug, info};

use crate::{config::GatewayConfig, error::ApiError, gateway::Gateway, models::HotelSummary};

pub const HOTELS_BY_CITY_ENDPOINT: &str = "/v1/reference-data/locations/hotels/by-city";

/// Listing filters forwarded to the upstream as-is.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryFilters {
    pub radius: Option<u32>,
    pub radius_unit: Option<String>,
    pub amenities: Vec<String>,
    pub ratings: Vec<u8>,
}

pub struct HotelDiscovery {
    gateway: Arc<Gateway>,
    max_hotels: usize,
    default_radius: u32,
    default_radius_unit: String,
}

impl HotelDiscovery {
    pub fn new(gateway: Arc<Gateway>, config: &GatewayConfig) -> Self {
        Self {
            gateway,
            max_hotels: config.max_hotels.max(1),
            default_radius: config.search_radius,
            default_radius_unit: config.search_radius_unit.clone(),
        }
    }

    pub fn max_hotels(&self) -> usize {
        self.max_hotels
    }

    pub async fn discover_hotel_ids(
        &self,
        city_code: &str,
        name_filter: Option<&str>,
    ) -> Result<Vec<String>, ApiError> {
        let hotels = self
            .discover_hotels(city_code, name_filter, &DiscoveryFilters::default(), self.max_hotels)
            .await?;
        Ok(hotels.into_iter().map(|h| h.hotel_id).collect())
    }

    /// Fails with `NoInventory` only when the city itself has no hotels; a name
    /// filter that matches nothing falls back to the unfiltered listing.
    pub async fn discover_hotels(
        &self,
        city_code: &str,
        name_filter: Option<&str>,
        filters: &DiscoveryFilters,
        limit: usize,
    ) -> Result<Vec<HotelSummary>, ApiError> {
        let listed = self.fetch_city(city_code, filters).await?;
        if listed.is_empty() {
            return Err(ApiError::NoInventory(city_code.to_string()));
        }

        let mut hotels = filter_by_name(listed, name_filter);
        hotels.truncate(limit.max(1));
        info!(city_code, count = hotels.len(), "Hotels discovered");
        Ok(hotels)
    }

    async fn fetch_city(
        &self,
        city_code: &str,
        filters: &DiscoveryFilters,
    ) -> Result<Vec<HotelSummary>, ApiError> {
        let mut query = vec![
            ("cityCode".to_string(), city_code.to_uppercase()),
            (
                "radius".to_string(),
                filters.radius.unwrap_or(self.default_radius).to_string(),
            ),
            (
                "radiusUnit".to_string(),
                filters
                    .radius_unit
                    .clone()
                    .unwrap_or_else(|| self.default_radius_unit.clone()),
            ),
        ];
        if !filters.amenities.is_empty() {
            query.push(("amenities".to_string(), filters.amenities.join(",")));
        }
        if !filters.ratings.is_empty() {
            let ratings: Vec<String> = filters.ratings.iter().map(|r| r.to_string()).collect();
            query.push(("ratings".to_string(), ratings.join(",")));
        }

        let body = self.gateway.get(HOTELS_BY_CITY_ENDPOINT, query).await?;
        parse_listing(body)
    }
}

fn parse_listing(mut body: Value) -> Result<Vec<HotelSummary>, ApiError> {
    let data = match body.get_mut("data") {
        Some(data) => data.take(),
        None => return Err(ApiError::Decode("hotel listing has no data field".to_string())),
    };
    let hotels: Vec<HotelSummary> =
        serde_json::from_value(data).map_err(|e| ApiError::Decode(format!("hotel listing: {e}")))?;

    let mut seen = HashSet::new();
    Ok(hotels
        .into_iter()
        .filter(|h| seen.insert(h.hotel_id.clone()))
        .collect())
}

/// Case-insensitive substring match on hotel names. An empty match set returns
/// the input untouched.
pub fn filter_by_name(hotels: Vec<HotelSummary>, name_filter: Option<&str>) -> Vec<HotelSummary> {
    let needle = match name_filter.map(str::trim).filter(|n| !n.is_empty()) {
        Some(needle) => needle.to_lowercase(),
        None => return hotels,
    };

    let matching: Vec<HotelSummary> = hotels
        .iter()
        .filter(|h| h.name.to_lowercase().contains(&needle))
        .cloned()
        .collect();

    if matching.is_empty() {
        debug!(filter = %needle, "Name filter matched nothing, keeping unfiltered list");
        hotels
    } else {
        matching
    }
}
