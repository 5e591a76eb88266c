// Request and response types, shaped after the upstream JSON documents

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoCode {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(default)]
    pub lines: Vec<String>,
    #[serde(default)]
    pub city_name: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub country_code: Option<String>,
}

/// One entry of the hotel listing by city.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotelSummary {
    pub hotel_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub iata_code: Option<String>,
    #[serde(default)]
    pub rating: Option<u8>,
    #[serde(default)]
    pub address: Option<Address>,
    #[serde(default)]
    pub geo_code: Option<GeoCode>,
    #[serde(default)]
    pub amenities: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferQuery {
    pub city_code: String,
    pub check_in_date: String,
    pub check_out_date: String,
    pub adults: u32,
    #[serde(default = "default_room_quantity")]
    pub room_quantity: u32,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub price_range: Option<String>,
    #[serde(default)]
    pub board_type: Option<String>,
    #[serde(default)]
    pub payment_policy: Option<String>,
    #[serde(default)]
    pub hotel_name: Option<String>,
}

fn default_room_quantity() -> u32 {
    1
}

impl OfferQuery {
    pub fn new(city_code: &str, check_in_date: &str, check_out_date: &str, adults: u32) -> Self {
        Self {
            city_code: city_code.to_string(),
            check_in_date: check_in_date.to_string(),
            check_out_date: check_out_date.to_string(),
            adults,
            room_quantity: 1,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), ApiError> {
        validate_city_code(&self.city_code)?;
        if self.check_in_date.trim().is_empty() {
            return Err(ApiError::validation("checkInDate", "check-in date is required"));
        }
        if self.check_out_date.trim().is_empty() {
            return Err(ApiError::validation("checkOutDate", "check-out date is required"));
        }
        let check_in = parse_date("checkInDate", &self.check_in_date)?;
        let check_out = parse_date("checkOutDate", &self.check_out_date)?;
        if check_out <= check_in {
            return Err(ApiError::validation(
                "checkOutDate",
                "check-out date must be after check-in date",
            ));
        }
        if !(1..=9).contains(&self.adults) {
            return Err(ApiError::validation("adults", "must be between 1 and 9"));
        }
        if !(1..=9).contains(&self.room_quantity) {
            return Err(ApiError::validation("roomQuantity", "must be between 1 and 9"));
        }
        if let Some(range) = &self.price_range {
            let valid = range
                .split_once('-')
                .map(|(lo, hi)| {
                    (lo.is_empty() || lo.parse::<u32>().is_ok())
                        && (hi.is_empty() || hi.parse::<u32>().is_ok())
                })
                .unwrap_or(false);
            if !valid {
                return Err(ApiError::validation(
                    "priceRange",
                    "expected MIN-MAX, e.g. 100-300",
                ));
            }
        }
        Ok(())
    }

    pub fn check_in(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.check_in_date, DATE_FORMAT).ok()
    }
}

/// Parameters of the plain hotel listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotelListQuery {
    pub city_code: String,
    #[serde(default)]
    pub radius: Option<u32>,
    #[serde(default)]
    pub radius_unit: Option<String>,
    #[serde(default)]
    pub amenities: Vec<String>,
    #[serde(default)]
    pub ratings: Vec<u8>,
    #[serde(default)]
    pub hotel_name: Option<String>,
}

impl HotelListQuery {
    pub fn validate(&self) -> Result<(), ApiError> {
        validate_city_code(&self.city_code)?;
        if let Some(bad) = self.ratings.iter().find(|r| !(1..=5).contains(*r)) {
            return Err(ApiError::validation(
                "ratings",
                format!("rating {bad} is outside 1-5"),
            ));
        }
        Ok(())
    }
}

fn validate_city_code(city_code: &str) -> Result<(), ApiError> {
    if city_code.len() != 3 || !city_code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(ApiError::validation(
            "cityCode",
            "expected a 3-letter IATA city code",
        ));
    }
    Ok(())
}

fn parse_date(field: &str, raw: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|_| ApiError::validation(field, format!("{raw:?} is not a YYYY-MM-DD date")))
}

/// Offer identifier minted by this crate: `OFF-<hotelId>-<suffix>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OfferId {
    pub hotel_id: String,
    pub suffix: String,
}

impl OfferId {
    const PREFIX: &'static str = "OFF-";

    pub fn new(hotel_id: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            hotel_id: hotel_id.into(),
            suffix: suffix.into(),
        }
    }

    /// `None` for opaque upstream identifiers.
    pub fn parse(raw: &str) -> Option<Self> {
        let rest = raw.strip_prefix(Self::PREFIX)?;
        let (hotel_id, suffix) = rest.rsplit_once('-')?;
        if hotel_id.is_empty() || suffix.is_empty() {
            return None;
        }
        Some(Self::new(hotel_id, suffix))
    }
}

impl fmt::Display for OfferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}-{}", Self::PREFIX, self.hotel_id, self.suffix)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferHotel {
    pub hotel_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub city_code: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub rating: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Description {
    pub text: String,
    #[serde(default)]
    pub lang: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomEstimate {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub beds: Option<u32>,
    #[serde(default)]
    pub bed_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub type_estimated: Option<RoomEstimate>,
    #[serde(default)]
    pub description: Option<Description>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tax {
    pub amount: String,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub included: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Price {
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub base: Option<String>,
    pub total: String,
    #[serde(default)]
    pub taxes: Vec<Tax>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cancellation {
    #[serde(default)]
    pub deadline: Option<String>,
    #[serde(default)]
    pub amount: Option<String>,
    #[serde(default)]
    pub description: Option<Description>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInOut {
    #[serde(default)]
    pub check_in: Option<String>,
    #[serde(default)]
    pub check_out: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Policies {
    #[serde(default)]
    pub cancellations: Vec<Cancellation>,
    #[serde(default)]
    pub payment_type: Option<String>,
    #[serde(default)]
    pub check_in_out: Option<CheckInOut>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Offer {
    pub id: String,
    #[serde(default)]
    pub check_in_date: Option<String>,
    #[serde(default)]
    pub check_out_date: Option<String>,
    #[serde(default)]
    pub board_type: Option<String>,
    #[serde(default)]
    pub room: Room,
    pub price: Price,
    #[serde(default)]
    pub policies: Option<Policies>,
}

/// One element of the offers search response: a hotel and its priced offers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotelOffers {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    pub hotel: OfferHotel,
    #[serde(default)]
    pub available: bool,
    #[serde(default)]
    pub offers: Vec<Offer>,
}

/// The detail endpoint answers with a single hotel-offers document.
pub type OfferDetail = HotelOffers;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Guest {
    #[serde(default)]
    pub title: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub vendor_code: String,
    pub card_number: String,
    pub expiry_date: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub method: String,
    #[serde(default)]
    pub card: Option<Card>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub offer_id: String,
    pub guests: Vec<Guest>,
    pub payments: Vec<Payment>,
}

impl BookingRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.offer_id.trim().is_empty() {
            return Err(ApiError::validation("offerId", "offer id is required"));
        }
        if self.guests.is_empty() {
            return Err(ApiError::validation("guests", "at least one guest is required"));
        }
        if self.payments.is_empty() {
            return Err(ApiError::validation(
                "payments",
                "at least one payment instrument is required",
            ));
        }
        for (i, guest) in self.guests.iter().enumerate() {
            if guest.first_name.trim().is_empty() || guest.last_name.trim().is_empty() {
                return Err(ApiError::validation(
                    format!("guests[{i}]"),
                    "first and last name are required",
                ));
            }
            if !guest.email.contains('@') {
                return Err(ApiError::validation(
                    format!("guests[{i}].email"),
                    "not an email address",
                ));
            }
        }
        for (i, payment) in self.payments.iter().enumerate() {
            if payment.method.trim().is_empty() {
                return Err(ApiError::validation(
                    format!("payments[{i}].method"),
                    "payment method is required",
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssociatedRecord {
    pub reference: String,
    #[serde(default)]
    pub origin_system_code: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingConfirmation {
    pub id: String,
    pub provider_confirmation_id: String,
    #[serde(default)]
    pub associated_records: Vec<AssociatedRecord>,
    #[serde(default)]
    pub guests: Vec<Guest>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn query() -> OfferQuery {
        OfferQuery::new("PAR", "2025-04-01", "2025-04-05", 2)
    }

    #[test]
    fn test_query_validation() {
        assert!(query().validate().is_ok());

        let missing_checkout = OfferQuery {
            check_out_date: String::new(),
            ..query()
        };
        assert!(matches!(
            missing_checkout.validate(),
            Err(ApiError::Validation { ref field, .. }) if field == "checkOutDate"
        ));

        let reversed = OfferQuery {
            check_out_date: "2025-03-30".into(),
            ..query()
        };
        assert!(reversed.validate().is_err());

        let bad_city = OfferQuery {
            city_code: "PA".into(),
            ..query()
        };
        assert!(bad_city.validate().is_err());

        let bad_range = OfferQuery {
            price_range: Some("cheap".into()),
            ..query()
        };
        assert!(bad_range.validate().is_err());
    }

    #[test]
    fn test_offer_id_parsing() {
        let id = OfferId::new("HLPAR266", "X7K2QA");
        assert_eq!(id.to_string(), "OFF-HLPAR266-X7K2QA");
        assert_eq!(OfferId::parse("OFF-HLPAR266-X7K2QA"), Some(id));
        assert_eq!(OfferId::parse("TSXOJ6LFQ2"), None);
        assert_eq!(OfferId::parse("OFF-"), None);
        assert_eq!(OfferId::parse("OFF-HOTEL"), None);
    }

    #[test]
    fn test_hotel_summary_from_upstream() {
        let hotel: HotelSummary = serde_json::from_value(json!({
            "chainCode": "AC",
            "iataCode": "PAR",
            "name": "LE NOTRE DAME",
            "hotelId": "ACPAR419",
            "geoCode": { "latitude": 48.85, "longitude": 2.34 },
            "address": { "countryCode": "FR" },
            "rating": 4
        }))
        .unwrap();

        assert_eq!(hotel.hotel_id, "ACPAR419");
        assert_eq!(hotel.rating, Some(4));
        assert!(hotel.amenities.is_empty());
    }

    #[test]
    fn test_booking_validation() {
        let request = BookingRequest {
            offer_id: "OFF-A-B".into(),
            guests: vec![Guest {
                title: Some("MS".into()),
                first_name: "Ada".into(),
                last_name: "Lovelace".into(),
                email: "ada@example.com".into(),
                phone: "+33100000000".into(),
            }],
            payments: vec![],
        };
        assert!(matches!(
            request.validate(),
            Err(ApiError::Validation { ref field, .. }) if field == "payments"
        ));
    }
}
