// Synthetic substitutes returned when the real upstream call fails.
// Every substitute is built from the same types the real responses decode into.

use chrono::{Days, NaiveDate, Utc};
use rand::{distributions::Alphanumeric, Rng};

use crate::models::{
    AssociatedRecord, BookingConfirmation, BookingRequest, Cancellation, CheckInOut, Description,
    HotelOffers, HotelSummary, Offer, OfferDetail, OfferHotel, OfferId, OfferQuery, Policies,
    Price, Room, RoomEstimate, Tax,
};

pub const PLACEHOLDER_HOTEL_ID: &str = "SYNTH001";
pub const DEFAULT_RATING: u8 = 3;
pub const DEFAULT_CURRENCY: &str = "EUR";
pub const CHECK_IN_TIME: &str = "15:00";
pub const CHECK_OUT_TIME: &str = "11:00";
const FREE_CANCELLATION_DAYS: u64 = 3;

/// One offer per known hotel, or a single made-up hotel when none are known.
pub fn synthesize_search(query: &OfferQuery, hotels: &[HotelSummary]) -> Vec<HotelOffers> {
    let fallback;
    let hotels = if hotels.is_empty() {
        fallback = [synthetic_hotel(&query.city_code)];
        &fallback[..]
    } else {
        hotels
    };

    let check_in = query.check_in();
    let check_out = NaiveDate::parse_from_str(&query.check_out_date, crate::models::DATE_FORMAT).ok();

    hotels
        .iter()
        .map(|hotel| {
            let rating = hotel.rating.unwrap_or(DEFAULT_RATING);
            let offer_id = OfferId::new(hotel.hotel_id.clone(), random_suffix(6));
            let offer = synthetic_offer(
                offer_id.to_string(),
                rating,
                check_in,
                check_out,
                query.currency.as_deref(),
                query.board_type.as_deref(),
            );
            HotelOffers {
                kind: Some("hotel-offers".to_string()),
                hotel: OfferHotel {
                    hotel_id: hotel.hotel_id.clone(),
                    name: hotel.name.clone(),
                    city_code: Some(query.city_code.to_uppercase()),
                    latitude: hotel.geo_code.as_ref().map(|g| g.latitude),
                    longitude: hotel.geo_code.as_ref().map(|g| g.longitude),
                    rating: Some(rating.to_string()),
                },
                available: true,
                offers: vec![offer],
            }
        })
        .collect()
}

/// Detail record for `offer_id`; the hotel comes from the structured id when it has one.
pub fn synthesize_detail(offer_id: &str) -> OfferDetail {
    let hotel_id = OfferId::parse(offer_id)
        .map(|id| id.hotel_id)
        .unwrap_or_else(|| PLACEHOLDER_HOTEL_ID.to_string());

    let today = Utc::now().date_naive();
    let check_in = today.checked_add_days(Days::new(30));
    let check_out = today.checked_add_days(Days::new(33));

    HotelOffers {
        kind: Some("hotel-offers".to_string()),
        hotel: OfferHotel {
            name: format!("Hotel {hotel_id}"),
            hotel_id,
            city_code: None,
            latitude: None,
            longitude: None,
            rating: Some(DEFAULT_RATING.to_string()),
        },
        available: true,
        offers: vec![synthetic_offer(
            offer_id.to_string(),
            DEFAULT_RATING,
            check_in,
            check_out,
            None,
            None,
        )],
    }
}

/// Fresh identifiers, submitted guests echoed back.
pub fn synthesize_booking(request: &BookingRequest) -> BookingConfirmation {
    BookingConfirmation {
        id: format!("BK-{}", random_suffix(10)),
        provider_confirmation_id: format!("CONF{}", random_suffix(8)),
        associated_records: vec![AssociatedRecord {
            reference: random_suffix(6),
            origin_system_code: Some("GDS".to_string()),
        }],
        guests: request.guests.clone(),
    }
}

/// `base = 100 + rating * 50`, `total = base * 1.1`, one tax line of `base * 0.1`.
pub fn price_for_rating(rating: u8, currency: &str) -> Price {
    let base = 100 + u32::from(rating) * 50;
    let base_amount = f64::from(base);
    Price {
        currency: Some(currency.to_string()),
        base: Some(base.to_string()),
        total: format!("{:.2}", base_amount * 1.1),
        taxes: vec![Tax {
            amount: format!("{:.2}", base_amount * 0.1),
            currency: Some(currency.to_string()),
            code: Some("TOTAL_TAX".to_string()),
            included: true,
        }],
    }
}

pub fn room_category(rating: u8) -> &'static str {
    if rating >= 5 {
        "SUITE"
    } else {
        "STANDARD"
    }
}

fn synthetic_offer(
    offer_id: String,
    rating: u8,
    check_in: Option<NaiveDate>,
    check_out: Option<NaiveDate>,
    currency: Option<&str>,
    board_type: Option<&str>,
) -> Offer {
    let category = room_category(rating);
    let price = price_for_rating(rating, currency.unwrap_or(DEFAULT_CURRENCY));
    let deadline = check_in
        .and_then(|d| d.checked_sub_days(Days::new(FREE_CANCELLATION_DAYS)))
        .map(|d| format!("{}T23:59:00", d.format(crate::models::DATE_FORMAT)));

    Offer {
        id: offer_id,
        check_in_date: check_in.map(|d| d.format(crate::models::DATE_FORMAT).to_string()),
        check_out_date: check_out.map(|d| d.format(crate::models::DATE_FORMAT).to_string()),
        board_type: Some(board_type.unwrap_or("ROOM_ONLY").to_string()),
        room: Room {
            kind: Some(category.to_string()),
            type_estimated: Some(RoomEstimate {
                category: Some(category.to_string()),
                beds: Some(1),
                bed_type: Some(if rating >= 5 { "KING" } else { "DOUBLE" }.to_string()),
            }),
            description: Some(Description {
                text: format!("{} room, {}-star property", category.to_lowercase(), rating),
                lang: Some("EN".to_string()),
            }),
        },
        policies: Some(Policies {
            cancellations: vec![Cancellation {
                deadline,
                amount: Some(price.total.clone()),
                description: Some(Description {
                    text: "Free cancellation until the deadline".to_string(),
                    lang: Some("EN".to_string()),
                }),
            }],
            payment_type: Some("guarantee".to_string()),
            check_in_out: Some(CheckInOut {
                check_in: Some(CHECK_IN_TIME.to_string()),
                check_out: Some(CHECK_OUT_TIME.to_string()),
            }),
        }),
        price,
    }
}

fn synthetic_hotel(city_code: &str) -> HotelSummary {
    let city = city_code.to_uppercase();
    HotelSummary {
        hotel_id: format!("SX{city}001"),
        name: format!("{city} Central Hotel"),
        iata_code: Some(city),
        rating: Some(DEFAULT_RATING),
        ..Default::default()
    }
}

fn random_suffix(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(|c| char::from(c).to_ascii_uppercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Guest;
    use std::collections::HashSet;

    fn query() -> OfferQuery {
        OfferQuery::new("PAR", "2025-04-01", "2025-04-05", 2)
    }

    fn hotel(id: &str, rating: Option<u8>) -> HotelSummary {
        HotelSummary {
            hotel_id: id.to_string(),
            name: format!("Hotel {id}"),
            rating,
            ..Default::default()
        }
    }

    #[test]
    fn test_five_star_hotel_gets_suite_pricing() {
        let results = synthesize_search(&query(), &[hotel("HTPAR001", Some(5))]);
        assert_eq!(results.len(), 1);

        let offer = &results[0].offers[0];
        assert_eq!(offer.room.kind.as_deref(), Some("SUITE"));
        assert_eq!(offer.price.base.as_deref(), Some("350"));
        assert_eq!(offer.price.total, "385.00");
        assert_eq!(offer.price.taxes.len(), 1);
        assert_eq!(offer.price.taxes[0].amount, "35.00");

        let policies = offer.policies.as_ref().unwrap();
        assert_eq!(policies.cancellations[0].deadline.as_deref(), Some("2025-03-29T23:59:00"));
        let times = policies.check_in_out.as_ref().unwrap();
        assert_eq!(times.check_in.as_deref(), Some("15:00"));
        assert_eq!(times.check_out.as_deref(), Some("11:00"));
    }

    #[test]
    fn test_price_formula_holds_for_every_rating() {
        for rating in 1..=5u8 {
            let price = price_for_rating(rating, "EUR");
            let base: f64 = price.base.as_deref().unwrap().parse().unwrap();
            let total: f64 = price.total.parse().unwrap();
            let tax: f64 = price.taxes[0].amount.parse().unwrap();
            assert!((total - base * 1.1).abs() < 0.005);
            assert!((tax - base * 0.1).abs() < 0.005);
        }
        assert_eq!(room_category(4), "STANDARD");
        assert_eq!(price_for_rating(2, "EUR").total, "220.00");
    }

    #[test]
    fn test_missing_hotels_yield_one_synthetic_hotel() {
        let results = synthesize_search(&query(), &[]);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].hotel.hotel_id, "SXPAR001");
        assert_eq!(results[0].offers[0].price.base.as_deref(), Some("250"));
    }

    #[test]
    fn test_offer_ids_are_unique_and_carry_the_hotel() {
        let hotels: Vec<_> = (0..5).map(|i| hotel(&format!("HTPAR00{i}"), Some(4))).collect();
        let results = synthesize_search(&query(), &hotels);

        let ids: HashSet<_> = results.iter().map(|r| r.offers[0].id.clone()).collect();
        assert_eq!(ids.len(), 5);
        for result in &results {
            let parsed = OfferId::parse(&result.offers[0].id).unwrap();
            assert_eq!(parsed.hotel_id, result.hotel.hotel_id);
        }
    }

    #[test]
    fn test_detail_reuses_hotel_from_offer_id() {
        let detail = synthesize_detail("OFF-HTPAR001-ABC123");
        assert_eq!(detail.hotel.hotel_id, "HTPAR001");
        assert_eq!(detail.offers[0].id, "OFF-HTPAR001-ABC123");

        let opaque = synthesize_detail("TSXOJ6LFQ2");
        assert_eq!(opaque.hotel.hotel_id, PLACEHOLDER_HOTEL_ID);
        assert!(opaque.offers[0].policies.is_some());
    }

    #[test]
    fn test_booking_substitute_echoes_guests() {
        let request = BookingRequest {
            offer_id: "OFF-HTPAR001-ABC123".into(),
            guests: vec![Guest {
                title: Some("MR".into()),
                first_name: "Bob".into(),
                last_name: "Smith".into(),
                email: "bob@example.com".into(),
                phone: "+15550000000".into(),
            }],
            payments: vec![],
        };
        let first = synthesize_booking(&request);
        let second = synthesize_booking(&request);

        assert!(!first.id.is_empty());
        assert!(!first.provider_confirmation_id.is_empty());
        assert_ne!(first.id, second.id);
        assert_eq!(first.guests, request.guests);
    }
}
