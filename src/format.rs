// Plain-text renderings of tool results

use std::fmt::Write;

use crate::{
    models::{BookingConfirmation, HotelOffers, HotelSummary, Offer, OfferDetail},
    orchestrator::Sourced,
};

fn notice<T>(result: &Sourced<T>, out: &mut String) {
    if let Some(reason) = result.reason() {
        let _ = writeln!(
            out,
            "⚠️ Live inventory is unavailable ({reason}). The data below is sample data, not a real reservation source.\n"
        );
    }
}

pub fn format_search(result: &Sourced<Vec<HotelOffers>>) -> String {
    let mut out = String::new();
    notice(result, &mut out);

    let hotels = result.data();
    if hotels.is_empty() {
        out.push_str("No offers available for these dates.");
        return out;
    }

    let _ = writeln!(out, "🏨 Found offers at {} hotel(s):\n", hotels.len());
    for (i, entry) in hotels.iter().enumerate() {
        let _ = writeln!(out, "{}. {} ({})", i + 1, entry.hotel.name, entry.hotel.hotel_id);
        if let Some(rating) = &entry.hotel.rating {
            let _ = writeln!(out, "   ⭐ {rating}-star");
        }
        for offer in &entry.offers {
            write_offer(&mut out, offer, "   ");
        }
        out.push('\n');
    }
    out.trim_end().to_string()
}

pub fn format_detail(result: &Sourced<OfferDetail>) -> String {
    let mut out = String::new();
    notice(result, &mut out);

    let detail = result.data();
    let _ = writeln!(out, "🏨 {} ({})", detail.hotel.name, detail.hotel.hotel_id);
    if let Some(city) = &detail.hotel.city_code {
        let _ = writeln!(out, "📍 {city}");
    }
    let _ = writeln!(
        out,
        "Availability: {}",
        if detail.available { "available" } else { "unavailable" }
    );
    for offer in &detail.offers {
        write_offer(&mut out, offer, "");
        if let Some(policies) = &offer.policies {
            if let Some(times) = &policies.check_in_out {
                let _ = writeln!(
                    out,
                    "🕒 Check-in from {}, check-out by {}",
                    times.check_in.as_deref().unwrap_or("n/a"),
                    times.check_out.as_deref().unwrap_or("n/a")
                );
            }
            for cancellation in &policies.cancellations {
                let _ = writeln!(
                    out,
                    "❌ Cancellation: {}{}",
                    cancellation
                        .deadline
                        .as_deref()
                        .map(|d| format!("free until {d}"))
                        .unwrap_or_else(|| "see provider terms".to_string()),
                    cancellation
                        .description
                        .as_ref()
                        .map(|d| format!(" ({})", d.text))
                        .unwrap_or_default()
                );
            }
        }
    }
    out.trim_end().to_string()
}

pub fn format_booking(result: &Sourced<BookingConfirmation>) -> String {
    let mut out = String::new();
    notice(result, &mut out);

    let confirmation = result.data();
    let _ = writeln!(out, "✅ Booking confirmed");
    let _ = writeln!(out, "Booking ID: {}", confirmation.id);
    let _ = writeln!(
        out,
        "Confirmation number: {}",
        confirmation.provider_confirmation_id
    );
    for record in &confirmation.associated_records {
        let _ = writeln!(
            out,
            "Record: {} ({})",
            record.reference,
            record.origin_system_code.as_deref().unwrap_or("n/a")
        );
    }
    if !confirmation.guests.is_empty() {
        out.push_str("👤 Guests:\n");
        for guest in &confirmation.guests {
            let title = guest.title.as_deref().map(|t| format!("{t} ")).unwrap_or_default();
            let _ = writeln!(
                out,
                "   {title}{} {} <{}>",
                guest.first_name, guest.last_name, guest.email
            );
        }
    }
    out.trim_end().to_string()
}

pub fn format_hotels(city_code: &str, hotels: &[HotelSummary]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "🏨 {} hotel(s) in {}:\n", hotels.len(), city_code.to_uppercase());
    for (i, hotel) in hotels.iter().enumerate() {
        let stars = hotel
            .rating
            .map(|r| format!(" ⭐ {r}"))
            .unwrap_or_default();
        let _ = writeln!(out, "{}. {} ({}){stars}", i + 1, hotel.name, hotel.hotel_id);
        if let Some(geo) = &hotel.geo_code {
            let _ = writeln!(out, "   📍 {:.4}, {:.4}", geo.latitude, geo.longitude);
        }
        if !hotel.amenities.is_empty() {
            let _ = writeln!(out, "   Amenities: {}", hotel.amenities.join(", "));
        }
    }
    out.trim_end().to_string()
}

fn write_offer(out: &mut String, offer: &Offer, indent: &str) {
    let _ = writeln!(out, "{indent}🛏️ Offer {}", offer.id);
    let room = offer
        .room
        .type_estimated
        .as_ref()
        .and_then(|e| e.category.clone())
        .or_else(|| offer.room.kind.clone())
        .unwrap_or_else(|| "ROOM".to_string());
    let _ = writeln!(out, "{indent}   Room: {room}");
    if let Some(description) = &offer.room.description {
        let _ = writeln!(out, "{indent}   {}", description.text);
    }
    if let (Some(check_in), Some(check_out)) = (&offer.check_in_date, &offer.check_out_date) {
        let _ = writeln!(out, "{indent}   📅 {check_in} → {check_out}");
    }
    let currency = offer.price.currency.as_deref().unwrap_or("");
    let _ = writeln!(out, "{indent}   💰 Total: {} {currency}", offer.price.total);
    if let Some(base) = &offer.price.base {
        let _ = writeln!(out, "{indent}      Base: {base} {currency}");
    }
    for tax in &offer.price.taxes {
        let _ = writeln!(
            out,
            "{indent}      Tax {}: {} {}",
            tax.code.as_deref().unwrap_or(""),
            tax.amount,
            tax.currency.as_deref().unwrap_or(currency)
        );
    }
    if let Some(board) = &offer.board_type {
        let _ = writeln!(out, "{indent}   🍽️ Board: {board}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        degrade,
        models::{BookingRequest, Guest, OfferQuery},
    };

    #[test]
    fn test_degraded_results_carry_a_notice() {
        let query = OfferQuery::new("PAR", "2025-04-01", "2025-04-05", 2);
        let degraded = Sourced::Degraded {
            data: degrade::synthesize_search(&query, &[]),
            reason: "Request timeout after 10000ms".to_string(),
        };
        let text = format_search(&degraded);
        assert!(text.starts_with("⚠️ Live inventory is unavailable"));
        assert!(text.contains("Total: 275.00 EUR"));

        let real = Sourced::Real(degraded.data().clone());
        assert!(!format_search(&real).contains("unavailable"));
    }

    #[test]
    fn test_detail_lists_policies() {
        let detail = Sourced::Real(degrade::synthesize_detail("OFF-HTPAR001-ABC123"));
        let text = format_detail(&detail);
        assert!(text.contains("HTPAR001"));
        assert!(text.contains("Check-in from 15:00, check-out by 11:00"));
        assert!(text.contains("free until"));
    }

    #[test]
    fn test_booking_lists_guests() {
        let request = BookingRequest {
            offer_id: "X".into(),
            guests: vec![Guest {
                title: Some("DR".into()),
                first_name: "Grace".into(),
                last_name: "Hopper".into(),
                email: "grace@example.com".into(),
                phone: "+1".into(),
            }],
            payments: vec![],
        };
        let text = format_booking(&Sourced::Real(degrade::synthesize_booking(&request)));
        assert!(text.contains("✅ Booking confirmed"));
        assert!(text.contains("DR Grace Hopper <grace@example.com>"));
    }

    #[test]
    fn test_empty_search() {
        assert_eq!(
            format_search(&Sourced::Real(Vec::new())),
            "No offers available for these dates."
        );
    }
}
