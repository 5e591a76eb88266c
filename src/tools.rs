// Tool catalogue exposed to the assistant, and dispatch onto `HotelService`

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    error::ApiError,
    format,
    models::{BookingRequest, HotelListQuery, OfferQuery},
    orchestrator::{HotelService, Sourced},
};

pub const SEARCH_OFFERS: &str = "search_hotel_offers";
pub const OFFER_DETAILS: &str = "get_offer_details";
pub const BOOK_HOTEL: &str = "book_hotel";
pub const LIST_HOTELS: &str = "list_hotels";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub text: String,
    pub structured: Value,
    pub synthetic: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OfferDetailArgs {
    offer_id: String,
}

pub fn tool_definitions() -> Vec<ToolDefinition> {
    let guest_schema = json!({
        "type": "object",
        "properties": {
            "title": { "type": "string", "description": "MR, MS, DR..." },
            "firstName": { "type": "string" },
            "lastName": { "type": "string" },
            "email": { "type": "string" },
            "phone": { "type": "string", "description": "International format, e.g. +33679278416" }
        },
        "required": ["firstName", "lastName", "email", "phone"]
    });
    let payment_schema = json!({
        "type": "object",
        "properties": {
            "method": { "type": "string", "description": "e.g. creditCard" },
            "card": {
                "type": "object",
                "properties": {
                    "vendorCode": { "type": "string", "description": "VI, CA, AX..." },
                    "cardNumber": { "type": "string" },
                    "expiryDate": { "type": "string", "description": "YYYY-MM" }
                },
                "required": ["vendorCode", "cardNumber", "expiryDate"]
            }
        },
        "required": ["method"]
    });

    vec![
        ToolDefinition {
            name: SEARCH_OFFERS.to_string(),
            description: "Search priced hotel offers in a city for the given stay".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "cityCode": { "type": "string", "description": "IATA city code, e.g. PAR" },
                    "checkInDate": { "type": "string", "description": "YYYY-MM-DD" },
                    "checkOutDate": { "type": "string", "description": "YYYY-MM-DD" },
                    "adults": { "type": "integer", "minimum": 1, "maximum": 9 },
                    "roomQuantity": { "type": "integer", "minimum": 1, "maximum": 9 },
                    "currency": { "type": "string", "description": "ISO currency code" },
                    "priceRange": { "type": "string", "description": "MIN-MAX, e.g. 100-300" },
                    "boardType": { "type": "string", "enum": ["ROOM_ONLY", "BREAKFAST", "HALF_BOARD", "FULL_BOARD", "ALL_INCLUSIVE"] },
                    "paymentPolicy": { "type": "string", "enum": ["NONE", "GUARANTEE", "DEPOSIT"] },
                    "hotelName": { "type": "string", "description": "Optional hotel name filter" }
                },
                "required": ["cityCode", "checkInDate", "checkOutDate", "adults"]
            }),
        },
        ToolDefinition {
            name: OFFER_DETAILS.to_string(),
            description: "Get the full details and policies of one hotel offer".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "offerId": { "type": "string", "description": "Offer id from a search result" }
                },
                "required": ["offerId"]
            }),
        },
        ToolDefinition {
            name: BOOK_HOTEL.to_string(),
            description: "Book a hotel offer for the given guests".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "offerId": { "type": "string" },
                    "guests": { "type": "array", "items": guest_schema, "minItems": 1 },
                    "payments": { "type": "array", "items": payment_schema, "minItems": 1 }
                },
                "required": ["offerId", "guests", "payments"]
            }),
        },
        ToolDefinition {
            name: LIST_HOTELS.to_string(),
            description: "List hotels in a city, optionally filtered".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "cityCode": { "type": "string", "description": "IATA city code, e.g. PAR" },
                    "radius": { "type": "integer", "minimum": 1 },
                    "radiusUnit": { "type": "string", "enum": ["KM", "MILE"] },
                    "amenities": { "type": "array", "items": { "type": "string" } },
                    "ratings": { "type": "array", "items": { "type": "integer", "minimum": 1, "maximum": 5 } },
                    "hotelName": { "type": "string" }
                },
                "required": ["cityCode"]
            }),
        },
    ]
}

pub async fn call_tool(
    service: &HotelService,
    name: &str,
    arguments: Value,
) -> Result<ToolOutput, ApiError> {
    match name {
        SEARCH_OFFERS => {
            let query: OfferQuery = parse_args(arguments)?;
            let result = service.search_offers(&query).await?;
            Ok(output(format::format_search(&result), &result))
        }
        OFFER_DETAILS => {
            let args: OfferDetailArgs = parse_args(arguments)?;
            let result = service.get_offer_detail(&args.offer_id).await?;
            Ok(output(format::format_detail(&result), &result))
        }
        BOOK_HOTEL => {
            let request: BookingRequest = parse_args(arguments)?;
            let result = service.book(&request).await?;
            Ok(output(format::format_booking(&result), &result))
        }
        LIST_HOTELS => {
            let query: HotelListQuery = parse_args(arguments)?;
            let hotels = service.list_hotels(&query).await?;
            Ok(ToolOutput {
                text: format::format_hotels(&query.city_code, &hotels),
                structured: json!({ "data": hotels, "synthetic": false }),
                synthetic: false,
            })
        }
        other => Err(ApiError::validation("name", format!("unknown tool {other:?}"))),
    }
}

fn output<T: Serialize>(text: String, result: &Sourced<T>) -> ToolOutput {
    let synthetic = result.is_degraded();
    ToolOutput {
        text,
        structured: json!({
            "data": serde_json::to_value(result.data()).unwrap_or(Value::Null),
            "synthetic": synthetic,
        }),
        synthetic,
    }
}

/// Deserializes tool arguments, reporting the offending field on failure.
pub fn parse_args<T: DeserializeOwned>(arguments: Value) -> Result<T, ApiError> {
    let arguments = if arguments.is_null() {
        json!({})
    } else {
        arguments
    };
    serde_path_to_error::deserialize(arguments).map_err(|e| {
        let path = e.path().to_string();
        let message = e.inner().to_string();
        // A missing field is reported against its parent, so append the name serde gives.
        let missing = message
            .strip_prefix("missing field `")
            .and_then(|rest| rest.split('`').next());
        let field = match (path.as_str(), missing) {
            (".", Some(name)) => name.to_string(),
            (".", None) => "arguments".to_string(),
            (_, Some(name)) => format!("{path}.{name}"),
            (_, None) => path,
        };
        ApiError::Validation { field, message }
    })
}
