use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Number, Value};
use stayfinder_core::domain::booking::{BookingId, BOOKING_NOT_FOUND, HOTEL_NOT_FOUND};
use stayfinder_core::domain::hotel::HotelId;
use stayfinder_core::{BookingDesk, BookingOutcome, BookingRequest, DomainError, SearchCriteria};
use thiserror::Error;
use tracing::info;

use crate::llm::FunctionCall;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ToolName {
    SearchHotels,
    BookHotel,
    GetBookingDetails,
}

impl ToolName {
    pub const ALL: [ToolName; 3] = [Self::SearchHotels, Self::BookHotel, Self::GetBookingDetails];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::SearchHotels => "search_hotels",
            Self::BookHotel => "book_hotel",
            Self::GetBookingDetails => "get_booking_details",
        }
    }

    pub fn spec(self) -> ToolSpec {
        match self {
            Self::SearchHotels => ToolSpec {
                name: self,
                description: "Search for hotels based on location and optional filters",
                properties: vec![
                    ParameterSpec::new(
                        "location",
                        ParameterKind::String,
                        "City or location to search hotels",
                    ),
                    ParameterSpec::new(
                        "max_price",
                        ParameterKind::Number,
                        "Maximum price per night",
                    ),
                    ParameterSpec::new(
                        "min_rating",
                        ParameterKind::Number,
                        "Minimum rating (out of 5)",
                    ),
                ],
                required: vec!["location"],
            },
            Self::BookHotel => ToolSpec {
                name: self,
                description: "Book a hotel room",
                properties: vec![
                    ParameterSpec::new(
                        "hotel_id",
                        ParameterKind::Integer,
                        "ID of the hotel to book",
                    ),
                    ParameterSpec::new("guest_name", ParameterKind::String, "Name of the guest"),
                    ParameterSpec::new(
                        "check_in",
                        ParameterKind::String,
                        "Check-in date (YYYY-MM-DD)",
                    ),
                    ParameterSpec::new(
                        "check_out",
                        ParameterKind::String,
                        "Check-out date (YYYY-MM-DD)",
                    ),
                    ParameterSpec::new("num_guests", ParameterKind::Integer, "Number of guests"),
                ],
                required: vec!["hotel_id", "guest_name", "check_in", "check_out", "num_guests"],
            },
            Self::GetBookingDetails => ToolSpec {
                name: self,
                description: "Retrieve details of an existing booking",
                properties: vec![ParameterSpec::new(
                    "booking_id",
                    ParameterKind::Integer,
                    "ID of the booking",
                )],
                required: vec!["booking_id"],
            },
        }
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolName {
    type Err = ToolError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|name| name.as_str() == value)
            .ok_or_else(|| ToolError::UnknownOperation(value.to_string()))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParameterKind {
    String,
    Number,
    Integer,
}

impl ParameterKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParameterSpec {
    pub name: &'static str,
    pub kind: ParameterKind,
    pub description: &'static str,
}

impl ParameterSpec {
    pub fn new(name: &'static str, kind: ParameterKind, description: &'static str) -> Self {
        Self { name, kind, description }
    }
}

/// Declared schema of one tool, as advertised to the model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolSpec {
    pub name: ToolName,
    pub description: &'static str,
    pub properties: Vec<ParameterSpec>,
    pub required: Vec<&'static str>,
}

impl ToolSpec {
    /// JSON-Schema object describing the argument payload.
    pub fn parameters_schema(&self) -> Value {
        let properties = self
            .properties
            .iter()
            .map(|parameter| {
                (
                    parameter.name.to_string(),
                    json!({"type": parameter.kind.as_str(), "description": parameter.description}),
                )
            })
            .collect::<Map<String, Value>>();

        json!({
            "type": "object",
            "properties": properties,
            "required": self.required,
        })
    }

    pub fn to_openai(&self) -> Value {
        json!({
            "type": "function",
            "function": {
                "name": self.name.as_str(),
                "description": self.description,
                "parameters": self.parameters_schema(),
            }
        })
    }

    fn undeclared_required(&self) -> Option<&'static str> {
        self.required
            .iter()
            .copied()
            .find(|required| !self.properties.iter().any(|parameter| parameter.name == *required))
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ToolError {
    #[error("unknown tool `{0}`")]
    UnknownOperation(String),
    #[error("invalid arguments for `{tool}`: {message}")]
    InvalidArguments { tool: ToolName, message: String },
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("could not serialize `{tool}` result: {message}")]
    Serialization { tool: ToolName, message: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("tool `{0}` is already registered")]
    Duplicate(ToolName),
    #[error("handler for `{handler}` declares a spec named `{declared}`")]
    SpecMismatch { handler: ToolName, declared: ToolName },
    #[error("tool `{tool}` requires undeclared parameter `{parameter}`")]
    UndeclaredRequired { tool: ToolName, parameter: &'static str },
}

/// A booking operation the model can invoke. Handlers run synchronously
/// against the desk and return a JSON-serializable result.
pub trait Tool: Send + Sync {
    fn name(&self) -> ToolName;

    fn spec(&self) -> ToolSpec {
        self.name().spec()
    }

    fn execute(&self, desk: &mut BookingDesk, input: Value) -> Result<Value, ToolError>;
}

#[derive(Default)]
pub struct ToolRegistry {
    tools: BTreeMap<ToolName, Box<dyn Tool>>,
}

impl fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.tools.keys()).finish()
    }
}

impl ToolRegistry {
    pub fn with_booking_tools() -> Result<Self, RegistryError> {
        let mut registry = Self::default();
        registry.register(SearchHotelsTool)?;
        registry.register(BookHotelTool)?;
        registry.register(GetBookingDetailsTool)?;
        Ok(registry)
    }

    pub fn register<T>(&mut self, tool: T) -> Result<(), RegistryError>
    where
        T: Tool + 'static,
    {
        let name = tool.name();
        let spec = tool.spec();
        if spec.name != name {
            return Err(RegistryError::SpecMismatch { handler: name, declared: spec.name });
        }
        if let Some(parameter) = spec.undeclared_required() {
            return Err(RegistryError::UndeclaredRequired { tool: name, parameter });
        }
        if self.tools.contains_key(&name) {
            return Err(RegistryError::Duplicate(name));
        }

        self.tools.insert(name, Box::new(tool));
        Ok(())
    }

    pub fn specs(&self) -> Vec<ToolSpec> {
        self.tools.values().map(|tool| tool.spec()).collect()
    }

    /// Resolves a model-issued call by wire name, decodes its JSON arguments
    /// and runs the handler.
    pub fn dispatch(&self, desk: &mut BookingDesk, call: &FunctionCall) -> Result<Value, ToolError> {
        let name = call.name.parse::<ToolName>()?;
        let tool = self
            .tools
            .get(&name)
            .ok_or_else(|| ToolError::UnknownOperation(call.name.clone()))?;
        let input = serde_json::from_str::<Value>(&call.arguments).map_err(|error| {
            ToolError::InvalidArguments { tool: name, message: error.to_string() }
        })?;

        tool.execute(desk, input)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

fn decode_args<T: DeserializeOwned>(tool: ToolName, input: Value) -> Result<T, ToolError> {
    serde_json::from_value(input)
        .map_err(|error| ToolError::InvalidArguments { tool, message: error.to_string() })
}

fn encode_result<T: Serialize>(tool: ToolName, value: &T) -> Result<Value, ToolError> {
    serde_json::to_value(value)
        .map_err(|error| ToolError::Serialization { tool, message: error.to_string() })
}

/// Ids outside the catalog's id space cannot match anything, so they decode to
/// `None` and surface as not-found outcomes.
fn id_arg(value: &Number) -> Option<u32> {
    value.as_u64().and_then(|id| u32::try_from(id).ok())
}

enum PriceCap {
    Limit(Decimal),
    Unbounded,
    Unsatisfiable,
}

fn price_cap(value: f64) -> PriceCap {
    match Decimal::try_from(value) {
        Ok(cap) => PriceCap::Limit(cap),
        Err(_) if value >= 1.0 => PriceCap::Unbounded,
        Err(_) if value < 0.0 => PriceCap::Unsatisfiable,
        Err(_) => PriceCap::Limit(Decimal::ZERO),
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SearchHotelsArgs {
    location: String,
    #[serde(default)]
    max_price: Option<f64>,
    #[serde(default)]
    min_rating: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct BookHotelArgs {
    hotel_id: Number,
    guest_name: String,
    check_in: String,
    check_out: String,
    num_guests: u32,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct GetBookingDetailsArgs {
    booking_id: Number,
}

pub struct SearchHotelsTool;

impl Tool for SearchHotelsTool {
    fn name(&self) -> ToolName {
        ToolName::SearchHotels
    }

    fn execute(&self, desk: &mut BookingDesk, input: Value) -> Result<Value, ToolError> {
        let name = self.name();
        let args: SearchHotelsArgs = decode_args(name, input)?;

        let mut criteria = SearchCriteria::in_location(args.location);
        match args.max_price.map(price_cap) {
            Some(PriceCap::Limit(cap)) => criteria = criteria.with_max_price(cap),
            Some(PriceCap::Unsatisfiable) => return Ok(Value::Array(Vec::new())),
            Some(PriceCap::Unbounded) | None => {}
        }
        if let Some(min_rating) = args.min_rating {
            criteria = criteria.with_min_rating(min_rating);
        }

        encode_result(name, &desk.search(&criteria))
    }
}

pub struct BookHotelTool;

impl Tool for BookHotelTool {
    fn name(&self) -> ToolName {
        ToolName::BookHotel
    }

    fn execute(&self, desk: &mut BookingDesk, input: Value) -> Result<Value, ToolError> {
        let args: BookHotelArgs = decode_args(self.name(), input)?;
        let Some(hotel_id) = id_arg(&args.hotel_id) else {
            return encode_result(self.name(), &BookingOutcome::failure(HOTEL_NOT_FOUND));
        };
        let outcome = desk.book(BookingRequest {
            hotel_id: HotelId(hotel_id),
            guest_name: args.guest_name,
            check_in: args.check_in,
            check_out: args.check_out,
            num_guests: args.num_guests,
        })?;

        if let Some(booking) = &outcome.booking {
            info!(
                event_name = "booking.created",
                booking_id = booking.booking_id.0,
                hotel_name = %booking.hotel_name,
                nights = booking.nights,
                total_price = %booking.total_price,
                "booking created"
            );
        }

        encode_result(self.name(), &outcome)
    }
}

pub struct GetBookingDetailsTool;

impl Tool for GetBookingDetailsTool {
    fn name(&self) -> ToolName {
        ToolName::GetBookingDetails
    }

    fn execute(&self, desk: &mut BookingDesk, input: Value) -> Result<Value, ToolError> {
        let args: GetBookingDetailsArgs = decode_args(self.name(), input)?;
        let outcome = match id_arg(&args.booking_id) {
            Some(booking_id) => desk.get_booking(BookingId(booking_id)),
            None => BookingOutcome::failure(BOOKING_NOT_FOUND),
        };
        encode_result(self.name(), &outcome)
    }
}
