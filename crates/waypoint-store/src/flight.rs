//! Flight record and the store abstraction the flight tools query.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A single scheduled flight.
///
/// Serialized with camelCase keys; this is the shape tool results carry back
/// to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flight {
    /// Route key, `ORIGIN#DESTINATION`.
    pub route: String,
    pub flight_id: String,
    /// Travel date, `YYYY-MM-DD`.
    pub date: String,
    pub airline: String,
    pub departure_time: String,
    pub arrival_time: String,
    pub aircraft: String,
    pub price: f64,
    pub available_seats: u32,
    pub baggage_included: bool,
}

impl Flight {
    /// Builds the route key used for lookups.
    pub fn route_key(origin: &str, destination: &str) -> String {
        format!("{origin}#{destination}")
    }
}

/// Read access to flight data.
///
/// Both queries return every match; an empty vector means nothing matched.
#[async_trait]
pub trait FlightStore: Send + Sync {
    /// Flights on the `origin#destination` route departing on `date`.
    async fn search(&self, origin: &str, destination: &str, date: &str) -> Result<Vec<Flight>>;

    /// All records whose flight ID equals `flight_id`.
    async fn find_by_id(&self, flight_id: &str) -> Result<Vec<Flight>>;
}
