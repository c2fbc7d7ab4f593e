//! In-memory flight store.

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::Result;
use crate::flight::{Flight, FlightStore};

/// Flight store held entirely in memory.
///
/// Results keep insertion order.
#[derive(Debug, Default)]
pub struct InMemoryFlightStore {
    flights: RwLock<Vec<Flight>>,
}

impl InMemoryFlightStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-loaded with `flights`.
    pub fn with_flights(flights: Vec<Flight>) -> Self {
        Self { flights: RwLock::new(flights) }
    }

    /// Creates a store loaded with the bundled sample schedule.
    pub fn seeded() -> Self {
        Self::with_flights(crate::seed::sample_flights())
    }

    /// Adds a flight.
    pub async fn insert(&self, flight: Flight) {
        self.flights.write().await.push(flight);
    }

    /// Number of stored flights.
    pub async fn len(&self) -> usize {
        self.flights.read().await.len()
    }

    /// Returns true if the store holds no flights.
    pub async fn is_empty(&self) -> bool {
        self.flights.read().await.is_empty()
    }
}

#[async_trait]
impl FlightStore for InMemoryFlightStore {
    async fn search(&self, origin: &str, destination: &str, date: &str) -> Result<Vec<Flight>> {
        let route = Flight::route_key(origin, destination);
        let flights: Vec<Flight> = self
            .flights
            .read()
            .await
            .iter()
            .filter(|f| f.route == route && f.date == date)
            .cloned()
            .collect();
        debug!(route = %route, date = %date, count = flights.len(), "Searched flights");
        Ok(flights)
    }

    async fn find_by_id(&self, flight_id: &str) -> Result<Vec<Flight>> {
        let flights: Vec<Flight> = self
            .flights
            .read()
            .await
            .iter()
            .filter(|f| f.flight_id == flight_id)
            .cloned()
            .collect();
        debug!(flight_id = %flight_id, count = flights.len(), "Looked up flight");
        Ok(flights)
    }
}
