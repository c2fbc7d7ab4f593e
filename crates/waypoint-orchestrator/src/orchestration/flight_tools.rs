// Flight lookup tools
//
// searchFlights and getFlightDetails, backed by a FlightStore. Results are
// JSON arrays of flight records; an empty array means nothing matched.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;
use waypoint_abstraction::ToolParameters;
use waypoint_store::FlightStore;

use super::tool::{Tool, ToolArguments, ToolHandler};
use super::tool_registry::ToolRegistry;
use crate::error::ToolError;

/// Name of the route search tool
pub const SEARCH_FLIGHTS: &str = "searchFlights";
/// Name of the flight lookup tool
pub const GET_FLIGHT_DETAILS: &str = "getFlightDetails";

struct SearchFlightsHandler {
    store: Arc<dyn FlightStore>,
}

#[async_trait]
impl ToolHandler for SearchFlightsHandler {
    async fn execute(&self, args: &ToolArguments) -> Result<String, ToolError> {
        let origin = args.require_str("origin")?;
        let destination = args.require_str("destination")?;
        let date = args.require_str("date")?;

        let flights = self.store.search(origin, destination, date).await?;
        debug!(origin, destination, date, count = flights.len(), "searchFlights");
        Ok(serde_json::to_string(&flights)?)
    }
}

struct FlightDetailsHandler {
    store: Arc<dyn FlightStore>,
}

#[async_trait]
impl ToolHandler for FlightDetailsHandler {
    async fn execute(&self, args: &ToolArguments) -> Result<String, ToolError> {
        let flight_id = args.require_str("flightId")?;

        let flights = self.store.find_by_id(flight_id).await?;
        debug!(flight_id, count = flights.len(), "getFlightDetails");
        Ok(serde_json::to_string(&flights)?)
    }
}

/// Route search tool
pub fn search_flights_tool(store: Arc<dyn FlightStore>) -> Tool {
    Tool::new(
        SEARCH_FLIGHTS,
        "Search for available flights between two airports on a given date. \
         Returns a list of matching flights with basic information including \
         flight ID, airline, departure/arrival times, and price.",
        ToolParameters::new()
            .add_property("origin", "string", "IATA airport code for departure (e.g., WAW, CDG, JFK)", true)
            .add_property("destination", "string", "IATA airport code for arrival", true)
            .add_property("date", "string", "Travel date in YYYY-MM-DD format", true),
        Arc::new(SearchFlightsHandler { store }),
    )
}

/// Flight lookup tool
pub fn flight_details_tool(store: Arc<dyn FlightStore>) -> Tool {
    Tool::new(
        GET_FLIGHT_DETAILS,
        "Get detailed information about a specific flight by its ID. \
         Returns full details including aircraft type, available seats, \
         baggage policy, and pricing.",
        ToolParameters::new().add_property("flightId", "string", "Unique flight identifier (e.g., LO335)", true),
        Arc::new(FlightDetailsHandler { store }),
    )
}

/// Registry holding both flight tools
pub fn flight_registry(store: Arc<dyn FlightStore>) -> ToolRegistry {
    ToolRegistry::new()
        .with_tool(search_flights_tool(Arc::clone(&store)))
        .with_tool(flight_details_tool(store))
}
