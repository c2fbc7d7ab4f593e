//! Flight data access for Waypoint.
//!
//! The flight tools read from a [`FlightStore`]. Two implementations ship
//! with the crate:
//!
//! - [`InMemoryFlightStore`] for demos and tests
//! - [`SqliteFlightStore`] for a persistent schedule

pub mod error;
pub mod flight;
pub mod memory;
pub mod seed;
pub mod sqlite;

pub use error::{Result, StoreError};
pub use flight::{Flight, FlightStore};
pub use memory::InMemoryFlightStore;
pub use seed::sample_flights;
pub use sqlite::SqliteFlightStore;
