//! SQLite-backed flight store.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection, Row};
use tracing::{debug, info};

use crate::error::{Result, StoreError};
use crate::flight::{Flight, FlightStore};

/// Creates the flights table and its lookup indexes.
///
/// # Errors
/// Returns error if schema creation fails
pub fn initialize_schema(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS flights (
            flight_id TEXT NOT NULL,
            route TEXT NOT NULL,
            date TEXT NOT NULL,
            airline TEXT NOT NULL,
            departure_time TEXT NOT NULL,
            arrival_time TEXT NOT NULL,
            aircraft TEXT NOT NULL,
            price REAL NOT NULL DEFAULT 0.0,
            available_seats INTEGER NOT NULL DEFAULT 0,
            baggage_included BOOLEAN NOT NULL DEFAULT 0,
            PRIMARY KEY (route, flight_id)
        )",
        [],
    )?;

    // Route + date lookups back searchFlights
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_flights_route_date
         ON flights(route, date)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_flights_flight_id
         ON flights(flight_id)",
        [],
    )?;

    Ok(())
}

const SELECT_COLUMNS: &str = "route, flight_id, date, airline, departure_time, arrival_time,
                              aircraft, price, available_seats, baggage_included";

fn row_to_flight(row: &Row<'_>) -> rusqlite::Result<Flight> {
    Ok(Flight {
        route: row.get(0)?,
        flight_id: row.get(1)?,
        date: row.get(2)?,
        airline: row.get(3)?,
        departure_time: row.get(4)?,
        arrival_time: row.get(5)?,
        aircraft: row.get(6)?,
        price: row.get(7)?,
        available_seats: row.get(8)?,
        baggage_included: row.get(9)?,
    })
}

/// Flight store persisted in a SQLite database.
///
/// Queries run on the blocking thread pool so callers on the async runtime
/// are never stalled by disk I/O.
#[derive(Debug, Clone)]
pub struct SqliteFlightStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteFlightStore {
    /// Opens (or creates) a database file and initializes the schema.
    ///
    /// # Errors
    /// Returns error if the file cannot be opened or the schema cannot be created
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        initialize_schema(&conn)?;
        info!(path = %path.display(), "Opened flight database");
        Ok(Self { conn: Arc::new(Mutex::new(conn)) })
    }

    /// Creates a store backed by a private in-memory database.
    ///
    /// # Errors
    /// Returns error if the schema cannot be created
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn: Arc::new(Mutex::new(conn)) })
    }

    /// Inserts or replaces flights in a single transaction.
    ///
    /// Returns the number of rows written.
    ///
    /// # Errors
    /// Returns error if any write fails; no rows are written in that case
    pub fn upsert_all(&self, flights: &[Flight]) -> Result<usize> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO flights (route, flight_id, date, airline, departure_time,
                 arrival_time, aircraft, price, available_seats, baggage_included)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            )?;
            for f in flights {
                stmt.execute(params![
                    f.route,
                    f.flight_id,
                    f.date,
                    f.airline,
                    f.departure_time,
                    f.arrival_time,
                    f.aircraft,
                    f.price,
                    f.available_seats,
                    f.baggage_included,
                ])?;
            }
        }
        tx.commit()?;
        debug!(count = flights.len(), "Upserted flights");
        Ok(flights.len())
    }

    /// Total number of stored flights.
    ///
    /// # Errors
    /// Returns error if the count query fails
    pub fn count(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM flights", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::Unavailable("connection lock poisoned".to_string()))
    }

    async fn query(&self, sql: String, args: Vec<String>) -> Result<Vec<Flight>> {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let conn = conn
                .lock()
                .map_err(|_| StoreError::Unavailable("connection lock poisoned".to_string()))?;
            let mut stmt = conn.prepare(&sql)?;
            let flights = stmt
                .query_map(rusqlite::params_from_iter(args.iter()), row_to_flight)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(flights)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }
}

#[async_trait]
impl FlightStore for SqliteFlightStore {
    async fn search(&self, origin: &str, destination: &str, date: &str) -> Result<Vec<Flight>> {
        let route = Flight::route_key(origin, destination);
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM flights WHERE route = ?1 AND date = ?2 ORDER BY rowid"
        );
        let flights = self.query(sql, vec![route.clone(), date.to_string()]).await?;
        debug!(route = %route, date = %date, count = flights.len(), "Searched flights");
        Ok(flights)
    }

    async fn find_by_id(&self, flight_id: &str) -> Result<Vec<Flight>> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM flights WHERE flight_id = ?1 ORDER BY rowid");
        let flights = self.query(sql, vec![flight_id.to_string()]).await?;
        debug!(flight_id = %flight_id, count = flights.len(), "Looked up flight");
        Ok(flights)
    }
}
