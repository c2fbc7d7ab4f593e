//! Seed command implementation.

use anyhow::Context;
use serde_json::json;
use std::path::Path;
use tracing::info;
use waypoint_store::{SqliteFlightStore, sample_flights};

use super::print_json;

/// Execute the seed command.
///
/// Upserts the sample schedule, so running it twice leaves one copy.
pub fn execute(db: &Path) -> anyhow::Result<()> {
    let store = SqliteFlightStore::open(db)
        .with_context(|| format!("failed to open flight database {}", db.display()))?;
    let written = store.upsert_all(&sample_flights())?;
    let total = store.count()?;
    info!(path = %db.display(), written, total, "Seeded flight database");

    print_json(&json!({
        "database": db.display().to_string(),
        "written": written,
        "total": total,
    }))
}
