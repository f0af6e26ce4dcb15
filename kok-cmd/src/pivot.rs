//! Pivot table inspection from the command line.

use kok_data::{build_pivot, MeasurementFamily};
use kok_db::Database;
use std::path::Path;

/// Pivot table of `family` for `station`, pretty-printed as JSON.
pub fn pivot_json(
    db: &Database,
    station: &str,
    family: MeasurementFamily,
) -> anyhow::Result<String> {
    if db.query_station(station)?.is_none() {
        anyhow::bail!("station not found: {}", station.trim());
    }
    let records = db.query_measurements(family, station)?;
    let table = build_pivot(&records, family.is_unit_bearing());
    Ok(serde_json::to_string_pretty(&table)?)
}

pub fn run_pivot(db_path: &Path, station: &str, family: MeasurementFamily) -> anyhow::Result<()> {
    let db = Database::open(db_path)?;
    println!("{}", pivot_json(&db, station, family)?);
    Ok(())
}
