//! SQL schema definitions for the station database.
//!
//! The schema is applied as a single batch whenever a database is opened,
//! so every statement must be idempotent.

/// Returns the full SQL schema as a single batch string.
///
/// This creates the following tables:
///
/// - `station_data` - Station metadata (code, river, sampling site, tambon, amphoe, province)
/// - `water_data` - Water quality measurements, one row per parameter per check
/// - `soil_data` - Soil/sediment measurements, same shape without a unit column
/// - `users` - Login accounts
///
/// Measurement rows reference their station by code only; station codes are
/// compared after trimming.
pub fn create_schema() -> &'static str {
    r#"
    CREATE TABLE IF NOT EXISTS station_data (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        station TEXT NOT NULL,
        river TEXT NOT NULL DEFAULT '',
        location TEXT NOT NULL DEFAULT '',
        tambon TEXT NOT NULL DEFAULT '',
        amphoe TEXT NOT NULL DEFAULT '',
        province TEXT NOT NULL DEFAULT ''
    );
    CREATE INDEX IF NOT EXISTS idx_station_code ON station_data(station);

    CREATE TABLE IF NOT EXISTS water_data (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        station TEXT NOT NULL,
        parameter TEXT NOT NULL,
        location TEXT,
        unit TEXT,
        check_number TEXT NOT NULL,
        value TEXT,
        numeric_value REAL
    );
    CREATE INDEX IF NOT EXISTS idx_water_station ON water_data(station);

    CREATE TABLE IF NOT EXISTS soil_data (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        station TEXT NOT NULL,
        parameter TEXT NOT NULL,
        location TEXT,
        check_number TEXT NOT NULL,
        value TEXT,
        numeric_value REAL
    );
    CREATE INDEX IF NOT EXISTS idx_soil_station ON soil_data(station);

    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT UNIQUE NOT NULL,
        password TEXT NOT NULL
    );
    "#
}
