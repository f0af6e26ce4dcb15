//! SQLite database layer for the Kok river monitoring stations.
//!
//! This crate wraps a single `rusqlite` connection holding station metadata,
//! the water and soil measurement tables, and login accounts. It exposes
//! typed query methods returning the domain types of [`kok_data`].
//!
//! # Usage
//!
//! ```rust
//! use kok_db::Database;
//! use kok_data::MeasurementFamily;
//!
//! let db = Database::new().unwrap();
//! db.load_stations("station,river,location,tambon,amphoe,province\nKK01,Kok,Bridge,Rim Kok,Mueang,Chiang Rai\n").unwrap();
//! db.load_measurements(
//!     MeasurementFamily::Water,
//!     "station,parameter,unit,check_number,value\nKK01,pH,-,check 1,7.2\n",
//! ).unwrap();
//!
//! let records = db.query_measurements(MeasurementFamily::Water, "KK01").unwrap();
//! let table = kok_data::build_pivot(&records, true);
//! assert_eq!(table.parameters(), vec!["pH"]);
//! ```
//!
//! # Tables
//!
//! See [`schema::create_schema`] for the full SQL schema.
//!
//! - `station_data` - Station metadata
//! - `water_data` / `soil_data` - Long-format measurements keyed by station code
//! - `users` - Login accounts

pub mod schema;
mod loader;
mod queries;
pub mod models;

use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// Shared handle to the station database.
///
/// Cheaply cloneable; clones share one connection guarded by a mutex, so a
/// handle can be stored in web server state and used from any request.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Create a new in-memory database with the full schema applied.
    pub fn new() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn)
    }

    /// Open (or create) a database file and apply the schema.
    pub fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        log::info!("[KOK] db: opened {}", path.display());
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> anyhow::Result<Self> {
        conn.execute_batch(schema::create_schema())?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn conn(&self) -> anyhow::Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow::anyhow!("database connection lock poisoned"))
    }
}
