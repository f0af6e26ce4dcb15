//! Typed query methods for stations, measurements and users.
//!
//! Station codes are always matched on `TRIM(station)` against the trimmed
//! code, because the imported spreadsheets carry stray whitespace.

use crate::models::User;
use crate::Database;
use kok_data::{MeasurementFamily, MeasurementRecord, Station, StationFields};
use rusqlite::types::ValueRef;
use rusqlite::{params, Connection, OptionalExtension, Row};

fn measurement_table(family: MeasurementFamily) -> &'static str {
    match family {
        MeasurementFamily::Water => "water_data",
        MeasurementFamily::Soil => "soil_data",
    }
}

/// Read a column as text whatever its storage class.
fn text_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<String>> {
    Ok(match row.get_ref(idx)? {
        ValueRef::Null => None,
        ValueRef::Integer(i) => Some(i.to_string()),
        ValueRef::Real(f) => Some(f.to_string()),
        ValueRef::Text(t) | ValueRef::Blob(t) => Some(String::from_utf8_lossy(t).into_owned()),
    })
}

/// Read a column as a number whatever its storage class; text that is not
/// a number reads as `None`.
fn number_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<f64>> {
    Ok(match row.get_ref(idx)? {
        ValueRef::Null | ValueRef::Blob(_) => None,
        ValueRef::Integer(i) => Some(i as f64),
        ValueRef::Real(f) => Some(f),
        ValueRef::Text(t) => std::str::from_utf8(t)
            .ok()
            .and_then(|s| s.trim().parse::<f64>().ok()),
    })
}

fn station_from_row(row: &Row<'_>) -> rusqlite::Result<Station> {
    let text = |idx| -> rusqlite::Result<String> {
        Ok(text_at(row, idx)?.unwrap_or_default().trim().to_string())
    };
    Ok(Station {
        id: row.get(0)?,
        fields: StationFields {
            river: text(1)?,
            station: text(2)?,
            location: text(3)?,
            tambon: text(4)?,
            amphoe: text(5)?,
            province: text(6)?,
        },
    })
}

/// Insert one measurement row for `station`.
pub(crate) fn insert_measurement(
    conn: &Connection,
    family: MeasurementFamily,
    station: &str,
    record: &MeasurementRecord,
) -> rusqlite::Result<()> {
    match family {
        MeasurementFamily::Water => conn.execute(
            "INSERT INTO water_data (station, parameter, location, unit, check_number, value, numeric_value)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                station,
                record.parameter,
                record.location,
                record.unit,
                record.check_label,
                record.raw_value,
                record.numeric_value,
            ],
        )?,
        MeasurementFamily::Soil => conn.execute(
            "INSERT INTO soil_data (station, parameter, location, check_number, value, numeric_value)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                station,
                record.parameter,
                record.location,
                record.check_label,
                record.raw_value,
                record.numeric_value,
            ],
        )?,
    };
    Ok(())
}

fn insert_all(
    conn: &Connection,
    station: &str,
    water: &[MeasurementRecord],
    soil: &[MeasurementRecord],
) -> rusqlite::Result<()> {
    for record in water {
        insert_measurement(conn, MeasurementFamily::Water, station, record)?;
    }
    for record in soil {
        insert_measurement(conn, MeasurementFamily::Soil, station, record)?;
    }
    Ok(())
}

fn delete_measurements(conn: &Connection, code: &str) -> rusqlite::Result<()> {
    conn.execute("DELETE FROM water_data WHERE TRIM(station) = ?1", params![code])?;
    conn.execute("DELETE FROM soil_data WHERE TRIM(station) = ?1", params![code])?;
    Ok(())
}

impl Database {
    // ───────────────────── Station Queries ─────────────────────

    /// All stations ordered by river then station code, string fields trimmed.
    pub fn query_stations(&self) -> anyhow::Result<Vec<Station>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, river, station, location, tambon, amphoe, province
             FROM station_data
             ORDER BY TRIM(river), TRIM(station)",
        )?;
        let rows = stmt
            .query_map([], station_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        log::info!("[KOK] query: query_stations returned {} records", rows.len());
        Ok(rows)
    }

    /// Station with the given code, if any.
    pub fn query_station(&self, code: &str) -> anyhow::Result<Option<Station>> {
        let conn = self.conn()?;
        let station = conn
            .query_row(
                "SELECT id, river, station, location, tambon, amphoe, province
                 FROM station_data
                 WHERE TRIM(station) = ?1
                 ORDER BY id
                 LIMIT 1",
                params![code.trim()],
                station_from_row,
            )
            .optional()?;
        log::debug!("[KOK] query: query_station({}) found={}", code.trim(), station.is_some());
        Ok(station)
    }

    // ───────────────────── Measurement Queries ─────────────────────

    /// Measurement records of `family` for a station, in insertion order.
    ///
    /// The value columns are read with type coercion, so rows imported with
    /// numbers stored as text still yield a numeric value.
    pub fn query_measurements(
        &self,
        family: MeasurementFamily,
        code: &str,
    ) -> anyhow::Result<Vec<MeasurementRecord>> {
        let unit_column = if family.is_unit_bearing() { "unit" } else { "NULL" };
        let sql = format!(
            "SELECT parameter, location, check_number, value, numeric_value, {}
             FROM {}
             WHERE TRIM(station) = ?1
             ORDER BY id",
            unit_column,
            measurement_table(family)
        );
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![code.trim()], |row| {
                Ok(MeasurementRecord {
                    parameter: text_at(row, 0)?.unwrap_or_default(),
                    location: text_at(row, 1)?,
                    check_label: text_at(row, 2)?.unwrap_or_default(),
                    raw_value: text_at(row, 3)?,
                    numeric_value: number_at(row, 4)?,
                    unit: text_at(row, 5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        log::info!(
            "[KOK] query: query_measurements({}, {}) returned {} records",
            family,
            code.trim(),
            rows.len()
        );
        Ok(rows)
    }

    // ───────────────────── Station Mutations ─────────────────────

    /// Insert a station together with its measurements in one transaction.
    ///
    /// Returns the new station row id.
    pub fn insert_station(
        &self,
        fields: &StationFields,
        water: &[MeasurementRecord],
        soil: &[MeasurementRecord],
    ) -> anyhow::Result<i64> {
        let fields = fields.trimmed();
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO station_data (station, river, tambon, amphoe, province, location)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                fields.station,
                fields.river,
                fields.tambon,
                fields.amphoe,
                fields.province,
                fields.location,
            ],
        )?;
        let id = tx.last_insert_rowid();
        insert_all(&tx, &fields.station, water, soil)?;
        tx.commit()?;
        log::info!(
            "[KOK] station: inserted {} with {} water and {} soil records",
            fields.station,
            water.len(),
            soil.len()
        );
        Ok(id)
    }

    /// Replace a station's metadata and all of its measurements.
    ///
    /// `code` is the station's current code; `fields.station` may rename it.
    /// Returns `false` (and changes nothing) when no station has that code.
    pub fn update_station(
        &self,
        code: &str,
        fields: &StationFields,
        water: &[MeasurementRecord],
        soil: &[MeasurementRecord],
    ) -> anyhow::Result<bool> {
        let code = code.trim();
        let fields = fields.trimmed();
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let updated = tx.execute(
            "UPDATE station_data
             SET station = ?1, river = ?2, tambon = ?3, amphoe = ?4, province = ?5, location = ?6
             WHERE TRIM(station) = ?7",
            params![
                fields.station,
                fields.river,
                fields.tambon,
                fields.amphoe,
                fields.province,
                fields.location,
                code,
            ],
        )?;
        if updated == 0 {
            log::warn!("[KOK] station: update of unknown station {}", code);
            return Ok(false);
        }
        delete_measurements(&tx, code)?;
        insert_all(&tx, &fields.station, water, soil)?;
        tx.commit()?;
        log::info!(
            "[KOK] station: updated {} -> {} with {} water and {} soil records",
            code,
            fields.station,
            water.len(),
            soil.len()
        );
        Ok(true)
    }

    /// Delete a station and every measurement recorded for it.
    ///
    /// Returns the number of station rows removed.
    pub fn delete_station(&self, code: &str) -> anyhow::Result<usize> {
        let code = code.trim();
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        delete_measurements(&tx, code)?;
        let removed = tx.execute(
            "DELETE FROM station_data WHERE TRIM(station) = ?1",
            params![code],
        )?;
        tx.commit()?;
        log::info!("[KOK] station: deleted {} ({} rows)", code, removed);
        Ok(removed)
    }

    // ───────────────────── Users ─────────────────────

    pub fn query_user(&self, username: &str) -> anyhow::Result<Option<User>> {
        let conn = self.conn()?;
        let user = conn
            .query_row(
                "SELECT username, password FROM users WHERE username = ?1",
                params![username],
                |row| {
                    Ok(User {
                        username: row.get(0)?,
                        password: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(user)
    }

    /// Create a login account. Returns `false` if the username already exists.
    pub fn create_user(&self, username: &str, password: &str) -> anyhow::Result<bool> {
        let conn = self.conn()?;
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO users (username, password) VALUES (?1, ?2)",
            params![username, password],
        )?;
        Ok(inserted == 1)
    }
}
