//! CSV data loading functions for populating the station database.
//!
//! The field survey spreadsheets are exported as CSV with Thai headers,
//! often with a UTF-8 byte order mark glued to the first header. Columns
//! are located by header name, so column order does not matter and the
//! English column names are accepted as well.
//!
//! # CSV Formats
//!
//! - **Stations**: `แม่น้ำ,สถานี,บริเวณที่เก็บ,ตำบล,อำเภอ,จังหวัด`
//!   (`river,station,location,tambon,amphoe,province`)
//! - **Water**: `สถานี,สิ่งที่ตรวจ,ที่ตั้ง,หน่วย,ครั้งที่ตรวจ,ค่าที่ได้,ค่าที่วัดได้`
//!   (`station,parameter,location,unit,check_number,value,numeric_value`)
//! - **Soil**: `สถานี,สารที่ตรวจ,บริเวณจุดเก็บ,ครั้งที่ตรวจ,ค่าที่ได้,ค่าที่วัดได้`
//!   (`station,parameter,location,check_number,value,numeric_value`)

use crate::queries::insert_measurement;
use crate::Database;
use csv::StringRecord;
use kok_data::numeric::coerce_numeric;
use kok_data::{MeasurementFamily, MeasurementRecord};
use rusqlite::params;

const STATION: &[&str] = &["สถานี", "station"];
const RIVER: &[&str] = &["แม่น้ำ", "river"];
const STATION_LOCATION: &[&str] = &["บริเวณที่เก็บ", "location"];
const TAMBON: &[&str] = &["ตำบล", "tambon"];
const AMPHOE: &[&str] = &["อำเภอ", "amphoe"];
const PROVINCE: &[&str] = &["จังหวัด", "province"];

const WATER_PARAMETER: &[&str] = &["สิ่งที่ตรวจ", "parameter"];
const SOIL_PARAMETER: &[&str] = &["สารที่ตรวจ", "parameter"];
const WATER_LOCATION: &[&str] = &["ที่ตั้ง", "location"];
const SOIL_LOCATION: &[&str] = &["บริเวณจุดเก็บ", "location"];
const CHECK_NUMBER: &[&str] = &["ครั้งที่ตรวจ", "check_number", "check"];
const VALUE: &[&str] = &["ค่าที่ได้", "value"];
const NUMERIC_VALUE: &[&str] = &["ค่าที่วัดได้", "numeric_value"];
const UNIT: &[&str] = &["หน่วย", "unit"];

/// Position of the first header matching any alias.
fn column(headers: &StringRecord, aliases: &[&str]) -> Option<usize> {
    headers.iter().position(|h| {
        let h = h.trim_start_matches('\u{feff}').trim();
        aliases.iter().any(|a| h.eq_ignore_ascii_case(a))
    })
}

fn required_column(headers: &StringRecord, aliases: &[&str]) -> anyhow::Result<usize> {
    column(headers, aliases)
        .ok_or_else(|| anyhow::anyhow!("CSV is missing a '{}' column", aliases.join("' / '")))
}

fn field<'a>(record: &'a StringRecord, idx: Option<usize>) -> &'a str {
    idx.and_then(|i| record.get(i)).unwrap_or("").trim()
}

fn optional_field(record: &StringRecord, idx: Option<usize>) -> Option<String> {
    idx.and_then(|i| record.get(i)).map(|v| v.trim().to_string())
}

impl Database {
    /// Load station metadata from a headered CSV string.
    ///
    /// Rows without a station code are skipped. Returns the number of
    /// stations inserted.
    ///
    /// # Example CSV
    /// ```text
    /// river,station,location,tambon,amphoe,province
    /// Kok,KK01,Bridge,Rim Kok,Mueang,Chiang Rai
    /// ```
    pub fn load_stations(&self, csv_data: &str) -> anyhow::Result<usize> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(csv_data.as_bytes());
        let headers = rdr.headers()?.clone();
        let station_col = Some(required_column(&headers, STATION)?);
        let river_col = column(&headers, RIVER);
        let location_col = column(&headers, STATION_LOCATION);
        let tambon_col = column(&headers, TAMBON);
        let amphoe_col = column(&headers, AMPHOE);
        let province_col = column(&headers, PROVINCE);

        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let mut count = 0usize;
        let mut skipped = 0usize;
        for result in rdr.records() {
            let r = result?;
            let station = field(&r, station_col);
            if station.is_empty() {
                skipped += 1;
                continue;
            }
            tx.execute(
                "INSERT INTO station_data (station, river, location, tambon, amphoe, province)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    station,
                    field(&r, river_col),
                    field(&r, location_col),
                    field(&r, tambon_col),
                    field(&r, amphoe_col),
                    field(&r, province_col),
                ],
            )?;
            count += 1;
        }
        tx.commit()?;
        log::info!("[KOK] loader: Loaded {} stations, skipped {} without a code", count, skipped);
        Ok(count)
    }

    /// Load measurements of one family from a headered CSV string.
    ///
    /// Rows without a station, parameter or check label are skipped. When
    /// the file has no numeric column, the number is derived from the raw
    /// value. Returns the number of records inserted.
    ///
    /// # Example CSV
    /// ```text
    /// station,parameter,unit,check_number,value,numeric_value
    /// KK01,pH,-,ครั้งที่ 1,7.2,7.2
    /// KK01,BOD,mg/L,ครั้งที่ 1,<1,0
    /// ```
    pub fn load_measurements(
        &self,
        family: MeasurementFamily,
        csv_data: &str,
    ) -> anyhow::Result<usize> {
        let (parameter_aliases, location_aliases) = match family {
            MeasurementFamily::Water => (WATER_PARAMETER, WATER_LOCATION),
            MeasurementFamily::Soil => (SOIL_PARAMETER, SOIL_LOCATION),
        };

        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(csv_data.as_bytes());
        let headers = rdr.headers()?.clone();
        let station_col = Some(required_column(&headers, STATION)?);
        let parameter_col = Some(required_column(&headers, parameter_aliases)?);
        let check_col = Some(required_column(&headers, CHECK_NUMBER)?);
        let location_col = column(&headers, location_aliases);
        let value_col = column(&headers, VALUE);
        let numeric_col = column(&headers, NUMERIC_VALUE);
        let unit_col = if family.is_unit_bearing() {
            column(&headers, UNIT)
        } else {
            None
        };

        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let mut count = 0usize;
        let mut skipped = 0usize;
        for result in rdr.records() {
            let r = result?;
            let station = field(&r, station_col);
            let parameter = field(&r, parameter_col);
            let check_label = field(&r, check_col);
            if station.is_empty() || parameter.is_empty() || check_label.is_empty() {
                skipped += 1;
                continue;
            }

            let raw_value = optional_field(&r, value_col);
            let numeric_value = match numeric_col {
                Some(_) => field(&r, numeric_col).parse::<f64>().ok(),
                None => raw_value.as_deref().and_then(coerce_numeric),
            };

            let record = MeasurementRecord {
                parameter: parameter.to_string(),
                location: optional_field(&r, location_col),
                check_label: check_label.to_string(),
                raw_value,
                numeric_value,
                unit: optional_field(&r, unit_col),
            };
            insert_measurement(&tx, family, station, &record)?;
            count += 1;
        }
        tx.commit()?;
        log::info!(
            "[KOK] loader: Loaded {} {} measurements, skipped {} incomplete",
            count,
            family,
            skipped
        );
        Ok(count)
    }
}
