//! Domain logic for the Kok river monitoring stations.
//!
//! Everything here is pure: records go in, reshaped values come out. The
//! database and web crates own all I/O.

pub mod check;
pub mod edit;
pub mod form;
pub mod pivot;
pub mod record;
pub mod station;

pub use check::{parse_check_label, CheckIndex};
pub use pivot::{build_pivot, PivotRow, PivotTable};
pub use record::{MeasurementFamily, MeasurementRecord};
pub use station::{Station, StationFields, StationFilters};

/// Numeric interpretation of entered measurement values.
pub mod numeric {
    /// Placeholders meaning "no measurement".
    pub const NO_VALUE_MARKERS: &[&str] = &["-", "ND"];

    /// Prefix marking a value below the detection limit, e.g. `"<0.5"`.
    pub const BELOW_DETECTION_PREFIX: char = '<';

    /// Numeric value stored alongside a raw entry.
    ///
    /// Blank entries and the no-value markers have no number. Anything below
    /// the detection limit counts as zero. Otherwise the entry must parse as
    /// a float.
    pub fn coerce_numeric(raw: &str) -> Option<f64> {
        let raw = raw.trim();
        if raw.is_empty() || NO_VALUE_MARKERS.contains(&raw) {
            return None;
        }
        if raw.starts_with(BELOW_DETECTION_PREFIX) {
            return Some(0.0);
        }
        raw.parse::<f64>().ok()
    }

}
