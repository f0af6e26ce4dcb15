//! Pre-fill grid for the edit station form.

use crate::check::parse_check_label;
use crate::record::{MeasurementFamily, MeasurementRecord};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EditRow {
    pub parameter: String,
    pub unit: Option<String>,
    /// Raw value per check ordinal.
    pub checks: BTreeMap<i64, Option<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EditGrid {
    /// Parameters in the order they were first stored.
    pub rows: Vec<EditRow>,
    /// Number of check columns to render.
    pub check_count: usize,
}

/// Regroup stored records into form rows.
///
/// Records whose label has no check ordinal cannot be placed in a numbered
/// form column and are left out. `check_count` is the number of checks of
/// the first parameter, or the family default for an empty grid.
pub fn build_edit_grid(records: &[MeasurementRecord], family: MeasurementFamily) -> EditGrid {
    let mut rows: Vec<EditRow> = Vec::new();

    for record in records {
        let record = record.trimmed();
        let Some(ordinal) = parse_check_label(&record.check_label).as_ordinal() else {
            log::debug!("edit: skipping unnumbered check '{}'", record.check_label);
            continue;
        };
        let pos = match rows.iter().position(|r| r.parameter == record.parameter) {
            Some(pos) => pos,
            None => {
                rows.push(EditRow {
                    parameter: record.parameter.clone(),
                    unit: if family.is_unit_bearing() { record.unit.clone() } else { None },
                    checks: BTreeMap::new(),
                });
                rows.len() - 1
            }
        };
        rows[pos].checks.insert(ordinal, record.raw_value);
    }

    let check_count = match rows.first().map(|r| r.checks.len()) {
        Some(n) if n > 0 => n,
        _ => family.default_check_count(),
    };

    EditGrid { rows, check_count }
}
