//! Measurement pivot builder.
//!
//! Turns the long-format rows of one station (one row per parameter per
//! check) into a parameter × check grid. Water and soil tables share this
//! routine; only water carries a unit column.

use crate::check::{parse_check_label, sort_check_indices, CheckIndex};
use crate::record::MeasurementRecord;
use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, HashMap, HashSet};

/// One parameter's values across every check of the table.
///
/// Both maps hold an entry for every index in [`PivotTable::check_indices`].
/// `values` is the display view: a missing or empty raw value is `None`.
/// `numeric_values` is the numeric view: a missing number is `0.0`.
///
/// In JSON both maps are written as arrays in column order, position `i`
/// belonging to `check_indices[i]` of the table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PivotRow {
    pub parameter: String,
    pub unit: Option<String>,
    #[serde(serialize_with = "in_column_order")]
    pub values: BTreeMap<CheckIndex, Option<String>>,
    #[serde(serialize_with = "in_column_order")]
    pub numeric_values: BTreeMap<CheckIndex, f64>,
}

fn in_column_order<V, S>(cells: &BTreeMap<CheckIndex, V>, serializer: S) -> Result<S::Ok, S::Error>
where
    V: Serialize,
    S: Serializer,
{
    serializer.collect_seq(cells.values())
}

impl PivotRow {
    pub fn value(&self, index: &CheckIndex) -> Option<&str> {
        self.values.get(index).and_then(|v| v.as_deref())
    }

    pub fn numeric(&self, index: &CheckIndex) -> f64 {
        self.numeric_values.get(index).copied().unwrap_or(0.0)
    }
}

/// Parameter × check grid for one station and one measurement family.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct PivotTable {
    /// Column order: ordinals ascending, then fallback labels ascending.
    pub check_indices: Vec<CheckIndex>,
    /// One row per distinct parameter, sorted by parameter name.
    pub rows: Vec<PivotRow>,
}

impl PivotTable {
    pub fn parameters(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.parameter.as_str()).collect()
    }

    pub fn row(&self, parameter: &str) -> Option<&PivotRow> {
        self.rows.iter().find(|r| r.parameter == parameter)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Default)]
struct ParameterGroup {
    values: HashMap<CheckIndex, Option<String>>,
    numeric: HashMap<CheckIndex, f64>,
    unit: Option<String>,
}

/// Build the pivot table for a station's measurement records.
///
/// Never fails: malformed labels fall back to text indices, missing values
/// become `None` / `0.0`. When two records share a parameter and check, the
/// later one wins. With `unit_bearing`, a parameter's unit is taken from the
/// last record scanned for it.
pub fn build_pivot(records: &[MeasurementRecord], unit_bearing: bool) -> PivotTable {
    let mut groups: BTreeMap<String, ParameterGroup> = BTreeMap::new();
    let mut seen: HashSet<CheckIndex> = HashSet::new();
    let mut discovered: Vec<CheckIndex> = Vec::new();

    for record in records {
        let record = record.trimmed();
        let index = parse_check_label(&record.check_label);
        if seen.insert(index.clone()) {
            discovered.push(index.clone());
        }

        let group = groups.entry(record.parameter).or_default();
        group.values.insert(index.clone(), record.raw_value);
        group
            .numeric
            .insert(index, record.numeric_value.unwrap_or(0.0));
        if unit_bearing {
            group.unit = record.unit;
        }
    }

    sort_check_indices(&mut discovered);

    let rows = groups
        .into_iter()
        .map(|(parameter, group)| {
            let mut values = BTreeMap::new();
            let mut numeric_values = BTreeMap::new();
            for index in &discovered {
                let value = group
                    .values
                    .get(index)
                    .cloned()
                    .flatten()
                    .filter(|v| !v.is_empty());
                values.insert(index.clone(), value);
                numeric_values.insert(
                    index.clone(),
                    group.numeric.get(index).copied().unwrap_or(0.0),
                );
            }
            PivotRow {
                parameter,
                unit: group.unit,
                values,
                numeric_values,
            }
        })
        .collect::<Vec<_>>();

    log::debug!(
        "pivot: {} records -> {} parameters x {} checks",
        records.len(),
        rows.len(),
        discovered.len()
    );

    PivotTable {
        check_indices: discovered,
        rows,
    }
}
