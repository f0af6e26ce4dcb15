//! Add/edit station form decoding.
//!
//! The forms post repeated fields (`parameter[]`, `check1[]`, `check2[]` ...)
//! where the n-th entry of every `check{i}[]` list belongs to the n-th
//! parameter. One [`MeasurementRecord`] is produced per submitted cell.

use crate::check::format_check_label;
use crate::numeric::coerce_numeric;
use crate::record::{MeasurementFamily, MeasurementRecord};
use crate::station::StationFields;
use std::collections::HashMap;
use std::fmt;

/// A required station field was absent from the submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingField(pub &'static str);

impl fmt::Display for MissingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "missing form field: {}", self.0)
    }
}

impl std::error::Error for MissingField {}

/// Decoded form submission with repeated keys preserved in order.
#[derive(Debug, Clone, Default)]
pub struct MeasurementForm {
    fields: HashMap<String, Vec<String>>,
}

impl MeasurementForm {
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut fields: HashMap<String, Vec<String>> = HashMap::new();
        for (key, value) in pairs {
            fields.entry(key.into()).or_default().push(value.into());
        }
        Self { fields }
    }

    /// First value submitted for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// Every value submitted for `key`, in submission order.
    pub fn get_all(&self, key: &str) -> &[String] {
        self.fields.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn station_fields(&self) -> Result<StationFields, MissingField> {
        let field = |name: &'static str| {
            self.get(name)
                .map(|v| v.trim().to_string())
                .ok_or(MissingField(name))
        };
        Ok(StationFields {
            station: field("station")?,
            river: field("river")?,
            location: field("location")?,
            tambon: field("tambon")?,
            amphoe: field("amphoe")?,
            province: field("province")?,
        })
    }

    /// Number of check columns submitted for `family`.
    ///
    /// Read from the family's count field; a missing or unparseable count
    /// means the family default.
    pub fn check_count(&self, family: MeasurementFamily) -> usize {
        self.get(family.count_field())
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or_else(|| family.default_check_count())
    }

    /// Highest check column of `family` present in the submission.
    fn last_submitted_check(&self, family: MeasurementFamily) -> usize {
        self.fields
            .keys()
            .filter_map(|key| family.check_field_index(key))
            .max()
            .unwrap_or(0)
    }

    /// Expand the submitted grid of `family` into measurement records.
    ///
    /// Cells with no submitted entry are skipped; submitted-but-empty cells
    /// are kept as empty raw values. Columns past the check count, or past
    /// the last submitted column, are never visited.
    pub fn records(&self, family: MeasurementFamily) -> Vec<MeasurementRecord> {
        let parameters = self.get_all(family.parameter_field());
        let units = family.unit_field().map(|f| self.get_all(f)).unwrap_or(&[]);
        let mut records = Vec::new();

        let last = self.check_count(family).min(self.last_submitted_check(family));
        for check in 1..=last {
            let values = self.get_all(&family.check_field(check));
            for (idx, parameter) in parameters.iter().enumerate() {
                let Some(value) = values.get(idx) else {
                    continue;
                };
                let value = value.trim();
                let unit = if family.is_unit_bearing() {
                    Some(units.get(idx).map(|u| u.trim().to_string()).unwrap_or_default())
                } else {
                    None
                };
                records.push(MeasurementRecord {
                    parameter: parameter.trim().to_string(),
                    location: None,
                    check_label: format_check_label(check),
                    raw_value: Some(value.to_string()),
                    numeric_value: coerce_numeric(value),
                    unit,
                });
            }
        }
        log::debug!(
            "form: {} {} records from {} parameters",
            records.len(),
            family,
            parameters.len()
        );
        records
    }
}
