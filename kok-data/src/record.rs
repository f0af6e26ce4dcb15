//! Long-format measurement records and the two measurement families.

use serde::{Deserialize, Serialize};

/// One observed value for one parameter at one station on one check occasion.
///
/// Records come straight out of the store (or out of a submitted form) and
/// are never mutated by the pivot builder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MeasurementRecord {
    pub parameter: String,
    pub location: Option<String>,
    /// Occasion label, e.g. `"ครั้งที่ 5"`.
    pub check_label: String,
    /// Value exactly as entered (`"<0.5"`, `"ND"`, `"7.2"` ...).
    pub raw_value: Option<String>,
    pub numeric_value: Option<f64>,
    pub unit: Option<String>,
}

impl MeasurementRecord {
    /// Copy of the record with surrounding whitespace removed from every
    /// string field.
    pub fn trimmed(&self) -> Self {
        fn trim_opt(s: &Option<String>) -> Option<String> {
            s.as_deref().map(|v| v.trim().to_string())
        }
        Self {
            parameter: self.parameter.trim().to_string(),
            location: trim_opt(&self.location),
            check_label: self.check_label.trim().to_string(),
            raw_value: trim_opt(&self.raw_value),
            numeric_value: self.numeric_value,
            unit: trim_opt(&self.unit),
        }
    }
}

/// Which measurement table a record belongs to.
///
/// Water samples carry a unit per parameter and are collected up to 14 times;
/// soil samples have no unit column and are collected up to 8 times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeasurementFamily {
    Water,
    Soil,
}

impl MeasurementFamily {
    pub fn is_unit_bearing(self) -> bool {
        matches!(self, MeasurementFamily::Water)
    }

    /// Number of check columns shown on an empty form.
    pub fn default_check_count(self) -> usize {
        match self {
            MeasurementFamily::Water => 14,
            MeasurementFamily::Soil => 8,
        }
    }

    /// Form field holding the repeated parameter names.
    pub fn parameter_field(self) -> &'static str {
        match self {
            MeasurementFamily::Water => "parameter[]",
            MeasurementFamily::Soil => "soil_parameter[]",
        }
    }

    /// Form field holding the repeated values of check `index`.
    pub fn check_field(self, index: usize) -> String {
        match self {
            MeasurementFamily::Water => format!("check{}[]", index),
            MeasurementFamily::Soil => format!("soil_check{}[]", index),
        }
    }

    /// Check index named by a form field, the inverse of [`Self::check_field`].
    pub fn check_field_index(self, field: &str) -> Option<usize> {
        let prefix = match self {
            MeasurementFamily::Water => "check",
            MeasurementFamily::Soil => "soil_check",
        };
        field
            .strip_prefix(prefix)?
            .strip_suffix("[]")?
            .parse::<usize>()
            .ok()
            .filter(|&i| i > 0)
    }

    /// Form field overriding the number of check columns submitted.
    pub fn count_field(self) -> &'static str {
        match self {
            MeasurementFamily::Water => "water_check_count",
            MeasurementFamily::Soil => "soil_check_count",
        }
    }

    /// Form field holding the repeated units, if this family has one.
    pub fn unit_field(self) -> Option<&'static str> {
        match self {
            MeasurementFamily::Water => Some("unit[]"),
            MeasurementFamily::Soil => None,
        }
    }
}

impl std::fmt::Display for MeasurementFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MeasurementFamily::Water => write!(f, "water"),
            MeasurementFamily::Soil => write!(f, "soil"),
        }
    }
}

impl std::str::FromStr for MeasurementFamily {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "water" => Ok(MeasurementFamily::Water),
            "soil" => Ok(MeasurementFamily::Soil),
            other => Err(format!("unknown measurement family: {}", other)),
        }
    }
}
