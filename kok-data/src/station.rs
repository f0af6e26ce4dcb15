//! Station metadata and the filter lists derived from it.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Editable station fields, as submitted on the add/edit forms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct StationFields {
    /// Station code, the key every measurement row refers to.
    pub station: String,
    pub river: String,
    /// Sampling site description.
    pub location: String,
    pub tambon: String,
    pub amphoe: String,
    pub province: String,
}

impl StationFields {
    pub fn trimmed(&self) -> Self {
        Self {
            station: self.station.trim().to_string(),
            river: self.river.trim().to_string(),
            location: self.location.trim().to_string(),
            tambon: self.tambon.trim().to_string(),
            amphoe: self.amphoe.trim().to_string(),
            province: self.province.trim().to_string(),
        }
    }
}

/// A stored station row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Station {
    pub id: i64,
    #[serde(flatten)]
    pub fields: StationFields,
}

/// Filter choices offered above the station list.
///
/// `location_hierarchy` drives the cascading province → amphoe → tambon
/// dropdowns and only includes stations where all three are known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct StationFilters {
    pub rivers: Vec<String>,
    pub provinces: Vec<String>,
    pub tambons: Vec<String>,
    pub amphoes: Vec<String>,
    pub location_hierarchy: BTreeMap<String, BTreeMap<String, Vec<String>>>,
}

impl StationFilters {
    pub fn from_stations(stations: &[Station]) -> Self {
        fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
            values
                .filter(|v| !v.is_empty())
                .collect::<BTreeSet<_>>()
                .into_iter()
                .map(str::to_string)
                .collect()
        }

        let fields = || stations.iter().map(|s| &s.fields);

        let mut hierarchy: BTreeMap<String, BTreeMap<String, BTreeSet<String>>> = BTreeMap::new();
        for f in fields() {
            if f.province.is_empty() || f.amphoe.is_empty() || f.tambon.is_empty() {
                continue;
            }
            hierarchy
                .entry(f.province.clone())
                .or_default()
                .entry(f.amphoe.clone())
                .or_default()
                .insert(f.tambon.clone());
        }

        Self {
            rivers: distinct(fields().map(|f| f.river.as_str())),
            provinces: distinct(fields().map(|f| f.province.as_str())),
            tambons: distinct(fields().map(|f| f.tambon.as_str())),
            amphoes: distinct(fields().map(|f| f.amphoe.as_str())),
            location_hierarchy: hierarchy
                .into_iter()
                .map(|(province, amphoes)| {
                    let amphoes = amphoes
                        .into_iter()
                        .map(|(amphoe, tambons)| (amphoe, tambons.into_iter().collect()))
                        .collect();
                    (province, amphoes)
                })
                .collect(),
        }
    }
}
