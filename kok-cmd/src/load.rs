//! CSV import into the station database.

use kok_data::MeasurementFamily;
use kok_db::Database;
use log::info;
use std::path::Path;

fn read(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("cannot read {}: {}", path.display(), e))
}

/// Import whichever of the three exports were given, stations first.
pub fn run_load(
    db_path: &Path,
    stations: Option<&Path>,
    water: Option<&Path>,
    soil: Option<&Path>,
) -> anyhow::Result<()> {
    if stations.is_none() && water.is_none() && soil.is_none() {
        anyhow::bail!("nothing to load: pass --stations, --water and/or --soil");
    }
    let db = Database::open(db_path)?;

    if let Some(path) = stations {
        let count = db.load_stations(&read(path)?)?;
        info!("Loaded {} stations from {}", count, path.display());
    }
    for (family, path) in [
        (MeasurementFamily::Water, water),
        (MeasurementFamily::Soil, soil),
    ] {
        if let Some(path) = path {
            let count = db.load_measurements(family, &read(path)?)?;
            info!("Loaded {} {} records from {}", count, family, path.display());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_all_exports() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("kok.db");
        let stations = dir.path().join("stations.csv");
        let water = dir.path().join("water.csv");
        std::fs::write(
            &stations,
            "station,river,location,tambon,amphoe,province\nKK01,Kok,Bridge,Rim Kok,Mueang,Chiang Rai\n",
        )
        .unwrap();
        std::fs::write(
            &water,
            "station,parameter,unit,check_number,value\nKK01,pH,-,ครั้งที่ 1,7.2\n",
        )
        .unwrap();

        run_load(&db_path, Some(stations.as_path()), Some(water.as_path()), None).unwrap();

        let db = Database::open(&db_path).unwrap();
        assert!(db.query_station("KK01").unwrap().is_some());
        let records = db.query_measurements(MeasurementFamily::Water, "KK01").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].numeric_value, Some(7.2));
    }

    #[test]
    fn requires_at_least_one_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = run_load(&dir.path().join("kok.db"), None, None, None).unwrap_err();
        assert!(err.to_string().contains("nothing to load"));
    }

    #[test]
    fn missing_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.csv");
        let err = run_load(&dir.path().join("kok.db"), Some(missing.as_path()), None, None)
            .unwrap_err();
        assert!(err.to_string().contains("nope.csv"));
    }
}
