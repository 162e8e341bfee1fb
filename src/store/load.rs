//! Census Gazetteer TSV loaders.
//!
//! Reads the 2010 Gazetteer "ZCTA" and "Places" files: tab-separated, one
//! header row, columns identified by name. Files ending in `.gz` are
//! decompressed on the fly. Rows whose key, coordinate, or counts fail to
//! parse are skipped and counted; the tables themselves must be structurally
//! sound or loading fails.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::ReaderBuilder;
use flate2::read::GzDecoder;
use hashbrown::HashMap;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::models::{normalize_city, normalize_state, CityKey, CityRecord, GeoPoint, ZipRecord};

fn open_maybe_gz(path: &Path) -> Result<Box<dyn Read>> {
    let file = File::open(path)?;
    if path.extension().is_some_and(|e| e == "gz") {
        Ok(Box::new(GzDecoder::new(file)))
    } else {
        Ok(Box::new(file))
    }
}

/// Find a column by header name. Gazetteer files pad the last header with
/// trailing whitespace, so names are compared trimmed.
fn position(headers: &csv::ByteRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| String::from_utf8_lossy(h).trim() == name)
        .ok_or_else(|| Error::MissingColumn(name.to_string()))
}

/// Field accessor tolerating the Latin-1 encoding of the Places file.
fn field(record: &csv::ByteRecord, idx: usize) -> String {
    String::from_utf8_lossy(record.get(idx).unwrap_or_default())
        .trim()
        .to_string()
}

struct GazetteerColumns {
    key: usize,
    name: Option<usize>,
    population: usize,
    housing_units: usize,
    land_mi2: usize,
    water_mi2: usize,
    lat: usize,
    lon: usize,
}

impl GazetteerColumns {
    fn resolve(headers: &csv::ByteRecord, key: &str, name: Option<&str>) -> Result<Self> {
        Ok(Self {
            key: position(headers, key)?,
            name: name.map(|n| position(headers, n)).transpose()?,
            population: position(headers, "POP10")?,
            housing_units: position(headers, "HU10")?,
            land_mi2: position(headers, "ALAND_SQMI")?,
            water_mi2: position(headers, "AWATER_SQMI")?,
            lat: position(headers, "INTPTLAT")?,
            lon: position(headers, "INTPTLONG")?,
        })
    }
}

/// Load the ZCTA Gazetteer file into a map keyed by ZIP code.
pub fn load_zips(path: &Path) -> Result<HashMap<u32, ZipRecord>> {
    info!("Loading ZIP gazetteer from {}", path.display());

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .delimiter(b'\t')
        .from_reader(open_maybe_gz(path)?);

    let cols = GazetteerColumns::resolve(reader.byte_headers()?, "GEOID", None)?;

    let mut map = HashMap::new();
    let mut skipped = 0usize;
    for result in reader.byte_records() {
        let record = result?;
        match parse_zip_row(&record, &cols) {
            Some(rec) => {
                map.insert(rec.zip, rec);
            }
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        warn!("Skipped {} ZIP rows with unparseable fields", skipped);
    }
    info!("Loaded {} ZIP records", map.len());
    Ok(map)
}

/// Load the Places Gazetteer file into a map keyed by normalized
/// (state, city). The `NAME` column carries the descriptor suffix that
/// [`normalize_city`] strips, the same function applied to queries.
pub fn load_cities(path: &Path) -> Result<HashMap<CityKey, CityRecord>> {
    info!("Loading places gazetteer from {}", path.display());

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .delimiter(b'\t')
        .from_reader(open_maybe_gz(path)?);

    let cols = GazetteerColumns::resolve(reader.byte_headers()?, "USPS", Some("NAME"))?;

    let mut map = HashMap::new();
    let mut skipped = 0usize;
    for result in reader.byte_records() {
        let record = result?;
        match parse_city_row(&record, &cols) {
            Some(rec) => {
                map.insert(rec.key.clone(), rec);
            }
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        warn!("Skipped {} place rows with unparseable fields", skipped);
    }
    info!("Loaded {} place records", map.len());
    Ok(map)
}

fn parse_zip_row(record: &csv::ByteRecord, cols: &GazetteerColumns) -> Option<ZipRecord> {
    let zip = field(record, cols.key).parse().ok()?;
    let (population, housing_units, land_mi2, water_mi2, location) = parse_attributes(record, cols)?;
    Some(ZipRecord {
        zip,
        population,
        housing_units,
        land_mi2,
        water_mi2,
        location,
    })
}

fn parse_city_row(record: &csv::ByteRecord, cols: &GazetteerColumns) -> Option<CityRecord> {
    let state = normalize_state(&field(record, cols.key));
    let city = normalize_city(&field(record, cols.name?));
    if state.is_empty() || city.is_empty() {
        return None;
    }
    let (population, housing_units, land_mi2, water_mi2, location) = parse_attributes(record, cols)?;
    Some(CityRecord {
        key: CityKey { state, city },
        population,
        housing_units,
        land_mi2,
        water_mi2,
        location,
    })
}

/// Shared attribute columns; `None` excludes the row (notably rows with a
/// missing or unparseable coordinate, which must never enter the store).
fn parse_attributes(
    record: &csv::ByteRecord,
    cols: &GazetteerColumns,
) -> Option<(u64, u64, f64, f64, GeoPoint)> {
    let population = field(record, cols.population).parse().ok()?;
    let housing_units = field(record, cols.housing_units).parse().ok()?;
    let land_mi2 = field(record, cols.land_mi2).parse().ok()?;
    let water_mi2 = field(record, cols.water_mi2).parse().ok()?;
    let lat: f64 = field(record, cols.lat).parse().ok()?;
    let lon: f64 = field(record, cols.lon).parse().ok()?;
    Some((
        population,
        housing_units,
        land_mi2,
        water_mi2,
        GeoPoint::new(lat, lon),
    ))
}
