//! Row-wise batch operations with per-row error isolation.
//!
//! Each operation folds over the input rows with an explicit accumulator
//! (retained rows plus a discard counter). A single row's failure, whatever
//! its kind, only drops that row; the batch call itself fails solely on
//! structural problems such as a missing column. Discard totals go to the
//! log, not the return value.

mod table;

pub use table::Table;

use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::lookup::GeoLookup;
use crate::models::CityKey;

/// Negative thresholds disable distance filtering.
fn within_threshold(distance_mi: f64, discard_threshold: f64) -> bool {
    discard_threshold < 0.0 || distance_mi <= discard_threshold
}

/// Parse a ZIP cell. Spreadsheet exports often carry ZIPs as floats.
fn parse_zip(raw: &str) -> Result<u32> {
    let raw = raw.trim();
    if let Ok(zip) = raw.parse() {
        return Ok(zip);
    }
    match raw.parse::<f64>() {
        Ok(f) if f.fract() == 0.0 && (0.0..=f64::from(u32::MAX)).contains(&f) => Ok(f as u32),
        _ => Err(Error::MalformedKey(raw.to_string())),
    }
}

/// Index of `name` in `headers`, appending it if absent.
fn ensure_header(headers: &mut Vec<String>, name: &str) -> usize {
    match headers.iter().position(|h| h == name) {
        Some(idx) => idx,
        None => {
            headers.push(name.to_string());
            headers.len() - 1
        }
    }
}

impl GeoLookup {
    /// Resolve a state/city pair for every row's ZIP value.
    ///
    /// Adds (or replaces) `state` and `city` columns. A row is discarded when
    /// its ZIP cell is empty or malformed, its lookup fails, or the resolver
    /// distance exceeds a non-negative `discard_threshold`.
    ///
    /// # Errors
    ///
    /// Only [`Error::MissingColumn`] if `zip_col` is absent.
    pub fn zip_to_state_city_table(
        &self,
        table: &Table,
        zip_col: &str,
        use_online: bool,
        discard_threshold: f64,
    ) -> Result<Table> {
        let zip_idx = table.column(zip_col)?;
        let mut headers = table.headers().to_vec();
        let state_idx = ensure_header(&mut headers, "state");
        let city_idx = ensure_header(&mut headers, "city");

        let mut out = Table::new(headers);
        let mut discarded = 0usize;
        for row in table.rows() {
            let resolved = row
                .get(zip_idx)
                .and_then(|c| c.as_deref())
                .and_then(|raw| self.row_zip_to_city(raw, use_online, discard_threshold));
            match resolved {
                Some(key) => {
                    let mut cells = row.clone();
                    cells.resize(out.width(), None);
                    cells[state_idx] = Some(key.state);
                    cells[city_idx] = Some(key.city);
                    out.push_row(cells);
                }
                None => discarded += 1,
            }
        }

        info!("{} entries discarded", discarded);
        info!("beware: many ZIPs can map to one state-city, so the output may repeat");
        Ok(out)
    }

    /// One row's zip-to-city attempt; `None` means discard.
    fn row_zip_to_city(
        &self,
        raw: &str,
        use_online: bool,
        discard_threshold: f64,
    ) -> Option<CityKey> {
        let zip = parse_zip(raw).ok()?;
        let hit = self.zip_to_state_city(zip, use_online).ok()?;
        within_threshold(hit.distance_mi, discard_threshold).then_some(hit.key)
    }

    /// Resolve a ZIP for every row's state/city pair.
    ///
    /// Adds (or replaces) a `zip` column under the same discard policy as
    /// [`Self::zip_to_state_city_table`].
    ///
    /// # Errors
    ///
    /// Only [`Error::MissingColumn`] if either input column is absent.
    pub fn state_city_to_zip_table(
        &self,
        table: &Table,
        state_col: &str,
        city_col: &str,
        use_online: bool,
        discard_threshold: f64,
    ) -> Result<Table> {
        let state_idx = table.column(state_col)?;
        let city_idx = table.column(city_col)?;
        let mut headers = table.headers().to_vec();
        let zip_idx = ensure_header(&mut headers, "zip");

        let mut out = Table::new(headers);
        let mut discarded = 0usize;
        for row in table.rows() {
            let state = row.get(state_idx).and_then(|c| c.as_deref());
            let city = row.get(city_idx).and_then(|c| c.as_deref());
            let resolved = match (state, city) {
                (Some(state), Some(city)) => self
                    .state_city_to_zip(state, city, use_online)
                    .ok()
                    .filter(|hit| within_threshold(hit.distance_mi, discard_threshold)),
                _ => None,
            };
            match resolved {
                Some(hit) => {
                    let mut cells = row.clone();
                    cells.resize(out.width(), None);
                    cells[zip_idx] = Some(hit.key.to_string());
                    out.push_row(cells);
                }
                None => discarded += 1,
            }
        }

        info!("{} entries discarded", discarded);
        info!("beware: several state-city pairs can resolve to one ZIP");
        Ok(out)
    }

    /// Validate a ZIP column against the reference store.
    ///
    /// Rows with an empty ZIP cell are dropped upfront and counted
    /// separately. ZIPs present locally pass through unchanged. For the
    /// rest: offline they are discarded; online their geocoded coordinate is
    /// resolved back to the nearest known ZIP under the threshold policy,
    /// and that ZIP replaces the original value.
    ///
    /// # Errors
    ///
    /// Only [`Error::MissingColumn`] if `zip_col` is absent.
    pub fn clean_zips(
        &self,
        table: &Table,
        zip_col: &str,
        use_online: bool,
        discard_threshold: f64,
    ) -> Result<Table> {
        if use_online {
            warn!("online zip filling is coarse and discard thresholds work poorly here");
        }
        let zip_idx = table.column(zip_col)?;

        let mut out = Table::new(table.headers().to_vec());
        let mut missing = 0usize;
        let mut discarded = 0usize;
        for row in table.rows() {
            let Some(raw) = row.get(zip_idx).and_then(|c| c.as_deref()) else {
                missing += 1;
                continue;
            };
            match self.row_clean_zip(raw, use_online, discard_threshold) {
                Some(zip) => {
                    let mut cells = row.clone();
                    cells[zip_idx] = Some(zip.to_string());
                    out.push_row(cells);
                }
                None => discarded += 1,
            }
        }

        info!("{} rows with missing ZIPs dropped", missing);
        info!("{} bad ZIPs discarded", discarded);
        Ok(out)
    }

    /// One row's ZIP validation; `None` means discard.
    fn row_clean_zip(&self, raw: &str, use_online: bool, discard_threshold: f64) -> Option<u32> {
        let zip = parse_zip(raw).ok()?;
        if self.store().zip(zip).is_some() {
            return Some(zip);
        }
        if !use_online {
            return None;
        }
        let location = self.zip_to_coord(zip, true).ok()?;
        let hit = self.coord_to_zip(location.lat, location.lon).ok()?;
        within_threshold(hit.distance_mi, discard_threshold).then_some(hit.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{offline_lookup, online_lookup};

    /// The batch example rows: two local ZIPs, two unknown, one empty.
    fn zip_table() -> Table {
        let mut table = Table::new(vec!["zip".into(), "n".into()]);
        for (zip, n) in [
            (Some("85719"), "0"),
            (Some("94043"), "1"),
            (Some("1234"), "2"),
            (Some("90200"), "3"),
            (None, "4"),
        ] {
            table.push_row(vec![zip.map(String::from), Some(n.into())]);
        }
        table
    }

    fn city_table() -> Table {
        let mut table = Table::new(vec!["state".into(), "city".into(), "n".into()]);
        for (state, city) in [
            (Some("ny"), Some("clifton park")),
            (Some("ma"), Some("boston")),
            (Some("ca"), Some("los Angeles")),
            (None, Some("boston")),
        ] {
            table.push_row(vec![
                state.map(String::from),
                city.map(String::from),
                Some("x".into()),
            ]);
        }
        table
    }

    #[test]
    fn local_only_batch_keeps_known_zips() {
        let lookup = offline_lookup();
        let out = lookup
            .zip_to_state_city_table(&zip_table(), "zip", false, -1.0)
            .unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out.cell(0, 2), Some("az"));
        assert_eq!(out.cell(0, 3), Some("tucson"));
        assert_eq!(out.cell(1, 3), Some("mountain view"));
        // original columns ride along
        assert_eq!(out.cell(0, 1), Some("0"));
    }

    #[test]
    fn online_batch_recovers_unknown_zips() {
        let lookup = online_lookup();
        let out = lookup
            .zip_to_state_city_table(&zip_table(), "zip", true, -1.0)
            .unwrap();
        // the empty-ZIP row is always dropped
        assert_eq!(out.len(), 4);
        assert_eq!(out.cell(2, 3), Some("new york"));
        assert_eq!(out.cell(3, 3), Some("los angeles"));
    }

    #[test]
    fn threshold_discards_distant_resolutions() {
        let lookup = online_lookup();
        // 3.5 mi keeps the two local ZIPs (~1.4 and ~2.3 mi from their
        // cities) and drops both geocoded ones (~33 and ~7 mi out)
        let out = lookup
            .zip_to_state_city_table(&zip_table(), "zip", true, 3.5)
            .unwrap();
        assert_eq!(out.len(), 2);

        // an impossible threshold admits nothing
        let none = lookup
            .zip_to_state_city_table(&zip_table(), "zip", true, 0.0)
            .unwrap();
        assert_eq!(none.len(), 0);
    }

    #[test]
    fn retained_rows_shrink_as_threshold_tightens() {
        let lookup = online_lookup();
        let mut previous = usize::MAX;
        for threshold in [-1.0, 40.0, 3.5, 0.9, 0.0] {
            let out = lookup
                .zip_to_state_city_table(&zip_table(), "zip", true, threshold)
                .unwrap();
            assert!(
                out.len() <= previous,
                "threshold {threshold} admitted more rows"
            );
            previous = out.len();
        }
    }

    #[test]
    fn missing_zip_column_is_structural() {
        let lookup = offline_lookup();
        assert!(matches!(
            lookup.zip_to_state_city_table(&zip_table(), "postcode", false, -1.0),
            Err(Error::MissingColumn(_))
        ));
    }

    #[test]
    fn state_city_batch_adds_zip_column() {
        let lookup = offline_lookup();
        let out = lookup
            .state_city_to_zip_table(&city_table(), "state", "city", false, -1.0)
            .unwrap();
        // all three complete pairs are known locally; the None row drops
        assert_eq!(out.len(), 3);
        assert_eq!(out.headers().last().map(String::as_str), Some("zip"));
        assert_eq!(out.cell(0, 3), Some("12065"));
        assert_eq!(out.cell(1, 3), Some("2108"));
        assert_eq!(out.cell(2, 3), Some("90001"));
    }

    #[test]
    fn geocoder_failures_stay_inside_the_batch() {
        // FailingGeocoder errors on every call; rows must be discarded,
        // never propagated
        let lookup = offline_lookup();
        let out = lookup
            .zip_to_state_city_table(&zip_table(), "zip", true, -1.0)
            .unwrap();
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn clean_zips_offline_drops_unknown() {
        let lookup = offline_lookup();
        let out = lookup.clean_zips(&zip_table(), "zip", false, -1.0).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out.cell(0, 0), Some("85719"));
        assert_eq!(out.cell(1, 0), Some("94043"));
    }

    #[test]
    fn clean_zips_online_replaces_with_nearest_known() {
        let lookup = online_lookup();
        let out = lookup.clean_zips(&zip_table(), "zip", true, -1.0).unwrap();
        assert_eq!(out.len(), 4);
        // 1234 geocodes ~31 mi from ZIP 10001; 90200 ~2 mi from 90001
        assert_eq!(out.cell(2, 0), Some("10001"));
        assert_eq!(out.cell(3, 0), Some("90001"));
    }

    #[test]
    fn clean_zips_online_threshold_filters_far_replacements() {
        let lookup = online_lookup();
        let out = lookup.clean_zips(&zip_table(), "zip", true, 5.0).unwrap();
        // 1234's replacement is ~31 mi away and gets discarded
        assert_eq!(out.len(), 3);
        assert_eq!(out.cell(2, 0), Some("90001"));
    }

    #[test]
    fn malformed_zip_cells_are_discarded_not_fatal() {
        let lookup = offline_lookup();
        let mut table = Table::new(vec!["zip".into()]);
        table.push_row(vec![Some("not-a-zip".into())]);
        table.push_row(vec![Some("85719".into())]);
        table.push_row(vec![Some("94043.0".into())]);
        let out = lookup.clean_zips(&table, "zip", false, -1.0).unwrap();
        assert_eq!(out.len(), 2);
        // float-formatted cells are normalized
        assert_eq!(out.cell(1, 0), Some("94043"));
    }

    #[test]
    fn parse_zip_accepts_integers_and_integral_floats() {
        assert_eq!(parse_zip("12065").unwrap(), 12065);
        assert_eq!(parse_zip(" 2108 ").unwrap(), 2108);
        assert_eq!(parse_zip("90200.0").unwrap(), 90200);
        assert!(parse_zip("90200.5").is_err());
        assert!(parse_zip("zip").is_err());
        assert!(parse_zip("-5").is_err());
    }
}
