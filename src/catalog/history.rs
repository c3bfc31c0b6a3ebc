//! The station history file: fixed-width parsing plus the download /
//! staleness / bincode-cache cycle.
//!
//! One line per station. A line missing its id, coordinates, or either
//! active-date bound describes a station we can never resolve against, so it
//! yields no entry rather than an error.

use std::path::Path;
use std::time::Duration;

use bincode::config::{Configuration, Fixint, LittleEndian};
use chrono::NaiveDate;
use log::{info, warn};
use reqwest::Client;
use tokio::task;

use crate::catalog::error::CatalogError;
use crate::catalog::station::{ActiveSpan, Station, StationId};
use crate::geo::LatLon;

/// Default download location of the station history file.
pub const DEFAULT_HISTORY_URL: &str = "https://www.ncei.noaa.gov/pub/data/noaa/isd-history.txt";

const CACHE_FILE_NAME: &str = "station_history.bin";
/// The history file changes slowly; refresh after this long.
const STALE_AFTER: Duration = Duration::from_secs(180 * 24 * 60 * 60);
const BINCODE_CONFIG: Configuration<LittleEndian, Fixint> =
    bincode::config::standard().with_fixed_int_encoding();

// Byte windows of the history line layout.
const USAF: (usize, usize) = (0, 6);
const WBAN: (usize, usize) = (7, 12);
const NAME: (usize, usize) = (13, 43);
const REGION: (usize, usize) = (49, 51);
const LAT_X1000: (usize, usize) = (58, 64);
const LON_X1000: (usize, usize) = (65, 72);
const ACTIVE_START: (usize, usize) = (83, 91);
const ACTIVE_END: (usize, usize) = (92, 100);

fn window(line: &str, (start, end): (usize, usize)) -> Option<&str> {
    line.get(start..end).map(str::trim)
}

/// Parses one history line. `None` means the line does not describe a usable
/// station.
pub fn parse_station_line(line: &str) -> Option<Station> {
    let usaf = window(line, USAF)?;
    let wban = window(line, WBAN)?;
    let id = StationId::new(usaf, wban).ok()?;

    let lat = parse_scaled_coordinate(window(line, LAT_X1000)?, 90.0)?;
    let lon = parse_scaled_coordinate(window(line, LON_X1000)?, 180.0)?;

    let start = parse_history_date(window(line, ACTIVE_START)?)?;
    let end = parse_history_date(window(line, ACTIVE_END)?)?;
    if end < start {
        return None;
    }

    let name = window(line, NAME).unwrap_or_default().to_string();
    let region = window(line, REGION).filter(|r| !r.is_empty()).map(String::from);

    Some(Station {
        id,
        name,
        region,
        location: LatLon(lat, lon),
        active: ActiveSpan { start, end },
    })
}

/// Parses a `degrees * 1000` window into decimal degrees, rejecting values
/// outside the hemisphere bound (the file marks unknown coordinates with
/// out-of-range sentinels).
fn parse_scaled_coordinate(raw: &str, bound: f64) -> Option<f64> {
    let scaled: f64 = raw.parse().ok()?;
    let degrees = scaled / 1000.0;
    (-bound..=bound).contains(&degrees).then_some(degrees)
}

fn parse_history_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y%m%d").ok()
}

/// Parses a whole history file, skipping unusable lines.
pub fn parse_stations(text: &str) -> Vec<Station> {
    text.lines().filter_map(parse_station_line).collect()
}

/// Loads the station list from the bincode cache when it is fresh, otherwise
/// downloads the history file, parses it off the async runtime, and rewrites
/// the cache.
pub async fn load_or_fetch(cache_dir: &Path, url: &str) -> Result<Vec<Station>, CatalogError> {
    let cache_file = cache_dir.join(CACHE_FILE_NAME);

    if cache_is_fresh(&cache_file).await? {
        info!("Station history cache hit at {:?}", cache_file);
        let path = cache_file.clone();
        return task::spawn_blocking(move || read_cached_stations(&path)).await?;
    }

    warn!("Station history cache missing or stale; downloading from {url}");
    let text = download_history(url).await?;
    let stations = task::spawn_blocking(move || parse_stations(&text)).await?;
    info!("Parsed {} stations from history file", stations.len());

    write_cache(stations.clone(), &cache_file).await?;
    Ok(stations)
}

async fn cache_is_fresh(cache_file: &Path) -> Result<bool, CatalogError> {
    let metadata = match tokio::fs::metadata(cache_file).await {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(CatalogError::CacheMetadataRead(cache_file.to_path_buf(), e)),
    };
    let modified = metadata
        .modified()
        .map_err(|e| CatalogError::CacheMetadataRead(cache_file.to_path_buf(), e))?;
    let age = modified
        .elapsed()
        .map_err(|e| CatalogError::SystemTimeCalculation(cache_file.to_path_buf(), e))?;
    Ok(age < STALE_AFTER)
}

fn read_cached_stations(cache_file: &Path) -> Result<Vec<Station>, CatalogError> {
    let bytes = std::fs::read(cache_file)
        .map_err(|e| CatalogError::CacheRead(cache_file.to_path_buf(), e))?;
    let (stations, _) = bincode::serde::decode_from_slice::<Vec<Station>, _>(&bytes, BINCODE_CONFIG)
        .map_err(|e| CatalogError::CacheDecode(cache_file.to_path_buf(), Box::new(e)))?;
    Ok(stations)
}

async fn write_cache(stations: Vec<Station>, cache_file: &Path) -> Result<(), CatalogError> {
    let encoded = task::spawn_blocking(move || {
        bincode::serde::encode_to_vec(stations, BINCODE_CONFIG)
            .map_err(|e| CatalogError::CacheEncode(Box::new(e)))
    })
    .await??;
    tokio::fs::write(cache_file, &encoded)
        .await
        .map_err(|e| CatalogError::CacheWrite(cache_file.to_path_buf(), e))?;
    Ok(())
}

async fn download_history(url: &str) -> Result<String, CatalogError> {
    let client = Client::new();
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| CatalogError::NetworkRequest(url.to_string(), e))?;
    let response = match response.error_for_status() {
        Ok(resp) => resp,
        Err(e) => {
            return Err(if let Some(status) = e.status() {
                CatalogError::HttpStatus {
                    url: url.to_string(),
                    status,
                    source: e,
                }
            } else {
                CatalogError::NetworkRequest(url.to_string(), e)
            });
        }
    };
    response
        .text()
        .await
        .map_err(|e| CatalogError::NetworkRequest(url.to_string(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::history_line;

    #[test]
    fn well_formed_line_parses() {
        let line = history_line(
            "722900", "23188", "SAN DIEGO LINDBERGH FIELD", "CA", 32733, -117183, "19420101",
            "20131231",
        );
        let station = parse_station_line(&line).expect("line should parse");
        assert_eq!(station.id.to_string(), "722900-23188");
        assert_eq!(station.name, "SAN DIEGO LINDBERGH FIELD");
        assert_eq!(station.region.as_deref(), Some("CA"));
        assert!((station.location.0 - 32.733).abs() < 1e-9);
        assert!((station.location.1 + 117.183).abs() < 1e-9);
        assert_eq!(
            station.active.start,
            NaiveDate::from_ymd_opt(1942, 1, 1).unwrap()
        );
        assert_eq!(
            station.active.end,
            NaiveDate::from_ymd_opt(2013, 12, 31).unwrap()
        );
    }

    #[test]
    fn lines_missing_required_windows_are_skipped() {
        // Blank coordinates.
        let mut line = history_line("722900", "23188", "X", "CA", 32733, -117183, "19420101", "20131231");
        line.replace_range(58..72, &" ".repeat(14));
        assert!(parse_station_line(&line).is_none());

        // Out-of-range coordinate sentinel.
        let line = history_line("722900", "23188", "X", "CA", 99999, -117183, "19420101", "20131231");
        assert!(parse_station_line(&line).is_none());

        // Missing end date.
        let mut line = history_line("722900", "23188", "X", "CA", 32733, -117183, "19420101", "20131231");
        line.replace_range(92..100, "        ");
        assert!(parse_station_line(&line).is_none());

        // Inverted active interval.
        let line = history_line("722900", "23188", "X", "CA", 32733, -117183, "20131231", "19420101");
        assert!(parse_station_line(&line).is_none());

        // Truncated line.
        assert!(parse_station_line("722900 23188").is_none());
    }

    #[test]
    fn file_parse_keeps_only_usable_lines() {
        let good = history_line("722900", "23188", "A", "CA", 32733, -117183, "19420101", "20131231");
        let bad = "not a station line".to_string();
        let text = format!("{good}\n{bad}\n");
        let stations = parse_stations(&text);
        assert_eq!(stations.len(), 1);
    }

    #[tokio::test]
    async fn cache_round_trips_and_reads_fresh() {
        let dir = tempfile::tempdir().expect("temp dir");
        let cache_file = dir.path().join(CACHE_FILE_NAME);

        let line = history_line("722900", "23188", "A", "CA", 32733, -117183, "19420101", "20131231");
        let stations = parse_stations(&line);

        assert!(!cache_is_fresh(&cache_file).await.unwrap());
        write_cache(stations.clone(), &cache_file).await.unwrap();
        assert!(cache_is_fresh(&cache_file).await.unwrap());

        let restored = read_cached_stations(&cache_file).unwrap();
        assert_eq!(restored.len(), 1);
        assert_eq!(restored[0].id, stations[0].id);
        assert_eq!(restored[0].location, stations[0].location);
        assert_eq!(restored[0].active, stations[0].active);
    }
}
