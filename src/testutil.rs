//! Shared fixtures: synthetic catalog lines, synthetic observation lines,
//! and an in-memory raw-line source with optional artificial latency.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures_util::future::BoxFuture;

use crate::catalog::{FieldCoverage, Station, StationCatalog, StationId};
use crate::fields::{FieldCode, TIMESTAMP_WINDOW};
use crate::source::{RawLineSource, SourceError};

fn write_at(buf: &mut [u8], offset: usize, text: &str) {
    for (i, b) in text.bytes().enumerate() {
        if offset + i < buf.len() {
            buf[offset + i] = b;
        }
    }
}

/// Builds one fixed-width station-history line.
#[allow(clippy::too_many_arguments)]
pub(crate) fn history_line(
    usaf: &str,
    wban: &str,
    name: &str,
    region: &str,
    lat_x1000: i64,
    lon_x1000: i64,
    start: &str,
    end: &str,
) -> String {
    let mut buf = vec![b' '; 100];
    write_at(&mut buf, 0, usaf);
    write_at(&mut buf, 7, wban);
    write_at(&mut buf, 13, &name.chars().take(30).collect::<String>());
    write_at(&mut buf, 49, region);
    write_at(&mut buf, 58, &format!("{lat_x1000:+06}"));
    write_at(&mut buf, 65, &format!("{lon_x1000:+07}"));
    write_at(&mut buf, 83, start);
    write_at(&mut buf, 92, end);
    String::from_utf8(buf).expect("ascii buffer")
}

/// Builds a [`Station`] directly, bypassing the history-file windows.
pub(crate) fn station(
    id: &str,
    name: &str,
    lat: f64,
    lon: f64,
    start: &str,
    end: &str,
) -> Station {
    use crate::catalog::ActiveSpan;
    use crate::geo::LatLon;
    use chrono::NaiveDate;

    Station {
        id: id.parse().expect("fixture station id"),
        name: name.to_string(),
        region: None,
        location: LatLon(lat, lon),
        active: ActiveSpan {
            start: NaiveDate::parse_from_str(start, "%Y%m%d").expect("fixture start date"),
            end: NaiveDate::parse_from_str(end, "%Y%m%d").expect("fixture end date"),
        },
    }
}

pub(crate) fn catalog_with(stations: Vec<Station>) -> StationCatalog {
    StationCatalog::from_parts(stations, FieldCoverage::empty())
}

/// Builds one fixed-width observation line with the given `YYYYMMDDHH`
/// timestamp and raw field windows.
pub(crate) fn obs_line(timestamp: &str, values: &[(FieldCode, &str)]) -> String {
    let mut buf = vec![b' '; 160];
    write_at(&mut buf, TIMESTAMP_WINDOW.0, timestamp);
    for &(field, value) in values {
        let (start, end) = field.window();
        write_at(&mut buf, start, &value.chars().take(end - start).collect::<String>());
    }
    String::from_utf8(buf).expect("ascii buffer")
}

/// An in-memory [`RawLineSource`].
///
/// Stations registered with [`with_archive`](Self::with_archive) or
/// [`with_present`](Self::with_present) appear in the year index; fetches
/// can be delayed per station or forced to fail per (station, year).
#[derive(Default)]
pub(crate) struct FixtureSource {
    present: HashMap<i32, BTreeSet<StationId>>,
    archives: HashMap<(StationId, i32), Vec<String>>,
    delays_ms: HashMap<StationId, u64>,
    failures: HashSet<(StationId, i32)>,
    fetches: AtomicUsize,
}

impl FixtureSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_archive(mut self, id: &str, year: i32, lines: Vec<String>) -> Self {
        let id: StationId = id.parse().expect("fixture station id");
        self.present.entry(year).or_default().insert(id.clone());
        self.archives.insert((id, year), lines);
        self
    }

    /// Lists a station in the year index without providing an archive body.
    pub fn with_present(mut self, id: &str, year: i32) -> Self {
        let id: StationId = id.parse().expect("fixture station id");
        self.present.entry(year).or_default().insert(id);
        self
    }

    pub fn with_delay(mut self, id: &str, millis: u64) -> Self {
        self.delays_ms
            .insert(id.parse().expect("fixture station id"), millis);
        self
    }

    pub fn with_failure(mut self, id: &str, year: i32) -> Self {
        self.failures
            .insert((id.parse().expect("fixture station id"), year));
        self
    }

    /// How many archive fetches have been issued.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl RawLineSource for FixtureSource {
    fn fetch(&self, station: StationId, year: i32) -> BoxFuture<'_, Result<Vec<String>, SourceError>> {
        Box::pin(async move {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if let Some(&millis) = self.delays_ms.get(&station) {
                tokio::time::sleep(Duration::from_millis(millis)).await;
            }
            if self.failures.contains(&(station.clone(), year)) {
                return Err(SourceError::ArchiveMissing { station, year });
            }
            self.archives
                .get(&(station.clone(), year))
                .cloned()
                .ok_or(SourceError::ArchiveMissing { station, year })
        })
    }

    fn station_years(&self, year: i32) -> BoxFuture<'_, Result<BTreeSet<StationId>, SourceError>> {
        Box::pin(async move { Ok(self.present.get(&year).cloned().unwrap_or_default()) })
    }
}
