//! The in-memory station catalog: every usable station from the history
//! file, its coverage evidence, and a spatial index for proximity scans.
//!
//! Loaded once per process and read-only afterwards; concurrent query
//! pipelines share it behind an `Arc`.

mod coverage;
mod error;
pub mod history;
mod station;

pub use coverage::FieldCoverage;
pub use error::CatalogError;
pub use station::{ActiveSpan, ParseStationIdError, Station, StationId};

use std::collections::HashMap;

use chrono::NaiveDate;
use ordered_float::OrderedFloat;
use rstar::RTree;

use crate::fields::FieldCode;
use crate::geo::{distance_miles, LatLon};

/// Read-only station index.
#[derive(Debug, Clone)]
pub struct StationCatalog {
    stations: Vec<Station>,
    by_id: HashMap<StationId, usize>,
    coverage: FieldCoverage,
    rtree: RTree<Station>,
}

impl StationCatalog {
    /// Builds a catalog from already-parsed stations and coverage evidence.
    /// The first occurrence of a duplicated id wins; iteration order is the
    /// input order.
    pub fn from_parts(stations: Vec<Station>, coverage: FieldCoverage) -> Self {
        let mut kept: Vec<Station> = Vec::with_capacity(stations.len());
        let mut by_id = HashMap::with_capacity(stations.len());
        for station in stations {
            if by_id.contains_key(&station.id) {
                continue;
            }
            by_id.insert(station.id.clone(), kept.len());
            kept.push(station);
        }
        let rtree = RTree::bulk_load(kept.clone());
        Self {
            stations: kept,
            by_id,
            coverage,
            rtree,
        }
    }

    /// Parses history-file text and pairs it with coverage evidence.
    pub fn parse_history(text: &str, coverage: FieldCoverage) -> Self {
        Self::from_parts(history::parse_stations(text), coverage)
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    /// Stations in catalog order. The order is stable across runs and is the
    /// distance-tie break everywhere.
    pub fn iter(&self) -> impl Iterator<Item = &Station> {
        self.stations.iter()
    }

    pub fn get(&self, id: &StationId) -> Option<&Station> {
        self.by_id.get(id).map(|&i| &self.stations[i])
    }

    /// Whether the coverage probe has seen this station report this field.
    pub fn has_field(&self, id: &StationId, field: FieldCode) -> bool {
        self.coverage.has_field(id, field)
    }

    pub fn active_at(&self, id: &StationId, date: NaiveDate) -> bool {
        self.get(id).is_some_and(|s| s.active.contains(date))
    }

    /// Whether the station's active interval covers all of `[start, end]`.
    pub fn active_during(&self, id: &StationId, start: NaiveDate, end: NaiveDate) -> bool {
        self.get(id).is_some_and(|s| s.active.covers(start, end))
    }

    /// All stations passing `keep`, with their distance from `origin`,
    /// nearest first. Stable: equal distances keep catalog order.
    pub fn rank_by_distance(
        &self,
        origin: LatLon,
        mut keep: impl FnMut(&Station) -> bool,
    ) -> Vec<(&Station, f64)> {
        let mut ranked: Vec<(&Station, f64)> = self
            .stations
            .iter()
            .filter(|s| keep(s))
            .map(|s| (s, distance_miles(origin, s.location)))
            .collect();
        ranked.sort_by_key(|(_, d)| OrderedFloat(*d));
        ranked
    }

    /// Up to `limit` nearest stations passing `keep`, via the R-tree.
    ///
    /// Traversal order is Euclidean in degree space, so more candidates than
    /// requested are pulled before the haversine sort decides.
    pub fn nearest(
        &self,
        origin: LatLon,
        limit: usize,
        mut keep: impl FnMut(&Station) -> bool,
    ) -> Vec<(Station, f64)> {
        if limit == 0 {
            return Vec::new();
        }
        let candidate_limit = (limit * 4).max(32);
        let mut candidates: Vec<(Station, f64)> = self
            .rtree
            .nearest_neighbor_iter(&[origin.0, origin.1])
            .filter(|s| keep(s))
            .take(candidate_limit)
            .map(|s| (s.clone(), distance_miles(origin, s.location)))
            .collect();
        candidates.sort_by_key(|(_, d)| OrderedFloat(*d));
        candidates.truncate(limit);
        candidates
    }
}
