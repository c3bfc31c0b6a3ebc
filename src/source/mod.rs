//! The raw-line source seam: where station-year archives come from.
//!
//! The engine consumes archives as a pure function of (station, year) and a
//! per-year directory index, so resolution and assembly never know whether
//! lines came over HTTP or from a test fixture.

mod error;
mod http;

pub use error::SourceError;
pub use http::HttpLineSource;

use std::collections::BTreeSet;

use futures_util::future::BoxFuture;

use crate::catalog::StationId;

/// Supplier of fixed-width observation lines.
///
/// Implementations must be idempotent and side-effect-free to call
/// repeatedly for the same arguments; concurrent queries may issue the same
/// fetch more than once.
pub trait RawLineSource: Send + Sync {
    /// The ordered observation lines of one station-year archive.
    fn fetch(&self, station: StationId, year: i32) -> BoxFuture<'_, Result<Vec<String>, SourceError>>;

    /// The station ids whose archive actually exists for `year`, per the
    /// source's directory index. Catalog active-intervals are claims; this
    /// is the proof.
    fn station_years(&self, year: i32) -> BoxFuture<'_, Result<BTreeSet<StationId>, SourceError>>;
}
