//! The main entry point for assembling point-location weather histories.
//!
//! A [`Noaahist`] client owns the read-only station catalog and the raw-line
//! source, and runs single queries or concurrent batches against them.

use std::path::PathBuf;
use std::sync::Arc;

use bon::bon;
use chrono::Datelike;

use crate::batch::{self, BatchReport, QueryOutcome};
use crate::catalog::{history, FieldCoverage, Station, StationCatalog};
use crate::error::NoaahistError;
use crate::fields::FieldCode;
use crate::geo::LatLon;
use crate::query::Query;
use crate::source::{HttpLineSource, RawLineSource};
use crate::utils::{ensure_cache_dir_exists, get_cache_dir};

/// File name of the optional coverage probe CSV inside the cache directory.
const COVERAGE_FILE_NAME: &str = "station_coverage.csv";

/// The client: an immutable station catalog plus a raw-line source.
///
/// Create one with [`Noaahist::new`] (default cache directory, default NOAA
/// mirror) or [`Noaahist::with_options`] to point at a different cache
/// folder, history URL, coverage probe or archive mirror. Tests and custom
/// integrations can inject both halves with [`Noaahist::from_parts`].
///
/// # Examples
///
/// ```no_run
/// use noaahist::{FieldCode, Granularity, LatLon, Noaahist, Query, DateSpan};
///
/// # async fn run() -> Result<(), noaahist::NoaahistError> {
/// let client = Noaahist::new().await?;
///
/// let query = Query::builder()
///     .name("presidio")
///     .location(LatLon(37.7989, -122.4662))
///     .span(DateSpan::parse("20130601,20130630")?)
///     .fields(vec![FieldCode::Temp, FieldCode::Spd])
///     .granularity(Granularity::Daily)
///     .build();
///
/// let outcome = client.run_query(query).await?;
/// println!("{} rows, status {}", outcome.rows.len(), outcome.status);
/// # Ok(())
/// # }
/// ```
pub struct Noaahist {
    catalog: Arc<StationCatalog>,
    source: Arc<dyn RawLineSource>,
}

#[bon]
impl Noaahist {
    /// Creates a client with every default: platform cache directory,
    /// standard history URL, coverage probe from the cache directory when
    /// present, and the public NOAA archive mirror.
    pub async fn new() -> Result<Self, NoaahistError> {
        Self::with_options().call().await
    }

    /// Creates a client with explicit options. Every argument is optional.
    ///
    /// # Arguments
    ///
    /// * `.cache_folder(PathBuf)`: where the station-history cache (and, by
    ///   default, the coverage probe) live. Defaults to the platform cache
    ///   directory. Created if missing.
    /// * `.history_url(String)`: where to download the station history file
    ///   when the cache is stale.
    /// * `.coverage_file(PathBuf)`: the field-coverage probe CSV. Defaults
    ///   to `station_coverage.csv` inside the cache folder; a missing file
    ///   means no field evidence, which resolves nothing, so supplying a
    ///   probe is strongly advised.
    /// * `.archive_url(String)`: base URL of the raw-line archive mirror.
    ///
    /// # Errors
    ///
    /// Returns [`NoaahistError::CacheDirResolution`] /
    /// [`NoaahistError::CacheDirCreation`] for cache-directory problems and
    /// [`NoaahistError::Catalog`] when the history download, cache cycle or
    /// coverage probe fails.
    #[builder]
    pub async fn with_options(
        cache_folder: Option<PathBuf>,
        history_url: Option<String>,
        coverage_file: Option<PathBuf>,
        archive_url: Option<String>,
    ) -> Result<Self, NoaahistError> {
        let cache_folder = match cache_folder {
            Some(dir) => dir,
            None => get_cache_dir().map_err(NoaahistError::CacheDirResolution)?,
        };
        ensure_cache_dir_exists(&cache_folder)
            .await
            .map_err(|e| NoaahistError::CacheDirCreation(cache_folder.clone(), e))?;

        let history_url = history_url.unwrap_or_else(|| history::DEFAULT_HISTORY_URL.to_string());
        let stations = history::load_or_fetch(&cache_folder, &history_url).await?;

        let coverage_file = coverage_file.unwrap_or_else(|| cache_folder.join(COVERAGE_FILE_NAME));
        let coverage = FieldCoverage::load(&coverage_file).await?;

        let source = match archive_url {
            Some(base) => HttpLineSource::with_base_url(base),
            None => HttpLineSource::new(),
        };

        Ok(Self {
            catalog: Arc::new(StationCatalog::from_parts(stations, coverage)),
            source: Arc::new(source),
        })
    }

    /// Builds a client from an already-loaded catalog and any raw-line
    /// source implementation.
    pub fn from_parts(catalog: StationCatalog, source: Arc<dyn RawLineSource>) -> Self {
        Self {
            catalog: Arc::new(catalog),
            source,
        }
    }

    /// Runs one query's full pipeline: resolve stations, plan fetches, pull
    /// archives, assemble rows.
    ///
    /// A fetch failure or resolution failure is reported in the outcome's
    /// status; the `Err` path is reserved for invalid queries and the
    /// abort-batch unresolved policy.
    pub async fn run_query(&self, query: Query) -> Result<QueryOutcome, NoaahistError> {
        query.validate()?;
        batch::execute_query(self.catalog.clone(), self.source.clone(), query).await
    }

    /// Runs many independent queries concurrently.
    ///
    /// Every query is validated before any work starts. Each query runs its
    /// own pipeline in a spawned task; at most `workers` run at once
    /// (default: available parallelism minus one). Outcomes arrive in
    /// submission order regardless of completion order.
    ///
    /// # Arguments
    ///
    /// * `.queries(Vec<Query>)`: **Required.** The batch, in the order the
    ///   outcomes should be reported.
    /// * `.workers(usize)`: Optional worker cap.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use noaahist::{format_rows, Noaahist, Query};
    ///
    /// # async fn run() -> Result<(), noaahist::NoaahistError> {
    /// let client = Noaahist::new().await?;
    /// let queries = vec![
    ///     Query::parse_batch_line("sfo|20130601,20130607|37.77,-122.42|TEMP,SPD|daily")?,
    ///     Query::parse_batch_line("lax|20130601,20130607|34.05,-118.24|TEMP|hourly")?,
    /// ];
    ///
    /// let report = client.run_batch().queries(queries).workers(4).call().await?;
    /// print!("{}", format_rows(&report, true));
    /// eprint!("{}", report.summary());
    /// # Ok(())
    /// # }
    /// ```
    #[builder]
    pub async fn run_batch(
        &self,
        queries: Vec<Query>,
        workers: Option<usize>,
    ) -> Result<BatchReport, NoaahistError> {
        let workers = workers.unwrap_or_else(batch::default_workers);
        batch::run_batch(self.catalog.clone(), self.source.clone(), queries, workers).await
    }

    /// Lists the stations nearest to a location, optionally restricted to
    /// those with evidence of a field and/or catalog-active in a year.
    ///
    /// Purely catalog-driven: the year filter consults active intervals,
    /// not the archive index. Returns (station, distance-in-miles) pairs,
    /// nearest first.
    #[builder]
    pub fn find_stations(
        &self,
        location: LatLon,
        limit: Option<usize>,
        field: Option<FieldCode>,
        year: Option<i32>,
    ) -> Vec<(Station, f64)> {
        let limit = limit.unwrap_or(20);
        self.catalog.nearest(location, limit, |station| {
            let field_ok = field.map_or(true, |f| self.catalog.has_field(&station.id, f));
            let year_ok = year.map_or(true, |y| {
                station.active.start.year() <= y && y <= station.active.end.year()
            });
            field_ok && year_ok
        })
    }
}
