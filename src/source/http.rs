//! HTTP implementation of [`RawLineSource`]: gzip station-year archives of
//! fixed-width text plus a per-year directory index, laid out
//! `{base}/{year}/{usaf}-{wban}-{year}.gz`.

use std::collections::BTreeSet;

use async_compression::tokio::bufread::GzipDecoder;
use futures_util::future::BoxFuture;
use futures_util::TryStreamExt;
use log::{info, warn};
use reqwest::{Client, StatusCode};
use tokio::io::{AsyncReadExt, BufReader};
use tokio_util::io::StreamReader;

use crate::catalog::StationId;
use crate::source::{RawLineSource, SourceError};

/// Default archive mirror base URL.
pub const DEFAULT_ARCHIVE_URL: &str = "https://www.ncei.noaa.gov/pub/data/noaa";

/// Fetches station-year archives over HTTP.
#[derive(Debug, Clone)]
pub struct HttpLineSource {
    base_url: String,
    client: Client,
}

impl Default for HttpLineSource {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpLineSource {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_ARCHIVE_URL)
    }

    /// Points the source at a different mirror. Trailing slashes are
    /// tolerated.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            base_url,
            client: Client::new(),
        }
    }

    async fn fetch_archive(&self, station: &StationId, year: i32) -> Result<Vec<String>, SourceError> {
        let url = format!(
            "{}/{}/{}-{}-{}.gz",
            self.base_url,
            year,
            station.usaf(),
            station.wban(),
            year
        );
        info!("Fetching archive {url}");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| SourceError::NetworkRequest(url.clone(), e))?;

        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                warn!("Archive fetch failed for {url}: {e}");
                return Err(match e.status() {
                    Some(StatusCode::NOT_FOUND) => SourceError::ArchiveMissing {
                        station: station.clone(),
                        year,
                    },
                    Some(status) => SourceError::HttpStatus {
                        url,
                        status,
                        source: e,
                    },
                    None => SourceError::NetworkRequest(url, e),
                });
            }
        };

        let stream = response
            .bytes_stream()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e));
        let decoder = GzipDecoder::new(BufReader::new(StreamReader::new(stream)));
        let mut reader = BufReader::new(decoder);
        let mut decompressed = Vec::new();
        reader.read_to_end(&mut decompressed).await?;

        let text = String::from_utf8_lossy(&decompressed);
        Ok(text.lines().map(str::to_string).collect())
    }

    async fn fetch_year_index(&self, year: i32) -> Result<BTreeSet<StationId>, SourceError> {
        let url = format!("{}/{}/", self.base_url, year);
        info!("Fetching year index {url}");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| SourceError::NetworkRequest(url.clone(), e))?;
        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                return Err(match e.status() {
                    Some(status) => SourceError::HttpStatus {
                        url,
                        status,
                        source: e,
                    },
                    None => SourceError::NetworkRequest(url, e),
                });
            }
        };
        let body = response
            .text()
            .await
            .map_err(|e| SourceError::NetworkRequest(url, e))?;

        Ok(parse_year_index(&body, year))
    }
}

/// Pulls `USAF-WBAN-YYYY` archive names out of a directory index, tolerant
/// of plain listings and HTML wrappers alike.
fn parse_year_index(body: &str, year: i32) -> BTreeSet<StationId> {
    let suffix = format!("-{year}");
    body.split(|c: char| !(c.is_ascii_digit() || c == '-'))
        .filter_map(|token| token.strip_suffix(suffix.as_str()))
        .filter_map(|id| id.parse::<StationId>().ok())
        .collect()
}

impl RawLineSource for HttpLineSource {
    fn fetch(&self, station: StationId, year: i32) -> BoxFuture<'_, Result<Vec<String>, SourceError>> {
        Box::pin(async move { self.fetch_archive(&station, year).await })
    }

    fn station_years(&self, year: i32) -> BoxFuture<'_, Result<BTreeSet<StationId>, SourceError>> {
        Box::pin(async move { self.fetch_year_index(year).await })
    }
}
