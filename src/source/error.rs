use thiserror::Error;

use crate::catalog::StationId;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
        #[source]
        source: reqwest::Error,
    },

    #[error("No archive published for station {station} in {year}")]
    ArchiveMissing { station: StationId, year: i32 },

    #[error("Archive download or decompression failed")]
    DownloadIo(#[from] std::io::Error),
}
