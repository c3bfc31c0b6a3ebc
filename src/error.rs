use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

use crate::catalog::CatalogError;
use crate::fields::FieldCode;
use crate::query::QueryError;
use crate::source::SourceError;

#[derive(Debug, Error)]
pub enum NoaahistError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error("Failed to create cache directory '{0}'")]
    CacheDirCreation(PathBuf, #[source] std::io::Error),

    #[error("Failed to determine cache directory")]
    CacheDirResolution(#[source] std::io::Error),

    #[error("No qualifying station for field {field} of query '{query}' around {date}")]
    UnresolvedField {
        query: String,
        field: FieldCode,
        date: NaiveDate,
    },

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}
