mod assemble;
mod batch;
mod catalog;
mod error;
mod fields;
mod format;
mod geo;
mod noaahist;
mod plan;
mod query;
mod resolve;
mod source;
#[cfg(test)]
mod testutil;
mod utils;

pub use error::NoaahistError;
pub use noaahist::Noaahist;

pub use assemble::UnifiedRow;
pub use batch::{BatchReport, QueryOutcome, QueryStatus};
pub use catalog::{
    ActiveSpan, CatalogError, FieldCoverage, ParseStationIdError, Station, StationCatalog,
    StationId,
};
pub use fields::FieldCode;
pub use format::{format_coverage, format_rows, format_summary};
pub use geo::{distance_miles, LatLon};
pub use plan::{build_fetch_plan, FetchUnit};
pub use query::{DateSpan, Granularity, Query, QueryError, UnresolvedPolicy};
pub use resolve::{Assignment, ChosenStation, CoverageSpan};
pub use source::{HttpLineSource, RawLineSource, SourceError};
