//! Per-epoch, per-field station resolution.
//!
//! A station qualifies for an (epoch, field) when the year's archive index
//! lists it, the catalog shows it active for the whole epoch, and the
//! coverage probe has evidence of the field. The nearest qualifying station
//! wins, independently per field.

use std::collections::HashMap;

use log::debug;

use crate::catalog::StationCatalog;
use crate::error::NoaahistError;
use crate::query::{Query, UnresolvedPolicy};
use crate::resolve::assignment::Assignment;
use crate::resolve::epoch::month_epochs;
use crate::source::RawLineSource;

/// Resolves a query into an [`Assignment`].
///
/// Deterministic for a fixed catalog, year index and query. With
/// [`UnresolvedPolicy::AbortBatch`] an unresolved (epoch, field) fails here,
/// before any archive is fetched.
pub(crate) async fn resolve(
    catalog: &StationCatalog,
    source: &dyn RawLineSource,
    query: &Query,
) -> Result<Assignment, NoaahistError> {
    let mut year_index = HashMap::new();
    let mut assignment = Assignment::default();

    for epoch in month_epochs(&query.span) {
        let year = epoch.year();
        if !year_index.contains_key(&year) {
            year_index.insert(year, source.station_years(year).await?);
        }
        let present = &year_index[&year];

        // One distance ranking per epoch; the per-field scan below walks it
        // nearest-first.
        let ranked = catalog.rank_by_distance(query.location, |station| {
            present.contains(&station.id) && station.active.covers(epoch.start, epoch.end)
        });

        for &field in &query.fields {
            match ranked.iter().find(|(s, _)| catalog.has_field(&s.id, field)) {
                Some((station, distance)) => {
                    debug!(
                        "query '{}': {} -> {} ({:.1} mi) for {}..{}",
                        query.name, field, station.id, distance, epoch.start, epoch.end
                    );
                    for day in epoch.days() {
                        assignment.assign(day, field, station, *distance);
                    }
                }
                None => {
                    for day in epoch.days() {
                        assignment.mark_unresolved(day, field);
                    }
                }
            }
        }
    }

    if query.unresolved == UnresolvedPolicy::AbortBatch {
        if let Some((date, field)) = assignment.first_unresolved() {
            return Err(NoaahistError::UnresolvedField {
                query: query.name.clone(),
                field,
                date,
            });
        }
    }

    Ok(assignment)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::catalog::{FieldCoverage, StationCatalog};
    use crate::fields::FieldCode;
    use crate::geo::LatLon;
    use crate::query::{DateSpan, Query};
    use crate::testutil::{station, FixtureSource};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn two_station_catalog() -> StationCatalog {
        // NEAR has temperature evidence, FAR only wind.
        let near = station("111111-11111", "NEAR", 37.8, -122.4, "19420101", "20201231");
        let far = station("222222-22222", "FAR", 37.0, -121.5, "19420101", "20201231");
        let mut coverage = FieldCoverage::empty();
        coverage.insert(near.id.clone(), [FieldCode::Temp]);
        coverage.insert(far.id.clone(), [FieldCode::Spd]);
        StationCatalog::from_parts(vec![near, far], coverage)
    }

    fn query(span: DateSpan, fields: Vec<FieldCode>) -> Query {
        Query::builder()
            .name("q")
            .location(LatLon(37.77, -122.42))
            .span(span)
            .fields(fields)
            .build()
    }

    #[tokio::test]
    async fn fields_resolve_independently_to_different_stations() {
        let catalog = two_station_catalog();
        let source = FixtureSource::new()
            .with_present("111111-11111", 2013)
            .with_present("222222-22222", 2013);
        let span = DateSpan::new(date(2013, 6, 1), date(2013, 6, 2)).unwrap();
        let q = query(span, vec![FieldCode::Temp, FieldCode::Spd]);

        let assignment = resolve(&catalog, &source, &q).await.unwrap();

        let temp = assignment.station_for(date(2013, 6, 1), FieldCode::Temp).unwrap();
        let spd = assignment.station_for(date(2013, 6, 1), FieldCode::Spd).unwrap();
        assert_eq!(temp.to_string(), "111111-11111");
        assert_eq!(spd.to_string(), "222222-22222");
        assert!(assignment.is_fully_resolved());
    }

    #[tokio::test]
    async fn resolution_is_deterministic() {
        let catalog = two_station_catalog();
        let source = FixtureSource::new()
            .with_present("111111-11111", 2013)
            .with_present("222222-22222", 2013);
        let span = DateSpan::new(date(2013, 6, 1), date(2013, 6, 30)).unwrap();
        let q = query(span, vec![FieldCode::Temp, FieldCode::Spd]);

        let first = resolve(&catalog, &source, &q).await.unwrap();
        let second = resolve(&catalog, &source, &q).await.unwrap();
        for day in span.days() {
            for field in [FieldCode::Temp, FieldCode::Spd] {
                assert_eq!(first.station_for(day, field), second.station_for(day, field));
            }
        }
    }

    #[tokio::test]
    async fn never_assigns_without_field_evidence() {
        let catalog = two_station_catalog();
        let source = FixtureSource::new()
            .with_present("111111-11111", 2013)
            .with_present("222222-22222", 2013);
        let span = DateSpan::new(date(2013, 6, 1), date(2013, 6, 1)).unwrap();
        // Nobody has PCP01 evidence.
        let q = query(span, vec![FieldCode::Pcp01]);

        let assignment = resolve(&catalog, &source, &q).await.unwrap();
        assert_eq!(assignment.station_for(date(2013, 6, 1), FieldCode::Pcp01), None);
        assert_eq!(assignment.unresolved_len(), 1);
    }

    #[tokio::test]
    async fn never_assigns_a_station_absent_from_the_year_index() {
        let catalog = two_station_catalog();
        // NEAR is catalog-active but published no 2013 archive.
        let source = FixtureSource::new().with_present("222222-22222", 2013);
        let span = DateSpan::new(date(2013, 6, 1), date(2013, 6, 1)).unwrap();
        let q = query(span, vec![FieldCode::Temp]);

        let assignment = resolve(&catalog, &source, &q).await.unwrap();
        assert_eq!(assignment.station_for(date(2013, 6, 1), FieldCode::Temp), None);
    }

    #[tokio::test]
    async fn never_assigns_a_station_inactive_during_the_epoch() {
        let lapsed = station("111111-11111", "LAPSED", 37.8, -122.4, "19420101", "20130615");
        let mut coverage = FieldCoverage::empty();
        coverage.insert(lapsed.id.clone(), [FieldCode::Temp]);
        let catalog = StationCatalog::from_parts(vec![lapsed], coverage);
        let source = FixtureSource::new().with_present("111111-11111", 2013);

        // The epoch runs through June 30; the station lapses mid-month, so it
        // cannot serve any of June.
        let span = DateSpan::new(date(2013, 6, 1), date(2013, 6, 30)).unwrap();
        let q = query(span, vec![FieldCode::Temp]);

        let assignment = resolve(&catalog, &source, &q).await.unwrap();
        assert_eq!(assignment.unresolved_len(), 30);
    }

    #[tokio::test]
    async fn assignment_switches_exactly_at_the_month_boundary() {
        // CLOSER only starts publishing archives in 2013; the query spans
        // December 2012 into January 2013.
        let closer = station("111111-11111", "CLOSER", 37.78, -122.41, "19420101", "20201231");
        let further = station("222222-22222", "FURTHER", 37.0, -121.5, "19420101", "20201231");
        let mut coverage = FieldCoverage::empty();
        coverage.insert(closer.id.clone(), [FieldCode::Temp]);
        coverage.insert(further.id.clone(), [FieldCode::Temp]);
        let catalog = StationCatalog::from_parts(vec![closer, further], coverage);

        let source = FixtureSource::new()
            .with_present("222222-22222", 2012)
            .with_present("222222-22222", 2013)
            .with_present("111111-11111", 2013);

        let span = DateSpan::new(date(2012, 12, 28), date(2013, 1, 3)).unwrap();
        let q = query(span, vec![FieldCode::Temp]);
        let assignment = resolve(&catalog, &source, &q).await.unwrap();

        let december = assignment.station_for(date(2012, 12, 31), FieldCode::Temp).unwrap();
        let january = assignment.station_for(date(2013, 1, 1), FieldCode::Temp).unwrap();
        assert_eq!(december.to_string(), "222222-22222");
        assert_eq!(january.to_string(), "111111-11111");
    }

    #[tokio::test]
    async fn abort_policy_fails_before_any_fetch() {
        let catalog = two_station_catalog();
        let source = FixtureSource::new();
        let span = DateSpan::new(date(2013, 6, 1), date(2013, 6, 1)).unwrap();
        let q = Query::builder()
            .name("strict")
            .location(LatLon(37.77, -122.42))
            .span(span)
            .fields(vec![FieldCode::Temp])
            .unresolved(UnresolvedPolicy::AbortBatch)
            .build();

        let err = resolve(&catalog, &source, &q).await.unwrap_err();
        assert!(matches!(
            err,
            NoaahistError::UnresolvedField { query, field: FieldCode::Temp, .. } if query == "strict"
        ));
        assert_eq!(source.fetch_count(), 0);
    }
}
