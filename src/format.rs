//! Tabular output: comma-separated rows with a stable column order, plus
//! the optional coverage report and the per-query status summary.

use std::collections::BTreeSet;

use crate::batch::BatchReport;
use crate::fields::FieldCode;

/// Rendered in place of a value that was never decoded.
const MISSING: &str = "*";

/// Renders every produced row as CSV.
///
/// The header names `name`, `time`, then every field present in *any* row in
/// canonical field order (fields absent from all rows are dropped), then a
/// `stations` column unless `station_metadata` is false. Hourly rows print
/// `YYYYMMDDHH` timestamps, daily rows `YYYYMMDD`. Missing values render as
/// `*`; the stations column lists `id@distance_mi` pairs.
pub fn format_rows(report: &BatchReport, station_metadata: bool) -> String {
    let present: BTreeSet<FieldCode> = report
        .outcomes
        .iter()
        .flat_map(|o| o.rows.iter())
        .flat_map(|row| row.values.keys().copied())
        .collect();
    let columns: Vec<FieldCode> = FieldCode::ALL
        .into_iter()
        .filter(|f| present.contains(f))
        .collect();

    let mut out = String::from("name,time");
    for field in &columns {
        out.push(',');
        out.push_str(field.name());
    }
    if station_metadata {
        out.push_str(",stations");
    }
    out.push('\n');

    for outcome in &report.outcomes {
        for row in &outcome.rows {
            out.push_str(&row.name);
            out.push(',');
            match row.hour {
                Some(hour) => out.push_str(&format!("{}{:02}", row.date.format("%Y%m%d"), hour)),
                None => out.push_str(&row.date.format("%Y%m%d").to_string()),
            }
            for field in &columns {
                out.push(',');
                out.push_str(row.values.get(field).map_or(MISSING, String::as_str));
            }
            if station_metadata {
                out.push(',');
                let stations: Vec<String> = row
                    .contributors
                    .iter()
                    .map(|(id, dist)| format!("{id}@{dist:.1}"))
                    .collect();
                out.push_str(&stations.join(";"));
            }
            out.push('\n');
        }
    }
    out
}

/// Renders the coverage reports of every query that requested one: the
/// contiguous date ranges each (field, station) pair served, with the
/// station's distance and name.
pub fn format_coverage(report: &BatchReport) -> String {
    let mut out = String::from("query,field,station_id,station_name,distance_mi,start,end\n");
    for outcome in &report.outcomes {
        for span in &outcome.coverage {
            out.push_str(&format!(
                "{},{},{},{},{:.1},{},{}\n",
                span.query,
                span.field,
                span.station,
                span.station_name,
                span.distance_mi,
                span.start.format("%Y%m%d"),
                span.end.format("%Y%m%d"),
            ));
        }
    }
    out
}

/// One status line per query; see [`BatchReport::summary`].
pub fn format_summary(report: &BatchReport) -> String {
    report.summary()
}
