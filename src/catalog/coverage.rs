//! The field-coverage probe: which stations have ever been observed to
//! report which fields.
//!
//! Comma-separated, header row of field names, then one `station_id,<0|1 per
//! field>` row per probed station. A station absent from the probe has
//! unknown coverage, not empty coverage; the resolver treats both as "no
//! evidence".

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use crate::catalog::error::CatalogError;
use crate::catalog::station::StationId;
use crate::fields::FieldCode;

/// Known-populated field sets per station.
#[derive(Debug, Clone, Default)]
pub struct FieldCoverage {
    by_station: HashMap<StationId, BTreeSet<FieldCode>>,
}

impl FieldCoverage {
    /// No coverage evidence for any station.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parses probe CSV text. The first header column names the station-id
    /// column and is ignored; every remaining header entry must be a known
    /// field name. Malformed data rows are skipped.
    pub fn parse(text: &str) -> Result<Self, CatalogError> {
        let mut lines = text.lines();
        let Some(header) = lines.next() else {
            return Ok(Self::empty());
        };

        let mut fields = Vec::new();
        for name in header.split(',').skip(1) {
            let field = name
                .parse::<FieldCode>()
                .map_err(|_| CatalogError::CoverageField(name.trim().to_string()))?;
            fields.push(field);
        }

        let mut by_station = HashMap::new();
        for line in lines {
            let mut cells = line.split(',');
            let Some(id) = cells.next().and_then(|c| c.trim().parse::<StationId>().ok()) else {
                continue;
            };
            let covered: BTreeSet<FieldCode> = fields
                .iter()
                .zip(cells)
                .filter(|(_, cell)| cell.trim() == "1")
                .map(|(field, _)| *field)
                .collect();
            by_station.insert(id, covered);
        }
        Ok(Self { by_station })
    }

    /// Loads a probe file; a missing file means no evidence.
    pub async fn load(path: &Path) -> Result<Self, CatalogError> {
        let text = match tokio::fs::read_to_string(path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::empty()),
            Err(e) => return Err(CatalogError::CoverageRead(path.to_path_buf(), e)),
        };
        Self::parse(&text)
    }

    /// Known-populated fields for a station. Defaults to the empty set.
    pub fn fields(&self, station: &StationId) -> Option<&BTreeSet<FieldCode>> {
        self.by_station.get(station)
    }

    pub fn has_field(&self, station: &StationId, field: FieldCode) -> bool {
        self.by_station
            .get(station)
            .is_some_and(|set| set.contains(&field))
    }

    #[cfg(test)]
    pub(crate) fn insert(&mut self, station: StationId, fields: impl IntoIterator<Item = FieldCode>) {
        self.by_station
            .entry(station)
            .or_default()
            .extend(fields);
    }
}
