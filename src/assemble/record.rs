//! A borrowed view over one raw fixed-width observation line, decoded
//! window by window on demand.

use chrono::NaiveDate;

use crate::fields::{FieldCode, TIMESTAMP_WINDOW};

/// The missing-value sentinel character used by the archives.
const FILLER: char = '*';

pub(crate) struct ObservationRecord<'a> {
    line: &'a str,
}

impl<'a> ObservationRecord<'a> {
    pub fn new(line: &'a str) -> Self {
        Self { line }
    }

    /// The line's embedded `YYYYMMDDHH` timestamp. `None` means the line is
    /// malformed and should be discarded.
    pub fn timestamp(&self) -> Option<(NaiveDate, u32)> {
        let raw = self.line.get(TIMESTAMP_WINDOW.0..TIMESTAMP_WINDOW.1)?;
        let date = NaiveDate::parse_from_str(raw.get(..8)?, "%Y%m%d").ok()?;
        let hour: u32 = raw.get(8..10)?.trim().parse().ok()?;
        (hour <= 23).then_some((date, hour))
    }

    /// The decoded value of one field window, or `None` when the window is
    /// absent, blank, or reports nothing but filler.
    pub fn value(&self, field: FieldCode) -> Option<String> {
        let (start, end) = field.window();
        let end = end.min(self.line.len());
        if start >= end {
            return None;
        }
        normalize(self.line.get(start..end)?)
    }
}

/// Trims a raw window and collapses filler runs to a single `*`. A value
/// that is empty or entirely filler is missing.
fn normalize(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.chars().all(|c| c == FILLER) {
        return None;
    }

    let mut out = String::with_capacity(trimmed.len());
    let mut in_filler = false;
    for c in trimmed.chars() {
        if c == FILLER {
            if !in_filler {
                out.push(FILLER);
            }
            in_filler = true;
        } else {
            out.push(c);
            in_filler = false;
        }
    }
    Some(out)
}
