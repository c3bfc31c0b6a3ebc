//! The weather variables carried by NOAA's fixed-width hourly observation
//! lines, and their byte-offset windows.
//!
//! The window table is the wire contract with the raw-line source: each
//! observation line carries a `YYYYMMDDHH` timestamp at bytes 13..23 and one
//! fixed window per variable. Offsets are versioned constants; no other part
//! of the crate may hard-code them.

use std::fmt;
use std::str::FromStr;

use crate::query::QueryError;

/// Byte window of the `YYYYMMDDHH` timestamp in a raw observation line.
pub(crate) const TIMESTAMP_WINDOW: (usize, usize) = (13, 23);

/// One named weather variable with a fixed decode window in a raw line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldCode {
    /// Wind direction, degrees.
    Dir,
    /// Wind speed, mph.
    Spd,
    /// Wind gust, mph.
    Gus,
    /// Cloud ceiling, hundreds of feet.
    Clg,
    /// Sky cover code.
    Skc,
    /// Low cloud type code.
    L,
    /// Middle cloud type code.
    M,
    /// High cloud type code.
    H,
    /// Visibility, miles.
    Vsb,
    /// Manually observed present weather, slot 1.
    Mw1,
    Mw2,
    Mw3,
    Mw4,
    /// Automatically observed present weather, slot 1.
    Aw1,
    Aw2,
    Aw3,
    Aw4,
    /// Past weather indicator.
    W,
    /// Air temperature, Fahrenheit.
    Temp,
    /// Dew point, Fahrenheit.
    Dewp,
    /// Sea-level pressure, millibars.
    Slp,
    /// Altimeter setting, inches.
    Alt,
    /// Station pressure, millibars.
    Stp,
    /// Maximum temperature, Fahrenheit.
    Max,
    /// Minimum temperature, Fahrenheit.
    Min,
    /// Liquid precipitation, 1-hour accumulation, inches.
    Pcp01,
    /// Liquid precipitation, 6-hour accumulation, inches.
    Pcp06,
    /// Liquid precipitation, 24-hour accumulation, inches.
    Pcp24,
    /// Liquid precipitation for the period reported, inches.
    PcpXX,
    /// Snow depth, inches.
    Sd,
}

impl FieldCode {
    /// Every field, in raw-line window order. Output columns follow this
    /// order as well.
    pub const ALL: [FieldCode; 30] = [
        FieldCode::Dir,
        FieldCode::Spd,
        FieldCode::Gus,
        FieldCode::Clg,
        FieldCode::Skc,
        FieldCode::L,
        FieldCode::M,
        FieldCode::H,
        FieldCode::Vsb,
        FieldCode::Mw1,
        FieldCode::Mw2,
        FieldCode::Mw3,
        FieldCode::Mw4,
        FieldCode::Aw1,
        FieldCode::Aw2,
        FieldCode::Aw3,
        FieldCode::Aw4,
        FieldCode::W,
        FieldCode::Temp,
        FieldCode::Dewp,
        FieldCode::Slp,
        FieldCode::Alt,
        FieldCode::Stp,
        FieldCode::Max,
        FieldCode::Min,
        FieldCode::Pcp01,
        FieldCode::Pcp06,
        FieldCode::Pcp24,
        FieldCode::PcpXX,
        FieldCode::Sd,
    ];

    /// Byte window `[start, end)` of this field in a raw observation line.
    pub fn window(self) -> (usize, usize) {
        match self {
            FieldCode::Dir => (26, 29),
            FieldCode::Spd => (30, 33),
            FieldCode::Gus => (34, 37),
            FieldCode::Clg => (38, 41),
            FieldCode::Skc => (42, 45),
            FieldCode::L => (46, 47),
            FieldCode::M => (48, 49),
            FieldCode::H => (50, 51),
            FieldCode::Vsb => (52, 56),
            FieldCode::Mw1 => (57, 59),
            FieldCode::Mw2 => (60, 62),
            FieldCode::Mw3 => (63, 65),
            FieldCode::Mw4 => (66, 68),
            FieldCode::Aw1 => (69, 71),
            FieldCode::Aw2 => (72, 74),
            FieldCode::Aw3 => (75, 77),
            FieldCode::Aw4 => (78, 80),
            FieldCode::W => (81, 82),
            FieldCode::Temp => (83, 87),
            FieldCode::Dewp => (88, 92),
            FieldCode::Slp => (93, 99),
            FieldCode::Alt => (100, 105),
            FieldCode::Stp => (106, 112),
            FieldCode::Max => (113, 116),
            FieldCode::Min => (117, 120),
            FieldCode::Pcp01 => (121, 126),
            FieldCode::Pcp06 => (127, 132),
            FieldCode::Pcp24 => (133, 138),
            FieldCode::PcpXX => (139, 144),
            FieldCode::Sd => (145, 147),
        }
    }

    /// The field's name as it appears in coverage probes, batch lines and
    /// output headers.
    pub fn name(self) -> &'static str {
        match self {
            FieldCode::Dir => "DIR",
            FieldCode::Spd => "SPD",
            FieldCode::Gus => "GUS",
            FieldCode::Clg => "CLG",
            FieldCode::Skc => "SKC",
            FieldCode::L => "L",
            FieldCode::M => "M",
            FieldCode::H => "H",
            FieldCode::Vsb => "VSB",
            FieldCode::Mw1 => "MW1",
            FieldCode::Mw2 => "MW2",
            FieldCode::Mw3 => "MW3",
            FieldCode::Mw4 => "MW4",
            FieldCode::Aw1 => "AW1",
            FieldCode::Aw2 => "AW2",
            FieldCode::Aw3 => "AW3",
            FieldCode::Aw4 => "AW4",
            FieldCode::W => "W",
            FieldCode::Temp => "TEMP",
            FieldCode::Dewp => "DEWP",
            FieldCode::Slp => "SLP",
            FieldCode::Alt => "ALT",
            FieldCode::Stp => "STP",
            FieldCode::Max => "MAX",
            FieldCode::Min => "MIN",
            FieldCode::Pcp01 => "PCP01",
            FieldCode::Pcp06 => "PCP06",
            FieldCode::Pcp24 => "PCP24",
            FieldCode::PcpXX => "PCPXX",
            FieldCode::Sd => "SD",
        }
    }

    /// Whether the field carries a numeric reading. Only numeric fields are
    /// eligible for daily averaging; code-valued fields (sky cover, cloud
    /// types, weather indicators) are dropped at daily granularity.
    pub fn is_numeric(self) -> bool {
        !matches!(
            self,
            FieldCode::Skc
                | FieldCode::L
                | FieldCode::M
                | FieldCode::H
                | FieldCode::Mw1
                | FieldCode::Mw2
                | FieldCode::Mw3
                | FieldCode::Mw4
                | FieldCode::Aw1
                | FieldCode::Aw2
                | FieldCode::Aw3
                | FieldCode::Aw4
                | FieldCode::W
        )
    }
}

impl fmt::Display for FieldCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FieldCode {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        FieldCode::ALL
            .into_iter()
            .find(|f| f.name() == upper)
            .ok_or_else(|| QueryError::UnknownField(s.trim().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn windows_do_not_overlap() {
        let mut windows: Vec<(usize, usize)> = FieldCode::ALL.iter().map(|f| f.window()).collect();
        windows.sort();
        for pair in windows.windows(2) {
            assert!(pair[0].1 <= pair[1].0, "overlap: {:?} and {:?}", pair[0], pair[1]);
        }
    }

    #[test]
    fn names_round_trip() {
        for field in FieldCode::ALL {
            assert_eq!(field.name().parse::<FieldCode>().unwrap(), field);
        }
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("temp".parse::<FieldCode>().unwrap(), FieldCode::Temp);
        assert_eq!(" pcp01 ".parse::<FieldCode>().unwrap(), FieldCode::Pcp01);
    }

    #[test]
    fn unknown_field_is_diagnosed() {
        let err = "HUMIDITY".parse::<FieldCode>().unwrap_err();
        assert!(matches!(err, QueryError::UnknownField(name) if name == "HUMIDITY"));
    }

    #[test]
    fn code_valued_fields_are_not_numeric() {
        assert!(FieldCode::Temp.is_numeric());
        assert!(FieldCode::Pcp24.is_numeric());
        assert!(!FieldCode::Skc.is_numeric());
        assert!(!FieldCode::Mw1.is_numeric());
        assert!(!FieldCode::W.is_numeric());
    }
}
