//! Acquisition date windows

use crate::error::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Half-open date interval `[start, end)`, matching catalog date filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if end <= start {
            return Err(Error::InvalidParameter {
                name: "date_range",
                value: format!("{}..{}", start, end),
                reason: "end must be after start".into(),
            });
        }
        Ok(Self { start, end })
    }

    /// Parse two `YYYY-MM-DD` strings.
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        let parse = |s: &str| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| Error::InvalidParameter {
                name: "date",
                value: s.to_string(),
                reason: e.to_string(),
            })
        };
        Self::new(parse(start)?, parse(end)?)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date < self.end
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_end_is_exclusive() {
        let r = DateRange::parse("2009-01-01", "2011-12-31").unwrap();
        assert!(r.contains(NaiveDate::from_ymd_opt(2009, 1, 1).unwrap()));
        assert!(r.contains(NaiveDate::from_ymd_opt(2011, 12, 30).unwrap()));
        assert!(!r.contains(NaiveDate::from_ymd_opt(2011, 12, 31).unwrap()));
    }

    #[test]
    fn test_rejects_reversed_range() {
        assert!(DateRange::parse("2016-12-31", "2015-01-01").is_err());
        assert!(DateRange::parse("2015-13-01", "2016-01-01").is_err());
    }
}
