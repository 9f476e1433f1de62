use std::fmt::{self, Display};

use crate::station::{Station, StationMap, StationName};

const AVERAGE_STATION_LENGTH: usize = 10;

/// One finalized line of the report.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub name: StationName,
    pub station: Station,
}

impl Summary {
    pub fn min(&self) -> f64 {
        self.station.min as f64 / 10.0
    }

    pub fn mean(&self) -> f64 {
        self.station.mean()
    }

    pub fn max(&self) -> f64 {
        self.station.max as f64 / 10.0
    }
}

impl Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}={}", self.name, self.station)
    }
}

/// Finalizes the combined grouping, ordered by raw name bytes.
pub fn summarize<S>(stations: StationMap<S>) -> Vec<Summary> {
    let mut summaries = stations
        .into_iter()
        .map(|(name, station)| Summary { name, station })
        .collect::<Vec<_>>();
    // names are unique, so an unstable sort is still deterministic
    summaries.sort_unstable_by(|a, b| a.name.cmp(&b.name));
    summaries
}

/// Renders `{name=min/mean/max, ...}` with one fractional digit per value.
/// The line terminator is left to the caller.
pub fn format_report<S>(stations: StationMap<S>) -> String {
    let summaries = summarize(stations);
    let mut out = String::with_capacity(summaries.len() * (AVERAGE_STATION_LENGTH + 21) + 2);
    out.push('{');
    for (i, summary) in summaries.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(&summary.to_string());
    }
    out.push('}');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grouping(records: &[(&str, i32)]) -> StationMap {
        let mut map = StationMap::new();
        for (name, value) in records {
            map.record(name.as_bytes(), *value);
        }
        map
    }

    #[test]
    fn test_format_report() {
        let map = grouping(&[("Hamburg", 120), ("Berlin", 55), ("Hamburg", 80)]);
        assert_eq!(
            format_report(map),
            "{Berlin=5.5/5.5/5.5, Hamburg=8.0/10.0/12.0}"
        );
    }

    #[test]
    fn test_format_negative() {
        let map = grouping(&[("Oslo", -34), ("Oslo", -10)]);
        assert_eq!(format_report(map), "{Oslo=-3.4/-2.2/-1.0}");
    }

    #[test]
    fn test_format_empty() {
        assert_eq!(format_report(StationMap::new()), "{}");
    }

    #[test]
    fn test_sorted_by_raw_bytes() {
        let map = grouping(&[("b", 1), ("Z", 1), ("a", 1), ("Ä", 1), ("B", 1)]);
        let names = summarize(map)
            .into_iter()
            .map(|summary| summary.name.to_string())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["B", "Z", "a", "b", "Ä"]);
    }

    #[test]
    fn test_summary_values() {
        let summaries = summarize(grouping(&[("x", -15), ("x", 25)]));
        assert_eq!(summaries.len(), 1);
        let summary = &summaries[0];
        assert_eq!(summary.min(), -1.5);
        assert_eq!(summary.max(), 2.5);
        assert!((summary.mean() - 0.5).abs() < 1e-9);
        assert_eq!(summary.to_string(), "x=-1.5/0.5/2.5");
    }
}
