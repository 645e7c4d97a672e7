//! Metric sample shaping: time window, interval buckets, aggregation.
//!
//! Buckets are aligned on the window start. A bucket with no samples produces
//! no value, so `values` only ever carries real numbers.

use std::collections::BTreeMap;

use chrono::{DateTime, TimeDelta, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregation {
    Average,
    Total,
    Minimum,
    Maximum,
    Count,
}

impl Aggregation {
    pub const NAMES: &'static [&'static str] = &["average", "total", "minimum", "maximum", "count"];

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "average" => Some(Aggregation::Average),
            "total" => Some(Aggregation::Total),
            "minimum" => Some(Aggregation::Minimum),
            "maximum" => Some(Aggregation::Maximum),
            "count" => Some(Aggregation::Count),
            _ => None,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Aggregation::Average => "average",
            Aggregation::Total => "total",
            Aggregation::Minimum => "minimum",
            Aggregation::Maximum => "maximum",
            Aggregation::Count => "count",
        }
    }

    /// Reduce one non-empty bucket.
    pub fn apply(&self, values: &[f64]) -> f64 {
        match self {
            Aggregation::Average => values.iter().sum::<f64>() / values.len() as f64,
            Aggregation::Total => values.iter().sum(),
            Aggregation::Minimum => values.iter().copied().fold(f64::INFINITY, f64::min),
            Aggregation::Maximum => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            Aggregation::Count => values.len() as f64,
        }
    }
}

/// Parse an ISO 8601 duration such as `PT5M`, `PT1H30M` or `P1D`.
///
/// Only week, day, hour, minute and whole-second designators are accepted;
/// the result must be positive.
pub fn parse_interval(raw: &str) -> Option<TimeDelta> {
    let upper = raw.trim().to_ascii_uppercase();
    let rest = upper.strip_prefix('P')?;
    let (date, time) = match rest.split_once('T') {
        Some((_, "")) => return None,
        Some((d, t)) => (d, t),
        None => (rest, ""),
    };
    let secs = sum_units(date, &[('W', 604_800), ('D', 86_400)])?
        .checked_add(sum_units(time, &[('H', 3_600), ('M', 60), ('S', 1)])?)?;
    if secs <= 0 {
        return None;
    }
    TimeDelta::try_seconds(secs)
}

/// Sum `<digits><unit>` pairs; units must appear in the given order.
fn sum_units(part: &str, units: &[(char, i64)]) -> Option<i64> {
    let mut total = 0i64;
    let mut digits = String::new();
    let mut next = 0;
    for c in part.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }
        let pos = next + units[next..].iter().position(|(u, _)| *u == c)?;
        let n: i64 = digits.parse().ok()?;
        total = total.checked_add(n.checked_mul(units[pos].1)?)?;
        digits.clear();
        next = pos + 1;
    }
    digits.is_empty().then_some(total)
}

/// Keep samples in `[start, end)`, bucket them by `interval` and reduce each
/// bucket with `aggregation`. Output is in time order.
pub fn aggregate(
    samples: impl IntoIterator<Item = (DateTime<Utc>, f64)>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    interval: TimeDelta,
    aggregation: Aggregation,
) -> Vec<f64> {
    let step = interval.num_seconds().max(1);
    let mut buckets: BTreeMap<i64, Vec<f64>> = BTreeMap::new();
    for (at, value) in samples {
        if at < start || at >= end {
            continue;
        }
        let idx = (at - start).num_seconds() / step;
        buckets.entry(idx).or_default().push(value);
    }
    buckets.values().map(|b| aggregation.apply(b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn minutes(n: i64) -> TimeDelta {
        TimeDelta::try_minutes(n).unwrap()
    }

    #[test]
    fn parses_common_intervals() {
        assert_eq!(parse_interval("PT5M"), Some(minutes(5)));
        assert_eq!(parse_interval("pt1h30m"), Some(minutes(90)));
        assert_eq!(parse_interval("P1D"), Some(minutes(1440)));
        assert_eq!(parse_interval("P1DT1H"), Some(minutes(1500)));
        assert_eq!(parse_interval("PT30S"), TimeDelta::try_seconds(30));
    }

    #[test]
    fn rejects_malformed_intervals() {
        for bad in ["", "P", "PT", "5M", "PTM", "PT5", "PT5M1H", "P1M", "PT0S", "PT1.5M"] {
            assert_eq!(parse_interval(bad), None, "{bad}");
        }
    }

    #[test]
    fn aggregations_reduce_a_bucket() {
        let v = [2.0, 8.0, 5.0];
        assert_eq!(Aggregation::Average.apply(&v), 5.0);
        assert_eq!(Aggregation::Total.apply(&v), 15.0);
        assert_eq!(Aggregation::Minimum.apply(&v), 2.0);
        assert_eq!(Aggregation::Maximum.apply(&v), 8.0);
        assert_eq!(Aggregation::Count.apply(&v), 3.0);
        for name in Aggregation::NAMES {
            assert_eq!(Aggregation::from_name(name).map(|a| a.as_str()), Some(*name));
        }
    }

    #[test]
    fn window_and_interval_shape_the_series() {
        let start = at("2026-03-01T00:00:00Z");
        let samples: Vec<_> = [1.0, 3.0, 5.0, 7.0, 9.0, 11.0]
            .into_iter()
            .enumerate()
            .map(|(i, v)| (start + minutes(i as i64), v))
            .collect();

        let all = aggregate(
            samples.clone(),
            start,
            start + minutes(10),
            minutes(1),
            Aggregation::Average,
        );
        assert_eq!(all, vec![1.0, 3.0, 5.0, 7.0, 9.0, 11.0]);

        let paired = aggregate(
            samples.clone(),
            start,
            start + minutes(10),
            minutes(2),
            Aggregation::Maximum,
        );
        assert_eq!(paired, vec![3.0, 7.0, 11.0]);

        let windowed = aggregate(
            samples.clone(),
            start + minutes(1),
            start + minutes(4),
            minutes(3),
            Aggregation::Total,
        );
        assert_eq!(windowed, vec![15.0]);

        let outside = aggregate(
            samples,
            at("1999-01-01T00:00:00Z"),
            at("1999-01-02T00:00:00Z"),
            minutes(5),
            Aggregation::Average,
        );
        assert!(outside.is_empty());
    }
}
