//! Sequence filters over an ordered price series.
//!
//! Each filter borrows its input and returns the bars that match, in input
//! order. Bars that do not match are left out of the result.

use crate::domain::error::BarchartError;
use crate::domain::price::PriceBar;
use crate::domain::reading::Reading;
use crate::domain::signal::Direction;
use std::fmt;
use std::str::FromStr;

/// Averaged indicator groups precomputed on every bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AverageKind {
    ShortTerm = 1,
    MiddleTerm = 2,
    LongTerm = 3,
    Overall = 4,
}

impl AverageKind {
    pub const ALL: [AverageKind; 4] = [
        AverageKind::ShortTerm,
        AverageKind::MiddleTerm,
        AverageKind::LongTerm,
        AverageKind::Overall,
    ];

    pub fn reading(self) -> Reading {
        match self {
            AverageKind::ShortTerm => Reading::ShorttermAverage,
            AverageKind::MiddleTerm => Reading::MiddletermAverage,
            AverageKind::LongTerm => Reading::LongtermAverage,
            AverageKind::Overall => Reading::Overall,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            AverageKind::ShortTerm => "Average of short-term indicators",
            AverageKind::MiddleTerm => "Average of middle-term indicators",
            AverageKind::LongTerm => "Average of long-term indicators",
            AverageKind::Overall => "Average of all indicators",
        }
    }
}

impl TryFrom<i64> for AverageKind {
    type Error = BarchartError;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(AverageKind::ShortTerm),
            2 => Ok(AverageKind::MiddleTerm),
            3 => Ok(AverageKind::LongTerm),
            4 => Ok(AverageKind::Overall),
            other => Err(BarchartError::UnknownAverage(other.to_string())),
        }
    }
}

impl FromStr for AverageKind {
    type Err = BarchartError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(code) = trimmed.parse::<i64>() {
            return AverageKind::try_from(code);
        }
        match trimmed.to_lowercase().replace(['-', '_'], "").as_str() {
            "short" | "shortterm" => Ok(AverageKind::ShortTerm),
            "middle" | "middleterm" => Ok(AverageKind::MiddleTerm),
            "long" | "longterm" => Ok(AverageKind::LongTerm),
            "overall" => Ok(AverageKind::Overall),
            _ => Err(BarchartError::UnknownAverage(trimmed.to_string())),
        }
    }
}

impl fmt::Display for AverageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AverageKind::ShortTerm => "short-term",
            AverageKind::MiddleTerm => "middle-term",
            AverageKind::LongTerm => "long-term",
            AverageKind::Overall => "overall",
        };
        f.write_str(name)
    }
}

/// (code, description) for every averaged group, for listings.
pub fn average_kind_names() -> Vec<(i64, &'static str)> {
    AverageKind::ALL
        .iter()
        .map(|k| (*k as i64, k.description()))
        .collect()
}

pub fn trend_filter(prices: &[PriceBar], trend: i32) -> Vec<PriceBar> {
    prices.iter().filter(|p| p.trend == trend).cloned().collect()
}

/// Keep bars by volume. Without an explicit threshold (`None` or zero) the
/// mean volume of `prices` is used.
pub fn volume_filter(prices: &[PriceBar], volume: Option<f64>, lower_than: bool) -> Vec<PriceBar> {
    if prices.is_empty() {
        return Vec::new();
    }

    let threshold = match volume.filter(|v| *v != 0.0) {
        Some(v) => v,
        None => prices.iter().map(|p| p.volume as f64).sum::<f64>() / prices.len() as f64,
    };

    prices
        .iter()
        .filter(|p| {
            let v = p.volume as f64;
            if lower_than { v <= threshold } else { v >= threshold }
        })
        .cloned()
        .collect()
}

/// Keep bars whose averaged group reading clears `percent`. A non-negative
/// `percent` keeps readings at or above it, a negative one keeps readings
/// strictly below it.
pub fn average_filter(
    prices: &[PriceBar],
    kind: AverageKind,
    percent: f64,
) -> Result<Vec<PriceBar>, BarchartError> {
    let reading = kind.reading();
    let mut result = Vec::new();
    for price in prices {
        let value = price.reading(&reading)?;
        if (percent >= 0.0 && value >= percent) || (percent < 0.0 && value < percent) {
            result.push(price.clone());
        }
    }
    Ok(result)
}

/// Keep the bar at position `k` when exactly `streak` bars from `k` to the end
/// of the series carry `reading == direction.sign()`. Quadratic in the length
/// of `prices`.
pub fn indicator_series_filter(
    prices: &[PriceBar],
    reading: &Reading,
    direction: Direction,
    streak: usize,
) -> Result<Vec<PriceBar>, BarchartError> {
    let target = direction.sign() as f64;
    let mut result = Vec::new();
    for (k, price) in prices.iter().enumerate() {
        let mut count = 0usize;
        for later in &prices[k..] {
            if later.reading(reading)? == target {
                count += 1;
            }
        }
        if count == streak {
            result.push(price.clone());
        }
    }
    Ok(result)
}
