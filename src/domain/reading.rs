//! Indicator readings carried on a price bar.
//!
//! - `Reading`: typed key of a precomputed value on a [`PriceBar`](super::price::PriceBar)
//! - `Indicator`: display name plus the reading it resolves to
//! - `IndicatorCondition`: an indicator paired with a threshold

use std::fmt;
use std::str::FromStr;

/// Key of a precomputed indicator value.
///
/// The four averaged groups are always produced by the price store; any other
/// indicator a strategy references is a `Custom` reading, keyed by its
/// normalised name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Reading {
    ShorttermAverage,
    MiddletermAverage,
    LongtermAverage,
    Overall,
    Custom(String),
}

impl Reading {
    /// Lower-cases and strips `_`, `-` and whitespace.
    fn normalise(name: &str) -> String {
        name.chars()
            .filter(|c| !matches!(c, '_' | '-') && !c.is_whitespace())
            .flat_map(char::to_lowercase)
            .collect()
    }

    /// Column/key name used by the price stores.
    pub fn key(&self) -> String {
        match self {
            Reading::ShorttermAverage => "shortterm_average".into(),
            Reading::MiddletermAverage => "middleterm_average".into(),
            Reading::LongtermAverage => "longterm_average".into(),
            Reading::Overall => "overall".into(),
            Reading::Custom(name) => name.clone(),
        }
    }
}

impl FromStr for Reading {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = Self::normalise(s);
        if name.is_empty() {
            return Err("empty indicator name".into());
        }
        Ok(match name.as_str() {
            "shorttermaverage" => Reading::ShorttermAverage,
            "middletermaverage" => Reading::MiddletermAverage,
            "longtermaverage" => Reading::LongtermAverage,
            "overall" | "overallaverage" => Reading::Overall,
            _ => Reading::Custom(name),
        })
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Indicator {
    pub name: String,
    pub strategy_method: Reading,
}

impl Indicator {
    pub fn new(name: impl Into<String>, strategy_method: Reading) -> Self {
        Self {
            name: name.into(),
            strategy_method,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorCondition {
    pub indicator: Indicator,
    pub threshold: f64,
}

impl IndicatorCondition {
    pub fn new(indicator: Indicator, threshold: f64) -> Self {
        Self {
            indicator,
            threshold,
        }
    }

    /// Parse `name:threshold`, the form used in strategy files.
    pub fn parse(input: &str) -> Result<Self, String> {
        let (name, threshold) = input
            .split_once(':')
            .ok_or_else(|| format!("expected name:threshold, got '{}'", input.trim()))?;
        let name = name.trim();
        let reading: Reading = name.parse()?;
        let threshold: f64 = threshold
            .trim()
            .parse()
            .map_err(|_| format!("invalid threshold for {}: '{}'", name, threshold.trim()))?;
        Ok(Self::new(Indicator::new(name, reading), threshold))
    }
}

impl fmt::Display for IndicatorCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.indicator.strategy_method, self.threshold)
    }
}
