//! Analyzer settings: analysis horizon, trading calendar and defaults.
//!
//! ```ini
//! [analizer]
//! horizon_weeks = 1
//! horizon_days = 2
//! horizon_hours = 3
//! series = 3
//! volume = 1
//!
//! [calendar]
//! bars_per_day = 19
//! days_per_week = 5
//! ```

use crate::domain::backtest::DEFAULT_VOLUME;
use crate::domain::config_validation::validate_analyzer_config;
use crate::domain::error::BarchartError;
use crate::ports::config_port::ConfigPort;

pub const BARS_PER_DAY: u32 = 19;
pub const TRADING_DAYS_PER_WEEK: u32 = 5;
pub const DEFAULT_SERIES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TradingCalendar {
    pub bars_per_day: u32,
    pub days_per_week: u32,
}

impl Default for TradingCalendar {
    fn default() -> Self {
        TradingCalendar {
            bars_per_day: BARS_PER_DAY,
            days_per_week: TRADING_DAYS_PER_WEEK,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Horizon {
    pub weeks: u32,
    pub days: u32,
    pub hours: u32,
}

impl Horizon {
    /// Number of bars the horizon spans on `calendar`.
    pub fn bars(&self, calendar: &TradingCalendar) -> usize {
        let per_day = calendar.bars_per_day as usize;
        (self.weeks as usize)
            .saturating_mul(calendar.days_per_week as usize)
            .saturating_mul(per_day)
            .saturating_add((self.days as usize).saturating_mul(per_day))
            .saturating_add(self.hours as usize)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzerSettings {
    pub horizon: Horizon,
    pub calendar: TradingCalendar,
    pub series: usize,
    pub volume: f64,
}

impl Default for AnalyzerSettings {
    fn default() -> Self {
        AnalyzerSettings {
            horizon: Horizon {
                weeks: 1,
                days: 0,
                hours: 0,
            },
            calendar: TradingCalendar::default(),
            series: DEFAULT_SERIES,
            volume: DEFAULT_VOLUME,
        }
    }
}

fn read_u32(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: u32,
) -> Result<u32, BarchartError> {
    let value = config.get_int(section, key, i64::from(default));
    u32::try_from(value).map_err(|_| BarchartError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: format!("{} is out of range: {}", key, value),
    })
}

impl AnalyzerSettings {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, BarchartError> {
        validate_analyzer_config(config)?;
        let defaults = AnalyzerSettings::default();

        Ok(AnalyzerSettings {
            horizon: Horizon {
                weeks: read_u32(config, "analizer", "horizon_weeks", defaults.horizon.weeks)?,
                days: read_u32(config, "analizer", "horizon_days", defaults.horizon.days)?,
                hours: read_u32(config, "analizer", "horizon_hours", defaults.horizon.hours)?,
            },
            calendar: TradingCalendar {
                bars_per_day: read_u32(config, "calendar", "bars_per_day", BARS_PER_DAY)?,
                days_per_week: read_u32(config, "calendar", "days_per_week", TRADING_DAYS_PER_WEEK)?,
            },
            series: read_u32(config, "analizer", "series", DEFAULT_SERIES as u32)? as usize,
            volume: config.get_double("analizer", "volume", DEFAULT_VOLUME),
        })
    }

    pub fn horizon_bars(&self) -> usize {
        self.horizon.bars(&self.calendar)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    #[test]
    fn horizon_bar_count() {
        let h = Horizon {
            weeks: 1,
            days: 2,
            hours: 3,
        };
        assert_eq!(h.bars(&TradingCalendar::default()), 95 + 38 + 3);
    }

    #[test]
    fn horizon_on_custom_calendar() {
        let h = Horizon {
            weeks: 1,
            days: 1,
            hours: 0,
        };
        let cal = TradingCalendar {
            bars_per_day: 24,
            days_per_week: 7,
        };
        assert_eq!(h.bars(&cal), 24 * 7 + 24);
    }

    #[test]
    fn from_config_reads_all_keys() {
        let ini = r#"
[analizer]
horizon_weeks = 0
horizon_days = 2
horizon_hours = 5
series = 4
volume = 3

[calendar]
bars_per_day = 8
"#;
        let adapter = FileConfigAdapter::from_string(ini).unwrap();
        let s = AnalyzerSettings::from_config(&adapter).unwrap();
        assert_eq!(s.horizon.days, 2);
        assert_eq!(s.calendar.bars_per_day, 8);
        assert_eq!(s.calendar.days_per_week, 5);
        assert_eq!(s.series, 4);
        assert_eq!(s.volume, 3.0);
        assert_eq!(s.horizon_bars(), 2 * 8 + 5);
    }

    #[test]
    fn from_config_defaults() {
        let adapter = FileConfigAdapter::from_string("[analizer]\n").unwrap();
        let s = AnalyzerSettings::from_config(&adapter).unwrap();
        assert_eq!(s, AnalyzerSettings::default());
        assert_eq!(s.horizon_bars(), 95);
    }

    #[test]
    fn from_config_rejects_negative_horizon() {
        let adapter =
            FileConfigAdapter::from_string("[analizer]\nhorizon_days = -1\n").unwrap();
        assert!(matches!(
            AnalyzerSettings::from_config(&adapter),
            Err(BarchartError::ConfigInvalid { key, .. }) if key == "horizon_days"
        ));
    }

    #[test]
    fn from_config_rejects_oversized_values() {
        for key in ["horizon_weeks", "horizon_hours", "series"] {
            let ini = format!("[analizer]\n{} = 4294967296\n", key);
            let adapter = FileConfigAdapter::from_string(&ini).unwrap();
            assert!(matches!(
                AnalyzerSettings::from_config(&adapter),
                Err(BarchartError::ConfigInvalid { key: k, .. }) if k == key
            ));
        }

        let adapter =
            FileConfigAdapter::from_string("[calendar]\nbars_per_day = 99999999999\n").unwrap();
        assert!(matches!(
            AnalyzerSettings::from_config(&adapter),
            Err(BarchartError::ConfigInvalid { key, .. }) if key == "bars_per_day"
        ));
    }
}
