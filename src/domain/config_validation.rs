//! Configuration validation.
//!
//! Validates analyzer, data source and strategy files before a run.

use crate::domain::error::BarchartError;
use crate::domain::strategy::signal_ids;
use crate::ports::config_port::ConfigPort;

pub fn validate_analyzer_config(config: &dyn ConfigPort) -> Result<(), BarchartError> {
    for key in ["horizon_weeks", "horizon_days", "horizon_hours"] {
        validate_non_negative_int(config, "analizer", key)?;
    }
    validate_positive_int(config, "analizer", "series")?;
    validate_positive_int(config, "calendar", "bars_per_day")?;
    validate_positive_int(config, "calendar", "days_per_week")?;
    validate_volume(config)?;
    Ok(())
}

pub fn validate_data_config(config: &dyn ConfigPort) -> Result<(), BarchartError> {
    let source = config
        .get_string("data", "source")
        .unwrap_or_else(|| "csv".to_string());
    match source.trim().to_lowercase().as_str() {
        "csv" => require_key(config, "csv", "path"),
        "sqlite" => require_key(config, "sqlite", "path"),
        other => Err(BarchartError::ConfigInvalid {
            section: "data".to_string(),
            key: "source".to_string(),
            reason: format!("unknown data source '{}', expected csv or sqlite", other),
        }),
    }
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), BarchartError> {
    require_key(config, "strategy", "symbol")?;
    let ids = signal_ids(config)?;
    if ids.is_empty() {
        return Err(BarchartError::StrategyInvalid {
            reason: "strategy has no signals".to_string(),
        });
    }
    for id in &ids {
        let section = format!("signal.{}", id);
        validate_direction(config, &section)?;
    }
    Ok(())
}

fn require_key(config: &dyn ConfigPort, section: &str, key: &str) -> Result<(), BarchartError> {
    match config.get_string(section, key) {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(BarchartError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        }),
    }
}

fn validate_non_negative_int(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<(), BarchartError> {
    if config.get_int(section, key, 0) < 0 {
        return Err(BarchartError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: format!("{} must be non-negative", key),
        });
    }
    Ok(())
}

fn validate_positive_int(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<(), BarchartError> {
    if config.get_int(section, key, 1) <= 0 {
        return Err(BarchartError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: format!("{} must be positive", key),
        });
    }
    Ok(())
}

fn validate_volume(config: &dyn ConfigPort) -> Result<(), BarchartError> {
    let value = config.get_double("analizer", "volume", 1.0);
    if value <= 0.0 {
        return Err(BarchartError::ConfigInvalid {
            section: "analizer".to_string(),
            key: "volume".to_string(),
            reason: "volume must be positive".to_string(),
        });
    }
    Ok(())
}

fn validate_direction(config: &dyn ConfigPort, section: &str) -> Result<(), BarchartError> {
    match config.get_string(section, "direction") {
        None => Err(BarchartError::ConfigMissing {
            section: section.to_string(),
            key: "direction".to_string(),
        }),
        Some(d) => match d.trim().to_lowercase().as_str() {
            "buy" | "sell" | "long" | "short" | "1" | "-1" => Ok(()),
            other => Err(BarchartError::ConfigInvalid {
                section: section.to_string(),
                key: "direction".to_string(),
                reason: format!("unknown direction '{}'", other),
            }),
        },
    }
}
