//! Strategy definition and loading from a strategy file.
//!
//! ```ini
//! [strategy]
//! name = Averages
//! symbol = ES
//! author = rottenwood
//! signals = long, short
//!
//! [signal.long]
//! direction = buy
//! conditions = shortterm_average:50, overall:33
//! stop_loss_percent = 2
//! take_profit = 15
//! ```

use crate::domain::error::BarchartError;
use crate::domain::reading::IndicatorCondition;
use crate::domain::signal::{Direction, Signal};
use crate::ports::config_port::ConfigPort;

#[derive(Debug, Clone, PartialEq)]
pub struct Strategy {
    pub name: String,
    pub symbol: String,
    pub author: Option<String>,
    pub signals: Vec<Signal>,
}

impl Strategy {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, BarchartError> {
        let name = config
            .get_string("strategy", "name")
            .unwrap_or_else(|| "Unnamed".to_string());
        let symbol = config
            .get_string("strategy", "symbol")
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| BarchartError::ConfigMissing {
                section: "strategy".into(),
                key: "symbol".into(),
            })?;
        let author = config
            .get_string("strategy", "author")
            .filter(|s| !s.trim().is_empty());

        let mut signals = Vec::new();
        for id in signal_ids(config)? {
            signals.push(load_signal(config, &id)?);
        }

        Ok(Strategy {
            name,
            symbol,
            author,
            signals,
        })
    }
}

/// Ids listed under `[strategy] signals`, in file order.
pub fn signal_ids(config: &dyn ConfigPort) -> Result<Vec<String>, BarchartError> {
    let list = config
        .get_string("strategy", "signals")
        .ok_or_else(|| BarchartError::ConfigMissing {
            section: "strategy".into(),
            key: "signals".into(),
        })?;

    let mut ids: Vec<String> = Vec::new();
    for token in list.split(',') {
        let id = token.trim();
        if id.is_empty() {
            return Err(BarchartError::StrategyInvalid {
                reason: "empty signal id in signal list".into(),
            });
        }
        if ids.iter().any(|existing| existing == id) {
            return Err(BarchartError::StrategyInvalid {
                reason: format!("duplicate signal id: {}", id),
            });
        }
        ids.push(id.to_string());
    }
    Ok(ids)
}

fn load_signal(config: &dyn ConfigPort, id: &str) -> Result<Signal, BarchartError> {
    let section = format!("signal.{}", id);

    let direction: Direction = config
        .get_string(&section, "direction")
        .ok_or_else(|| BarchartError::ConfigMissing {
            section: section.clone(),
            key: "direction".into(),
        })?
        .parse()
        .map_err(|reason| BarchartError::ConfigInvalid {
            section: section.clone(),
            key: "direction".into(),
            reason,
        })?;

    let conditions = match config.get_string(&section, "conditions") {
        Some(list) if !list.trim().is_empty() => list
            .split(',')
            .map(IndicatorCondition::parse)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|reason| BarchartError::ConfigInvalid {
                section: section.clone(),
                key: "conditions".into(),
                reason,
            })?,
        _ => Vec::new(),
    };

    let mut signal = Signal::new(direction, conditions);
    signal.name = Some(id.to_string());
    signal.stop_loss_percent = exit_value(config, &section, "stop_loss_percent")?;
    signal.take_profit_percent = exit_value(config, &section, "take_profit_percent")?;
    signal.stop_loss = exit_value(config, &section, "stop_loss")?;
    signal.take_profit = exit_value(config, &section, "take_profit")?;
    Ok(signal)
}

fn exit_value(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<f64>, BarchartError> {
    match config.get_string(section, key) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<f64>()
            .map(|v| if v == 0.0 { None } else { Some(v) })
            .map_err(|_| BarchartError::ConfigInvalid {
                section: section.to_string(),
                key: key.to_string(),
                reason: format!("expected a number, got '{}'", raw.trim()),
            }),
    }
}
