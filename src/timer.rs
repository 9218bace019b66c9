//! # Actor Timers
//!
//! Actors may declare a timer expression such as `"30s"`, `"5m"`, `"1.5h"` or
//! `"1d"`. The expression is parsed once at declaration time into a
//! [`TimerSpec`]; actors only store it. Scheduling is left to the runtime that
//! consumes the registry.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Parsed timer expression: fire every `interval`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimerSpec {
    expression: String,
    interval: Duration,
}

impl TimerSpec {
    /// Timer firing every `interval`
    pub fn every(interval: Duration) -> Self {
        Self {
            expression: format!("{}s", interval.as_secs_f64()),
            interval,
        }
    }

    /// Original expression the timer was parsed from
    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl fmt::Display for TimerSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.expression)
    }
}

impl FromStr for TimerSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let compact: String = s.chars().filter(|c| !c.is_whitespace()).collect();
        if compact.is_empty() {
            return Err("empty timer expression".to_string());
        }

        let (number, multiplier) = match compact.char_indices().last() {
            Some((idx, unit)) if unit.is_ascii_alphabetic() => {
                let multiplier = match unit {
                    's' => 1.0,
                    'm' => 60.0,
                    'h' => 3600.0,
                    'd' => 86400.0,
                    other => return Err(format!("unknown time unit '{other}'")),
                };
                (&compact[..idx], multiplier)
            }
            _ => (compact.as_str(), 1.0),
        };

        let value: f64 = number
            .parse()
            .map_err(|_| format!("'{number}' is not a number"))?;
        let seconds = value * multiplier;
        if !seconds.is_finite() || seconds <= 0.0 {
            return Err("timer interval must be positive".to_string());
        }

        let interval = Duration::try_from_secs_f64(seconds)
            .map_err(|e| format!("timer interval out of range: {e}"))?;
        if interval.is_zero() {
            return Err("timer interval must be positive".to_string());
        }

        Ok(Self {
            expression: s.trim().to_string(),
            interval,
        })
    }
}

impl TryFrom<String> for TimerSpec {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimerSpec> for String {
    fn from(spec: TimerSpec) -> Self {
        spec.expression
    }
}
