//! Recurring schedule for the background updater

use chrono::{NaiveTime, Timelike};
use installthecli_core::types::UpdateConfig;
use installthecli_core::{Error, Result};
use serde::Serialize;

/// When the update procedure runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RecurringSchedule {
    /// Once at system startup
    pub at_boot: bool,

    /// Once at interactive logon
    pub at_logon: bool,

    /// Daily, local time
    #[serde(serialize_with = "serialize_hhmm")]
    pub daily_at: NaiveTime,
}

impl Default for RecurringSchedule {
    fn default() -> Self {
        Self {
            at_boot: true,
            at_logon: true,
            daily_at: NaiveTime::from_hms_opt(3, 0, 0).unwrap_or(NaiveTime::MIN),
        }
    }
}

impl RecurringSchedule {
    /// Build from the `update` configuration section
    pub fn from_config(config: &UpdateConfig) -> Result<Self> {
        Ok(Self {
            at_boot: config.at_boot,
            at_logon: config.at_logon,
            daily_at: parse_daily_time(&config.daily_at)?,
        })
    }

    /// Daily time as "HH:MM"
    pub fn daily_hhmm(&self) -> String {
        self.daily_at.format("%H:%M").to_string()
    }

    /// Cron time fields for the daily run, "MM HH"
    pub fn cron_minute_hour(&self) -> String {
        format!("{} {}", self.daily_at.minute(), self.daily_at.hour())
    }

    /// Human-readable list of triggers
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if self.at_boot {
            parts.push("at boot".to_string());
        }
        if self.at_logon {
            parts.push("at logon".to_string());
        }
        parts.push(format!("daily at {}", self.daily_hhmm()));
        parts.join(", ")
    }
}

/// Parse a 24-hour "HH:MM" time
pub fn parse_daily_time(value: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M").map_err(|e| {
        Error::invalid_schedule(format!(
            "daily_at must be a 24-hour HH:MM time, got '{}': {}",
            value, e
        ))
    })
}

fn serialize_hhmm<S: serde::Serializer>(
    time: &NaiveTime,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&time.format("%H:%M").to_string())
}
