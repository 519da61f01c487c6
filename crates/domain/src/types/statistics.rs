//! Statistics query body.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::errors::{AdflowError, Result};

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const GROUP_BY_FIELDS: &[&str] = &[
    "campaign_id",
    "zone_id",
    "country_id",
    "date_time",
    "hour",
    "banner_id",
    "os_id",
    "browser_id",
    "connection_type_id",
];

const ORDER_BY_FIELDS: &[&str] =
    &["impressions", "clicks", "conversions", "spent", "payout", "ctr", "cr", "cpa"];

/// Body of `POST /adv/statistics`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatisticsQuery {
    pub day_from: String,
    pub day_to: String,
    #[serde(default = "default_tz")]
    pub tz: String,
    #[serde(default = "default_group_by")]
    pub group_by: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub campaign_id: Option<Vec<u64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone_id: Option<Vec<u64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geo: Option<Vec<String>>,
    #[serde(default = "default_order_by")]
    pub order_by: String,
    #[serde(default = "default_order_dest")]
    pub order_dest: String,
}

fn default_tz() -> String {
    "+0000".to_string()
}

fn default_group_by() -> Vec<String> {
    vec!["campaign_id".to_string()]
}

fn default_order_by() -> String {
    "spent".to_string()
}

fn default_order_dest() -> String {
    "desc".to_string()
}

impl StatisticsQuery {
    /// Query for `[day_from, day_to]` with the upstream defaults for every
    /// other field.
    pub fn new(day_from: impl Into<String>, day_to: impl Into<String>) -> Self {
        Self {
            day_from: day_from.into(),
            day_to: day_to.into(),
            tz: default_tz(),
            group_by: default_group_by(),
            campaign_id: None,
            zone_id: None,
            geo: None,
            order_by: default_order_by(),
            order_dest: default_order_dest(),
        }
    }

    #[must_use]
    pub fn group_by(mut self, fields: &[&str]) -> Self {
        self.group_by = fields.iter().map(|f| (*f).to_string()).collect();
        self
    }

    #[must_use]
    pub fn campaigns(mut self, ids: Vec<u64>) -> Self {
        self.campaign_id = Some(ids);
        self
    }

    /// Check the shapes the upstream rejects with a 400.
    ///
    /// # Errors
    /// Returns `AdflowError::InvalidInput` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        let from = parse_datetime("day_from", &self.day_from)?;
        let to = parse_datetime("day_to", &self.day_to)?;
        if from > to {
            return Err(AdflowError::InvalidInput("day_from must not be after day_to".into()));
        }

        let tz = self.tz.as_bytes();
        let tz_ok = tz.len() == 5
            && matches!(tz[0], b'+' | b'-')
            && tz[1..].iter().all(u8::is_ascii_digit);
        if !tz_ok {
            return Err(AdflowError::InvalidInput(format!(
                "tz must look like +HHMM or -HHMM, got {}",
                self.tz
            )));
        }

        if let Some(field) = self.group_by.iter().find(|f| !GROUP_BY_FIELDS.contains(&f.as_str())) {
            return Err(AdflowError::InvalidInput(format!("invalid group_by field: {field}")));
        }
        if !ORDER_BY_FIELDS.contains(&self.order_by.as_str()) {
            return Err(AdflowError::InvalidInput(format!(
                "invalid order_by field: {}",
                self.order_by
            )));
        }
        if !matches!(self.order_dest.as_str(), "asc" | "desc") {
            return Err(AdflowError::InvalidInput("order_dest must be \"asc\" or \"desc\"".into()));
        }
        Ok(())
    }
}

fn parse_datetime(field: &str, value: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, DATETIME_FORMAT).map_err(|_| {
        AdflowError::InvalidInput(format!("{field} must be in YYYY-MM-DD HH:MM:SS format"))
    })
}
