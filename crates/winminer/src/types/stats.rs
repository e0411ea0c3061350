//! Historical statistics.

use chrono::{DateTime, FixedOffset};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Response to `GET /user/stats`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsResponse {
    /// Per-machine, per-currency entries.
    pub stats: Vec<StatEntry>,
    /// Current balance.
    pub balance: Decimal,
    /// Pending (cached) balance.
    pub cache: Decimal,
}

/// One statistics entry.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StatEntry {
    /// Client identifier.
    #[serde(rename = "clientId")]
    pub client_id: i64,
    /// RFC 3339 timestamp; see [`StatEntry::parsed_date`].
    pub date: String,
    /// Mined currency.
    pub currency: String,
    /// Machine SID.
    #[serde(rename = "machineId")]
    pub machine_id: String,
    /// Reward in US dollars.
    #[serde(rename = "rewardUSD")]
    pub reward_usd: Decimal,
    /// Hashes per second.
    #[serde(rename = "hashSec")]
    pub hash_sec: i64,
}

impl StatEntry {
    /// Parse [`StatEntry::date`].
    pub fn parsed_date(&self) -> Result<DateTime<FixedOffset>, chrono::ParseError> {
        parse_date(&self.date)
    }
}

/// Parse a date in the API's string encoding (RFC 3339).
pub fn parse_date(date: &str) -> Result<DateTime<FixedOffset>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(date)
}
