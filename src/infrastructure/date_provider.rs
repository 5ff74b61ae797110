use crate::domain::models::format_hhmm;
use crate::infrastructure::error::InfraError;
use chrono::{DateTime, NaiveTime, SecondsFormat, Utc};
use chrono_tz::Tz;
use std::sync::atomic::{AtomicI64, Ordering};

/// Clock and timestamp conversions. Wall-clock values are taken in `timezone()`.
pub trait DateProvider: Send + Sync {
    fn now_ms(&self) -> i64;

    fn timezone(&self) -> Tz;

    fn parse_iso_string(&self, value: &str) -> Result<i64, InfraError> {
        DateTime::parse_from_rfc3339(value.trim())
            .map(|parsed| parsed.timestamp_millis())
            .map_err(|error| InfraError::InvalidTimestamp(format!("'{value}': {error}")))
    }

    fn ms_to_iso_string(&self, ms: i64) -> Result<String, InfraError> {
        Ok(utc_from_millis(ms)?.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    fn time_of_day(&self, ms: i64) -> Result<NaiveTime, InfraError> {
        Ok(utc_from_millis(ms)?.with_timezone(&self.timezone()).time())
    }

    fn to_hhmm(&self, ms: i64) -> Result<String, InfraError> {
        Ok(format_hhmm(self.time_of_day(ms)?))
    }
}

fn utc_from_millis(ms: i64) -> Result<DateTime<Utc>, InfraError> {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .ok_or_else(|| InfraError::InvalidTimestamp(format!("{ms}ms is out of range")))
}

#[derive(Debug, Clone)]
pub struct SystemDateProvider {
    timezone: Tz,
}

impl SystemDateProvider {
    pub fn new(timezone: Tz) -> Self {
        Self { timezone }
    }
}

impl Default for SystemDateProvider {
    fn default() -> Self {
        Self::new(Tz::UTC)
    }
}

impl DateProvider for SystemDateProvider {
    fn now_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }

    fn timezone(&self) -> Tz {
        self.timezone
    }
}

/// Settable clock for hosts that drive time themselves.
#[derive(Debug)]
pub struct StubDateProvider {
    now_ms: AtomicI64,
    timezone: Tz,
}

impl StubDateProvider {
    pub fn new(now_ms: i64, timezone: Tz) -> Self {
        Self {
            now_ms: AtomicI64::new(now_ms),
            timezone,
        }
    }

    pub fn from_iso(value: &str) -> Result<Self, InfraError> {
        let parsed = DateTime::parse_from_rfc3339(value)
            .map_err(|error| InfraError::InvalidTimestamp(format!("'{value}': {error}")))?;
        Ok(Self::new(parsed.timestamp_millis(), Tz::UTC))
    }

    pub fn set_now_ms(&self, now_ms: i64) {
        self.now_ms.store(now_ms, Ordering::SeqCst);
    }

    pub fn advance_ms(&self, delta_ms: i64) -> i64 {
        self.now_ms.fetch_add(delta_ms, Ordering::SeqCst) + delta_ms
    }
}

impl DateProvider for StubDateProvider {
    fn now_ms(&self) -> i64 {
        self.now_ms.load(Ordering::SeqCst)
    }

    fn timezone(&self) -> Tz {
        self.timezone
    }
}
