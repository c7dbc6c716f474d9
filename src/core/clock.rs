//! Wall clock bound to the runner's fixed time zone.
//!
//! Every "today" decision and every audit timestamp goes through a
//! [`LocalClock`], so tests can pin the date with a manual [`Clock`].

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Timezone used when the settings do not name one (UTC+8).
pub const DEFAULT_TIMEZONE: &str = "Asia/Taipei";

/// Format of audit-log and registry timestamps.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Errors produced when reading a timestamp back.
#[derive(Debug, Error)]
pub enum TimestampError {
    /// The text does not match [`TIMESTAMP_FORMAT`].
    #[error("invalid timestamp '{text}': {source}")]
    Malformed {
        text: String,
        #[source]
        source: chrono::ParseError,
    },

    /// The local time does not exist in the zone (DST gap).
    #[error("timestamp '{0}' does not exist in the configured time zone")]
    Nonexistent(String),

    /// Unknown IANA zone name.
    #[error("invalid timezone: {0}")]
    InvalidTimezone(String),
}

/// Source of the current instant.
pub trait Clock: Send + Sync {
    /// Current time in UTC.
    fn now(&self) -> DateTime<Utc>;
}

/// Clock backed by the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A [`Clock`] viewed through a fixed time zone.
#[derive(Clone)]
pub struct LocalClock {
    clock: Arc<dyn Clock>,
    tz: Tz,
}

impl LocalClock {
    /// Bind a clock to a time zone.
    pub fn new(clock: Arc<dyn Clock>, tz: Tz) -> Self {
        Self { clock, tz }
    }

    /// System clock in the given zone.
    pub fn system(tz: Tz) -> Self {
        Self::new(Arc::new(SystemClock), tz)
    }

    /// The configured time zone.
    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// Current local time.
    pub fn now(&self) -> DateTime<Tz> {
        self.clock.now().with_timezone(&self.tz)
    }

    /// Current local calendar date.
    pub fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }

    /// Current local time formatted with [`TIMESTAMP_FORMAT`].
    pub fn timestamp(&self) -> String {
        format_timestamp(&self.now())
    }
}

impl fmt::Debug for LocalClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalClock").field("tz", &self.tz).finish()
    }
}

/// Parse an IANA time zone name.
pub fn parse_timezone(name: &str) -> Result<Tz, TimestampError> {
    name.parse::<Tz>()
        .map_err(|_| TimestampError::InvalidTimezone(name.to_string()))
}

/// Format a local time to whole-second precision.
pub fn format_timestamp<T: TimeZone>(at: &DateTime<T>) -> String
where
    T::Offset: fmt::Display,
{
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a [`TIMESTAMP_FORMAT`] string as a local time in `tz`.
pub fn parse_timestamp(text: &str, tz: Tz) -> Result<DateTime<Tz>, TimestampError> {
    let naive = NaiveDateTime::parse_from_str(text, TIMESTAMP_FORMAT).map_err(|source| {
        TimestampError::Malformed {
            text: text.to_string(),
            source,
        }
    })?;

    tz.from_local_datetime(&naive)
        .earliest()
        .ok_or_else(|| TimestampError::Nonexistent(text.to_string()))
}
