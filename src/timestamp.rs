/**
 * Timestamp resolution for date/time column pairs
 *
 * The data logger writes dates in the locale of the machine running the
 * export software, so the caller picks the ordering (month-first or day-first)
 * and the timezone the camera clock was set to.
 */

use chrono::{DateTime, FixedOffset, NaiveDateTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::ParseError;

closed_set! {
    /// Order of the date components in the export
    pub enum TimestampFormat ("TimestampFormat") {
        /// month/day/year
        Us => "US",
        /// day/month/year
        Eu => "EU",
    }
}

impl TimestampFormat {
    /// chrono layout for `<date>T<time>`
    pub fn layout(&self) -> &'static str {
        match self {
            TimestampFormat::Us => "%m/%d/%YT%H:%M:%S",
            TimestampFormat::Eu => "%d/%m/%YT%H:%M:%S",
        }
    }
}

impl Default for TimestampFormat {
    fn default() -> Self {
        TimestampFormat::Us
    }
}

/// Source of the timezone a given camera body's clock runs in.
///
/// Plain timezones answer the same for every camera; configuration can answer
/// per camera ID.
pub trait CameraTimezone {
    type Tz: TimeZone;

    fn timezone_for(&self, camera_id: i64) -> Self::Tz;
}

impl<T: CameraTimezone + ?Sized> CameraTimezone for &T {
    type Tz = T::Tz;

    fn timezone_for(&self, camera_id: i64) -> T::Tz {
        (**self).timezone_for(camera_id)
    }
}

impl CameraTimezone for Utc {
    type Tz = Utc;

    fn timezone_for(&self, _camera_id: i64) -> Utc {
        Utc
    }
}

impl CameraTimezone for Tz {
    type Tz = Tz;

    fn timezone_for(&self, _camera_id: i64) -> Tz {
        *self
    }
}

impl CameraTimezone for FixedOffset {
    type Tz = FixedOffset;

    fn timezone_for(&self, _camera_id: i64) -> FixedOffset {
        *self
    }
}

/// Combine a date field and a time field into an instant.
///
/// Returns `Ok(None)` when either field is blank.
pub fn resolve<Z: TimeZone>(
    date: &str,
    time: &str,
    tz: &Z,
    format: TimestampFormat,
) -> Result<Option<DateTime<FixedOffset>>, ParseError> {
    let (date, time) = (date.trim(), time.trim());
    if date.is_empty() || time.is_empty() {
        return Ok(None);
    }

    let raw = format!("{}T{}", date, time);
    let naive = NaiveDateTime::parse_from_str(&raw, format.layout()).map_err(|source| {
        ParseError::Timestamp {
            value: raw.clone(),
            source,
        }
    })?;

    // DST overlaps resolve to the earlier instant
    let local = tz
        .from_local_datetime(&naive)
        .earliest()
        .ok_or_else(|| ParseError::NonexistentLocalTime(raw.clone()))?;

    let offset = local.offset().fix();
    Ok(Some(local.with_timezone(&offset)))
}

/// Look up an IANA timezone name such as `Europe/Moscow` or `UTC`
pub fn parse_timezone(name: &str) -> Option<Tz> {
    name.trim().parse::<Tz>().ok()
}
