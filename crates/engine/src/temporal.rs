//! Date, time and date-time parsing shared by content handlers and
//! constraints.
//!
//! Form inputs carry local wall-clock values (`2017-06-01T08:30`); the wire
//! carries UTC instants in `toISOString` form (`2017-06-01T06:30:00.000Z`).
//! Wall-clock values are read in a [`LocalZone`]: either the host's time
//! zone, where the offset is the one in force on each value's own date, or
//! a fixed offset.

use chrono::{Local, NaiveDate, NaiveDateTime, TimeZone};
use time::format_description::well_known::Rfc3339;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};

const DATE: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");
const TIME_HM: &[BorrowedFormatItem<'static>] = format_description!("[hour]:[minute]");
const TIME_HMS: &[BorrowedFormatItem<'static>] = format_description!("[hour]:[minute]:[second]");
const LOCAL_HM: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]T[hour]:[minute]");
const LOCAL_HMS: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");
const LOCAL_HMS_FRAC: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]");
const UTC_ISO: &[BorrowedFormatItem<'static>] = format_description!(
    "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z"
);

pub fn parse_date(s: &str) -> Option<Date> {
    Date::parse(s.trim(), DATE).ok()
}

pub fn parse_time(s: &str) -> Option<Time> {
    let s = s.trim();
    Time::parse(s, TIME_HMS)
        .or_else(|_| Time::parse(s, TIME_HM))
        .ok()
}

/// Parse a wall-clock date-time without offset.
fn parse_local(s: &str) -> Option<PrimitiveDateTime> {
    [LOCAL_HMS_FRAC, LOCAL_HMS, LOCAL_HM]
        .iter()
        .find_map(|fmt| PrimitiveDateTime::parse(s, *fmt).ok())
}

// ──────────────────────────────────────────────
// Zones
// ──────────────────────────────────────────────

/// Time zone wall-clock form values are interpreted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LocalZone {
    /// The host's time zone, looked up per value.
    #[default]
    Host,
    /// One offset for every value.
    Fixed(UtcOffset),
}

impl From<UtcOffset> for LocalZone {
    fn from(offset: UtcOffset) -> Self {
        LocalZone::Fixed(offset)
    }
}

impl LocalZone {
    /// Offset in force at a wall-clock time.
    ///
    /// A repeated hour takes the earlier offset and a skipped hour the
    /// offset before the transition, as browsers do when parsing local
    /// date-times.
    pub fn offset_at_local(self, dt: PrimitiveDateTime) -> UtcOffset {
        match self {
            LocalZone::Fixed(offset) => offset,
            LocalZone::Host => host_offset_at_local(dt).unwrap_or(UtcOffset::UTC),
        }
    }

    /// Offset in force at an instant.
    pub fn offset_at(self, dt: OffsetDateTime) -> UtcOffset {
        match self {
            LocalZone::Fixed(offset) => offset,
            LocalZone::Host => host_offset_at(dt).unwrap_or(UtcOffset::UTC),
        }
    }
}

fn to_naive(dt: PrimitiveDateTime) -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(dt.year(), u8::from(dt.month()).into(), dt.day().into())?
        .and_hms_nano_opt(
            dt.hour().into(),
            dt.minute().into(),
            dt.second().into(),
            dt.nanosecond(),
        )
}

fn from_seconds(seconds: i32) -> Option<UtcOffset> {
    UtcOffset::from_whole_seconds(seconds).ok()
}

fn host_offset_at_local(dt: PrimitiveDateTime) -> Option<UtcOffset> {
    let naive = to_naive(dt)?;
    let resolved = match Local.from_local_datetime(&naive) {
        chrono::LocalResult::Single(t) => t,
        chrono::LocalResult::Ambiguous(earliest, _) => earliest,
        chrono::LocalResult::None => Local
            .from_local_datetime(&(naive - chrono::Duration::hours(1)))
            .earliest()?,
    };
    from_seconds(resolved.offset().local_minus_utc())
}

fn host_offset_at(dt: OffsetDateTime) -> Option<UtcOffset> {
    let utc = dt.to_offset(UtcOffset::UTC);
    let naive = to_naive(PrimitiveDateTime::new(utc.date(), utc.time()))?;
    from_seconds(Local.from_utc_datetime(&naive).offset().local_minus_utc())
}

// ──────────────────────────────────────────────
// Conversions
// ──────────────────────────────────────────────

/// Parse an absolute instant.
///
/// RFC 3339 values keep their own offset and wall-clock values are read in
/// `zone`. A bare date is UTC midnight, as in `Date` parsing.
pub fn parse_instant(s: &str, zone: impl Into<LocalZone>) -> Option<OffsetDateTime> {
    let zone = zone.into();
    let s = s.trim();
    if let Ok(dt) = OffsetDateTime::parse(s, &Rfc3339) {
        return Some(dt);
    }
    if let Some(local) = parse_local(s) {
        return Some(local.assume_offset(zone.offset_at_local(local)));
    }
    parse_date(s).map(|d| d.midnight().assume_utc())
}

/// UTC ISO-8601 with millisecond precision, matching `Date.toISOString()`.
pub fn to_utc_iso(dt: OffsetDateTime) -> Option<String> {
    dt.to_offset(UtcOffset::UTC).format(UTC_ISO).ok()
}

/// Wall-clock input value for an instant.
pub fn to_local_input(dt: OffsetDateTime, zone: impl Into<LocalZone>) -> Option<String> {
    let zone = zone.into();
    dt.to_offset(zone.offset_at(dt)).format(LOCAL_HMS).ok()
}

/// Normalize any accepted date-time input to a UTC ISO string.
pub fn normalize_datetime(s: &str, zone: impl Into<LocalZone>) -> Option<String> {
    parse_instant(s, zone).and_then(to_utc_iso)
}
