//! Cell-tower timestamp parsing.
//!
//! The modem reports network time as `YY/MM/DD,HH:MM:SS±Q` (optionally
//! wrapped as `+CCLK: "…"`), where `Q` is the offset from UTC in quarter
//! hours.  TLS certificate checks need an absolute instant, so the parsed
//! fields are resolved to UTC and split into the `(days, seconds)` pair the
//! secured channels consume.
//!
//! Parsing is strictly positional.  This is not a general date parser.

use core::fmt;

use time::{Date, Month, Time};

use crate::error::TimeSyncError;

/// Days from 0000-01-01 to 1970-01-01 in the proleptic Gregorian calendar.
pub const UNIX_EPOCH_DAYS_FROM_YEAR_ZERO: u32 = 719_528;

/// Julian day number of 1970-01-01.
const UNIX_EPOCH_JULIAN_DAY: i64 = 2_440_588;

const SECONDS_PER_DAY: i64 = 86_400;

/// Seconds per timezone unit (one quarter hour).
const SECONDS_PER_QUARTER: i64 = 900;

/// Largest plausible offset: ±24 h.
const MAX_TZ_QUARTERS: i8 = 96;

/// Certificate verification anchor handed to each secured channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VerificationTime {
    /// Days since 0000-01-01.
    pub epoch_days: u32,
    pub seconds_of_day: u32,
}

impl VerificationTime {
    /// Seconds since the Unix epoch, for logging.
    pub fn unix_seconds(&self) -> i64 {
        (i64::from(self.epoch_days) - i64::from(UNIX_EPOCH_DAYS_FROM_YEAR_ZERO)) * SECONDS_PER_DAY
            + i64::from(self.seconds_of_day)
    }
}

impl fmt::Display for VerificationTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.seconds_of_day;
        write!(
            f,
            "day {} {:02}:{:02}:{:02}Z",
            self.epoch_days,
            s / 3600,
            (s / 60) % 60,
            s % 60
        )
    }
}

/// Positional fields of one modem timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GsmTimestamp {
    pub raw: heapless::String<32>,
    /// Year field exactly as reported (two or four digits).
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    /// Signed offset from UTC in quarter hours.
    pub tz_quarters: i8,
}

impl GsmTimestamp {
    /// Split `YY/MM/DD,HH:MM:SS±Q` into its fields.
    pub fn parse(input: &str) -> Result<Self, TimeSyncError> {
        let body = strip_envelope(input);
        if body.is_empty() {
            return Err(TimeSyncError::NoTimestamp);
        }

        let (date, rest) = body
            .split_once(',')
            .ok_or(TimeSyncError::Malformed("date/time separator"))?;

        // The offset sign is the first '+' or '-' after the comma.  Some
        // firmware omits the offset entirely; that reads as UTC.
        let (clock, tz) = match rest.find(['+', '-']) {
            Some(sign_at) => rest.split_at(sign_at),
            None => (rest, ""),
        };

        let mut d = date.split('/');
        let year = field::<u16>(d.next(), "year")?;
        let month = field::<u8>(d.next(), "month")?;
        let day = field::<u8>(d.next(), "day")?;
        if d.next().is_some() {
            return Err(TimeSyncError::Malformed("date"));
        }

        let mut t = clock.split(':');
        let hour = field::<u8>(t.next(), "hour")?;
        let minute = field::<u8>(t.next(), "minute")?;
        let second = field::<u8>(t.next(), "second")?;
        if t.next().is_some() {
            return Err(TimeSyncError::Malformed("time"));
        }

        let tz_quarters = if tz.is_empty() {
            0
        } else {
            let magnitude = field::<u8>(Some(&tz[1..]), "timezone")?;
            let magnitude = i8::try_from(magnitude)
                .ok()
                .filter(|q| *q <= MAX_TZ_QUARTERS)
                .ok_or(TimeSyncError::Malformed("timezone"))?;
            if tz.starts_with('-') { -magnitude } else { magnitude }
        };

        let mut raw = heapless::String::new();
        raw.push_str(body)
            .map_err(|()| TimeSyncError::Malformed("length"))?;

        Ok(Self {
            raw,
            year,
            month,
            day,
            hour,
            minute,
            second,
            tz_quarters,
        })
    }

    /// Resolve to UTC and decompose into a [`VerificationTime`].
    pub fn to_verification_time(&self) -> Result<VerificationTime, TimeSyncError> {
        let years_since_1970 = normalize_year(self.year)?;

        let month = Month::try_from(self.month).map_err(|_| TimeSyncError::InvalidDate)?;
        let date = Date::from_calendar_date(1970 + i32::from(years_since_1970), month, self.day)
            .map_err(|_| TimeSyncError::InvalidDate)?;
        let clock = Time::from_hms(self.hour, self.minute, self.second)
            .map_err(|_| TimeSyncError::InvalidDate)?;

        let unix_days = i64::from(date.to_julian_day()) - UNIX_EPOCH_JULIAN_DAY;
        let (h, m, s) = clock.as_hms();
        let local = unix_days * SECONDS_PER_DAY
            + i64::from(h) * 3600
            + i64::from(m) * 60
            + i64::from(s);
        let utc = local - i64::from(self.tz_quarters) * SECONDS_PER_QUARTER;

        let days = utc.div_euclid(SECONDS_PER_DAY) + i64::from(UNIX_EPOCH_DAYS_FROM_YEAR_ZERO);
        let epoch_days = u32::try_from(days).map_err(|_| TimeSyncError::InvalidDate)?;

        Ok(VerificationTime {
            epoch_days,
            seconds_of_day: utc.rem_euclid(SECONDS_PER_DAY) as u32,
        })
    }
}

/// Parse a raw modem timestamp straight into a [`VerificationTime`].
pub fn parse_verification_time(input: &str) -> Result<VerificationTime, TimeSyncError> {
    GsmTimestamp::parse(input)?.to_verification_time()
}

/// Map the reported year onto years since 1970.
///
/// | reported      | result                                  |
/// |---------------|-----------------------------------------|
/// | `> 2100`      | rejected                                |
/// | `< 23`        | rejected                                |
/// | `55..75`      | rejected (modem clock still at its 1970 default) |
/// | `>= 2023`     | four-digit year, minus 1970             |
/// | `>= 53`       | already relative to 1970                |
/// | `23..=52`     | two-digit year relative to 2000, plus 30 |
///
/// The last row is the residual case.  It is matched explicitly so that a
/// future change to the rows above cannot widen it by accident.
pub fn normalize_year(year: u16) -> Result<u16, TimeSyncError> {
    match year {
        y if y > 2100 || y < 23 => Err(TimeSyncError::ImplausibleYear(y)),
        55..75 => Err(TimeSyncError::ImplausibleYear(year)),
        2023.. => Ok(year - 1970),
        53.. => Ok(year),
        23..=52 => Ok(year + 30),
        _ => Err(TimeSyncError::ImplausibleYear(year)),
    }
}

/// Drop an optional `+CCLK: "` prefix, surrounding quotes and whitespace.
fn strip_envelope(input: &str) -> &str {
    let s = input.trim();
    let s = s.strip_prefix("+CCLK:").map_or(s, str::trim_start);
    s.trim_matches('"').trim()
}

fn field<T: core::str::FromStr>(raw: Option<&str>, name: &'static str) -> Result<T, TimeSyncError> {
    let raw = raw.ok_or(TimeSyncError::Malformed(name))?;
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(TimeSyncError::Malformed(name));
    }
    raw.parse().map_err(|_| TimeSyncError::Malformed(name))
}
