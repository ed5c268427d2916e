//! UTC timestamps and how they are stored, serialized and parsed.

use std::fmt::Display;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::{
    Date, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset,
    format_description::BorrowedFormatItem,
    format_description::well_known::Rfc3339, macros::format_description,
};

/// Fixed width, so that comparing the stored text compares the instants.
const STORAGE_FORMAT: &[BorrowedFormatItem<'_>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:6]Z");

const DISPLAY_FORMAT: &[BorrowedFormatItem<'_>] =
    format_description!("[day].[month].[year] [hour]:[minute]");

const DATE_FORMAT: &[BorrowedFormatItem<'_>] = format_description!("[year]-[month]-[day]");

const NAIVE_INPUT_FORMATS: [&[BorrowedFormatItem<'_>]; 4] = [
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
    format_description!("[year]-[month]-[day]T[hour]:[minute]"),
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
    format_description!("[year]-[month]-[day] [hour]:[minute]"),
];

const MIN_YEAR: i32 = 0;
const MAX_YEAR: i32 = 9999;

/// The message used when a client sends a date-time we cannot read.
pub const INVALID_DATETIME_MESSAGE: &str = "Datetime has wrong format. Use one of these formats \
    instead: YYYY-MM-DDThh:mm[:ss[.uuuuuu]][+HH:MM|-HH:MM|Z].";

/// A point in time in UTC with microsecond precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(OffsetDateTime);

impl Timestamp {
    /// The current time.
    pub fn now() -> Self {
        let now = OffsetDateTime::now_utc();

        Self(now.replace_microsecond(now.microsecond()).unwrap_or(now))
    }

    /// Convert `datetime` to UTC, dropping anything finer than a microsecond.
    ///
    /// Returns `None` if the instant falls outside the years 0 to 9999 in UTC,
    /// which cannot be stored or serialized.
    pub fn from_datetime(datetime: OffsetDateTime) -> Option<Self> {
        let datetime = datetime.checked_to_offset(UtcOffset::UTC)?;

        if !(MIN_YEAR..=MAX_YEAR).contains(&datetime.year()) {
            return None;
        }

        let truncated = datetime
            .replace_microsecond(datetime.microsecond())
            .unwrap_or(datetime);

        Some(Self(truncated))
    }

    /// Parse a date-time sent by a client.
    ///
    /// Accepts RFC 3339, `YYYY-MM-DDThh:mm[:ss]` (with a 'T' or a space) and a
    /// bare `YYYY-MM-DD`. Values without an offset are taken to be UTC.
    /// Instants outside the years 0 to 9999 in UTC are rejected.
    pub fn parse_input(text: &str) -> Option<Self> {
        let text = text.trim();

        if let Ok(datetime) = OffsetDateTime::parse(text, &Rfc3339) {
            return Self::from_datetime(datetime);
        }

        NAIVE_INPUT_FORMATS
            .iter()
            .find_map(|format| PrimitiveDateTime::parse(text, format).ok())
            .or_else(|| {
                parse_date(text)
                    .ok()
                    .map(|date| PrimitiveDateTime::new(date, Time::MIDNIGHT))
            })
            .and_then(|datetime| Self::from_datetime(datetime.assume_utc()))
    }

    /// Format as `DD.MM.YYYY HH:MM`.
    pub fn format_display(&self) -> String {
        self.0
            .format(DISPLAY_FORMAT)
            .unwrap_or_else(|_| self.to_string())
    }
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = self.0.format(&Rfc3339).map_err(|_| std::fmt::Error)?;

        write!(f, "{text}")
    }
}

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(text: &str) -> Result<Date, time::error::Parse> {
    Date::parse(text.trim(), DATE_FORMAT)
}

/// Format `date` as `YYYY-MM-DD`, the prefix of the stored timestamp text.
pub fn format_date(date: Date) -> String {
    date.format(DATE_FORMAT)
        .unwrap_or_else(|_| date.to_string())
}

impl ToSql for Timestamp {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let text = self
            .0
            .format(STORAGE_FORMAT)
            .map_err(|error| rusqlite::Error::ToSqlConversionFailure(Box::new(error)))?;

        Ok(ToSqlOutput::from(text))
    }
}

impl FromSql for Timestamp {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = value.as_str()?;

        PrimitiveDateTime::parse(text, STORAGE_FORMAT)
            .map(|datetime| Self(datetime.assume_utc()))
            .map_err(|error| FromSqlError::Other(Box::new(error)))
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let text = self.0.format(&Rfc3339).map_err(serde::ser::Error::custom)?;

        serializer.serialize_str(&text)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;

        Timestamp::parse_input(&text).ok_or_else(|| serde::de::Error::custom(INVALID_DATETIME_MESSAGE))
    }
}
