//! Timestamp formatting for file and directory names.

use chrono::{DateTime, TimeZone};

/// `strftime` pattern for timestamps embedded in names (no `:` allowed).
pub const FILENAME_DATETIME_FORMAT: &str = "%Y-%m-%d--%H-%M-%S";

/// Formats a timestamp as an ISO-ish string usable in file names.
///
/// `2018-01-01T12:01:01` becomes `2018-01-01--12-01-01`.
#[must_use]
pub fn iso_datetime_for_filename<Tz>(datetime: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    datetime.format(FILENAME_DATETIME_FORMAT).to_string()
}
