use std::fmt::Display;

use chrono::{DateTime, TimeZone};

/// Formats a date as required by RSS 2.0 (RFC 822 with four-digit year).
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use scrapy_rss::utils::format_rfc822;
///
/// let date = Utc.with_ymd_and_hms(2000, 1, 1, 0, 50, 15).unwrap();
/// assert_eq!(format_rfc822(&date), "Sat, 01 Jan 2000 00:50:15 +0000");
/// ```
pub fn format_rfc822<Tz: TimeZone>(date: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    date.format("%a, %d %b %Y %H:%M:%S %z").to_string()
}
