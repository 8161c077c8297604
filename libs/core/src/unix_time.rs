use thiserror::Error;
use time::{
    OffsetDateTime, UtcOffset, format_description::BorrowedFormatItem, macros::format_description,
};

const DISPLAY_FORMAT: &[BorrowedFormatItem<'static>] = format_description!(
    "[day]-[month]-[year] [hour]:[minute]:[second] [offset_hour sign:mandatory]:[offset_minute]"
);
const OFFSET_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[offset_hour sign:mandatory]:[offset_minute]");

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UnixTimeError {
    #[error("invalid unix time: {0}")]
    InvalidTimestamp(i64),
    #[error("invalid utc offset `{0}`, expected +HH:MM")]
    InvalidOffset(String),
}

/// Renders a gateway timestamp as `dd-MM-yyyy HH:mm:ss ±HH:MM` in `offset`.
///
/// ```
/// use payhook_core::format_unix;
/// use time::UtcOffset;
///
/// assert_eq!(
///     format_unix(1_700_000_000, UtcOffset::UTC).unwrap(),
///     "14-11-2023 22:13:20 +00:00"
/// );
/// ```
pub fn format_unix(seconds: i64, offset: UtcOffset) -> Result<String, UnixTimeError> {
    if seconds < 0 {
        return Err(UnixTimeError::InvalidTimestamp(seconds));
    }
    OffsetDateTime::from_unix_timestamp(seconds)
        .ok()
        .and_then(|at| at.checked_to_offset(offset))
        .and_then(|at| at.format(DISPLAY_FORMAT).ok())
        .ok_or(UnixTimeError::InvalidTimestamp(seconds))
}

/// Parses a display offset such as `+02:00`; `UTC` and `Z` are accepted for zero.
pub fn parse_utc_offset(raw: &str) -> Result<UtcOffset, UnixTimeError> {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("utc") || trimmed.eq_ignore_ascii_case("z") {
        return Ok(UtcOffset::UTC);
    }
    UtcOffset::parse(trimmed, OFFSET_FORMAT)
        .map_err(|_| UnixTimeError::InvalidOffset(trimmed.to_string()))
}
