//! Wall-clock helpers.

/// Seconds in a quest day.
pub const DAY_SECS: i64 = 24 * 60 * 60;

/// Current Unix time in seconds.
pub fn now_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Calendar day number of `unix_secs` in a zone `utc_offset_hours` from UTC.
pub fn quest_day(unix_secs: u64, utc_offset_hours: i64) -> i64 {
    let secs = i64::try_from(unix_secs).unwrap_or(i64::MAX);
    secs.saturating_add(utc_offset_hours * 3600).div_euclid(DAY_SECS)
}
