use anyhow::{anyhow, Result};
use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, Offset, TimeZone, Utc};

use crate::storage::UserProfile;

const DIGEST_TIME_FORMAT: &str = "%H:%M";

/// Parses a 24h `HH:MM` delivery time
pub fn parse_digest_time(input: &str) -> Result<NaiveTime> {
    let input = input.trim();
    if input.is_empty() {
        return Err(anyhow!("Time cannot be empty"));
    }
    NaiveTime::parse_from_str(input, DIGEST_TIME_FORMAT)
        .map_err(|_| anyhow!("Invalid time '{}'. Use HH:MM, for example 09:30", input))
}

pub fn format_digest_time(time: NaiveTime) -> String {
    time.format(DIGEST_TIME_FORMAT).to_string()
}

/// Parses `+03:00`, `-05:30`, `Z` or `UTC`
pub fn parse_utc_offset(input: &str) -> Result<FixedOffset> {
    let input = input.trim();
    if input.eq_ignore_ascii_case("z") || input.eq_ignore_ascii_case("utc") {
        return Ok(Utc.fix());
    }
    input
        .parse::<FixedOffset>()
        .map_err(|_| anyhow!("Invalid UTC offset '{}'. Use a value like +03:00", input))
}

pub fn format_datetime(dt: &DateTime<Utc>, offset: FixedOffset) -> String {
    dt.with_timezone(&offset).format("%d.%m.%Y %H:%M").to_string()
}

/// The UTC instant of `time` on the local `date`
pub fn scheduled_instant(date: NaiveDate, time: NaiveTime, offset: FixedOffset) -> Option<DateTime<Utc>> {
    offset
        .from_local_datetime(&date.and_time(time))
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Returns the scheduled occurrence a digest is currently due for, if any.
///
/// An occurrence `s` is due when `s <= now < s + window` and nothing was sent
/// for it yet, i.e. `last_sent < s`. A delivery only ever counts for the
/// occurrence it served, so a late one never blocks the following day.
pub fn due_occurrence(
    profile: &UserProfile,
    now: DateTime<Utc>,
    offset: FixedOffset,
    window: Duration,
) -> Option<DateTime<Utc>> {
    let time = profile.digest_time?;
    let today = now.with_timezone(&offset).date_naive();

    // Yesterday covers windows that straddle local midnight
    for date in [Some(today), today.pred_opt()].into_iter().flatten() {
        if !profile.frequency.runs_on(date.weekday()) {
            continue;
        }
        let Some(scheduled) = scheduled_instant(date, time, offset) else {
            continue;
        };
        if scheduled > now || now >= scheduled + window {
            continue;
        }
        if profile.last_sent.is_some_and(|sent| sent >= scheduled) {
            continue;
        }
        return Some(scheduled);
    }
    None
}

/// The next scheduled delivery strictly after `now`
pub fn next_delivery(profile: &UserProfile, now: DateTime<Utc>, offset: FixedOffset) -> Option<DateTime<Utc>> {
    let time = profile.digest_time?;
    let mut date = now.with_timezone(&offset).date_naive();

    for _ in 0..=7 {
        if profile.frequency.runs_on(date.weekday()) {
            if let Some(scheduled) = scheduled_instant(date, time, offset) {
                if scheduled > now {
                    return Some(scheduled);
                }
            }
        }
        date = date.succ_opt()?;
    }
    None
}
