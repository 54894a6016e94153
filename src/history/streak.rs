/* src/history/streak.rs */

use super::record::SavedFit;
use chrono::{NaiveDate, TimeZone};
use std::collections::BTreeSet;

/// Consecutive calendar days in `tz` with at least one saved fit.
///
/// Counting starts from the newest active day, which must be `today` or the
/// day before; otherwise the streak is broken and this returns 0.
pub fn current_streak<Tz: TimeZone>(fits: &[SavedFit], today: NaiveDate, tz: &Tz) -> u32 {
    let days: BTreeSet<NaiveDate> = fits
        .iter()
        .filter_map(SavedFit::timestamp)
        .map(|ts| ts.with_timezone(tz).date_naive())
        .collect();

    let mut newest_first = days.into_iter().rev();
    let Some(last_active) = newest_first.next() else {
        return 0;
    };
    if last_active != today && Some(last_active) != today.pred_opt() {
        return 0;
    }

    let mut streak = 1;
    let mut previous = last_active;
    for day in newest_first {
        if previous.pred_opt() != Some(day) {
            break;
        }
        streak += 1;
        previous = day;
    }
    streak
}
