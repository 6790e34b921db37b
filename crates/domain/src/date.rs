use chrono::prelude::*;

/// Full english name of the UTC weekday that `ts_millis` falls on.
/// The same names that `DAYNAME`-style SQL functions produce, so stored
/// weekday values and derived ones can be compared directly.
pub fn weekday_name(ts_millis: i64) -> &'static str {
    match Utc.timestamp_millis(ts_millis).weekday() {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// UTC minute index within the day (0..=1439) for `ts_millis`.
pub fn minute_of_day(ts_millis: i64) -> i64 {
    ts_millis.div_euclid(1000 * 60).rem_euclid(60 * 24)
}
