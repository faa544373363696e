//! Business-hours gate for the refresh loop.

use chrono::{DateTime, Datelike, Timelike, Utc, Weekday};
use chrono_tz::America::Sao_Paulo;
use chrono_tz::Tz;

/// The dashboard runs on the trading desk's wall clock.
pub const BUSINESS_TZ: Tz = Sao_Paulo;

/// Current instant on the business clock.
pub fn now() -> DateTime<Tz> {
    Utc::now().with_timezone(&BUSINESS_TZ)
}

/// Whether a refresh is permitted at `now`. Open windows are
/// [08:00, 12:30) and [13:30, 18:00), Monday through Friday.
pub fn is_open(now: DateTime<Tz>) -> bool {
    if matches!(now.weekday(), Weekday::Sat | Weekday::Sun) {
        return false;
    }

    let minute_of_day = now.hour() * 60 + now.minute();
    let morning = 8 * 60..12 * 60 + 30;
    let afternoon = 13 * 60 + 30..18 * 60;
    morning.contains(&minute_of_day) || afternoon.contains(&minute_of_day)
}
