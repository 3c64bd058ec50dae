// ── Clocks ──
//
// The overlay asks a clock for "today" so tests can pin the date and
// timezone. Day bounds are computed in the clock's local timezone and
// returned as UTC instants.

use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveTime, TimeDelta, TimeZone, Utc};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// First and last millisecond of the current local day.
    fn today(&self) -> (DateTime<Utc>, DateTime<Utc>);
}

/// Wall clock in the host's local timezone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn today(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        day_bounds_in(&Local::now())
    }
}

/// A clock frozen at one instant in a fixed-offset timezone.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    now: DateTime<FixedOffset>,
}

impl FixedClock {
    pub fn new(now: DateTime<FixedOffset>) -> Self {
        Self { now }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.with_timezone(&Utc)
    }

    fn today(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        day_bounds_in(&self.now)
    }
}

/// `[startOfDay, endOfDay]` for the local date of `now`.
pub fn day_bounds_in<Tz: TimeZone>(now: &DateTime<Tz>) -> (DateTime<Utc>, DateTime<Utc>) {
    let tz = now.timezone();
    let date = now.date_naive();
    let start = local_midnight(&tz, date);
    let next = date
        .succ_opt()
        .map_or_else(|| start + TimeDelta::days(1), |d| local_midnight(&tz, d));
    (start, next - TimeDelta::milliseconds(1))
}

/// Midnight at the start of `date` in `tz`. When midnight does not exist
/// (DST gap) the UTC midnight of that date is used instead.
fn local_midnight<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> DateTime<Utc> {
    let naive = date.and_time(NaiveTime::MIN);
    tz.from_local_datetime(&naive)
        .earliest()
        .map_or_else(|| naive.and_utc(), |dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn bounds_follow_local_day() {
        // 01:30 on 2 May in UTC+02:00 is still 1 May 23:30 UTC.
        let tz = FixedOffset::east_opt(2 * 3600).unwrap();
        let clock = FixedClock::new(tz.with_ymd_and_hms(2024, 5, 2, 1, 30, 0).unwrap());

        let (from, to) = clock.today();
        assert_eq!(from, Utc.with_ymd_and_hms(2024, 5, 1, 22, 0, 0).unwrap());
        assert_eq!(
            to,
            Utc.with_ymd_and_hms(2024, 5, 2, 21, 59, 59).unwrap() + TimeDelta::milliseconds(999)
        );
    }

    #[test]
    fn utc_day() {
        let now = Utc.with_ymd_and_hms(2024, 2, 29, 13, 0, 0).unwrap();
        let (from, to) = day_bounds_in(&now);
        assert_eq!(from.to_rfc3339(), "2024-02-29T00:00:00+00:00");
        assert_eq!(to.to_rfc3339(), "2024-02-29T23:59:59.999+00:00");
    }
}
