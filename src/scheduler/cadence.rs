use chrono::{
    DateTime, Datelike, FixedOffset, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc, Weekday,
};

/// 営業日（月〜金）の固定時刻に発火する日次ケイデンス。
#[derive(Debug, Clone)]
pub(crate) struct DailyCadence {
    tz: FixedOffset,
    target: NaiveTime,
}

impl DailyCadence {
    pub(crate) fn new(tz: FixedOffset, hour: u32, minute: u32) -> Self {
        let target = NaiveTime::from_hms_opt(hour, minute, 0)
            .unwrap_or_else(|| panic!("invalid time: {hour:02}:{minute:02}"));
        Self { tz, target }
    }

    pub(crate) fn next_run_from(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let localized_now = now.with_timezone(&self.tz);
        let mut date = localized_now.date_naive();
        if localized_now.time() > self.target {
            date = advance_day(date);
        }
        while is_weekend(date) {
            date = advance_day(date);
        }

        let local_target = date.and_time(self.target);

        match self.tz.from_local_datetime(&local_target) {
            LocalResult::Single(dt) => dt.with_timezone(&Utc),
            LocalResult::Ambiguous(first, _) => first.with_timezone(&Utc),
            LocalResult::None => unreachable!("fixed offset should not produce nonexistent times"),
        }
    }
}

fn advance_day(date: NaiveDate) -> NaiveDate {
    date.succ_opt()
        .expect("date should remain representable when advancing")
}

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

#[cfg(test)]
mod tests {
    use super::DailyCadence;
    use chrono::{DateTime, FixedOffset, Utc};

    fn parse_utc(ts: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(ts)
            .expect("valid datetime")
            .with_timezone(&Utc)
    }

    fn brt() -> FixedOffset {
        FixedOffset::east_opt(-3 * 3600).expect("brt offset")
    }

    #[test]
    fn next_run_same_day_when_before_trigger() {
        let cadence = DailyCadence::new(brt(), 8, 0);
        let now = parse_utc("2025-03-10T09:30:00Z"); // Monday 06:30 BRT
        let expected = parse_utc("2025-03-10T11:00:00Z"); // Monday 08:00 BRT
        assert_eq!(cadence.next_run_from(now), expected);
    }

    #[test]
    fn next_run_next_day_when_past_trigger() {
        let cadence = DailyCadence::new(brt(), 8, 0);
        let now = parse_utc("2025-03-10T15:00:00Z"); // Monday 12:00 BRT
        let expected = parse_utc("2025-03-11T11:00:00Z"); // Tuesday 08:00 BRT
        assert_eq!(cadence.next_run_from(now), expected);
    }

    #[test]
    fn next_run_immediate_when_exact_trigger() {
        let cadence = DailyCadence::new(brt(), 8, 0);
        let now = parse_utc("2025-03-10T11:00:00Z"); // Monday exactly 08:00 BRT
        assert_eq!(cadence.next_run_from(now), now);
    }

    #[test]
    fn friday_evening_rolls_to_monday() {
        let cadence = DailyCadence::new(brt(), 8, 0);
        let now = parse_utc("2025-03-14T20:00:00Z"); // Friday 17:00 BRT
        let expected = parse_utc("2025-03-17T11:00:00Z"); // Monday 08:00 BRT
        assert_eq!(cadence.next_run_from(now), expected);
    }

    #[test]
    fn saturday_skips_to_monday() {
        let cadence = DailyCadence::new(brt(), 8, 0);
        let now = parse_utc("2025-03-15T12:00:00Z"); // Saturday 09:00 BRT
        let expected = parse_utc("2025-03-17T11:00:00Z"); // Monday 08:00 BRT
        assert_eq!(cadence.next_run_from(now), expected);
    }
}
