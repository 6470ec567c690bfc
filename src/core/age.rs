use chrono::{Local, NaiveDate, NaiveDateTime};

/// Whole calendar days between `birth` and `today`, clamped at zero for
/// birth dates in the future.
pub fn age_in_days(birth: NaiveDate, today: NaiveDate) -> u32 {
    let days = today.signed_duration_since(birth).num_days().max(0);
    u32::try_from(days).unwrap_or(u32::MAX)
}

/// Same as [`age_in_days`] but for timestamps; the time of day is dropped
/// before subtracting, so 23:59 on day 1 to 00:01 on day 2 is one day.
pub fn age_from_datetime(birth: NaiveDateTime, now: NaiveDateTime) -> u32 {
    age_in_days(birth.date(), now.date())
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_age_in_days() {
        assert_eq!(age_in_days(date(2026, 1, 1), date(2026, 1, 1)), 0);
        assert_eq!(age_in_days(date(2026, 1, 1), date(2026, 1, 26)), 25);
        assert_eq!(age_in_days(date(2025, 12, 31), date(2026, 3, 1)), 60);
    }

    #[test]
    fn test_future_birth_date_clamps_to_zero() {
        assert_eq!(age_in_days(date(2026, 5, 10), date(2026, 5, 1)), 0);
    }

    #[test]
    fn test_time_of_day_is_ignored() {
        let birth = date(2026, 4, 1).and_hms_opt(23, 59, 0).unwrap();
        let now = date(2026, 4, 2).and_hms_opt(0, 1, 0).unwrap();
        assert_eq!(age_from_datetime(birth, now), 1);

        let later_same_day = date(2026, 4, 1).and_hms_opt(23, 59, 59).unwrap();
        let early = date(2026, 4, 1).and_hms_opt(0, 0, 0).unwrap();
        assert_eq!(age_from_datetime(early, later_same_day), 0);
    }

    #[test]
    fn test_age_is_monotonic() {
        let birth = date(2026, 1, 15);
        let mut previous = 0;
        for offset in 0..400 {
            let today = birth + chrono::Days::new(offset);
            let age = age_in_days(birth, today);
            assert!(age >= previous);
            assert_eq!(age, age_in_days(birth, today));
            previous = age;
        }
    }
}
