//! Age derivation from date of birth.
//!
//! A patient's `age` field is derived, never independently authoritative: it
//! is recomputed from `dateOfBirth` on every save and once per day by the
//! scheduled job for patients whose birthday is today. Both paths use
//! [`age_on`], so the stored value can only ever disagree with the calendar
//! between a birthday passing and the next write or scheduled run.

use chrono::{Datelike, NaiveDate};

/// Whole years between `date_of_birth` and `today`, calendar-aware.
///
/// `age = today.year - dob.year`, minus one if today's month/day precedes the
/// birth month/day. The age therefore increments on the birthday itself, not
/// before.
pub fn age_on(date_of_birth: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - date_of_birth.year();
    if (today.month(), today.day()) < (date_of_birth.month(), date_of_birth.day()) {
        age -= 1;
    }
    age
}

/// True when `date_of_birth` has today's month and day (any birth year).
///
/// This is the match condition of the daily age-refresh batch.
pub fn birthday_matches(date_of_birth: NaiveDate, today: NaiveDate) -> bool {
    date_of_birth.month() == today.month() && date_of_birth.day() == today.day()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn age_increments_on_the_birthday_not_before() {
        let dob = date(2000, 3, 10);
        assert_eq!(age_on(dob, date(2026, 3, 9)), 25);
        assert_eq!(age_on(dob, date(2026, 3, 10)), 26);
        assert_eq!(age_on(dob, date(2026, 3, 11)), 26);
    }

    #[test]
    fn earlier_month_means_birthday_not_yet_reached() {
        let dob = date(1990, 7, 1);
        assert_eq!(age_on(dob, date(2026, 6, 30)), 35);
        assert_eq!(age_on(dob, date(2026, 7, 1)), 36);
        assert_eq!(age_on(dob, date(2026, 12, 31)), 36);
    }

    #[test]
    fn same_month_compares_days() {
        let dob = date(1985, 11, 15);
        assert_eq!(age_on(dob, date(2026, 11, 14)), 40);
        assert_eq!(age_on(dob, date(2026, 11, 15)), 41);
        assert_eq!(age_on(dob, date(2026, 11, 16)), 41);
    }

    #[test]
    fn age_zero_for_infants() {
        let dob = date(2026, 1, 20);
        assert_eq!(age_on(dob, date(2026, 1, 20)), 0);
        assert_eq!(age_on(dob, date(2026, 6, 1)), 0);
    }

    #[test]
    fn birthday_matches_on_month_and_day_any_year() {
        let dob = date(1960, 3, 10);
        assert!(birthday_matches(dob, date(2026, 3, 10)));
        assert!(!birthday_matches(dob, date(2026, 3, 11)));
        assert!(!birthday_matches(dob, date(2026, 4, 10)));
    }

    #[test]
    fn leap_day_birthday_only_matches_in_leap_years() {
        // A Feb 29 birthday matches only when Feb 29 exists; in common years
        // the daily batch never selects these patients, and their age catches
        // up on the next write.
        let dob = date(2000, 2, 29);
        assert!(birthday_matches(dob, date(2024, 2, 29)));
        assert!(!birthday_matches(dob, date(2026, 2, 28)));
        assert!(!birthday_matches(dob, date(2026, 3, 1)));
    }
}
