use crate::models::MonthId;
use chrono::{Datelike, NaiveDate};
use std::ops::RangeInclusive;

pub const WEEKDAY_LABELS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// Layout of one month: how many days it has and which column (Sunday = 0) day 1 lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthGrid {
    month: MonthId,
    days_in_month: u32,
    first_weekday: u32,
}

impl MonthGrid {
    pub fn new(month: MonthId) -> Self {
        let first = NaiveDate::from_ymd_opt(month.year(), month.month(), 1);
        let next = if month.month() == 12 {
            NaiveDate::from_ymd_opt(month.year() + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(month.year(), month.month() + 1, 1)
        };

        let (days_in_month, first_weekday) = match (first, next) {
            (Some(first), Some(next)) => (
                (next - first).num_days() as u32,
                first.weekday().num_days_from_sunday(),
            ),
            _ => (0, 0),
        };

        Self {
            month,
            days_in_month,
            first_weekday,
        }
    }

    pub fn month(&self) -> MonthId {
        self.month
    }

    pub fn days_in_month(&self) -> u32 {
        self.days_in_month
    }

    pub fn first_weekday(&self) -> u32 {
        self.first_weekday
    }

    pub fn days(&self) -> RangeInclusive<u32> {
        1..=self.days_in_month
    }

    pub fn contains(&self, day: u32) -> bool {
        self.days().contains(&day)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(raw: &str) -> MonthGrid {
        MonthGrid::new(raw.parse().unwrap())
    }

    #[test]
    fn days_in_month_follow_gregorian_rules() {
        assert_eq!(grid("2024-02").days_in_month(), 29);
        assert_eq!(grid("2023-02").days_in_month(), 28);
        assert_eq!(grid("1900-02").days_in_month(), 28);
        assert_eq!(grid("2000-02").days_in_month(), 29);
        assert_eq!(grid("2024-04").days_in_month(), 30);
        assert_eq!(grid("2024-12").days_in_month(), 31);
    }

    #[test]
    fn first_weekday_counts_from_sunday() {
        // 2024-09-01 was a Sunday, 2024-02-01 a Thursday, 2025-03-01 a Saturday.
        assert_eq!(grid("2024-09").first_weekday(), 0);
        assert_eq!(grid("2024-02").first_weekday(), 4);
        assert_eq!(grid("2025-03").first_weekday(), 6);
    }

    #[test]
    fn day_range_matches_month() {
        let february = grid("2023-02");
        assert_eq!(february.days().count(), 28);
        assert!(february.contains(1));
        assert!(february.contains(28));
        assert!(!february.contains(0));
        assert!(!february.contains(29));
    }
}
