//! Tests for the business clock and date ranges

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use core_kernel::{Clock, DateRange, FixedClock, SystemClock, TemporalError, Timezone};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

mod timezone {
    use super::*;

    #[test]
    fn test_default_is_utc() {
        assert_eq!(Timezone::default().name(), "UTC");
    }

    #[test]
    fn test_serde_round_trip_by_name() {
        let tz: Timezone = serde_json::from_str("\"Asia/Baghdad\"").unwrap();
        assert_eq!(serde_json::to_string(&tz).unwrap(), "\"Asia/Baghdad\"");
    }

    #[test]
    fn test_serde_rejects_unknown_name() {
        assert!(serde_json::from_str::<Timezone>("\"Atlantis/Capital\"").is_err());
    }

    #[test]
    fn test_date_before_midnight_in_utc_is_next_day_locally() {
        let tz: Timezone = "Asia/Baghdad".parse().unwrap();
        let instant = Utc.with_ymd_and_hms(2025, 6, 13, 21, 30, 0).unwrap();
        assert_eq!(tz.date_of(instant), date(2025, 6, 14));
    }
}

mod date_range {
    use super::*;

    #[test]
    fn test_single_day() {
        let range = DateRange::single_day(date(2025, 6, 14));
        assert_eq!(range.days(), 1);
        assert!(range.contains(date(2025, 6, 14)));
        assert!(!range.contains(date(2025, 6, 15)));
    }

    #[test]
    fn test_reversed_range_is_rejected() {
        let err = DateRange::new(date(2025, 6, 15), date(2025, 6, 14)).unwrap_err();
        assert_eq!(
            err,
            TemporalError::InvalidRange {
                start: date(2025, 6, 15),
                end: date(2025, 6, 14),
            }
        );
    }
}

mod clocks {
    use super::*;

    #[test]
    fn test_fixed_clock_can_be_moved() {
        let clock = FixedClock::on_date(date(2025, 6, 14));
        clock.set_date(date(2025, 6, 20));
        assert_eq!(clock.today(), date(2025, 6, 20));
        clock.advance(Duration::days(-6));
        assert_eq!(clock.today(), date(2025, 6, 14));
    }

    #[test]
    fn test_fixed_clock_honours_timezone() {
        let tz: Timezone = "Asia/Baghdad".parse().unwrap();
        let clock = FixedClock::at(Utc.with_ymd_and_hms(2025, 6, 14, 22, 0, 0).unwrap(), tz);
        assert_eq!(clock.today(), date(2025, 6, 15));
    }

    #[test]
    fn test_system_clock_reports_timezone() {
        let tz: Timezone = "Asia/Amman".parse().unwrap();
        let clock = SystemClock::new(tz);
        assert_eq!(clock.timezone(), tz);
        assert_eq!(clock.today(), tz.date_of(clock.now()));
    }
}
