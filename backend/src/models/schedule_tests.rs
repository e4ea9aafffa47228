#[cfg(test)]
mod tests {
    use crate::models::{Schedule, ScheduleError, TimeOfDay, Weekday};
    use proptest::prelude::*;

    fn sched(days: &[&str], start: &str, end: &str) -> Schedule {
        Schedule::parse(days.iter().copied(), start, end).unwrap()
    }

    #[test]
    fn test_weekday_parsing_accepts_abbreviations() {
        assert_eq!("Mon".parse::<Weekday>().unwrap(), Weekday::Monday);
        assert_eq!("wednesday".parse::<Weekday>().unwrap(), Weekday::Wednesday);
        assert_eq!(" FRI ".parse::<Weekday>().unwrap(), Weekday::Friday);
        assert!(matches!(
            "Saturday".parse::<Weekday>(),
            Err(ScheduleError::UnknownWeekday(_))
        ));
    }

    #[test]
    fn test_time_of_day_round_trip_format() {
        let t: TimeOfDay = "09:05".parse().unwrap();
        assert_eq!(t.to_string(), "09:05");
        assert_eq!(t.minutes_from_midnight(), 9 * 60 + 5);
        assert!("9am".parse::<TimeOfDay>().is_err());
        assert!("24:00".parse::<TimeOfDay>().is_err());
    }

    #[test]
    fn test_schedule_rejects_empty_days() {
        let t9 = TimeOfDay::from_hm(9, 0).unwrap();
        let t10 = TimeOfDay::from_hm(10, 0).unwrap();
        assert_eq!(Schedule::new([], t9, t10), Err(ScheduleError::NoDays));
    }

    #[test]
    fn test_schedule_rejects_inverted_or_empty_interval() {
        let t9 = TimeOfDay::from_hm(9, 0).unwrap();
        let t10 = TimeOfDay::from_hm(10, 0).unwrap();
        assert!(matches!(
            Schedule::new([Weekday::Monday], t10, t9),
            Err(ScheduleError::InvalidInterval { .. })
        ));
        assert!(matches!(
            Schedule::new([Weekday::Monday], t9, t9),
            Err(ScheduleError::InvalidInterval { .. })
        ));
    }

    #[test]
    fn test_schedule_deserialize_validates() {
        let ok: Schedule = serde_json::from_str(
            r#"{"days": ["Monday", "Wednesday"], "start_time": "10:00", "end_time": "11:00"}"#,
        )
        .unwrap();
        assert_eq!(ok.days().len(), 2);

        let inverted = serde_json::from_str::<Schedule>(
            r#"{"days": ["Monday"], "start_time": "11:00", "end_time": "10:00"}"#,
        );
        assert!(inverted.is_err());

        let no_days = serde_json::from_str::<Schedule>(
            r#"{"days": [], "start_time": "10:00", "end_time": "11:00"}"#,
        );
        assert!(no_days.is_err());
    }

    #[test]
    fn test_schedule_serializes_wire_form() {
        let s = sched(&["Wed", "Mon"], "10:00", "11:30");
        let value = serde_json::to_value(&s).unwrap();
        assert_eq!(value["days"], serde_json::json!(["Monday", "Wednesday"]));
        assert_eq!(value["start_time"], "10:00");
        assert_eq!(value["end_time"], "11:30");
    }

    #[test]
    fn test_subset_days_conflict() {
        // {Mon} must be busy against {Mon, Wed}
        let existing = sched(&["Monday"], "09:00", "10:00");
        let candidate = sched(&["Monday", "Wednesday"], "09:30", "10:30");
        assert!(existing.conflicts_with(&candidate));
        assert!(candidate.conflicts_with(&existing));
    }

    #[test]
    fn test_boundary_touching_does_not_conflict() {
        let a = sched(&["Monday"], "09:00", "10:00");
        let b = sched(&["Monday"], "10:00", "11:00");
        assert!(!a.conflicts_with(&b));
        assert!(!b.conflicts_with(&a));
    }

    #[test]
    fn test_disjoint_days_never_conflict() {
        let a = sched(&["Monday"], "09:00", "12:00");
        let b = sched(&["Tuesday"], "09:00", "12:00");
        assert!(a.overlaps_interval(&b));
        assert!(!a.conflicts_with(&b));
    }

    #[test]
    fn test_display() {
        let s = sched(&["Thu", "Tue"], "13:15", "14:45");
        assert_eq!(s.to_string(), "Tuesday, Thursday 13:15-14:45");
    }

    fn arb_schedule() -> impl Strategy<Value = Schedule> {
        (
            proptest::sample::subsequence(Weekday::ALL.to_vec(), 1..=5),
            0u32..(24 * 60 - 1),
            1u32..(6 * 60),
        )
            .prop_map(|(days, start, len)| {
                let end = (start + len).min(24 * 60 - 1);
                let start = TimeOfDay::from_hm(start / 60, start % 60).unwrap();
                let end = TimeOfDay::from_hm(end / 60, end % 60).unwrap();
                Schedule::new(days, start, end).unwrap()
            })
    }

    proptest! {
        #[test]
        fn prop_no_shared_day_means_no_conflict(a in arb_schedule(), b in arb_schedule()) {
            if a.days().is_disjoint(b.days()) {
                prop_assert!(!a.conflicts_with(&b));
            }
        }

        #[test]
        fn prop_shared_day_conflict_is_interval_overlap(a in arb_schedule(), b in arb_schedule()) {
            if !a.days().is_disjoint(b.days()) {
                let expected = a.start_time() < b.end_time() && b.start_time() < a.end_time();
                prop_assert_eq!(a.conflicts_with(&b), expected);
            }
        }

        #[test]
        fn prop_conflict_is_symmetric(a in arb_schedule(), b in arb_schedule()) {
            prop_assert_eq!(a.conflicts_with(&b), b.conflicts_with(&a));
        }
    }
}
