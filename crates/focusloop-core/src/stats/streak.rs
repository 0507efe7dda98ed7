//! Streak computation over daily buckets.

use chrono::NaiveDate;

use super::DailyStats;

/// Count consecutive calendar days with at least one completed session,
/// walking backwards from the most recent active day. The chain only
/// counts if it reaches today or yesterday; a larger gap means the
/// streak is broken and the result is 0.
///
/// O(retained days) per call, which the bounded retention window keeps
/// small.
pub(super) fn current_streak(days: &[DailyStats], today: NaiveDate) -> u32 {
    let mut active: Vec<NaiveDate> = days
        .iter()
        .filter(|d| d.completed_sessions > 0)
        .map(|d| d.date)
        .collect();
    if active.is_empty() {
        return 0;
    }
    active.sort_unstable_by(|a, b| b.cmp(a));

    let most_recent = active[0];
    if (today - most_recent).num_days() > 1 {
        return 0;
    }

    let mut streak = 1;
    for pair in active.windows(2) {
        if (pair[0] - pair[1]).num_days() == 1 {
            streak += 1;
        } else {
            break;
        }
    }
    streak
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Days;

    fn day(date: NaiveDate, sessions: u32) -> DailyStats {
        DailyStats {
            date,
            completed_sessions: sessions,
            work_minutes: 0,
            break_minutes: 0,
        }
    }

    fn d(offset_from_today: u64, today: NaiveDate) -> NaiveDate {
        today.checked_sub_days(Days::new(offset_from_today)).unwrap()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 7).unwrap()
    }

    #[test]
    fn empty_history_is_zero() {
        assert_eq!(current_streak(&[], today()), 0);
    }

    #[test]
    fn three_consecutive_days_ending_today() {
        let t = today();
        let days = vec![day(d(2, t), 1), day(d(1, t), 3), day(d(0, t), 2)];
        assert_eq!(current_streak(&days, t), 3);
    }

    #[test]
    fn chain_may_end_yesterday() {
        let t = today();
        let days = vec![day(d(2, t), 1), day(d(1, t), 1)];
        assert_eq!(current_streak(&days, t), 2);
    }

    #[test]
    fn gap_greater_than_one_breaks_the_streak() {
        let t = today();
        let days = vec![day(d(5, t), 4)];
        assert_eq!(current_streak(&days, t), 0);
    }

    #[test]
    fn non_adjacent_history_stops_the_walk() {
        let t = today();
        // today, yesterday, then a hole before two older active days.
        let days = vec![
            day(d(0, t), 1),
            day(d(1, t), 1),
            day(d(3, t), 1),
            day(d(4, t), 1),
        ];
        assert_eq!(current_streak(&days, t), 2);
    }

    #[test]
    fn zero_session_buckets_do_not_count() {
        let t = today();
        let days = vec![day(d(0, t), 0), day(d(1, t), 2)];
        assert_eq!(current_streak(&days, t), 1);
    }

    #[test]
    fn order_of_input_does_not_matter() {
        let t = today();
        let days = vec![day(d(1, t), 1), day(d(0, t), 1), day(d(2, t), 1)];
        assert_eq!(current_streak(&days, t), 3);
    }
}
