use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Meeting, Rate};

pub const SECONDS_PER_HOUR: f64 = 3600.0;

/// Seconds between `start` and `end`, never negative.
/// Millisecond resolution is enough for a cost display.
pub fn elapsed_seconds(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    let millis = (end - start).num_milliseconds();
    (millis as f64 / 1000.0).max(0.0)
}

/// Cost accrued over `seconds` at a combined hourly rate.
pub fn accrued_cost(seconds: f64, total_hourly_rate: Rate) -> f64 {
    (seconds / SECONDS_PER_HOUR) * total_hourly_rate
}

/// Render seconds as zero-padded `HH:MM:SS`. Hours are not wrapped at 24.
pub fn format_duration(seconds: f64) -> String {
    let total = seconds.max(0.0).floor() as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, secs)
}

/// The seed a live display needs: when the meeting started and how fast it burns.
/// Anything holding a ticker can recompute the running cost without going back
/// to storage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostTicker {
    pub start_time: DateTime<Utc>,
    pub total_hourly_rate: Rate,
}

impl CostTicker {
    pub fn from_meeting(meeting: &Meeting) -> Self {
        Self {
            start_time: meeting.start_time,
            total_hourly_rate: meeting.total_hourly_rate(),
        }
    }

    /// Seconds since the Unix epoch at which the meeting started.
    pub fn start_epoch_seconds(&self) -> f64 {
        self.start_time.timestamp_millis() as f64 / 1000.0
    }

    pub fn at(&self, now: DateTime<Utc>) -> LiveCost {
        let elapsed = elapsed_seconds(self.start_time, now);
        LiveCost {
            start_time: self.start_time,
            start_epoch_seconds: self.start_epoch_seconds(),
            total_hourly_rate: self.total_hourly_rate,
            elapsed_seconds: elapsed,
            accrued_cost: accrued_cost(elapsed, self.total_hourly_rate),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveCost {
    pub start_time: DateTime<Utc>,
    pub start_epoch_seconds: f64,
    pub total_hourly_rate: Rate,
    pub elapsed_seconds: f64,
    pub accrued_cost: f64,
}

impl LiveCost {
    pub fn elapsed_display(&self) -> String {
        format_duration(self.elapsed_seconds)
    }
}

/// Running cost of a meeting as of `now`. Read-only.
pub fn compute_live_cost(meeting: &Meeting, now: DateTime<Utc>) -> LiveCost {
    CostTicker::from_meeting(meeting).at(now)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeetingSummary {
    pub ended_at: DateTime<Utc>,
    /// True when the meeting is still running and `ended_at` is just `now`.
    pub provisional: bool,
    pub duration_seconds: f64,
    pub duration: String,
    pub total_hourly_rate: Rate,
    pub total_cost: f64,
    pub attendee_count: usize,
}

/// Point-in-time summary of a meeting. A running meeting is summarised up to
/// `now`; the meeting itself is never modified.
pub fn compute_summary(meeting: &Meeting, now: DateTime<Utc>) -> MeetingSummary {
    let (ended_at, provisional) = match meeting.end_time {
        Some(end) => (end, false),
        None => (now, true),
    };

    let duration_seconds = elapsed_seconds(meeting.start_time, ended_at);
    let total_hourly_rate = meeting.total_hourly_rate();

    MeetingSummary {
        ended_at,
        provisional,
        duration_seconds,
        duration: format_duration(duration_seconds),
        total_hourly_rate,
        total_cost: accrued_cost(duration_seconds, total_hourly_rate),
        attendee_count: meeting.attendee_count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AttendeeEntry;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    fn meeting_with(rates: &[f64]) -> Meeting {
        let entries = rates
            .iter()
            .enumerate()
            .map(|(i, r)| AttendeeEntry::new(format!("Person {}", i + 1), *r));
        Meeting::start(entries, t0()).unwrap()
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0.0), "00:00:00");
        assert_eq!(format_duration(59.9), "00:00:59");
        assert_eq!(format_duration(3600.0), "01:00:00");
        assert_eq!(format_duration(5400.0), "01:30:00");
        assert_eq!(format_duration(3661.0), "01:01:01");
        assert_eq!(format_duration(30.0 * 3600.0), "30:00:00");
        assert_eq!(format_duration(-12.0), "00:00:00");
    }

    #[test]
    fn test_elapsed_is_clamped() {
        assert_eq!(elapsed_seconds(t0(), t0() - Duration::seconds(30)), 0.0);
        assert_eq!(elapsed_seconds(t0(), t0() + Duration::milliseconds(1500)), 1.5);
    }

    #[test]
    fn test_live_cost_accrues() {
        let meeting = meeting_with(&[60.0, 30.0]);
        let live = compute_live_cost(&meeting, t0() + Duration::minutes(20));

        assert_eq!(live.total_hourly_rate, 90.0);
        assert_eq!(live.elapsed_seconds, 1200.0);
        assert!((live.accrued_cost - 30.0).abs() < 1e-9);
        assert_eq!(live.elapsed_display(), "00:20:00");
        assert_eq!(live.start_epoch_seconds, t0().timestamp() as f64);
    }

    #[test]
    fn test_live_cost_is_monotonic() {
        let meeting = meeting_with(&[10.0, 0.0, 45.5]);
        let mut previous = 0.0;
        for minute in 0..120 {
            let live = compute_live_cost(&meeting, t0() + Duration::minutes(minute));
            assert!(live.accrued_cost >= previous);
            previous = live.accrued_cost;
        }
    }

    #[test]
    fn test_summary_of_stopped_meeting() {
        let mut meeting = meeting_with(&[10.0, 20.0]);
        meeting.is_active = false;
        meeting.end_time = Some(t0() + Duration::hours(1));

        // `now` is irrelevant once the meeting has an end time
        let summary = compute_summary(&meeting, t0() + Duration::days(3));
        assert_eq!(summary.duration, "01:00:00");
        assert_eq!(summary.total_cost, 30.0);
        assert_eq!(summary.attendee_count, 2);
        assert!(!summary.provisional);
    }

    #[test]
    fn test_summary_of_running_meeting_uses_now() {
        let meeting = meeting_with(&[60.0]);
        let summary = compute_summary(&meeting, t0() + Duration::minutes(90));

        assert_eq!(summary.duration, "01:30:00");
        assert_eq!(summary.total_cost, 90.0);
        assert!(summary.provisional);
        assert_eq!(summary.ended_at, t0() + Duration::minutes(90));
        assert!(meeting.end_time.is_none());
    }

    #[test]
    fn test_summary_of_zero_length_meeting() {
        let mut meeting = meeting_with(&[100.0]);
        meeting.is_active = false;
        meeting.end_time = Some(t0());

        let summary = compute_summary(&meeting, t0());
        assert_eq!(summary.duration, "00:00:00");
        assert_eq!(summary.total_cost, 0.0);
    }
}
