use chrono::{DateTime, Utc};
use log::{debug, info, warn};

use crate::domain::{
    compute_live_cost, compute_summary, filter_entries, AttendeeEntry, Meeting, MeetingId,
};
use crate::storage::{InsertOutcome, Repository};

use super::{AppError, HealthStatus, Landing, LiveCostView, SummaryReport};

/// The meeting ledger: owns the single-active-meeting rule and the cost views.
/// This is the primary interface for any client (CLI, API, TUI, etc.).
///
/// Every operation that depends on the clock takes `now` explicitly.
#[derive(Clone)]
pub struct MeetingService {
    repo: Repository,
}

impl MeetingService {
    /// Create a new meeting service with the given repository.
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Open (creating if needed) and migrate the database at the given path.
    pub async fn init(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let repo = Repository::init(&db_url).await?;
        Ok(Self::new(repo))
    }

    /// Stateless liveness probe.
    pub fn health(&self) -> HealthStatus {
        HealthStatus::ok()
    }

    // ========================
    // Lifecycle
    // ========================

    /// Start a meeting with the usable subset of `entries`.
    ///
    /// Entries with a blank name or a negative rate are dropped silently. If
    /// none remain, nothing is written and `NoValidAttendees` is returned.
    pub async fn start_meeting(
        &self,
        entries: Vec<AttendeeEntry>,
        now: DateTime<Utc>,
    ) -> Result<Meeting, AppError> {
        let submitted = entries.len();
        let roster = filter_entries(entries);
        if roster.len() < submitted {
            warn!(
                "dropped {} of {} roster entries without a name or with a negative rate",
                submitted - roster.len(),
                submitted
            );
        }

        let meeting = Meeting::start(roster, now)?;

        // Fast path for the common case; the unique index covers the race.
        if let Some(active) = self.repo.get_active_meeting().await? {
            warn!("refusing to start: meeting {} is still running", active.id);
            return Err(AppError::MeetingAlreadyActive(active.id.to_string()));
        }

        match self.repo.insert_meeting(&meeting).await? {
            InsertOutcome::Inserted => {
                info!(
                    "started meeting {} with {} attendees at {}/h",
                    meeting.id,
                    meeting.attendee_count(),
                    meeting.total_hourly_rate()
                );
                Ok(meeting)
            }
            InsertOutcome::ActiveMeetingExists => {
                warn!("refusing to start: another meeting was started concurrently");
                let active = self
                    .repo
                    .get_active_meeting()
                    .await?
                    .map(|m| m.id.to_string())
                    .unwrap_or_default();
                Err(AppError::MeetingAlreadyActive(active))
            }
        }
    }

    /// The meeting currently running, with its attendees.
    pub async fn get_active_meeting(&self) -> Result<Meeting, AppError> {
        debug!("looking up active meeting");
        self.repo
            .get_active_meeting()
            .await?
            .ok_or(AppError::NoActiveMeeting)
    }

    /// Stop whichever meeting is running.
    ///
    /// Only one caller can win; anyone racing it sees `NoActiveMeeting` and the
    /// winner's `end_time` stays untouched.
    pub async fn stop_meeting(&self, now: DateTime<Utc>) -> Result<MeetingId, AppError> {
        match self.repo.deactivate_active_meeting(now).await? {
            Some(id) => {
                info!("stopped meeting {}", id);
                Ok(id)
            }
            None => Err(AppError::NoActiveMeeting),
        }
    }

    /// Stop a specific meeting. Stopping an already stopped meeting is a no-op
    /// that returns the same id and keeps the first `end_time`.
    pub async fn stop_meeting_by_id(
        &self,
        id: MeetingId,
        now: DateTime<Utc>,
    ) -> Result<MeetingId, AppError> {
        if self.repo.deactivate_meeting(id, now).await? {
            info!("stopped meeting {}", id);
            return Ok(id);
        }

        match self.repo.get_meeting(id).await? {
            Some(_) => {
                debug!("meeting {} was already stopped", id);
                Ok(id)
            }
            None => Err(AppError::MeetingNotFound(id.to_string())),
        }
    }

    // ========================
    // Views
    // ========================

    /// Where the root and setup pages should send the client.
    pub async fn resolve_landing(&self) -> Result<Landing, AppError> {
        Ok(match self.repo.get_active_meeting().await? {
            Some(meeting) => Landing::Dashboard {
                meeting_id: meeting.id,
            },
            None => Landing::Setup,
        })
    }

    /// Live cost of the running meeting as of `now`.
    pub async fn live_cost(&self, now: DateTime<Utc>) -> Result<LiveCostView, AppError> {
        let meeting = self.get_active_meeting().await?;
        let live = compute_live_cost(&meeting, now);
        Ok(LiveCostView { meeting, live })
    }

    /// Summary of any meeting, running or stopped. A running meeting is
    /// summarised up to `now` without recording an end time.
    pub async fn summary(&self, id: MeetingId, now: DateTime<Utc>) -> Result<SummaryReport, AppError> {
        let meeting = self
            .repo
            .get_meeting(id)
            .await?
            .ok_or_else(|| AppError::MeetingNotFound(id.to_string()))?;

        let summary = compute_summary(&meeting, now);
        Ok(SummaryReport { meeting, summary })
    }

    /// Number of meetings flagged active.
    pub async fn active_meeting_count(&self) -> Result<i64, AppError> {
        Ok(self.repo.count_active_meetings().await?)
    }

    /// Number of meetings ever recorded.
    pub async fn meeting_count(&self) -> Result<i64, AppError> {
        Ok(self.repo.count_meetings().await?)
    }
}
