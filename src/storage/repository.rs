use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::domain::{Attendee, Meeting, MeetingId};

use super::MIGRATION_001_INITIAL;

/// Outcome of trying to persist a freshly started meeting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// The one-active-meeting index rejected the row; nothing was written.
    ActiveMeetingExists,
}

/// Repository for persisting and querying meetings and their attendees.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database at the given URL.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations. Safe to run on every start.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Initialize a database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let repo = Self::connect(database_url).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    // ========================
    // Meeting writes
    // ========================

    /// Save a meeting and its attendees in one transaction.
    ///
    /// The meeting row goes first so the write lock is taken before anything
    /// else happens; a concurrent start blocks on it and then trips the
    /// unique index instead of slipping in a second active meeting.
    pub async fn insert_meeting(&self, meeting: &Meeting) -> Result<InsertOutcome> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO meetings (id, start_time, end_time, is_active)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(meeting.id.to_string())
        .bind(meeting.start_time.to_rfc3339())
        .bind(meeting.end_time.map(|dt| dt.to_rfc3339()))
        .bind(meeting.is_active)
        .execute(&mut *tx)
        .await;

        match inserted {
            Ok(_) => {}
            Err(sqlx::Error::Database(err)) if err.is_unique_violation() => {
                tx.rollback()
                    .await
                    .context("Failed to roll back rejected meeting")?;
                return Ok(InsertOutcome::ActiveMeetingExists);
            }
            Err(err) => return Err(err).context("Failed to save meeting"),
        }

        for (position, attendee) in meeting.attendees.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO attendees (id, meeting_id, position, name, hourly_rate)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(attendee.id.to_string())
            .bind(attendee.meeting_id.to_string())
            .bind(position as i64)
            .bind(&attendee.name)
            .bind(attendee.hourly_rate)
            .execute(&mut *tx)
            .await
            .context("Failed to save attendee")?;
        }

        tx.commit().await.context("Failed to commit meeting")?;
        Ok(InsertOutcome::Inserted)
    }

    /// Deactivate whichever meeting is active, stamping `end_time`.
    /// Returns the id of the meeting that was stopped, or `None` if nothing
    /// was active. The check and the update are a single statement.
    pub async fn deactivate_active_meeting(
        &self,
        end_time: DateTime<Utc>,
    ) -> Result<Option<MeetingId>> {
        let row = sqlx::query(
            r#"
            UPDATE meetings
            SET is_active = 0, end_time = ?
            WHERE is_active = 1
            RETURNING id
            "#,
        )
        .bind(end_time.to_rfc3339())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to stop active meeting")?;

        row.map(|row| {
            let id_str: String = row.get("id");
            Uuid::parse_str(&id_str).context("Invalid meeting ID")
        })
        .transpose()
    }

    /// Deactivate a specific meeting if it is still active.
    /// Returns `false` when the meeting was already stopped or does not exist.
    pub async fn deactivate_meeting(&self, id: MeetingId, end_time: DateTime<Utc>) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE meetings
            SET is_active = 0, end_time = ?
            WHERE id = ? AND is_active = 1
            "#,
        )
        .bind(end_time.to_rfc3339())
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .context("Failed to stop meeting")?;

        Ok(result.rows_affected() == 1)
    }

    // ========================
    // Meeting reads
    // ========================

    /// Get a meeting by ID, attendees included.
    pub async fn get_meeting(&self, id: MeetingId) -> Result<Option<Meeting>> {
        let row = sqlx::query(
            r#"
            SELECT id, start_time, end_time, is_active
            FROM meetings
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch meeting")?;

        match row {
            Some(row) => Ok(Some(self.hydrate(&row).await?)),
            None => Ok(None),
        }
    }

    /// Get the currently active meeting, attendees included.
    pub async fn get_active_meeting(&self) -> Result<Option<Meeting>> {
        let row = sqlx::query(
            r#"
            SELECT id, start_time, end_time, is_active
            FROM meetings
            WHERE is_active = 1
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch active meeting")?;

        match row {
            Some(row) => Ok(Some(self.hydrate(&row).await?)),
            None => Ok(None),
        }
    }

    /// Number of meetings currently flagged active. Anything above one means
    /// the schema guard is missing.
    pub async fn count_active_meetings(&self) -> Result<i64> {
        let count: i64 = sqlx::query("SELECT COUNT(*) as count FROM meetings WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count active meetings")?
            .get("count");
        Ok(count)
    }

    /// Total number of meetings ever recorded.
    pub async fn count_meetings(&self) -> Result<i64> {
        let count: i64 = sqlx::query("SELECT COUNT(*) as count FROM meetings")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count meetings")?
            .get("count");
        Ok(count)
    }

    async fn list_attendees(&self, meeting_id: MeetingId) -> Result<Vec<Attendee>> {
        let rows = sqlx::query(
            r#"
            SELECT id, meeting_id, name, hourly_rate
            FROM attendees
            WHERE meeting_id = ?
            ORDER BY position
            "#,
        )
        .bind(meeting_id.to_string())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list attendees")?;

        rows.iter().map(Self::row_to_attendee).collect()
    }

    async fn hydrate(&self, row: &sqlx::sqlite::SqliteRow) -> Result<Meeting> {
        let mut meeting = Self::row_to_meeting(row)?;
        meeting.attendees = self.list_attendees(meeting.id).await?;
        Ok(meeting)
    }

    fn row_to_meeting(row: &sqlx::sqlite::SqliteRow) -> Result<Meeting> {
        let id_str: String = row.get("id");
        let start_time_str: String = row.get("start_time");
        let end_time_str: Option<String> = row.get("end_time");

        Ok(Meeting {
            id: Uuid::parse_str(&id_str).context("Invalid meeting ID")?,
            start_time: DateTime::parse_from_rfc3339(&start_time_str)
                .context("Invalid start_time timestamp")?
                .with_timezone(&Utc),
            end_time: end_time_str
                .map(|s| DateTime::parse_from_rfc3339(&s))
                .transpose()
                .context("Invalid end_time timestamp")?
                .map(|dt| dt.with_timezone(&Utc)),
            is_active: row.get::<i32, _>("is_active") != 0,
            attendees: Vec::new(),
        })
    }

    fn row_to_attendee(row: &sqlx::sqlite::SqliteRow) -> Result<Attendee> {
        let id_str: String = row.get("id");
        let meeting_id_str: String = row.get("meeting_id");

        Ok(Attendee {
            id: Uuid::parse_str(&id_str).context("Invalid attendee ID")?,
            meeting_id: Uuid::parse_str(&meeting_id_str).context("Invalid meeting ID")?,
            name: row.get("name"),
            hourly_rate: row.get("hourly_rate"),
        })
    }
}
