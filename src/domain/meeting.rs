use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Rate;

pub type MeetingId = Uuid;
pub type AttendeeId = Uuid;

/// A raw roster line as submitted during setup, before validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendeeEntry {
    pub name: String,
    pub hourly_rate: Rate,
}

impl AttendeeEntry {
    pub fn new(name: impl Into<String>, hourly_rate: Rate) -> Self {
        Self {
            name: name.into(),
            hourly_rate,
        }
    }

    /// An entry is usable when its trimmed name is non-empty and its rate is
    /// a non-negative number. NaN fails the comparison and is rejected too.
    pub fn is_valid(&self) -> bool {
        !self.name.trim().is_empty() && self.hourly_rate >= 0.0
    }
}

/// Keep only the usable entries, in submission order, with names trimmed.
pub fn filter_entries<I>(entries: I) -> Vec<AttendeeEntry>
where
    I: IntoIterator<Item = AttendeeEntry>,
{
    entries
        .into_iter()
        .filter(AttendeeEntry::is_valid)
        .map(|entry| AttendeeEntry {
            name: entry.name.trim().to_string(),
            hourly_rate: entry.hourly_rate,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attendee {
    pub id: AttendeeId,
    pub meeting_id: MeetingId,
    pub name: String,
    pub hourly_rate: Rate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meeting {
    pub id: MeetingId,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub attendees: Vec<Attendee>,
}

impl Meeting {
    /// Open a new meeting at `now` with the usable subset of `entries`.
    /// Fails if no entry survives filtering.
    pub fn start<I>(entries: I, now: DateTime<Utc>) -> Result<Self, RosterError>
    where
        I: IntoIterator<Item = AttendeeEntry>,
    {
        let roster = filter_entries(entries);
        if roster.is_empty() {
            return Err(RosterError::NoValidAttendees);
        }

        let id = Uuid::new_v4();
        let attendees = roster
            .into_iter()
            .map(|entry| Attendee {
                id: Uuid::new_v4(),
                meeting_id: id,
                name: entry.name,
                hourly_rate: entry.hourly_rate,
            })
            .collect();

        Ok(Self {
            id,
            start_time: now,
            end_time: None,
            is_active: true,
            attendees,
        })
    }

    pub fn total_hourly_rate(&self) -> Rate {
        self.attendees.iter().map(|a| a.hourly_rate).sum()
    }

    pub fn attendee_count(&self) -> usize {
        self.attendees.len()
    }

    pub fn is_stopped(&self) -> bool {
        !self.is_active && self.end_time.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RosterError {
    NoValidAttendees,
}

impl std::fmt::Display for RosterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RosterError::NoValidAttendees => {
                write!(f, "no attendee has both a name and a non-negative rate")
            }
        }
    }
}

impl std::error::Error for RosterError {}
