use thiserror::Error;

use crate::domain::RosterError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("No valid attendees: every entry needs a name and a non-negative rate")]
    NoValidAttendees,

    #[error("No meeting is currently running")]
    NoActiveMeeting,

    #[error("Meeting not found: {0}")]
    MeetingNotFound(String),

    #[error("A meeting is already running: {0}")]
    MeetingAlreadyActive(String),

    #[error("Invalid rate: {0}")]
    InvalidRate(String),

    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),
}

impl From<RosterError> for AppError {
    fn from(err: RosterError) -> Self {
        match err {
            RosterError::NoValidAttendees => AppError::NoValidAttendees,
        }
    }
}
