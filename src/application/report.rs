use serde::{Deserialize, Serialize};

use crate::domain::{LiveCost, Meeting, MeetingId, MeetingSummary};

/// Where a client should land when it opens the app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "page", rename_all = "lowercase")]
pub enum Landing {
    Dashboard { meeting_id: MeetingId },
    Setup,
}

/// Everything a dashboard needs to render once and then tick on its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveCostView {
    pub meeting: Meeting,
    pub live: LiveCost,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryReport {
    pub meeting: Meeting,
    #[serde(flatten)]
    pub summary: MeetingSummary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}

impl HealthStatus {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}
