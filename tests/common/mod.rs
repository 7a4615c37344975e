// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use chrono::{DateTime, TimeZone, Utc};
use tallymeet::application::MeetingService;
use tallymeet::domain::AttendeeEntry;
use tempfile::TempDir;

/// Helper to create a test service with a temporary database
pub async fn test_service() -> Result<(MeetingService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let service = MeetingService::init(db_path.to_str().unwrap()).await?;
    Ok((service, temp_dir))
}

/// A fixed instant to measure meetings from
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 6, 9, 30, 0).unwrap()
}

/// Build roster entries from (name, rate) pairs
pub fn roster(pairs: &[(&str, f64)]) -> Vec<AttendeeEntry> {
    pairs
        .iter()
        .map(|(name, rate)| AttendeeEntry::new(*name, *rate))
        .collect()
}
