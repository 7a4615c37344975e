mod common;

use anyhow::Result;
use chrono::Duration;
use common::{roster, t0, test_service};
use tallymeet::application::AppError;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_starts_leave_one_active_meeting() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let mut handles = Vec::new();
    for i in 0..8 {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            let name = format!("Person {}", i);
            service
                .start_meeting(
                    roster(&[(name.as_str(), 10.0 + i as f64)]),
                    t0() + Duration::seconds(i),
                )
                .await
        }));
    }

    let mut started = 0;
    let mut rejected = 0;
    for handle in handles {
        match handle.await? {
            Ok(_) => started += 1,
            Err(AppError::MeetingAlreadyActive(_)) => rejected += 1,
            Err(other) => panic!("unexpected error: {:?}", other),
        }
    }

    assert_eq!(started, 1);
    assert_eq!(rejected, 7);
    assert_eq!(service.active_meeting_count().await?, 1);
    assert_eq!(service.meeting_count().await?, 1);

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_stops_stamp_end_time_once() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let meeting = service
        .start_meeting(roster(&[("Alice", 10.0)]), t0())
        .await?;

    let mut handles = Vec::new();
    for i in 0..6 {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            service.stop_meeting(t0() + Duration::minutes(10 + i)).await
        }));
    }

    let mut winners = Vec::new();
    for handle in handles {
        match handle.await? {
            Ok(id) => winners.push(id),
            Err(AppError::NoActiveMeeting) => {}
            Err(other) => panic!("unexpected error: {:?}", other),
        }
    }
    assert_eq!(winners, vec![meeting.id]);

    let report = service.summary(meeting.id, t0()).await?;
    let end = report.meeting.end_time.expect("meeting should be stopped");
    assert!(end >= t0() + Duration::minutes(10) && end <= t0() + Duration::minutes(15));

    // Repeat stops by id return the same id and leave the end time alone
    let again = service
        .stop_meeting_by_id(meeting.id, t0() + Duration::hours(2))
        .await?;
    assert_eq!(again, meeting.id);
    let report = service.summary(meeting.id, t0()).await?;
    assert_eq!(report.meeting.end_time, Some(end));

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_stops_by_id_agree() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let meeting = service
        .start_meeting(roster(&[("Alice", 10.0), ("Bob", 20.0)]), t0())
        .await?;

    let mut handles = Vec::new();
    for i in 0..6 {
        let service = service.clone();
        let id = meeting.id;
        handles.push(tokio::spawn(async move {
            service
                .stop_meeting_by_id(id, t0() + Duration::hours(1) + Duration::seconds(i))
                .await
        }));
    }

    for handle in handles {
        assert_eq!(handle.await??, meeting.id);
    }
    assert_eq!(service.active_meeting_count().await?, 0);

    Ok(())
}
