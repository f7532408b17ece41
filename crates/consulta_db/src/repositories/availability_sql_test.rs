use crate::repositories::availability::AvailabilityRepository;
use crate::repositories::availability_sql::SqlAvailabilityRepository;
use crate::DbClient;
use chrono::{NaiveTime, TimeZone, Utc, Weekday};
use consulta_common::models::{CalendarBlock, WeeklyAvailabilityWindow};

async fn repository() -> SqlAvailabilityRepository {
    let client = DbClient::from_url("sqlite::memory:").await.unwrap();
    client.init_schema().await.unwrap();
    SqlAvailabilityRepository::new(client)
}

fn window(id: &str, weekday: Weekday, start: u32, end: u32) -> WeeklyAvailabilityWindow {
    WeeklyAvailabilityWindow {
        id: id.to_string(),
        weekday,
        start: NaiveTime::from_hms_opt(start, 0, 0).unwrap(),
        end: NaiveTime::from_hms_opt(end, 0, 0).unwrap(),
        active: true,
    }
}

#[tokio::test]
async fn replace_windows_swaps_the_whole_schedule() {
    let repo = repository().await;
    repo.replace_windows(vec![window("a", Weekday::Mon, 9, 17)])
        .await
        .unwrap();

    let mut inactive = window("c", Weekday::Sun, 10, 12);
    inactive.active = false;
    let schedule = vec![window("b", Weekday::Tue, 8, 12), inactive];
    repo.replace_windows(schedule.clone()).await.unwrap();

    assert_eq!(repo.list_windows().await.unwrap(), schedule);
}

#[tokio::test]
async fn blocks_are_listed_by_overlap() {
    let repo = repository().await;
    let block = CalendarBlock {
        id: "blk-1".to_string(),
        starts_at: Utc.with_ymd_and_hms(2031, 3, 4, 12, 0, 0).unwrap(),
        ends_at: Utc.with_ymd_and_hms(2031, 3, 4, 13, 0, 0).unwrap(),
        reason: Some("lunch".to_string()),
    };
    repo.add_block(block.clone()).await.unwrap();

    let day_start = Utc.with_ymd_and_hms(2031, 3, 4, 0, 0, 0).unwrap();
    let day_end = Utc.with_ymd_and_hms(2031, 3, 5, 0, 0, 0).unwrap();
    assert_eq!(
        repo.list_blocks_between(day_start, day_end).await.unwrap(),
        vec![block.clone()]
    );

    // Touching at the boundary is not an overlap.
    let afternoon = Utc.with_ymd_and_hms(2031, 3, 4, 13, 0, 0).unwrap();
    assert!(repo
        .list_blocks_between(afternoon, day_end)
        .await
        .unwrap()
        .is_empty());

    assert!(repo.delete_block("blk-1").await.unwrap());
    assert!(!repo.delete_block("blk-1").await.unwrap());
}
