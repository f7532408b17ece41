//! SQL implementation of the availability repository
//!
//! Weekly windows are stored as a weekday number (0 = Monday) and minutes past
//! local midnight; blocks as absolute unix-second ranges.

use crate::error::DbError;
use crate::repositories::availability::AvailabilityRepository;
use crate::repositories::rows::{column, from_timestamp, to_timestamp};
use crate::DbClient;
use chrono::{DateTime, NaiveTime, Timelike, Utc, Weekday};
use consulta_common::models::{CalendarBlock, WeeklyAvailabilityWindow};
use consulta_common::services::BoxFuture;
use sqlx::any::AnyRow;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct SqlAvailabilityRepository {
    db_client: DbClient,
}

impl SqlAvailabilityRepository {
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }
}

fn weekday_from_number(n: i64) -> Result<Weekday, DbError> {
    let weekday = match n {
        0 => Weekday::Mon,
        1 => Weekday::Tue,
        2 => Weekday::Wed,
        3 => Weekday::Thu,
        4 => Weekday::Fri,
        5 => Weekday::Sat,
        6 => Weekday::Sun,
        other => {
            return Err(DbError::CorruptRow {
                table: "availability_windows",
                message: format!("weekday {} out of range", other),
            })
        }
    };
    Ok(weekday)
}

fn minute_of_day(time: NaiveTime) -> i64 {
    i64::from(time.hour() * 60 + time.minute())
}

fn time_from_minute(minute: i64) -> Result<NaiveTime, DbError> {
    let corrupt = || DbError::CorruptRow {
        table: "availability_windows",
        message: format!("minute {} out of range", minute),
    };
    let minute = u32::try_from(minute).map_err(|_| corrupt())?;
    NaiveTime::from_hms_opt(minute / 60, minute % 60, 0).ok_or_else(corrupt)
}

fn window_from_row(row: &AnyRow) -> Result<WeeklyAvailabilityWindow, DbError> {
    const TABLE: &str = "availability_windows";
    Ok(WeeklyAvailabilityWindow {
        id: column(row, TABLE, "id")?,
        weekday: weekday_from_number(column(row, TABLE, "weekday")?)?,
        start: time_from_minute(column(row, TABLE, "start_minute")?)?,
        end: time_from_minute(column(row, TABLE, "end_minute")?)?,
        active: column::<i64>(row, TABLE, "active")? != 0,
    })
}

fn block_from_row(row: &AnyRow) -> Result<CalendarBlock, DbError> {
    const TABLE: &str = "calendar_blocks";
    Ok(CalendarBlock {
        id: column(row, TABLE, "id")?,
        starts_at: from_timestamp(TABLE, column(row, TABLE, "starts_at")?)?,
        ends_at: from_timestamp(TABLE, column(row, TABLE, "ends_at")?)?,
        reason: column(row, TABLE, "reason")?,
    })
}

impl AvailabilityRepository for SqlAvailabilityRepository {
    fn list_windows(&self) -> BoxFuture<'_, Vec<WeeklyAvailabilityWindow>, DbError> {
        Box::pin(async move {
            let rows = sqlx::query(
                "SELECT id, weekday, start_minute, end_minute, active FROM availability_windows \
                 ORDER BY weekday, start_minute",
            )
            .fetch_all(self.db_client.pool())
            .await
            .map_err(|e| DbError::QueryError(e.to_string()))?;
            rows.iter().map(window_from_row).collect()
        })
    }

    fn replace_windows(
        &self,
        windows: Vec<WeeklyAvailabilityWindow>,
    ) -> BoxFuture<'_, (), DbError> {
        Box::pin(async move {
            let mut tx = self.db_client.begin().await?;

            sqlx::query("DELETE FROM availability_windows")
                .execute(&mut *tx)
                .await
                .map_err(|e| DbError::QueryError(e.to_string()))?;

            for window in &windows {
                sqlx::query(
                    "INSERT INTO availability_windows (id, weekday, start_minute, end_minute, active) \
                     VALUES ($1, $2, $3, $4, $5)",
                )
                .bind(&window.id)
                .bind(i64::from(window.weekday.num_days_from_monday()))
                .bind(minute_of_day(window.start))
                .bind(minute_of_day(window.end))
                .bind(i64::from(window.active))
                .execute(&mut *tx)
                .await
                .map_err(|e| DbError::QueryError(e.to_string()))?;
            }

            tx.commit().await?;
            info!("Replaced weekly availability with {} windows", windows.len());
            Ok(())
        })
    }

    fn list_blocks_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> BoxFuture<'_, Vec<CalendarBlock>, DbError> {
        Box::pin(async move {
            let rows = sqlx::query(
                "SELECT id, starts_at, ends_at, reason FROM calendar_blocks \
                 WHERE starts_at < $1 AND ends_at > $2 ORDER BY starts_at",
            )
            .bind(to_timestamp(end))
            .bind(to_timestamp(start))
            .fetch_all(self.db_client.pool())
            .await
            .map_err(|e| DbError::QueryError(e.to_string()))?;
            rows.iter().map(block_from_row).collect()
        })
    }

    fn add_block(&self, block: CalendarBlock) -> BoxFuture<'_, CalendarBlock, DbError> {
        Box::pin(async move {
            sqlx::query(
                "INSERT INTO calendar_blocks (id, starts_at, ends_at, reason) VALUES ($1, $2, $3, $4)",
            )
            .bind(&block.id)
            .bind(to_timestamp(block.starts_at))
            .bind(to_timestamp(block.ends_at))
            .bind(block.reason.clone())
            .execute(self.db_client.pool())
            .await
            .map_err(|e| DbError::QueryError(e.to_string()))?;
            debug!("Added calendar block {}", block.id);
            Ok(block)
        })
    }

    fn delete_block(&self, block_id: &str) -> BoxFuture<'_, bool, DbError> {
        let block_id = block_id.to_string();
        Box::pin(async move {
            let result = sqlx::query("DELETE FROM calendar_blocks WHERE id = $1")
                .bind(&block_id)
                .execute(self.db_client.pool())
                .await
                .map_err(|e| DbError::QueryError(e.to_string()))?;
            Ok(result.rows_affected() > 0)
        })
    }
}
