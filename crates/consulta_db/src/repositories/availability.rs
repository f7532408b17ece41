//! Availability rule repository trait

use crate::error::DbError;
use chrono::{DateTime, Utc};
use consulta_common::models::{CalendarBlock, WeeklyAvailabilityWindow};
use consulta_common::services::BoxFuture;

pub trait AvailabilityRepository: Send + Sync {
    /// All weekly windows, active or not.
    fn list_windows(&self) -> BoxFuture<'_, Vec<WeeklyAvailabilityWindow>, DbError>;

    /// Atomically swaps the whole weekly schedule.
    fn replace_windows(
        &self,
        windows: Vec<WeeklyAvailabilityWindow>,
    ) -> BoxFuture<'_, (), DbError>;

    /// Blocks overlapping `[start, end)`.
    fn list_blocks_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> BoxFuture<'_, Vec<CalendarBlock>, DbError>;

    fn add_block(&self, block: CalendarBlock) -> BoxFuture<'_, CalendarBlock, DbError>;

    /// Returns false when no block had this id.
    fn delete_block(&self, block_id: &str) -> BoxFuture<'_, bool, DbError>;
}
