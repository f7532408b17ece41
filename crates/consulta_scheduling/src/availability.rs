// --- File: crates/consulta_scheduling/src/availability.rs ---
//! Bookable start times for one day.
//!
//! Free time is the day's active weekly windows minus calendar blocks minus
//! active bookings (padded by the configured buffers). Candidate starts lie on
//! a fixed grid counted from local midnight, independent of session length.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use consulta_common::models::WeeklyAvailabilityWindow;
use consulta_config::AppConfig;
use consulta_db::{AvailabilityRepository, BookingRepository};
use std::collections::BTreeSet;
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

use crate::clock::Clock;
use crate::error::SchedulingError;

type Interval = (DateTime<Utc>, DateTime<Utc>);

/// Parameters of the slot grid, resolved once from configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlotRules {
    pub time_zone: Tz,
    pub granularity: Duration,
    pub buffer_before: Duration,
    pub buffer_after: Duration,
}

impl SlotRules {
    pub fn from_config(config: &AppConfig) -> Result<Self, SchedulingError> {
        let scheduling = &config.scheduling;
        let time_zone = Tz::from_str(&scheduling.time_zone).map_err(|e| {
            SchedulingError::Validation(format!(
                "invalid time zone '{}': {}",
                scheduling.time_zone, e
            ))
        })?;
        if scheduling.slot_granularity_minutes <= 0 {
            return Err(SchedulingError::Validation(
                "slot granularity must be positive".to_string(),
            ));
        }
        Ok(Self {
            time_zone,
            granularity: Duration::minutes(scheduling.slot_granularity_minutes),
            buffer_before: Duration::minutes(scheduling.buffer_before_minutes.max(0)),
            buffer_after: Duration::minutes(scheduling.buffer_after_minutes.max(0)),
        })
    }
}

/// Resolves a local wall-clock time to UTC. Ambiguous times (DST fall-back)
/// take the earlier instant; times inside a DST gap move past the gap.
pub fn local_to_utc(time_zone: Tz, local: NaiveDateTime) -> Option<DateTime<Utc>> {
    time_zone
        .from_local_datetime(&local)
        .earliest()
        .or_else(|| {
            time_zone
                .from_local_datetime(&(local + Duration::hours(1)))
                .earliest()
        })
        .map(|dt| dt.with_timezone(&Utc))
}

/// UTC bounds of the local calendar day.
pub fn day_bounds(time_zone: Tz, date: NaiveDate) -> Option<Interval> {
    let start = local_to_utc(time_zone, date.and_hms_opt(0, 0, 0)?)?;
    let end = local_to_utc(time_zone, date.succ_opt()?.and_hms_opt(0, 0, 0)?)?;
    Some((start, end))
}

fn subtract(free: Vec<Interval>, cut: Interval) -> Vec<Interval> {
    let (cut_start, cut_end) = cut;
    let mut out = Vec::with_capacity(free.len() + 1);
    for (start, end) in free {
        if cut_end <= start || cut_start >= end {
            out.push((start, end));
            continue;
        }
        if start < cut_start {
            out.push((start, cut_start));
        }
        if cut_end < end {
            out.push((cut_end, end));
        }
    }
    out
}

/// Free intervals of `date`: active windows for its weekday minus `blocked`.
pub fn free_intervals(
    date: NaiveDate,
    windows: &[WeeklyAvailabilityWindow],
    blocked: &[Interval],
    time_zone: Tz,
) -> Vec<Interval> {
    let mut free: Vec<Interval> = windows
        .iter()
        .filter(|w| w.active && w.weekday == date.weekday() && w.start < w.end)
        .filter_map(|w| {
            let start = local_to_utc(time_zone, date.and_time(w.start))?;
            let end = local_to_utc(time_zone, date.and_time(w.end))?;
            (start < end).then_some((start, end))
        })
        .collect();

    for cut in blocked {
        free = subtract(free, *cut);
    }
    free
}

/// Pure slot computation: every grid point of `date` at or after `now` from
/// which `duration` fits entirely inside one free interval. Chronological.
pub fn compute_free_starts(
    date: NaiveDate,
    duration: Duration,
    windows: &[WeeklyAvailabilityWindow],
    blocks: &[Interval],
    bookings: &[Interval],
    rules: &SlotRules,
    now: DateTime<Utc>,
) -> Vec<DateTime<Utc>> {
    let mut blocked: Vec<Interval> = blocks.to_vec();
    blocked.extend(
        bookings
            .iter()
            .map(|(start, end)| (*start - rules.buffer_before, *end + rules.buffer_after)),
    );
    let free = free_intervals(date, windows, &blocked, rules.time_zone);
    if free.is_empty() || duration <= Duration::zero() {
        return Vec::new();
    }

    let Some(midnight) = date.and_hms_opt(0, 0, 0) else {
        return Vec::new();
    };
    let mut starts = BTreeSet::new();
    let mut offset = Duration::zero();
    while offset < Duration::days(1) {
        let local = midnight + offset;
        offset += rules.granularity;
        // Grid points that fall into a DST gap have no instant of their own.
        let Some(candidate) = rules
            .time_zone
            .from_local_datetime(&local)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
        else {
            continue;
        };
        if candidate < now {
            continue;
        }
        let end = candidate + duration;
        if free
            .iter()
            .any(|(free_start, free_end)| candidate >= *free_start && end <= *free_end)
        {
            starts.insert(candidate);
        }
    }
    starts.into_iter().collect()
}

/// Read-only availability queries against storage.
pub struct AvailabilityCalculator {
    config: Arc<AppConfig>,
    availability: Arc<dyn AvailabilityRepository>,
    bookings: Arc<dyn BookingRepository>,
    clock: Arc<dyn Clock>,
}

impl AvailabilityCalculator {
    pub fn new(
        config: Arc<AppConfig>,
        availability: Arc<dyn AvailabilityRepository>,
        bookings: Arc<dyn BookingRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            availability,
            bookings,
            clock,
        }
    }

    pub fn rules(&self) -> Result<SlotRules, SchedulingError> {
        SlotRules::from_config(&self.config)
    }

    /// Rejects dates outside `[today + min_lead_days, today + max_lead_days]`,
    /// "today" being the advisor's local date.
    fn check_lead_window(&self, date: NaiveDate, rules: &SlotRules) -> Result<(), SchedulingError> {
        let today = self.clock.now().with_timezone(&rules.time_zone).date_naive();
        let earliest = today + Duration::days(self.config.scheduling.min_lead_days);
        let latest = today + Duration::days(self.config.scheduling.max_lead_days);
        if date < earliest || date > latest {
            return Err(SchedulingError::Validation(format!(
                "date {} is outside the bookable range {} to {}",
                date, earliest, latest
            )));
        }
        Ok(())
    }

    /// Bookable start times for `date` and a session of `duration_minutes`.
    pub async fn compute_slots(
        &self,
        date: NaiveDate,
        duration_minutes: i64,
    ) -> Result<Vec<DateTime<Utc>>, SchedulingError> {
        let rules = self.rules()?;
        self.check_lead_window(date, &rules)?;
        if !self.config.has_plan_duration(duration_minutes) {
            return Err(SchedulingError::Validation(format!(
                "no plan lasts {} minutes",
                duration_minutes
            )));
        }

        let (day_start, day_end) = day_bounds(rules.time_zone, date).ok_or_else(|| {
            SchedulingError::Validation(format!("date {} cannot be resolved", date))
        })?;

        let windows = self.availability.list_windows().await?;
        let blocks: Vec<Interval> = self
            .availability
            .list_blocks_between(day_start, day_end)
            .await?
            .into_iter()
            .map(|b| (b.starts_at, b.ends_at))
            .collect();
        let bookings: Vec<Interval> = self
            .bookings
            .list_active_bookings_between(day_start - rules.buffer_after, day_end + rules.buffer_before)
            .await?
            .into_iter()
            .map(|b| (b.starts_at, b.ends_at()))
            .collect();

        let starts = compute_free_starts(
            date,
            Duration::minutes(duration_minutes),
            &windows,
            &blocks,
            &bookings,
            &rules,
            self.clock.now(),
        );
        debug!(
            "{} slots of {} minutes on {} ({} windows, {} blocks, {} bookings)",
            starts.len(),
            duration_minutes,
            date,
            windows.len(),
            blocks.len(),
            bookings.len()
        );
        Ok(starts)
    }
}
