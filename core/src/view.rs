//! Pure projections of cache snapshots into what screens display.
//!
//! Nothing here reads the clock: `now` is always an argument, so the same
//! snapshot and instant always give the same partition.

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::models::{Appointment, AppointmentStatus, ScheduleSlot};

const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AppointmentPartition {
    /// Scheduled and strictly after `now`.
    pub upcoming: Vec<Appointment>,
    /// Everything else: past, completed, or cancelled.
    pub other: Vec<Appointment>,
}

/// Split `snapshot` into upcoming and other appointments, keeping the
/// snapshot's order within each group.
pub fn partition_appointments(snapshot: &[Appointment], now: NaiveDateTime) -> AppointmentPartition {
    let (upcoming, other) = snapshot
        .iter()
        .cloned()
        .partition(|a| is_upcoming(a, now));
    AppointmentPartition { upcoming, other }
}

pub fn is_upcoming(appointment: &Appointment, now: NaiveDateTime) -> bool {
    appointment.status == AppointmentStatus::Scheduled && appointment.appointment_date > now
}

pub fn is_today(appointment: &Appointment, now: NaiveDateTime) -> bool {
    appointment.appointment_date.date() == now.date()
}

pub fn appointment_badge(status: AppointmentStatus) -> &'static str {
    match status {
        AppointmentStatus::Scheduled => "Scheduled",
        AppointmentStatus::Completed => "Completed",
        AppointmentStatus::Cancelled => "Cancelled",
    }
}

/// Weekday name for `day_of_week` (0 = Monday). `None` past Sunday.
pub fn weekday_name(day_of_week: u8) -> Option<&'static str> {
    WEEKDAYS.get(usize::from(day_of_week)).copied()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleRow {
    pub id: i64,
    pub day_of_week: u8,
    pub weekday: &'static str,
    pub start_time: String,
    pub end_time: String,
    pub active: bool,
}

/// One row per slot, ordered by weekday then start time.
pub fn schedule_rows(snapshot: &[ScheduleSlot]) -> Vec<ScheduleRow> {
    let mut slots: Vec<&ScheduleSlot> = snapshot.iter().collect();
    slots.sort_by(|a, b| {
        (a.day_of_week, &a.start_time).cmp(&(b.day_of_week, &b.start_time))
    });
    slots
        .into_iter()
        .map(|slot| ScheduleRow {
            id: slot.id,
            day_of_week: slot.day_of_week,
            weekday: weekday_name(slot.day_of_week).unwrap_or("Unknown"),
            start_time: slot.start_time.clone(),
            end_time: slot.end_time.clone(),
            active: slot.active,
        })
        .collect()
}
