use std::sync::Arc;

use chrono::NaiveTime;

use super::{Lifecycle, ScreenContext};
use crate::api::ScheduleSource;
use crate::dispatcher::MutationDispatcher;
use crate::error::{Result, ValidationError};
use crate::models::{NewScheduleSlot, ScheduleSlot, ScheduleSlotPatch};
use crate::record::RecordId;
use crate::retry::retrying;
use crate::session::Session;
use crate::view::{ScheduleRow, schedule_rows};

/// Slot fields as typed by the barber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotInput {
    pub day_of_week: u8,
    pub start_time: String,
    pub end_time: String,
}

/// Check day 0..=6, `HH:MM` times, and start before end.
pub fn validate_slot(input: &SlotInput) -> std::result::Result<(), ValidationError> {
    let mut errors = Vec::new();
    if input.day_of_week > 6 {
        errors.push(ValidationError::invalid(
            "day_of_week",
            format!("{} is not between 0 (Monday) and 6 (Sunday)", input.day_of_week),
        ));
    }
    match (
        parse_hhmm("start_time", &input.start_time),
        parse_hhmm("end_time", &input.end_time),
    ) {
        (Ok(start), Ok(end)) if start >= end => errors.push(ValidationError::invalid(
            "end_time",
            format!("{} must be after {}", input.end_time, input.start_time),
        )),
        (start, end) => {
            errors.extend(start.err());
            errors.extend(end.err());
        }
    }
    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.remove(0)),
        _ => Err(ValidationError::Many(errors)),
    }
}

fn parse_hhmm(field: &'static str, raw: &str) -> std::result::Result<NaiveTime, ValidationError> {
    let invalid = || ValidationError::invalid(field, format!("'{raw}' is not HH:MM"));
    if raw.len() != 5 {
        return Err(invalid());
    }
    NaiveTime::parse_from_str(raw, "%H:%M").map_err(|_| invalid())
}

/// A barber's weekly working hours.
pub struct WeeklySchedule {
    ctx: ScreenContext,
    session: Session,
    dispatcher: MutationDispatcher<ScheduleSlot>,
    lifecycle: Lifecycle,
}

impl WeeklySchedule {
    pub async fn open(ctx: ScreenContext) -> Result<Self> {
        let session = ctx.session()?;
        session
            .require_barber("manage a schedule")
            .map_err(|err| ctx.reject(err))?;
        let lifecycle = Lifecycle::new();
        let source = Arc::new(ScheduleSource {
            client: ctx.client.clone(),
            barber_id: session.user_id,
        });
        let dispatcher = ctx.dispatcher(source, lifecycle.token());
        let schedule = Self {
            ctx,
            session,
            dispatcher,
            lifecycle,
        };
        schedule.refresh().await?;
        Ok(schedule)
    }

    pub async fn refresh(&self) -> Result<()> {
        self.dispatcher.refresh().await
    }

    pub fn slots(&self) -> Vec<ScheduleSlot> {
        self.dispatcher.cache().snapshot()
    }

    pub fn rows(&self) -> Vec<ScheduleRow> {
        schedule_rows(&self.slots())
    }

    pub fn is_saving(&self, id: RecordId) -> bool {
        self.dispatcher.is_pending(id)
    }

    /// Flip `active` immediately; reverted if the server refuses.
    pub async fn toggle_active(&self, id: RecordId) -> Result<()> {
        let Some(slot) = self.dispatcher.cache().get(id) else {
            return Err(self.ctx.reject(ValidationError::UnknownRecord(id)));
        };
        let activate = !slot.active;
        self.update(id, ScheduleSlotPatch::active(activate)).await?;
        self.ctx.success(if activate {
            "Schedule slot activated"
        } else {
            "Schedule slot deactivated"
        });
        Ok(())
    }

    pub async fn add(&self, input: SlotInput) -> Result<()> {
        validate_slot(&input).map_err(|err| self.ctx.reject(err))?;
        let body = NewScheduleSlot {
            barber_id: self.session.user_id,
            day_of_week: input.day_of_week,
            start_time: input.start_time,
            end_time: input.end_time,
        };
        self.ctx
            .call(
                self.lifecycle.token(),
                "add schedule slot",
                self.ctx.client.create_slot(&body),
            )
            .await?;
        self.ctx.success("Schedule slot added");
        self.dispatcher.refresh_after_write("add schedule slot").await;
        Ok(())
    }

    /// Replace day and hours of an existing slot, optimistically.
    pub async fn edit(&self, id: RecordId, input: SlotInput) -> Result<()> {
        validate_slot(&input).map_err(|err| self.ctx.reject(err))?;
        let patch = ScheduleSlotPatch {
            day_of_week: Some(input.day_of_week),
            start_time: Some(input.start_time),
            end_time: Some(input.end_time),
            active: None,
        };
        self.update(id, patch).await?;
        self.ctx.success("Schedule slot updated");
        Ok(())
    }

    /// Permanent removal (`DELETE`), not a soft deactivation. The slot
    /// cannot be toggled or edited while the delete is outstanding.
    pub async fn delete(&self, id: RecordId) -> Result<()> {
        let client = self.ctx.client.clone();
        self.dispatcher
            .delete(id, "delete schedule slot", move || async move {
                client.delete_slot(id).await
            })
            .await?;
        self.ctx.success("Schedule slot deleted");
        Ok(())
    }

    /// Ask the server to create its standard week for this barber.
    pub async fn create_defaults(&self) -> Result<()> {
        self.ctx
            .call(
                self.lifecycle.token(),
                "create default schedule",
                self.ctx.client.create_default_schedule(self.session.user_id),
            )
            .await?;
        self.ctx.success("Default schedule created");
        self.dispatcher
            .refresh_after_write("create default schedule")
            .await;
        Ok(())
    }

    async fn update(&self, id: RecordId, patch: ScheduleSlotPatch) -> Result<()> {
        let client = self.ctx.client.clone();
        let body = patch.clone();
        let call = retrying(self.ctx.retry.clone(), move || {
            let client = client.clone();
            let body = body.clone();
            async move { client.update_slot(id, &body).await }
        });
        self.dispatcher.dispatch(id, patch, call).await
    }

    pub fn close(&self) {
        self.lifecycle.close();
    }
}
