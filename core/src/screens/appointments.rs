use std::sync::Arc;

use chrono::NaiveDateTime;

use super::{Lifecycle, ScreenContext};
use crate::api::AppointmentsSource;
use crate::dispatcher::MutationDispatcher;
use crate::error::{Result, ValidationError};
use crate::models::{Appointment, AppointmentAction, AppointmentPatch, UserType};
use crate::record::RecordId;
use crate::retry::retrying;
use crate::view::{AppointmentPartition, partition_appointments};

/// "My appointments": the session user's bookings, split into upcoming and
/// the rest, with cancel/complete applied optimistically.
pub struct AppointmentBook {
    ctx: ScreenContext,
    role: UserType,
    dispatcher: MutationDispatcher<Appointment>,
    lifecycle: Lifecycle,
}

impl AppointmentBook {
    /// Open the screen and load the user's appointments.
    pub async fn open(ctx: ScreenContext) -> Result<Self> {
        let session = ctx.session()?;
        let lifecycle = Lifecycle::new();
        let source = Arc::new(AppointmentsSource {
            client: ctx.client.clone(),
            user_id: session.user_id,
        });
        let dispatcher = ctx.dispatcher(source, lifecycle.token());
        let book = Self {
            ctx,
            role: session.user_type,
            dispatcher,
            lifecycle,
        };
        book.refresh().await?;
        Ok(book)
    }

    pub async fn refresh(&self) -> Result<()> {
        self.dispatcher.refresh().await
    }

    /// Chronological copy of every appointment.
    pub fn appointments(&self) -> Vec<Appointment> {
        self.dispatcher.cache().snapshot()
    }

    pub fn view(&self, now: NaiveDateTime) -> AppointmentPartition {
        partition_appointments(&self.appointments(), now)
    }

    /// Transitions the UI may offer for `id`; empty for terminal statuses,
    /// unknown ids, and while a change to `id` is being saved.
    pub fn actions_for(&self, id: RecordId) -> &'static [AppointmentAction] {
        if self.dispatcher.is_pending(id) {
            return &[];
        }
        self.dispatcher
            .cache()
            .get(id)
            .map(|a| a.status.available_actions(self.role))
            .unwrap_or(&[])
    }

    pub fn is_saving(&self, id: RecordId) -> bool {
        self.dispatcher.is_pending(id)
    }

    pub async fn cancel(&self, id: RecordId) -> Result<()> {
        self.transition(id, AppointmentAction::Cancel).await
    }

    /// Barbers only.
    pub async fn complete(&self, id: RecordId) -> Result<()> {
        self.transition(id, AppointmentAction::Complete).await
    }

    async fn transition(&self, id: RecordId, action: AppointmentAction) -> Result<()> {
        let Some(appointment) = self.dispatcher.cache().get(id) else {
            return Err(self.ctx.reject(ValidationError::UnknownRecord(id)));
        };
        if !appointment
            .status
            .available_actions(self.role)
            .contains(&action)
        {
            return Err(self.ctx.reject(ValidationError::TransitionNotAllowed {
                action: action.label(),
                status: appointment.status.as_str(),
            }));
        }

        let patch = AppointmentPatch::status(action.target_status());
        let client = self.ctx.client.clone();
        let body = patch.clone();
        let call = retrying(self.ctx.retry.clone(), move || {
            let client = client.clone();
            let body = body.clone();
            async move { client.update_appointment(id, &body).await }
        });

        self.dispatcher.dispatch(id, patch, call).await?;
        self.ctx.success(match action {
            AppointmentAction::Cancel => "Appointment cancelled",
            AppointmentAction::Complete => "Appointment marked as completed",
        });
        Ok(())
    }

    /// Cancel in-flight work. Also happens on drop.
    pub fn close(&self) {
        self.lifecycle.close();
    }
}
