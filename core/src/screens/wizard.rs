use chrono::NaiveDate;
use serde::Serialize;

use super::{Lifecycle, ScreenContext};
use crate::error::{Result, ValidationError};
use crate::models::{NewAppointment, Service, User};
use crate::record::RecordId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum WizardStep {
    Barber,
    Service,
    DateTime,
    Confirm,
}

/// What the client has picked so far.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BookingSelection {
    pub barber_id: Option<RecordId>,
    pub service_id: Option<RecordId>,
    pub date: Option<NaiveDate>,
    /// `HH:MM`, one of the server's available times.
    pub time: Option<String>,
    pub notes: String,
}

impl BookingSelection {
    /// Names of the required fields still unset.
    pub fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.barber_id.is_none() {
            missing.push("barber");
        }
        if self.service_id.is_none() {
            missing.push("service");
        }
        if self.date.is_none() {
            missing.push("date");
        }
        if self.time.is_none() {
            missing.push("time");
        }
        missing
    }

    /// Local, unzoned `YYYY-MM-DDTHH:MM:00`.
    pub fn appointment_date(&self) -> Option<String> {
        let date = self.date?;
        let time = self.time.as_deref()?;
        Some(format!("{}T{time}:00", date.format("%Y-%m-%d")))
    }
}

/// Barber → service → date/time → confirm.
///
/// Picking a barber clears the service and time; picking a date clears the
/// time. Availability comes from the server and is reloaded whenever the
/// barber or date changes.
pub struct BookingWizard {
    ctx: ScreenContext,
    step: WizardStep,
    barbers: Vec<User>,
    services: Vec<Service>,
    available_times: Vec<String>,
    selection: BookingSelection,
    lifecycle: Lifecycle,
}

impl BookingWizard {
    /// Open the wizard and load the barbers.
    pub async fn open(ctx: ScreenContext) -> Result<Self> {
        ctx.session()?;
        let lifecycle = Lifecycle::new();
        let barbers = ctx
            .call(lifecycle.token(), "load barbers", ctx.client.barbers())
            .await?;
        Ok(Self {
            ctx,
            step: WizardStep::Barber,
            barbers,
            services: Vec::new(),
            available_times: Vec::new(),
            selection: BookingSelection::default(),
            lifecycle,
        })
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn barbers(&self) -> &[User] {
        &self.barbers
    }

    pub fn services(&self) -> &[Service] {
        &self.services
    }

    pub fn available_times(&self) -> &[String] {
        &self.available_times
    }

    pub fn selection(&self) -> &BookingSelection {
        &self.selection
    }

    pub fn selected_barber(&self) -> Option<&User> {
        let id = self.selection.barber_id?;
        self.barbers.iter().find(|b| b.id == id)
    }

    pub fn selected_service(&self) -> Option<&Service> {
        let id = self.selection.service_id?;
        self.services.iter().find(|s| s.id == id)
    }

    pub async fn select_barber(&mut self, barber_id: RecordId) -> Result<()> {
        if !self.barbers.iter().any(|b| b.id == barber_id) {
            return Err(self.ctx.reject(ValidationError::UnknownRecord(barber_id)));
        }
        self.selection.barber_id = Some(barber_id);
        self.selection.service_id = None;
        self.selection.time = None;
        self.services.clear();
        self.available_times.clear();
        self.step = WizardStep::Service;

        self.services = self
            .ctx
            .call(
                self.lifecycle.token(),
                "load services",
                self.ctx.client.services_of(barber_id),
            )
            .await?;
        self.load_times().await
    }

    pub fn select_service(&mut self, service_id: RecordId) -> Result<()> {
        if !self.services.iter().any(|s| s.id == service_id) {
            return Err(self.ctx.reject(ValidationError::UnknownRecord(service_id)));
        }
        self.selection.service_id = Some(service_id);
        self.step = WizardStep::DateTime;
        Ok(())
    }

    /// Dates before `today` are refused.
    pub async fn select_date(&mut self, date: NaiveDate, today: NaiveDate) -> Result<()> {
        if date < today {
            return Err(self
                .ctx
                .reject(ValidationError::PastDate(date.format("%Y-%m-%d").to_string())));
        }
        self.selection.date = Some(date);
        self.selection.time = None;
        self.load_times().await
    }

    pub fn select_time(&mut self, time: &str) -> Result<()> {
        if !self.available_times.iter().any(|t| t == time) {
            return Err(self.ctx.reject(ValidationError::invalid(
                "time",
                format!("{time} is not available"),
            )));
        }
        self.selection.time = Some(time.to_string());
        Ok(())
    }

    pub fn set_notes(&mut self, notes: impl Into<String>) {
        self.selection.notes = notes.into();
    }

    /// Move to the confirmation step once everything is picked.
    pub fn review(&mut self) -> Result<()> {
        let missing = self.selection.missing();
        if !missing.is_empty() {
            return Err(self.ctx.reject(ValidationError::IncompleteBooking(missing)));
        }
        self.step = WizardStep::Confirm;
        Ok(())
    }

    pub fn back(&mut self) {
        self.step = match self.step {
            WizardStep::Barber | WizardStep::Service => WizardStep::Barber,
            WizardStep::DateTime => WizardStep::Service,
            WizardStep::Confirm => WizardStep::DateTime,
        };
    }

    /// `POST /appointments`. The server decides whether the slot is still free.
    pub async fn submit(&self) -> Result<()> {
        let session = self.ctx.session()?;
        let missing = self.selection.missing();
        let (Some(barber_id), Some(service_id), Some(appointment_date)) = (
            self.selection.barber_id,
            self.selection.service_id,
            self.selection.appointment_date(),
        ) else {
            return Err(self.ctx.reject(ValidationError::IncompleteBooking(missing)));
        };
        let body = NewAppointment {
            client_id: session.user_id,
            barber_id,
            service_id,
            appointment_date,
            notes: self.selection.notes.clone(),
        };
        self.ctx
            .call(
                self.lifecycle.token(),
                "book appointment",
                self.ctx.client.create_appointment(&body),
            )
            .await?;
        self.ctx.success("Appointment booked");
        Ok(())
    }

    async fn load_times(&mut self) -> Result<()> {
        let (Some(barber_id), Some(date)) = (self.selection.barber_id, self.selection.date) else {
            return Ok(());
        };
        self.available_times.clear();
        self.available_times = self
            .ctx
            .call(
                self.lifecycle.token(),
                "load available times",
                self.ctx.client.available_times(barber_id, date),
            )
            .await?;
        Ok(())
    }

    pub fn close(&self) {
        self.lifecycle.close();
    }
}
