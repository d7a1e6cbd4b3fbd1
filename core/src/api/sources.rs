//! Server collections the screens mirror into an [`EntityCache`].
//!
//! [`EntityCache`]: crate::cache::EntityCache

use async_trait::async_trait;

use super::{ApiResult, BookingClient};
use crate::cache::RecordSource;
use crate::models::{Appointment, ScheduleSlot, Service, User};
use crate::record::RecordId;

/// `GET /appointments/user/{user_id}`
pub struct AppointmentsSource {
    pub client: BookingClient,
    pub user_id: RecordId,
}

#[async_trait]
impl RecordSource<Appointment> for AppointmentsSource {
    fn collection(&self) -> &'static str {
        "appointments"
    }

    async fn fetch_all(&self) -> ApiResult<Vec<Appointment>> {
        self.client.appointments_of(self.user_id).await
    }
}

/// `GET /schedules/barber/{barber_id}`
pub struct ScheduleSource {
    pub client: BookingClient,
    pub barber_id: RecordId,
}

#[async_trait]
impl RecordSource<ScheduleSlot> for ScheduleSource {
    fn collection(&self) -> &'static str {
        "schedule"
    }

    async fn fetch_all(&self) -> ApiResult<Vec<ScheduleSlot>> {
        self.client.schedule_of(self.barber_id).await
    }
}

/// `GET /services/barber/{barber_id}`
pub struct ServicesSource {
    pub client: BookingClient,
    pub barber_id: RecordId,
}

#[async_trait]
impl RecordSource<Service> for ServicesSource {
    fn collection(&self) -> &'static str {
        "services"
    }

    async fn fetch_all(&self) -> ApiResult<Vec<Service>> {
        self.client.services_of(self.barber_id).await
    }
}

/// The logged-in user as a one-record collection, so profile edits can be
/// dispatched and reverted like any other record.
pub struct ProfileSource {
    pub client: BookingClient,
}

#[async_trait]
impl RecordSource<User> for ProfileSource {
    fn collection(&self) -> &'static str {
        "profile"
    }

    async fn fetch_all(&self) -> ApiResult<Vec<User>> {
        Ok(vec![self.client.current_user().await?])
    }
}
