//! Wire and domain types for the booking API.
//!
//! These are client-side projections of server rows; the server is
//! authoritative for every field.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::record::{Record, RecordId};

/// Account role. Decides which screens and transitions are exposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    Barber,
    Client,
}

impl UserType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::Barber => "barber",
            UserType::Client => "client",
        }
    }
}

impl std::fmt::Display for UserType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for UserType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "barber" => Ok(UserType::Barber),
            "client" => Ok(UserType::Client),
            other => Err(format!("unknown user type '{other}'")),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Appointments
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Scheduled,
    Completed,
    Cancelled,
}

/// A transition the UI exposes on an appointment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppointmentAction {
    Cancel,
    Complete,
}

impl AppointmentAction {
    pub fn target_status(self) -> AppointmentStatus {
        match self {
            AppointmentAction::Cancel => AppointmentStatus::Cancelled,
            AppointmentAction::Complete => AppointmentStatus::Completed,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AppointmentAction::Cancel => "cancel",
            AppointmentAction::Complete => "complete",
        }
    }
}

impl AppointmentStatus {
    /// Transitions offered for an appointment in this status to `role`.
    ///
    /// `completed` and `cancelled` are terminal: nothing is offered.
    pub fn available_actions(self, role: UserType) -> &'static [AppointmentAction] {
        match (self, role) {
            (AppointmentStatus::Scheduled, UserType::Barber) => {
                &[AppointmentAction::Complete, AppointmentAction::Cancel]
            }
            (AppointmentStatus::Scheduled, UserType::Client) => &[AppointmentAction::Cancel],
            (AppointmentStatus::Completed | AppointmentStatus::Cancelled, _) => &[],
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, AppointmentStatus::Scheduled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "scheduled",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: RecordId,
    pub client_name: String,
    pub barber_name: String,
    pub service_name: String,
    pub service_price: f64,
    #[serde(with = "wire_datetime")]
    pub appointment_date: NaiveDateTime,
    #[serde(with = "wire_datetime")]
    pub end_time: NaiveDateTime,
    pub status: AppointmentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Partial update of an appointment, also the `PUT /appointments/{id}` body.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AppointmentPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AppointmentStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<Option<String>>,
}

impl AppointmentPatch {
    pub fn status(status: AppointmentStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }
}

impl Record for Appointment {
    type Patch = AppointmentPatch;
    type SortKey = (NaiveDateTime, RecordId);

    fn id(&self) -> RecordId {
        self.id
    }

    fn sort_key(&self) -> Self::SortKey {
        (self.appointment_date, self.id)
    }

    fn apply(&mut self, patch: &AppointmentPatch) {
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(notes) = &patch.notes {
            self.notes.clone_from(notes);
        }
    }

    fn pre_image(&self, patch: &AppointmentPatch) -> AppointmentPatch {
        AppointmentPatch {
            status: patch.status.map(|_| self.status),
            notes: patch.notes.as_ref().map(|_| self.notes.clone()),
        }
    }

    fn describe(patch: &AppointmentPatch) -> String {
        match patch.status {
            Some(AppointmentStatus::Cancelled) => "cancel appointment".to_string(),
            Some(AppointmentStatus::Completed) => "complete appointment".to_string(),
            Some(AppointmentStatus::Scheduled) => "reopen appointment".to_string(),
            None => "update appointment".to_string(),
        }
    }
}

/// Body of `POST /appointments`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewAppointment {
    pub client_id: RecordId,
    pub barber_id: RecordId,
    pub service_id: RecordId,
    /// `YYYY-MM-DDTHH:MM:SS`, local time.
    pub appointment_date: String,
    pub notes: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Weekly schedule
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleSlot {
    pub id: RecordId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub barber_id: Option<RecordId>,
    /// 0 = Monday … 6 = Sunday.
    pub day_of_week: u8,
    /// `HH:MM`
    pub start_time: String,
    /// `HH:MM`
    pub end_time: String,
    #[serde(default = "default_true")]
    pub active: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScheduleSlotPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day_of_week: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

impl ScheduleSlotPatch {
    pub fn active(active: bool) -> Self {
        Self {
            active: Some(active),
            ..Default::default()
        }
    }
}

impl Record for ScheduleSlot {
    type Patch = ScheduleSlotPatch;
    type SortKey = (u8, String, RecordId);

    fn id(&self) -> RecordId {
        self.id
    }

    fn sort_key(&self) -> Self::SortKey {
        (self.day_of_week, self.start_time.clone(), self.id)
    }

    fn apply(&mut self, patch: &ScheduleSlotPatch) {
        if let Some(day) = patch.day_of_week {
            self.day_of_week = day;
        }
        if let Some(start) = &patch.start_time {
            self.start_time.clone_from(start);
        }
        if let Some(end) = &patch.end_time {
            self.end_time.clone_from(end);
        }
        if let Some(active) = patch.active {
            self.active = active;
        }
    }

    fn pre_image(&self, patch: &ScheduleSlotPatch) -> ScheduleSlotPatch {
        ScheduleSlotPatch {
            day_of_week: patch.day_of_week.map(|_| self.day_of_week),
            start_time: patch.start_time.as_ref().map(|_| self.start_time.clone()),
            end_time: patch.end_time.as_ref().map(|_| self.end_time.clone()),
            active: patch.active.map(|_| self.active),
        }
    }

    fn describe(patch: &ScheduleSlotPatch) -> String {
        let only_active = patch.day_of_week.is_none()
            && patch.start_time.is_none()
            && patch.end_time.is_none();
        match (patch.active, only_active) {
            (Some(true), true) => "activate schedule slot".to_string(),
            (Some(false), true) => "deactivate schedule slot".to_string(),
            _ => "update schedule slot".to_string(),
        }
    }
}

/// Body of `POST /schedules`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewScheduleSlot {
    pub barber_id: RecordId,
    pub day_of_week: u8,
    pub start_time: String,
    pub end_time: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Services
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    /// Minutes.
    pub duration: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub barber_id: Option<RecordId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub barber_name: Option<String>,
    #[serde(default = "default_true")]
    pub active: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ServicePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

impl Record for Service {
    type Patch = ServicePatch;
    type SortKey = (String, RecordId);

    fn id(&self) -> RecordId {
        self.id
    }

    fn sort_key(&self) -> Self::SortKey {
        (self.name.to_lowercase(), self.id)
    }

    fn apply(&mut self, patch: &ServicePatch) {
        if let Some(name) = &patch.name {
            self.name.clone_from(name);
        }
        if let Some(description) = &patch.description {
            self.description.clone_from(description);
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
        if let Some(duration) = patch.duration {
            self.duration = duration;
        }
        if let Some(active) = patch.active {
            self.active = active;
        }
    }

    fn pre_image(&self, patch: &ServicePatch) -> ServicePatch {
        ServicePatch {
            name: patch.name.as_ref().map(|_| self.name.clone()),
            description: patch.description.as_ref().map(|_| self.description.clone()),
            price: patch.price.map(|_| self.price),
            duration: patch.duration.map(|_| self.duration),
            active: patch.active.map(|_| self.active),
        }
    }

    fn describe(_patch: &ServicePatch) -> String {
        "update service".to_string()
    }
}

/// Body of `POST /services`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewService {
    pub name: String,
    pub description: String,
    pub price: f64,
    pub duration: u32,
    pub barber_id: RecordId,
}

// ─────────────────────────────────────────────────────────────────────────────
// Users
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: RecordId,
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(rename = "type")]
    pub user_type: UserType,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// Cacheable part of a profile change. The password never enters the cache.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UserPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<Option<String>>,
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.avatar_url.is_none()
    }
}

impl Record for User {
    type Patch = UserPatch;
    type SortKey = RecordId;

    fn id(&self) -> RecordId {
        self.id
    }

    fn sort_key(&self) -> RecordId {
        self.id
    }

    fn apply(&mut self, patch: &UserPatch) {
        if let Some(name) = &patch.name {
            self.name.clone_from(name);
        }
        if let Some(email) = &patch.email {
            self.email.clone_from(email);
        }
        if let Some(phone) = &patch.phone {
            self.phone.clone_from(phone);
        }
        if let Some(avatar) = &patch.avatar_url {
            self.avatar_url.clone_from(avatar);
        }
    }

    fn pre_image(&self, patch: &UserPatch) -> UserPatch {
        UserPatch {
            name: patch.name.as_ref().map(|_| self.name.clone()),
            email: patch.email.as_ref().map(|_| self.email.clone()),
            phone: patch.phone.as_ref().map(|_| self.phone.clone()),
            avatar_url: patch.avatar_url.as_ref().map(|_| self.avatar_url.clone()),
        }
    }

    fn describe(_patch: &UserPatch) -> String {
        "update profile".to_string()
    }
}

/// Body of `PUT /users/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpdateUserRequest {
    #[serde(flatten)]
    pub fields: UserPatch,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// Body of `POST /users`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisterUser {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(rename = "confirmPassword")]
    pub confirm_password: String,
    pub phone: String,
    #[serde(rename = "type")]
    pub user_type: UserType,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    #[serde(default)]
    pub user: Option<User>,
}

fn default_true() -> bool {
    true
}

/// Date-times on the wire are local and unzoned (`2025-03-01T14:30:00`).
/// Some deployments answer with RFC 3339 or a space separator; accept all.
pub(crate) mod wire_datetime {
    use chrono::{DateTime, NaiveDateTime};
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&value.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(d)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid date-time '{raw}'")))
    }

    pub fn parse(raw: &str) -> Option<NaiveDateTime> {
        let raw = raw.trim();
        if let Ok(zoned) = DateTime::parse_from_rfc3339(raw) {
            return Some(zoned.naive_local());
        }
        ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
    }
}
