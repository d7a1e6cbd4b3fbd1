//! Typed calls for every route of the booking API.

use std::time::Duration;

use chrono::NaiveDate;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use super::{ApiError, ApiResult};
use crate::models::{
    Appointment, AppointmentPatch, LoginRequest, LoginResponse, NewAppointment, NewScheduleSlot,
    NewService, RegisterUser, ScheduleSlot, ScheduleSlotPatch, Service, ServicePatch,
    UpdateUserRequest, User,
};
use crate::record::RecordId;
use crate::retry::{RetryConfig, execute_with_backoff};
use crate::session::Session;

const X_USER_ID: &str = "x-user-id";
const X_USER_TYPE: &str = "x-user-type";

/// Shape of non-2xx bodies: `{"error": ".."}` or `{"errors": [..]}`.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    errors: Vec<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct MessageBody {
    #[serde(default)]
    message: Option<String>,
}

/// HTTP client for the booking API.
///
/// Cheap to clone; clones share the connection pool. Reads (`GET`) retry
/// transient failures with the configured backoff, writes are sent once
/// unless wrapped with [`crate::retry::retrying`].
#[derive(Debug, Clone)]
pub struct BookingClient {
    http: reqwest::Client,
    base: Url,
    session: Option<Session>,
    retry: RetryConfig,
}

impl BookingClient {
    /// Client for `api_url` with a per-request timeout.
    pub fn new(api_url: &str, request_timeout: Duration) -> ApiResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .user_agent(concat!("barber/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Self::with_http(http, api_url)
    }

    /// Use a preconfigured HTTP client. Useful for tests.
    pub fn with_http(http: reqwest::Client, api_url: &str) -> ApiResult<Self> {
        Ok(Self {
            http,
            base: base_url(api_url)?,
            session: None,
            retry: RetryConfig::default(),
        })
    }

    pub fn with_session(mut self, session: Session) -> Self {
        self.session = Some(session);
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    // ── Accounts ────────────────────────────────────────────────────────────

    /// `POST /users`. Returns the server's confirmation message.
    pub async fn register(&self, user: &RegisterUser) -> ApiResult<String> {
        let route = "users";
        let builder = self.request(Method::POST, route)?.json(user);
        let body: MessageBody = self.send_json(route, builder).await?;
        Ok(body.message.unwrap_or_default())
    }

    /// `POST /auth/login`. Falls back to `GET /users/me` when the login
    /// response does not embed the user.
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<Session> {
        let route = "auth/login";
        let builder = self
            .request(Method::POST, route)?
            .json(&LoginRequest { email, password });
        let response: LoginResponse = self.send_json(route, builder).await?;
        let user = match response.user {
            Some(user) => user,
            None => {
                let builder = self
                    .request(Method::GET, "users/me")?
                    .bearer_auth(&response.token);
                self.send_json("users/me", builder).await?
            }
        };
        tracing::info!(user_id = user.id, user_type = %user.user_type, "logged in");
        Ok(Session::new(response.token, &user))
    }

    /// `GET /users/me`
    pub async fn current_user(&self) -> ApiResult<User> {
        self.get_json("users/me".to_string()).await
    }

    /// `PUT /users/{id}`
    pub async fn update_user(&self, id: RecordId, body: &UpdateUserRequest) -> ApiResult<()> {
        self.write(Method::PUT, format!("users/{id}"), Some(body)).await
    }

    /// `GET /barbers`
    pub async fn barbers(&self) -> ApiResult<Vec<User>> {
        self.get_json("barbers".to_string()).await
    }

    // ── Services ────────────────────────────────────────────────────────────

    /// `GET /services/barber/{barber_id}`
    pub async fn services_of(&self, barber_id: RecordId) -> ApiResult<Vec<Service>> {
        self.get_json(format!("services/barber/{barber_id}")).await
    }

    /// `POST /services`
    pub async fn create_service(&self, body: &NewService) -> ApiResult<()> {
        self.write(Method::POST, "services".to_string(), Some(body)).await
    }

    /// `PUT /services/{id}`
    pub async fn update_service(&self, id: RecordId, patch: &ServicePatch) -> ApiResult<()> {
        self.write(Method::PUT, format!("services/{id}"), Some(patch)).await
    }

    /// `DELETE /services/{id}`
    pub async fn delete_service(&self, id: RecordId) -> ApiResult<()> {
        self.write::<()>(Method::DELETE, format!("services/{id}"), None)
            .await
    }

    // ── Weekly schedule ─────────────────────────────────────────────────────

    /// `GET /schedules/barber/{barber_id}`
    pub async fn schedule_of(&self, barber_id: RecordId) -> ApiResult<Vec<ScheduleSlot>> {
        self.get_json(format!("schedules/barber/{barber_id}")).await
    }

    /// `POST /schedules`
    pub async fn create_slot(&self, body: &NewScheduleSlot) -> ApiResult<()> {
        self.write(Method::POST, "schedules".to_string(), Some(body)).await
    }

    /// `PUT /schedules/{id}`
    pub async fn update_slot(&self, id: RecordId, patch: &ScheduleSlotPatch) -> ApiResult<()> {
        self.write(Method::PUT, format!("schedules/{id}"), Some(patch)).await
    }

    /// `DELETE /schedules/{id}`
    pub async fn delete_slot(&self, id: RecordId) -> ApiResult<()> {
        self.write::<()>(Method::DELETE, format!("schedules/{id}"), None)
            .await
    }

    /// `POST /schedules/barber/{barber_id}/default`
    pub async fn create_default_schedule(&self, barber_id: RecordId) -> ApiResult<()> {
        self.write::<()>(
            Method::POST,
            format!("schedules/barber/{barber_id}/default"),
            None,
        )
        .await
    }

    // ── Appointments ────────────────────────────────────────────────────────

    /// `GET /appointments/user/{user_id}`
    pub async fn appointments_of(&self, user_id: RecordId) -> ApiResult<Vec<Appointment>> {
        self.get_json(format!("appointments/user/{user_id}")).await
    }

    /// `POST /appointments`
    pub async fn create_appointment(&self, body: &NewAppointment) -> ApiResult<()> {
        self.write(Method::POST, "appointments".to_string(), Some(body))
            .await
    }

    /// `PUT /appointments/{id}` with only the changed fields.
    pub async fn update_appointment(&self, id: RecordId, patch: &AppointmentPatch) -> ApiResult<()> {
        self.write(Method::PUT, format!("appointments/{id}"), Some(patch))
            .await
    }

    /// `GET /availability/{barber_id}?date=YYYY-MM-DD` → `["HH:MM", ..]`
    pub async fn available_times(
        &self,
        barber_id: RecordId,
        date: NaiveDate,
    ) -> ApiResult<Vec<String>> {
        self.get_json(format!(
            "availability/{barber_id}?date={}",
            date.format("%Y-%m-%d")
        ))
        .await
    }

    // ── Plumbing ────────────────────────────────────────────────────────────

    fn url(&self, route: &str) -> ApiResult<Url> {
        self.base
            .join(route)
            .map_err(|err| ApiError::InvalidUrl(format!("{route}: {err}")))
    }

    /// Unauthenticated request.
    fn request(&self, method: Method, route: &str) -> ApiResult<RequestBuilder> {
        Ok(self.http.request(method, self.url(route)?))
    }

    /// Request carrying the session headers. The only place they are set.
    fn authed(&self, method: Method, route: &str) -> ApiResult<RequestBuilder> {
        let session = self.session.as_ref().ok_or(ApiError::NotAuthenticated)?;
        Ok(self.request(method, route)?.headers(session_headers(session)?))
    }

    async fn get_json<T: DeserializeOwned>(&self, route: String) -> ApiResult<T> {
        let route = route.as_str();
        execute_with_backoff(
            || async move {
                let builder = self.authed(Method::GET, route)?;
                self.send_json(route, builder).await
            },
            &self.retry,
        )
        .await
    }

    async fn write<B: Serialize + ?Sized>(
        &self,
        method: Method,
        route: String,
        body: Option<&B>,
    ) -> ApiResult<()> {
        let mut builder = self.authed(method.clone(), &route)?;
        if let Some(body) = body {
            builder = builder.json(body);
        }
        let response = checked(builder.send().await?).await?;
        tracing::debug!(%method, route = %route, status = response.status().as_u16(), "write accepted");
        Ok(())
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        route: &str,
        builder: RequestBuilder,
    ) -> ApiResult<T> {
        let response = checked(builder.send().await?).await?;
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|err| ApiError::Decode {
            route: route.to_string(),
            reason: err.to_string(),
        })
    }
}

/// Ensure the base ends with `/` so relative routes join under it.
fn base_url(raw: &str) -> ApiResult<Url> {
    let mut raw = raw.trim().to_string();
    if !raw.ends_with('/') {
        raw.push('/');
    }
    let url = Url::parse(&raw).map_err(|err| ApiError::InvalidUrl(format!("{raw}: {err}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ApiError::InvalidUrl(format!(
            "{raw}: unsupported scheme '{other}'"
        ))),
    }
}

fn session_headers(session: &Session) -> ApiResult<HeaderMap> {
    let mut headers = HeaderMap::new();
    let bearer = HeaderValue::from_str(&format!("Bearer {}", session.token))
        .map_err(|_| ApiError::InvalidHeader("Authorization"))?;
    headers.insert(AUTHORIZATION, bearer);
    headers.insert(X_USER_ID, HeaderValue::from(session.user_id));
    headers.insert(
        X_USER_TYPE,
        HeaderValue::from_static(session.user_type.as_str()),
    );
    Ok(headers)
}

/// Turn a non-2xx response into [`ApiError::Api`] with the server's message.
async fn checked(response: Response) -> ApiResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response.text().await.unwrap_or_default();
    let body: ErrorBody = serde_json::from_str(&text).unwrap_or_default();
    let message = if let Some(error) = body.error {
        error
    } else if !body.errors.is_empty() {
        body.errors.join("; ")
    } else if let Some(message) = body.message {
        message
    } else if !text.trim().is_empty() {
        text.trim().to_string()
    } else {
        status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string()
    };
    Err(ApiError::Api {
        status: status.as_u16(),
        message,
    })
}
