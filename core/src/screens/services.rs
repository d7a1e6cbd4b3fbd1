use std::sync::Arc;

use super::{Lifecycle, ScreenContext};
use crate::api::ServicesSource;
use crate::dispatcher::MutationDispatcher;
use crate::error::{Result, ValidationError};
use crate::models::{NewService, Service, ServicePatch};
use crate::record::RecordId;
use crate::retry::retrying;
use crate::session::Session;

#[derive(Debug, Clone, PartialEq)]
pub struct ServiceInput {
    pub name: String,
    pub description: String,
    pub price: f64,
    /// Minutes.
    pub duration: u32,
}

pub fn validate_service(input: &ServiceInput) -> std::result::Result<(), ValidationError> {
    let mut errors = Vec::new();
    if input.name.trim().is_empty() {
        errors.push(ValidationError::invalid("name", "must not be empty"));
    }
    if !input.price.is_finite() || input.price < 0.0 {
        errors.push(ValidationError::invalid(
            "price",
            format!("{} must be zero or more", input.price),
        ));
    }
    if input.duration == 0 {
        errors.push(ValidationError::invalid("duration", "must be at least one minute"));
    }
    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.remove(0)),
        _ => Err(ValidationError::Many(errors)),
    }
}

/// The services a barber offers.
pub struct ServiceCatalog {
    ctx: ScreenContext,
    session: Session,
    dispatcher: MutationDispatcher<Service>,
    lifecycle: Lifecycle,
}

impl ServiceCatalog {
    pub async fn open(ctx: ScreenContext) -> Result<Self> {
        let session = ctx.session()?;
        session
            .require_barber("manage services")
            .map_err(|err| ctx.reject(err))?;
        let lifecycle = Lifecycle::new();
        let source = Arc::new(ServicesSource {
            client: ctx.client.clone(),
            barber_id: session.user_id,
        });
        let dispatcher = ctx.dispatcher(source, lifecycle.token());
        let catalog = Self {
            ctx,
            session,
            dispatcher,
            lifecycle,
        };
        catalog.refresh().await?;
        Ok(catalog)
    }

    pub async fn refresh(&self) -> Result<()> {
        self.dispatcher.refresh().await
    }

    pub fn services(&self) -> Vec<Service> {
        self.dispatcher.cache().snapshot()
    }

    pub async fn add(&self, input: ServiceInput) -> Result<()> {
        validate_service(&input).map_err(|err| self.ctx.reject(err))?;
        let body = NewService {
            name: input.name.trim().to_string(),
            description: input.description.trim().to_string(),
            price: input.price,
            duration: input.duration,
            barber_id: self.session.user_id,
        };
        self.ctx
            .call(
                self.lifecycle.token(),
                "add service",
                self.ctx.client.create_service(&body),
            )
            .await?;
        self.ctx.success("Service added");
        self.dispatcher.refresh_after_write("add service").await;
        Ok(())
    }

    /// Replace every editable field, optimistically.
    pub async fn edit(&self, id: RecordId, input: ServiceInput) -> Result<()> {
        validate_service(&input).map_err(|err| self.ctx.reject(err))?;
        let patch = ServicePatch {
            name: Some(input.name.trim().to_string()),
            description: Some(input.description.trim().to_string()),
            price: Some(input.price),
            duration: Some(input.duration),
            active: None,
        };
        let client = self.ctx.client.clone();
        let body = patch.clone();
        let call = retrying(self.ctx.retry.clone(), move || {
            let client = client.clone();
            let body = body.clone();
            async move { client.update_service(id, &body).await }
        });
        self.dispatcher.dispatch(id, patch, call).await?;
        self.ctx.success("Service updated");
        Ok(())
    }

    /// Hard delete; the service stays locked against edits until it settles.
    pub async fn delete(&self, id: RecordId) -> Result<()> {
        let client = self.ctx.client.clone();
        self.dispatcher
            .delete(id, "delete service", move || async move {
                client.delete_service(id).await
            })
            .await?;
        self.ctx.success("Service deleted");
        Ok(())
    }

    pub fn close(&self) {
        self.lifecycle.close();
    }
}
