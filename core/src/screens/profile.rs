use std::sync::Arc;

use super::{Lifecycle, ScreenContext};
use crate::api::ProfileSource;
use crate::dispatcher::MutationDispatcher;
use crate::error::{Result, ValidationError};
use crate::models::{UpdateUserRequest, User, UserPatch};
use crate::registration::{check_email, check_password, check_phone};
use crate::retry::retrying;

/// The profile form as the user left it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    /// Blank keeps the current password.
    pub password: String,
    /// `None` means no custom avatar.
    pub avatar_url: Option<String>,
}

impl ProfileForm {
    /// Form prefilled with the current profile.
    pub fn from_user(user: &User) -> Self {
        Self {
            name: user.name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            password: String::new(),
            avatar_url: user.avatar_url.clone(),
        }
    }
}

/// Fields of `form` that differ from `user`. Blank text fields are ignored
/// rather than clearing the value; the password is never compared.
pub fn profile_changes(user: &User, form: &ProfileForm) -> UpdateUserRequest {
    fn changed(current: &str, typed: &str) -> Option<String> {
        let typed = typed.trim();
        (!typed.is_empty() && typed != current).then(|| typed.to_string())
    }

    let avatar = form
        .avatar_url
        .as_deref()
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .map(str::to_string);
    UpdateUserRequest {
        fields: UserPatch {
            name: changed(&user.name, &form.name),
            email: changed(&user.email, &form.email),
            phone: changed(&user.phone, &form.phone),
            avatar_url: (avatar != user.avatar_url).then_some(avatar),
        },
        password: (!form.password.trim().is_empty()).then(|| form.password.clone()),
    }
}

/// Edit the logged-in user's own profile. The profile is held as a
/// one-record cache so a refused save puts the old values back.
pub struct ProfileEditor {
    ctx: ScreenContext,
    dispatcher: MutationDispatcher<User>,
    lifecycle: Lifecycle,
}

impl ProfileEditor {
    pub async fn open(ctx: ScreenContext) -> Result<Self> {
        ctx.session()?;
        let lifecycle = Lifecycle::new();
        let source = Arc::new(ProfileSource {
            client: ctx.client.clone(),
        });
        let dispatcher = ctx.dispatcher(source, lifecycle.token());
        let editor = Self {
            ctx,
            dispatcher,
            lifecycle,
        };
        editor.dispatcher.refresh().await?;
        Ok(editor)
    }

    pub fn profile(&self) -> Option<User> {
        self.dispatcher.cache().snapshot().into_iter().next()
    }

    pub fn form(&self) -> Option<ProfileForm> {
        self.profile().as_ref().map(ProfileForm::from_user)
    }

    /// Send only what changed. Nothing changed is a `NoChanges` warning.
    pub async fn save(&self, form: &ProfileForm) -> Result<()> {
        let Some(user) = self.profile() else {
            return Err(self.ctx.reject(ValidationError::MissingSession));
        };
        let request = profile_changes(&user, form);
        if request.fields.is_empty() && request.password.is_none() {
            return Err(self.ctx.reject(ValidationError::NoChanges));
        }
        self.check(&request).map_err(|err| self.ctx.reject(err))?;

        let id = user.id;
        let client = self.ctx.client.clone();
        let body = request.clone();
        let call = retrying(self.ctx.retry.clone(), move || {
            let client = client.clone();
            let body = body.clone();
            async move { client.update_user(id, &body).await }
        });
        self.dispatcher.dispatch(id, request.fields, call).await?;
        self.ctx.success("Profile updated");
        Ok(())
    }

    fn check(&self, request: &UpdateUserRequest) -> std::result::Result<(), ValidationError> {
        let errors: Vec<ValidationError> = [
            request.fields.email.as_deref().map(check_email),
            request.fields.phone.as_deref().map(check_phone),
            request.password.as_deref().map(check_password),
        ]
        .into_iter()
        .flatten()
        .filter_map(std::result::Result::err)
        .collect();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::Many(errors))
        }
    }

    pub fn close(&self) {
        self.lifecycle.close();
    }
}
