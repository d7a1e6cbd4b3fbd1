//! Sign-up: the API's field rules checked locally, so every problem is shown
//! at once before the request is sent. The server re-checks all of them and
//! also enforces email uniqueness.

use crate::api::BookingClient;
use crate::error::{BookingError, Result, ValidationError};
use crate::models::RegisterUser;

const NAME_LEN: std::ops::RangeInclusive<usize> = 3..=50;
const EMAIL_MAX: usize = 100;
const PASSWORD_LEN: std::ops::RangeInclusive<usize> = 8..=20;
const PHONE_MAX: usize = 15;

/// Every rule violated by `form`, or `Ok` when there are none.
pub fn validate(form: &RegisterUser) -> std::result::Result<(), ValidationError> {
    let errors: Vec<ValidationError> = [
        check_name(&form.name),
        check_email(&form.email),
        check_password(&form.password),
        check_confirmation(&form.password, &form.confirm_password),
        check_phone(&form.phone),
    ]
    .into_iter()
    .filter_map(std::result::Result::err)
    .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::Many(errors))
    }
}

/// Validate, trim, and `POST /users`. Returns the server's confirmation.
pub async fn register(client: &BookingClient, form: &RegisterUser) -> Result<String> {
    validate(form)?;
    let body = RegisterUser {
        name: form.name.trim().to_string(),
        email: form.email.trim().to_string(),
        phone: form.phone.trim().to_string(),
        ..form.clone()
    };
    let message = client.register(&body).await.map_err(BookingError::Api)?;
    tracing::info!(email = %body.email, user_type = %body.user_type, "registered");
    Ok(message)
}

/// Letters (Latin-1 accents included) and spaces, 3 to 50 characters.
pub(crate) fn check_name(raw: &str) -> std::result::Result<(), ValidationError> {
    let name = raw.trim();
    let letters_only = name
        .chars()
        .all(|c| c.is_ascii_alphabetic() || ('\u{C0}'..='\u{FF}').contains(&c) || c.is_whitespace());
    if NAME_LEN.contains(&name.chars().count()) && letters_only {
        Ok(())
    } else {
        Err(ValidationError::invalid(
            "name",
            "use only letters, between 3 and 50 characters",
        ))
    }
}

/// `local@domain.tld` shape, at most 100 characters.
pub(crate) fn check_email(raw: &str) -> std::result::Result<(), ValidationError> {
    let email = raw.trim();
    let shaped = email.split_once('@').is_some_and(|(local, domain)| {
        !local.is_empty()
            && !domain.contains('@')
            && domain
                .char_indices()
                .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
    });
    if shaped && email.chars().count() <= EMAIL_MAX {
        Ok(())
    } else {
        Err(ValidationError::invalid("email", "not a valid address"))
    }
}

/// 8 to 20 characters with at least one uppercase letter and one digit.
pub(crate) fn check_password(password: &str) -> std::result::Result<(), ValidationError> {
    let strong = PASSWORD_LEN.contains(&password.chars().count())
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_digit());
    if strong {
        Ok(())
    } else {
        Err(ValidationError::invalid(
            "password",
            "8 to 20 characters with an uppercase letter and a number",
        ))
    }
}

fn check_confirmation(password: &str, confirmation: &str) -> std::result::Result<(), ValidationError> {
    if password == confirmation {
        Ok(())
    } else {
        Err(ValidationError::invalid("confirmPassword", "passwords do not match"))
    }
}

pub(crate) fn check_phone(raw: &str) -> std::result::Result<(), ValidationError> {
    let phone = raw.trim();
    if !phone.is_empty() && phone.chars().count() <= PHONE_MAX {
        Ok(())
    } else {
        Err(ValidationError::invalid("phone", "required, at most 15 characters"))
    }
}
