//! Form validation. Each validator either returns the cleaned values or an
//! [`AppError::Validation`] listing every failing field.

use warbler_types::api::{
    EditProfileForm, FieldError, FormKind, LoginForm, MessageForm, SignupForm,
};

use crate::error::AppError;

pub const USERNAME_MAX: usize = 30;
pub const EMAIL_MAX: usize = 50;
pub const PASSWORD_MIN: usize = 6;
pub const MESSAGE_MAX: usize = 140;
pub const LOCATION_MAX: usize = 30;
pub const URL_MAX: usize = 255;

pub(crate) struct ValidSignup {
    pub username: String,
    pub email: String,
    pub password: String,
    pub image_url: Option<String>,
}

pub(crate) struct ValidProfile {
    pub username: String,
    pub email: String,
    pub image_url: Option<String>,
    pub header_image_url: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub password: String,
}

pub(crate) fn validate_signup(form: &SignupForm) -> Result<ValidSignup, AppError> {
    let mut errors = Vec::new();
    let username = check_username(&form.username, &mut errors);
    let email = check_email(&form.email, &mut errors);
    check_password(&form.password, &mut errors);
    let image_url = check_url("image_url", &form.image_url, &mut errors);

    finish(FormKind::Signup, errors)?;
    Ok(ValidSignup {
        username,
        email,
        password: form.password.clone(),
        image_url,
    })
}

pub(crate) fn validate_login(form: &LoginForm) -> Result<(), AppError> {
    let mut errors = Vec::new();
    if form.username.trim().is_empty() {
        errors.push(FieldError::field("username", "This field is required."));
    }
    check_password(&form.password, &mut errors);
    finish(FormKind::Login, errors)
}

/// Returns the trimmed message text.
pub(crate) fn validate_message(form: &MessageForm) -> Result<String, AppError> {
    let text = form.text.trim();
    let mut errors = Vec::new();
    if text.is_empty() {
        errors.push(FieldError::field("text", "This field is required."));
    } else if text.chars().count() > MESSAGE_MAX {
        errors.push(FieldError::field(
            "text",
            format!("Messages are limited to {MESSAGE_MAX} characters."),
        ));
    }
    finish(FormKind::NewMessage, errors)?;
    Ok(text.to_string())
}

pub(crate) fn validate_profile(form: &EditProfileForm) -> Result<ValidProfile, AppError> {
    let mut errors = Vec::new();
    let username = check_username(&form.username, &mut errors);
    let email = check_email(&form.email, &mut errors);
    check_password(&form.password, &mut errors);
    let image_url = check_url("image_url", &form.image_url, &mut errors);
    let header_image_url = check_url("header_image_url", &form.header_image_url, &mut errors);
    let location = optional(&form.location);
    if location.as_deref().is_some_and(|l| l.chars().count() > LOCATION_MAX) {
        errors.push(FieldError::field(
            "location",
            format!("Location is limited to {LOCATION_MAX} characters."),
        ));
    }

    finish(FormKind::EditProfile, errors)?;
    Ok(ValidProfile {
        username,
        email,
        image_url,
        header_image_url,
        bio: optional(&form.bio),
        location,
        password: form.password.clone(),
    })
}

/// Only same-site paths that fit in a `Location` header are followed;
/// anything else goes home.
pub(crate) fn safe_redirect(location: &str) -> &str {
    if location.starts_with('/')
        && !location.starts_with("//")
        && !location.contains('\\')
        && !location.chars().any(char::is_control)
    {
        location
    } else {
        "/"
    }
}

fn finish(form: FormKind, errors: Vec<FieldError>) -> Result<(), AppError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::invalid(form, errors))
    }
}

fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn check_username(raw: &str, errors: &mut Vec<FieldError>) -> String {
    let username = raw.trim();
    if username.is_empty() {
        errors.push(FieldError::field("username", "This field is required."));
    } else if username.chars().count() > USERNAME_MAX {
        errors.push(FieldError::field(
            "username",
            format!("Usernames are limited to {USERNAME_MAX} characters."),
        ));
    }
    username.to_string()
}

fn check_email(raw: &str, errors: &mut Vec<FieldError>) -> String {
    let email = raw.trim();
    if email.is_empty() {
        errors.push(FieldError::field("email", "This field is required."));
    } else if !looks_like_email(email) {
        errors.push(FieldError::field("email", "Invalid email address."));
    } else if email.chars().count() > EMAIL_MAX {
        errors.push(FieldError::field(
            "email",
            format!("Emails are limited to {EMAIL_MAX} characters."),
        ));
    }
    email.to_string()
}

fn check_password(password: &str, errors: &mut Vec<FieldError>) {
    if password.chars().count() < PASSWORD_MIN {
        errors.push(FieldError::field(
            "password",
            format!("Field must be at least {PASSWORD_MIN} characters long."),
        ));
    }
}

fn check_url(field: &str, raw: &str, errors: &mut Vec<FieldError>) -> Option<String> {
    let url = optional(raw)?;
    if url.len() > URL_MAX {
        errors.push(FieldError::field(field, format!("URLs are limited to {URL_MAX} bytes.")));
    }
    Some(url)
}

fn looks_like_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}
