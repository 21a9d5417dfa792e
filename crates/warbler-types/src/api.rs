use serde::{Deserialize, Serialize};

use crate::models::MessageView;

// -- Forms --
//
// Fields default to empty so a missing field surfaces as a validation
// error on that field rather than a body rejection.

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SignupForm {
    pub username: String,
    pub password: String,
    pub email: String,
    pub image_url: String,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageForm {
    pub text: String,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EditProfileForm {
    pub username: String,
    pub email: String,
    pub image_url: String,
    pub header_image_url: String,
    pub bio: String,
    pub location: String,
    /// Current password, required to confirm the change.
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LikeForm {
    pub message_id: i64,
    /// Where to send the browser afterwards. Only local paths are honoured.
    #[serde(default)]
    pub redirect_loc: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct UserSearch {
    pub q: Option<String>,
}

// -- Form views --

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormKind {
    Signup,
    Login,
    EditProfile,
    NewMessage,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// `None` for errors that concern the whole form.
    pub field: Option<String>,
    pub message: String,
}

impl FieldError {
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: Some(field.to_string()),
            message: message.into(),
        }
    }

    pub fn form(message: impl Into<String>) -> Self {
        Self {
            field: None,
            message: message.into(),
        }
    }
}

/// A form as it would be presented to the user, with any errors from the
/// last submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormView {
    pub form: FormKind,
    pub errors: Vec<FieldError>,
}

impl FormView {
    pub fn blank(form: FormKind) -> Self {
        Self {
            form,
            errors: vec![],
        }
    }

    pub fn with_errors(form: FormKind, errors: Vec<FieldError>) -> Self {
        Self { form, errors }
    }
}

/// Prefilled values for the profile edit form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditProfileView {
    pub form: FormKind,
    pub username: String,
    pub email: String,
    pub image_url: String,
    pub header_image_url: String,
    pub bio: Option<String>,
    pub location: Option<String>,
}

// -- JSON API --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LikeResponse {
    pub message: MessageView,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
