//! User form (admin-managed).
//!
//! Password and confirmation fields belong to the external authentication
//! flow; this form only manages the email address.

use crate::forms::base::{FormPayload, RecordForm, ValidationErrors};
use crate::model::user::User;

const EMAIL_MAX_CHARS: usize = 255;

/// Submitted fields for updating a user. Wire field name: `Email`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserForm {
    pub email: String,
}

impl RecordForm for UserForm {
    type Record = User;

    fn from_payload(payload: &FormPayload) -> Self {
        Self {
            email: payload.get("Email").unwrap_or_default().trim().to_string(),
        }
    }

    fn load(record: &User) -> Self {
        Self {
            email: record.email.clone(),
        }
    }

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        if self.email.is_empty() {
            errors.push("Email", "email is required");
        } else if !self.email.contains('@') {
            errors.push("Email", "email must contain `@`");
        }
        if self.email.chars().count() > EMAIL_MAX_CHARS {
            errors.push(
                "Email",
                format!("email must be at most {EMAIL_MAX_CHARS} characters"),
            );
        }
        errors.into_result()
    }

    fn populate(&self, record: &mut User) {
        record.email = self.email.clone();
    }
}
