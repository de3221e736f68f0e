//! Role form (admin-managed).

use crate::forms::base::{FormPayload, RecordForm, ValidationErrors};
use crate::model::role::Role;

const NAME_MAX_CHARS: usize = 80;
const DESCRIPTION_MAX_CHARS: usize = 255;

/// Submitted fields for creating or updating a role.
/// Wire field names: `Name`, `Description`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleForm {
    pub name: String,
    pub description: Option<String>,
}

impl RecordForm for RoleForm {
    type Record = Role;

    fn from_payload(payload: &FormPayload) -> Self {
        let description = payload
            .get("Description")
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string);
        Self {
            name: payload.get("Name").unwrap_or_default().trim().to_string(),
            description,
        }
    }

    fn load(record: &Role) -> Self {
        Self {
            name: record.name.clone(),
            description: record.description.clone(),
        }
    }

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        if self.name.is_empty() {
            errors.push("Name", "name is required");
        }
        if self.name.chars().count() > NAME_MAX_CHARS {
            errors.push(
                "Name",
                format!("name must be at most {NAME_MAX_CHARS} characters"),
            );
        }
        if let Some(description) = &self.description {
            if description.chars().count() > DESCRIPTION_MAX_CHARS {
                errors.push(
                    "Description",
                    format!("description must be at most {DESCRIPTION_MAX_CHARS} characters"),
                );
            }
        }
        errors.into_result()
    }

    fn populate(&self, record: &mut Role) {
        record.name = self.name.clone();
        record.description = self.description.clone();
    }
}
