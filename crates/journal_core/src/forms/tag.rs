//! Tag form.

use crate::forms::base::{FormPayload, RecordForm, ValidationErrors};
use crate::model::tag::{normalize_tag, Tag};

const NAME_MAX_CHARS: usize = 64;

/// Submitted fields for creating or updating a tag. Wire field name: `Name`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagForm {
    pub name: String,
}

impl RecordForm for TagForm {
    type Record = Tag;

    fn from_payload(payload: &FormPayload) -> Self {
        Self {
            name: normalize_tag(payload.get("Name").unwrap_or_default()).unwrap_or_default(),
        }
    }

    fn load(record: &Tag) -> Self {
        Self {
            name: record.name.clone(),
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
        errors.into_result()
    }

    fn populate(&self, record: &mut Tag) {
        record.name = self.name.clone();
    }
}
