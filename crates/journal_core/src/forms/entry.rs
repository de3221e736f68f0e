//! Entry form: field parsing, validation and population.

use crate::forms::base::{parse_checkbox, FormPayload, RecordForm, ValidationErrors};
use crate::model::entry::Entry;
use crate::model::principal::UserId;
use crate::model::tag::normalize_tags;

const TITLE_MAX_CHARS: usize = 64;

/// Submitted fields for creating or updating an entry.
///
/// Wire field names are the exact names a submitting client must use:
/// `Title`, `Body`, `Tags` (comma-separated), `public`, `Shared With`
/// (comma-separated user ids).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryForm {
    pub title: String,
    pub body: String,
    pub tags: Vec<String>,
    pub public: bool,
    pub shared_with: Vec<UserId>,
    invalid_shares: Vec<String>,
}

impl RecordForm for EntryForm {
    type Record = Entry;

    fn from_payload(payload: &FormPayload) -> Self {
        let tags_raw = payload.get("Tags").unwrap_or_default();
        let tag_names: Vec<String> = tags_raw.split(',').map(str::to_string).collect();

        let mut shared_with = Vec::new();
        let mut invalid_shares = Vec::new();
        for part in payload
            .get("Shared With")
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
        {
            match part.parse::<UserId>() {
                Ok(user_id) => shared_with.push(user_id),
                Err(_) => invalid_shares.push(part.to_string()),
            }
        }
        shared_with.sort_unstable();
        shared_with.dedup();

        Self {
            title: payload.get("Title").unwrap_or_default().trim().to_string(),
            body: payload.get("Body").unwrap_or_default().to_string(),
            tags: normalize_tags(&tag_names),
            public: parse_checkbox(payload.get("public")),
            shared_with,
            invalid_shares,
        }
    }

    fn load(record: &Entry) -> Self {
        Self {
            title: record.title.clone(),
            body: record.body.clone(),
            tags: record.tags.clone(),
            public: record.public,
            shared_with: record.shared_with.clone(),
            invalid_shares: Vec::new(),
        }
    }

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        if self.title.is_empty() {
            errors.push("Title", "title is required");
        }
        if self.title.chars().count() > TITLE_MAX_CHARS {
            errors.push(
                "Title",
                format!("title must be at most {TITLE_MAX_CHARS} characters"),
            );
        }
        for share in &self.invalid_shares {
            errors.push("Shared With", format!("invalid user id `{share}`"));
        }
        errors.into_result()
    }

    fn populate(&self, record: &mut Entry) {
        record.title = self.title.clone();
        record.body = self.body.clone();
        record.public = self.public;
        record.tags = self.tags.clone();
        record.shared_with = self.shared_with.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::EntryForm;
    use crate::forms::base::{FormPayload, RecordForm};
    use crate::model::entry::Entry;
    use crate::model::record::ManagedRecord;

    #[test]
    fn parses_tags_and_share_list() {
        let payload = FormPayload::submitted([
            ("Title", "Trip notes"),
            ("Body", "We went north."),
            ("Tags", "Travel, summer , travel"),
            ("public", "y"),
            ("Shared With", "3, 5,3"),
        ]);
        let form = EntryForm::from_payload(&payload);
        assert_eq!(form.tags, vec!["summer", "travel"]);
        assert_eq!(form.shared_with, vec![3, 5]);
        assert!(form.public);
        assert!(form.validate().is_ok());
    }

    #[test]
    fn rejects_missing_title_and_bad_share_ids() {
        let payload = FormPayload::submitted([("Body", "text"), ("Shared With", "7, nope")]);
        let form = EntryForm::from_payload(&payload);
        let errors = form.validate().expect_err("validation must fail");
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn populate_never_touches_metadata_or_owner() {
        let payload = FormPayload::submitted([
            ("Title", "Forged"),
            ("id", "999"),
            ("created_at", "123456"),
            ("deleted_at", "123456"),
        ]);
        let form = EntryForm::from_payload(&payload);
        let mut entry = Entry::blank(Some(4));
        entry.meta.id = 12;
        entry.meta.created_at = 777;

        form.populate(&mut entry);

        assert_eq!(entry.meta.id, 12);
        assert_eq!(entry.meta.created_at, 777);
        assert_eq!(entry.meta.deleted_at, None);
        assert_eq!(entry.user_id, 4);
        assert_eq!(entry.title, "Forged");
    }
}
