//! Form payload plumbing and the record-form contract.
//!
//! # Responsibility
//! - Carry one submitted payload (field map + submitted flag) through the
//!   dispatcher.
//! - Extract the optional target record id (form body first, then route).
//! - Define the `RecordForm` seam between payloads and managed records.
//!
//! # Invariants
//! - `RecordForm::populate` writes mutable domain fields only; metadata
//!   (`id`, `created_at`, `updated_at`, `deleted_at`) present in a payload is
//!   silently ignored and never written from user input.
//! - Validation failure must keep the dispatcher from reaching the persist
//!   step.

use crate::model::record::{ManagedRecord, RecordId};
use log::debug;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

/// One submitted form payload.
///
/// A payload is "submitted" when it arrived through a form POST; a plain
/// read carries an unsubmitted payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormPayload {
    fields: BTreeMap<String, String>,
    submitted: bool,
}

impl FormPayload {
    /// Payload for a plain (non-submitting) read.
    pub fn not_submitted() -> Self {
        Self::default()
    }

    /// Payload for a form submission.
    pub fn submitted<K, V>(fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            fields: fields
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
            submitted: true,
        }
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }
}

/// Resolves the target record id for a request.
///
/// The form body takes precedence over the route-supplied id, mirroring the
/// submit-then-args lookup order of the original request handling.
pub fn process_request_id(payload: &FormPayload, route_id: Option<RecordId>) -> Option<RecordId> {
    if let Some(raw) = payload.get("id") {
        if let Ok(id) = raw.trim().parse::<RecordId>() {
            debug!("event=request_id module=forms source=form id={id}");
            return Some(id);
        }
    }
    match route_id {
        Some(id) => {
            debug!("event=request_id module=forms source=route id={id}");
            Some(id)
        }
        None => {
            debug!("event=request_id module=forms source=none");
            None
        }
    }
}

/// Field-level validation failures for one submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<(String, String)>,
}

impl ValidationErrors {
    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push((field.into(), message.into()));
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// `(field, message)` pairs in submission order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.errors
            .iter()
            .map(|(field, message)| (field.as_str(), message.as_str()))
    }

    /// Returns `Ok(())` when empty, `Err(self)` otherwise.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl Display for ValidationErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.errors.is_empty() {
            return write!(f, "no validation errors");
        }
        let rendered: Vec<String> = self
            .errors
            .iter()
            .map(|(field, message)| format!("{field}: {message}"))
            .collect();
        write!(f, "{}", rendered.join("; "))
    }
}

/// Contract between submitted payloads and managed records.
pub trait RecordForm: Sized {
    type Record: ManagedRecord;

    /// Builds the form from a submitted payload (or an empty payload for a
    /// fresh "new" rendering).
    fn from_payload(payload: &FormPayload) -> Self;

    /// Rebuilds the form from a persisted record, e.g. after a reload.
    fn load(record: &Self::Record) -> Self;

    /// Field-level validation; failures block the persist step.
    fn validate(&self) -> Result<(), ValidationErrors>;

    /// Writes mutable domain fields onto the record. Never touches record
    /// metadata or the owner reference.
    fn populate(&self, record: &mut Self::Record);
}

/// Checkbox semantics: present with a non-false value means checked.
pub fn parse_checkbox(value: Option<&str>) -> bool {
    match value {
        None => false,
        Some(raw) => {
            let trimmed = raw.trim();
            !(trimmed.is_empty() || trimmed == "0" || trimmed.eq_ignore_ascii_case("false"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_checkbox, process_request_id, FormPayload, ValidationErrors};

    #[test]
    fn form_id_takes_precedence_over_route_id() {
        let payload = FormPayload::submitted([("id", "7")]);
        assert_eq!(process_request_id(&payload, Some(9)), Some(7));
    }

    #[test]
    fn route_id_used_when_form_id_missing_or_invalid() {
        let payload = FormPayload::submitted([("id", "not-a-number")]);
        assert_eq!(process_request_id(&payload, Some(9)), Some(9));
        assert_eq!(
            process_request_id(&FormPayload::not_submitted(), None),
            None
        );
    }

    #[test]
    fn checkbox_parsing_accepts_common_truthy_values() {
        assert!(parse_checkbox(Some("y")));
        assert!(parse_checkbox(Some("true")));
        assert!(parse_checkbox(Some("1")));
        assert!(!parse_checkbox(Some("")));
        assert!(!parse_checkbox(Some("0")));
        assert!(!parse_checkbox(Some("false")));
        assert!(!parse_checkbox(None));
    }

    #[test]
    fn validation_errors_collect_in_order() {
        let mut errors = ValidationErrors::default();
        assert!(errors.clone().into_result().is_ok());
        errors.push("Title", "required");
        errors.push("Tags", "invalid");
        assert_eq!(errors.len(), 2);
        let fields: Vec<&str> = errors.iter().map(|(field, _)| field).collect();
        assert_eq!(fields, vec!["Title", "Tags"]);
        assert!(errors.into_result().is_err());
    }
}
