//! Submitted action tokens.
//!
//! Wire tokens are fixed literal field names; a token counts as pressed when
//! its field is present with a non-empty value. Exactly one action is honored
//! per submission, selected by a fixed scan order.

use crate::forms::base::FormPayload;
use log::debug;

/// One dispatchable form action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormAction {
    Create,
    Update,
    Edit,
    Delete,
    Undelete,
}

impl FormAction {
    /// The wire token, also used verbatim in user-facing messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "Create",
            Self::Update => "Update",
            Self::Edit => "Edit",
            Self::Delete => "Delete",
            Self::Undelete => "Undelete",
        }
    }
}

/// Scan order deciding which token wins when several are submitted at once.
/// Mirrors the field declaration order of the original submit buttons.
const ACTION_SCAN_ORDER: &[FormAction] = &[
    FormAction::Update,
    FormAction::Edit,
    FormAction::Create,
    FormAction::Delete,
    FormAction::Undelete,
];

/// Returns the single action honored for this payload, or `None` when no
/// recognized token was pressed.
pub fn submitted_action(payload: &FormPayload) -> Option<FormAction> {
    for action in ACTION_SCAN_ORDER {
        if payload
            .get(action.as_str())
            .is_some_and(|value| !value.trim().is_empty())
        {
            debug!(
                "event=action_scan module=dispatch action={}",
                action.as_str()
            );
            return Some(*action);
        }
    }
    None
}
