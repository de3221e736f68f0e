//! CRUD action dispatcher.
//!
//! # Responsibility
//! - Resolve the target record through the access scope, decide which action
//!   the payload carries, apply the authorization guards and run the matching
//!   transition against the record store.
//! - Report the outcome as either a renderable state or a redirect, with the
//!   HTTP status the hosting handler must emit.
//!
//! # Invariants
//! - Exactly one action per submission; a submitted payload with no
//!   recognized token is a hard failure, never a silent read.
//! - An id that resolves to no row under the principal's scope is `NotFound`,
//!   even when the row exists for someone else.
//! - Recognized-but-disallowed transitions render inline with an error flash
//!   and a success status; they never abort the request.
//! - Mutations on an owned record require the owning principal; a share
//!   listing grants read access only.
//! - Create, Update and Undelete reload the record after persisting so the
//!   rendered form reflects storage-assigned values.

use crate::access::capability::{capabilities, ResourceKind};
use crate::access::scope::{resolve_scope, AccessError, AccessScope};
use crate::dispatch::action::{submitted_action, FormAction};
use crate::forms::base::{process_request_id, FormPayload, RecordForm, ValidationErrors};
use crate::model::principal::{Principal, RoleName, UserId};
use crate::model::record::{ManagedRecord, RecordId};
use crate::repo::{ListOrder, Page, PageRequest, RecordStore, RepoError};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod action;

/// Per-request state handed to every dispatch entry point.
///
/// Built fresh for each request; the dispatcher holds no ambient state.
#[derive(Debug, Clone, Copy)]
pub struct RequestContext<'a> {
    pub principal: &'a Principal,
}

impl<'a> RequestContext<'a> {
    pub fn new(principal: &'a Principal) -> Self {
        Self { principal }
    }
}

/// Hard request failures the hosting handler must map to an error response.
#[derive(Debug)]
pub enum DispatchError {
    /// Collection-level denial for a non-ownable kind.
    Forbidden(AccessError),
    /// Scoped lookup found nothing for the supplied id.
    NotFound { kind: ResourceKind, id: RecordId },
    /// Submitted payload carried no recognized action token.
    MalformedSubmission { kind: ResourceKind },
    Repo(RepoError),
}

impl DispatchError {
    /// HTTP status the hosting handler must emit.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Forbidden(_) => 403,
            Self::NotFound { .. } => 404,
            Self::MalformedSubmission { .. } => 400,
            Self::Repo(_) => 500,
        }
    }
}

impl Display for DispatchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Forbidden(err) => write!(f, "{err}"),
            Self::NotFound { kind, id } => write!(f, "{} not found: {id}", kind.as_str()),
            Self::MalformedSubmission { kind } => {
                write!(f, "submitted {} payload carries no action", kind.as_str())
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for DispatchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Forbidden(err) => Some(err),
            Self::NotFound { .. } | Self::MalformedSubmission { .. } => None,
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<AccessError> for DispatchError {
    fn from(value: AccessError) -> Self {
        Self::Forbidden(value)
    }
}

impl From<RepoError> for DispatchError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { kind, id } => Self::NotFound { kind, id },
            other => Self::Repo(other),
        }
    }
}

/// Rendering mode for the form template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Blank form for a record that does not exist yet.
    New,
    /// Read-only detail view.
    View,
    /// Editable detail view.
    Edit,
}

/// Category of a user-visible flash message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageCategory {
    Message,
    Warning,
    Error,
}

impl MessageCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Message => "message",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

/// One user-visible flash message attached to an outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flash {
    pub message: String,
    pub category: MessageCategory,
}

impl Flash {
    pub fn message(text: impl Into<String>) -> Self {
        Self {
            message: text.into(),
            category: MessageCategory::Message,
        }
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            message: text.into(),
            category: MessageCategory::Warning,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            message: text.into(),
            category: MessageCategory::Error,
        }
    }
}

/// Successful dispatch outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormOutcome<F> {
    /// Render the form in the given mode. Carries the inline flash (if any)
    /// and field-level validation errors; both render with a success status.
    Render {
        form: F,
        mode: RenderMode,
        flash: Option<Flash>,
        errors: ValidationErrors,
        record_id: Option<RecordId>,
    },
    /// Redirect the client to the kind's collection view.
    Redirect { kind: ResourceKind, flash: Flash },
}

impl<F> FormOutcome<F> {
    /// HTTP status the hosting handler must emit.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Render { .. } => 200,
            Self::Redirect { .. } => 302,
        }
    }
}

/// Scoped collection read for list views.
///
/// # Errors
/// - `Forbidden` when the principal may not address the kind at all.
pub fn table_view<S: RecordStore>(
    ctx: &RequestContext<'_>,
    store: &S,
    order: &ListOrder,
    page: &PageRequest,
    shared_mode: Option<bool>,
) -> Result<Page<S::Record>, DispatchError> {
    let scope = resolve_scope(ctx.principal, S::Record::KIND, shared_mode)?;
    Ok(store.list(&scope, order, page)?)
}

/// Single-record state machine: resolves the target, honors exactly one
/// submitted action and returns the renderable outcome.
///
/// # Errors
/// - `Forbidden` for collection-level denial, before any row is read.
/// - `NotFound` when an id is supplied but no row is reachable under the
///   principal's scope.
/// - `MalformedSubmission` when a submitted payload carries no action token.
pub fn form_view<S, F>(
    ctx: &RequestContext<'_>,
    store: &S,
    route_id: Option<RecordId>,
    payload: &FormPayload,
) -> Result<FormOutcome<F>, DispatchError>
where
    S: RecordStore,
    F: RecordForm<Record = S::Record>,
{
    let kind = S::Record::KIND;
    let scope = resolve_scope(ctx.principal, kind, None)?;

    let action = if payload.is_submitted() {
        submitted_action(payload)
    } else {
        None
    };

    // Undelete keeps the ownership predicate but must resolve records that
    // ordinary reads hide, so its guard failure renders inline instead of
    // turning into a 404. Every other path keeps the role-derived
    // visibility: deleted records stay invisible to non-manage principals.
    let mut lookup = scope;
    if action == Some(FormAction::Undelete) {
        lookup.include_deleted = true;
    }

    let id = process_request_id(payload, route_id);
    let record = match id {
        Some(id) => match store.find_by_id(&lookup, id)? {
            Some(record) => Some(record),
            None => {
                warn!(
                    "event=dispatch module=dispatch status=not_found kind={} id={id} user_id={}",
                    kind.as_str(),
                    ctx.principal.user_id
                );
                return Err(DispatchError::NotFound { kind, id });
            }
        },
        None => None,
    };

    if !payload.is_submitted() {
        return Ok(match record {
            Some(record) => render(F::load(&record), RenderMode::View, None, Some(record.id())),
            None => render(F::from_payload(payload), RenderMode::New, None, None),
        });
    }

    let Some(action) = action else {
        warn!(
            "event=dispatch module=dispatch status=malformed kind={} user_id={}",
            kind.as_str(),
            ctx.principal.user_id
        );
        return Err(DispatchError::MalformedSubmission { kind });
    };

    info!(
        "event=dispatch module=dispatch action={} kind={} id={id:?} user_id={}",
        action.as_str(),
        kind.as_str(),
        ctx.principal.user_id
    );

    match record {
        None => match action {
            FormAction::Create => {
                let form = F::from_payload(payload);
                if let Err(errors) = form.validate() {
                    return Ok(FormOutcome::Render {
                        form,
                        mode: RenderMode::New,
                        flash: None,
                        errors,
                        record_id: None,
                    });
                }
                let owner = capabilities(kind).ownable.then_some(ctx.principal.user_id);
                let mut fresh = S::Record::blank(owner);
                form.populate(&mut fresh);
                let new_id = match store.insert(&fresh) {
                    Ok(id) => id,
                    Err(RepoError::UnknownShareTarget { id }) => {
                        return Ok(FormOutcome::Render {
                            form,
                            mode: RenderMode::New,
                            flash: None,
                            errors: share_target_errors(id),
                            record_id: None,
                        });
                    }
                    Err(other) => return Err(other.into()),
                };
                let reloaded = reload(store, &scope, new_id)?;
                Ok(render(
                    F::load(&reloaded),
                    RenderMode::View,
                    Some(Flash::message(format!("{} Created", kind.as_str()))),
                    Some(new_id),
                ))
            }
            other => Ok(rejected(
                F::from_payload(payload),
                RenderMode::New,
                other,
                kind,
                None,
            )),
        },
        Some(mut existing) => {
            // Shares grant read access only; every mutation requires the
            // owning principal. Kinds without an owner pass unconditionally.
            let is_owner = existing
                .owner()
                .map_or(true, |owner| owner == ctx.principal.user_id);
            match action {
                FormAction::Create => {
                    let record_id = existing.id();
                    Ok(rejected(
                        F::load(&existing),
                        RenderMode::View,
                        action,
                        kind,
                        Some(record_id),
                    ))
                }
                FormAction::Edit | FormAction::Update | FormAction::Delete if !is_owner => {
                    let record_id = existing.id();
                    Ok(rejected(
                        F::load(&existing),
                        RenderMode::View,
                        action,
                        kind,
                        Some(record_id),
                    ))
                }
                FormAction::Edit => Ok(render(
                    F::load(&existing),
                    RenderMode::Edit,
                    None,
                    Some(existing.id()),
                )),
                FormAction::Update => {
                    let form = F::from_payload(payload);
                    if let Err(errors) = form.validate() {
                        return Ok(FormOutcome::Render {
                            form,
                            mode: RenderMode::Edit,
                            flash: None,
                            errors,
                            record_id: Some(existing.id()),
                        });
                    }
                    form.populate(&mut existing);
                    if let Err(err) = store.update(&existing) {
                        return match err {
                            RepoError::UnknownShareTarget { id } => Ok(FormOutcome::Render {
                                form,
                                mode: RenderMode::Edit,
                                flash: None,
                                errors: share_target_errors(id),
                                record_id: Some(existing.id()),
                            }),
                            other => Err(other.into()),
                        };
                    }
                    let reloaded = reload(store, &scope, existing.id())?;
                    Ok(render(
                        F::load(&reloaded),
                        RenderMode::View,
                        Some(Flash::message(format!("{} Updated", kind.as_str()))),
                        Some(existing.id()),
                    ))
                }
                FormAction::Delete => {
                    existing.meta_mut().delete(kind);
                    store.persist_lifecycle(&existing)?;
                    Ok(FormOutcome::Redirect {
                        kind,
                        flash: Flash::message(format!("{} Deleted", kind.as_str())),
                    })
                }
                FormAction::Undelete => {
                    if !ctx.principal.has_role(RoleName::Manage) {
                        let record_id = existing.id();
                        return Ok(rejected(
                            F::load(&existing),
                            RenderMode::View,
                            action,
                            kind,
                            Some(record_id),
                        ));
                    }
                    existing.meta_mut().undelete(kind);
                    store.persist_lifecycle(&existing)?;
                    let reloaded = reload(store, &scope, existing.id())?;
                    Ok(render(
                        F::load(&reloaded),
                        RenderMode::View,
                        Some(Flash::warning(format!("{} Restored", kind.as_str()))),
                        Some(existing.id()),
                    ))
                }
            }
        }
    }
}

fn share_target_errors(id: UserId) -> ValidationErrors {
    let mut errors = ValidationErrors::default();
    errors.push("Shared With", format!("unknown user id `{id}`"));
    errors
}

fn render<F>(
    form: F,
    mode: RenderMode,
    flash: Option<Flash>,
    record_id: Option<RecordId>,
) -> FormOutcome<F> {
    FormOutcome::Render {
        form,
        mode,
        flash,
        errors: ValidationErrors::default(),
        record_id,
    }
}

/// Recognized-but-disallowed transition: inline error flash, success status.
fn rejected<F>(
    form: F,
    mode: RenderMode,
    action: FormAction,
    kind: ResourceKind,
    record_id: Option<RecordId>,
) -> FormOutcome<F> {
    warn!(
        "event=dispatch module=dispatch status=rejected action={} kind={} id={record_id:?}",
        action.as_str(),
        kind.as_str()
    );
    render(
        form,
        mode,
        Some(Flash::error(format!(
            "Unable to {} {}",
            action.as_str(),
            kind.as_str()
        ))),
        record_id,
    )
}

fn reload<S: RecordStore>(
    store: &S,
    scope: &AccessScope,
    id: RecordId,
) -> Result<S::Record, DispatchError> {
    Ok(store.reload(id, scope.include_deleted)?)
}

#[cfg(test)]
mod tests {
    use super::{DispatchError, Flash, FormOutcome, MessageCategory};
    use crate::access::capability::ResourceKind;
    use crate::access::scope::AccessError;
    use crate::repo::RepoError;

    #[test]
    fn error_statuses_match_their_variants() {
        let forbidden = DispatchError::Forbidden(AccessError::Forbidden {
            kind: ResourceKind::Role,
        });
        assert_eq!(forbidden.http_status(), 403);
        let not_found = DispatchError::NotFound {
            kind: ResourceKind::Tag,
            id: 9,
        };
        assert_eq!(not_found.http_status(), 404);
        let malformed = DispatchError::MalformedSubmission {
            kind: ResourceKind::Entry,
        };
        assert_eq!(malformed.http_status(), 400);
    }

    #[test]
    fn repo_not_found_converts_to_dispatch_not_found() {
        let err: DispatchError = RepoError::NotFound {
            kind: ResourceKind::Tag,
            id: 4,
        }
        .into();
        assert!(matches!(
            err,
            DispatchError::NotFound {
                kind: ResourceKind::Tag,
                id: 4
            }
        ));
    }

    #[test]
    fn outcome_statuses_distinguish_render_and_redirect() {
        let redirect: FormOutcome<()> = FormOutcome::Redirect {
            kind: ResourceKind::Tag,
            flash: Flash::message("Tag Deleted"),
        };
        assert_eq!(redirect.http_status(), 302);
    }

    #[test]
    fn flash_constructors_set_categories() {
        assert_eq!(Flash::message("x").category, MessageCategory::Message);
        assert_eq!(Flash::warning("x").category, MessageCategory::Warning);
        assert_eq!(Flash::error("x").category, MessageCategory::Error);
        assert_eq!(MessageCategory::Error.as_str(), "error");
    }
}
