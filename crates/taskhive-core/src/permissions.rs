//! Permission evaluator for task access.
//!
//! The single source of truth for who may see or mutate a task. Every access
//! path (read, update, delete, share, attachments) must gate through these
//! functions after fetching the task and before touching state; no handler
//! re-derives ownership inline.

use uuid::Uuid;

use crate::models::{SharePermission, Task};

/// True iff `principal` owns the task.
///
/// Owners hold unconditional view/edit/delete rights; soft-delete is
/// owner-only and must use this rather than `can_edit`.
pub fn is_owner(task: &Task, principal: Uuid) -> bool {
    task.owner_id == principal
}

/// True iff `principal` may read the task: the owner, or any collaborator
/// regardless of granted permission.
pub fn can_view(task: &Task, principal: Uuid) -> bool {
    if is_owner(task, principal) {
        return true;
    }
    task.shared_with.iter().any(|s| s.user_id == principal)
}

/// True iff `principal` may mutate the task: the owner, or a collaborator
/// holding the `edit` grant.
pub fn can_edit(task: &Task, principal: Uuid) -> bool {
    if is_owner(task, principal) {
        return true;
    }
    task.shared_with
        .iter()
        .any(|s| s.user_id == principal && s.permission == SharePermission::Edit)
}
