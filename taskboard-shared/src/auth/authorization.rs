/// Per-action access checks
///
/// Every logged-in user may read, create and edit tasks and projects. A few
/// actions are reserved for the people involved in a task:
///
/// | Action            | Allowed for                          |
/// |-------------------|--------------------------------------|
/// | mark task done    | assignee, creator                    |
/// | leave task        | anyone (no-op for outsiders)         |
/// | comment on task   | assignee, creator, collaborators     |
/// | delete comment    | the comment's author                 |
///
/// The `can_*` predicates are pure. The `require_*` wrappers turn a denial
/// into [`AuthzError::NotAuthorized`], which the HTTP layer answers with
/// 403 before anything is mutated.
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::auth::authorization::require_mark_done;
/// use taskboard_shared::auth::middleware::AuthContext;
/// use taskboard_shared::models::task::Task;
///
/// # fn example(auth: &AuthContext, task: &Task) -> Result<(), Box<dyn std::error::Error>> {
/// require_mark_done(auth, task)?;
/// # Ok(())
/// # }
/// ```

use uuid::Uuid;

use super::middleware::AuthContext;
use crate::models::comment::Comment;
use crate::models::task::Task;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthzError {
    #[error("Not authorized to {0}")]
    NotAuthorized(&'static str),
}

/// Assignee or creator
pub fn can_mark_done(user_id: Uuid, task: &Task) -> bool {
    task.assignee_id == Some(user_id) || task.creator_id == Some(user_id)
}

/// Always allowed; leaving a task one is not part of changes nothing
pub fn can_leave(_user_id: Uuid, _task: &Task) -> bool {
    true
}

/// Assignee, creator or collaborator
pub fn can_comment(user_id: Uuid, task: &Task, collaborator_ids: &[Uuid]) -> bool {
    can_mark_done(user_id, task) || collaborator_ids.contains(&user_id)
}

/// Only the author, and only while the author still exists
pub fn can_delete_comment(user_id: Uuid, comment: &Comment) -> bool {
    comment.author_id == Some(user_id)
}

pub fn require_mark_done(auth: &AuthContext, task: &Task) -> Result<(), AuthzError> {
    if !can_mark_done(auth.user_id, task) {
        return Err(AuthzError::NotAuthorized("mark this task as done"));
    }
    Ok(())
}

pub fn require_leave(auth: &AuthContext, task: &Task) -> Result<(), AuthzError> {
    if !can_leave(auth.user_id, task) {
        return Err(AuthzError::NotAuthorized("leave this task"));
    }
    Ok(())
}

pub fn require_comment(auth: &AuthContext, task: &Task, collaborator_ids: &[Uuid]) -> Result<(), AuthzError> {
    if !can_comment(auth.user_id, task, collaborator_ids) {
        return Err(AuthzError::NotAuthorized("comment on this task"));
    }
    Ok(())
}

pub fn require_delete_comment(auth: &AuthContext, comment: &Comment) -> Result<(), AuthzError> {
    if !can_delete_comment(auth.user_id, comment) {
        return Err(AuthzError::NotAuthorized("delete this comment"));
    }
    Ok(())
}
