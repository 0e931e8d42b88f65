use rusqlite::Connection;
use serde_json::json;
use tracing::debug;

use crate::db::{catalog_repo, task_repo, user_repo};
use crate::error::SlifeError;
use crate::ident;
use crate::models::{TaskStatus, UserTask};
use crate::service::notify::{self, Notifier};
use crate::service::subscriptions;

/// Start a catalog task. The target may be a registered user, a free-text
/// name, or absent entirely (open invitation, claimable by link).
pub fn start(
    conn: &Connection,
    task_ref: &str,
    initiator_ref: &str,
    target_ref: Option<&str>,
    target_name: Option<&str>,
) -> Result<UserTask, SlifeError> {
    let task = catalog_repo::resolve_task(conn, task_ref)?;
    let initiator = user_repo::resolve_user(conn, initiator_ref)?;

    if target_ref.is_some() && target_name.is_some() {
        return Err(SlifeError::validation(
            "Specify either a target user or a target name, not both",
        ));
    }

    let target = match target_ref {
        Some(reference) => Some(
            user_repo::resolve_user(conn, reference)
                .map_err(|_| SlifeError::target_not_found(reference))?,
        ),
        None => None,
    };
    if let Some(ref target) = target {
        if target.id == initiator.id {
            return Err(SlifeError::invalid_target());
        }
    }

    let token = ident::invitation_token()?;
    let id = ulid::Ulid::new().to_string();

    // The partial unique index on (task_id, initiator_id) closes the
    // check-then-insert race; a duplicate active instance surfaces here as a
    // constraint violation.
    let instance = task_repo::create_instance(
        conn,
        &id,
        &task.id,
        &initiator.id,
        target.as_ref().map(|u| u.id.as_str()),
        target_name,
        &token,
    )
    .map_err(|e| {
        if e.is_unique_violation() {
            SlifeError::duplicate_active_task(&task.title)
        } else {
            e
        }
    })?;

    debug!(instance = %instance.id, task = %task.slug, "task started");
    Ok(instance)
}

/// Complete a started task. Only the initiator may complete. On success a
/// confirmation request is pushed to the target's devices, best-effort.
pub fn complete(
    conn: &Connection,
    notifier: &dyn Notifier,
    instance_ref: &str,
    actor_ref: &str,
) -> Result<UserTask, SlifeError> {
    let actor = user_repo::resolve_user(conn, actor_ref)?;
    let instance = task_repo::resolve_instance(conn, instance_ref)?;

    if instance.initiator_id != actor.id {
        return Err(SlifeError::forbidden(
            "Only the initiator can complete their task",
        ));
    }

    if !task_repo::mark_completed(conn, &instance.id)? {
        let current = task_repo::get_instance(conn, &instance.id)?;
        return Err(SlifeError::invalid_transition(
            "complete",
            current.status.as_str(),
        ));
    }
    let instance = task_repo::get_instance(conn, &instance.id)?;

    if let Some(ref target_id) = instance.target_user_id {
        let task = catalog_repo::get_task_by_id(conn, &instance.task_id)?;
        notify::notify_user(
            conn,
            notifier,
            target_id,
            "Confirmation requested",
            &format!("{} finished '{}'. Confirm it?", actor.username, task.title),
            &json!({ "instance_id": instance.id, "task_slug": task.slug }),
        );
    }

    Ok(instance)
}

fn validate_rating(rating: Option<i64>) -> Result<(), SlifeError> {
    if let Some(r) = rating {
        if !(1..=5).contains(&r) {
            return Err(SlifeError::invalid_rating());
        }
    }
    Ok(())
}

/// Confirm a completed task as a registered user.
///
/// The actor must be the bound target. When no target is bound they must
/// present the instance's invitation token, in which case they are bound as
/// the target now. Confirmation creates the mutual subscription pair with
/// the initiator in the same transaction.
pub fn confirm(
    conn: &Connection,
    instance_ref: &str,
    actor_ref: &str,
    token: Option<&str>,
    rating: Option<i64>,
) -> Result<UserTask, SlifeError> {
    validate_rating(rating)?;
    let actor = user_repo::resolve_user(conn, actor_ref)?;
    let instance = task_repo::resolve_instance(conn, instance_ref)?;

    if instance.initiator_id == actor.id {
        return Err(SlifeError::forbidden(
            "The initiator cannot confirm their own task",
        ));
    }

    let bind_target = match instance.target_user_id {
        Some(ref bound) if *bound == actor.id => None,
        Some(_) => {
            return Err(SlifeError::forbidden(
                "This task is addressed to another user",
            ))
        }
        None => {
            let presented = token.ok_or_else(|| {
                SlifeError::forbidden("An invitation token is required to confirm this task")
            })?;
            if !token_grants_confirm(&instance.invitation_token, presented) {
                return Err(SlifeError::forbidden("Invalid invitation token"));
            }
            Some(actor.id.as_str())
        }
    };

    conn.execute_batch("BEGIN IMMEDIATE")?;
    let result = (|| -> Result<(), SlifeError> {
        if !task_repo::mark_confirmed(conn, &instance.id, rating, bind_target)? {
            let current = task_repo::get_instance(conn, &instance.id)?;
            return Err(SlifeError::invalid_transition(
                "confirm",
                current.status.as_str(),
            ));
        }
        subscriptions::mutual_subscribe(conn, &instance.initiator_id, &actor.id)?;
        Ok(())
    })();

    match result {
        Ok(()) => {
            conn.execute_batch("COMMIT")?;
            debug!(instance = %instance.id, by = %actor.username, "task confirmed");
            task_repo::get_instance(conn, &instance.id)
        }
        Err(e) => {
            let _ = conn.execute_batch("ROLLBACK");
            Err(e)
        }
    }
}

/// The stored token authorizes confirmation when it matches the presented
/// capability directly, or when it is the claimed composite form of it.
fn token_grants_confirm(stored: &str, presented: &str) -> bool {
    if stored == presented {
        return true;
    }
    stored
        .strip_suffix(presented)
        .is_some_and(|prefix| prefix.ends_with(ident::SESSION_TOKEN_SEP))
}

/// Confirm a completed, untargeted task from an anonymous session. The
/// mutual subscription cannot be created yet; it happens at
/// merge-on-registration.
pub fn confirm_anonymous(
    conn: &Connection,
    session_id: &str,
    token: &str,
    rating: Option<i64>,
) -> Result<UserTask, SlifeError> {
    validate_rating(rating)?;

    let composite = ident::composite_token(session_id, token);
    let (instance, already_claimed) = match task_repo::find_by_token(conn, &composite)? {
        Some(instance) => (instance, true),
        None => match task_repo::find_by_token(conn, token)? {
            Some(instance) => (instance, false),
            None => return Err(SlifeError::not_found("Invitation", token)),
        },
    };

    if instance.target_user_id.is_some() {
        return Err(SlifeError::forbidden(
            "This task is addressed to a registered user",
        ));
    }

    conn.execute_batch("BEGIN IMMEDIATE")?;
    let result = (|| -> Result<(), SlifeError> {
        if !task_repo::mark_confirmed(conn, &instance.id, rating, None)? {
            let current = task_repo::get_instance(conn, &instance.id)?;
            return Err(SlifeError::invalid_transition(
                "confirm",
                current.status.as_str(),
            ));
        }
        if !already_claimed {
            task_repo::rewrite_token(conn, &instance.id, &composite)?;
        }
        Ok(())
    })();

    match result {
        Ok(()) => {
            conn.execute_batch("COMMIT")?;
            task_repo::get_instance(conn, &instance.id)
        }
        Err(e) => {
            let _ = conn.execute_batch("ROLLBACK");
            Err(e)
        }
    }
}

/// Cancel a non-terminal task. Confirmed tasks are immutable history; the
/// canceled row is kept for auditability rather than deleted.
pub fn cancel(
    conn: &Connection,
    instance_ref: &str,
    actor_ref: &str,
) -> Result<UserTask, SlifeError> {
    let actor = user_repo::resolve_user(conn, actor_ref)?;
    let instance = task_repo::resolve_instance(conn, instance_ref)?;

    if instance.initiator_id != actor.id {
        return Err(SlifeError::forbidden(
            "Only the initiator can cancel their task",
        ));
    }

    if !task_repo::mark_canceled(conn, &instance.id)? {
        let current = task_repo::get_instance(conn, &instance.id)?;
        return Err(match current.status {
            TaskStatus::Confirmed => SlifeError::already_confirmed(),
            TaskStatus::Canceled => SlifeError::already_canceled(),
            _ => SlifeError::invalid_transition("cancel", current.status.as_str()),
        });
    }
    task_repo::get_instance(conn, &instance.id)
}

/// Claim an open invitation link from a browser session. Mints a session id
/// when the caller has none (the caller persists it client-side) and
/// rewrites the token to its composite form so a repeat visit by the same
/// session resolves to the already-claimed instance.
pub fn accept_invitation(
    conn: &Connection,
    token: &str,
    session_id: Option<&str>,
) -> Result<(UserTask, String), SlifeError> {
    let session = match session_id {
        Some(s) => s.to_string(),
        None => ident::anonymous_session_id(),
    };

    let composite = ident::composite_token(&session, token);
    if let Some(instance) = task_repo::find_by_token(conn, &composite)? {
        return Ok((instance, session));
    }

    let instance = task_repo::find_by_token(conn, token)?
        .ok_or_else(|| SlifeError::not_found("Invitation", token))?;

    if instance.status == TaskStatus::Canceled {
        return Err(SlifeError::already_canceled());
    }
    if instance.target_user_id.is_some() {
        return Err(SlifeError::target_already_bound());
    }

    task_repo::rewrite_token(conn, &instance.id, &composite)?;
    let instance = task_repo::get_instance(conn, &instance.id)?;
    debug!(instance = %instance.id, "invitation claimed by anonymous session");
    Ok((instance, session))
}

/// Batch reconciliation run once when an anonymous visitor registers: every
/// confirmed instance claimed under their session is reattributed to the new
/// account, with the mutual subscriptions the confirmation deferred.
pub fn merge_on_registration(
    conn: &Connection,
    user_id: &str,
    session_id: &str,
) -> Result<Vec<UserTask>, SlifeError> {
    let prefix = ident::session_prefix(session_id);
    let claimed = task_repo::list_confirmed_by_session(conn, &prefix)?;

    let mut merged = Vec::with_capacity(claimed.len());
    for instance in claimed {
        task_repo::bind_target_user(conn, &instance.id, user_id)?;
        subscriptions::mutual_subscribe(conn, &instance.initiator_id, user_id)?;
        merged.push(task_repo::get_instance(conn, &instance.id)?);
    }
    if !merged.is_empty() {
        debug!(user_id, count = merged.len(), "anonymous confirmations merged");
    }
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{connection, subscription_repo};
    use crate::error::ErrorCode;
    use crate::models::Difficulty;
    use crate::service::notify::LogNotifier;

    fn fixture() -> Connection {
        let conn = connection::open_test_db();
        user_repo::create_user(&conn, "u1", "alice").unwrap();
        user_repo::create_user(&conn, "u2", "bob").unwrap();
        catalog_repo::create_task(
            &conn,
            "t1",
            "Run 5km",
            "run-5km",
            "Run five kilometers outdoors",
            "Run 5km",
            None,
            Difficulty::Medium,
        )
        .unwrap();
        conn
    }

    fn edge_exists(conn: &Connection, a: &str, b: &str) -> bool {
        subscription_repo::find(conn, a, b).unwrap().is_some()
    }

    #[test]
    fn test_start_duplicate_active_task() {
        let conn = fixture();
        start(&conn, "run-5km", "alice", None, None).unwrap();
        let err = start(&conn, "run-5km", "alice", None, None).unwrap_err();
        assert_eq!(err.code, ErrorCode::DuplicateActiveTask);
    }

    #[test]
    fn test_start_after_cancel_is_allowed() {
        let conn = fixture();
        let instance = start(&conn, "run-5km", "alice", None, None).unwrap();
        cancel(&conn, &instance.id, "alice").unwrap();
        start(&conn, "run-5km", "alice", None, None).unwrap();
    }

    #[test]
    fn test_start_self_target_rejected() {
        let conn = fixture();
        let err = start(&conn, "run-5km", "alice", Some("alice"), None).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidTarget);
    }

    #[test]
    fn test_start_unknown_target_rejected() {
        let conn = fixture();
        let err = start(&conn, "run-5km", "alice", Some("nobody"), None).unwrap_err();
        assert_eq!(err.code, ErrorCode::TargetNotFound);
    }

    #[test]
    fn test_confirm_requires_completed_status() {
        let conn = fixture();
        let instance = start(&conn, "run-5km", "alice", Some("bob"), None).unwrap();
        let err = confirm(&conn, &instance.id, "bob", None, None).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidStateTransition);
    }

    #[test]
    fn test_targeted_flow_end_to_end() {
        let conn = fixture();
        let instance = start(&conn, "run-5km", "alice", Some("bob"), None).unwrap();
        assert_eq!(instance.status, TaskStatus::Started);

        let instance = complete(&conn, &LogNotifier, &instance.id, "alice").unwrap();
        assert_eq!(instance.status, TaskStatus::Completed);
        assert!(instance.completed_at.is_some());

        let instance = confirm(&conn, &instance.id, "bob", None, Some(5)).unwrap();
        assert_eq!(instance.status, TaskStatus::Confirmed);
        assert_eq!(instance.rating, Some(5));
        assert!(instance.confirmed_at.is_some());

        assert!(edge_exists(&conn, "u1", "u2"));
        assert!(edge_exists(&conn, "u2", "u1"));
    }

    #[test]
    fn test_complete_twice_fails() {
        let conn = fixture();
        let instance = start(&conn, "run-5km", "alice", None, None).unwrap();
        complete(&conn, &LogNotifier, &instance.id, "alice").unwrap();
        let err = complete(&conn, &LogNotifier, &instance.id, "alice").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidStateTransition);
    }

    #[test]
    fn test_concurrent_complete_has_one_winner() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lifecycle.db");
        let conn = connection::open_test_db_at(&path);
        user_repo::create_user(&conn, "u1", "alice").unwrap();
        catalog_repo::create_task(
            &conn,
            "t1",
            "Run 5km",
            "run-5km",
            "Run five kilometers outdoors",
            "Run 5km",
            None,
            Difficulty::Medium,
        )
        .unwrap();
        let instance = start(&conn, "run-5km", "alice", None, None).unwrap();
        drop(conn);

        let handles: Vec<_> = (0..2)
            .map(|_| {
                let path = path.clone();
                let id = instance.id.clone();
                std::thread::spawn(move || {
                    let conn = connection::open_test_db_at(&path);
                    complete(&conn, &LogNotifier, &id, "alice").map(|_| ()).map_err(|e| e.code)
                })
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .any(|r| matches!(r, Err(ErrorCode::InvalidStateTransition))));
    }

    #[test]
    fn test_initiator_cannot_confirm() {
        let conn = fixture();
        let instance = start(&conn, "run-5km", "alice", Some("bob"), None).unwrap();
        complete(&conn, &LogNotifier, &instance.id, "alice").unwrap();
        let err = confirm(&conn, &instance.id, "alice", None, None).unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);
    }

    #[test]
    fn test_wrong_target_cannot_confirm() {
        let conn = fixture();
        user_repo::create_user(&conn, "u3", "carol").unwrap();
        let instance = start(&conn, "run-5km", "alice", Some("bob"), None).unwrap();
        complete(&conn, &LogNotifier, &instance.id, "alice").unwrap();
        let err = confirm(&conn, &instance.id, "carol", None, None).unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);
    }

    #[test]
    fn test_rating_bounds() {
        let conn = fixture();
        let instance = start(&conn, "run-5km", "alice", Some("bob"), None).unwrap();
        complete(&conn, &LogNotifier, &instance.id, "alice").unwrap();

        for bad in [0, 6, -1] {
            let err = confirm(&conn, &instance.id, "bob", None, Some(bad)).unwrap_err();
            assert_eq!(err.code, ErrorCode::InvalidRating);
            let current = task_repo::get_instance(&conn, &instance.id).unwrap();
            assert_eq!(current.status, TaskStatus::Completed);
            assert_eq!(current.rating, None);
        }
    }

    #[test]
    fn test_rating_only_visible_when_confirmed() {
        let conn = fixture();
        let instance = start(&conn, "run-5km", "alice", Some("bob"), None).unwrap();
        assert_eq!(instance.rating, None);
        let instance = complete(&conn, &LogNotifier, &instance.id, "alice").unwrap();
        assert_eq!(instance.rating, None);
        let instance = confirm(&conn, &instance.id, "bob", None, Some(3)).unwrap();
        assert_eq!(instance.rating, Some(3));
    }

    #[test]
    fn test_cancel_confirmed_fails() {
        let conn = fixture();
        let instance = start(&conn, "run-5km", "alice", Some("bob"), None).unwrap();
        complete(&conn, &LogNotifier, &instance.id, "alice").unwrap();
        confirm(&conn, &instance.id, "bob", None, None).unwrap();
        let err = cancel(&conn, &instance.id, "alice").unwrap_err();
        assert_eq!(err.code, ErrorCode::AlreadyConfirmed);
    }

    #[test]
    fn test_confirm_with_token_late_binds_target() {
        let conn = fixture();
        let instance = start(&conn, "run-5km", "alice", None, None).unwrap();
        complete(&conn, &LogNotifier, &instance.id, "alice").unwrap();

        // no token, no bound target: refused
        let err = confirm(&conn, &instance.id, "bob", None, None).unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);

        let token = instance.invitation_token.clone();
        let confirmed = confirm(&conn, &instance.id, "bob", Some(&token), None).unwrap();
        assert_eq!(confirmed.target_user_id.as_deref(), Some("u2"));
        assert!(edge_exists(&conn, "u1", "u2"));
        assert!(edge_exists(&conn, "u2", "u1"));
    }

    #[test]
    fn test_confirm_with_token_replaces_target_name() {
        let conn = fixture();
        let instance = start(&conn, "run-5km", "alice", None, Some("John")).unwrap();
        assert_eq!(instance.target_user_name.as_deref(), Some("John"));
        complete(&conn, &LogNotifier, &instance.id, "alice").unwrap();

        let token = instance.invitation_token.clone();
        let confirmed = confirm(&conn, &instance.id, "bob", Some(&token), None).unwrap();
        // the placeholder name gives way to the bound account
        assert_eq!(confirmed.target_user_id.as_deref(), Some("u2"));
        assert_eq!(confirmed.target_user_name, None);
    }

    #[test]
    fn test_accept_invitation_rewrites_token() {
        let conn = fixture();
        let instance = start(&conn, "run-5km", "alice", None, None).unwrap();
        let token = instance.invitation_token.clone();

        let (claimed, session) = accept_invitation(&conn, &token, Some("anon123")).unwrap();
        assert_eq!(session, "anon123");
        assert_eq!(claimed.invitation_token, format!("anon123_{token}"));

        // same session, same link: resolves to the claimed instance
        let (again, _) = accept_invitation(&conn, &token, Some("anon123")).unwrap();
        assert_eq!(again.id, claimed.id);
    }

    #[test]
    fn test_accept_invitation_mints_session() {
        let conn = fixture();
        let instance = start(&conn, "run-5km", "alice", None, None).unwrap();
        let (_, session) = accept_invitation(&conn, &instance.invitation_token, None).unwrap();
        assert!(!session.is_empty());
    }

    #[test]
    fn test_accept_invitation_rejects_bound_target() {
        let conn = fixture();
        let instance = start(&conn, "run-5km", "alice", Some("bob"), None).unwrap();
        let err =
            accept_invitation(&conn, &instance.invitation_token, Some("anon123")).unwrap_err();
        assert_eq!(err.code, ErrorCode::TargetAlreadyBound);
    }

    #[test]
    fn test_accept_invitation_rejects_canceled() {
        let conn = fixture();
        let instance = start(&conn, "run-5km", "alice", None, None).unwrap();
        cancel(&conn, &instance.id, "alice").unwrap();
        let err =
            accept_invitation(&conn, &instance.invitation_token, Some("anon123")).unwrap_err();
        assert_eq!(err.code, ErrorCode::AlreadyCanceled);
    }

    #[test]
    fn test_anonymous_confirm_and_merge() {
        let conn = fixture();
        let instance = start(&conn, "run-5km", "alice", None, None).unwrap();
        let token = instance.invitation_token.clone();
        complete(&conn, &LogNotifier, &instance.id, "alice").unwrap();

        accept_invitation(&conn, &token, Some("anon123")).unwrap();
        let confirmed = confirm_anonymous(&conn, "anon123", &token, Some(4)).unwrap();
        assert_eq!(confirmed.status, TaskStatus::Confirmed);
        assert_eq!(confirmed.target_user_id, None);

        user_repo::create_user(&conn, "u9", "dave").unwrap();
        let merged = merge_on_registration(&conn, "u9", "anon123").unwrap();
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].target_user_id.as_deref(), Some("u9"));
        assert!(edge_exists(&conn, "u1", "u9"));
        assert!(edge_exists(&conn, "u9", "u1"));
    }

    #[test]
    fn test_merge_ignores_other_sessions() {
        let conn = fixture();
        let instance = start(&conn, "run-5km", "alice", None, None).unwrap();
        let token = instance.invitation_token.clone();
        complete(&conn, &LogNotifier, &instance.id, "alice").unwrap();
        confirm_anonymous(&conn, "anon123", &token, None).unwrap();

        user_repo::create_user(&conn, "u9", "dave").unwrap();
        let merged = merge_on_registration(&conn, "u9", "other-session").unwrap();
        assert!(merged.is_empty());
    }
}
