use rusqlite::Connection;

use crate::db::{subscription_repo, user_repo};
use crate::error::SlifeError;
use crate::models::{Subscription, User};

/// Create the directed edge `user → subscribing`. Returns the edge and
/// whether it was newly created; an existing edge is not an error here (the
/// call site decides whether to report it).
pub fn subscribe(
    conn: &Connection,
    user_ref: &str,
    subscribing_ref: &str,
) -> Result<(Subscription, bool), SlifeError> {
    let user = user_repo::resolve_user(conn, user_ref)?;
    let subscribing = user_repo::resolve_user(conn, subscribing_ref)?;
    if user.id == subscribing.id {
        return Err(SlifeError::self_subscription());
    }
    subscription_repo::get_or_create(conn, &user.id, &subscribing.id)
}

pub fn unsubscribe(
    conn: &Connection,
    user_ref: &str,
    subscribing_ref: &str,
) -> Result<(), SlifeError> {
    let user = user_repo::resolve_user(conn, user_ref)?;
    let subscribing = user_repo::resolve_user(conn, subscribing_ref)?;
    if !subscription_repo::delete(conn, &user.id, &subscribing.id)? {
        return Err(SlifeError::not_found(
            "Subscription",
            &format!("{} -> {}", user.username, subscribing.username),
        ));
    }
    Ok(())
}

/// Create both directed edges between two users. Idempotent per direction:
/// a pre-existing edge is left alone and only the missing one is created.
pub fn mutual_subscribe(conn: &Connection, a: &str, b: &str) -> Result<(), SlifeError> {
    if a == b {
        return Err(SlifeError::self_subscription());
    }
    subscription_repo::get_or_create(conn, a, b)?;
    subscription_repo::get_or_create(conn, b, a)?;
    Ok(())
}

/// Users the given user follows.
pub fn subscriptions(conn: &Connection, user_ref: &str) -> Result<Vec<User>, SlifeError> {
    let user = user_repo::resolve_user(conn, user_ref)?;
    let edges = subscription_repo::list_for_user(conn, &user.id)?;
    edges
        .iter()
        .map(|edge| user_repo::get_user_by_id(conn, &edge.subscribing_id))
        .collect()
}
