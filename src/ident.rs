use sha2::{Digest, Sha256};

use crate::error::SlifeError;

/// Length of the stored confirmation digest, in hex characters.
const CONFIRMATION_ID_LEN: usize = 32;

/// Number of random bytes behind an invitation token.
const INVITATION_TOKEN_BYTES: usize = 24;

/// Separator between an anonymous session id and the original invitation
/// token once an invitation has been claimed by link.
pub const SESSION_TOKEN_SEP: char = '_';

/// Deterministic confirmation identifier for a (catalog task, initiator)
/// pair: SHA-256 over `"{task_id}:{initiator_id}"`, hex, truncated to 32
/// characters. Recomputing it for the same pair yields the same value. It
/// is persisted on first use and never recomputed after that.
pub fn confirmation_digest(task_id: &str, initiator_id: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(task_id.as_bytes());
    hasher.update(b":");
    hasher.update(initiator_id.as_bytes());
    let digest = hex::encode(hasher.finalize());
    digest[..CONFIRMATION_ID_LEN].to_string()
}

/// Unguessable invitation token, generated once per task instance and
/// persisted. Collision safety is backed by the UNIQUE constraint on the
/// token column; the 192 bits of randomness make a retry loop unnecessary.
pub fn invitation_token() -> Result<String, SlifeError> {
    let mut bytes = [0u8; INVITATION_TOKEN_BYTES];
    getrandom::getrandom(&mut bytes)
        .map_err(|e| SlifeError::database(format!("token generation failed: {e}")))?;
    Ok(hex::encode(bytes))
}

/// Identifier minted for a visitor who has not registered an account yet,
/// so their anonymously-confirmed tasks can be reattributed later.
pub fn anonymous_session_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Composite token recorded once an anonymous session claims an invitation.
pub fn composite_token(session_id: &str, token: &str) -> String {
    format!("{session_id}{SESSION_TOKEN_SEP}{token}")
}

/// Prefix matching all composite tokens claimed by one anonymous session.
pub fn session_prefix(session_id: &str) -> String {
    format!("{session_id}{SESSION_TOKEN_SEP}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_is_deterministic() {
        let a = confirmation_digest("task-1", "user-1");
        let b = confirmation_digest("task-1", "user-1");
        assert_eq!(a, b);
        assert_eq!(a.len(), 32);
    }

    #[test]
    fn test_digest_differs_per_pair() {
        let a = confirmation_digest("task-1", "user-1");
        let b = confirmation_digest("task-1", "user-2");
        let c = confirmation_digest("task-2", "user-1");
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_ne!(b, c);
    }

    #[test]
    fn test_digest_separator_prevents_ambiguity() {
        // ("ab", "c") and ("a", "bc") must not collide
        assert_ne!(confirmation_digest("ab", "c"), confirmation_digest("a", "bc"));
    }

    #[test]
    fn test_invitation_tokens_are_unique() {
        let a = invitation_token().unwrap();
        let b = invitation_token().unwrap();
        assert_ne!(a, b);
        assert_eq!(a.len(), 48);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_composite_token_round_trip() {
        let composite = composite_token("anon123", "tok456");
        assert_eq!(composite, "anon123_tok456");
        assert!(composite.starts_with(&session_prefix("anon123")));
    }

    #[test]
    fn test_anonymous_session_ids_differ() {
        assert_ne!(anonymous_session_id(), anonymous_session_id());
    }
}
