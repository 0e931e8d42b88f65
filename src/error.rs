use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    NotInitialized,
    NotFound,
    UserNotFound,
    TargetNotFound,
    InvalidTarget,
    DuplicateActiveTask,
    InvalidStateTransition,
    Forbidden,
    InvalidRating,
    AlreadyConfirmed,
    AlreadyCanceled,
    TargetAlreadyBound,
    SelfSubscription,
    AlreadySubscribed,
    AlreadyLiked,
    ValidationError,
    DatabaseError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotInitialized => "NOT_INITIALIZED",
            Self::NotFound => "NOT_FOUND",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::TargetNotFound => "TARGET_NOT_FOUND",
            Self::InvalidTarget => "INVALID_TARGET",
            Self::DuplicateActiveTask => "DUPLICATE_ACTIVE_TASK",
            Self::InvalidStateTransition => "INVALID_STATE_TRANSITION",
            Self::Forbidden => "FORBIDDEN",
            Self::InvalidRating => "INVALID_RATING",
            Self::AlreadyConfirmed => "ALREADY_CONFIRMED",
            Self::AlreadyCanceled => "ALREADY_CANCELED",
            Self::TargetAlreadyBound => "TARGET_ALREADY_BOUND",
            Self::SelfSubscription => "SELF_SUBSCRIPTION",
            Self::AlreadySubscribed => "ALREADY_SUBSCRIBED",
            Self::AlreadyLiked => "ALREADY_LIKED",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::DatabaseError => "DATABASE_ERROR",
        }
    }
}

#[derive(Debug, Error)]
#[error("{message}")]
pub struct SlifeError {
    pub code: ErrorCode,
    pub message: String,
}

impl SlifeError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn not_initialized() -> Self {
        Self::new(
            ErrorCode::NotInitialized,
            "slife is not initialized. Run `slife init` first.",
        )
    }

    pub fn not_found(what: &str, reference: &str) -> Self {
        Self::new(
            ErrorCode::NotFound,
            format!("{what} not found: {reference}"),
        )
    }

    pub fn user_not_found(reference: &str) -> Self {
        Self::new(
            ErrorCode::UserNotFound,
            format!("User not found: {reference}"),
        )
    }

    pub fn target_not_found(reference: &str) -> Self {
        Self::new(
            ErrorCode::TargetNotFound,
            format!("Target user does not exist: {reference}"),
        )
    }

    pub fn invalid_target() -> Self {
        Self::new(
            ErrorCode::InvalidTarget,
            "Cannot target yourself with your own task",
        )
    }

    pub fn duplicate_active_task(task: &str) -> Self {
        Self::new(
            ErrorCode::DuplicateActiveTask,
            format!("You already have an active instance of task '{task}'"),
        )
    }

    pub fn invalid_transition(action: &str, current: &str) -> Self {
        Self::new(
            ErrorCode::InvalidStateTransition,
            format!("Cannot {action} a task in status '{current}'"),
        )
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    pub fn invalid_rating() -> Self {
        Self::new(
            ErrorCode::InvalidRating,
            "Rating must be an integer between 1 and 5",
        )
    }

    pub fn already_confirmed() -> Self {
        Self::new(
            ErrorCode::AlreadyConfirmed,
            "A confirmed task cannot be canceled",
        )
    }

    pub fn already_canceled() -> Self {
        Self::new(ErrorCode::AlreadyCanceled, "This task has been canceled")
    }

    pub fn target_already_bound() -> Self {
        Self::new(
            ErrorCode::TargetAlreadyBound,
            "This invitation is addressed to a specific user",
        )
    }

    pub fn self_subscription() -> Self {
        Self::new(
            ErrorCode::SelfSubscription,
            "You cannot subscribe to yourself",
        )
    }

    pub fn already_subscribed(author: &str) -> Self {
        Self::new(
            ErrorCode::AlreadySubscribed,
            format!("Already subscribed to '{author}'"),
        )
    }

    pub fn already_liked() -> Self {
        Self::new(ErrorCode::AlreadyLiked, "Already liked")
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationError, message)
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }

    /// True when the underlying failure was a SQLite UNIQUE constraint hit.
    /// Repos that lean on storage-level uniqueness (duplicate active task,
    /// duplicate like, duplicate subscription) use this to translate the
    /// constraint violation into a domain error.
    pub fn is_unique_violation(&self) -> bool {
        self.code == ErrorCode::DatabaseError && self.message.contains("UNIQUE constraint failed")
    }
}

impl From<rusqlite::Error> for SlifeError {
    fn from(e: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(err, Some(msg)) = &e {
            if err.code == rusqlite::ErrorCode::ConstraintViolation {
                return Self::database(msg.clone());
            }
        }
        Self::database(e.to_string())
    }
}
