use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Started,
    Completed,
    Confirmed,
    Canceled,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Started => "started",
            Self::Completed => "completed",
            Self::Confirmed => "confirmed",
            Self::Canceled => "canceled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "started" => Some(Self::Started),
            "completed" => Some(Self::Completed),
            "confirmed" => Some(Self::Confirmed),
            "canceled" => Some(Self::Canceled),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Confirmed | Self::Canceled)
    }
}

/// One user's undertaking of one catalog task.
///
/// Exactly one of `target_user_id` / `target_user_name` names the intended
/// confirmer at any time; `target_user_id` may be bound late, at
/// confirmation or at merge-on-registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserTask {
    pub id: String,
    pub task_id: String,
    pub initiator_id: String,
    pub target_user_id: Option<String>,
    pub target_user_name: Option<String>,
    pub status: TaskStatus,
    pub invitation_token: String,
    pub rating: Option<i64>,
    pub started_at: String,
    pub completed_at: Option<String>,
    pub confirmed_at: Option<String>,
}
