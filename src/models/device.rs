use serde::{Deserialize, Serialize};

/// Registered push-notification endpoint. The token string is globally
/// unique: re-registering it under another user replaces the prior record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceToken {
    pub id: String,
    pub token: String,
    pub platform: String,
    pub user_id: String,
    pub last_used_at: String,
}
