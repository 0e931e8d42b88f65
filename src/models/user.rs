use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub created_at: String,
}

/// Directed follow edge: `user` follows `subscribing`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub id: String,
    pub user_id: String,
    pub subscribing_id: String,
    pub created_at: String,
}

/// Per-user progress in one named skill, granted at registration and
/// advanced by task rewards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSkill {
    pub user_id: String,
    pub skill_id: String,
    pub skill_title: String,
    pub level: i64,
    pub experience: i64,
}
