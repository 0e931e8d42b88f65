use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub author_id: String,
    pub text: String,
    pub likes_count: i64,
    pub is_published: bool,
    pub pub_date: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub post_id: String,
    pub author_id: String,
    pub text: String,
    pub likes_count: i64,
    pub pub_date: String,
}

/// Tagged reference to a likeable piece of content. One polymorphic like
/// table keyed by (user, content type, content id) covers both kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeTarget<'a> {
    Post(&'a str),
    Comment(&'a str),
}

impl<'a> LikeTarget<'a> {
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Post(_) => "post",
            Self::Comment(_) => "comment",
        }
    }

    pub fn content_id(&self) -> &'a str {
        match self {
            Self::Post(id) | Self::Comment(id) => id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Like {
    pub id: String,
    pub user_id: String,
    pub content_type: String,
    pub content_id: String,
    pub liked_at: String,
}
