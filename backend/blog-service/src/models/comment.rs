use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Comment entity - the authoritative record of a comment on a post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub comment: String,
    #[serde(rename = "user")]
    pub user_id: Uuid,
    pub username: String,
    pub name: String,
    #[serde(rename = "post")]
    pub post_id: Uuid,
    pub date: String,
    /// Title of the parent post at the time the comment was written
    pub title: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    /// Set when a delete starts; a marked comment is never shown or re-summarised
    #[serde(skip)]
    pub deleting_at: Option<DateTime<Utc>>,
}

impl Comment {
    pub fn is_deleting(&self) -> bool {
        self.deleting_at.is_some()
    }
}

/// Fields required to insert a comment
#[derive(Debug, Clone)]
pub struct NewComment {
    pub comment: String,
    pub user_id: Uuid,
    pub username: String,
    pub name: String,
    pub post_id: Uuid,
    pub date: String,
    pub title: String,
}
