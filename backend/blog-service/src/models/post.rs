use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Comment;

/// Lightweight copy of a comment stored inside its parent post.
///
/// The comment store is the source of truth; this is a read projection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentSummary {
    #[serde(rename = "commentID")]
    pub comment_id: Uuid,
    pub comment: String,
    pub date: String,
    pub username: String,
    pub name: String,
}

impl From<&Comment> for CommentSummary {
    fn from(comment: &Comment) -> Self {
        Self {
            comment_id: comment.id,
            comment: comment.comment.clone(),
            date: comment.date.clone(),
            username: comment.username.clone(),
            name: comment.name.clone(),
        }
    }
}

/// Post document as returned to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub title: String,
    #[serde(rename = "discription")]
    pub description: String,
    #[serde(rename = "user")]
    pub user_id: Uuid,
    pub name: String,
    pub username: String,
    pub date: String,
    #[serde(rename = "imageID")]
    pub image_id: String,
    pub comments: Vec<CommentSummary>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl Post {
    pub fn comment_count(&self) -> usize {
        self.comments.len()
    }

    pub fn has_summary(&self, comment_id: Uuid) -> bool {
        self.comments.iter().any(|s| s.comment_id == comment_id)
    }
}

/// Fields required to insert a post
#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub description: String,
    pub user_id: Uuid,
    pub name: String,
    pub username: String,
    pub date: String,
    pub image_id: String,
}
