//! Comment service - keeps the comment store and the summaries embedded in
//! posts consistent across create and delete.
//!
//! The comment store is authoritative. A post's embedded summary list is a
//! projection that is written second on create and removed first on delete,
//! so an interruption leaves at worst a comment that is missing from its
//! post view, never a post view pointing at a deleted comment.
//!
//! A delete first marks the comment, so a comment whose delete is
//! interrupted stays hidden and the reconciler finishes the delete instead
//! of re-summarising it.
//!
//! No write is ever compensated here. When the second write of a create
//! fails the comment stays in the store, the caller gets an error, and the
//! reconciler (see `services::reconcile`) later re-appends or collects it.

use crate::db::{CommentStore, PostStore, StoreError};
use crate::metrics;
use crate::models::{Comment, CommentSummary, NewComment};
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

pub const MISSING_FIELDS_MESSAGE: &str = "Please add comment";

/// Progress of a single comment operation, used as a log and metric label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Validated,
    CommentWritten,
    PostUpdated,
    Complete,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Validated => "validated",
            Stage::CommentWritten => "comment_written",
            Stage::PostUpdated => "post_updated",
            Stage::Complete => "complete",
        }
    }
}

#[derive(Debug, Error)]
pub enum CommentError {
    #[error("{0}")]
    Validation(&'static str),

    #[error("Comment not found: {0}")]
    CommentNotFound(Uuid),

    /// The comment was written but its summary could not be appended.
    #[error("comment {comment_id} stored but summary append to post {post_id} failed: {source}")]
    Orphaned {
        comment_id: Uuid,
        post_id: Uuid,
        #[source]
        source: StoreError,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Body of a comment creation request. Every field is optional on the
/// wire so that missing fields surface as a validation error, not a
/// deserialization failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateComment {
    pub comment: Option<String>,
    #[serde(rename = "userID")]
    pub user_id: Option<String>,
    pub username: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "postID")]
    pub post_id: Option<String>,
    pub date: Option<String>,
    pub title: Option<String>,
}

impl CreateComment {
    /// Check required fields and build the insert. Performs no I/O.
    pub fn validate(self) -> Result<NewComment, CommentError> {
        let comment = non_empty(self.comment).ok_or(CommentError::Validation(MISSING_FIELDS_MESSAGE))?;
        let user_id = non_empty(self.user_id).ok_or(CommentError::Validation(MISSING_FIELDS_MESSAGE))?;
        let post_id = non_empty(self.post_id).ok_or(CommentError::Validation(MISSING_FIELDS_MESSAGE))?;

        let user_id = Uuid::parse_str(user_id.trim())
            .map_err(|_| CommentError::Validation("Invalid userID"))?;
        let post_id = Uuid::parse_str(post_id.trim())
            .map_err(|_| CommentError::Validation("Invalid postID"))?;

        Ok(NewComment {
            comment,
            user_id,
            username: self.username.unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            post_id,
            date: self.date.unwrap_or_default(),
            title: self.title.unwrap_or_default(),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Result of a fully successful create
#[derive(Debug, Clone)]
pub struct CreatedComment {
    pub comment: Comment,
    /// Number of summaries on the parent post after the append
    pub comment_count: usize,
}

/// Coordinates the two-store writes for comments
#[derive(Clone)]
pub struct CommentService {
    comments: Arc<dyn CommentStore>,
    posts: Arc<dyn PostStore>,
}

impl CommentService {
    pub fn new(comments: Arc<dyn CommentStore>, posts: Arc<dyn PostStore>) -> Self {
        Self { comments, posts }
    }

    /// Create a comment, then append its summary to the parent post.
    pub async fn create_comment(&self, request: CreateComment) -> Result<CreatedComment, CommentError> {
        let new_comment = match request.validate() {
            Ok(c) => c,
            Err(e) => {
                metrics::record_comment_op("create", "invalid");
                return Err(e);
            }
        };
        let post_id = new_comment.post_id;

        let comment = self.comments.create(new_comment).await.map_err(|e| {
            metrics::record_comment_op("create", "store_error");
            tracing::error!(%post_id, stage = Stage::Validated.as_str(), error = %e, "comment insert failed");
            CommentError::Store(e)
        })?;

        let summary = CommentSummary::from(&comment);
        match self.posts.append_comment_summary(post_id, &summary).await {
            Ok(comment_count) => {
                metrics::record_comment_op("create", "success");
                tracing::debug!(
                    comment_id = %comment.id,
                    %post_id,
                    comment_count,
                    stage = Stage::Complete.as_str(),
                    "comment created"
                );
                Ok(CreatedComment {
                    comment,
                    comment_count,
                })
            }
            Err(source) => {
                metrics::record_comment_op("create", "orphaned");
                metrics::record_orphan(Stage::CommentWritten.as_str());
                tracing::warn!(
                    comment_id = %comment.id,
                    %post_id,
                    stage = Stage::CommentWritten.as_str(),
                    error = %source,
                    "comment stored without post summary; left for reconciliation"
                );
                Err(CommentError::Orphaned {
                    comment_id: comment.id,
                    post_id,
                    source,
                })
            }
        }
    }

    /// Comments written by a user
    pub async fn comments_by_author(&self, user_id: Uuid) -> Result<Vec<Comment>, CommentError> {
        Ok(self.comments.find_by_author(user_id).await?)
    }

    /// Mark the comment, remove its summary from its post(s), then delete it.
    ///
    /// `post_id` is the post named by the caller. The post recorded on the
    /// comment is cleaned as well when it differs. A missing post is not an
    /// error; any other failure while removing summaries aborts before the
    /// comment is deleted.
    pub async fn delete_comment(&self, comment_id: Uuid, post_id: Option<Uuid>) -> Result<(), CommentError> {
        let comment = match self.comments.mark_deleting(comment_id).await {
            Ok(c) => c,
            Err(e) if e.is_not_found() => {
                metrics::record_comment_op("delete", "not_found");
                return Err(CommentError::CommentNotFound(comment_id));
            }
            Err(e) => {
                metrics::record_comment_op("delete", "store_error");
                return Err(e.into());
            }
        };

        let mut targets = Vec::with_capacity(2);
        if let Some(requested) = post_id {
            targets.push(requested);
        }
        if !targets.contains(&comment.post_id) {
            if post_id.is_some() {
                tracing::warn!(
                    %comment_id,
                    requested_post = ?post_id,
                    recorded_post = %comment.post_id,
                    "delete request names a different post than the comment records"
                );
            }
            targets.push(comment.post_id);
        }

        for target in targets {
            match self.posts.remove_comment_summary(target, comment_id).await {
                Ok(removed) => {
                    tracing::debug!(%comment_id, post_id = %target, removed, "summary removal done");
                }
                Err(e) if e.is_not_found() => {
                    tracing::info!(%comment_id, post_id = %target, "post already gone; skipping summary removal");
                }
                Err(e) => {
                    metrics::record_comment_op("delete", "store_error");
                    tracing::error!(%comment_id, post_id = %target, error = %e, "summary removal failed; comment kept");
                    return Err(e.into());
                }
            }
        }

        match self.comments.delete_by_id(comment_id).await {
            Ok(()) => {
                metrics::record_comment_op("delete", "success");
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                // Deleted concurrently between lookup and delete
                metrics::record_comment_op("delete", "not_found");
                Err(CommentError::CommentNotFound(comment_id))
            }
            Err(e) => {
                metrics::record_comment_op("delete", "store_error");
                tracing::warn!(
                    %comment_id,
                    stage = Stage::PostUpdated.as_str(),
                    error = %e,
                    "summary removed but comment delete failed; comment is hidden until reconciled"
                );
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CreateComment {
        CreateComment {
            comment: Some("nice".to_string()),
            user_id: Some(Uuid::new_v4().to_string()),
            username: Some("User_1".to_string()),
            name: Some("Ada".to_string()),
            post_id: Some(Uuid::new_v4().to_string()),
            date: Some("2025-01-01".to_string()),
            title: Some("Hello".to_string()),
        }
    }

    #[test]
    fn test_validate_accepts_complete_request() {
        let new_comment = request().validate().unwrap();
        assert_eq!(new_comment.comment, "nice");
        assert_eq!(new_comment.title, "Hello");
    }

    #[test]
    fn test_validate_rejects_empty_comment() {
        let mut req = request();
        req.comment = Some(String::new());
        assert!(matches!(req.validate(), Err(CommentError::Validation(MISSING_FIELDS_MESSAGE))));
    }

    #[test]
    fn test_validate_rejects_whitespace_comment() {
        let mut req = request();
        req.comment = Some("   ".to_string());
        assert!(matches!(req.validate(), Err(CommentError::Validation(MISSING_FIELDS_MESSAGE))));
    }

    #[test]
    fn test_validate_rejects_missing_ids() {
        let mut req = request();
        req.user_id = None;
        assert!(matches!(req.validate(), Err(CommentError::Validation(MISSING_FIELDS_MESSAGE))));

        let mut req = request();
        req.post_id = Some(String::new());
        assert!(matches!(req.validate(), Err(CommentError::Validation(MISSING_FIELDS_MESSAGE))));
    }

    #[test]
    fn test_validate_rejects_malformed_post_id() {
        let mut req = request();
        req.post_id = Some("p1".to_string());
        assert!(matches!(req.validate(), Err(CommentError::Validation("Invalid postID"))));
    }

    #[test]
    fn test_optional_fields_default_to_empty() {
        let mut req = request();
        req.username = None;
        req.name = None;
        req.date = None;
        req.title = None;

        let new_comment = req.validate().unwrap();
        assert!(new_comment.username.is_empty());
        assert!(new_comment.title.is_empty());
    }
}
