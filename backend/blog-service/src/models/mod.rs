/// Data models for blog-service
///
/// This module defines structures for:
/// - Post: Blog posts with an image and an embedded list of comment summaries
/// - Comment: Canonical comment documents, each pointing at one post and one author
/// - User: Accounts that author posts and comments
pub mod comment;
pub mod post;
pub mod user;

pub use comment::{Comment, NewComment};
pub use post::{CommentSummary, NewPost, Post};
pub use user::{generate_username, Clock, NewUser, SystemClock, User};
