/// Post service - create, read and delete posts
use crate::db::{PostStore, StoreError};
use crate::models::{NewPost, Post};
use crate::services::media::{ImageUpload, MediaError, MediaUploader};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

pub const MISSING_POST_FIELDS: &str = "Please add Title and Description";
pub const MISSING_IMAGE: &str = "No file uploaded!";

#[derive(Debug, Error)]
pub enum PostError {
    #[error("{0}")]
    Validation(&'static str),

    #[error("Post not found: {0}")]
    NotFound(Uuid),

    #[error(transparent)]
    Media(#[from] MediaError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Text fields of a post creation form
#[derive(Debug, Clone, Default)]
pub struct CreatePost {
    pub title: Option<String>,
    pub description: Option<String>,
    pub user_id: Option<String>,
    pub name: Option<String>,
    pub username: Option<String>,
    pub date: Option<String>,
}

impl CreatePost {
    /// Build the insert, leaving `image_id` empty until the upload completes
    pub fn validate(self) -> Result<NewPost, PostError> {
        let missing = || PostError::Validation(MISSING_POST_FIELDS);

        let title = present(self.title).ok_or_else(missing)?;
        let description = present(self.description).ok_or_else(missing)?;
        let user_id = present(self.user_id).ok_or_else(missing)?;
        let name = present(self.name).ok_or_else(missing)?;
        let username = present(self.username).ok_or_else(missing)?;

        let user_id =
            Uuid::parse_str(user_id.trim()).map_err(|_| PostError::Validation("Invalid user_id"))?;

        Ok(NewPost {
            title,
            description,
            user_id,
            name,
            username,
            date: self.date.unwrap_or_default(),
            image_id: String::new(),
        })
    }
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[derive(Clone)]
pub struct PostService {
    posts: Arc<dyn PostStore>,
    media: Arc<dyn MediaUploader>,
}

impl PostService {
    pub fn new(posts: Arc<dyn PostStore>, media: Arc<dyn MediaUploader>) -> Self {
        Self { posts, media }
    }

    /// Validate, upload the image, then insert the post
    pub async fn create_post(
        &self,
        form: CreatePost,
        image: Option<ImageUpload>,
    ) -> Result<Post, PostError> {
        let mut new_post = form.validate()?;
        let image = image.ok_or(PostError::Validation(MISSING_IMAGE))?;

        new_post.image_id = self.media.upload(image).await?;

        let post = self.posts.create(new_post).await?;
        tracing::info!(post_id = %post.id, user_id = %post.user_id, "post created");
        Ok(post)
    }

    pub async fn list_posts(&self) -> Result<Vec<Post>, PostError> {
        Ok(self.posts.list().await?)
    }

    pub async fn get_post(&self, post_id: Uuid) -> Result<Post, PostError> {
        self.posts.find_by_id(post_id).await.map_err(|e| match e {
            StoreError::NotFound { .. } => PostError::NotFound(post_id),
            other => other.into(),
        })
    }

    pub async fn posts_by_author(&self, user_id: Uuid) -> Result<Vec<Post>, PostError> {
        Ok(self.posts.list_by_author(user_id).await?)
    }

    /// Delete a post. Its comments stay in the comment store until reconciled.
    pub async fn delete_post(&self, post_id: Uuid) -> Result<(), PostError> {
        match self.posts.delete(post_id).await {
            Ok(()) => {
                tracing::info!(%post_id, "post deleted");
                Ok(())
            }
            Err(StoreError::NotFound { .. }) => Err(PostError::NotFound(post_id)),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> CreatePost {
        CreatePost {
            title: Some("Hello".to_string()),
            description: Some("World".to_string()),
            user_id: Some(Uuid::new_v4().to_string()),
            name: Some("Ada".to_string()),
            username: Some("User_1".to_string()),
            date: None,
        }
    }

    #[test]
    fn test_validate_complete_form() {
        let new_post = form().validate().unwrap();
        assert_eq!(new_post.title, "Hello");
        assert!(new_post.date.is_empty());
        assert!(new_post.image_id.is_empty());
    }

    #[test]
    fn test_validate_requires_author_fields() {
        for strip in 0..5 {
            let mut f = form();
            match strip {
                0 => f.title = None,
                1 => f.description = Some(" ".to_string()),
                2 => f.user_id = None,
                3 => f.name = None,
                _ => f.username = Some(String::new()),
            }
            assert!(matches!(f.validate(), Err(PostError::Validation(MISSING_POST_FIELDS))));
        }
    }
}
