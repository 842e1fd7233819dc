/// Business logic layer for blog-service
///
/// - `comments`: two-store comment writes (comment store + post summaries)
/// - `reconcile`: repair pass for divergence the comment writes leave behind
/// - `posts`, `auth`: thin services over their stores
/// - `media`, `description`: narrow clients for the media host and language model
pub mod auth;
pub mod comments;
pub mod description;
pub mod media;
pub mod posts;
pub mod reconcile;

pub use auth::{AuthError, AuthService, SigninRequest, SignupRequest};
pub use comments::{CommentError, CommentService, CreateComment, CreatedComment};
pub use description::{AiError, DescriptionGenerator, GeminiClient};
pub use media::{CloudinaryUploader, ImageUpload, MediaError, MediaUploader};
pub use posts::{CreatePost, PostError, PostService};
pub use reconcile::{ReconcileReport, Reconciler};
