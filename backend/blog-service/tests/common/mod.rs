//! In-memory stores and fake collaborators for integration tests
//!
//! Every store write is recorded in a shared `EventLog` so tests can assert
//! the order in which the two stores were touched. Failures are injected
//! per store with atomic switches.

#![allow(dead_code)]

use async_trait::async_trait;
use blog_service::config::AuthConfig;
use blog_service::db::{CommentStore, PostStore, StoreError, StoreResult, UserStore};
use blog_service::models::{
    Clock, Comment, CommentSummary, NewComment, NewPost, NewUser, Post, User,
};
use blog_service::services::{AiError, DescriptionGenerator, ImageUpload, MediaError, MediaUploader};
use blog_service::{AppState, Stores};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

pub const TEST_SECRET: &str = "integration-test-secret-at-least-32-bytes";

/// A store write, in the order it was applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    CommentCreated(Uuid),
    CommentMarked(Uuid),
    CommentDeleted(Uuid),
    SummaryAppended { post_id: Uuid, comment_id: Uuid },
    SummaryRemoved { post_id: Uuid, comment_id: Uuid },
}

#[derive(Default)]
pub struct EventLog {
    events: Mutex<Vec<Event>>,
}

impl EventLog {
    pub fn record(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn position(&self, event: &Event) -> Option<usize> {
        self.events().iter().position(|e| e == event)
    }
}

fn unavailable() -> StoreError {
    StoreError::Timeout(Duration::from_millis(5_000))
}

// =====================================================================
// Comment store
// =====================================================================

pub struct InMemoryCommentStore {
    comments: Mutex<HashMap<Uuid, Comment>>,
    log: Arc<EventLog>,
    pub fail_create: AtomicBool,
    pub fail_delete: AtomicBool,
}

impl InMemoryCommentStore {
    pub fn new(log: Arc<EventLog>) -> Self {
        Self {
            comments: Mutex::new(HashMap::new()),
            log,
            fail_create: AtomicBool::new(false),
            fail_delete: AtomicBool::new(false),
        }
    }

    /// Insert a comment without touching any post
    pub fn insert_raw(&self, comment: Comment) {
        self.comments.lock().unwrap().insert(comment.id, comment);
    }

    pub fn contains(&self, comment_id: Uuid) -> bool {
        self.comments.lock().unwrap().contains_key(&comment_id)
    }

    pub fn get(&self, comment_id: Uuid) -> Option<Comment> {
        self.comments.lock().unwrap().get(&comment_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.comments.lock().unwrap().len()
    }
}

#[async_trait]
impl CommentStore for InMemoryCommentStore {
    async fn create(&self, comment: NewComment) -> StoreResult<Comment> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(unavailable());
        }

        let comment = Comment {
            id: Uuid::new_v4(),
            comment: comment.comment,
            user_id: comment.user_id,
            username: comment.username,
            name: comment.name,
            post_id: comment.post_id,
            date: comment.date,
            title: comment.title,
            created_at: Utc::now(),
            deleting_at: None,
        };
        self.comments.lock().unwrap().insert(comment.id, comment.clone());
        self.log.record(Event::CommentCreated(comment.id));
        Ok(comment)
    }

    async fn find_by_id(&self, comment_id: Uuid) -> StoreResult<Comment> {
        self.comments
            .lock()
            .unwrap()
            .get(&comment_id)
            .cloned()
            .ok_or_else(|| StoreError::comment_not_found(comment_id))
    }

    async fn find_by_author(&self, user_id: Uuid) -> StoreResult<Vec<Comment>> {
        let mut found: Vec<Comment> = self
            .comments
            .lock()
            .unwrap()
            .values()
            .filter(|c| c.user_id == user_id && !c.is_deleting())
            .cloned()
            .collect();
        found.sort_by_key(|c| c.created_at);
        Ok(found)
    }

    async fn mark_deleting(&self, comment_id: Uuid) -> StoreResult<Comment> {
        let mut comments = self.comments.lock().unwrap();
        let comment = comments
            .get_mut(&comment_id)
            .ok_or_else(|| StoreError::comment_not_found(comment_id))?;
        if comment.deleting_at.is_none() {
            comment.deleting_at = Some(Utc::now());
        }
        self.log.record(Event::CommentMarked(comment_id));
        Ok(comment.clone())
    }

    async fn delete_by_id(&self, comment_id: Uuid) -> StoreResult<()> {
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(unavailable());
        }

        match self.comments.lock().unwrap().remove(&comment_id) {
            Some(_) => {
                self.log.record(Event::CommentDeleted(comment_id));
                Ok(())
            }
            None => Err(StoreError::comment_not_found(comment_id)),
        }
    }

    async fn list_all(&self) -> StoreResult<Vec<Comment>> {
        Ok(self.comments.lock().unwrap().values().cloned().collect())
    }
}

// =====================================================================
// Post store
// =====================================================================

pub struct InMemoryPostStore {
    posts: Mutex<HashMap<Uuid, Post>>,
    log: Arc<EventLog>,
    /// Every call fails as if the database were unreachable
    pub unavailable: AtomicBool,
    /// Only summary removal fails
    pub fail_remove: AtomicBool,
}

impl InMemoryPostStore {
    pub fn new(log: Arc<EventLog>) -> Self {
        Self {
            posts: Mutex::new(HashMap::new()),
            log,
            unavailable: AtomicBool::new(false),
            fail_remove: AtomicBool::new(false),
        }
    }

    pub fn insert_raw(&self, post: Post) {
        self.posts.lock().unwrap().insert(post.id, post);
    }

    /// Push a summary without any consistency check
    pub fn push_raw_summary(&self, post_id: Uuid, summary: CommentSummary) {
        if let Some(post) = self.posts.lock().unwrap().get_mut(&post_id) {
            post.comments.push(summary);
        }
    }

    pub fn get(&self, post_id: Uuid) -> Option<Post> {
        self.posts.lock().unwrap().get(&post_id).cloned()
    }

    pub fn summary_ids(&self, post_id: Uuid) -> Vec<Uuid> {
        self.get(post_id)
            .map(|p| p.comments.iter().map(|s| s.comment_id).collect())
            .unwrap_or_default()
    }

    fn check_available(&self) -> StoreResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(unavailable())
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl PostStore for InMemoryPostStore {
    async fn create(&self, post: NewPost) -> StoreResult<Post> {
        self.check_available()?;

        let post = Post {
            id: Uuid::new_v4(),
            title: post.title,
            description: post.description,
            user_id: post.user_id,
            name: post.name,
            username: post.username,
            date: post.date,
            image_id: post.image_id,
            comments: vec![],
            created_at: Utc::now(),
        };
        self.posts.lock().unwrap().insert(post.id, post.clone());
        Ok(post)
    }

    async fn find_by_id(&self, post_id: Uuid) -> StoreResult<Post> {
        self.check_available()?;
        self.get(post_id)
            .ok_or_else(|| StoreError::post_not_found(post_id))
    }

    async fn list(&self) -> StoreResult<Vec<Post>> {
        self.check_available()?;
        let mut posts: Vec<Post> = self.posts.lock().unwrap().values().cloned().collect();
        posts.sort_by_key(|p| p.created_at);
        Ok(posts)
    }

    async fn list_by_author(&self, user_id: Uuid) -> StoreResult<Vec<Post>> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(|p| p.user_id == user_id)
            .collect())
    }

    async fn delete(&self, post_id: Uuid) -> StoreResult<()> {
        self.check_available()?;
        self.posts
            .lock()
            .unwrap()
            .remove(&post_id)
            .map(|_| ())
            .ok_or_else(|| StoreError::post_not_found(post_id))
    }

    async fn append_comment_summary(
        &self,
        post_id: Uuid,
        summary: &CommentSummary,
    ) -> StoreResult<usize> {
        self.check_available()?;

        // Append happens under one lock acquisition, like a single UPDATE
        let mut posts = self.posts.lock().unwrap();
        let post = posts
            .get_mut(&post_id)
            .ok_or_else(|| StoreError::post_not_found(post_id))?;
        post.comments.push(summary.clone());
        let count = post.comments.len();
        drop(posts);

        self.log.record(Event::SummaryAppended {
            post_id,
            comment_id: summary.comment_id,
        });
        Ok(count)
    }

    async fn remove_comment_summary(&self, post_id: Uuid, comment_id: Uuid) -> StoreResult<bool> {
        self.check_available()?;
        if self.fail_remove.load(Ordering::SeqCst) {
            return Err(unavailable());
        }

        let mut posts = self.posts.lock().unwrap();
        let post = posts
            .get_mut(&post_id)
            .ok_or_else(|| StoreError::post_not_found(post_id))?;
        let before = post.comments.len();
        post.comments.retain(|s| s.comment_id != comment_id);
        let removed = post.comments.len() != before;
        drop(posts);

        self.log.record(Event::SummaryRemoved { post_id, comment_id });
        Ok(removed)
    }

    async fn ping(&self) -> StoreResult<()> {
        self.check_available()
    }
}

// =====================================================================
// User store
// =====================================================================

#[derive(Default)]
pub struct InMemoryUserStore {
    users: Mutex<HashMap<Uuid, User>>,
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn create(&self, user: NewUser) -> StoreResult<User> {
        let mut users = self.users.lock().unwrap();
        if users
            .values()
            .any(|u| u.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(StoreError::Conflict("users_email_key".to_string()));
        }

        let user = User {
            id: Uuid::new_v4(),
            username: user.username,
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            post_ids: vec![],
            created_at: Utc::now(),
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_by_id(&self, user_id: Uuid) -> StoreResult<User> {
        self.users
            .lock()
            .unwrap()
            .get(&user_id)
            .cloned()
            .ok_or_else(|| StoreError::user_not_found(user_id))
    }
}

// =====================================================================
// Fakes for external collaborators
// =====================================================================

pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

#[derive(Default)]
pub struct FakeUploader {
    pub uploads: AtomicUsize,
    pub fail: AtomicBool,
}

#[async_trait]
impl MediaUploader for FakeUploader {
    async fn upload(&self, image: ImageUpload) -> Result<String, MediaError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(MediaError::Rejected {
                status: 500,
                body: "media host down".to_string(),
            });
        }
        self.uploads.fetch_add(1, Ordering::SeqCst);
        Ok(format!("https://media.test/uploads/{}", image.file_name))
    }
}

pub struct FakeDescriber {
    pub fail: AtomicBool,
}

impl Default for FakeDescriber {
    fn default() -> Self {
        Self {
            fail: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl DescriptionGenerator for FakeDescriber {
    async fn describe(&self, title: &str) -> Result<String, AiError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AiError::Upstream {
                status: 429,
                body: "quota exceeded for key sk-secret".to_string(),
            });
        }
        Ok(format!("A simple description about {}.", title))
    }
}

// =====================================================================
// Harness
// =====================================================================

/// Stores, fakes and the event log wired together
pub struct Harness {
    pub log: Arc<EventLog>,
    pub comments: Arc<InMemoryCommentStore>,
    pub posts: Arc<InMemoryPostStore>,
    pub users: Arc<InMemoryUserStore>,
    pub uploader: Arc<FakeUploader>,
    pub describer: Arc<FakeDescriber>,
}

impl Harness {
    pub fn new() -> Self {
        let log = Arc::new(EventLog::default());
        Self {
            comments: Arc::new(InMemoryCommentStore::new(log.clone())),
            posts: Arc::new(InMemoryPostStore::new(log.clone())),
            users: Arc::new(InMemoryUserStore::default()),
            uploader: Arc::new(FakeUploader::default()),
            describer: Arc::new(FakeDescriber::default()),
            log,
        }
    }

    pub fn stores(&self) -> Stores {
        Stores {
            comments: self.comments.clone(),
            posts: self.posts.clone(),
            users: self.users.clone(),
        }
    }

    pub fn auth_config() -> AuthConfig {
        AuthConfig {
            jwt_secret: TEST_SECRET.to_string(),
            cookie_name: "token".to_string(),
            token_ttl_secs: 24 * 60 * 60,
            secure_cookie: false,
        }
    }

    pub fn app_state(&self) -> AppState {
        AppState::new(
            self.stores(),
            self.uploader.clone(),
            self.describer.clone(),
            Arc::new(FixedClock(Utc::now())),
            &Self::auth_config(),
            10 * 1024 * 1024,
        )
    }

    /// A post with no comments
    pub fn seed_post(&self) -> Post {
        let post = Post {
            id: Uuid::new_v4(),
            title: "Hello".to_string(),
            description: "First post".to_string(),
            user_id: Uuid::new_v4(),
            name: "Ada".to_string(),
            username: "User_1".to_string(),
            date: "2025-01-01".to_string(),
            image_id: "https://media.test/uploads/hello.jpg".to_string(),
            comments: vec![],
            created_at: Utc::now(),
        };
        self.posts.insert_raw(post.clone());
        post
    }

    /// A comment stored directly, bypassing the coordinator
    pub fn raw_comment(&self, post_id: Uuid, created_at: DateTime<Utc>) -> Comment {
        let comment = Comment {
            id: Uuid::new_v4(),
            comment: "raw".to_string(),
            user_id: Uuid::new_v4(),
            username: "User_2".to_string(),
            name: "Grace".to_string(),
            post_id,
            date: "2025-01-02".to_string(),
            title: "Hello".to_string(),
            created_at,
            deleting_at: None,
        };
        self.comments.insert_raw(comment.clone());
        comment
    }
}
