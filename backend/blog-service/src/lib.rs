/// Blog Service Library
///
/// Users, posts and comments for the blog frontend, with image uploads to
/// a media host and AI-written post descriptions.
///
/// # Modules
///
/// - `handlers`: HTTP request handlers and route table
/// - `models`: Data structures for users, posts, comments
/// - `services`: Business logic, including the comment/post consistency rules
/// - `db`: Store traits and PostgreSQL implementations
/// - `security`: Password hashing and session tokens
/// - `middleware`: Session extractor
/// - `jobs`: Background reconciliation
/// - `error`: Error types and handling
/// - `config`: Configuration management
/// - `metrics`: Observability and metrics collection
/// - `state`: Shared application state
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod jobs;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod security;
pub mod services;
pub mod state;

pub use config::Config;
pub use error::{AppError, Result};
pub use state::{AppState, Stores};
