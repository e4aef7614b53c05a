/// Socially Service Library
///
/// Backend of a small social network: profiles, posts, comments, likes,
/// follows and notifications over a JSON API. Callers authenticate with
/// session tokens issued by a hosted identity provider.
///
/// # Modules
///
/// - `handlers`: HTTP request handlers and route table
/// - `services`: Business rules (ownership, toggles, notifications)
/// - `db`: Repository traits and their PostgreSQL implementations
/// - `models`: Rows, write models and hydrated views
/// - `middleware`: Session token verification
/// - `validators`: Username and text normalization
/// - `error`: Error types and handling
/// - `config`: Configuration management
/// - `metrics`: Prometheus counters
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod services;
pub mod validators;

pub use config::Config;
pub use error::{AppError, Result};
