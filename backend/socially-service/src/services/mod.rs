/// Business logic for socially-service
///
/// Each service wraps the shared [`Repositories`](crate::db::Repositories)
/// and owns the checks for one resource. Write paths resolve the caller
/// first, then the target row, then ownership, then the body.
pub mod comments;
pub mod follows;
pub mod likes;
pub mod notifications;
pub mod posts;
pub mod users;

pub use comments::CommentService;
pub use follows::FollowService;
pub use likes::LikeService;
pub use notifications::NotificationService;
pub use posts::{FeedPage, PostService};
pub use users::{ProfileChanges, SyncUserInput, UserService};
