//! Database repositories.
//!
//! One repository per entity. Each wraps a shared
//! [`DatabaseConnection`](sea_orm::DatabaseConnection) and maps database
//! errors into [`AppError`](yatube_common::AppError).

pub mod comment;
pub mod follow;
pub mod group;
pub mod post;
pub mod user;

pub use comment::CommentRepository;
pub use follow::FollowRepository;
pub use group::GroupRepository;
pub use post::PostRepository;
pub use user::UserRepository;

use sea_orm::{DbErr, SqlErr};
use yatube_common::AppError;

/// Map an insert failure, reporting a unique-constraint violation as
/// [`AppError::Conflict`] with `conflict` as the message.
pub(crate) fn insert_error(err: &DbErr, conflict: &str) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::Conflict(conflict.to_string()),
        _ => AppError::Database(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_error_other_failures_are_database_errors() {
        let err = DbErr::Custom("connection reset".to_string());
        assert!(matches!(
            insert_error(&err, "taken"),
            AppError::Database(msg) if msg.contains("connection reset")
        ));
    }
}
