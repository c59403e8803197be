//! Business logic services.

#![allow(missing_docs)]

pub mod comment;
pub mod follow;
pub mod group;
pub mod post;
pub mod user;

pub use comment::{CommentService, CommentView};
pub use follow::{FollowService, FollowView};
pub use group::{CreateGroupInput, GroupService, slugify};
pub use post::{EditOutcome, PostService, PostView, is_author};
pub use user::{RegisterInput, UserService};
