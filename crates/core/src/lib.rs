//! Core business logic for yatube-rs.
//!
//! Services sit between the HTTP layer and the repositories: they resolve
//! users and groups by their public keys, apply the authoring rules and
//! compute paginated feeds. Form validation lives in [`forms`].

pub mod forms;
pub mod services;

pub use forms::{CommentForm, FieldErrors, ImageUpload, ModelForm, PostForm};
pub use services::*;
