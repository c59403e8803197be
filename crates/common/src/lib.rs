//! Common utilities and shared types for yatube-rs.
//!
//! This crate provides foundational components used across all yatube-rs crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **Clock**: Injectable time source via [`Clock`]
//! - **ID Generation**: ULID-based unique identifiers via [`IdGenerator`]
//! - **Pagination**: Page-number arithmetic via [`Paginator`]
//! - **Storage**: File storage backends for uploaded images
//!
//! # Example
//!
//! ```no_run
//! use yatube_common::{Config, IdGenerator, AppResult};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     let id_gen = IdGenerator::new();
//!     let id = id_gen.generate();
//!     println!("{} -> {}", config.server.url, id);
//!     Ok(())
//! }
//! ```

pub mod clock;
pub mod config;
pub mod error;
pub mod id;
pub mod pagination;
pub mod storage;

pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use config::{Config, DatabaseConfig};
pub use error::{AppError, AppResult};
pub use id::IdGenerator;
pub use pagination::{DEFAULT_PAGE_SIZE, Page, PageMeta, Paginator};
pub use storage::{LocalStorage, StorageBackend, UploadedFile, generate_storage_key};
