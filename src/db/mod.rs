//! Persistence layer.
//!
//! Handlers talk to the [`store::AuthStore`] trait; deployments back it with
//! SQLx/PostgreSQL, development and tests with an in-memory implementation
//! that is lost on restart.
//!
//! ```text
//! ┌──────────┐     ┌───────────┐     ┌─────────────────────────┐
//! │ Handlers │ ──→ │ AuthStore │ ──→ │ PostgreSQL or in-memory │
//! └──────────┘     └───────────┘     └─────────────────────────┘
//! ```
//!
//! - [`store`]: the trait plus both implementations
//! - [`models`]: row structs the store reads and writes
//! - [`errors`]: the [`errors::DbError`] type both backends return
//!
//! Migrations live in `migrations/` and run automatically on startup when a
//! `database_url` is configured; [`crate::migrator`] exposes them for manual
//! application:
//!
//! ```ignore
//! warden::migrator().run(&pool).await?;
//! ```

pub mod errors;
pub mod models;
pub mod store;
