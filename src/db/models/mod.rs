//! Row structs for the store.
//!
//! Each struct mirrors a table; `*DBResponse` types derive `sqlx::FromRow`
//! and come back from queries, `*DBRequest` types carry the fields a caller
//! supplies for an insert. They are deliberately separate from the API
//! models so the wire contract and the schema can move independently, and
//! so credential hashes never reach a serializer.
//!
//! - [`users`]: user accounts and credential hashes
//! - [`sessions`]: device-bound refresh sessions
//! - [`access`]: role and permission reference data
//! - [`audit`]: append-only audit events

pub mod access;
pub mod audit;
pub mod sessions;
pub mod users;
