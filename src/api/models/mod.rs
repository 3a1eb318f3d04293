//! API request and response data models.
//!
//! This module contains the data structures used for HTTP request
//! deserialization and response serialization. These models define the
//! public API contract.
//!
//! # Design Principles
//!
//! - **Separation of Concerns**: API models are distinct from database
//!   models, allowing independent evolution of API and storage
//!   representations. In particular, nothing here carries a credential
//!   hash.
//! - **OpenAPI**: All models are annotated with `utoipa` for automatic API
//!   docs
//!
//! # Model Categories
//!
//! - [`auth`]: login, registration, refresh, and session payloads, plus
//!   the cookie-carrying response wrappers
//! - [`users`]: the public user shape and the resolved [`CurrentUser`]
//!
//! [`CurrentUser`]: users::CurrentUser

pub mod admin;
pub mod auth;
pub mod users;
