//! API response models for the admin surface.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Response from the admin liveness check
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AdminPingResponse {
    pub message: String,
}
