//! Public types for the health API
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub llm_initialized: bool,
    pub timestamp: String,
}
