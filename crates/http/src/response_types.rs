//! Response types (Serialize)

use dqbot_service::GatewayState;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub session_id: String,
    /// Reply variant, e.g. `assistant`, `awaiting_name`, `saved`.
    pub kind: &'static str,
    pub response: String,
    pub state: GatewayState,
}

#[derive(Debug, Serialize)]
pub struct SessionDeleteResponse {
    pub deleted: bool,
    pub session_id: String,
}

#[derive(Debug, Serialize)]
pub struct VersionResponse {
    pub version: &'static str,
}
