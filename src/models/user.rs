use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Display-level user info attached to reviews.
///
/// User documents themselves live with the external identity service; this
/// core only ever sees ids plus the display fields below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
    #[serde(default)]
    pub avatar: Option<String>,
}
